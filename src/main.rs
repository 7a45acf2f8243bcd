use clap::{Parser, Subcommand};
use moviliax_site::logger::{self, Environment, SiteLogger};
use moviliax_site::newsletter::{self, HttpTransport, NewsletterForm};
use moviliax_site::{config, output, sitemap};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "moviliax-site")]
#[command(about = "Sitemap generator and newsletter client for the MOVILIAX website")]
#[command(long_about = "\
Sitemap generator and newsletter client for the MOVILIAX website

Run with no arguments from the site root to regenerate sitemap.xml using the
compiled-in configuration. A sitemap.toml next to the pages overrides any
default; run 'moviliax-site gen-config' for a documented template.

Every .html file is listed except those in excluded directories (node_modules,
dist, build, .git, css, js, assets) and excluded files (404.html, error.html).
index.html comes first and is published as the bare domain.")]
#[command(version = env!("MOVILIAX_VERSION"))]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Sitemap file name (overrides the configured one)
    #[arg(long, global = true)]
    output: Option<String>,

    /// Development mode: verbose logging
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write sitemap.xml (the default when no command is given)
    Sitemap,
    /// List the pages the sitemap would contain without writing it
    Check,
    /// Print a stock sitemap.toml with all options documented
    GenConfig,
    /// Submit one newsletter subscription
    Subscribe {
        /// Email address to subscribe
        email: String,
        /// Site origin hosting the subscription endpoint
        #[arg(long, default_value = "https://moviliax.com")]
        base_url: String,
        /// Hidden form field value; anything non-empty is treated as a bot
        #[arg(long, default_value = "")]
        honeypot: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = newsletter::DEFAULT_TIMEOUT.as_secs())]
        timeout: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let environment = if cli.dev {
        Environment::development()
    } else {
        Environment::production()
    };
    logger::init_tracing(environment);

    match run(cli, environment) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, environment: Environment) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Command::Sitemap) {
        Command::Sitemap => {
            let site_config = load_site_config(&cli.source, cli.output)?;
            let result = sitemap::run(&cli.source, &site_config)?;
            output::print_sitemap_report(&result, &site_config);
        }
        Command::Check => {
            let site_config = load_site_config(&cli.source, cli.output)?;
            let files = sitemap::discover(
                &cli.source,
                &site_config.exclude_dirs,
                &site_config.exclude_files,
                &site_config.document_extension,
            )?;
            if files.is_empty() {
                return Err(sitemap::SitemapError::EmptyResult(cli.source).into());
            }
            let preview = sitemap::generate(&files, &cli.source, &site_config)?;
            output::print_check_output(&preview, &cli.source);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Subscribe {
            email,
            base_url,
            honeypot,
            timeout,
        } => {
            let transport = HttpTransport::new(&base_url, Duration::from_secs(timeout))?;
            let mut form = NewsletterForm::new(transport, SiteLogger::new(environment));
            let mut view = output::TerminalFormView::new(email.clone());
            form.submit(&email, &honeypot, &mut view)?;
        }
    }

    Ok(())
}

/// Defaults, then `sitemap.toml` in the site root, then CLI overrides.
fn load_site_config(
    root: &std::path::Path,
    output_file: Option<String>,
) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(root)?;
    if let Some(output_file) = output_file {
        site_config.output_file = output_file;
        site_config.validate()?;
    }
    Ok(site_config)
}
