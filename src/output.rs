//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Sitemap report
//!
//! ```text
//! Sitemap written: site/sitemap.xml
//!
//! Sitemap statistics
//! ---------------------------------
//! Total pages: 3
//! Domain: https://moviliax.com
//! Output file: sitemap.xml
//!
//! Pages
//!     1. index.html (priority: 1)
//!     2. blog.html (priority: 0.7)
//!     3. contacto.html (priority: 0.6)
//! ```
//!
//! # Newsletter
//!
//! [`TerminalFormView`] is the `subscribe` command's [`FormView`]: messages
//! become `ok:` / `error:` lines, the submit control becomes a status line.

use crate::config::SiteConfig;
use crate::newsletter::{FormView, MessageKind, SubmitControl};
use crate::sitemap::{Sitemap, SitemapRun};
use std::path::Path;
use std::time::Duration;

/// Format a 1-based position as a right-aligned list marker.
fn list_marker(pos: usize, width: usize) -> String {
    format!("{:>width$}.", pos, width = width)
}

/// Format the post-run report for a written sitemap.
pub fn format_sitemap_report(run: &SitemapRun, config: &SiteConfig) -> Vec<String> {
    let mut lines = vec![
        format!("Sitemap written: {}", run.output_path.display()),
        String::new(),
    ];
    lines.extend(format_statistics(&run.sitemap, config));
    lines
}

/// Statistics block: totals, then every page with its resolved priority.
pub fn format_statistics(sitemap: &Sitemap, config: &SiteConfig) -> Vec<String> {
    let mut lines = vec![
        "Sitemap statistics".to_string(),
        "-".repeat(33),
        format!("Total pages: {}", sitemap.len()),
        format!("Domain: {}", config.domain),
        format!("Output file: {}", config.output_file),
        String::new(),
        "Pages".to_string(),
    ];

    let width = sitemap.len().to_string().len();
    for (i, url) in sitemap.urls.iter().enumerate() {
        lines.push(format!(
            "    {} {} (priority: {})",
            list_marker(i + 1, width),
            url.filename,
            url.priority
        ));
    }
    lines
}

/// Print the sitemap report to stdout.
pub fn print_sitemap_report(run: &SitemapRun, config: &SiteConfig) {
    for line in format_sitemap_report(run, config) {
        println!("{}", line);
    }
}

/// Format the `check` listing: what would be written, without writing.
pub fn format_check_output(sitemap: &Sitemap, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Pages under {}", root.display())];
    let width = sitemap.len().to_string().len();
    for (i, url) in sitemap.urls.iter().enumerate() {
        lines.push(format!(
            "    {} {} \u{2192} {}",
            list_marker(i + 1, width),
            url.filename,
            url.loc
        ));
        lines.push(format!(
            "        {} / {} / {}",
            url.lastmod.format("%Y-%m-%d"),
            url.changefreq,
            url.priority
        ));
    }
    lines.push(format!("{} pages", sitemap.len()));
    lines
}

/// Print the `check` listing to stdout.
pub fn print_check_output(sitemap: &Sitemap, root: &Path) {
    for line in format_check_output(sitemap, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Newsletter
// ============================================================================

pub fn format_form_message(text: &str, kind: MessageKind) -> String {
    match kind {
        MessageKind::Success => format!("ok: {text}"),
        MessageKind::Error => format!("error: {text}"),
    }
}

/// Terminal adapter for the newsletter form.
///
/// A terminal cannot take a line back, so the dismiss window is ignored.
#[derive(Debug, Default)]
pub struct TerminalFormView {
    pub input: String,
}

impl TerminalFormView {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl FormView for TerminalFormView {
    fn show_message(&mut self, text: &str, kind: MessageKind, _dismiss_after: Duration) {
        println!("{}", format_form_message(text, kind));
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        if control == SubmitControl::Busy {
            println!("{}", control.label());
        }
    }
}
