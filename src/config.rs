//! Sitemap configuration.
//!
//! The production configuration is compiled in: [`SiteConfig::default`] holds
//! the live domain, exclusion lists and the per-page priority table, so the
//! generator runs with no arguments and no files. A `sitemap.toml` in the site
//! root may override any of it.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── sitemap.toml             # Optional overrides (merged onto the defaults)
//! ├── index.html
//! ├── blog.html
//! └── node_modules/            # Excluded by name, at any depth
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! domain = "https://moviliax.com"
//! output_file = "sitemap.xml"
//! home_page = "index.html"
//! document_extension = ".html"
//! exclude_dirs = ["node_modules", "dist", "build", ".git", "css", "js", "assets"]
//! exclude_files = ["404.html", "error.html"]
//!
//! [default_page]
//! priority = 0.5
//! changefreq = "monthly"
//!
//! [pages."blog.html"]
//! priority = 0.7
//! changefreq = "daily"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key by key, so adding one entry
//! under `[pages."nuevo.html"]` keeps every stock page entry. Arrays replace
//! the stock value wholesale. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the optional override file in the site root.
pub const CONFIG_FILE_NAME: &str = "sitemap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How often a page is expected to change, as declared to crawlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawler hints for one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
    /// Relative importance within the site, `0.0..=1.0`.
    pub priority: f64,
    pub changefreq: ChangeFrequency,
}

impl PageConfig {
    pub const fn new(priority: f64, changefreq: ChangeFrequency) -> Self {
        Self {
            priority,
            changefreq,
        }
    }
}

/// Everything the sitemap generator needs besides the file system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute origin prepended to every URL, e.g. `https://moviliax.com`.
    pub domain: String,
    /// Sitemap file name, written into the site root.
    pub output_file: String,
    /// Base name of the home page. The root copy maps to `domain/`.
    pub home_page: String,
    /// Suffix a file name must end with to be listed.
    pub document_extension: String,
    /// Directory base names skipped with their whole subtree, at any depth.
    pub exclude_dirs: Vec<String>,
    /// File base names never listed.
    pub exclude_files: Vec<String>,
    /// Used for every file name missing from `pages`.
    pub default_page: PageConfig,
    /// Per-page crawler hints keyed by exact file name.
    pub pages: BTreeMap<String, PageConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        use ChangeFrequency::*;

        let pages = [
            ("index.html", 1.0, Weekly),
            ("acerca-de.html", 0.8, Monthly),
            ("moviliax-connect.html", 0.9, Weekly),
            ("moviliax-energy.html", 0.9, Weekly),
            ("moviliax-labs.html", 0.9, Weekly),
            ("moviliax-logistics.html", 0.9, Weekly),
            ("moviliax-mobility.html", 0.9, Weekly),
            ("moviliax-pay.html", 0.9, Weekly),
            ("moviliax-cloud.html", 0.9, Weekly),
            ("blog.html", 0.7, Daily),
            ("contacto.html", 0.6, Monthly),
            ("carreras.html", 0.7, Weekly),
            ("politica-privacidad.html", 0.3, Yearly),
            ("terminos-condiciones.html", 0.3, Yearly),
        ]
        .into_iter()
        .map(|(name, priority, freq)| (name.to_string(), PageConfig::new(priority, freq)))
        .collect();

        Self {
            domain: "https://moviliax.com".to_string(),
            output_file: "sitemap.xml".to_string(),
            home_page: "index.html".to_string(),
            document_extension: ".html".to_string(),
            exclude_dirs: ["node_modules", "dist", "build", ".git", "css", "js", "assets"]
                .map(String::from)
                .to_vec(),
            exclude_files: ["404.html", "error.html"].map(String::from).to_vec(),
            default_page: PageConfig::new(0.5, Monthly),
            pages,
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.domain.starts_with("https://") || self.domain.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "domain must start with http:// or https:// (got {:?})",
                self.domain
            )));
        }
        if self.base_url().ends_with("://") {
            return Err(ConfigError::Validation("domain must include a host".into()));
        }
        if self.output_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_file must not be empty".into(),
            ));
        }
        if self.home_page.trim().is_empty() {
            return Err(ConfigError::Validation("home_page must not be empty".into()));
        }
        if !self.document_extension.starts_with('.') || self.document_extension.len() < 2 {
            return Err(ConfigError::Validation(
                "document_extension must look like \".html\"".into(),
            ));
        }
        check_priority("default_page", &self.default_page)?;
        for (name, page) in &self.pages {
            check_priority(&format!("pages.\"{name}\""), page)?;
        }
        Ok(())
    }

    /// The domain without trailing slashes, ready to have paths appended.
    pub fn base_url(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Crawler hints for `filename`, falling back to `default_page`.
    pub fn page_config(&self, filename: &str) -> PageConfig {
        resolve_page_config(filename, &self.pages, &self.default_page)
    }
}

fn check_priority(key: &str, page: &PageConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&page.priority) {
        return Err(ConfigError::Validation(format!(
            "{key}.priority must be within 0.0-1.0 (got {})",
            page.priority
        )));
    }
    Ok(())
}

/// Exact-name lookup in `table`, or `default` on a miss.
pub fn resolve_page_config(
    filename: &str,
    table: &BTreeMap<String, PageConfig>,
    default: &PageConfig,
) -> PageConfig {
    table.get(filename).copied().unwrap_or(*default)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the compiled-in defaults as a `toml::Value::Table`.
///
/// Base layer for merging a user's `sitemap.toml` on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Lay a `sitemap.toml` table over the defaults.
///
/// Tables recurse, so `[pages."blog.html"]` adjusts one page and keeps the
/// rest of the priority table. Anything else, arrays included, replaces the
/// default outright: an `exclude_dirs` list is the whole list.
pub fn merge_toml(defaults: toml::Value, site: toml::Value) -> toml::Value {
    use toml::Value::Table;

    match (defaults, site) {
        (Table(mut merged), Table(site)) => {
            for (key, value) in site {
                let value = match merged.remove(&key) {
                    Some(default) => merge_toml(default, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Table(merged)
        }
        (_, site) => site,
    }
}

/// The `sitemap.toml` of a site root, if it has one.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Turn the defaults plus an optional `sitemap.toml` into a checked
/// [`SiteConfig`]. Unknown keys and out-of-range priorities fail here, before
/// any file is discovered.
pub fn resolve_config(
    defaults: toml::Value,
    site: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let value = match site {
        Some(site) => merge_toml(defaults, site),
        None => defaults,
    };
    let config: SiteConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a site root: defaults plus `sitemap.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `sitemap.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# MOVILIAX sitemap configuration
# ==============================
# Every setting is optional. Values shown below are the compiled-in defaults.
# Place this file in the site root as sitemap.toml; tables merge key by key
# with the defaults, arrays replace them. Unknown keys are an error.

# Origin prepended to every URL.
domain = "https://moviliax.com"

# Sitemap file name, written into the site root (overwritten every run).
output_file = "sitemap.xml"

# The root copy of this page is published as "<domain>/".
home_page = "index.html"

# Only files ending with this suffix are listed.
document_extension = ".html"

# Directories skipped entirely, matched by name at any depth.
exclude_dirs = ["node_modules", "dist", "build", ".git", "css", "js", "assets"]

# Files never listed, matched by name.
exclude_files = ["404.html", "error.html"]

# ---------------------------------------------------------------------------
# Crawler hints
# ---------------------------------------------------------------------------
# changefreq: always | hourly | daily | weekly | monthly | yearly | never
# priority: 0.0 - 1.0

# Pages not listed under [pages] use these values.
[default_page]
priority = 0.5
changefreq = "monthly"

[pages."index.html"]
priority = 1.0
changefreq = "weekly"

[pages."acerca-de.html"]
priority = 0.8
changefreq = "monthly"

[pages."moviliax-connect.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-energy.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-labs.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-logistics.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-mobility.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-pay.html"]
priority = 0.9
changefreq = "weekly"

[pages."moviliax-cloud.html"]
priority = 0.9
changefreq = "weekly"

[pages."blog.html"]
priority = 0.7
changefreq = "daily"

[pages."contacto.html"]
priority = 0.6
changefreq = "monthly"

[pages."carreras.html"]
priority = 0.7
changefreq = "weekly"

[pages."politica-privacidad.html"]
priority = 0.3
changefreq = "yearly"

[pages."terminos-condiciones.html"]
priority = 0.3
changefreq = "yearly"
"##
}
