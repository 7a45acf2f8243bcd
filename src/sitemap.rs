//! Sitemap discovery, generation and serialization.
//!
//! The generator is a single sequential pass over the site root:
//!
//! ```text
//! discover     site root          →  HTML file paths   (walkdir, exclusions)
//! generate     paths + SiteConfig →  Sitemap           (mtime lookup, sort, URLs)
//! write        Sitemap            →  sitemap.xml       (quick-xml, overwrite)
//! ```
//!
//! [`generate`] is split in two so the interesting part stays pure:
//! [`collect_entries`] is the only step that reads file metadata, and
//! [`build_sitemap`] turns those entries plus configuration into the
//! document without touching the file system.
//!
//! ## Ordering
//!
//! Pages named like the configured home page come first (shallowest path
//! first when several directories have one), then everything else sorted by
//! file name, byte-wise and case-sensitive. Ties on the file name fall back
//! to the relative path, so two runs over the same tree always agree.
//!
//! ## Failure Policy
//!
//! Every error is fatal. A root with no eligible documents is an error too:
//! [`run`] refuses to write an empty sitemap.

use crate::config::{ChangeFrequency, SiteConfig};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.sitemaps.org/schemas/sitemap/0.9 \
                               http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Site root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("No HTML files found under {0}")]
    EmptyResult(PathBuf),
}

fn xml_error(err: impl fmt::Display) -> SitemapError {
    SitemapError::Xml(err.to_string())
}

/// Unreadable entries are plain IO errors; only symlink loops stay walk errors.
fn walk_error(err: walkdir::Error) -> SitemapError {
    match err.io_error() {
        Some(io) => SitemapError::Io(std::io::Error::new(io.kind(), err.to_string())),
        None => SitemapError::WalkDir(err),
    }
}

/// One discovered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Path relative to the site root, always `/`-separated.
    pub path: String,
    /// Base name, used for config lookup and ordering.
    pub filename: String,
    /// UTC date of the file's last modification.
    pub last_modified: NaiveDate,
}

impl PageEntry {
    fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

/// One `<url>` element of the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub filename: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFrequency,
    pub priority: f64,
}

/// The ordered document, ready to serialize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sitemap {
    pub urls: Vec<SitemapUrl>,
}

impl Sitemap {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Serialize to a sitemap-protocol XML document.
    ///
    /// Each `<url>` is preceded by a comment naming its source file. Priority
    /// is written in its shortest decimal form (`1.0` becomes `1`).
    pub fn to_xml(&self) -> Result<String, SitemapError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NS));
        urlset.push_attribute(("xmlns:xsi", XSI_NS));
        urlset.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
        writer.write_event(Event::Start(urlset)).map_err(xml_error)?;

        for url in &self.urls {
            let note = format!(" {} ", comment_safe(&url.filename));
            writer
                .write_event(Event::Comment(BytesText::from_escaped(note)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Start(BytesStart::new("url")))
                .map_err(xml_error)?;
            text_element(&mut writer, "loc", &url.loc)?;
            text_element(
                &mut writer,
                "lastmod",
                &url.lastmod.format("%Y-%m-%d").to_string(),
            )?;
            text_element(&mut writer, "changefreq", url.changefreq.as_str())?;
            text_element(&mut writer, "priority", &url.priority.to_string())?;
            writer
                .write_event(Event::End(BytesEnd::new("url")))
                .map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("urlset")))
            .map_err(xml_error)?;

        let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
        xml.push('\n');
        Ok(xml)
    }
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), SitemapError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

/// XML comments may not contain `--` and must not carry markup.
fn comment_safe(text: &str) -> String {
    let mut out = text.replace(['<', '>', '&'], "_");
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    out
}

// ============================================================================
// Discovery
// ============================================================================

/// Recursively collect every document under `root`.
///
/// A directory whose base name is listed in `exclude_dirs` is skipped along
/// with its whole subtree, at any depth (the root itself is never skipped).
/// A file is kept when its name ends with `extension` and is not listed in
/// `exclude_files`. Entries are returned in walk order, which is sorted by
/// file name per directory.
pub fn discover(
    root: &Path,
    exclude_dirs: &[String],
    exclude_files: &[String],
    extension: &str,
) -> Result<Vec<PathBuf>, SitemapError> {
    if !fs::metadata(root)?.is_dir() {
        return Err(SitemapError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let excluded = entry
                .file_name()
                .to_str()
                .is_some_and(|name| exclude_dirs.iter().any(|d| d == name));
            if excluded {
                debug!(path = %entry.path().display(), "skipping excluded directory");
            }
            !excluded
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if name.ends_with(extension) && !exclude_files.iter().any(|f| f == name) {
            files.push(entry.into_path());
        }
    }

    debug!(count = files.len(), root = %root.display(), "discovery finished");
    Ok(files)
}

// ============================================================================
// URLs
// ============================================================================

/// Path of `file` relative to `root`, joined with `/` on every platform.
pub fn relative_path(file: &Path, root: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute URL for a `/`-separated relative path.
///
/// The root home page is published as `domain/` so it has a single
/// canonical URL.
pub fn page_url(relative: &str, domain: &str, home_page: &str) -> String {
    let base = domain.trim_end_matches('/');
    if relative == home_page {
        format!("{base}/")
    } else {
        format!("{base}/{relative}")
    }
}

/// Absolute URL for a file under `root`.
pub fn to_url(file: &Path, root: &Path, domain: &str, home_page: &str) -> String {
    page_url(&relative_path(file, root), domain, home_page)
}

// ============================================================================
// Generation
// ============================================================================

/// Stat every file and record its path, name and modification date.
pub fn collect_entries(files: &[PathBuf], root: &Path) -> Result<Vec<PageEntry>, SitemapError> {
    files
        .iter()
        .map(|file| {
            let modified = fs::metadata(file)?.modified()?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(PageEntry {
                path: relative_path(file, root),
                filename,
                last_modified: DateTime::<Utc>::from(modified).date_naive(),
            })
        })
        .collect()
}

/// Sort entries into sitemap order: home pages first, then by file name.
pub fn sort_entries(entries: &mut [PageEntry], home_page: &str) {
    entries.sort_by(|a, b| {
        let a_home = a.filename == home_page;
        let b_home = b.filename == home_page;
        b_home
            .cmp(&a_home)
            .then_with(|| {
                if a_home && b_home {
                    a.depth().cmp(&b.depth())
                } else {
                    a.filename.cmp(&b.filename)
                }
            })
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Turn discovered entries into the ordered sitemap. Pure.
pub fn build_sitemap(mut entries: Vec<PageEntry>, config: &SiteConfig) -> Sitemap {
    sort_entries(&mut entries, &config.home_page);

    let urls = entries
        .into_iter()
        .map(|entry| {
            let page = config.page_config(&entry.filename);
            SitemapUrl {
                loc: page_url(&entry.path, &config.domain, &config.home_page),
                filename: entry.filename,
                lastmod: entry.last_modified,
                changefreq: page.changefreq,
                priority: page.priority,
            }
        })
        .collect();

    Sitemap { urls }
}

/// Build the sitemap for already-discovered files.
pub fn generate(
    files: &[PathBuf],
    root: &Path,
    config: &SiteConfig,
) -> Result<Sitemap, SitemapError> {
    let entries = collect_entries(files, root)?;
    Ok(build_sitemap(entries, config))
}

/// Serialize `sitemap` to `output`, replacing any existing file.
pub fn write_sitemap(sitemap: &Sitemap, output: &Path) -> Result<(), SitemapError> {
    let xml = sitemap.to_xml()?;
    fs::write(output, xml)?;
    Ok(())
}

/// Result of a successful [`run`].
#[derive(Debug)]
pub struct SitemapRun {
    pub sitemap: Sitemap,
    pub output_path: PathBuf,
}

/// Discover, generate and write the sitemap for `root`.
///
/// Nothing is written unless at least one document was found.
pub fn run(root: &Path, config: &SiteConfig) -> Result<SitemapRun, SitemapError> {
    let files = discover(
        root,
        &config.exclude_dirs,
        &config.exclude_files,
        &config.document_extension,
    )?;
    if files.is_empty() {
        return Err(SitemapError::EmptyResult(root.to_path_buf()));
    }

    let sitemap = generate(&files, root, config)?;
    let output_path = root.join(&config.output_file);
    write_sitemap(&sitemap, &output_path)?;
    info!(pages = sitemap.len(), output = %output_path.display(), "sitemap written");

    Ok(SitemapRun {
        sitemap,
        output_path,
    })
}
