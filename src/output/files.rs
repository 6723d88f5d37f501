//! Markdown file storage
//!
//! Documents are laid out on disk following the structure of their URLs,
//! one `.md` file per page.

use crate::output::traits::{DocumentStore, OutputError, OutputResult};
use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Longest file name component written, in bytes
const MAX_FILENAME_LENGTH: usize = 200;

/// Query characters kept in a file name
const MAX_QUERY_LENGTH: usize = 20;

/// Writes markdown documents under an output directory
///
/// # Layout
///
/// `https://www.example.com/docs/guide/intro?v=2` is written to
/// `<dir>/example.com/docs/guide/intro_v=2.md`, or to
/// `<dir>/docs/guide/intro_v=2.md` when `include_domain` is false.
/// The site root becomes `index.md`.
#[derive(Debug, Clone)]
pub struct FileStore {
    output_dir: PathBuf,
    include_domain: bool,
}

impl FileStore {
    pub fn new(output_dir: impl Into<PathBuf>, include_domain: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            include_domain,
        }
    }

    /// Maps a page URL to the file its markdown is written to
    pub fn url_to_filepath(&self, url: &str) -> OutputResult<PathBuf> {
        let parsed = Url::parse(url).map_err(|e| OutputError::Write(format!("{}: {}", url, e)))?;

        let mut path = self.output_dir.clone();
        if self.include_domain {
            if let Some(host) = parsed.host_str() {
                let host = host.strip_prefix("www.").unwrap_or(host);
                path.push(sanitize_filename(host));
            }
        }

        let mut segments: Vec<&str> = parsed.path().trim_end_matches('/').split('/').collect();
        // A leading slash always yields one empty segment
        if segments.first() == Some(&"") {
            segments.remove(0);
        }
        let last = match segments.pop() {
            Some(last) if !last.is_empty() => last,
            _ => "index",
        };

        for dir in segments.iter().filter(|s| !s.is_empty()) {
            path.push(sanitize_filename(dir));
        }

        let mut filename = last.to_string();
        if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
            filename.push('_');
            filename.extend(query.chars().take(MAX_QUERY_LENGTH));
        }

        let mut filename = sanitize_filename(&filename);
        if !filename.ends_with(".md") {
            filename.push_str(".md");
        }
        path.push(filename);

        Ok(path)
    }

    /// Writes the document, resolving name collisions
    ///
    /// An existing file is overwritten only if it was written for the same
    /// URL; otherwise `_1`, `_2`, ... suffixes are tried in turn. Fresh files
    /// are created with `create_new`, so concurrent saves never clobber each
    /// other.
    fn write_document(&self, path: PathBuf, url: &str, document: &str) -> OutputResult<PathBuf> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());

        let mut counter = 0u32;
        loop {
            let candidate = match counter {
                0 => path.clone(),
                n => path.with_file_name(format!("{}_{}.md", stem, n)),
            };

            if is_same_source(&candidate, url) {
                fs::write(&candidate, document)?;
                return Ok(candidate);
            }

            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut file) => {
                    file.write_all(document.as_bytes())?;
                    if counter > 0 {
                        tracing::debug!(
                            "Renamed {} to {} to avoid overwriting another page",
                            path.display(),
                            candidate.display()
                        );
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl DocumentStore for FileStore {
    fn save(&self, markdown: &str, url: &str) -> OutputResult<PathBuf> {
        let path = self.url_to_filepath(url)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = if split_frontmatter(markdown).is_some() {
            markdown.to_string()
        } else {
            add_frontmatter(markdown, url)
        };

        let path = self.write_document(path, url, &document)?;

        tracing::info!("Saved markdown file: {}", path.display());
        Ok(path)
    }
}

/// Makes a single path component safe to use as a file name
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | ' ' => '_',
            c => c,
        })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return "index".to_string();
    }

    sanitized.truncate(MAX_FILENAME_LENGTH);
    sanitized
}

/// Splits a document into its frontmatter body and the rest
fn split_frontmatter(document: &str) -> Option<(&str, &str)> {
    let rest = document.strip_prefix("---\n")?;
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    let end = rest.find("\n---\n")?;
    Some((&rest[..end], &rest[end + 5..]))
}

/// Reads `source_url` from a document's frontmatter
fn frontmatter_source_url(document: &str) -> Option<String> {
    let (frontmatter, _) = split_frontmatter(document)?;
    let value = frontmatter
        .lines()
        .find_map(|line| line.strip_prefix("source_url:"))?
        .trim();

    if value.starts_with('"') {
        serde_json::from_str(value).ok()
    } else {
        Some(value.trim_matches('\'').to_string())
    }
}

fn is_same_source(path: &Path, url: &str) -> bool {
    match fs::read_to_string(path) {
        Ok(existing) => frontmatter_source_url(&existing)
            .map(|source| comparable_url(&source) == comparable_url(url))
            .unwrap_or(false),
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!("Error reading existing file {}: {}", path.display(), e);
            false
        }
    }
}

/// Drops trailing slashes and a `www.` host prefix
fn comparable_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let rest = rest.strip_prefix("www.").unwrap_or(rest);
            return format!("{}{}", scheme, rest);
        }
    }
    url.to_string()
}

/// Prepends `title`, `source_url` and `date_extracted` frontmatter
fn add_frontmatter(markdown: &str, url: &str) -> String {
    let title = markdown
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_url(url));

    let quote = |v: &str| serde_json::to_string(v).unwrap_or_default();
    format!(
        "---\ntitle: {}\nsource_url: {}\ndate_extracted: {}\n---\n\n{}",
        quote(&title),
        quote(url),
        quote(&Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        markdown.trim_start()
    )
}

/// Builds a title from the last path segment: `getting-started` → `Getting Started`
fn title_from_url(url: &str) -> String {
    let last = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

    match last {
        Some(segment) => segment
            .split(['-', '_'])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" "),
        None => "Home Page".to_string(),
    }
}
