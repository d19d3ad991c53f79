//! # Input Classifier
//!
//! Maps a raw target string to an [`InputKind`] and a canonical form.
//! Classification never fails. First match wins:
//!
//! 1. `did:` prefix (any case) → [`InputKind::Did`], canonical = trimmed input
//! 2. `http(s)` URL that is a structured-identifier link → [`InputKind::DigitalLink`]
//! 3. any other `http(s)` URL → [`InputKind::Url`]
//! 4. `file://` URI, existing path, or path-looking string with a known
//!    document extension → [`InputKind::File`], canonical = absolute path
//! 5. anything else → [`InputKind::Url`], unmodified; the network adapter
//!    decides whether it resolves
//!
//! The only I/O is the existence probe in step 4.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::digital_link::is_digital_link;

/// Extensions that make a string look like a local document path.
pub const DOCUMENT_EXTENSIONS: [&str; 11] = [
    "json", "jsonld", "json-ld", "xml", "ttl", "nt", "nq", "aasx", "jwt", "yaml", "yml",
];

/// Classified kind of a target reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Url,
    DigitalLink,
    Did,
    File,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::DigitalLink => "digital_link",
            Self::Did => "did",
            Self::File => "file",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`classify()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedInput {
    pub kind: InputKind,
    pub canonical: String,
}

/// Classify a raw target string.
pub fn classify(raw: &str) -> ClassifiedInput {
    let value = raw.trim();

    if value.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("did:")) {
        return ClassifiedInput {
            kind: InputKind::Did,
            canonical: value.to_string(),
        };
    }

    if has_http_scheme(value) {
        let kind = match Url::parse(value) {
            Ok(url) if is_digital_link(&url) => InputKind::DigitalLink,
            _ => InputKind::Url,
        };
        return ClassifiedInput {
            kind,
            canonical: value.to_string(),
        };
    }

    if let Some(path) = file_uri_path(value) {
        return ClassifiedInput {
            kind: InputKind::File,
            canonical: absolutize(&path),
        };
    }

    let path = Path::new(value);
    if !value.is_empty() && (path.exists() || looks_like_document_path(value)) {
        return ClassifiedInput {
            kind: InputKind::File,
            canonical: absolutize(path),
        };
    }

    ClassifiedInput {
        kind: InputKind::Url,
        canonical: value.to_string(),
    }
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn file_uri_path(value: &str) -> Option<PathBuf> {
    let rest = value.strip_prefix("file://")?;
    Url::parse(value)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .or_else(|| Some(PathBuf::from(rest)))
}

fn looks_like_document_path(value: &str) -> bool {
    let path_like = value.contains('/') || value.contains('\\') || value.starts_with('.');
    let has_doc_ext = Path::new(value)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    path_like && has_doc_ext
}

fn absolutize(path: &Path) -> String {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical.display().to_string();
    }
    if path.is_absolute() {
        return path.display().to_string();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path).display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
