//! Response encoding selection from an `accept`-style header value.
//!
//! The header is reduced to a file-extension-like token first (`text/plain`
//! becomes `txt`), and only `txt` and `json` map to an encoding. Everything
//! else falls back to the caller's default.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[serde(alias = "text", alias = "plain")]
    Txt,
    #[default]
    Json,
}

impl Encoding {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Txt => "text/plain; charset=utf-8",
            Encoding::Json => "application/json",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" => Some(Encoding::Txt),
            "json" => Some(Encoding::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Txt => write!(f, "txt"),
            Encoding::Json => write!(f, "json"),
        }
    }
}

// Primary extension per media type; only the first entry for a type counts.
const MEDIA_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", "txt"),
    ("application/json", "json"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/csv", "csv"),
    ("text/xml", "xml"),
    ("text/markdown", "md"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
    ("application/xml", "xml"),
    ("application/yaml", "yaml"),
    ("application/pdf", "pdf"),
    ("application/octet-stream", "bin"),
    ("application/ld+json", "jsonld"),
    ("application/manifest+json", "webmanifest"),
    ("image/png", "png"),
    ("image/svg+xml", "svg"),
];

/// Extension token for a media-type string, if it is a known single type.
///
/// Only the leading token is considered, up to the first `;` or whitespace;
/// a list such as `text/plain,application/json` is therefore not a known
/// type. Matching ignores ASCII case.
#[must_use]
pub fn media_type_extension(media_type: &str) -> Option<&'static str> {
    let token = media_type
        .trim_start()
        .split(|c: char| c == ';' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    if token.is_empty() {
        return None;
    }
    MEDIA_TYPE_EXTENSIONS
        .iter()
        .find(|(ty, _)| ty.eq_ignore_ascii_case(token))
        .map(|(_, ext)| *ext)
}

/// Pick the response encoding. Never fails: anything unrecognized yields
/// `default`.
#[must_use]
pub fn select_encoding(accept: Option<&str>, default: Encoding) -> Encoding {
    accept
        .and_then(media_type_extension)
        .and_then(Encoding::from_extension)
        .unwrap_or(default)
}

/// [`select_encoding`] over a request's `accept` header.
#[must_use]
pub fn select_from_headers(headers: &http::HeaderMap, default: Encoding) -> Encoding {
    let accept = headers
        .get(http::header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    select_encoding(accept, default)
}
