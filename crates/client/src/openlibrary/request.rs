//! Search request construction and metadata cleaning.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::LookupError;

static EPUB_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.epub$").unwrap());
static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-.]+").unwrap());
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Query parameters for `GET /search.json`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query.
    pub q: String,
    /// Maximum number of documents returned.
    pub limit: u8,
    /// Restrict returned fields to the cover id.
    pub fields: &'static str,
}

impl SearchRequest {
    /// Build a request from stored document metadata.
    ///
    /// Title and author are cleaned first; the query is `"<title> <author>"`
    /// when an author remains after cleaning, otherwise just the title.
    pub fn from_metadata(title: &str, author: Option<&str>, limit: u8) -> Result<Self, LookupError> {
        let title = clean_search_term(title);
        let author = author.map(clean_search_term).filter(|a| !a.is_empty());

        let q = match author {
            Some(author) if title.is_empty() => author,
            Some(author) => format!("{title} {author}"),
            None => title,
        };

        if q.is_empty() {
            return Err(LookupError::InvalidQuery("title and author are empty after cleaning".to_string()));
        }

        Ok(Self { q, limit, fields: "cover_i" })
    }
}

/// Clean a stored title or author for use as a search term.
///
/// Strips a trailing `.epub`, turns runs of `_`, `-` and `.` into single
/// spaces, drops `(...)` and `[...]` groups, and collapses whitespace.
pub fn clean_search_term(raw: &str) -> String {
    let s = EPUB_SUFFIX.replace(raw, "");
    let s = SEPARATOR_RUNS.replace_all(&s, " ");
    let s = PARENTHESIZED.replace_all(&s, "");
    let s = BRACKETED.replace_all(&s, "");
    let s = WHITESPACE_RUNS.replace_all(&s, " ");
    s.trim().to_string()
}
