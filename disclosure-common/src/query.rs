use crate::{LookupError, Result};

/// A caller-supplied candidate identifier.
///
/// Keeps the raw string (the display-name fallback echoes it verbatim) next to
/// the lookup key: trimmed, lower-cased, inner whitespace collapsed.
///
/// ```
/// use disclosure_common::CandidateQuery;
///
/// let q = CandidateQuery::parse("  Hema   MALINI ").unwrap();
/// assert_eq!(q.key(), "hema malini");
/// assert_eq!(q.raw(), "  Hema   MALINI ");
/// assert!(CandidateQuery::parse(" \t ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    raw: String,
    key: String,
}

impl CandidateQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let key = normalize_key(raw);
        if key.is_empty() {
            return Err(LookupError::Client("Name is required".into()));
        }
        Ok(Self {
            raw: raw.to_string(),
            key,
        })
    }

    /// The query exactly as the caller sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized form used for exact-key resolution.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Normalization shared by queries and configured resolver entries.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
