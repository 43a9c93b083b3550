//! Candidate name → source document URL resolution.
//!
//! Resolution is an exact-key lookup on the normalized query; there is no
//! prefix or fuzzy matching. A miss is terminal for the request.

use std::collections::HashMap;

use disclosure_common::query::normalize_key;
use disclosure_common::{CandidateQuery, LookupError, Result};
use disclosure_config::CandidateEntry;
use url::Url;

/// Candidates known without any configuration.
pub const BUILT_IN_CANDIDATES: &[(&str, &str)] = &[
    (
        "hema malini",
        "https://myneta.info/LokSabha2024/candidate.php?candidate_id=5676",
    ),
    (
        "yogi adityanath",
        "https://myneta.info/uttarpradesh2022/candidate.php?candidate_id=6486",
    ),
    (
        "akhilesh yadav",
        "https://myneta.info/uttarpradesh2022/candidate.php?candidate_id=6487",
    ),
];

pub trait NameResolver: Send + Sync {
    fn resolve(&self, query: &CandidateQuery) -> Result<Url>;

    /// Number of names this resolver can answer for, when that is known.
    fn known_candidates(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
#[error("candidate {name:?} has an invalid source URL {url:?}: {source}")]
pub struct InvalidEntry {
    pub name: String,
    pub url: String,
    #[source]
    pub source: url::ParseError,
}

/// Fixed in-memory table, normally the built-ins plus configured entries.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, Url>,
}

impl StaticResolver {
    /// The built-in table only.
    pub fn built_in() -> Self {
        let mut resolver = Self::default();
        for (name, url) in BUILT_IN_CANDIDATES {
            // Built-in URLs are literals covered by tests.
            if let Ok(url) = Url::parse(url) {
                resolver.table.insert(normalize_key(name), url);
            }
        }
        resolver
    }

    /// Built-ins overlaid with configured entries; a configured name replaces
    /// a built-in with the same normalized key.
    pub fn from_entries(entries: &[CandidateEntry]) -> std::result::Result<Self, InvalidEntry> {
        let mut resolver = Self::built_in();
        for entry in entries {
            resolver.insert(&entry.name, &entry.url)?;
        }
        Ok(resolver)
    }

    pub fn insert(&mut self, name: &str, url: &str) -> std::result::Result<(), InvalidEntry> {
        let parsed = Url::parse(url.trim()).map_err(|source| InvalidEntry {
            name: name.to_string(),
            url: url.to_string(),
            source,
        })?;
        self.table.insert(normalize_key(name), parsed);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl NameResolver for StaticResolver {
    fn resolve(&self, query: &CandidateQuery) -> Result<Url> {
        self.table
            .get(query.key())
            .cloned()
            .ok_or_else(|| LookupError::NotFound(query.raw().trim().to_string()))
    }

    fn known_candidates(&self) -> Option<usize> {
        Some(self.table.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(raw: &str) -> CandidateQuery {
        CandidateQuery::parse(raw).unwrap()
    }

    #[test]
    fn built_ins_all_parse() {
        assert_eq!(StaticResolver::built_in().len(), BUILT_IN_CANDIDATES.len());
    }

    #[test]
    fn resolution_ignores_case_and_spacing() {
        let resolver = StaticResolver::built_in();
        for raw in ["Hema Malini", "hema malini", "  HEMA   malini\t"] {
            let url = resolver.resolve(&q(raw)).unwrap();
            assert_eq!(
                url.as_str(),
                "https://myneta.info/LokSabha2024/candidate.php?candidate_id=5676"
            );
        }
    }

    #[test]
    fn partial_names_do_not_resolve() {
        let resolver = StaticResolver::built_in();
        for raw in ["hema", "malini", "hema malini ji"] {
            assert_eq!(
                resolver.resolve(&q(raw)).unwrap_err().kind(),
                "not_found",
                "{raw} should not resolve"
            );
        }
    }

    #[test]
    fn configured_entries_extend_and_override() {
        let resolver = StaticResolver::from_entries(&[
            CandidateEntry {
                name: "Jane  Doe".into(),
                url: "https://example.org/c/1".into(),
            },
            CandidateEntry {
                name: "HEMA MALINI".into(),
                url: "https://mirror.example.org/c/5676".into(),
            },
        ])
        .unwrap();

        assert_eq!(resolver.len(), BUILT_IN_CANDIDATES.len() + 1);
        assert_eq!(
            resolver.resolve(&q("jane doe")).unwrap().as_str(),
            "https://example.org/c/1"
        );
        assert_eq!(
            resolver.resolve(&q("Hema Malini")).unwrap().host_str(),
            Some("mirror.example.org")
        );
    }

    #[test]
    fn invalid_configured_url_is_rejected() {
        let err = StaticResolver::from_entries(&[CandidateEntry {
            name: "Jane Doe".into(),
            url: "not a url".into(),
        }])
        .unwrap_err();
        assert_eq!(err.name, "Jane Doe");
    }
}
