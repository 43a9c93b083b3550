//! The lookup pipeline: query → resolve → fetch → extract → assemble.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use disclosure_common::{CandidateQuery, LookupError, Result};
use disclosure_config::DisclosureConfig;
use disclosure_extract::{CandidateRecord, assemble, extract_served};

use crate::fetch::{DocumentFetcher, HttpFetcher};
use crate::resolve::{NameResolver, StaticResolver};

/// Stateless orchestrator shared by every request.
#[derive(Clone)]
pub struct LookupService {
    resolver: Arc<dyn NameResolver>,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl LookupService {
    pub fn new(resolver: Arc<dyn NameResolver>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { resolver, fetcher }
    }

    /// Static resolver and HTTP fetcher wired from configuration.
    pub fn from_config(cfg: &DisclosureConfig) -> anyhow::Result<Self> {
        let resolver = StaticResolver::from_entries(&cfg.candidates)
            .context("invalid candidate table in configuration")?;
        let fetcher = HttpFetcher::from_config(&cfg.fetch).context("failed to build HTTP fetcher")?;
        tracing::debug!(candidates = resolver.len(), "lookup.service_ready");
        Ok(Self::new(Arc::new(resolver), Arc::new(fetcher)))
    }

    pub fn resolver(&self) -> &dyn NameResolver {
        self.resolver.as_ref()
    }

    /// Run one lookup end to end.
    ///
    /// A blank query fails before anything is resolved or fetched; an
    /// unparsable document fails without a partial record.
    pub async fn lookup(&self, raw: &str) -> Result<CandidateRecord> {
        let started = Instant::now();
        let query = CandidateQuery::parse(raw)?;

        let url = self.resolver.resolve(&query).inspect_err(|e| {
            tracing::info!(query = query.key(), error = %e, "lookup.unresolved");
        })?;
        tracing::debug!(query = query.key(), %url, "lookup.resolved");

        let doc = self.fetcher.fetch(&url).await.inspect_err(|e| {
            tracing::warn!(query = query.key(), %url, error = %e, "lookup.fetch_failed");
        })?;

        let digest = blake3::hash(&doc.bytes).to_hex();
        let size = doc.bytes.len();
        let fields = tokio::task::spawn_blocking(move || {
            extract_served(&doc.bytes, doc.content_type.as_deref())
        })
            .await
            .map_err(|e| LookupError::Parse(format!("extraction task failed: {e}")))
            .and_then(|res| res)
            .inspect_err(|e| {
                tracing::warn!(query = query.key(), %url, error = %e, "lookup.parse_failed");
            })?;
        let record = assemble(&query, url.as_str(), &fields);

        tracing::info!(
            query = query.key(),
            %url,
            bytes = size,
            %digest,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lookup.completed"
        );
        Ok(record)
    }
}
