//! Candidate lookup: name resolution, source retrieval and the pipeline that
//! ties them to extraction.
//!
//! - `resolve`: normalized name → source URL (`NameResolver`, `StaticResolver`)
//! - `fetch`: URL → raw document bytes (`DocumentFetcher`, `HttpFetcher`)
//! - `lookup`: `LookupService`, the orchestrator the API and CLI share

pub mod fetch;
pub mod lookup;
pub mod resolve;

pub use fetch::{DocumentFetcher, HttpFetcher, SourceDocument};
pub use lookup::LookupService;
pub use resolve::{BUILT_IN_CANDIDATES, InvalidEntry, NameResolver, StaticResolver};
