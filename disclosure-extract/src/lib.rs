//! Label-anchored field extraction for candidate disclosure pages.
//!
//! The source pages have no schema: values are found by locating a text label
//! ("Criminal Case", "Total Assets", "Education Detail") and walking a bounded
//! neighbourhood of the tree around it. Extraction degrades per field:
//!
//! - a missing label yields `Absent` (or a field's declared default),
//! - an anchor with no usable value next to it yields `Unparsable`,
//! - only a document that cannot be decoded or holds nothing at all fails
//!   the whole call.
//!
//! ```
//! use disclosure_common::CandidateQuery;
//! use disclosure_extract::{assemble, extract_document};
//!
//! let html = br#"<h2 class="main-title">Jane Doe</h2>
//!     <table><tr><td>Total Assets</td><td>Rs 5,00,000</td></tr></table>"#;
//! let fields = extract_document(html).unwrap();
//! let query = CandidateQuery::parse("jane doe").unwrap();
//! let record = assemble(&query, "https://example.org/c/1", &fields);
//!
//! assert_eq!(record.name, "Jane Doe");
//! assert_eq!(record.criminal_cases.as_deref(), Some("0"));
//! assert_eq!(record.assets.as_deref(), Some("Rs 5,00,000"));
//! assert_eq!(record.education, None);
//! ```
pub mod decode;
pub mod fields;
pub mod record;
pub mod tree;

pub use fields::{ExtractedFields, Extractor, Field, FieldOutcome, FieldSpec, Strategy, WhenMissing};
pub use record::{CandidateRecord, assemble};
pub use decode::decode_document;
pub use tree::{ParsedTree, parse_document, parse_served};

/// Run the standard field specs over a parsed tree.
pub fn extract(tree: &ParsedTree) -> ExtractedFields {
    Extractor::standard().extract(tree)
}

/// Parse `bytes` and extract the standard fields.
pub fn extract_document(bytes: &[u8]) -> disclosure_common::Result<ExtractedFields> {
    extract_served(bytes, None)
}

/// [`extract_document`] for a fetched body, decoded per its `Content-Type`.
pub fn extract_served(
    bytes: &[u8],
    content_type: Option<&str>,
) -> disclosure_common::Result<ExtractedFields> {
    let tree = parse_served(bytes, content_type)?;
    Ok(extract(&tree))
}
