//! Outward candidate record and the assembler that builds it.

use disclosure_common::CandidateQuery;
use serde::{Deserialize, Serialize};

use crate::fields::{ExtractedFields, Field, FieldOutcome};

/// The response object for one lookup. Keys for fields that were not found
/// are omitted rather than defaulted.
///
/// `criminal_cases` is normally always present: a page without the label
/// reports `"0"`. It is omitted only when the label is on the page but the
/// value beside it is unusable, because `"0"` there would be a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criminal_cases: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    pub source_url: String,
}

/// Merge extracted fields with provenance into the outward record.
///
/// The display name falls back to the query exactly as the caller typed it.
pub fn assemble(query: &CandidateQuery, source_url: &str, fields: &ExtractedFields) -> CandidateRecord {
    let name = fields
        .display_name
        .value()
        .map_or_else(|| query.raw().to_string(), str::to_string);

    CandidateRecord {
        name,
        criminal_cases: flatten(fields, Field::CriminalCases),
        assets: flatten(fields, Field::Assets),
        education: flatten(fields, Field::Education),
        source_url: source_url.to_string(),
    }
}

fn flatten(fields: &ExtractedFields, field: Field) -> Option<String> {
    match fields.get(field) {
        FieldOutcome::Found(value) => Some(value.clone()),
        FieldOutcome::Absent => None,
        FieldOutcome::Unparsable { reason } => {
            tracing::warn!(field = field.as_str(), %reason, "assemble.field_unparsable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const URL: &str = "https://myneta.info/LokSabha2024/candidate.php?candidate_id=5676";

    fn fields(display_name: FieldOutcome, entries: Vec<(Field, FieldOutcome)>) -> ExtractedFields {
        ExtractedFields {
            display_name,
            fields: entries.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn found_values_flow_through() {
        let q = CandidateQuery::parse("hema malini").unwrap();
        let record = assemble(
            &q,
            URL,
            &fields(
                FieldOutcome::Found("Hema Malini".into()),
                vec![
                    (Field::CriminalCases, FieldOutcome::Found("0".into())),
                    (Field::Assets, FieldOutcome::Found("Rs 1".into())),
                    (Field::Education, FieldOutcome::Found("Detailed on Source".into())),
                ],
            ),
        );
        assert_eq!(
            record,
            CandidateRecord {
                name: "Hema Malini".into(),
                criminal_cases: Some("0".into()),
                assets: Some("Rs 1".into()),
                education: Some("Detailed on Source".into()),
                source_url: URL.into(),
            }
        );
    }

    #[test]
    fn criminal_cases_key_is_dropped_only_when_the_badge_is_unusable() {
        let q = CandidateQuery::parse("x").unwrap();

        let unlabelled = crate::extract_document(b"<p>Assets declared</p>").unwrap();
        let record = assemble(&q, URL, &unlabelled);
        assert_eq!(record.criminal_cases.as_deref(), Some("0"));

        let no_badge = crate::extract_document(b"<p>Criminal Cases: pending</p>").unwrap();
        let json = serde_json::to_value(assemble(&q, URL, &no_badge)).unwrap();
        assert!(!json.as_object().unwrap().contains_key("criminal_cases"));
    }

    #[test]
    fn name_falls_back_to_the_raw_query() {
        let q = CandidateQuery::parse("  hEMA malini").unwrap();
        let record = assemble(&q, URL, &fields(FieldOutcome::Absent, vec![]));
        assert_eq!(record.name, "  hEMA malini");
    }

    #[test]
    fn absent_and_unparsable_fields_are_omitted_from_json() {
        let q = CandidateQuery::parse("x").unwrap();
        let record = assemble(
            &q,
            URL,
            &fields(
                FieldOutcome::Absent,
                vec![
                    (Field::CriminalCases, FieldOutcome::Found("2".into())),
                    (
                        Field::Assets,
                        FieldOutcome::Unparsable {
                            reason: "row has no cells".into(),
                        },
                    ),
                ],
            ),
        );
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["criminal_cases"], "2");
        assert!(!obj.contains_key("assets"));
        assert!(!obj.contains_key("education"));
        assert_eq!(obj["source_url"], URL);
    }
}
