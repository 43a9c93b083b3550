//! Label-anchored field extraction.
//!
//! Each target field is described by a [`FieldSpec`]: the label phrase that
//! anchors it, the structural walk that leads from the anchor to the value,
//! and what to report when the label is missing. A miss on one field never
//! affects another.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::tree::{
    LabelPattern, ParsedTree, enclosing, following_elements, normalized_text,
};

/// Longest text accepted from a badge-like value node.
pub const MAX_BADGE_CHARS: usize = 64;
/// Longest title heading accepted as a display name.
pub const MAX_NAME_CHARS: usize = 160;

/// Value reported for the education field when its section exists.
pub const EDUCATION_PRESENT: &str = "Detailed on Source";

/// Reported when a page carries no criminal-case section at all: the source
/// omits the section when nothing was declared.
pub const NO_CASES_REPORTED: &str = "0";

static TITLE_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1.main-title, h2.main-title, h3.main-title")
        .expect("invalid selector: title heading")
});

static TABLE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: td"));

static ABSENT: FieldOutcome = FieldOutcome::Absent;

static STANDARD: LazyLock<Extractor> = LazyLock::new(|| {
    Extractor::new(standard_specs()).expect("invalid label pattern in standard field specs")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CriminalCases,
    Assets,
    Education,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CriminalCases => "criminal_cases",
            Field::Assets => "assets",
            Field::Education => "education",
        }
    }
}

/// Result of extracting one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Found(String),
    /// The anchor (or the structure around it) is not in the document.
    Absent,
    /// The anchor is there but what sits next to it is not a usable value.
    Unparsable { reason: String },
}

impl FieldOutcome {
    pub fn value(&self) -> Option<&str> {
        match self {
            FieldOutcome::Found(v) => Some(v),
            _ => None,
        }
    }

    fn unparsable(reason: impl Into<String>) -> Self {
        FieldOutcome::Unparsable {
            reason: reason.into(),
        }
    }
}

/// How to get from an anchor element to the value.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// First `tag` element after the anchor in document order.
    FollowingBadge { tag: &'static str },
    /// Last cell of the table row enclosing the anchor.
    RowLastCell,
    /// The anchor's presence alone; reports a fixed marker.
    Presence { marker: &'static str },
}

/// What a missing label means for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenMissing {
    Absent,
    Default(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub label: &'static str,
    pub strategy: Strategy,
    pub when_missing: WhenMissing,
}

/// The fields a candidate disclosure page is mined for.
pub fn standard_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            field: Field::CriminalCases,
            label: "Criminal Case",
            strategy: Strategy::FollowingBadge { tag: "span" },
            when_missing: WhenMissing::Default(NO_CASES_REPORTED),
        },
        FieldSpec {
            field: Field::Assets,
            label: "Total Assets",
            strategy: Strategy::RowLastCell,
            // Zero assets is a claim; an unlabelled page is not evidence of it.
            when_missing: WhenMissing::Absent,
        },
        FieldSpec {
            field: Field::Education,
            label: "Education Detail",
            // TODO: parse the qualification itself once the section markup has a stable shape.
            strategy: Strategy::Presence {
                marker: EDUCATION_PRESENT,
            },
            when_missing: WhenMissing::Absent,
        },
    ]
}

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    /// Title heading text; `Absent` when the page has none.
    pub display_name: FieldOutcome,
    pub fields: BTreeMap<Field, FieldOutcome>,
}

impl ExtractedFields {
    pub fn get(&self, field: Field) -> &FieldOutcome {
        self.fields.get(&field).unwrap_or(&ABSENT)
    }
}

struct CompiledSpec {
    spec: FieldSpec,
    label: LabelPattern,
}

/// A set of field specs with their label patterns compiled.
pub struct Extractor {
    specs: Vec<CompiledSpec>,
}

impl Extractor {
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self, regex::Error> {
        let specs = specs
            .into_iter()
            .map(|spec| {
                let label = LabelPattern::new(spec.label)?;
                Ok(CompiledSpec { spec, label })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { specs })
    }

    /// The extractor for [`standard_specs`].
    pub fn standard() -> &'static Extractor {
        &STANDARD
    }

    pub fn extract(&self, tree: &ParsedTree) -> ExtractedFields {
        let display_name = extract_display_name(tree);
        let fields = self
            .specs
            .iter()
            .map(|compiled| {
                let outcome = extract_field(tree, compiled);
                tracing::debug!(
                    field = compiled.spec.field.as_str(),
                    label = compiled.label.phrase(),
                    outcome = ?outcome,
                    "extract.field"
                );
                (compiled.spec.field, outcome)
            })
            .collect();

        ExtractedFields {
            display_name,
            fields,
        }
    }
}

fn extract_display_name(tree: &ParsedTree) -> FieldOutcome {
    tree.html()
        .select(&TITLE_HEADING)
        .map(normalized_text)
        .find(|text| !text.is_empty() && text.chars().count() <= MAX_NAME_CHARS)
        .map_or(FieldOutcome::Absent, FieldOutcome::Found)
}

fn extract_field(tree: &ParsedTree, compiled: &CompiledSpec) -> FieldOutcome {
    let Some(anchor) = tree.find_anchor(&compiled.label) else {
        return match compiled.spec.when_missing {
            WhenMissing::Absent => FieldOutcome::Absent,
            WhenMissing::Default(value) => FieldOutcome::Found(value.to_string()),
        };
    };

    match &compiled.spec.strategy {
        Strategy::FollowingBadge { tag } => following_badge(anchor, tag),
        Strategy::RowLastCell => row_last_cell(anchor),
        Strategy::Presence { marker } => FieldOutcome::Found((*marker).to_string()),
    }
}

fn following_badge(anchor: ElementRef<'_>, tag: &str) -> FieldOutcome {
    let Some(badge) = following_elements(anchor).find(|el| el.value().name() == tag) else {
        return FieldOutcome::unparsable(format!("no <{tag}> near the label"));
    };
    let text = normalized_text(badge);
    if text.is_empty() {
        FieldOutcome::unparsable(format!("<{tag}> after the label is empty"))
    } else if text.chars().count() > MAX_BADGE_CHARS {
        FieldOutcome::unparsable(format!(
            "<{tag}> after the label is longer than {MAX_BADGE_CHARS} characters"
        ))
    } else {
        FieldOutcome::Found(text)
    }
}

fn row_last_cell(anchor: ElementRef<'_>) -> FieldOutcome {
    let Some(row) = enclosing(anchor, "tr") else {
        return FieldOutcome::Absent;
    };
    match row.select(&TABLE_CELL).last().map(normalized_text) {
        Some(text) if !text.is_empty() => FieldOutcome::Found(text),
        Some(_) => FieldOutcome::unparsable("last cell of the row is empty"),
        None => FieldOutcome::unparsable("row has no cells"),
    }
}
