//! Display text for relationships and life dates.
//!
//! # Responsibility
//! - Turn signed relationship codes into human-readable labels.
//! - Render birth/death years for list and chart captions.
//!
//! # Invariants
//! - Both parental genders of one lineage collapse to a single child label.
//! - `"?"` always renders as `?`; an absent death date renders as `Present`.

use crate::model::person::UNKNOWN_DATE;
use crate::model::relationship::{InvalidRelationshipType, RelationshipType};
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

const PRESENT_LABEL: &str = "Present";

/// Splits a PascalCase identifier into words, lower-casing all but the first.
///
/// `"StepFather"` -> `"Step father"`.
pub fn humanize_identifier(identifier: &str) -> String {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut result = String::with_capacity(identifier.len() + 4);
    result.push(first);
    for ch in chars {
        if ch.is_uppercase() {
            result.push(' ');
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Label for a signed relationship type.
pub fn relationship_text(relationship_type: RelationshipType) -> String {
    match relationship_type {
        RelationshipType::ChildOfFather | RelationshipType::ChildOfMother => "Child".to_string(),
        RelationshipType::StepChildOfFather | RelationshipType::StepChildOfMother => {
            "Step Child".to_string()
        }
        RelationshipType::AdoptedChildOfFather | RelationshipType::AdoptedChildOfMother => {
            "Adopted Child".to_string()
        }
        parental => humanize_identifier(parental.identifier()),
    }
}

/// Label for a raw relationship code from an external boundary.
pub fn relationship_text_for_code(code: i32) -> Result<String, InvalidRelationshipType> {
    RelationshipType::try_from(code).map(relationship_text)
}

/// Year caption for one date field, or `default_label` when none is readable.
pub fn year_text(date: Option<&str>, default_label: &str) -> String {
    let Some(value) = date.map(str::trim).filter(|value| !value.is_empty()) else {
        return default_label.to_string();
    };
    if value == UNKNOWN_DATE {
        return UNKNOWN_DATE.to_string();
    }
    YEAR_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|year| year.as_str().to_string())
        .unwrap_or_else(|| default_label.to_string())
}

/// Birth and death years joined by an em dash, with fallbacks for missing dates.
pub fn dates_text(date_of_birth: Option<&str>, date_of_death: Option<&str>) -> String {
    format!(
        "{} \u{2014} {}",
        year_text(date_of_birth, UNKNOWN_DATE),
        year_text(date_of_death, PRESENT_LABEL)
    )
}
