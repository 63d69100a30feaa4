//! Person domain model.
//!
//! # Responsibility
//! - Define the summary (`Person`) and full-detail (`PersonFullDetails`)
//!   records exchanged with the store.
//! - Provide validation used before any write.
//!
//! # Invariants
//! - `id` is immutable once assigned; `UNASSIGNED_PERSON_ID` marks a record
//!   the store has not inserted yet.
//! - `display_name` must be non-blank for a record to be saved.
//! - `"?"` in a date field is the "unknown" sentinel, distinct from absent.

use crate::model::relationship::RelationshipToMe;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer person identifier assigned by the store.
pub type PersonId = i64;

/// Id carried by a record that has not been inserted yet.
pub const UNASSIGNED_PERSON_ID: PersonId = 0;

/// Date sentinel meaning "unknown".
pub const UNKNOWN_DATE: &str = "?";

/// Veracity applied to loaded records that carry none.
pub const DEFAULT_VERACITY: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Single-letter storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}

/// Identity and biographical summary shown in lists and charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
    pub gender: Gender,
    pub date_of_birth: Option<String>,
    pub date_of_death: Option<String>,
}

impl Person {
    pub fn new(id: PersonId, display_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            gender,
            date_of_birth: None,
            date_of_death: None,
        }
    }
}

/// Full-detail record edited by the person editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonFullDetails {
    pub id: PersonId,
    pub display_name: String,
    pub gender: Gender,
    pub date_of_birth: Option<String>,
    pub date_of_death: Option<String>,
    pub additional_notes: Option<String>,
    pub veracity: Option<String>,
}

impl PersonFullDetails {
    /// Builds a full-detail record from a summary with empty annotations.
    pub fn from_person(person: &Person) -> Self {
        Self {
            id: person.id,
            display_name: person.display_name.clone(),
            gender: person.gender,
            date_of_birth: person.date_of_birth.clone(),
            date_of_death: person.date_of_death.clone(),
            additional_notes: None,
            veracity: None,
        }
    }

    /// Summary projection.
    pub fn person(&self) -> Person {
        Person {
            id: self.id,
            display_name: self.display_name.clone(),
            gender: self.gender,
            date_of_birth: self.date_of_birth.clone(),
            date_of_death: self.date_of_death.clone(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_PERSON_ID
    }

    /// Fills in defaults the store may omit.
    pub fn with_defaults(mut self) -> Self {
        if self.veracity.is_none() {
            self.veracity = Some(DEFAULT_VERACITY.to_string());
        }
        self
    }

    /// Returns every validation failure, in field order.
    pub fn validation_errors(&self) -> Vec<PersonValidationError> {
        let mut errors = Vec::new();
        if self.display_name.trim().is_empty() {
            errors.push(PersonValidationError::BlankDisplayName);
        }
        if self.id < UNASSIGNED_PERSON_ID {
            errors.push(PersonValidationError::InvalidId(self.id));
        }
        errors
    }

    /// Returns the first validation failure, if any.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Details plus the relationships of one person, from that person's view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonAllDetails {
    pub details: PersonFullDetails,
    pub relationships: Vec<RelationshipToMe>,
}

/// Local validation failures for a person record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    BlankDisplayName,
    InvalidId(PersonId),
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankDisplayName => write!(f, "Display name cannot be blank"),
            Self::InvalidId(id) => write!(f, "person id must not be negative, got {id}"),
        }
    }
}

impl Error for PersonValidationError {}
