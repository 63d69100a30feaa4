//! Relationship domain model.
//!
//! # Responsibility
//! - Define the closed set of twelve signed relationship-type codes.
//! - Convert between the stored parent→child edge and the per-person
//!   "relationship to me" view used by the editor.
//!
//! # Invariants
//! - Positive codes name a parental role and are the only codes persisted.
//! - A negative code is the arithmetic negation of a positive one and denotes
//!   the child-of viewpoint; it exists only in memory.
//! - Edges are read parent → child: `person_id` is the parent,
//!   `related_person_id` the child.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Signed relationship-type code.
///
/// Serialized as its exact integer value so that the reverse-direction
/// convention survives any wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum RelationshipType {
    Father = 1,
    Mother = 2,
    StepFather = 3,
    StepMother = 4,
    AdoptedFather = 5,
    AdoptedMother = 6,

    ChildOfFather = -1,
    ChildOfMother = -2,
    StepChildOfFather = -3,
    StepChildOfMother = -4,
    AdoptedChildOfFather = -5,
    AdoptedChildOfMother = -6,
}

/// The six persisted parental roles, in code order.
pub const PARENTAL_ROLES: [RelationshipType; 6] = [
    RelationshipType::Father,
    RelationshipType::Mother,
    RelationshipType::StepFather,
    RelationshipType::StepMother,
    RelationshipType::AdoptedFather,
    RelationshipType::AdoptedMother,
];

impl RelationshipType {
    /// Integer code shared with the store.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Arithmetic negation: parental role <-> child-of inverse.
    pub fn negate(self) -> Self {
        match self {
            Self::Father => Self::ChildOfFather,
            Self::Mother => Self::ChildOfMother,
            Self::StepFather => Self::StepChildOfFather,
            Self::StepMother => Self::StepChildOfMother,
            Self::AdoptedFather => Self::AdoptedChildOfFather,
            Self::AdoptedMother => Self::AdoptedChildOfMother,
            Self::ChildOfFather => Self::Father,
            Self::ChildOfMother => Self::Mother,
            Self::StepChildOfFather => Self::StepFather,
            Self::StepChildOfMother => Self::StepMother,
            Self::AdoptedChildOfFather => Self::AdoptedFather,
            Self::AdoptedChildOfMother => Self::AdoptedMother,
        }
    }

    /// True iff the code is positive, i.e. allowed in the store.
    pub fn is_persisted(self) -> bool {
        self.code() > 0
    }

    /// Returns the positive parental role of either sign.
    pub fn parental_role(self) -> Self {
        if self.is_persisted() {
            self
        } else {
            self.negate()
        }
    }

    /// PascalCase identifier of the kind, as named in the shared enum.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Father => "Father",
            Self::Mother => "Mother",
            Self::StepFather => "StepFather",
            Self::StepMother => "StepMother",
            Self::AdoptedFather => "AdoptedFather",
            Self::AdoptedMother => "AdoptedMother",
            Self::ChildOfFather => "ChildOfFather",
            Self::ChildOfMother => "ChildOfMother",
            Self::StepChildOfFather => "StepChildOfFather",
            Self::StepChildOfMother => "StepChildOfMother",
            Self::AdoptedChildOfFather => "AdoptedChildOfFather",
            Self::AdoptedChildOfMother => "AdoptedChildOfMother",
        }
    }
}

impl From<RelationshipType> for i32 {
    fn from(value: RelationshipType) -> Self {
        value.code()
    }
}

impl TryFrom<i32> for RelationshipType {
    type Error = InvalidRelationshipType;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Father),
            2 => Ok(Self::Mother),
            3 => Ok(Self::StepFather),
            4 => Ok(Self::StepMother),
            5 => Ok(Self::AdoptedFather),
            6 => Ok(Self::AdoptedMother),
            -1 => Ok(Self::ChildOfFather),
            -2 => Ok(Self::ChildOfMother),
            -3 => Ok(Self::StepChildOfFather),
            -4 => Ok(Self::StepChildOfMother),
            -5 => Ok(Self::AdoptedChildOfFather),
            -6 => Ok(Self::AdoptedChildOfMother),
            other => Err(InvalidRelationshipType(other)),
        }
    }
}

/// An integer outside the twelve defined relationship codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRelationshipType(pub i32);

impl Display for InvalidRelationshipType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid relationship type code: {}", self.0)
    }
}

impl Error for InvalidRelationshipType {}

/// Directed parent → child link between two persons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelationshipEdge {
    /// Parent end of the edge.
    pub person_id: PersonId,
    /// Child end of the edge.
    pub related_person_id: PersonId,
    /// Parental role of `person_id`. Positive whenever the edge is persisted.
    #[serde(rename = "Type")]
    pub relationship_type: RelationshipType,
    /// Reserved; carried through untouched.
    pub state: i32,
}

impl RelationshipEdge {
    pub fn new(
        person_id: PersonId,
        related_person_id: PersonId,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            person_id,
            related_person_id,
            relationship_type,
            state: 0,
        }
    }

    /// Whether this edge may be written to the store.
    pub fn is_persistable(&self) -> bool {
        self.relationship_type.is_persisted()
    }

    /// Whether `person_id` is one of the two endpoints.
    pub fn touches(&self, person_id: PersonId) -> bool {
        self.person_id == person_id || self.related_person_id == person_id
    }
}

/// One relationship seen from a single person's point of view.
///
/// Positive type: `related_person_id` is my <type>.
/// Negative type: `related_person_id` is my child through the negated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelationshipToMe {
    pub related_person_id: PersonId,
    #[serde(rename = "Type")]
    pub relationship_type: RelationshipType,
    pub state: i32,
}

impl RelationshipToMe {
    pub fn new(related_person_id: PersonId, relationship_type: RelationshipType) -> Self {
        Self {
            related_person_id,
            relationship_type,
            state: 0,
        }
    }

    /// Converts to the stored parent → child edge; the result is always positive.
    pub fn to_edge(&self, me: PersonId) -> RelationshipEdge {
        if self.relationship_type.is_persisted() {
            RelationshipEdge {
                person_id: self.related_person_id,
                related_person_id: me,
                relationship_type: self.relationship_type,
                state: self.state,
            }
        } else {
            RelationshipEdge {
                person_id: me,
                related_person_id: self.related_person_id,
                relationship_type: self.relationship_type.negate(),
                state: self.state,
            }
        }
    }

    /// Projects an edge onto `me`. Returns `None` when `me` is not an endpoint.
    pub fn from_edge(edge: &RelationshipEdge, me: PersonId) -> Option<Self> {
        let role = edge.relationship_type.parental_role();
        if edge.related_person_id == me {
            Some(Self {
                related_person_id: edge.person_id,
                relationship_type: role,
                state: edge.state,
            })
        } else if edge.person_id == me {
            Some(Self {
                related_person_id: edge.related_person_id,
                relationship_type: role.negate(),
                state: edge.state,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RelationshipToMe, RelationshipType, PARENTAL_ROLES};

    #[test]
    fn negation_is_an_involution_that_flips_persistability() {
        for role in PARENTAL_ROLES {
            assert_eq!(role.negate().negate(), role);
            assert!(role.is_persisted());
            assert!(!role.negate().is_persisted());
            assert_eq!(role.negate().code(), -role.code());
        }
    }

    #[test]
    fn try_from_rejects_codes_outside_the_closed_set() {
        assert!(RelationshipType::try_from(0).is_err());
        assert!(RelationshipType::try_from(7).is_err());
        assert!(RelationshipType::try_from(-7).is_err());
        assert_eq!(
            RelationshipType::try_from(-4).expect("known code"),
            RelationshipType::StepChildOfMother
        );
    }

    #[test]
    fn child_view_maps_to_edge_with_me_as_parent() {
        let rel = RelationshipToMe::new(20, RelationshipType::ChildOfMother);
        let edge = rel.to_edge(10);
        assert_eq!(edge.person_id, 10);
        assert_eq!(edge.related_person_id, 20);
        assert_eq!(edge.relationship_type, RelationshipType::Mother);
    }

    #[test]
    fn edge_projection_inverts_to_edge() {
        let rel = RelationshipToMe::new(7, RelationshipType::AdoptedFather);
        let edge = rel.to_edge(3);
        assert_eq!(RelationshipToMe::from_edge(&edge, 3), Some(rel));
        assert_eq!(
            RelationshipToMe::from_edge(&edge, 7).map(|value| value.relationship_type),
            Some(RelationshipType::AdoptedChildOfFather)
        );
        assert_eq!(RelationshipToMe::from_edge(&edge, 99), None);
    }
}
