//! Person store boundary.
//!
//! # Responsibility
//! - Define the asynchronous fetch/save contract consumed by workspaces.
//! - Provide the SQLite-backed implementation over `SqlitePersonRepository`.
//!
//! # Invariants
//! - `save` never receives a negative relationship type; doing so is a
//!   contract violation reported as `StoreError`, never as a soft failure.
//! - `SaveResponse { success: false }` is a normal, handled outcome.
//! - Every call resolves exactly once with a terminal outcome.

use crate::db::{open_db, DbError};
use crate::model::person::{Person, PersonAllDetails, PersonFullDetails, PersonId};
use crate::model::relationship::{RelationshipEdge, RelationshipToMe};
use crate::repo::person_repo::{PersonRepoError, PersonRepository, SqlitePersonRepository};
use async_trait::async_trait;
use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Result envelope of a save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaveResponse {
    pub success: bool,
    pub error_message: Option<String>,
    /// Set when the save inserted a new person.
    pub new_id: Option<String>,
}

impl SaveResponse {
    pub fn saved() -> Self {
        Self {
            success: true,
            error_message: None,
            new_id: None,
        }
    }

    pub fn created(id: PersonId) -> Self {
        Self {
            success: true,
            error_message: None,
            new_id: Some(id.to_string()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            new_id: None,
        }
    }

    /// Parses `new_id` as a person id.
    pub fn new_person_id(&self) -> Option<PersonId> {
        self.new_id
            .as_deref()
            .and_then(|value| value.trim().parse().ok())
    }
}

/// Store call failures.
#[derive(Debug)]
pub enum StoreError {
    /// Call was rejected before producing a result.
    Transport(String),
    /// Requested person does not exist.
    PersonNotFound(PersonId),
    /// A child-of relationship type was handed to the store.
    NegativeRelationshipType(RelationshipEdge),
    /// Any other repository-level failure.
    Repo(PersonRepoError),
}

impl StoreError {
    /// True for programmer errors that must fail fast.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Self::NegativeRelationshipType(_) => true,
            Self::Repo(err) => err.is_contract_violation(),
            Self::Transport(_) | Self::PersonNotFound(_) => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "store call rejected: {message}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::NegativeRelationshipType(edge) => write!(
                f,
                "child-of relationship type {} must not reach the store",
                edge.relationship_type.code()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonRepoError> for StoreError {
    fn from(value: PersonRepoError) -> Self {
        match value {
            PersonRepoError::NotFound(id) => Self::PersonNotFound(id),
            PersonRepoError::NegativeRelationshipType(edge) => Self::NegativeRelationshipType(edge),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(PersonRepoError::Db(value))
    }
}

/// Asynchronous person/relationship store.
#[async_trait(?Send)]
pub trait PersonStore {
    /// Loads one person's details and relationships from that person's view.
    async fn load_full_details(&self, person_id: PersonId) -> Result<PersonAllDetails, StoreError>;

    /// Saves details and the parent → child edges touching the person.
    async fn save(
        &self,
        details: &PersonFullDetails,
        relationships: &[RelationshipEdge],
    ) -> Result<SaveResponse, StoreError>;

    /// Lists every person summary.
    async fn load_people(&self) -> Result<Vec<Person>, StoreError>;

    /// Lists every stored edge of the family graph.
    async fn load_relationships(&self) -> Result<Vec<RelationshipEdge>, StoreError>;
}

/// Rejects any child-of edge before it reaches a store implementation.
pub fn ensure_persistable(relationships: &[RelationshipEdge]) -> Result<(), StoreError> {
    match relationships.iter().find(|edge| !edge.is_persistable()) {
        Some(edge) => Err(StoreError::NegativeRelationshipType(*edge)),
        None => Ok(()),
    }
}

/// SQLite-backed store owning one migrated connection.
pub struct SqlitePersonStore {
    conn: Connection,
}

impl SqlitePersonStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        SqlitePersonRepository::try_new(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(open_db(path)?)
    }

    /// Borrow of the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn repo(&self) -> Result<SqlitePersonRepository<'_>, StoreError> {
        SqlitePersonRepository::try_new(&self.conn).map_err(Into::into)
    }
}

#[async_trait(?Send)]
impl PersonStore for SqlitePersonStore {
    async fn load_full_details(&self, person_id: PersonId) -> Result<PersonAllDetails, StoreError> {
        let repo = self.repo()?;
        let details = repo
            .get_person(person_id)?
            .ok_or(StoreError::PersonNotFound(person_id))?
            .with_defaults();
        let relationships = repo
            .list_edges_for(person_id)?
            .iter()
            .filter_map(|edge| RelationshipToMe::from_edge(edge, person_id))
            .collect::<Vec<_>>();

        info!(
            "event=person_load module=store status=ok person_id={person_id} relationships={}",
            relationships.len()
        );
        Ok(PersonAllDetails {
            details,
            relationships,
        })
    }

    async fn save(
        &self,
        details: &PersonFullDetails,
        relationships: &[RelationshipEdge],
    ) -> Result<SaveResponse, StoreError> {
        ensure_persistable(relationships)?;

        let repo = self.repo()?;
        match repo.save_person(details, relationships) {
            Ok(stored_id) => {
                info!(
                    "event=person_save module=store status=ok person_id={stored_id} relationships={}",
                    relationships.len()
                );
                if details.is_unassigned() {
                    Ok(SaveResponse::created(stored_id))
                } else {
                    Ok(SaveResponse::saved())
                }
            }
            Err(err) if err.is_contract_violation() => Err(err.into()),
            Err(err) => {
                warn!(
                    "event=person_save module=store status=error person_id={} error={}",
                    details.id, err
                );
                Ok(SaveResponse::failure(err.to_string()))
            }
        }
    }

    async fn load_people(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.repo()?.list_people()?)
    }

    async fn load_relationships(&self) -> Result<Vec<RelationshipEdge>, StoreError> {
        Ok(self.repo()?.list_edges()?)
    }
}
