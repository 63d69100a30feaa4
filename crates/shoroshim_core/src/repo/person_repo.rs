//! Person and relationship repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for person records and parent → child edges.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - Write paths call `PersonFullDetails::validate()` before SQL mutations.
//! - A negative relationship type never reaches SQL; it is rejected as
//!   `NegativeRelationshipType`.
//! - Edge listing is deterministic: insertion order (`rowid ASC`).

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::person::{Gender, Person, PersonFullDetails, PersonId, PersonValidationError};
use crate::model::relationship::{RelationshipEdge, RelationshipType};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    display_name,
    gender,
    date_of_birth,
    date_of_death,
    additional_notes,
    veracity
FROM persons";

const EDGE_SELECT_SQL: &str = "SELECT
    person_id,
    related_person_id,
    type,
    state
FROM relationships";

pub type PersonRepoResult<T> = Result<T, PersonRepoError>;

/// Errors from person repository operations.
#[derive(Debug)]
pub enum PersonRepoError {
    /// Record failed local validation.
    Validation(PersonValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target person does not exist.
    NotFound(PersonId),
    /// A child-of (negative) type was presented for storage.
    NegativeRelationshipType(RelationshipEdge),
    /// Edge does not touch the person being saved.
    ForeignEdge {
        person_id: PersonId,
        edge: RelationshipEdge,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl PersonRepoError {
    /// True for programmer errors that must not be reported as a soft failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::NegativeRelationshipType(_) | Self::ForeignEdge { .. }
        )
    }
}

impl Display for PersonRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::NegativeRelationshipType(edge) => write!(
                f,
                "refusing to store child-of relationship type {} ({} -> {})",
                edge.relationship_type.code(),
                edge.person_id,
                edge.related_person_id
            ),
            Self::ForeignEdge { person_id, edge } => write!(
                f,
                "relationship {} -> {} does not involve person {person_id}",
                edge.person_id, edge.related_person_id
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "person repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "person repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for PersonRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for PersonRepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for PersonRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersonRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for person records and relationship edges.
pub trait PersonRepository {
    /// Loads one full-detail record.
    fn get_person(&self, id: PersonId) -> PersonRepoResult<Option<PersonFullDetails>>;
    /// Lists every person summary, ordered by id.
    fn list_people(&self) -> PersonRepoResult<Vec<Person>>;
    /// Lists every stored edge in insertion order.
    fn list_edges(&self) -> PersonRepoResult<Vec<RelationshipEdge>>;
    /// Lists the edges that touch one person, in insertion order.
    fn list_edges_for(&self, id: PersonId) -> PersonRepoResult<Vec<RelationshipEdge>>;
    /// Inserts or updates details and replaces every edge touching the person.
    ///
    /// Returns the stored id (newly assigned when `details.id` was unassigned).
    fn save_person(
        &self,
        details: &PersonFullDetails,
        edges: &[RelationshipEdge],
    ) -> PersonRepoResult<PersonId>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> PersonRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn get_person(&self, id: PersonId) -> PersonRepoResult<Option<PersonFullDetails>> {
        let sql = format!("{PERSON_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_people(&self) -> PersonRepoResult<Vec<Person>> {
        let sql = format!("{PERSON_SELECT_SQL} ORDER BY id ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?.person());
        }
        Ok(people)
    }

    fn list_edges(&self) -> PersonRepoResult<Vec<RelationshipEdge>> {
        let sql = format!("{EDGE_SELECT_SQL} ORDER BY rowid ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }
        Ok(edges)
    }

    fn list_edges_for(&self, id: PersonId) -> PersonRepoResult<Vec<RelationshipEdge>> {
        let sql =
            format!("{EDGE_SELECT_SQL} WHERE person_id = ?1 OR related_person_id = ?1 ORDER BY rowid ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }
        Ok(edges)
    }

    fn save_person(
        &self,
        details: &PersonFullDetails,
        edges: &[RelationshipEdge],
    ) -> PersonRepoResult<PersonId> {
        details.validate()?;
        for edge in edges {
            if !edge.is_persistable() {
                return Err(PersonRepoError::NegativeRelationshipType(*edge));
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let person_id = if details.is_unassigned() {
            tx.execute(
                "INSERT INTO persons (
                    display_name,
                    gender,
                    date_of_birth,
                    date_of_death,
                    additional_notes,
                    veracity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    details.display_name.trim(),
                    details.gender.code(),
                    details.date_of_birth.as_deref(),
                    details.date_of_death.as_deref(),
                    details.additional_notes.as_deref(),
                    details.veracity.as_deref(),
                ],
            )?;
            tx.last_insert_rowid()
        } else {
            let changed = tx.execute(
                "UPDATE persons
                 SET display_name = ?2,
                     gender = ?3,
                     date_of_birth = ?4,
                     date_of_death = ?5,
                     additional_notes = ?6,
                     veracity = ?7,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    details.id,
                    details.display_name.trim(),
                    details.gender.code(),
                    details.date_of_birth.as_deref(),
                    details.date_of_death.as_deref(),
                    details.additional_notes.as_deref(),
                    details.veracity.as_deref(),
                ],
            )?;
            if changed == 0 {
                return Err(PersonRepoError::NotFound(details.id));
            }
            details.id
        };

        // A new person's edges are built before the id exists; they reference
        // the unassigned id and are rebound here.
        let bound_edges = edges
            .iter()
            .map(|edge| rebind_unassigned(edge, details.id, person_id))
            .collect::<Vec<_>>();
        for edge in &bound_edges {
            if !edge.touches(person_id) {
                return Err(PersonRepoError::ForeignEdge {
                    person_id,
                    edge: *edge,
                });
            }
        }

        tx.execute(
            "DELETE FROM relationships
             WHERE person_id = ?1 OR related_person_id = ?1;",
            [person_id],
        )?;
        for edge in &bound_edges {
            tx.execute(
                "INSERT OR REPLACE INTO relationships (
                    person_id,
                    related_person_id,
                    type,
                    state
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    edge.person_id,
                    edge.related_person_id,
                    edge.relationship_type.code(),
                    edge.state,
                ],
            )?;
        }

        tx.commit()?;
        Ok(person_id)
    }
}

fn rebind_unassigned(
    edge: &RelationshipEdge,
    requested_id: PersonId,
    stored_id: PersonId,
) -> RelationshipEdge {
    if requested_id == stored_id {
        return *edge;
    }
    let mut bound = *edge;
    if bound.person_id == requested_id {
        bound.person_id = stored_id;
    }
    if bound.related_person_id == requested_id {
        bound.related_person_id = stored_id;
    }
    bound
}

fn parse_person_row(row: &Row<'_>) -> PersonRepoResult<PersonFullDetails> {
    let gender_text: String = row.get("gender")?;
    let gender = Gender::from_code(&gender_text).ok_or_else(|| {
        PersonRepoError::InvalidData(format!("invalid gender `{gender_text}` in persons.gender"))
    })?;

    Ok(PersonFullDetails {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        gender,
        date_of_birth: row.get("date_of_birth")?,
        date_of_death: row.get("date_of_death")?,
        additional_notes: row.get("additional_notes")?,
        veracity: row.get("veracity")?,
    })
}

fn parse_edge_row(row: &Row<'_>) -> PersonRepoResult<RelationshipEdge> {
    let code: i32 = row.get("type")?;
    let relationship_type = RelationshipType::try_from(code)
        .map_err(|err| PersonRepoError::InvalidData(format!("{err} in relationships.type")))?;
    if !relationship_type.is_persisted() {
        return Err(PersonRepoError::InvalidData(format!(
            "negative relationship type {code} in relationships.type"
        )));
    }

    Ok(RelationshipEdge {
        person_id: row.get("person_id")?,
        related_person_id: row.get("related_person_id")?,
        relationship_type,
        state: row.get("state")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> PersonRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(PersonRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["persons", "relationships"] {
        if !table_exists(conn, table)? {
            return Err(PersonRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> PersonRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
