//! Core domain logic for the Shoroshim family tree.
//! Relationship encoding, hierarchy derivation, persistence and the
//! workspace session all live here; front ends only render and prompt.

pub mod config;
pub mod db;
pub mod format;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod prompt;
pub mod repo;
pub mod session;
pub mod store;
pub mod workspace;

pub use config::{ConfigError, CoreConfig};
pub use format::{dates_text, humanize_identifier, relationship_text};
pub use hierarchy::{build_hierarchy, HierarchyBuilder, HierarchyDirection, HierarchyNode};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{
    Gender, Person, PersonAllDetails, PersonFullDetails, PersonId, PersonValidationError,
};
pub use model::relationship::{
    InvalidRelationshipType, RelationshipEdge, RelationshipToMe, RelationshipType,
};
pub use prompt::{ConfirmationPrompt, PromptChoice, PromptOptions};
pub use session::{GenealogySession, PeopleList, SessionError, ToolbarAction};
pub use store::{PersonStore, SaveResponse, SqlitePersonStore, StoreError};
pub use workspace::{
    CurrentPerson, StandardWorkspaceFactory, Toolbar, Workspace, WorkspaceError,
    WorkspaceFactory, WorkspaceMode,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
