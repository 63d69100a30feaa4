//! Genealogy domain model.
//!
//! # Responsibility
//! - Define the person records and the signed relationship encoding shared by
//!   the store, the hierarchy builder and the workspaces.
//!
//! # Invariants
//! - Stored relationship edges always carry a positive type.
//! - Persons are never deleted by core.

pub mod person;
pub mod relationship;
