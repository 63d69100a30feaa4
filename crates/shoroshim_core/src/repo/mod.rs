//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for persons and relationship edges.
//! - Isolate SQLite query details from store/workspace orchestration.
//!
//! # Invariants
//! - Repository writes enforce `PersonFullDetails::validate()` before
//!   persistence.
//! - Repository APIs return semantic errors (`NotFound`, contract violations)
//!   in addition to DB transport errors.

pub mod person_repo;
