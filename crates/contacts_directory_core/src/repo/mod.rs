//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the directory catalog.
//! - Isolate SQLite query details from catalog orchestration.
//!
//! # Invariants
//! - Repository writes enforce `DirectoryInfo::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod directory_repo;
