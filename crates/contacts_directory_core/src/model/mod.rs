//! Domain model for the directory catalog and routed contact queries.
//!
//! # Responsibility
//! - Define catalog records and the reserved local directories.
//! - Define query parameters and result shapes shared by local and remote
//!   sources.

pub mod directory;
pub mod query;
