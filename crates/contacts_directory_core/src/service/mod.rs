//! Core use-case services.
//!
//! # Responsibility
//! - Own the directory catalog and its ownership rules.
//! - Keep the catalog in step with host lifecycle events.
//! - Route contact queries and expose both through resource paths.

pub mod catalog;
pub mod provider;
pub mod reconciler;
pub mod router;
