//! Domain layer - Core event model with no external dependencies
//!
//! This layer contains:
//! - Entities: Canonical events, users, commands, raw wire occurrences
//! - Traits: The transport abstraction adapters implement

pub mod entities;
pub mod traits;
