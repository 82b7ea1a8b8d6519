//! Application layer - Dispatch orchestration and fault isolation
//!
//! This layer contains:
//! - Errors: Error types shared across the crate
//! - Messaging: Command parsing, the bot context, the dispatch engine

pub mod errors;
pub mod messaging;
