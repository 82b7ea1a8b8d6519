//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Network transports (IRC, console)

pub mod config;
pub mod adapters;
