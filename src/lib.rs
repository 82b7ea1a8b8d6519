//! ferric-bot - Plugin-driven IRC bot runtime
//!
//! The crate is split into layers:
//! - Domain: event model and the transport abstraction
//! - Application: command parsing, the dispatch engine, fault isolation
//! - Infrastructure: configuration and the network adapters
//! - Plugins: capability tables, the registry, dynamic loading

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod plugins;
