//! Plugin system for ferric-bot
//!
//! Capability tables, the ordered registry, and dynamic loading

pub mod handler;
pub mod loader;
pub mod registry;

pub use handler::{BareHandler, CommandHandler, Handler, HandlerResult, Handlers, Plugin};
pub use loader::{DylibSource, PluginSource, PLUGIN_ENTRY};
pub use registry::PluginRegistry;
