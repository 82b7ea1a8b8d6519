//! Message handling - Event normalization, dispatch and isolation

pub mod context;
pub mod dispatcher;
pub mod harness;
pub mod parser;

pub use context::BotContext;
pub use dispatcher::DispatchEngine;
pub use parser::CommandParser;
