//! Network adapters - Transport implementations

pub mod console;
pub mod irc;

pub use console::ConsoleAdapter;
pub use irc::IrcAdapter;
