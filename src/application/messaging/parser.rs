//! Command parser - splits prefixed lines into a name and arguments

use crate::domain::entities::Command;

/// Parses command-prefixed message text.
///
/// The prefix is an arbitrary string, not a single character, compared
/// byte-for-byte and case-sensitively at the start of the line.
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Whether a line is dispatched as a command at all.
    pub fn is_command(&self, text: &str) -> bool {
        text.starts_with(&self.prefix)
    }

    /// Split a prefixed line into a command name and its arguments.
    ///
    /// The first token after the prefix is the name; the rest are the
    /// arguments in order. Tokens come from splitting on single spaces, so
    /// consecutive spaces produce empty tokens and those are kept as-is.
    /// A line that is only the prefix parses to an empty name.
    ///
    /// Returns `None` when the text does not start with the prefix, which
    /// is how the engine tells commands from plain messages.
    pub fn parse(&self, text: &str) -> Option<Command> {
        let rest = text.strip_prefix(&self.prefix)?;
        let mut tokens = rest.split(' ');
        let name = tokens.next().unwrap_or_default().to_string();
        let args = tokens.map(str::to_string).collect();
        Some(Command::new(name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_args() {
        let parser = CommandParser::new("!");
        let command = parser.parse("!weather london now").unwrap();
        assert_eq!(command.name, "weather");
        assert_eq!(command.args, vec!["london", "now"]);
    }

    #[test]
    fn name_only() {
        let parser = CommandParser::new("!");
        let command = parser.parse("!ping").unwrap();
        assert_eq!(command.name, "ping");
        assert!(command.args.is_empty());
    }

    #[test]
    fn bare_prefix_gives_empty_name() {
        let parser = CommandParser::new("!");
        let command = parser.parse("!").unwrap();
        assert_eq!(command.name, "");
        assert!(command.args.is_empty());
    }

    #[test]
    fn doubled_spaces_keep_empty_tokens() {
        let parser = CommandParser::new("!");
        let command = parser.parse("!say  hello").unwrap();
        assert_eq!(command.name, "say");
        assert_eq!(command.args, vec!["", "hello"]);
    }

    #[test]
    fn multi_character_prefix() {
        let parser = CommandParser::new("bot:");
        assert!(parser.is_command("bot:status"));
        assert!(!parser.is_command("bot status"));
        let command = parser.parse("bot:status full").unwrap();
        assert_eq!(command.name, "status");
        assert_eq!(command.args, vec!["full"]);
    }

    #[test]
    fn unprefixed_text_is_not_a_command() {
        let parser = CommandParser::new("!");
        assert!(!parser.is_command("hello !world"));
        assert!(parser.parse("hello !world").is_none());
    }

    #[test]
    fn prefix_mid_word_still_counts_from_start_only() {
        let parser = CommandParser::new("!");
        assert!(parser.is_command("!!loud"));
        let command = parser.parse("!!loud").unwrap();
        assert_eq!(command.name, "!loud");
    }
}
