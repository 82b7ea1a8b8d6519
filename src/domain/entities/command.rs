/// A parsed command invocation: name plus positional arguments
///
/// Arguments keep their original order and spelling. Empty tokens from
/// doubled spaces survive parsing, so `args` may contain empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Arguments joined back into a single string.
    pub fn arg_text(&self) -> String {
        self.args.join(" ")
    }
}
