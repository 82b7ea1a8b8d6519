use std::fmt;

/// Snapshot of the user behind a network occurrence
///
/// Built fresh for every event, never cached across events. The username
/// and host are only present when the wire prefix actually carried them;
/// an absent part is `None`, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub nick: String,
    pub username: Option<String>,
    pub host: Option<String>,
}

impl User {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            username: None,
            host: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Composed `nick!username@host` mask, when all parts are known.
    pub fn full_name(&self) -> Option<String> {
        match (&self.username, &self.host) {
            (Some(username), Some(host)) => {
                Some(format!("{}!{}@{}", self.nick, username, host))
            }
            _ => None,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nick)
    }
}
