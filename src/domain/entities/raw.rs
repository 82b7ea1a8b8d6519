//! Raw occurrences - the boundary between transport adapters and the engine
//!
//! Adapters translate wire traffic into [`RawEvent`]s and feed them to the
//! engine over a channel; the engine answers with [`Outbound`] commands.
//! Neither side knows the other's internals.

use super::User;

/// Sender fields extracted from a raw message prefix. Parts the wire did
/// not carry stay `None`.
#[derive(Debug, Clone)]
pub struct Sender {
    pub nick: String,
    pub username: Option<String>,
    pub host: Option<String>,
}

impl Sender {
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
}

impl From<Sender> for User {
    fn from(sender: Sender) -> Self {
        User {
            nick: sender.nick,
            username: sender.username,
            host: sender.host,
        }
    }
}

/// One occurrence delivered by a transport adapter, before normalization.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// Chat line addressed to a channel or to the bot directly.
    Message {
        from: Sender,
        target: String,
        text: String,
    },
    /// Live topic change or the join-time topic replay.
    Topic {
        channel: String,
        topic: String,
        set_by: String,
    },
    /// Any join, the bot's own included.
    Join {
        channel: String,
        from: Sender,
    },
    /// `from.nick` is the old nick, `newnick` the one just taken.
    NickChange {
        from: Sender,
        newnick: String,
        channels: Vec<String>,
    },
    Part {
        channel: String,
        from: Sender,
        reason: Option<String>,
    },
    Quit {
        from: Sender,
        channels: Vec<String>,
        reason: Option<String>,
    },
    Kick {
        channel: String,
        nick: String,
        by: String,
        reason: Option<String>,
    },
    /// One mode letter with its sign; multi-mode lines arrive as several
    /// of these in wire order.
    Mode {
        channel: String,
        by: String,
        added: bool,
        letter: char,
        arg: Option<String>,
    },
    Notice {
        from: Option<String>,
        to: String,
        text: String,
    },
    Invite {
        channel: String,
        from: String,
    },
    /// The transport gave up reconnecting. Terminal.
    Abort {
        retries: u32,
    },
}

/// Commands the engine sends back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Say { target: String, text: String },
    Join { channel: String },
}
