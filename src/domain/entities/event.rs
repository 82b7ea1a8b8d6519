//! Canonical event model - the payload shapes handlers receive

use std::fmt;

use super::{Command, User};

/// The closed set of event names the engine recognizes.
///
/// Used for handler lookup and in diagnostics; the `Display` form is the
/// name plugins and log readers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Init,
    Message,
    Command,
    BotSay,
    Topic,
    UserJoin,
    BotJoin,
    Nick,
    Part,
    Quit,
    Kick,
    Mode,
    Notice,
    Tick,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Init => "init",
            EventName::Message => "message",
            EventName::Command => "command",
            EventName::BotSay => "botSay",
            EventName::Topic => "topic",
            EventName::UserJoin => "userJoin",
            EventName::BotJoin => "botJoin",
            EventName::Nick => "nick",
            EventName::Part => "part",
            EventName::Quit => "quit",
            EventName::Kick => "kick",
            EventName::Mode => "mode",
            EventName::Notice => "notice",
            EventName::Tick => "tick",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain chat line that did not start with the command prefix.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub user: User,
    pub channel: String,
    pub text: String,
}

/// Prefixed chat line, parsed into a command invocation.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub user: User,
    pub channel: String,
    pub command: Command,
}

/// Observation of the bot's own outbound message, raised after the send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayEvent {
    pub channel: String,
    pub text: String,
}

/// Channel topic change, or the topic replay a server sends on join.
#[derive(Debug, Clone)]
pub struct TopicEvent {
    pub channel: String,
    pub topic: String,
    /// Plain nick on a live change; join-time replays may attribute the
    /// topic to a full mask or the server itself.
    pub set_by: String,
}

/// Someone else joined a channel the bot is in.
#[derive(Debug, Clone)]
pub struct UserJoinEvent {
    pub channel: String,
    pub user: User,
}

/// The bot itself joined a channel.
#[derive(Debug, Clone)]
pub struct BotJoinEvent {
    pub channel: String,
}

/// Nick change; `user.nick` is already the new nick.
#[derive(Debug, Clone)]
pub struct NickEvent {
    pub user: User,
    pub oldnick: String,
    /// Channels shared with the bot in which the change was visible.
    pub channels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PartEvent {
    pub channel: String,
    pub user: User,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuitEvent {
    pub user: User,
    pub channels: Vec<String>,
    pub reason: Option<String>,
}

/// Forced removal. The wire names the parties without prefix data, so
/// this carries bare nicks rather than [`User`] snapshots.
#[derive(Debug, Clone)]
pub struct KickEvent {
    pub channel: String,
    pub nick: String,
    pub by: String,
    pub reason: Option<String>,
}

/// Channel mode change, normalized to one signed token per event.
#[derive(Debug, Clone)]
pub struct ModeEvent {
    pub channel: String,
    pub by: String,
    /// Sign plus mode letter, e.g. `+o` or `-m`.
    pub mode: String,
    /// The mode's argument when it took one (a nick, mask, key or limit).
    pub target: Option<String>,
}

/// Notice; `from` is `None` when the server itself sent it.
#[derive(Debug, Clone)]
pub struct NoticeEvent {
    pub from: Option<String>,
    pub to: String,
    pub text: String,
}

/// A normalized occurrence, one variant per dispatchable event name.
///
/// `init` has no variant on purpose: the registry raises it once per
/// plugin at load time and it never flows through the run loop.
#[derive(Debug, Clone)]
pub enum Event {
    Message(MessageEvent),
    Command(CommandEvent),
    BotSay(SayEvent),
    Topic(TopicEvent),
    UserJoin(UserJoinEvent),
    BotJoin(BotJoinEvent),
    Nick(NickEvent),
    Part(PartEvent),
    Quit(QuitEvent),
    Kick(KickEvent),
    Mode(ModeEvent),
    Notice(NoticeEvent),
    Tick,
}

impl Event {
    /// The name tag used for handler lookup and diagnostics.
    pub fn name(&self) -> EventName {
        match self {
            Event::Message(_) => EventName::Message,
            Event::Command(_) => EventName::Command,
            Event::BotSay(_) => EventName::BotSay,
            Event::Topic(_) => EventName::Topic,
            Event::UserJoin(_) => EventName::UserJoin,
            Event::BotJoin(_) => EventName::BotJoin,
            Event::Nick(_) => EventName::Nick,
            Event::Part(_) => EventName::Part,
            Event::Quit(_) => EventName::Quit,
            Event::Kick(_) => EventName::Kick,
            Event::Mode(_) => EventName::Mode,
            Event::Notice(_) => EventName::Notice,
            Event::Tick => EventName::Tick,
        }
    }
}
