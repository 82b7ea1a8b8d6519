//! Domain entities - Canonical events and the objects they carry

pub mod user;
pub mod command;
pub mod event;
pub mod raw;

pub use user::User;
pub use command::Command;
pub use event::{
    BotJoinEvent, CommandEvent, Event, EventName, KickEvent, MessageEvent, ModeEvent, NickEvent,
    NoticeEvent, PartEvent, QuitEvent, SayEvent, TopicEvent, UserJoinEvent,
};
pub use raw::{Outbound, RawEvent, Sender};
