//! Plugin capability table - one optional handler slot per event

use std::fmt;

use crate::application::errors::PluginError;
use crate::application::messaging::BotContext;
use crate::domain::entities::{
    BotJoinEvent, CommandEvent, EventName, KickEvent, MessageEvent, ModeEvent, NickEvent,
    NoticeEvent, PartEvent, QuitEvent, SayEvent, TopicEvent, UserJoinEvent,
};

/// Outcome of a plugin handler.
pub type HandlerResult = Result<(), PluginError>;

/// Handler bound to one payload-carrying event.
pub type Handler<E> = Box<dyn FnMut(&BotContext, &E) -> HandlerResult + Send>;

/// Command handlers may return a reply; the engine relays it to the
/// origin channel as `"{nick}: {reply}"`. `None` and the empty string
/// both mean no reply.
pub type CommandHandler =
    Box<dyn FnMut(&BotContext, &CommandEvent) -> Result<Option<String>, PluginError> + Send>;

/// Handler for the payload-free events (`init`, `tick`).
pub type BareHandler = Box<dyn FnMut(&BotContext) -> HandlerResult + Send>;

/// The capability table: which events a plugin subscribes to.
///
/// Empty slots are normal; a plugin implements only what it cares about
/// and the engine skips it for everything else.
#[derive(Default)]
pub struct Handlers {
    pub init: Option<BareHandler>,
    pub message: Option<Handler<MessageEvent>>,
    pub command: Option<CommandHandler>,
    pub bot_say: Option<Handler<SayEvent>>,
    pub topic: Option<Handler<TopicEvent>>,
    pub user_join: Option<Handler<UserJoinEvent>>,
    pub bot_join: Option<Handler<BotJoinEvent>>,
    pub nick: Option<Handler<NickEvent>>,
    pub part: Option<Handler<PartEvent>>,
    pub quit: Option<Handler<QuitEvent>>,
    pub kick: Option<Handler<KickEvent>>,
    pub mode: Option<Handler<ModeEvent>>,
    pub notice: Option<Handler<NoticeEvent>>,
    pub tick: Option<BareHandler>,
}

impl Handlers {
    /// Event names with a handler installed, table order.
    pub fn subscribed(&self) -> Vec<EventName> {
        let slots = [
            (EventName::Init, self.init.is_some()),
            (EventName::Message, self.message.is_some()),
            (EventName::Command, self.command.is_some()),
            (EventName::BotSay, self.bot_say.is_some()),
            (EventName::Topic, self.topic.is_some()),
            (EventName::UserJoin, self.user_join.is_some()),
            (EventName::BotJoin, self.bot_join.is_some()),
            (EventName::Nick, self.nick.is_some()),
            (EventName::Part, self.part.is_some()),
            (EventName::Quit, self.quit.is_some()),
            (EventName::Kick, self.kick.is_some()),
            (EventName::Mode, self.mode.is_some()),
            (EventName::Notice, self.notice.is_some()),
            (EventName::Tick, self.tick.is_some()),
        ];
        slots
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

/// An independently authored behavior unit.
///
/// Built with the `on_*` methods; every slot left unset stays inert:
///
/// ```
/// use ferric_bot::plugins::Plugin;
///
/// let plugin = Plugin::new("greeter").on_user_join(|bot, event| {
///     bot.say(&event.channel, &format!("Welcome, {}!", event.user.nick));
///     Ok(())
/// });
/// assert_eq!(plugin.name(), "greeter");
/// ```
pub struct Plugin {
    pub(crate) name: String,
    pub(crate) handlers: Handlers,
}

// The handler slots are boxed closures, so this is written out by hand:
// the name and the subscribed events are what a log reader wants anyway.
impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("subscribed", &self.handlers.subscribed())
            .finish()
    }
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Handlers::default(),
        }
    }

    /// Name used in diagnostics. Not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_init<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext) -> HandlerResult + Send + 'static,
    {
        self.handlers.init = Some(Box::new(handler));
        self
    }

    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &MessageEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.message = Some(Box::new(handler));
        self
    }

    pub fn on_command<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &CommandEvent) -> Result<Option<String>, PluginError>
            + Send
            + 'static,
    {
        self.handlers.command = Some(Box::new(handler));
        self
    }

    pub fn on_bot_say<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &SayEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.bot_say = Some(Box::new(handler));
        self
    }

    pub fn on_topic<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &TopicEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.topic = Some(Box::new(handler));
        self
    }

    pub fn on_user_join<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &UserJoinEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.user_join = Some(Box::new(handler));
        self
    }

    pub fn on_bot_join<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &BotJoinEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.bot_join = Some(Box::new(handler));
        self
    }

    pub fn on_nick<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &NickEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.nick = Some(Box::new(handler));
        self
    }

    pub fn on_part<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &PartEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.part = Some(Box::new(handler));
        self
    }

    pub fn on_quit<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &QuitEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.quit = Some(Box::new(handler));
        self
    }

    pub fn on_kick<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &KickEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.kick = Some(Box::new(handler));
        self
    }

    pub fn on_mode<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &ModeEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.mode = Some(Box::new(handler));
        self
    }

    pub fn on_notice<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext, &NoticeEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.notice = Some(Box::new(handler));
        self
    }

    pub fn on_tick<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&BotContext) -> HandlerResult + Send + 'static,
    {
        self.handlers.tick = Some(Box::new(handler));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribed_lists_only_installed_slots() {
        let plugin = Plugin::new("greeter")
            .on_user_join(|_bot, _event| Ok(()))
            .on_tick(|_bot| Ok(()));

        assert_eq!(
            plugin.handlers.subscribed(),
            vec![EventName::UserJoin, EventName::Tick]
        );
        assert!(Plugin::new("inert").handlers.subscribed().is_empty());
    }

    // keeps Plugin usable with assert-style Result helpers in tests
    #[test]
    fn debug_shows_name_and_subscriptions() {
        let plugin = Plugin::new("greeter")
            .on_user_join(|_bot, _event| Ok(()))
            .on_tick(|_bot| Ok(()));

        let rendered = format!("{:?}", plugin);
        assert!(rendered.contains("greeter"), "got: {}", rendered);
        assert!(rendered.contains("UserJoin"), "got: {}", rendered);
        assert!(rendered.contains("Tick"), "got: {}", rendered);
        assert!(!rendered.contains("Message"), "got: {}", rendered);
    }
}
