//! Dispatch engine - normalizes raw occurrences and fans them out

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::application::errors::BotError;
use crate::application::messaging::harness;
use crate::application::messaging::parser::CommandParser;
use crate::application::messaging::BotContext;
use crate::domain::entities::{
    BotJoinEvent, CommandEvent, Event, KickEvent, MessageEvent, ModeEvent, NickEvent, NoticeEvent,
    PartEvent, QuitEvent, RawEvent, TopicEvent, User, UserJoinEvent,
};
use crate::plugins::{Plugin, PluginRegistry};

/// The orchestrator: owns the registry, consumes raw occurrences from the
/// transport and runs the tick schedule.
///
/// Everything here is single-threaded by construction. Handlers run one
/// at a time, in registry order, and an event is fully dispatched before
/// the next one is looked at.
pub struct DispatchEngine {
    registry: PluginRegistry,
    parser: CommandParser,
    context: BotContext,
    tick_interval: Duration,
    join_on_invite: bool,
}

impl DispatchEngine {
    pub fn new(registry: PluginRegistry, context: BotContext, prefix: impl Into<String>) -> Self {
        Self {
            registry,
            parser: CommandParser::new(prefix),
            context,
            tick_interval: Duration::from_millis(60_000),
            join_on_invite: false,
        }
    }

    /// Zero disables the tick entirely.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_join_on_invite(mut self, enabled: bool) -> Self {
        self.join_on_invite = enabled;
        self
    }

    /// Consume raw occurrences until the transport goes away.
    ///
    /// Returns `Ok` when the event feed closes and `Err` when the
    /// transport reports a terminal failure.
    pub async fn run(
        &mut self,
        mut events: mpsc::UnboundedReceiver<RawEvent>,
    ) -> Result<(), BotError> {
        // init handlers may have sent during load; observe those before
        // the first occurrence arrives
        for say in self.context.take_sent() {
            self.dispatch(&Event::BotSay(say));
        }

        let mut next_tick = Instant::now() + self.tick_interval;

        loop {
            tokio::select! {
                biased;

                // deadline polled before the feed: a flooded channel must
                // not starve ticks
                _ = time::sleep_until(next_tick), if !self.tick_interval.is_zero() => {
                    self.dispatch(&Event::Tick);
                    // re-armed only after the dispatch returns: a slow
                    // handler delays the next tick, never stacks it
                    next_tick = Instant::now() + self.tick_interval;
                }
                maybe = events.recv() => match maybe {
                    Some(raw) => self.handle_raw(raw)?,
                    None => {
                        tracing::info!("Event feed closed, shutting down");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Normalize one raw occurrence and dispatch whatever it maps to.
    ///
    /// `Err` only for the terminal abort signal; everything else is
    /// handled here, including the occurrences that map to no event.
    pub fn handle_raw(&mut self, raw: RawEvent) -> Result<(), BotError> {
        let event = match raw {
            RawEvent::Message { from, target, text } => match self.parser.parse(&text) {
                Some(command) => Event::Command(CommandEvent {
                    user: User::from(from),
                    channel: target,
                    command,
                }),
                None => Event::Message(MessageEvent {
                    user: User::from(from),
                    channel: target,
                    text,
                }),
            },
            RawEvent::Topic {
                channel,
                topic,
                set_by,
            } => Event::Topic(TopicEvent {
                channel,
                topic,
                set_by,
            }),
            RawEvent::Join { channel, from } => {
                if from.nick == self.context.nick() {
                    Event::BotJoin(BotJoinEvent { channel })
                } else {
                    Event::UserJoin(UserJoinEvent {
                        channel,
                        user: User::from(from),
                    })
                }
            }
            RawEvent::NickChange {
                from,
                newnick,
                channels,
            } => {
                let oldnick = from.nick.clone();
                let mut user = User::from(from);
                user.nick = newnick;
                Event::Nick(NickEvent {
                    user,
                    oldnick,
                    channels,
                })
            }
            RawEvent::Part {
                channel,
                from,
                reason,
            } => Event::Part(PartEvent {
                channel,
                user: User::from(from),
                reason,
            }),
            RawEvent::Quit {
                from,
                channels,
                reason,
            } => Event::Quit(QuitEvent {
                user: User::from(from),
                channels,
                reason,
            }),
            RawEvent::Kick {
                channel,
                nick,
                by,
                reason,
            } => Event::Kick(KickEvent {
                channel,
                nick,
                by,
                reason,
            }),
            RawEvent::Mode {
                channel,
                by,
                added,
                letter,
                arg,
            } => Event::Mode(ModeEvent {
                channel,
                by,
                mode: format!("{}{}", if added { '+' } else { '-' }, letter),
                target: arg,
            }),
            RawEvent::Notice { from, to, text } => Event::Notice(NoticeEvent { from, to, text }),
            RawEvent::Invite { channel, from } => {
                tracing::debug!("Invited to {} by {}", channel, from);
                if self.join_on_invite {
                    self.context.join(&channel);
                }
                return Ok(());
            }
            RawEvent::Abort { retries } => {
                tracing::error!("Transport aborted after {} attempts", retries);
                return Err(BotError::TransportClosed(format!(
                    "gave up after {} attempts",
                    retries
                )));
            }
        };

        self.dispatch(&event);
        Ok(())
    }

    /// Fan one event out to every subscribed plugin, registry order.
    ///
    /// Sends made by handlers during the fan-out are observed afterwards
    /// as `botSay` events. Sends made while dispatching `botSay` itself
    /// still go out but are not observed again, which caps the feedback
    /// loop at one level.
    pub fn dispatch(&mut self, event: &Event) {
        let name = event.name();
        let ctx = &self.context;

        for plugin in self.registry.iter_mut() {
            let Plugin {
                name: plugin_name,
                handlers,
            } = plugin;

            match event {
                Event::Message(payload) => {
                    if let Some(handler) = handlers.message.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Command(payload) => {
                    let reply = match handlers.command.as_mut() {
                        Some(handler) => {
                            harness::invoke(plugin_name, name, || handler(ctx, payload)).flatten()
                        }
                        None => None,
                    };
                    // Empty replies are not relayed.
                    if let Some(reply) = reply.filter(|r| !r.is_empty()) {
                        let text = format!("{}: {}", payload.user.nick, reply);
                        harness::invoke(plugin_name, name, || {
                            ctx.try_say(&payload.channel, &text)
                        });
                    }
                }
                Event::BotSay(payload) => {
                    if let Some(handler) = handlers.bot_say.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Topic(payload) => {
                    if let Some(handler) = handlers.topic.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::UserJoin(payload) => {
                    if let Some(handler) = handlers.user_join.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::BotJoin(payload) => {
                    if let Some(handler) = handlers.bot_join.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Nick(payload) => {
                    if let Some(handler) = handlers.nick.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Part(payload) => {
                    if let Some(handler) = handlers.part.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Quit(payload) => {
                    if let Some(handler) = handlers.quit.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Kick(payload) => {
                    if let Some(handler) = handlers.kick.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Mode(payload) => {
                    if let Some(handler) = handlers.mode.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Notice(payload) => {
                    if let Some(handler) = handlers.notice.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx, payload));
                    }
                }
                Event::Tick => {
                    if let Some(handler) = handlers.tick.as_mut() {
                        harness::invoke(plugin_name, name, || handler(ctx));
                    }
                }
            }
        }

        if matches!(event, Event::BotSay(_)) {
            self.context.clear_sent();
        } else {
            for say in self.context.take_sent() {
                self.dispatch(&Event::BotSay(say));
            }
        }
    }
}
