//! Bot context - the session surface handed to every plugin handler

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::application::errors::PluginError;
use crate::domain::entities::{Outbound, SayEvent};

/// Handle through which plugins (and the engine itself) talk back to the
/// network. Cheap to clone; all clones share one send log.
#[derive(Clone)]
pub struct BotContext {
    nick: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    sent: Arc<Mutex<Vec<SayEvent>>>,
}

impl BotContext {
    pub fn new(nick: impl Into<String>, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            nick: nick.into(),
            outbound,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The nick the bot is known by on the network.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Fire-and-forget message to a channel or user.
    ///
    /// Every delivered send surfaces as a `botSay` event once the dispatch
    /// that produced it finishes.
    pub fn say(&self, target: &str, text: &str) {
        if let Err(e) = self.try_say(target, text) {
            tracing::warn!("Dropping outbound message to {}: {}", target, e);
        }
    }

    /// Ask the transport to join a channel.
    pub fn join(&self, channel: &str) {
        let command = Outbound::Join {
            channel: channel.to_string(),
        };
        if self.outbound.send(command).is_err() {
            tracing::warn!("Dropping join request for {}: transport is gone", channel);
        }
    }

    /// Fallible send, used by the engine's reply path so a delivery
    /// failure is visible to the isolation harness.
    pub(crate) fn try_say(&self, target: &str, text: &str) -> Result<(), PluginError> {
        let command = Outbound::Say {
            target: target.to_string(),
            text: text.to_string(),
        };
        self.outbound
            .send(command)
            .map_err(|_| PluginError::ReplyDelivery("transport is gone".to_string()))?;

        // Only delivered sends are observed.
        self.lock_sent().push(SayEvent {
            channel: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    /// Drain the sends logged since the last drain.
    pub(crate) fn take_sent(&self) -> Vec<SayEvent> {
        std::mem::take(&mut *self.lock_sent())
    }

    /// Forget logged sends without observing them.
    pub(crate) fn clear_sent(&self) {
        self.lock_sent().clear();
    }

    fn lock_sent(&self) -> std::sync::MutexGuard<'_, Vec<SayEvent>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner())
    }
}
