//! Transport trait - the session a network adapter drives

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Outbound, RawEvent};

/// A session with the chat network.
///
/// An implementation owns the wire: it delivers raw occurrences into
/// `events` and drains `outbound` until one side goes away. The engine on
/// the other end of the channels never sees protocol bytes.
///
/// Closing `events` tells the engine the session is over; receiving `None`
/// from `outbound` means the engine is gone and the session should end.
#[async_trait]
pub trait Transport: Send {
    /// Drive the session to completion.
    async fn run(
        self: Box<Self>,
        events: mpsc::UnboundedSender<RawEvent>,
        outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Result<(), BotError>;
}
