//! Console adapter for development/testing
//!
//! Drives the engine from stdin without a server. Plain lines arrive as
//! channel messages from a synthetic peer named `alice`; slash directives
//! synthesize the other raw occurrences:
//!
//! ```text
//! /join <channel> [nick]      join; use the bot's own nick to simulate it
//! /part <channel> [reason]
//! /quit [reason]
//! /nick <newnick>
//! /topic <channel> <text>
//! /kick <channel> <nick> [reason]
//! /mode <channel> +x [arg]
//! /notice <target> <text>
//! /invite <channel>
//! /abort
//! ```
//!
//! Outbound traffic is printed with a `[BOT]` marker. End with ctrl-d.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Outbound, RawEvent, Sender};
use crate::domain::traits::Transport;

/// Nick of the synthetic peer console input comes from.
const PEER: &str = "alice";

/// The one channel console conversations happen in.
const CHANNEL: &str = "#console";

/// Console transport for local development.
pub struct ConsoleAdapter {
    nick: String,
}

impl ConsoleAdapter {
    pub fn new(nick: impl Into<String>) -> Self {
        Self { nick: nick.into() }
    }
}

#[async_trait]
impl Transport for ConsoleAdapter {
    async fn run(
        self: Box<Self>,
        events: mpsc::UnboundedSender<RawEvent>,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Result<(), BotError> {
        tracing::info!("Starting console transport (dev mode), talking in {}", CHANNEL);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if let Some(event) = synthesize(&line) {
                                let _ = events.send(event);
                            }
                        }
                        None => {
                            tracing::info!("Console input closed");
                            return Ok(());
                        }
                    }
                }
                command = outbound.recv() => {
                    match command {
                        Some(Outbound::Say { target, text }) => {
                            println!("[BOT] {}: {}", target, text);
                        }
                        Some(Outbound::Join { channel }) => {
                            println!("[BOT] joining {}", channel);
                            // echo the join back, the way a server would
                            let _ = events.send(RawEvent::Join {
                                channel,
                                from: Sender::new(self.nick.clone()),
                            });
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

fn peer() -> Sender {
    Sender::new(PEER).with_username(PEER).with_host("console.local")
}

fn join_words(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn parse_mode_token(token: &str) -> Option<(bool, char)> {
    let mut chars = token.chars();
    let added = match chars.next()? {
        '+' => true,
        '-' => false,
        _ => return None,
    };
    Some((added, chars.next()?))
}

/// Turn one console line into a raw occurrence, or nothing for blank
/// lines and malformed directives.
fn synthesize(input: &str) -> Option<RawEvent> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Some(directive) = input.strip_prefix('/') else {
        return Some(RawEvent::Message {
            from: peer(),
            target: CHANNEL.to_string(),
            text: input.to_string(),
        });
    };

    let mut tokens = directive.split_whitespace();
    let keyword = tokens.next().unwrap_or_default();
    let rest: Vec<&str> = tokens.collect();

    let event = match (keyword, &rest[..]) {
        ("join", [channel]) => RawEvent::Join {
            channel: channel.to_string(),
            from: peer(),
        },
        ("join", [channel, nick]) => RawEvent::Join {
            channel: channel.to_string(),
            from: Sender::new(*nick),
        },
        ("part", [channel, reason @ ..]) => RawEvent::Part {
            channel: channel.to_string(),
            from: peer(),
            reason: join_words(reason),
        },
        ("quit", reason) => RawEvent::Quit {
            from: peer(),
            channels: vec![CHANNEL.to_string()],
            reason: join_words(reason),
        },
        ("nick", [newnick]) => RawEvent::NickChange {
            from: peer(),
            newnick: newnick.to_string(),
            channels: vec![CHANNEL.to_string()],
        },
        ("topic", [channel, words @ ..]) if !words.is_empty() => RawEvent::Topic {
            channel: channel.to_string(),
            topic: words.join(" "),
            set_by: PEER.to_string(),
        },
        ("kick", [channel, nick, reason @ ..]) => RawEvent::Kick {
            channel: channel.to_string(),
            nick: nick.to_string(),
            by: PEER.to_string(),
            reason: join_words(reason),
        },
        ("mode", [channel, modes, args @ ..]) => match parse_mode_token(modes) {
            Some((added, letter)) => RawEvent::Mode {
                channel: channel.to_string(),
                by: PEER.to_string(),
                added,
                letter,
                arg: args.first().map(|s| s.to_string()),
            },
            None => {
                println!("[?] mode wants a signed letter, e.g. /mode {} +o", CHANNEL);
                return None;
            }
        },
        ("notice", [to, words @ ..]) if !words.is_empty() => RawEvent::Notice {
            from: Some(PEER.to_string()),
            to: to.to_string(),
            text: words.join(" "),
        },
        ("invite", [channel]) => RawEvent::Invite {
            channel: channel.to_string(),
            from: PEER.to_string(),
        },
        ("abort", _) => RawEvent::Abort { retries: 0 },
        _ => {
            println!("[?] unknown or incomplete directive: /{}", directive);
            return None;
        }
    };

    Some(event)
}
