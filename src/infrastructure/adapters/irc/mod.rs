//! IRC adapter - minimal line-oriented client transport
//!
//! Speaks just enough of the protocol to register, keep the connection
//! alive and translate traffic across the raw-event boundary. Channel
//! membership is tracked per session so quits and nick changes can name
//! the channels they were visible in.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;

use crate::application::errors::BotError;
use crate::domain::entities::{Outbound, RawEvent, Sender};
use crate::domain::traits::Transport;
use crate::infrastructure::config::ServerConfig;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Minimal IRC client transport.
pub struct IrcAdapter {
    server: ServerConfig,
    nick: String,
    channels: Vec<String>,
}

impl IrcAdapter {
    pub fn new(server: ServerConfig, nick: impl Into<String>, channels: Vec<String>) -> Self {
        Self {
            server,
            nick: nick.into(),
            channels,
        }
    }

    async fn session(
        &self,
        events: &mpsc::UnboundedSender<RawEvent>,
        outbound: &mut mpsc::UnboundedReceiver<Outbound>,
        attempt: &mut u32,
    ) -> Result<(), BotError> {
        let address = format!("{}:{}", self.server.host, self.server.port);
        tracing::info!("Connecting to {}", address);

        let stream = TcpStream::connect(&address).await?;
        let (read_half, write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut writer = BufWriter::new(write_half);

        send_line(&mut writer, &format!("NICK {}", self.nick)).await?;
        send_line(
            &mut writer,
            &format!("USER {} 0 * :{}", self.nick, self.nick),
        )
        .await?;

        // nicks per channel, this session only
        let mut members: HashMap<String, HashSet<String>> = HashMap::new();
        // 332 topic text awaiting its 333 attribution line
        let mut pending_topics: HashMap<String, String> = HashMap::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            self.handle_line(
                                &line,
                                &mut writer,
                                events,
                                &mut members,
                                &mut pending_topics,
                                attempt,
                            )
                            .await?;
                        }
                        None => {
                            return Err(BotError::TransportClosed(
                                "server closed the connection".to_string(),
                            ));
                        }
                    }
                }
                command = outbound.recv() => {
                    match command {
                        Some(Outbound::Say { target, text }) => {
                            send_line(&mut writer, &format!("PRIVMSG {} :{}", target, text))
                                .await?;
                        }
                        Some(Outbound::Join { channel }) => {
                            send_line(&mut writer, &format!("JOIN {}", channel)).await?;
                        }
                        // engine is gone, session over
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    async fn handle_line(
        &self,
        raw: &str,
        writer: &mut BufWriter<OwnedWriteHalf>,
        events: &mpsc::UnboundedSender<RawEvent>,
        members: &mut HashMap<String, HashSet<String>>,
        pending_topics: &mut HashMap<String, String>,
        attempt: &mut u32,
    ) -> Result<(), BotError> {
        tracing::trace!("<< {}", raw);
        let Some(line) = parse_line(raw) else {
            return Ok(());
        };

        match line.command.as_str() {
            "PING" => {
                let token = line.params.first().map(String::as_str).unwrap_or_default();
                send_line(writer, &format!("PONG :{}", token)).await?;
            }
            // registered; a fresh session starts the retry count over
            "001" => {
                *attempt = 0;
                tracing::info!("Registered as {}", self.nick);
                for channel in &self.channels {
                    send_line(writer, &format!("JOIN {}", channel)).await?;
                }
            }
            "433" => {
                tracing::warn!("Nick {} is already in use", self.nick);
            }
            // NAMES reply, the starting membership of a joined channel
            "353" => {
                if line.params.len() >= 2 {
                    let channel = line.params[line.params.len() - 2].clone();
                    let names = &line.params[line.params.len() - 1];
                    let set = members.entry(channel).or_default();
                    for name in names.split_whitespace() {
                        set.insert(strip_rank(name).to_string());
                    }
                }
            }
            "PRIVMSG" => {
                if let (Some(prefix), [target, text]) = (&line.prefix, &line.params[..]) {
                    let _ = events.send(RawEvent::Message {
                        from: sender_from_prefix(prefix),
                        target: target.clone(),
                        text: strip_formatting(text),
                    });
                }
            }
            "NOTICE" => {
                if let [to, text] = &line.params[..] {
                    let _ = events.send(RawEvent::Notice {
                        from: line.prefix.as_deref().and_then(notice_source),
                        to: to.clone(),
                        text: strip_formatting(text),
                    });
                }
            }
            "JOIN" => {
                if let (Some(prefix), Some(channel)) = (&line.prefix, line.params.first()) {
                    let from = sender_from_prefix(prefix);
                    members
                        .entry(channel.clone())
                        .or_default()
                        .insert(from.nick.clone());
                    let _ = events.send(RawEvent::Join {
                        channel: channel.clone(),
                        from,
                    });
                }
            }
            "PART" => {
                if let (Some(prefix), Some(channel)) = (&line.prefix, line.params.first()) {
                    let from = sender_from_prefix(prefix);
                    if from.nick == self.nick {
                        members.remove(channel);
                    } else if let Some(set) = members.get_mut(channel) {
                        set.remove(&from.nick);
                    }
                    let _ = events.send(RawEvent::Part {
                        channel: channel.clone(),
                        from,
                        reason: line.params.get(1).cloned(),
                    });
                }
            }
            "QUIT" => {
                if let Some(prefix) = &line.prefix {
                    let from = sender_from_prefix(prefix);
                    let channels = remove_everywhere(members, &from.nick);
                    let _ = events.send(RawEvent::Quit {
                        from,
                        channels,
                        reason: line.params.first().cloned(),
                    });
                }
            }
            "NICK" => {
                if let (Some(prefix), Some(newnick)) = (&line.prefix, line.params.first()) {
                    let from = sender_from_prefix(prefix);
                    let channels = rename_everywhere(members, &from.nick, newnick);
                    let _ = events.send(RawEvent::NickChange {
                        from,
                        newnick: newnick.clone(),
                        channels,
                    });
                }
            }
            "KICK" => {
                if let (Some(prefix), [channel, nick, rest @ ..]) =
                    (&line.prefix, &line.params[..])
                {
                    if nick == &self.nick {
                        members.remove(channel);
                    } else if let Some(set) = members.get_mut(channel) {
                        set.remove(nick);
                    }
                    let _ = events.send(RawEvent::Kick {
                        channel: channel.clone(),
                        nick: nick.clone(),
                        by: sender_from_prefix(prefix).nick,
                        reason: rest.first().cloned(),
                    });
                }
            }
            "TOPIC" => {
                if let (Some(prefix), [channel, topic]) = (&line.prefix, &line.params[..]) {
                    let _ = events.send(RawEvent::Topic {
                        channel: channel.clone(),
                        topic: topic.clone(),
                        set_by: sender_from_prefix(prefix).nick,
                    });
                }
            }
            // topic replay on join; held until 333 names who set it
            "332" => {
                if let [_me, channel, topic] = &line.params[..] {
                    pending_topics.insert(channel.clone(), topic.clone());
                }
            }
            // RPL_TOPICWHOTIME, the replayed topic's attribution
            "333" => {
                if let [_me, channel, setter, ..] = &line.params[..] {
                    if let Some(topic) = pending_topics.remove(channel) {
                        let _ = events.send(RawEvent::Topic {
                            channel: channel.clone(),
                            topic,
                            set_by: sender_from_prefix(setter).nick,
                        });
                    }
                }
            }
            "MODE" => {
                if let (Some(prefix), [target, modes, args @ ..]) =
                    (&line.prefix, &line.params[..])
                {
                    if target.starts_with('#') || target.starts_with('&') {
                        let by = sender_from_prefix(prefix).nick;
                        for event in channel_mode_events(target, &by, modes, args) {
                            let _ = events.send(event);
                        }
                    }
                }
            }
            "INVITE" => {
                if let (Some(prefix), [_invitee, channel]) = (&line.prefix, &line.params[..]) {
                    let _ = events.send(RawEvent::Invite {
                        channel: channel.clone(),
                        from: sender_from_prefix(prefix).nick,
                    });
                }
            }
            _ => {}
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for IrcAdapter {
    async fn run(
        self: Box<Self>,
        events: mpsc::UnboundedSender<RawEvent>,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Result<(), BotError> {
        let mut attempt = 0u32;

        loop {
            match self.session(&events, &mut outbound, &mut attempt).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.server.retry_count {
                        tracing::error!(
                            "Unable to connect to {}:{}",
                            self.server.host,
                            self.server.port
                        );
                        let _ = events.send(RawEvent::Abort { retries: attempt });
                        return Err(e);
                    }
                    tracing::warn!(
                        "Connection lost ({}), retry {} of {}",
                        e,
                        attempt,
                        self.server.retry_count
                    );
                    time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}

async fn send_line(writer: &mut BufWriter<OwnedWriteHalf>, line: &str) -> Result<(), BotError> {
    tracing::trace!(">> {}", line);
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

/// One parsed line: optional prefix, command, params with trailing last.
struct Line {
    prefix: Option<String>,
    command: String,
    params: Vec<String>,
}

fn parse_line(input: &str) -> Option<Line> {
    let mut rest = input.trim_end_matches(['\r', '\n']);

    let prefix = match rest.strip_prefix(':') {
        Some(stripped) => {
            let (prefix, tail) = stripped.split_once(' ')?;
            rest = tail;
            Some(prefix.to_string())
        }
        None => None,
    };

    let (head, trailing) = match rest.split_once(" :") {
        Some((head, trailing)) => (head, Some(trailing)),
        None => (rest, None),
    };

    let mut tokens = head.split_ascii_whitespace();
    let command = tokens.next()?.to_string();
    let mut params: Vec<String> = tokens.map(str::to_string).collect();
    if let Some(trailing) = trailing {
        params.push(trailing.to_string());
    }

    Some(Line {
        prefix,
        command,
        params,
    })
}

/// Split a `nick!user@host` prefix; parts the mask lacks stay unknown.
fn sender_from_prefix(prefix: &str) -> Sender {
    let (nick_user, host) = match prefix.split_once('@') {
        Some((nick_user, host)) => (nick_user, Some(host)),
        None => (prefix, None),
    };
    let (nick, username) = match nick_user.split_once('!') {
        Some((nick, username)) => (nick, Some(username)),
        None => (nick_user, None),
    };

    let mut sender = Sender::new(nick);
    if let Some(username) = username {
        sender = sender.with_username(username);
    }
    if let Some(host) = host {
        sender = sender.with_host(host);
    }
    sender
}

/// Notices from the server itself carry no source.
fn notice_source(prefix: &str) -> Option<String> {
    if prefix.contains('!') {
        Some(sender_from_prefix(prefix).nick)
    } else if prefix.contains('.') {
        // a bare dotted name is a server
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Drop the rank sigils a NAMES reply decorates nicks with.
fn strip_rank(name: &str) -> &str {
    name.trim_start_matches(['@', '+', '%', '~', '&'])
}

/// Remove mIRC formatting: colors, bold, italics, underline, reverse.
fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x02' | '\x0f' | '\x16' | '\x1d' | '\x1f' => {}
            '\x03' => {
                // up to two foreground digits, then optionally ",NN"
                for _ in 0..2 {
                    if chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                    }
                }
                if chars.peek() == Some(&',') {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                        for _ in 0..2 {
                            if chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                                chars.next();
                            }
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Which channel modes consume an argument from the mode line.
fn takes_arg(letter: char, added: bool) -> bool {
    match letter {
        'b' | 'e' | 'I' | 'k' | 'q' | 'a' | 'o' | 'h' | 'v' => true,
        'l' => added,
        _ => false,
    }
}

/// Expand one MODE line into per-letter raw events, wire order.
fn channel_mode_events(channel: &str, by: &str, modes: &str, args: &[String]) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut args = args.iter();
    let mut added = true;

    for letter in modes.chars() {
        match letter {
            '+' => added = true,
            '-' => added = false,
            _ => {
                let arg = if takes_arg(letter, added) {
                    args.next().cloned()
                } else {
                    None
                };
                events.push(RawEvent::Mode {
                    channel: channel.to_string(),
                    by: by.to_string(),
                    added,
                    letter,
                    arg,
                });
            }
        }
    }

    events
}

/// Channels `nick` was present in, with the nick removed from each.
fn remove_everywhere(members: &mut HashMap<String, HashSet<String>>, nick: &str) -> Vec<String> {
    let mut channels = Vec::new();
    for (channel, set) in members.iter_mut() {
        if set.remove(nick) {
            channels.push(channel.clone());
        }
    }
    channels.sort();
    channels
}

/// Channels `nick` was present in, renamed to `newnick` in each.
fn rename_everywhere(
    members: &mut HashMap<String, HashSet<String>>,
    nick: &str,
    newnick: &str,
) -> Vec<String> {
    let mut channels = Vec::new();
    for (channel, set) in members.iter_mut() {
        if set.remove(nick) {
            set.insert(newnick.to_string());
            channels.push(channel.clone());
        }
    }
    channels.sort();
    channels
}
