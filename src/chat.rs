//! Read-only Twitch chat over IRC
//!
//! Logs in anonymously (`justinfan<n>`), joins one channel and turns
//! `PRIVMSG` lines into [`ChatEvent::Message`] and raid `USERNOTICE`s into
//! [`ChatEvent::Raid`]. Everything else is dropped.

use std::collections::{BTreeSet, HashMap};
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{ChatEvent, ChatMessage, RaidNotice};

/// Plain-text Twitch IRC endpoint
pub const TWITCH_IRC_ADDR: &str = "irc.chat.twitch.tv:6667";

/// Minimal representation of a parsed IRC line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcLine {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl IrcLine {
    pub fn parse(line: &str) -> Self {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut parsed = IrcLine::default();

        // 1) tags
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, remainder) = stripped.split_once(' ').unwrap_or((stripped, ""));
            parsed.tags = raw_tags
                .split(';')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                    (key.to_string(), unescape_tag(value))
                })
                .collect();
            rest = remainder;
        }

        // 2) prefix
        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, remainder) = stripped.split_once(' ').unwrap_or((stripped, ""));
            parsed.prefix = Some(prefix.to_string());
            rest = remainder;
        }

        // 3) command, params, trailing
        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_string())),
            None => (rest, None),
        };
        let mut words = head.split_whitespace();
        parsed.command = words.next().unwrap_or_default().to_uppercase();
        parsed.params = words.map(str::to_string).collect();
        parsed.trailing = trailing;
        parsed
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Nick part of `nick!user@host`
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split('!').next().unwrap_or(p))
    }

    /// Badge names from `badges=broadcaster/1,subscriber/12`
    pub fn badges(&self) -> BTreeSet<String> {
        self.tag("badges")
            .map(|raw| {
                raw.split(',')
                    .filter_map(|badge| badge.split('/').next())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Map to a bot event, if this line is one the bot cares about
    pub fn to_event(&self) -> Option<ChatEvent> {
        let channel = self.params.first()?.clone();
        match self.command.as_str() {
            "PRIVMSG" => Some(ChatEvent::Message(ChatMessage {
                channel,
                sender: self.nick().unwrap_or_default().to_string(),
                badges: self.badges(),
                text: self.trailing.clone().unwrap_or_default(),
            })),
            "USERNOTICE" if self.tag("msg-id") == Some("raid") => {
                let login = self.tag("login")?.to_string();
                Some(ChatEvent::Raid(RaidNotice {
                    channel,
                    display_name: self
                        .tag("msg-param-displayName")
                        .unwrap_or(&login)
                        .to_string(),
                    viewer_count: self
                        .tag("msg-param-viewerCount")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0),
                    login,
                }))
            }
            _ => None,
        }
    }
}

/// IRCv3 tag value unescaping
fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some(':') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Anonymous chat connection for one channel
pub struct TwitchChat {
    /// Chat and raid events, closed when the connection ends
    pub events: mpsc::Receiver<ChatEvent>,
    read_task: JoinHandle<()>,
}

impl TwitchChat {
    /// Connect to Twitch and join `channel`
    pub async fn connect(channel: &str) -> io::Result<Self> {
        Self::connect_to(TWITCH_IRC_ADDR, channel).await
    }

    /// Connect to a specific IRC address (for testing)
    pub async fn connect_to(addr: &str, channel: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, mut write_half) = stream.into_split();

        let channel = channel.trim_start_matches('#').to_lowercase();
        let nick = format!("justinfan{}", rand::random_range(10_000..100_000u32));
        let handshake = format!(
            "CAP REQ :twitch.tv/tags twitch.tv/commands\r\nPASS SCHMOOPIIE\r\nNICK {nick}\r\nJOIN #{channel}\r\n"
        );
        write_half.write_all(handshake.as_bytes()).await?;
        info!(%channel, %nick, "joined chat");

        let (tx, rx) = mpsc::channel(64);
        let read_task = tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        info!("chat connection closed");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "chat read failed");
                        break;
                    }
                }

                let parsed = IrcLine::parse(&line);
                debug!(command = %parsed.command, "<< {}", line.trim_end());

                if parsed.command == "PING" {
                    let pong = format!("PONG :{}\r\n", parsed.trailing.unwrap_or_default());
                    if let Err(e) = write_half.write_all(pong.as_bytes()).await {
                        warn!(error = %e, "failed to answer PING");
                        break;
                    }
                    continue;
                }

                if let Some(event) = parsed.to_event() {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(Self {
            events: rx,
            read_task,
        })
    }
}

impl Drop for TwitchChat {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}
