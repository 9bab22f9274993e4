//! raidclip - raid shoutout bot
//!
//! Picks a recent clip from a raiding (or named) channel and drives an
//! on-screen overlay through a display cycle.
//!
//! # Modules
//!
//! - `models` - Clips, users, selection requests, chat events
//! - `api` - Twitch Helix and OAuth clients behind the `ClipGateway` trait
//! - `selector` - Expanding-window clip selection
//! - `raid` - Most recent raider slot
//! - `dispatch` - Chat command parsing and authorization
//! - `overlay` - Display state machine, surfaces and local player
//! - `chat` - Anonymous Twitch IRC transport
//! - `bot` - Event loop tying chat, jobs and overlay together
//! - `config` / `cli` / `commands` - Binary plumbing

pub mod models;
pub mod api;
pub mod selector;
pub mod raid;
pub mod dispatch;
pub mod overlay;
pub mod chat;
pub mod bot;
pub mod config;
pub mod cli;
pub mod commands;

// Re-export commonly used types
pub use models::{
    ChatEvent, ChatMessage, ChoiceRule, Clip, ClipPage, RaidNotice,
    SelectionRequest, Shoutout, TimeWindow, User,
};

pub use api::{ClipGateway, HelixClient, HelixError};
pub use bot::Bot;
pub use dispatch::CommandDispatcher;
pub use overlay::{Overlay, OverlayEvent, OverlayState, OverlaySurface};
pub use raid::RaidTracker;
pub use selector::{ClipSelector, SelectError};
