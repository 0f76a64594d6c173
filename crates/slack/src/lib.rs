//! Slack Integration - Socket Mode bot interface
//!
//! This crate is the whole Slack surface of revbot:
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Payloads** (`payload`) - Raw frame decoding into typed envelopes
//! - **Events** (`events`) - Dispatcher and the three interaction handlers
//! - **Gateway** (`gateway`) - Outbound Web API calls (views, messages, pins)
//! - **Block Kit** (`blocks`, `modal`, `messages`) - Form and announcement builders
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and interactivity
//! 3. Add the slash command: `/review`
//! 4. Set env vars: `REVBOT_SLACK_APP_TOKEN`, `REVBOT_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Slack frames → SocketModeRunner → EventDispatcher → Handlers
//!                                                        ↓
//!                              Slack Web API  ←  SlackGateway
//! ```
//!
//! # Key Types
//!
//! - `SocketModeRunner` - WebSocket event loop with reconnection logic
//! - `EventDispatcher` - Routes envelopes to the registered handlers
//! - `SlackGateway` - Trait over the Web API calls handlers make
//! - `MessageBuilder` / `ModalView` - Block Kit construction

pub mod blocks;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod messages;
pub mod modal;
pub mod payload;
pub mod socket;
