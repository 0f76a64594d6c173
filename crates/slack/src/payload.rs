//! Decodes raw Socket Mode frames into typed envelopes.
//!
//! Slack wraps every delivery in an envelope whose `payload` shape depends
//! on the envelope `type`. This module owns that unwrapping so the rest of
//! the crate only ever sees [`SlackEnvelope`] values.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use revbot_core::review::ReviewRequest;

use crate::events::{
    BlockActionEvent, SlackEnvelope, SlackEvent, SlashCommandPayload, ViewSubmissionEvent,
};
use crate::ids;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("envelope is missing `{field}`")]
    MissingField { field: &'static str },
    #[error("view submission is missing `{key}`")]
    MalformedSubmission { key: String },
}

/// One decoded WebSocket frame. Control frames never reach the dispatcher;
/// the runner consumes them directly.
#[derive(Debug, PartialEq, Eq)]
pub enum SocketFrame {
    Hello,
    Disconnect { reason: Option<String> },
    Envelope(SlackEnvelope),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawSlashCommand {
    command: String,
    trigger_id: String,
    user_id: String,
    channel_id: String,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Deserialize)]
struct RawInteractive {
    #[serde(rename = "type")]
    kind: String,
    user: RawUser,
    #[serde(default)]
    view: Option<RawView>,
    #[serde(default)]
    actions: Vec<RawAction>,
    #[serde(default)]
    container: Option<RawContainer>,
    #[serde(default)]
    channel: Option<RawChannel>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawView {
    callback_id: String,
    state: RawViewState,
}

#[derive(Deserialize)]
struct RawViewState {
    values: ViewStateValues,
}

/// One entry in `view.state.values`. Which field is populated depends on
/// the element type; absent and null are equivalent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewStateValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_users: Option<Vec<String>>,
    #[serde(default)]
    pub selected_conversation: Option<String>,
}

/// The nested `view.state.values` mapping, keyed block id then action id.
pub type ViewStateValues = HashMap<String, HashMap<String, ViewStateValue>>;

#[derive(Deserialize)]
struct RawAction {
    action_id: String,
}

#[derive(Deserialize)]
struct RawContainer {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    message_ts: Option<String>,
}

#[derive(Deserialize)]
struct RawChannel {
    id: String,
}

#[derive(Deserialize)]
struct RawMessage {
    ts: String,
}

/// Decodes one raw text frame from the Socket Mode connection.
pub fn parse_frame(raw: &str) -> Result<SocketFrame, PayloadError> {
    let frame: RawFrame = serde_json::from_str(raw)?;

    match frame.kind.as_str() {
        "hello" => Ok(SocketFrame::Hello),
        "disconnect" => Ok(SocketFrame::Disconnect { reason: frame.reason }),
        kind => {
            let envelope_id =
                frame.envelope_id.ok_or(PayloadError::MissingField { field: "envelope_id" })?;
            let payload =
                frame.payload.ok_or(PayloadError::MissingField { field: "payload" })?;

            let event = match kind {
                "slash_commands" => parse_slash_command(payload)?,
                "interactive" => parse_interactive(payload)?,
                other => SlackEvent::Unsupported { event_type: other.to_owned() },
            };

            Ok(SocketFrame::Envelope(SlackEnvelope { envelope_id, event }))
        }
    }
}

fn parse_slash_command(payload: serde_json::Value) -> Result<SlackEvent, PayloadError> {
    let raw: RawSlashCommand = serde_json::from_value(payload)?;
    Ok(SlackEvent::SlashCommand(SlashCommandPayload {
        command: raw.command,
        trigger_id: raw.trigger_id,
        user_id: raw.user_id,
        channel_id: raw.channel_id,
    }))
}

fn parse_interactive(payload: serde_json::Value) -> Result<SlackEvent, PayloadError> {
    let raw: RawInteractive = serde_json::from_value(payload)?;

    match raw.kind.as_str() {
        "view_submission" => {
            // The typed field extraction is deferred to the handler so that
            // a malformed submission is still acknowledged by the runner.
            let view = raw.view.ok_or(PayloadError::MissingField { field: "view" })?;
            Ok(SlackEvent::ViewSubmission(ViewSubmissionEvent {
                callback_id: view.callback_id,
                requester_id: raw.user.id,
                state: view.state.values,
            }))
        }
        "block_actions" => {
            let action = raw
                .actions
                .into_iter()
                .next()
                .ok_or(PayloadError::MissingField { field: "actions" })?;

            // Container first, falling back to the top-level message and
            // channel objects some interactive payloads carry instead.
            // Modal selector actions have neither; those never use the
            // coordinates downstream.
            let channel_id = raw
                .container
                .as_ref()
                .and_then(|container| container.channel_id.clone())
                .or_else(|| raw.channel.map(|channel| channel.id))
                .unwrap_or_default();
            let message_ts = raw
                .container
                .and_then(|container| container.message_ts)
                .or_else(|| raw.message.map(|message| message.ts))
                .unwrap_or_default();

            Ok(SlackEvent::BlockAction(BlockActionEvent {
                action_id: action.action_id,
                user_id: raw.user.id,
                channel_id,
                message_ts,
            }))
        }
        other => Ok(SlackEvent::Unsupported { event_type: format!("interactive:{other}") }),
    }
}

/// Pulls the typed form fields out of `view.state.values`. The required
/// swarm field and the posting channel must be present; everything else
/// tolerates null, empty, or missing entries.
pub fn extract_review_request(
    requester_id: &str,
    values: &ViewStateValues,
) -> Result<ReviewRequest, PayloadError> {
    let swarm_url = state_value(values, ids::BLOCK_SWARM_URL, ids::INPUT_SWARM_URL)
        .and_then(|entry| entry.value.clone())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PayloadError::MalformedSubmission {
            key: format!("{}.{}", ids::BLOCK_SWARM_URL, ids::INPUT_SWARM_URL),
        })?;

    let target_channel =
        state_value(values, ids::BLOCK_POSTING_CHANNEL, ids::ACTION_POSTING_CHANNEL)
            .and_then(|entry| entry.selected_conversation.clone())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| PayloadError::MalformedSubmission {
                key: format!("{}.{}", ids::BLOCK_POSTING_CHANNEL, ids::ACTION_POSTING_CHANNEL),
            })?;

    let bugstar_id = state_value(values, ids::BLOCK_BUGSTAR_ID, ids::INPUT_BUGSTAR_ID)
        .and_then(|entry| entry.value.clone())
        .filter(|value| !value.is_empty());

    let comment =
        state_value(values, ids::BLOCK_COMMENTS_MESSAGES, ids::INPUT_COMMENTS_MESSAGES)
            .and_then(|entry| entry.value.clone())
            .filter(|value| !value.is_empty());

    let reviewer_ids =
        state_value(values, ids::BLOCK_REQUESTED_REVIEWERS, ids::INPUT_REQUESTED_REVIEWERS)
            .and_then(|entry| entry.selected_users.clone())
            .unwrap_or_default();

    Ok(ReviewRequest {
        requester_id: requester_id.to_owned(),
        bugstar_id,
        swarm_url,
        reviewer_ids,
        comment,
        target_channel,
    })
}

fn state_value<'a>(
    values: &'a ViewStateValues,
    block_id: &str,
    action_id: &str,
) -> Option<&'a ViewStateValue> {
    values.get(block_id).and_then(|block| block.get(action_id))
}
