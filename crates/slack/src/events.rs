//! Typed Socket Mode events, the dispatcher, and the three interaction
//! handlers. Every handler talks to Slack through the [`SlackGateway`]
//! seam, so the routing logic is testable with a recording double.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::gateway::{GatewayError, SlackGateway};
use crate::ids;
use crate::messages;
use crate::modal;
use crate::payload::{self, PayloadError, ViewStateValues};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    ViewSubmission(ViewSubmissionEvent),
    BlockAction(BlockActionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::BlockAction(_) => SlackEventType::BlockAction,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    SlashCommand,
    ViewSubmission,
    BlockAction,
    Unsupported,
}

/// A `/review` invocation. The trigger id is only valid for a few seconds,
/// so the handler opens the modal immediately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub trigger_id: String,
    pub user_id: String,
    pub channel_id: String,
}

/// A submitted review-request modal. The state mapping is carried raw; the
/// handler runs the typed extraction after the envelope has been
/// acknowledged, so a malformed submission is a contained handler error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub requester_id: String,
    pub state: ViewStateValues,
}

/// A button press or menu selection, with the channel and timestamp of the
/// message the element lives on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub action_id: String,
    pub user_id: String,
    pub channel_id: String,
    pub message_ts: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Wires the three interaction handlers against one shared gateway.
pub fn build_dispatcher(gateway: Arc<dyn SlackGateway>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(Arc::clone(&gateway)));
    dispatcher.register(ViewSubmissionHandler::new(Arc::clone(&gateway)));
    dispatcher.register(ActionHandler::new(gateway));
    dispatcher
}

/// Opens the review-request modal when `/review` is invoked.
pub struct CommandHandler {
    gateway: Arc<dyn SlackGateway>,
}

impl CommandHandler {
    pub fn new(gateway: Arc<dyn SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl EventHandler for CommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if payload.command != "/review" {
            debug!(
                command = %payload.command,
                correlation_id = %ctx.correlation_id,
                event_name = "slash_command_ignored",
                "unrecognized slash command"
            );
            return Ok(HandlerResult::Ignored);
        }

        let view = modal::review_request_modal();
        self.gateway.open_view(&payload.trigger_id, &view).await?;

        info!(
            user_id = %payload.user_id,
            channel_id = %payload.channel_id,
            correlation_id = %ctx.correlation_id,
            event_name = "review_form_opened",
            "opened review request form"
        );
        Ok(HandlerResult::Processed)
    }
}

/// Turns a submitted form into a posted and pinned channel announcement.
pub struct ViewSubmissionHandler {
    gateway: Arc<dyn SlackGateway>,
}

impl ViewSubmissionHandler {
    pub fn new(gateway: Arc<dyn SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl EventHandler for ViewSubmissionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if event.callback_id != ids::CALLBACK_REVIEW_REQUEST {
            debug!(
                callback_id = %event.callback_id,
                correlation_id = %ctx.correlation_id,
                event_name = "view_submission_ignored",
                "unrecognized view callback"
            );
            return Ok(HandlerResult::Ignored);
        }

        let request = payload::extract_review_request(&event.requester_id, &event.state)?;
        let announcement = messages::review_announcement(&request);
        let channel = &request.target_channel;
        let ts = self.gateway.post_message(channel, &announcement).await?;
        self.gateway.pin_message(channel, &ts).await?;

        info!(
            requester_id = %request.requester_id,
            channel = %channel,
            ts = %ts,
            reviewer_count = request.reviewer_ids.len(),
            correlation_id = %ctx.correlation_id,
            event_name = "review_announced",
            "posted and pinned review announcement"
        );
        Ok(HandlerResult::Processed)
    }
}

/// Routes announcement button presses. The modal's in-form selectors also
/// arrive here; those only need the acknowledgement and are dropped.
pub struct ActionHandler {
    gateway: Arc<dyn SlackGateway>,
}

impl ActionHandler {
    pub fn new(gateway: Arc<dyn SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl EventHandler for ActionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::BlockAction
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        match event.action_id.as_str() {
            ids::ACTION_UPVOTE_REVIEW => {
                let reply = messages::upvote_reply(&event.user_id);
                self.gateway
                    .post_thread_reply(&event.channel_id, &event.message_ts, &reply)
                    .await?;
                info!(
                    user_id = %event.user_id,
                    channel_id = %event.channel_id,
                    message_ts = %event.message_ts,
                    correlation_id = %ctx.correlation_id,
                    event_name = "review_upvoted",
                    "posted upvote reply"
                );
                Ok(HandlerResult::Processed)
            }
            ids::ACTION_BUMP_MESSAGE => {
                self.gateway
                    .post_thread_reply(&event.channel_id, &event.message_ts, messages::bump_reply())
                    .await?;
                info!(
                    user_id = %event.user_id,
                    channel_id = %event.channel_id,
                    message_ts = %event.message_ts,
                    correlation_id = %ctx.correlation_id,
                    event_name = "review_bumped",
                    "posted bump reply"
                );
                Ok(HandlerResult::Processed)
            }
            ids::INPUT_REQUESTED_REVIEWERS | ids::ACTION_POSTING_CHANNEL => {
                // In-form selector changes; the submission carries the state.
                Ok(HandlerResult::Processed)
            }
            other => {
                debug!(
                    action_id = %other,
                    correlation_id = %ctx.correlation_id,
                    event_name = "block_action_ignored",
                    "unrecognized block action"
                );
                Ok(HandlerResult::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{
        build_dispatcher, BlockActionEvent, EventContext, EventDispatcher, HandlerResult,
        SlackEnvelope, SlackEvent, SlashCommandPayload, ViewSubmissionEvent,
    };
    use crate::blocks::{MessageTemplate, ModalView};
    use crate::gateway::{GatewayError, SlackGateway};
    use crate::ids;
    use crate::messages::DEFAULT_COMMENT;
    use crate::payload::{ViewStateValue, ViewStateValues};

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum GatewayCall {
        OpenView { trigger_id: String, callback_id: String },
        PostMessage { channel: String, fallback_text: String },
        PostThreadReply { channel: String, thread_ts: String, text: String },
        PinMessage { channel: String, ts: String },
    }

    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<GatewayCall>>,
        fail_post: bool,
    }

    impl RecordingGateway {
        fn failing_posts() -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_post: true }
        }

        fn calls(&self) -> Vec<GatewayCall> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl SlackGateway for RecordingGateway {
        async fn open_view(
            &self,
            trigger_id: &str,
            view: &ModalView,
        ) -> Result<(), GatewayError> {
            self.calls.lock().expect("calls lock").push(GatewayCall::OpenView {
                trigger_id: trigger_id.to_owned(),
                callback_id: view.callback_id.clone(),
            });
            Ok(())
        }

        async fn post_message(
            &self,
            channel: &str,
            message: &MessageTemplate,
        ) -> Result<String, GatewayError> {
            if self.fail_post {
                return Err(GatewayError::Api {
                    method: "chat.postMessage",
                    error: "channel_not_found".to_owned(),
                });
            }
            self.calls.lock().expect("calls lock").push(GatewayCall::PostMessage {
                channel: channel.to_owned(),
                fallback_text: message.fallback_text.clone(),
            });
            Ok("1730000000.1234".to_owned())
        }

        async fn post_thread_reply(
            &self,
            channel: &str,
            thread_ts: &str,
            text: &str,
        ) -> Result<(), GatewayError> {
            self.calls.lock().expect("calls lock").push(GatewayCall::PostThreadReply {
                channel: channel.to_owned(),
                thread_ts: thread_ts.to_owned(),
                text: text.to_owned(),
            });
            Ok(())
        }

        async fn pin_message(&self, channel: &str, ts: &str) -> Result<(), GatewayError> {
            self.calls.lock().expect("calls lock").push(GatewayCall::PinMessage {
                channel: channel.to_owned(),
                ts: ts.to_owned(),
            });
            Ok(())
        }

        async fn auth_check(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn envelope(event: SlackEvent) -> SlackEnvelope {
        SlackEnvelope { envelope_id: "env-1".to_owned(), event }
    }

    fn state_entry(
        state: &mut ViewStateValues,
        block_id: &str,
        action_id: &str,
        value: ViewStateValue,
    ) {
        state.insert(block_id.to_owned(), HashMap::from([(action_id.to_owned(), value)]));
    }

    fn submission() -> ViewSubmissionEvent {
        let mut state = ViewStateValues::new();
        state_entry(
            &mut state,
            ids::BLOCK_SWARM_URL,
            ids::INPUT_SWARM_URL,
            ViewStateValue {
                value: Some("https://myswarm.example.com/reviews/654321".to_owned()),
                ..ViewStateValue::default()
            },
        );
        state_entry(
            &mut state,
            ids::BLOCK_REQUESTED_REVIEWERS,
            ids::INPUT_REQUESTED_REVIEWERS,
            ViewStateValue {
                selected_users: Some(vec!["U1".to_owned()]),
                ..ViewStateValue::default()
            },
        );
        state_entry(
            &mut state,
            ids::BLOCK_POSTING_CHANNEL,
            ids::ACTION_POSTING_CHANNEL,
            ViewStateValue {
                selected_conversation: Some("C42".to_owned()),
                ..ViewStateValue::default()
            },
        );

        ViewSubmissionEvent {
            callback_id: ids::CALLBACK_REVIEW_REQUEST.to_owned(),
            requester_id: "U100".to_owned(),
            state,
        }
    }

    #[tokio::test]
    async fn review_command_opens_the_request_form() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::SlashCommand(SlashCommandPayload {
            command: "/review".to_owned(),
            trigger_id: "trigger-1".to_owned(),
            user_id: "U100".to_owned(),
            channel_id: "C42".to_owned(),
        }));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::OpenView {
                trigger_id: "trigger-1".to_owned(),
                callback_id: ids::CALLBACK_REVIEW_REQUEST.to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn unrecognized_slash_command_is_ignored_without_calls() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::SlashCommand(SlashCommandPayload {
            command: "/deploy".to_owned(),
            trigger_id: "trigger-2".to_owned(),
            user_id: "U100".to_owned(),
            channel_id: "C42".to_owned(),
        }));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn submission_posts_announcement_then_pins_the_returned_ts() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::ViewSubmission(submission()));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::PostMessage {
                    channel: "C42".to_owned(),
                    fallback_text: "<@U100> has requested a code review".to_owned(),
                },
                GatewayCall::PinMessage {
                    channel: "C42".to_owned(),
                    ts: "1730000000.1234".to_owned(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn malformed_submission_is_a_contained_handler_error_with_no_calls() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let mut event = submission();
        event.state.remove(ids::BLOCK_POSTING_CHANNEL);
        let envelope = envelope(SlackEvent::ViewSubmission(event));

        let result = dispatcher.dispatch(&envelope, &EventContext::default()).await;

        let error = result.expect_err("missing posting channel should fail extraction");
        assert!(error.to_string().contains(ids::ACTION_POSTING_CHANNEL));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_announcement_post_surfaces_and_skips_the_pin() {
        let gateway = Arc::new(RecordingGateway::failing_posts());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::ViewSubmission(submission()));

        let result = dispatcher.dispatch(&envelope, &EventContext::default()).await;

        assert!(result.is_err());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn upvote_posts_exactly_one_threaded_reply() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::BlockAction(BlockActionEvent {
            action_id: ids::ACTION_UPVOTE_REVIEW.to_owned(),
            user_id: "U7".to_owned(),
            channel_id: "C42".to_owned(),
            message_ts: "1730000000.1234".to_owned(),
        }));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::PostThreadReply {
                channel: "C42".to_owned(),
                thread_ts: "1730000000.1234".to_owned(),
                text: "<@U7> just upvoted!  :upvote:".to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn bump_posts_the_fixed_reply_in_the_announcement_thread() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::BlockAction(BlockActionEvent {
            action_id: ids::ACTION_BUMP_MESSAGE.to_owned(),
            user_id: "U8".to_owned(),
            channel_id: "C42".to_owned(),
            message_ts: "1730000000.5678".to_owned(),
        }));

        dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::PostThreadReply {
                channel: "C42".to_owned(),
                thread_ts: "1730000000.5678".to_owned(),
                text: "*Bump.*  :eyes:".to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn modal_selector_actions_are_acknowledged_without_side_effects() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());

        for action_id in [ids::INPUT_REQUESTED_REVIEWERS, ids::ACTION_POSTING_CHANNEL] {
            let envelope = envelope(SlackEvent::BlockAction(BlockActionEvent {
                action_id: action_id.to_owned(),
                user_id: "U9".to_owned(),
                channel_id: "C42".to_owned(),
                message_ts: "1730000000.0001".to_owned(),
            }));
            let result =
                dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");
            assert_eq!(result, HandlerResult::Processed);
        }

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_action_id_is_ignored() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let envelope = envelope(SlackEvent::BlockAction(BlockActionEvent {
            action_id: "action-unknown".to_owned(),
            user_id: "U9".to_owned(),
            channel_id: "C42".to_owned(),
            message_ts: "1730000000.0001".to_owned(),
        }));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn submission_with_foreign_callback_is_ignored() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = build_dispatcher(gateway.clone());
        let mut event = submission();
        event.callback_id = "view-something-else".to_owned();
        let envelope = envelope(SlackEvent::ViewSubmission(event));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();
        let envelope = envelope(SlackEvent::Unsupported { event_type: "events_api".to_owned() });

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn build_dispatcher_registers_all_interaction_handlers() {
        let dispatcher = build_dispatcher(Arc::new(RecordingGateway::default()));
        assert_eq!(dispatcher.handler_count(), 3);
    }

    #[test]
    fn default_comment_survives_into_the_fields_section() {
        let event = submission();
        let request = crate::payload::extract_review_request(&event.requester_id, &event.state)
            .expect("extraction");

        let announcement = crate::messages::review_announcement(&request);
        let rendered = serde_json::to_string(&announcement.blocks).expect("serialize");
        assert!(rendered.contains(DEFAULT_COMMENT));
    }
}
