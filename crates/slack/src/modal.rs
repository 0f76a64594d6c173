//! The review-request form opened by `/review`.

use crate::blocks::{
    ActionElement, Block, ConversationsSelectElement, InputElement, ModalView,
    PlainTextInputElement, SectionAccessory, TextObject, UrlTextInputElement,
};
use crate::ids;

/// Builds the modal descriptor for a review request: optional Bugstar id,
/// required Swarm URL, reviewer selector, optional comment, and a posting
/// channel that defaults to the invoking conversation. Field presence is
/// enforced by Slack before the submission event is delivered.
pub fn review_request_modal() -> ModalView {
    let blocks = vec![
        Block::section(TextObject::mrkdwn(
            "_Use this window to post a code review request to the channel, \
             tagging the necessary reviewers to notify them of the proposed \
             changes in your Swarm._",
        )),
        Block::Input {
            block_id: ids::BLOCK_BUGSTAR_ID.to_owned(),
            optional: true,
            element: InputElement::PlainTextInput(PlainTextInputElement {
                action_id: ids::INPUT_BUGSTAR_ID.to_owned(),
                multiline: None,
                focus_on_load: Some(true),
                placeholder: Some(TextObject::plain("bugstar://654321")),
            }),
            label: TextObject::plain("Bugstar"),
        },
        Block::Input {
            block_id: ids::BLOCK_SWARM_URL.to_owned(),
            optional: false,
            element: InputElement::UrlTextInput(UrlTextInputElement {
                action_id: ids::INPUT_SWARM_URL.to_owned(),
                placeholder: Some(TextObject::plain("Enter Swarm URL")),
            }),
            label: TextObject::plain("Swarm URL"),
        },
        Block::Section {
            block_id: Some(ids::BLOCK_REQUESTED_REVIEWERS.to_owned()),
            text: Some(TextObject::mrkdwn("*Reviewers*")),
            fields: None,
            accessory: Some(SectionAccessory::MultiUsersSelect {
                action_id: ids::INPUT_REQUESTED_REVIEWERS.to_owned(),
                placeholder: Some(TextObject::plain("@NikoBellic...")),
            }),
        },
        Block::Input {
            block_id: ids::BLOCK_COMMENTS_MESSAGES.to_owned(),
            optional: true,
            element: InputElement::PlainTextInput(PlainTextInputElement {
                action_id: ids::INPUT_COMMENTS_MESSAGES.to_owned(),
                multiline: Some(true),
                focus_on_load: None,
                placeholder: Some(TextObject::plain("Write a small message to reviewers")),
            }),
            label: TextObject::plain("Comments"),
        },
        Block::Actions {
            block_id: Some(ids::BLOCK_POSTING_CHANNEL.to_owned()),
            elements: vec![ActionElement::ConversationsSelect(ConversationsSelectElement {
                action_id: ids::ACTION_POSTING_CHANNEL.to_owned(),
                default_to_current_conversation: true,
                placeholder: Some(TextObject::plain("Select channel")),
            })],
        },
    ];

    ModalView::new(ids::CALLBACK_REVIEW_REQUEST, "Request a code review", "Submit", "Cancel", blocks)
}
