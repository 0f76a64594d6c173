//! Announcement and threaded-reply composition.

use revbot_core::review::{mention_list, ReviewItem, ReviewRequest};

use crate::blocks::{ButtonElement, MessageBuilder, MessageTemplate, OverflowElement, OverflowOption};
use crate::ids;

/// Substituted when the requester leaves the comment field empty.
pub const DEFAULT_COMMENT: &str = "Thanks!  🚀";

/// Builds the channel announcement for a submitted review request: header
/// naming the requester and the classified item, a two-column
/// comments/bug-reference section, the reviewers line, and the nudge/upvote
/// action row. The action ids here are the same constants the event router
/// matches on.
pub fn review_announcement(request: &ReviewRequest) -> MessageTemplate {
    let item = ReviewItem::classify(&request.swarm_url);
    let mentions = mention_list(&request.reviewer_ids);
    let comment = request.comment.as_deref().unwrap_or(DEFAULT_COMMENT);
    // A blank space keeps the field visible when no bug is referenced.
    let bugstar = request.bugstar_id.as_deref().unwrap_or(" ");

    MessageBuilder::new(format!(
        "<@{requester}> has requested a code review",
        requester = request.requester_id
    ))
    .section(|section| {
        section.mrkdwn(format!(
            "> *<@{requester}> has requested a review for* {item}",
            requester = request.requester_id,
            item = item.render(),
        ));
    })
    .fields(|fields| {
        fields
            .mrkdwn(format!("*Comments*\n {comment}"))
            .mrkdwn(format!("*Bug* :bug_star:\n{bugstar}"));
    })
    .section(|section| {
        section.mrkdwn(format!(
            "*Reviewers*\n{reviewers}",
            reviewers = if mentions.is_empty() { " " } else { mentions.as_str() }
        ));
    })
    .actions(|actions| {
        actions
            .overflow(OverflowElement {
                action_id: ids::ACTION_BUMP_MESSAGE.to_owned(),
                options: vec![OverflowOption::new(":bell:  Nudge")],
            })
            .button(ButtonElement::new(ids::ACTION_UPVOTE_REVIEW, ":thumbsup:  Upvote"));
    })
    .build()
}

/// Threaded reply posted under the announcement when someone upvotes.
pub fn upvote_reply(user_id: &str) -> String {
    format!("<@{user_id}> just upvoted!  :upvote:")
}

/// Threaded reply posted under the announcement for a nudge.
pub fn bump_reply() -> &'static str {
    "*Bump.*  :eyes:"
}
