//! Block, action, and callback identifiers shared by the form builder, the
//! announcement builder, and the event router. Keeping them in one place
//! prevents the message side and the routing side from drifting apart.

/// Callback id carried by the review-request modal and matched on submission.
pub const CALLBACK_REVIEW_REQUEST: &str = "view-code-review-request";

pub const BLOCK_BUGSTAR_ID: &str = "block-bugstar-id";
pub const INPUT_BUGSTAR_ID: &str = "input-bugstar-id";

pub const BLOCK_SWARM_URL: &str = "block-swarm-url";
pub const INPUT_SWARM_URL: &str = "input-swarm-url";

pub const BLOCK_REQUESTED_REVIEWERS: &str = "block-requested-reviewers";
pub const INPUT_REQUESTED_REVIEWERS: &str = "input-requested-reviewers";

pub const BLOCK_COMMENTS_MESSAGES: &str = "block-comments-messages";
pub const INPUT_COMMENTS_MESSAGES: &str = "input-comments-messages";

pub const BLOCK_POSTING_CHANNEL: &str = "block-posting-channel";
pub const ACTION_POSTING_CHANNEL: &str = "action-posting-channel";

/// Upvote button on the posted announcement.
pub const ACTION_UPVOTE_REVIEW: &str = "action-upvote-review";

/// Nudge option in the announcement's overflow menu.
pub const ACTION_BUMP_MESSAGE: &str = "action-bump-message";
