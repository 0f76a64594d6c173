use std::sync::OnceLock;

use regex::Regex;

/// A submitted review-request form, extracted from the view state by the
/// event boundary. One instance per submission; nothing is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRequest {
    pub requester_id: String,
    pub bugstar_id: Option<String>,
    pub swarm_url: String,
    pub reviewer_ids: Vec<String>,
    pub comment: Option<String>,
    pub target_channel: String,
}

/// What the requester is asking to have reviewed: either a recognized Swarm
/// review link, or free text treated as an opaque item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewItem {
    Swarm { url: String, review_number: String },
    Item { raw_text: String },
}

// Anchored to the literal `swarm` and `.com/reviews/` substrings, tolerant
// of an optional subdomain segment and an optional trailing slash. The one
// digit run is the review identifier.
fn swarm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"https://(.+)?swarm.+\.com/reviews/(\d+)/?")
            .expect("swarm review pattern is valid")
    })
}

impl ReviewItem {
    /// Classifies raw form input. Anything that does not look like a Swarm
    /// review URL is carried verbatim as a generic item.
    pub fn classify(raw: &str) -> Self {
        match swarm_pattern().captures(raw) {
            Some(captures) => Self::Swarm {
                url: raw.to_owned(),
                review_number: captures[2].to_owned(),
            },
            None => Self::Item { raw_text: raw.to_owned() },
        }
    }

    /// Renders the item the way the announcement header embeds it: a
    /// hyperlinked review number for Swarm links, a blockquote otherwise.
    pub fn render(&self) -> String {
        match self {
            Self::Swarm { url, review_number } => format!("*swarm* <{url}|{review_number}>"),
            Self::Item { raw_text } => format!("*item*\n>{raw_text}"),
        }
    }

    pub fn review_number(&self) -> Option<&str> {
        match self {
            Self::Swarm { review_number, .. } => Some(review_number),
            Self::Item { .. } => None,
        }
    }
}

/// Joins reviewer ids into a mention list, preserving selection order.
/// An empty selection renders as an empty string rather than an error.
pub fn mention_list(reviewer_ids: &[String]) -> String {
    reviewer_ids.iter().map(|id| format!("<@{id}>")).collect::<Vec<_>>().join(", ")
}
