use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::{PostId, UserId};

pub const POST_MAX_CHARS: usize = 2000;
pub const COMMENT_MAX_CHARS: usize = 1000;

/// A feed post. Counters are bumped in place by comment, like and tip
/// operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub content: String,
    pub likes: u64,
    pub comments: u64,
    pub tip_count: u64,
    pub total_tips: TokenAmount,
    pub created_at: DateTime<Utc>,
    /// One like per user.
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
}

impl Post {
    pub fn new(author: UserId, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: PostId::generate(),
            author,
            content,
            likes: 0,
            comments: 0,
            tip_count: 0,
            total_tips: TokenAmount::ZERO,
            created_at,
            liked_by: BTreeSet::new(),
        }
    }

    /// Record a like. Returns false if the user already liked the post.
    pub fn like(&mut self, user: &UserId) -> bool {
        if !self.liked_by.insert(user.clone()) {
            return false;
        }
        self.likes += 1;
        true
    }

    pub fn record_tip(&mut self, amount: TokenAmount) {
        self.tip_count += 1;
        self.total_tips = self.total_tips.saturating_add(amount);
    }
}

/// Post or comment body that failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentError {
    Empty,
    TooLong { max: usize },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "content must not be empty"),
            Self::TooLong { max } => write!(f, "content must be at most {max} characters"),
        }
    }
}

impl std::error::Error for ContentError {}

/// Trim a body and check it is non-empty and within `max` characters.
pub fn validate_content(raw: &str, max: usize) -> Result<String, ContentError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ContentError::Empty);
    }
    if content.chars().count() > max {
        return Err(ContentError::TooLong { max });
    }
    Ok(content.to_string())
}
