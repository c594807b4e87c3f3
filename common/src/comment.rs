use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{CommentId, PostId, UserId};

/// A reply on a post. Comments are append-only; they go away only when
/// their post is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: PostId, author: UserId, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::generate(),
            post_id,
            author,
            content,
            created_at,
        }
    }
}
