use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::{NotificationId, PostId, TipId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Tip,
    Comment,
    Like,
    Welcome,
}

/// A message for one recipient. Only `is_read` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
    /// Id of the tip or post this notification is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(
        recipient: UserId,
        sender: Option<UserId>,
        kind: NotificationKind,
        message: String,
        reference: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            recipient,
            sender,
            kind,
            message,
            reference,
            is_read: false,
            created_at,
        }
    }

    pub fn tip(
        recipient: UserId,
        sender: UserId,
        sender_label: &str,
        amount: TokenAmount,
        tip: &TipId,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            recipient,
            Some(sender),
            NotificationKind::Tip,
            format!("{sender_label} tipped you {amount} tokens"),
            Some(tip.to_string()),
            at,
        )
    }

    pub fn comment(
        recipient: UserId,
        sender: UserId,
        sender_label: &str,
        post: &PostId,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            recipient,
            Some(sender),
            NotificationKind::Comment,
            format!("{sender_label} commented on your post"),
            Some(post.to_string()),
            at,
        )
    }

    pub fn like(
        recipient: UserId,
        sender: UserId,
        sender_label: &str,
        post: &PostId,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            recipient,
            Some(sender),
            NotificationKind::Like,
            format!("{sender_label} liked your post"),
            Some(post.to_string()),
            at,
        )
    }

    pub fn welcome(recipient: UserId, label: &str, at: DateTime<Utc>) -> Self {
        Self::new(
            recipient,
            None,
            NotificationKind::Welcome,
            format!("Welcome to MoltTip, {label}!"),
            None,
            at,
        )
    }

    /// Returns true if this call flipped the notification to read.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.is_read;
        self.is_read = true;
        changed
    }
}
