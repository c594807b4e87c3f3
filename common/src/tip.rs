use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{AmountError, TokenAmount};
use crate::api::TipRequest;
use crate::identity::{CommentId, PostId, TipId, UserId, WalletAddress};
use crate::user::InsufficientBalance;

/// Longest transaction hash accepted from a client.
pub const TX_HASH_MAX_LEN: usize = 256;

/// A unidirectional token transfer from one user to another. Immutable
/// once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub id: TipId,
    pub from: UserId,
    pub to: UserId,
    pub amount: TokenAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    pub tx_hash: TxHash,
    pub status: TipStatus,
    pub created_at: DateTime<Utc>,
}

/// Settlement state of a tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TipStatus {
    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(self, next: TipStatus) -> bool {
        matches!(
            (self, next),
            (TipStatus::Pending, TipStatus::Confirmed) | (TipStatus::Pending, TipStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TipStatus::Pending)
    }
}

impl fmt::Display for TipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipStatus::Pending => write!(f, "pending"),
            TipStatus::Confirmed => write!(f, "confirmed"),
            TipStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Deduplication key for a tip. Either supplied by the client (an on-chain
/// transaction reference) or issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Normalize a client-supplied hash: trimmed, lower-cased. Blank input
    /// means "none supplied".
    pub fn parse(raw: &str) -> Result<Option<Self>, TipRejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.len() > TX_HASH_MAX_LEN || !trimmed.chars().all(|c| c.is_ascii_graphic()) {
            return Err(TipRejection::InvalidTxHash);
        }
        Ok(Some(Self(trimmed.to_ascii_lowercase())))
    }

    /// Server-issued key of the form `{sender}:{unix_millis}:{random}`.
    pub fn issue(sender: &UserId, at: DateTime<Utc>) -> Self {
        let nonce: u64 = rand::random();
        Self(format!(
            "{}:{}:{nonce:016x}",
            sender.as_str().to_ascii_lowercase(),
            at.timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a tip is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Id(UserId),
    Address(WalletAddress),
}

/// A tip request that passed the input checks that need no state:
/// a recipient is named and the amount is a positive finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct TipDraft {
    pub recipient: Recipient,
    pub amount: TokenAmount,
    pub post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
    pub tx_hash: Option<TxHash>,
}

impl TipDraft {
    pub fn parse(request: &TipRequest) -> Result<Self, TipRejection> {
        let recipient = match (
            non_blank(request.to_user_id.as_deref()),
            non_blank(request.recipient_address.as_deref()),
        ) {
            (Some(id), _) => Recipient::Id(UserId::from(id)),
            (None, Some(address)) => Recipient::Address(
                WalletAddress::parse(address).ok_or(TipRejection::InvalidRecipientAddress)?,
            ),
            (None, None) => return Err(TipRejection::MissingRecipient),
        };
        let amount = TokenAmount::parse_tip(&request.amount).map_err(TipRejection::InvalidAmount)?;
        let tx_hash = match request.tx_hash.as_deref() {
            Some(raw) => TxHash::parse(raw)?,
            None => None,
        };
        Ok(Self {
            recipient,
            amount,
            post_id: non_blank(request.post_id.as_ref().map(PostId::as_str)).map(PostId::from),
            comment_id: non_blank(request.comment_id.as_ref().map(CommentId::as_str))
                .map(CommentId::from),
            tx_hash,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reasons a tip is refused. Every rejection happens before any write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipRejection {
    MissingRecipient,
    InvalidRecipientAddress,
    InvalidAmount(AmountError),
    UnknownRecipient,
    SelfTip,
    UnknownPost,
    UnknownComment,
    InvalidTxHash,
    DuplicateTxHash,
    InsufficientBalance {
        available: TokenAmount,
        requested: TokenAmount,
    },
    Unverified,
}

impl TipRejection {
    /// Rejections caused by a reference to something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownRecipient | Self::UnknownPost | Self::UnknownComment
        )
    }
}

impl fmt::Display for TipRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRecipient => write!(f, "Recipient is required"),
            Self::InvalidRecipientAddress => {
                write!(f, "Recipient address is not a valid wallet address")
            }
            Self::InvalidAmount(e) => write!(f, "Invalid amount: {e}"),
            Self::UnknownRecipient => write!(f, "Recipient not found"),
            Self::SelfTip => write!(f, "Cannot tip yourself"),
            Self::UnknownPost => write!(f, "Post not found"),
            Self::UnknownComment => write!(f, "Comment not found"),
            Self::InvalidTxHash => write!(f, "Transaction hash is malformed"),
            Self::DuplicateTxHash => write!(f, "Transaction hash already used"),
            Self::InsufficientBalance {
                available,
                requested,
            } => write!(
                f,
                "Insufficient balance: have {available}, need {requested}"
            ),
            Self::Unverified => write!(f, "Transaction could not be verified"),
        }
    }
}

impl std::error::Error for TipRejection {}

impl From<InsufficientBalance> for TipRejection {
    fn from(e: InsufficientBalance) -> Self {
        Self::InsufficientBalance {
            available: e.available,
            requested: e.requested,
        }
    }
}
