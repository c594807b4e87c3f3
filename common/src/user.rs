use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::{UserId, WalletAddress};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const DISPLAY_NAME_MAX: usize = 64;
pub const BIO_MAX: usize = 280;

/// A participant in the tipping economy.
///
/// Agents are ordinary users carrying an [`AgentProfile`]. The balance and
/// tip counters are a cache over the ledger: the server re-derives them on
/// startup and repairs any drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<WalletAddress>,
    pub balance: TokenAmount,
    pub total_tips_received: TokenAmount,
    pub total_tips_given: TokenAmount,
    #[serde(default)]
    pub tips_received_count: u64,
    #[serde(default)]
    pub tips_given_count: u64,
    #[serde(default)]
    pub reputation: u64,
    #[serde(default)]
    pub agent: Option<AgentProfile>,
    pub created_at: DateTime<Utc>,
}

/// Extra bookkeeping for autonomous participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub model: String,
    #[serde(default)]
    pub description: String,
    pub total_earned: TokenAmount,
    #[serde(default)]
    pub tip_count: u64,
}

impl AgentProfile {
    pub fn new(model: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            description: description.into(),
            total_earned: TokenAmount::ZERO,
            tip_count: 0,
        }
    }
}

impl User {
    pub fn new(username: String, display_name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            username,
            display_name,
            bio: String::new(),
            avatar_url: None,
            wallet_address: None,
            balance: TokenAmount::ZERO,
            total_tips_received: TokenAmount::ZERO,
            total_tips_given: TokenAmount::ZERO,
            tips_received_count: 0,
            tips_given_count: 0,
            reputation: 0,
            agent: None,
            created_at,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.agent.is_some()
    }

    /// Name to show in messages: display name, falling back to the username.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    /// Sender side of a tip. Fails without touching anything if the
    /// balance cannot cover the amount.
    pub fn debit_tip(&mut self, amount: TokenAmount) -> Result<(), InsufficientBalance> {
        let remaining = self.balance.checked_sub(amount).ok_or(InsufficientBalance {
            available: self.balance,
            requested: amount,
        })?;
        self.balance = remaining;
        self.total_tips_given = self.total_tips_given.saturating_add(amount);
        self.tips_given_count += 1;
        Ok(())
    }

    /// Receiver side of a tip.
    pub fn credit_tip(&mut self, amount: TokenAmount) {
        self.balance = self.balance.saturating_add(amount);
        self.total_tips_received = self.total_tips_received.saturating_add(amount);
        self.tips_received_count += 1;
        self.reputation += 1;
        if let Some(agent) = self.agent.as_mut() {
            agent.total_earned = agent.total_earned.saturating_add(amount);
            agent.tip_count += 1;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsufficientBalance {
    pub available: TokenAmount,
    pub requested: TokenAmount,
}

/// Profile fields that failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileError {
    InvalidUsername,
    InvalidWalletAddress,
    TooLong { field: String, max: usize },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername => write!(
                f,
                "username must be {USERNAME_MIN}-{USERNAME_MAX} characters of letters, digits or underscores"
            ),
            Self::InvalidWalletAddress => {
                write!(f, "wallet address must be 0x followed by 40 hex digits")
            }
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Trim and validate a username. Case is preserved; uniqueness is checked
/// case-insensitively by the caller.
pub fn normalize_username(raw: &str) -> Result<String, ProfileError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len)
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ProfileError::InvalidUsername);
    }
    Ok(name.to_string())
}

/// Trim an optional free-text field and enforce its length cap.
pub fn bounded_text(field: &str, raw: Option<&str>, max: usize) -> Result<String, ProfileError> {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.chars().count() > max {
        return Err(ProfileError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(text.to_string())
}
