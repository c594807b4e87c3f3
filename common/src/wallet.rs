use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::{PostId, TipId, UserId};
use crate::tip::{Tip, TipStatus, TxHash};

/// A tip as seen by the client before and after the server answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransaction {
    pub local_id: u32,
    pub to: UserId,
    pub amount: TokenAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    pub status: TipStatus,
    /// Filled in once the server confirms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<TipId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    /// Why the tip was rolled back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Errors from local wallet operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletError {
    InvalidAmount,
    InsufficientBalance {
        available: TokenAmount,
        requested: TokenAmount,
    },
    UnknownTransaction(u32),
    InvalidTransition {
        from: TipStatus,
        to: TipStatus,
    },
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount => write!(f, "amount must be greater than zero"),
            Self::InsufficientBalance {
                available,
                requested,
            } => write!(
                f,
                "insufficient balance: have {available}, need {requested}"
            ),
            Self::UnknownTransaction(id) => write!(f, "no local transaction {id}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "cannot move a {from} transaction to {to}")
            }
        }
    }
}

impl std::error::Error for WalletError {}

/// Optimistic client-side mirror of a user's balance.
///
/// A tip is recorded as pending the moment the user sends it, reducing
/// [`LocalWallet::available`] right away. When the server answers the
/// pending entry is either confirmed (the confirmed balance is debited) or
/// rolled back (nothing is debited and the entry is marked failed).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalWallet {
    balance: TokenAmount,
    transactions: Vec<LocalTransaction>,
    next_local_id: u32,
}

impl LocalWallet {
    pub fn new(balance: TokenAmount) -> Self {
        Self {
            balance,
            transactions: Vec::new(),
            next_local_id: 0,
        }
    }

    /// Balance confirmed by the server.
    pub fn balance(&self) -> TokenAmount {
        self.balance
    }

    /// Sum of tips still waiting for the server.
    pub fn pending_total(&self) -> TokenAmount {
        self.transactions
            .iter()
            .filter(|tx| !tx.status.is_terminal())
            .map(|tx| tx.amount)
            .sum()
    }

    /// What the user can still spend: confirmed balance minus pending tips.
    pub fn available(&self) -> TokenAmount {
        self.balance.saturating_sub(self.pending_total())
    }

    pub fn transactions(&self) -> &[LocalTransaction] {
        &self.transactions
    }

    pub fn transaction(&self, local_id: u32) -> Option<&LocalTransaction> {
        self.transactions.iter().find(|tx| tx.local_id == local_id)
    }

    /// Record a pending tip. Returns the local id used to settle it.
    pub fn begin_tip(
        &mut self,
        to: UserId,
        amount: TokenAmount,
        post_id: Option<PostId>,
    ) -> Result<u32, WalletError> {
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount);
        }
        let available = self.available();
        if amount > available {
            return Err(WalletError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let local_id = self.next_local_id;
        self.next_local_id += 1;
        self.transactions.push(LocalTransaction {
            local_id,
            to,
            amount,
            post_id,
            status: TipStatus::Pending,
            server_id: None,
            tx_hash: None,
            failure: None,
            created_at: Utc::now(),
        });
        Ok(local_id)
    }

    /// Settle a pending tip with the server's record.
    pub fn confirm(&mut self, local_id: u32, tip: &Tip) -> Result<(), WalletError> {
        let tx = self.transition(local_id, TipStatus::Confirmed)?;
        tx.server_id = Some(tip.id.clone());
        tx.tx_hash = Some(tip.tx_hash.clone());
        let amount = tx.amount;
        self.balance = self.balance.saturating_sub(amount);
        Ok(())
    }

    /// Undo a pending tip. The confirmed balance is untouched.
    pub fn rollback(&mut self, local_id: u32, reason: impl Into<String>) -> Result<(), WalletError> {
        let tx = self.transition(local_id, TipStatus::Failed)?;
        tx.failure = Some(reason.into());
        Ok(())
    }

    /// Replace the confirmed balance with the server's figure.
    pub fn sync_balance(&mut self, balance: TokenAmount) {
        self.balance = balance;
    }

    fn transition(
        &mut self,
        local_id: u32,
        next: TipStatus,
    ) -> Result<&mut LocalTransaction, WalletError> {
        let tx = self
            .transactions
            .iter_mut()
            .find(|tx| tx.local_id == local_id)
            .ok_or(WalletError::UnknownTransaction(local_id))?;
        if !tx.status.can_transition_to(next) {
            return Err(WalletError::InvalidTransition {
                from: tx.status,
                to: next,
            });
        }
        tx.status = next;
        Ok(tx)
    }
}
