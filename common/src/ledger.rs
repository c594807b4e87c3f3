use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::{PostId, TipId, UserId};

/// A balance movement. The ledger is the source of truth; every balance
/// and tip counter elsewhere is a cache that [`Ledger::replay`] can rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerEvent {
    /// Starting allocation minted for a new account.
    #[serde(rename_all = "camelCase")]
    Grant { to: UserId, amount: TokenAmount },
    #[serde(rename_all = "camelCase")]
    Tip {
        tip: TipId,
        from: UserId,
        to: UserId,
        amount: TokenAmount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post: Option<PostId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// Append-only log of balance movements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

/// Per-account figures derived from the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountTotals {
    pub balance: TokenAmount,
    pub received: TokenAmount,
    pub given: TokenAmount,
    pub received_count: u64,
    pub given_count: u64,
}

/// Per-post figures derived from the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostTotals {
    pub tip_count: u64,
    pub total: TokenAmount,
}

/// Result of replaying the whole ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replay {
    pub accounts: BTreeMap<UserId, AccountTotals>,
    pub posts: BTreeMap<PostId, PostTotals>,
}

impl Replay {
    pub fn account(&self, id: &UserId) -> AccountTotals {
        self.accounts.get(id).copied().unwrap_or_default()
    }

    pub fn post(&self, id: &PostId) -> PostTotals {
        self.posts.get(id).copied().unwrap_or_default()
    }

    /// Sum of all balances.
    pub fn circulating_supply(&self) -> TokenAmount {
        self.accounts.values().map(|a| a.balance).sum()
    }
}

impl Ledger {
    /// Append an event and return its sequence number.
    pub fn append(&mut self, event: LedgerEvent, at: DateTime<Utc>) -> u64 {
        let seq = self.entries.last().map(|e| e.seq + 1).unwrap_or(0);
        self.entries.push(LedgerEntry { seq, at, event });
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total ever granted; equals circulating supply since tips only move tokens.
    pub fn total_granted(&self) -> TokenAmount {
        self.entries
            .iter()
            .filter_map(|e| match &e.event {
                LedgerEvent::Grant { amount, .. } => Some(*amount),
                LedgerEvent::Tip { .. } => None,
            })
            .sum()
    }

    /// Rebuild every account and post counter from scratch.
    pub fn replay(&self) -> Replay {
        let mut replay = Replay::default();
        for entry in &self.entries {
            match &entry.event {
                LedgerEvent::Grant { to, amount } => {
                    let account = replay.accounts.entry(to.clone()).or_default();
                    account.balance = account.balance.saturating_add(*amount);
                }
                LedgerEvent::Tip {
                    from,
                    to,
                    amount,
                    post,
                    ..
                } => {
                    let sender = replay.accounts.entry(from.clone()).or_default();
                    sender.balance = sender.balance.saturating_sub(*amount);
                    sender.given = sender.given.saturating_add(*amount);
                    sender.given_count += 1;

                    let receiver = replay.accounts.entry(to.clone()).or_default();
                    receiver.balance = receiver.balance.saturating_add(*amount);
                    receiver.received = receiver.received.saturating_add(*amount);
                    receiver.received_count += 1;

                    if let Some(post) = post {
                        let totals = replay.posts.entry(post.clone()).or_default();
                        totals.tip_count += 1;
                        totals.total = totals.total.saturating_add(*amount);
                    }
                }
            }
        }
        replay
    }
}
