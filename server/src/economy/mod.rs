//! In-memory state of the tipping economy.
//!
//! Every mutating method takes `&mut self`, so a caller holding the write
//! lock gets the whole operation (validation and all writes) atomically.
//! Methods validate first and write last; a rejected request leaves no
//! trace.

mod social;
mod tips;

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use molttip_common::amount::TokenAmount;
use molttip_common::api::{PlatformStats, RegisterAgentRequest, RegisterRequest};
use molttip_common::comment::Comment;
use molttip_common::identity::{CommentId, PostId, TipId, UserId, WalletAddress};
use molttip_common::leaderboard::{self, LeaderboardEntry, LeaderboardMetric};
use molttip_common::ledger::{Ledger, LedgerEvent};
use molttip_common::notification::Notification;
use molttip_common::post::Post;
use molttip_common::tip::{Tip, TxHash};
use molttip_common::user::{
    bounded_text, normalize_username, AgentProfile, ProfileError, User, BIO_MAX,
    DISPLAY_NAME_MAX,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;

const AVATAR_URL_MAX: usize = 512;
const MODEL_MAX: usize = 64;
const AGENT_DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Economy {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    /// Append-only, oldest first.
    tips: Vec<Tip>,
    notifications: BTreeMap<UserId, Vec<Notification>>,
    ledger: Ledger,

    #[serde(skip)]
    usernames: HashMap<String, UserId>,
    #[serde(skip)]
    wallets: HashMap<WalletAddress, UserId>,
    #[serde(skip)]
    tx_hashes: HashMap<TxHash, TipId>,
    #[serde(skip)]
    starting_balance: TokenAmount,
}

struct AccountInput<'a> {
    username: &'a str,
    display_name: Option<&'a str>,
    bio: Option<&'a str>,
    avatar_url: Option<&'a str>,
    wallet_address: Option<&'a str>,
    agent: Option<AgentProfile>,
}

/// Counters found out of line with the ledger and repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub accounts_repaired: usize,
    pub posts_repaired: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.accounts_repaired == 0 && self.posts_repaired == 0
    }
}

impl Economy {
    pub fn new(starting_balance: TokenAmount) -> Self {
        Self {
            starting_balance,
            ..Self::default()
        }
    }

    /// Finish loading a deserialized snapshot: rebuild lookup indexes and
    /// re-derive counters from the ledger.
    pub fn restore(mut self, starting_balance: TokenAmount) -> (Self, ReconcileReport) {
        self.starting_balance = starting_balance;
        self.rebuild_indexes();
        let report = self.reconcile();
        (self, report)
    }

    fn rebuild_indexes(&mut self) {
        self.usernames = self
            .users
            .values()
            .map(|u| (u.username.to_ascii_lowercase(), u.id.clone()))
            .collect();
        self.wallets = self
            .users
            .values()
            .filter_map(|u| u.wallet_address.clone().map(|w| (w, u.id.clone())))
            .collect();
        self.tx_hashes = self
            .tips
            .iter()
            .map(|t| (t.tx_hash.clone(), t.id.clone()))
            .collect();
    }

    // ─── Accounts ────────────────────────────────────────────────────────────

    pub fn register_user(&mut self, req: &RegisterRequest) -> Result<User, ApiError> {
        self.create_account(AccountInput {
            username: &req.username,
            display_name: req.display_name.as_deref(),
            bio: req.bio.as_deref(),
            avatar_url: req.avatar_url.as_deref(),
            wallet_address: req.wallet_address.as_deref(),
            agent: None,
        })
    }

    pub fn register_agent(&mut self, req: &RegisterAgentRequest) -> Result<User, ApiError> {
        let model = bounded_text("model", Some(req.model.as_str()), MODEL_MAX)?;
        if model.is_empty() {
            return Err(ApiError::BadRequest("Model is required".into()));
        }
        let description = bounded_text(
            "description",
            req.description.as_deref(),
            AGENT_DESCRIPTION_MAX,
        )?;
        self.create_account(AccountInput {
            username: &req.username,
            display_name: req.display_name.as_deref(),
            bio: None,
            avatar_url: None,
            wallet_address: req.wallet_address.as_deref(),
            agent: Some(AgentProfile::new(model, description)),
        })
    }

    fn create_account(&mut self, input: AccountInput<'_>) -> Result<User, ApiError> {
        let username = normalize_username(input.username)?;
        let username_key = username.to_ascii_lowercase();
        if self.usernames.contains_key(&username_key) {
            return Err(ApiError::Conflict("Username already taken".into()));
        }
        let wallet = match input.wallet_address.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(WalletAddress::parse(raw).ok_or(ProfileError::InvalidWalletAddress)?),
            None => None,
        };
        if let Some(wallet) = &wallet {
            if self.wallets.contains_key(wallet) {
                return Err(ApiError::Conflict(
                    "Wallet address already registered".into(),
                ));
            }
        }
        let display_name = bounded_text("displayName", input.display_name, DISPLAY_NAME_MAX)?;
        let bio = bounded_text("bio", input.bio, BIO_MAX)?;
        let avatar_url = bounded_text("avatarUrl", input.avatar_url, AVATAR_URL_MAX)?;

        let now = Utc::now();
        let display_name = if display_name.is_empty() {
            username.clone()
        } else {
            display_name
        };
        let mut user = User::new(username, display_name, now);
        user.bio = bio;
        user.avatar_url = (!avatar_url.is_empty()).then_some(avatar_url);
        user.wallet_address = wallet.clone();
        user.agent = input.agent;

        if !self.starting_balance.is_zero() {
            self.ledger.append(
                LedgerEvent::Grant {
                    to: user.id.clone(),
                    amount: self.starting_balance,
                },
                now,
            );
            user.balance = self.starting_balance;
        }

        self.notify(Notification::welcome(user.id.clone(), user.label(), now));
        self.usernames.insert(username_key, user.id.clone());
        if let Some(wallet) = wallet {
            self.wallets.insert(wallet, user.id.clone());
        }
        self.users.insert(user.id.clone(), user.clone());
        info!(user = %user.id, username = %user.username, agent = user.is_agent(), "account created");
        Ok(user)
    }

    pub fn user(&self, id: &UserId) -> Result<&User, ApiError> {
        self.users.get(id).ok_or_else(|| ApiError::not_found("User"))
    }

    pub fn user_by_wallet(&self, wallet: &WalletAddress) -> Option<&User> {
        self.wallets.get(wallet).and_then(|id| self.users.get(id))
    }

    /// All agents, oldest first.
    pub fn agents(&self) -> Vec<User> {
        let mut agents: Vec<User> = self.users.values().filter(|u| u.is_agent()).cloned().collect();
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        agents
    }

    // ─── Aggregates ──────────────────────────────────────────────────────────

    pub fn leaderboard(&self, metric: LeaderboardMetric, limit: usize) -> Vec<LeaderboardEntry> {
        leaderboard::rank(self.users.values(), metric, limit)
    }

    pub fn stats(&self) -> PlatformStats {
        PlatformStats {
            users: self.users.len(),
            agents: self.users.values().filter(|u| u.is_agent()).count(),
            posts: self.posts.len(),
            comments: self.comments.len(),
            tips: self.tips.len(),
            tip_volume: self.tips.iter().map(|t| t.amount).sum(),
            circulating_supply: self.users.values().map(|u| u.balance).sum(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Replay the ledger and overwrite any cached counter that disagrees.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let replay = self.ledger.replay();
        let mut report = ReconcileReport::default();

        for user in self.users.values_mut() {
            let totals = replay.account(&user.id);
            let agent_drift = user.agent.as_ref().is_some_and(|a| {
                a.total_earned != totals.received || a.tip_count != totals.received_count
            });
            let drifted = user.balance != totals.balance
                || user.total_tips_received != totals.received
                || user.total_tips_given != totals.given
                || user.tips_received_count != totals.received_count
                || user.tips_given_count != totals.given_count
                || agent_drift;
            if !drifted {
                continue;
            }
            warn!(
                user = %user.id,
                cached_balance = %user.balance,
                ledger_balance = %totals.balance,
                "account counters drifted from ledger, repairing"
            );
            user.balance = totals.balance;
            user.total_tips_received = totals.received;
            user.total_tips_given = totals.given;
            user.tips_received_count = totals.received_count;
            user.tips_given_count = totals.given_count;
            if let Some(agent) = user.agent.as_mut() {
                agent.total_earned = totals.received;
                agent.tip_count = totals.received_count;
            }
            report.accounts_repaired += 1;
        }

        for post in self.posts.values_mut() {
            let totals = replay.post(&post.id);
            if post.tip_count == totals.tip_count && post.total_tips == totals.total {
                continue;
            }
            warn!(post = %post.id, "post tip counters drifted from ledger, repairing");
            post.tip_count = totals.tip_count;
            post.total_tips = totals.total;
            report.posts_repaired += 1;
        }

        let supply = replay.circulating_supply();
        let granted = self.ledger.total_granted();
        if supply != granted {
            warn!(%supply, %granted, "ledger does not conserve tokens");
        }
        report
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications
            .entry(notification.recipient.clone())
            .or_default()
            .push(notification);
    }
}
