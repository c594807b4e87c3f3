use chrono::Utc;
use molttip_common::identity::{PostId, TipId, UserId};
use molttip_common::ledger::LedgerEvent;
use molttip_common::notification::Notification;
use molttip_common::tip::{Recipient, Tip, TipDraft, TipRejection, TipStatus, TxHash};
use tracing::info;

use super::Economy;
use crate::error::ApiError;
use crate::verifier::{PendingTransfer, TxVerifier};

impl Economy {
    /// Validate and apply a tip from `sender`.
    ///
    /// Checks run in a fixed order and the first failure wins: recipient,
    /// self-tip, post and comment, transaction hash, balance, verification.
    /// Nothing is written until all of them pass.
    pub fn submit_tip(
        &mut self,
        sender: &UserId,
        draft: TipDraft,
        verifier: &dyn TxVerifier,
    ) -> Result<Tip, ApiError> {
        let recipient = self.resolve_recipient(&draft.recipient)?;
        let sender_user = self
            .users
            .get(sender)
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))?;
        if recipient == *sender {
            return Err(TipRejection::SelfTip.into());
        }
        if let Some(post_id) = &draft.post_id {
            if !self.posts.contains_key(post_id) {
                return Err(TipRejection::UnknownPost.into());
            }
        }
        if let Some(comment_id) = &draft.comment_id {
            let comment = self
                .comments
                .get(comment_id)
                .ok_or(TipRejection::UnknownComment)?;
            if draft.post_id.as_ref().is_some_and(|p| *p != comment.post_id) {
                return Err(TipRejection::UnknownComment.into());
            }
        }

        let now = Utc::now();
        let (tx_hash, server_issued) = match draft.tx_hash {
            Some(hash) => (hash, false),
            None => (TxHash::issue(sender, now), true),
        };
        if self.tx_hashes.contains_key(&tx_hash) {
            return Err(TipRejection::DuplicateTxHash.into());
        }
        if sender_user.balance < draft.amount {
            return Err(TipRejection::InsufficientBalance {
                available: sender_user.balance,
                requested: draft.amount,
            }
            .into());
        }
        let transfer = PendingTransfer {
            tx_hash: &tx_hash,
            from: sender,
            to: &recipient,
            amount: draft.amount,
            server_issued,
        };
        if !verifier.verify(&transfer) {
            return Err(TipRejection::Unverified.into());
        }
        let sender_label = sender_user.label().to_string();

        // Apply. The debit is the only fallible step and runs first.
        let amount = draft.amount;
        if let Some(from) = self.users.get_mut(sender) {
            from.debit_tip(amount).map_err(TipRejection::from)?;
        }
        if let Some(to) = self.users.get_mut(&recipient) {
            to.credit_tip(amount);
        }
        if let Some(post) = draft.post_id.as_ref().and_then(|id| self.posts.get_mut(id)) {
            post.record_tip(amount);
        }

        let tip = Tip {
            id: TipId::generate(),
            from: sender.clone(),
            to: recipient.clone(),
            amount,
            post_id: draft.post_id,
            comment_id: draft.comment_id,
            tx_hash,
            status: TipStatus::Confirmed,
            created_at: now,
        };
        self.ledger.append(
            LedgerEvent::Tip {
                tip: tip.id.clone(),
                from: tip.from.clone(),
                to: tip.to.clone(),
                amount,
                post: tip.post_id.clone(),
            },
            now,
        );
        self.tx_hashes.insert(tip.tx_hash.clone(), tip.id.clone());
        self.notify(Notification::tip(
            recipient,
            sender.clone(),
            &sender_label,
            amount,
            &tip.id,
            now,
        ));
        self.tips.push(tip.clone());

        info!(
            tip = %tip.id,
            from = %tip.from,
            to = %tip.to,
            amount = %tip.amount,
            server_issued,
            "tip recorded"
        );
        Ok(tip)
    }

    fn resolve_recipient(&self, recipient: &Recipient) -> Result<UserId, TipRejection> {
        match recipient {
            Recipient::Id(id) if self.users.contains_key(id) => Ok(id.clone()),
            Recipient::Id(_) => Err(TipRejection::UnknownRecipient),
            Recipient::Address(address) => self
                .user_by_wallet(address)
                .map(|user| user.id.clone())
                .ok_or(TipRejection::UnknownRecipient),
        }
    }

    /// Tips sent by `user`, newest first.
    pub fn tips_sent(&self, user: &UserId) -> Vec<Tip> {
        self.tips_newest_first(|tip| tip.from == *user)
    }

    /// Tips received by `user`, newest first.
    pub fn tips_received(&self, user: &UserId) -> Vec<Tip> {
        self.tips_newest_first(|tip| tip.to == *user)
    }

    /// Tips attached to a post, newest first. Tips outlive a deleted post.
    pub fn tips_for_post(&self, post: &PostId) -> Vec<Tip> {
        self.tips_newest_first(|tip| tip.post_id.as_ref() == Some(post))
    }

    fn tips_newest_first(&self, keep: impl Fn(&Tip) -> bool) -> Vec<Tip> {
        self.tips.iter().rev().filter(|t| keep(t)).cloned().collect()
    }
}
