//! Transaction-hash verification.
//!
//! There is no chain integration: the default verifier accepts every hash,
//! so tips are recorded as confirmed straight away. A real verifier plugs in
//! through [`TxVerifier`].

use molttip_common::amount::TokenAmount;
use molttip_common::identity::UserId;
use molttip_common::tip::TxHash;

/// What a verifier gets to look at.
pub struct PendingTransfer<'a> {
    pub tx_hash: &'a TxHash,
    pub from: &'a UserId,
    pub to: &'a UserId,
    pub amount: TokenAmount,
    /// True when the hash was issued by this server rather than the client.
    pub server_issued: bool,
}

pub trait TxVerifier: Send + Sync {
    fn verify(&self, transfer: &PendingTransfer<'_>) -> bool;
}

/// Accepts everything.
pub struct AcceptAll;

impl TxVerifier for AcceptAll {
    fn verify(&self, _transfer: &PendingTransfer<'_>) -> bool {
        true
    }
}
