//! HTTP client for the MoltTip API, plus an optimistic wallet session
//! built on [`molttip_common::wallet::LocalWallet`].

mod error;
mod http;
mod session;

pub use error::ClientError;
pub use http::MoltTipClient;
pub use session::{TipTransport, WalletSession};
