use molttip_common::amount::TokenAmount;
use molttip_common::api::TipRequest;
use molttip_common::identity::{PostId, UserId};
use molttip_common::tip::Tip;
use molttip_common::user::User;
use molttip_common::wallet::LocalWallet;
use tracing::{info, warn};

use crate::error::ClientError;
use crate::http::MoltTipClient;

/// The two calls a wallet session needs from the server.
#[allow(async_fn_in_trait)]
pub trait TipTransport {
    async fn send_tip(&self, request: &TipRequest) -> Result<Tip, ClientError>;

    /// The authenticated user, for the authoritative balance.
    async fn current_user(&self) -> Result<User, ClientError>;
}

impl TipTransport for MoltTipClient {
    async fn send_tip(&self, request: &TipRequest) -> Result<Tip, ClientError> {
        MoltTipClient::send_tip(self, request).await
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        self.me().await
    }
}

/// A logged-in user's wallet: tips are applied locally first and settled
/// by the server's answer.
pub struct WalletSession<T> {
    transport: T,
    wallet: LocalWallet,
}

impl<T: TipTransport> WalletSession<T> {
    /// Start a session from the server's current balance.
    pub async fn open(transport: T) -> Result<Self, ClientError> {
        let user = transport.current_user().await?;
        Ok(Self {
            transport,
            wallet: LocalWallet::new(user.balance),
        })
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a tip. It is pending locally while the request is in flight,
    /// then confirmed or rolled back.
    pub async fn tip(
        &mut self,
        to: &UserId,
        amount: TokenAmount,
        post_id: Option<PostId>,
    ) -> Result<Tip, ClientError> {
        let local_id = self.wallet.begin_tip(to.clone(), amount, post_id.clone())?;
        let mut request = TipRequest::to_user(to.as_str(), amount);
        request.post_id = post_id;

        match self.transport.send_tip(&request).await {
            Ok(tip) => {
                self.wallet.confirm(local_id, &tip)?;
                info!(local_id, tip = %tip.id, amount = %amount, "tip confirmed");
                Ok(tip)
            }
            Err(err) => {
                self.wallet.rollback(local_id, err.message())?;
                warn!(local_id, error = %err, "tip rolled back");
                Err(err)
            }
        }
    }

    /// Replace the local balance with the server's.
    pub async fn refresh(&mut self) -> Result<TokenAmount, ClientError> {
        let user = self.transport.current_user().await?;
        self.wallet.sync_balance(user.balance);
        Ok(user.balance)
    }
}
