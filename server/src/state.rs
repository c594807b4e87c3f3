//! Shared server state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::JwtIssuer;
use crate::config::ServerConfig;
use crate::economy::Economy;
use crate::error::ApiError;
use crate::rate_limit::RateLimiter;
use crate::snapshot;
use crate::verifier::{AcceptAll, TxVerifier};

pub struct AppState {
    pub economy: RwLock<Economy>,
    pub jwt: JwtIssuer,
    pub verifier: Arc<dyn TxVerifier>,
    pub limiter: RateLimiter,
    pub config: ServerConfig,
    /// Set whenever the economy may have changed since the last flush.
    dirty: AtomicBool,
    started_at: Instant,
}

impl AppState {
    /// Build state from config, loading and reconciling the snapshot if one
    /// is configured.
    pub fn from_config(config: ServerConfig) -> Result<Self, ApiError> {
        let jwt = match (&config.jwt_secret, config.dev_mode) {
            (Some(secret), _) => JwtIssuer::new(secret.clone(), config.jwt_expiry_seconds)?,
            (None, true) => {
                warn!("no JWT_SECRET set, using the development secret");
                JwtIssuer::new_dev(config.jwt_expiry_seconds)
            }
            (None, false) => {
                return Err(ApiError::Config(
                    "JWT_SECRET is required unless DEV_MODE is set".into(),
                ))
            }
        };

        let loaded = match &config.data_file {
            Some(path) => snapshot::load(path)?,
            None => None,
        };
        let economy = match loaded {
            Some(economy) => {
                let (economy, report) = economy.restore(config.starting_balance);
                if report.is_clean() {
                    info!("snapshot consistent with ledger");
                } else {
                    warn!(
                        accounts = report.accounts_repaired,
                        posts = report.posts_repaired,
                        "repaired counters from ledger"
                    );
                }
                economy
            }
            None => Economy::new(config.starting_balance),
        };

        Ok(Self {
            economy: RwLock::new(economy),
            jwt,
            verifier: Arc::new(AcceptAll),
            limiter: RateLimiter::new(config.rate_limit_window, config.rate_limit_per_minute),
            config,
            dirty: AtomicBool::new(false),
            started_at: Instant::now(),
        })
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn TxVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Run `change` under the write lock. Only a successful change marks
    /// state for the next flush.
    pub async fn update<T>(
        &self,
        change: impl FnOnce(&mut Economy) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut economy = self.economy.write().await;
        let outcome = change(&mut economy);
        if outcome.is_ok() {
            self.dirty.store(true, Ordering::Release);
        }
        outcome
    }

    /// Save the snapshot if anything changed. Returns whether a file was
    /// written.
    pub async fn flush_snapshot(&self) -> Result<bool, ApiError> {
        let Some(path) = &self.config.data_file else {
            return Ok(false);
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        let data = snapshot::encode(&*self.economy.read().await)?;
        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || snapshot::write_atomic(&target, &data))
            .await
            .map_err(|e| ApiError::Internal(format!("Snapshot task failed: {e}")))
            .and_then(|result| result);
        if let Err(e) = written {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        Ok(true)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
