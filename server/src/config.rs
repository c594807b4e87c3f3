//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use molttip_common::amount::TokenAmount;

/// Seven days, the lifetime of an issued token.
pub const DEFAULT_JWT_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Parser, Debug, Clone)]
#[command(name = "molttip", about = "MoltTip tipping economy API server")]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "MOLTTIP_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// HMAC secret for signing tokens (at least 32 characters).
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds.
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value_t = DEFAULT_JWT_EXPIRY_SECS)]
    pub jwt_expiry_seconds: u64,

    /// Origin allowed by CORS (e.g. "http://localhost:3000"). Any origin when unset.
    #[arg(long, env = "FRONTEND_ORIGIN")]
    pub frontend_origin: Option<String>,

    /// Requests allowed per client IP per minute on /api.
    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value_t = 100)]
    pub rate_limit_per_minute: u32,

    /// Tokens granted to every new account.
    #[arg(long, env = "STARTING_BALANCE", default_value = "1000", value_parser = parse_tokens)]
    pub starting_balance: TokenAmount,

    /// JSON snapshot file. State is in-memory only when unset.
    #[arg(long, env = "DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Seconds between snapshot flushes.
    #[arg(long, env = "SNAPSHOT_INTERVAL_SECS", default_value_t = 30)]
    pub snapshot_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Development mode: use a built-in token secret.
    #[arg(long, env = "DEV_MODE", default_value_t = false)]
    pub dev_mode: bool,
}

fn parse_tokens(raw: &str) -> Result<TokenAmount, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    TokenAmount::from_tokens(value).map_err(|e| e.to_string())
}

/// Runtime settings, independent of how they were supplied.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: Option<String>,
    pub jwt_expiry_seconds: u64,
    pub frontend_origin: Option<String>,
    pub rate_limit_per_minute: u32,
    pub rate_limit_window: Duration,
    pub starting_balance: TokenAmount,
    pub data_file: Option<PathBuf>,
    pub snapshot_interval: Duration,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiry_seconds: DEFAULT_JWT_EXPIRY_SECS,
            frontend_origin: None,
            rate_limit_per_minute: 100,
            rate_limit_window: Duration::from_secs(60),
            starting_balance: TokenAmount::from_whole(1000),
            data_file: None,
            snapshot_interval: Duration::from_secs(30),
            dev_mode: true,
        }
    }
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        Self {
            jwt_secret: args.jwt_secret.clone(),
            jwt_expiry_seconds: args.jwt_expiry_seconds,
            frontend_origin: args.frontend_origin.clone(),
            rate_limit_per_minute: args.rate_limit_per_minute,
            rate_limit_window: Duration::from_secs(60),
            starting_balance: args.starting_balance,
            data_file: args.data_file.clone(),
            snapshot_interval: Duration::from_secs(args.snapshot_interval_secs.max(1)),
            dev_mode: args.dev_mode,
        }
    }
}
