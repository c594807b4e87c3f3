//! In-process MoltTip server for end-to-end tests.

pub mod harness;

use molttip_common::amount::TokenAmount;

/// Whole tokens, for terse assertions.
pub fn tokens(whole: u64) -> TokenAmount {
    TokenAmount::from_whole(whole)
}

/// Route server logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
