use molttip_api_integration::harness::TestHarness;
use molttip_api_integration::tokens;
use molttip_client::{ClientError, WalletSession};
use molttip_common::api::TipRequest;
use molttip_common::leaderboard::LeaderboardMetric;
use molttip_common::notification::NotificationKind;
use molttip_common::tip::TipStatus;
use serde_json::json;

fn tip_with_hash(to: &str, whole: u64, hash: &str) -> TipRequest {
    let mut request = TipRequest::to_user(to, tokens(whole));
    request.tx_hash = Some(hash.into());
    request
}

fn api_error(err: ClientError) -> (u16, String) {
    match err {
        ClientError::Api { status, message } => (status, message),
        other => panic!("expected API error, got {other}"),
    }
}

/// Alice tips Bob 10 with a hash; replaying the hash is refused and
/// changes nothing.
#[tokio::test]
async fn tip_then_replayed_hash() {
    let h = TestHarness::setup().await;
    let before = h.bob.client.me().await.unwrap();

    let request = tip_with_hash(h.bob.user.id.as_str(), 10, "0xabc");
    let tip = h.alice.client.send_tip(&request).await.unwrap();
    assert_eq!(tip.amount, tokens(10));
    assert_eq!(tip.status, TipStatus::Confirmed);
    assert_eq!(tip.tx_hash.as_str(), "0xabc");

    let after = h.bob.client.me().await.unwrap();
    assert_eq!(after.total_tips_received, before.total_tips_received.saturating_add(tokens(10)));
    let inbox = h.bob.client.notifications().await.unwrap();
    assert!(inbox
        .items
        .iter()
        .any(|n| n.kind == NotificationKind::Tip && n.reference.as_deref() == Some(tip.id.as_str())));

    let stats_before = h.server.client().stats().await.unwrap();
    let (status, message) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
    assert_eq!(status, 400);
    assert!(message.contains("already used"), "{message}");

    assert_eq!(h.server.client().stats().await.unwrap(), stats_before);
    assert_eq!(h.bob.client.me().await.unwrap().balance, after.balance);
    assert_eq!(h.alice.client.me().await.unwrap().balance, tokens(90));
}

#[tokio::test]
async fn self_tip_is_rejected() {
    let h = TestHarness::setup().await;
    let request = TipRequest::to_user(h.alice.user.id.as_str(), tokens(1));
    let (status, message) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
    assert_eq!(status, 400);
    assert_eq!(message, "Cannot tip yourself");
}

#[tokio::test]
async fn bad_amounts_write_nothing() {
    let h = TestHarness::setup().await;
    for amount in [json!(0), json!(-5), json!("ten"), json!(null), json!(0.0000001)] {
        let request = TipRequest {
            to_user_id: Some(h.bob.user.id.to_string()),
            amount: amount.clone(),
            ..TipRequest::default()
        };
        let (status, _) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
        assert_eq!(status, 400, "amount {amount}");
    }
    assert_eq!(h.server.client().stats().await.unwrap().tips, 0);
    assert_eq!(h.alice.client.me().await.unwrap().balance, tokens(100));
    assert_eq!(h.bob.client.me().await.unwrap().balance, tokens(100));
}

#[tokio::test]
async fn unknown_recipient_and_post_are_404() {
    let h = TestHarness::setup().await;
    let request = TipRequest::to_user("no-such-user", tokens(1));
    let (status, _) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
    assert_eq!(status, 404);

    let mut request = TipRequest::to_user(h.bob.user.id.as_str(), tokens(1));
    request.post_id = Some("no-such-post".into());
    let (status, message) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
    assert_eq!(status, 404);
    assert_eq!(message, "Post not found");
}

#[tokio::test]
async fn overspend_is_rejected() {
    let h = TestHarness::setup().await;
    let request = TipRequest::to_user(h.bob.user.id.as_str(), tokens(101));
    let (status, message) = api_error(h.alice.client.send_tip(&request).await.unwrap_err());
    assert_eq!(status, 400);
    assert!(message.starts_with("Insufficient balance"), "{message}");
}

#[tokio::test]
async fn tip_on_post_updates_post_and_agent() {
    let h = TestHarness::setup().await;
    let post = h.molty.client.create_post("gm from the reef").await.unwrap();

    let mut request = TipRequest::to_user(h.molty.user.id.as_str(), tokens(7));
    request.post_id = Some(post.id.clone());
    h.alice.client.send_tip(&request).await.unwrap();
    h.bob.client.send_tip(&request).await.unwrap();

    let post = h.server.client().post(&post.id).await.unwrap();
    assert_eq!(post.tip_count, 2);
    assert_eq!(post.total_tips, tokens(14));
    assert_eq!(h.server.client().tips_for_post(&post.id).await.unwrap().len(), 2);

    let molty = h.molty.client.me().await.unwrap();
    let agent = molty.agent.expect("agent profile");
    assert_eq!(agent.total_earned, tokens(14));
    assert_eq!(agent.tip_count, 2);
    assert_eq!(molty.reputation, 2);

    let board = h
        .server
        .client()
        .leaderboard(LeaderboardMetric::Agents, None)
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].value, tokens(14));
}

#[tokio::test]
async fn history_endpoints() {
    let h = TestHarness::setup().await;
    let to_bob = TipRequest::to_user(h.bob.user.id.as_str(), tokens(3));
    let to_alice = TipRequest::to_user(h.alice.user.id.as_str(), tokens(4));
    h.alice.client.send_tip(&to_bob).await.unwrap();
    h.bob.client.send_tip(&to_alice).await.unwrap();

    let sent = h.alice.client.tips_sent().await.unwrap();
    let received = h.alice.client.tips_received().await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, h.bob.user.id);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].amount, tokens(4));
}

/// Concurrent tips never spend more than the balance.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tips_respect_balance() {
    let h = TestHarness::setup().await;
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let client = h.alice.client.clone();
        let request = TipRequest::to_user(h.bob.user.id.as_str(), tokens(10));
        tasks.push(tokio::spawn(async move { client.send_tip(&request).await }));
    }
    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 10);
    assert_eq!(h.alice.client.me().await.unwrap().balance, tokens(0));
    assert_eq!(h.bob.client.me().await.unwrap().balance, tokens(200));
    assert!(h.server.state.economy.write().await.reconcile().is_clean());
}

#[tokio::test]
async fn wallet_session_against_server() {
    let h = TestHarness::setup().await;
    let mut session = WalletSession::open(h.alice.client.clone()).await.unwrap();
    assert_eq!(session.wallet().balance(), tokens(100));

    session.tip(&h.bob.user.id, tokens(30), None).await.unwrap();
    assert_eq!(session.wallet().balance(), tokens(70));

    // Drain the server-side balance behind the session's back.
    let request = TipRequest::to_user(h.bob.user.id.as_str(), tokens(60));
    h.alice.client.send_tip(&request).await.unwrap();

    let err = session.tip(&h.bob.user.id, tokens(50), None).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(session.wallet().transactions()[1].status, TipStatus::Failed);
    assert_eq!(session.refresh().await.unwrap(), tokens(10));
}
