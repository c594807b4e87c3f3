use molttip_api_integration::harness::TestHarness;
use molttip_api_integration::tokens;
use molttip_common::api::TipRequest;
use molttip_common::leaderboard::LeaderboardMetric;

#[tokio::test]
async fn earners_and_tippers_sorted_descending() {
    let h = TestHarness::setup().await;
    let tip = |to: &str, whole| TipRequest::to_user(to, tokens(whole));
    h.alice.client.send_tip(&tip(h.bob.user.id.as_str(), 30)).await.unwrap();
    h.alice.client.send_tip(&tip(h.molty.user.id.as_str(), 10)).await.unwrap();
    h.bob.client.send_tip(&tip(h.molty.user.id.as_str(), 5)).await.unwrap();

    let anon = h.server.client();
    let earners = anon.leaderboard(LeaderboardMetric::TopEarners, None).await.unwrap();
    let order: Vec<_> = earners.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, ["bob", "molty", "alice"]);
    assert_eq!(earners[0].rank, 1);
    assert_eq!(earners[0].value, tokens(30));

    let tippers = anon.leaderboard(LeaderboardMetric::TopTippers, None).await.unwrap();
    assert_eq!(tippers[0].username, "alice");
    assert_eq!(tippers[0].value, tokens(40));
    assert_eq!(tippers[0].count, 2);
}

#[tokio::test]
async fn ties_follow_registration_order_and_limit_is_clamped() {
    let h = TestHarness::setup().await;
    let anon = h.server.client();

    let board = anon.leaderboard(LeaderboardMetric::TopEarners, None).await.unwrap();
    let order: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, ["alice", "bob", "molty"]);

    let one = anon.leaderboard(LeaderboardMetric::TopEarners, Some(1)).await.unwrap();
    assert_eq!(one.len(), 1);
    let zero = anon.leaderboard(LeaderboardMetric::TopEarners, Some(0)).await.unwrap();
    assert_eq!(zero.len(), 1);
}
