use molttip_api_integration::harness::TestHarness;
use molttip_api_integration::tokens;
use molttip_common::api::TipRequest;
use molttip_common::notification::NotificationKind;

#[tokio::test]
async fn feed_lists_newest_first() {
    let h = TestHarness::setup().await;
    let first = h.alice.client.create_post("first").await.unwrap();
    let second = h.bob.client.create_post("second").await.unwrap();

    let page = h.server.client().feed(1, 20).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, second.id);
    assert_eq!(page.items[1].id, first.id);

    let page = h.server.client().feed(2, 1).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, first.id);
}

#[tokio::test]
async fn posting_requires_auth_and_content() {
    let h = TestHarness::setup().await;
    let err = h.server.client().create_post("anon").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    let err = h.alice.client.create_post("   ").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn likes_and_comments_notify_the_author() {
    let h = TestHarness::setup().await;
    let post = h.alice.client.create_post("hello").await.unwrap();

    h.bob.client.like_post(&post.id).await.unwrap();
    let liked = h.bob.client.like_post(&post.id).await.unwrap();
    assert_eq!(liked.likes, 1);

    h.bob.client.add_comment(&post.id, "nice").await.unwrap();
    h.alice.client.add_comment(&post.id, "thanks").await.unwrap();
    let comments = h.server.client().comments(&post.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author, h.bob.user.id);

    let inbox = h.alice.client.notifications().await.unwrap();
    let kinds: Vec<NotificationKind> = inbox.items.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Comment,
            NotificationKind::Like,
            NotificationKind::Welcome
        ]
    );
    assert_eq!(h.alice.client.me().await.unwrap().reputation, 1);
}

#[tokio::test]
async fn delete_is_author_only_and_cascades() {
    let h = TestHarness::setup().await;
    let post = h.alice.client.create_post("short-lived").await.unwrap();
    h.bob.client.add_comment(&post.id, "hi").await.unwrap();

    let err = h.bob.client.delete_post(&post.id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    h.alice.client.delete_post(&post.id).await.unwrap();
    let err = h.server.client().post(&post.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = h.server.client().comments(&post.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(h.server.client().stats().await.unwrap().comments, 0);
}

#[tokio::test]
async fn tips_outlive_a_deleted_post() {
    let h = TestHarness::setup().await;
    let post = h.alice.client.create_post("tip jar").await.unwrap();
    let mut request = TipRequest::to_user(h.alice.user.id.as_str(), tokens(7));
    request.post_id = Some(post.id.clone());
    let tip = h.bob.client.send_tip(&request).await.unwrap();

    h.alice.client.delete_post(&post.id).await.unwrap();

    let tips = h.server.client().tips_for_post(&post.id).await.unwrap();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].id, tip.id);
    assert_eq!(h.alice.client.me().await.unwrap().balance, tokens(107));
    assert!(h.server.state.economy.write().await.reconcile().is_clean());
}

#[tokio::test]
async fn notifications_mark_read() {
    let h = TestHarness::setup().await;
    let post = h.alice.client.create_post("hello").await.unwrap();
    h.bob.client.like_post(&post.id).await.unwrap();

    let inbox = h.alice.client.notifications().await.unwrap();
    assert_eq!(inbox.unread_count, 2);
    let newest = inbox.items[0].id.clone();

    let err = h.bob.client.mark_read(&newest).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    assert!(h.alice.client.mark_read(&newest).await.unwrap().is_read);
    assert_eq!(h.alice.client.notifications().await.unwrap().unread_count, 1);
    assert_eq!(h.alice.client.mark_all_read().await.unwrap().updated, 1);
    assert_eq!(h.alice.client.notifications().await.unwrap().unread_count, 0);
}

/// PUT is accepted on the single-read route as well as PATCH.
#[tokio::test]
async fn mark_read_accepts_put() {
    let h = TestHarness::setup().await;
    let inbox = h.alice.client.notifications().await.unwrap();
    let id = inbox.items[0].id.clone();
    let response = reqwest::Client::new()
        .put(h.server.url(&format!("/notifications/{id}/read")))
        .bearer_auth(h.alice.client.token().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(h.alice.client.notifications().await.unwrap().unread_count, 0);
}
