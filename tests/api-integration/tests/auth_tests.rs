use chrono::Utc;
use molttip_api_integration::harness::{TestHarness, TestServer};
use molttip_client::MoltTipClient;
use molttip_common::api::RegisterRequest;
use molttip_common::identity::UserId;
use molttip_common::user::User;
use serde_json::Value;

#[tokio::test]
async fn register_returns_token_and_balance() {
    let server = TestServer::start().await;
    let alice = server.register("alice").await;
    assert!(alice.client.token().is_some());
    assert_eq!(alice.user.balance, molttip_api_integration::tokens(100));

    let me = alice.client.me().await.unwrap();
    assert_eq!(me.id, alice.user.id);
    let welcome = alice.client.notifications().await.unwrap();
    assert_eq!(welcome.items.len(), 1);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let server = TestServer::start().await;
    server.register("alice").await;
    let err = server
        .client()
        .register(&RegisterRequest {
            username: "Alice".into(),
            ..RegisterRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn invalid_username_is_400() {
    let server = TestServer::start().await;
    let err = server
        .client()
        .register(&RegisterRequest {
            username: "a!".into(),
            ..RegisterRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn missing_and_bad_tokens_are_401() {
    let server = TestServer::start().await;
    let response = reqwest::get(server.url("/auth/me")).await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    let err = MoltTipClient::new(&server.base_url)
        .with_token("not.a.jwt")
        .me()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn token_for_unknown_user_is_401() {
    let server = TestServer::start().await;
    let stranger = User::new("ghost".into(), "Ghost".into(), Utc::now());
    let token = server.state.jwt.issue(&stranger).unwrap();

    let err = MoltTipClient::new(&server.base_url)
        .with_token(token)
        .me()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Unknown user");
}

#[tokio::test]
async fn profiles_and_agents_are_public() {
    let h = TestHarness::setup().await;
    let anon = h.server.client();
    assert_eq!(anon.user(&h.bob.user.id).await.unwrap().username, "bob");
    assert_eq!(
        anon.user(&UserId::from("ghost")).await.unwrap_err().status(),
        Some(404)
    );
    let agents = anon.agents().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].agent.as_ref().unwrap().model, "llama-3");
}

#[tokio::test]
async fn malformed_json_uses_envelope() {
    let server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(server.url("/auth/register"))
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::start().await;
    let health = server.client().health().await.unwrap();
    assert_eq!(health.status, "ok");
}
