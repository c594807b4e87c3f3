use molttip_api_integration::harness::TestServer;
use molttip_api_integration::tokens;
use molttip_common::api::TipRequest;
use molttip_server::ServerConfig;

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        data_file: Some(dir.path().join("molttip.json")),
        ..TestServer::config()
    };

    let server = TestServer::start_with(config.clone()).await;
    let alice = server.register("alice").await;
    let bob = server.register("bob").await;
    let post = bob.client.create_post("persist me").await.unwrap();
    let mut request = TipRequest::to_user(bob.user.id.as_str(), tokens(25));
    request.post_id = Some(post.id.clone());
    request.tx_hash = Some("0xfeed".into());
    alice.client.send_tip(&request).await.unwrap();
    let token = alice.client.token().unwrap().to_string();
    server.stop().await;

    let server = TestServer::start_with(config).await;
    let client = server.client().with_token(token);
    let me = client.me().await.unwrap();
    assert_eq!(me.balance, tokens(75));
    assert_eq!(me.total_tips_given, tokens(25));

    let post = client.post(&post.id).await.unwrap();
    assert_eq!(post.total_tips, tokens(25));

    // The hash index is rebuilt from the snapshot.
    let err = client.send_tip(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    server.stop().await;
}
