use molttip_api_integration::harness::TestServer;
use molttip_server::ServerConfig;
use serde_json::Value;

#[tokio::test]
async fn requests_over_the_limit_get_429() {
    let server = TestServer::start_with(ServerConfig {
        rate_limit_per_minute: 5,
        ..TestServer::config()
    })
    .await;

    let client = reqwest::Client::new();
    for _ in 0..5 {
        let response = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(response.status(), 200);
    }
    let response = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}
