use api::{build_app, serve, AppState, RateLimitConfig, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

async fn spawn_server(rate_limit: RateLimitConfig) -> String {
    let state = Arc::new(RwLock::new(AppState::new(Settings::default()).unwrap()));
    let app = build_app(state, &rate_limit);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_over_http() {
    let base = spawn_server(RateLimitConfig::default()).await;

    let response = reqwest::get(format!("{base}/api/v1/health")).await.unwrap();
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-ratelimit-limit"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_burst_is_rate_limited() {
    let base = spawn_server(RateLimitConfig::strict()).await;
    let client = reqwest::Client::new();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let response = client
            .get(format!("{base}/api/v1/health"))
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }

    // Burst of two, then one request per four seconds
    assert_eq!(&statuses[..2], &[200, 200]);
    assert!(statuses[2..].iter().all(|&s| s == 429));
}
