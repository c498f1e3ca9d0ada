use std::time::Duration;

use household_api_client::{ApiClient, Config};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_refresh_across_worker_threads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"access_token": "T2"}}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(Config::from_values(format!("{}/api/v1", server.uri())))
        .expect("client");
    client.set_access_token(Some("T1".into()));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get_data::<Vec<String>>("/tasks").await })
        })
        .collect();
    for handle in handles {
        let tasks = handle.await.expect("join").expect("request recovers");
        assert!(tasks.is_empty());
    }

    assert_eq!(client.access_token().as_deref(), Some("T2"));
    assert_eq!(client.pending_requests(), 0);
}
