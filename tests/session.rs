use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use household_api_client::{ApiClient, Config, Error};
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(Config::from_values(format!("{}/api/v1", server.uri()))).expect("client")
}

#[tokio::test]
async fn login_posts_form_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(header_exists("x-requested-with"))
        .and(body_string("username=mom%40home.test&password=hunter2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; HttpOnly; Path=/")
                .set_body_json(serde_json::json!({
                    "data": {"access_token": "T1", "refresh_token": "r1", "token_type": "bearer"},
                    "message": "ok",
                    "success": true
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"access_token": "T2"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": "u1"}})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let token = client
        .login("mom@home.test", "hunter2")
        .await
        .expect("login");
    assert_eq!(token, "T1");
    assert_eq!(client.access_token().as_deref(), Some("T1"));

    // The refresh cookie from login rides along on the refresh call.
    let me: serde_json::Value = client.get_data("/users/me").await.expect("me");
    assert_eq!(me["id"], "u1");
    assert_eq!(client.access_token().as_deref(), Some("T2"));
}

#[tokio::test]
async fn bad_credentials_do_not_trigger_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"detail": "Incorrect email or password"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    match client(&server).login("a@b.c", "nope").await {
        Err(Error::Auth { message, .. }) => assert_eq!(message, "Incorrect email or password"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn check_session_without_token_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/session-check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!client(&server).check_session().await);
}

#[tokio::test]
async fn check_session_reports_server_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/session-check"))
        .and(header("Authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/session-check"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    client.set_access_token(Some("good".into()));
    assert!(client.check_session().await);
    client.set_access_token(Some("stale".into()));
    assert!(!client.check_session().await);
}

#[tokio::test]
async fn logout_clears_token_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.set_access_token(Some("T1".into()));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    client.register_logout_handler(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    client.logout().await;
    assert!(client.access_token().is_none());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
