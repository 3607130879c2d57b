//! Auth interceptor behaviour against a mock server.
//!
//! Covers token injection, path exclusion, single-flight refresh, replay,
//! and failure fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pame_client::{
    ApiRequest, AuthHooks, AuthOptions, Error, LoginRequest, PameClient, RefreshError, Result,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Hooks with a scripted refresh outcome.
struct ScriptedHooks {
    token: Mutex<Option<String>>,
    refreshed_token: Option<String>,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    unauthorized_calls: AtomicUsize,
}

impl ScriptedHooks {
    fn new(token: &str, refreshed_token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            refreshed_token: refreshed_token.map(str::to_string),
            refresh_delay: Duration::ZERO,
            refresh_calls: AtomicUsize::new(0),
            unauthorized_calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn unauthorized_calls(&self) -> usize {
        self.unauthorized_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthHooks for ScriptedHooks {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    async fn refresh_access_token(&self, _client: &PameClient) -> Result<Option<String>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;

        match &self.refreshed_token {
            Some(token) => {
                *self.token.lock() = Some(token.clone());
                Ok(Some(token.clone()))
            }
            None => Err(Error::Unauthorized("refresh token expired".to_string())),
        }
    }

    async fn on_unauthorized(&self, _client: &PameClient) {
        self.unauthorized_calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn client_for(server: &MockServer) -> PameClient {
    PameClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn attach(client: &PameClient, hooks: &Arc<ScriptedHooks>) {
    client.attach_auth(hooks.clone(), AuthOptions::default());
}

/// Users answer 401 to the old token and 200 to the new one.
async fn mount_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/admin/user/\d+$"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/admin/user/\d+$"))
        .and(header("authorization", "Bearer new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "user@example.com", "status": true })),
        )
        .mount(server)
        .await;
}

async fn bearer_paths(server: &MockServer, token: &str) -> Vec<String> {
    let expected = format!("Bearer {}", token);
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some(expected.as_str())
        })
        .map(|r| r.url.path().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Injection and exclusion
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_attached_to_regular_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/user/1"))
        .and(header("authorization", "Bearer current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "a@b.c" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("current", None));
    attach(&client, &hooks);

    let user = client.users().get(1).await.unwrap();
    assert_eq!(user.email, "a@b.c");
    assert_eq!(hooks.refresh_calls(), 0);
}

#[tokio::test]
async fn test_login_never_receives_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("stored", Some("new")));
    attach(&client, &hooks);

    let response = client
        .auth()
        .login(&LoginRequest {
            email: "admin@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.access_token, "fresh");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_401_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "bad credentials" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("stored", Some("new")));
    attach(&client, &hooks);

    let err = client
        .auth()
        .login(&LoginRequest {
            email: "admin@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(hooks.refresh_calls(), 0);
}

#[tokio::test]
async fn test_refresh_endpoint_401_never_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);

    let err = client.auth().refresh_token("r").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(hooks.refresh_calls(), 0);
}

#[tokio::test]
async fn test_skip_auth_request_is_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/public"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);

    let err = client
        .send(ApiRequest::get("/api/v1/public").skip_auth())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(hooks.refresh_calls(), 0);
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_detached_client_sends_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "a@b.c" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);
    assert!(client.detach_auth());

    client.users().get(1).await.unwrap();
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh and replay
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);

    let user = client.users().get(1).await.unwrap();
    assert_eq!(user.email, "user@example.com");
    assert_eq!(hooks.refresh_calls(), 1);
    assert_eq!(hooks.unauthorized_calls(), 0);
    assert_eq!(bearer_paths(&server, "new").await, vec!["/api/v1/admin/user/1"]);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")).with_delay(Duration::from_millis(300)));
    attach(&client, &hooks);

    let users = client.users();
    let (x, y) = tokio::join!(users.get(1), users.get(2));

    assert_eq!(x.unwrap().email, "user@example.com");
    assert_eq!(y.unwrap().email, "user@example.com");
    assert_eq!(hooks.refresh_calls(), 1);

    let mut replayed = bearer_paths(&server, "new").await;
    replayed.sort();
    assert_eq!(replayed, vec!["/api/v1/admin/user/1", "/api/v1/admin/user/2"]);
}

#[tokio::test]
async fn test_queued_requests_all_replayed_with_new_token() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")).with_delay(Duration::from_millis(400)));
    attach(&client, &hooks);

    let leader = {
        let client = client.clone();
        tokio::spawn(async move { client.users().get(1).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut followers = Vec::new();
    for id in [2u64, 3, 4] {
        let client = client.clone();
        followers.push(tokio::spawn(async move { client.users().get(id).await }));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    leader.await.unwrap().unwrap();
    for follower in followers {
        follower.await.unwrap().unwrap();
    }

    assert_eq!(hooks.refresh_calls(), 1);

    let replayed = bearer_paths(&server, "new").await;
    assert_eq!(replayed.len(), 4);
    assert!(replayed.iter().any(|p| p == "/api/v1/admin/user/1"));

    // The leader runs alongside the queue; queued replays keep arrival order.
    let queued: Vec<_> = replayed
        .into_iter()
        .filter(|p| p != "/api/v1/admin/user/1")
        .collect();
    assert_eq!(
        queued,
        vec![
            "/api/v1/admin/user/2",
            "/api/v1/admin/user/3",
            "/api/v1/admin/user/4",
        ]
    );
}

#[tokio::test]
async fn test_second_401_is_not_retried_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/user/1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "revoked" })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);

    let err = client.users().get(1).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(hooks.refresh_calls(), 1);
    assert_eq!(hooks.unauthorized_calls(), 0);
}

#[tokio::test]
async fn test_non_401_errors_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/user/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "code": "db", "message": "database down" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")));
    attach(&client, &hooks);

    let err = client.users().get(1).await.unwrap_err();
    match err {
        Error::Api { status, code, message } => {
            assert_eq!(status, 500);
            assert_eq!(code, "db");
            assert_eq!(message, "database down");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(hooks.refresh_calls(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh failure
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_refresh_rejects_original_request() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", None));
    attach(&client, &hooks);

    let err = client.users().get(1).await.unwrap_err();
    match err {
        Error::Refresh(RefreshError::Failed { status, message }) => {
            assert_eq!(status, Some(401));
            assert!(message.contains("refresh token expired"));
        }
        other => panic!("expected refresh failure, got {:?}", other),
    }
    assert_eq!(hooks.refresh_calls(), 1);
    assert_eq!(hooks.unauthorized_calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_rejects_batch_and_signals_once() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", None).with_delay(Duration::from_millis(300)));
    attach(&client, &hooks);

    let users = client.users();
    let (a, b, c) = tokio::join!(users.get(1), users.get(2), users.get(3));

    let errors = [a.unwrap_err(), b.unwrap_err(), c.unwrap_err()];
    let first = match &errors[0] {
        Error::Refresh(e) => e.clone(),
        other => panic!("expected refresh failure, got {:?}", other),
    };
    for err in &errors {
        match err {
            Error::Refresh(e) => assert_eq!(e, &first),
            other => panic!("expected refresh failure, got {:?}", other),
        }
    }

    assert_eq!(hooks.refresh_calls(), 1);
    assert_eq!(hooks.unauthorized_calls(), 1);
    assert!(bearer_paths(&server, "new").await.is_empty());
}

#[tokio::test]
async fn test_hung_refresh_times_out() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", Some("new")).with_delay(Duration::from_secs(5)));
    client.attach_auth(
        hooks.clone(),
        AuthOptions::default().with_refresh_timeout(Some(Duration::from_millis(100))),
    );

    let err = client.users().get(1).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Refresh(RefreshError::TimedOut(limit)) if limit == Duration::from_millis(100)
    ));
    assert_eq!(hooks.unauthorized_calls(), 1);
}

#[tokio::test]
async fn test_new_cycle_after_failed_refresh() {
    let server = MockServer::start().await;
    mount_users(&server).await;

    let client = client_for(&server);
    let hooks = Arc::new(ScriptedHooks::new("old", None));
    attach(&client, &hooks);

    assert!(client.users().get(1).await.is_err());
    assert!(client.users().get(1).await.is_err());

    assert_eq!(hooks.refresh_calls(), 2);
    assert_eq!(hooks.unauthorized_calls(), 2);
}
