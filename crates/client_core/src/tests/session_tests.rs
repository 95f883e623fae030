use super::*;
use crate::prefs::MemoryPrefs;
use serde_json::json;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::net::TcpListener;

#[derive(Clone)]
struct UserService {
    login_body: Arc<Value>,
    profile_status: StatusCode,
    profile_body: Arc<Value>,
    profile_delay: Duration,
    profile_hits: Arc<AtomicUsize>,
}

impl UserService {
    fn new(login_body: Value) -> Self {
        Self {
            login_body: Arc::new(login_body),
            profile_status: StatusCode::OK,
            profile_body: Arc::new(json!({"code": 200, "data": {"id": 1, "username": "alice"}})),
            profile_delay: Duration::ZERO,
            profile_hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_profile(mut self, status: StatusCode, body: Value) -> Self {
        self.profile_status = status;
        self.profile_body = Arc::new(body);
        self
    }

    fn with_profile_delay(mut self, delay: Duration) -> Self {
        self.profile_delay = delay;
        self
    }

    fn profile_hits(&self) -> usize {
        self.profile_hits.load(Ordering::SeqCst)
    }
}

async fn handle_login(State(state): State<UserService>) -> Json<Value> {
    Json(state.login_body.as_ref().clone())
}

async fn handle_profile(State(state): State<UserService>) -> impl IntoResponse {
    state.profile_hits.fetch_add(1, Ordering::SeqCst);
    if !state.profile_delay.is_zero() {
        tokio::time::sleep(state.profile_delay).await;
    }
    (state.profile_status, Json(state.profile_body.as_ref().clone()))
}

async fn spawn_user_service(state: UserService) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/users/login", post(handle_login))
        .route("/api/users/profile", get(handle_profile).put(handle_profile))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn store(server_url: &str) -> (SessionStore, Arc<MemoryPrefs>) {
    let prefs = Arc::new(MemoryPrefs::default());
    let session = SessionStore::new(RequestExecutor::new(server_url), prefs.clone());
    (session, prefs)
}

#[tokio::test]
async fn login_accepts_each_known_token_location() {
    let cases = [
        (json!({"token": "t-top"}), "t-top"),
        (json!({"data": {"token": "t-nested"}}), "t-nested"),
        (json!({"accessToken": "t-access"}), "t-access"),
        (json!({"satoken": "t-sa"}), "t-sa"),
    ];

    for (body, expected) in cases {
        let url = spawn_user_service(UserService::new(body)).await;
        let (session, prefs) = store(&url);

        session.login("alice", "pw").await.expect("login");
        assert_eq!(session.token().await.as_deref(), Some(expected));
        assert_eq!(prefs.token().await.expect("read").as_deref(), Some(expected));
    }
}

#[tokio::test]
async fn login_without_token_fails_and_persists_nothing() {
    let body = json!({"code": 200, "data": {"user": {"id": 1, "username": "alice"}}});
    let url = spawn_user_service(UserService::new(body)).await;
    let (session, prefs) = store(&url);

    let err = session.login("alice", "pw").await.expect_err("must fail");
    assert!(matches!(err, ApiError::MissingToken));
    assert_eq!(session.token().await, None);
    assert_eq!(prefs.token().await.expect("read"), None);
}

#[tokio::test]
async fn login_failure_envelope_is_rethrown_with_message() {
    let body = json!({"code": 500, "message": "bad credentials"});
    let url = spawn_user_service(UserService::new(body)).await;
    let (session, _prefs) = store(&url);

    let err = session.login("alice", "pw").await.expect_err("must fail");
    assert_eq!(err.to_string(), "bad credentials");
    assert_eq!(
        session.snapshot().await.error.as_deref(),
        Some("bad credentials")
    );
}

#[tokio::test]
async fn login_seeds_user_when_response_carries_one() {
    let body = json!({
        "data": {"token": "jwt", "user": {"id": 4, "username": "bob"}}
    });
    let url = spawn_user_service(UserService::new(body)).await;
    let (session, _prefs) = store(&url);

    session.login("bob", "pw").await.expect("login");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.user.expect("user").username, "bob");
}

#[tokio::test]
async fn load_without_token_makes_no_network_call() {
    let service = UserService::new(json!({"token": "t"}));
    let hits = service.clone();
    let url = spawn_user_service(service).await;
    let (session, _prefs) = store(&url);

    session.load().await.expect("load");
    assert_eq!(hits.profile_hits(), 0);
}

#[tokio::test]
async fn logout_then_load_is_a_no_op() {
    let service = UserService::new(json!({"token": "jwt"}));
    let hits = service.clone();
    let url = spawn_user_service(service).await;
    let (session, prefs) = store(&url);

    session.login("alice", "pw").await.expect("login");
    session.logout().await;
    assert_eq!(prefs.token().await.expect("read"), None);

    session.load().await.expect("load");
    assert_eq!(hits.profile_hits(), 0);
}

#[tokio::test]
async fn load_replaces_cached_user() {
    let service = UserService::new(json!({"token": "jwt"}));
    let url = spawn_user_service(service).await;
    let (session, prefs) = store(&url);
    prefs.set_token("jwt").await.expect("seed token");
    session.restore().await;

    session.load().await.expect("load");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.user.expect("user").username, "alice");
}

#[tokio::test]
async fn auth_failure_during_load_evicts_the_session() {
    let service = UserService::new(json!({"token": "jwt"})).with_profile(
        StatusCode::UNAUTHORIZED,
        json!({"message": "Invalid token"}),
    );
    let url = spawn_user_service(service).await;
    let (session, prefs) = store(&url);
    prefs.set_token("stale-jwt").await.expect("seed token");
    session.restore().await;

    session.load().await.expect("eviction is not an error");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.token, None);
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.error.as_deref(), Some("Invalid token"));
    assert_eq!(prefs.token().await.expect("read"), None);
}

#[tokio::test]
async fn non_auth_failure_keeps_the_stale_token() {
    let service = UserService::new(json!({"token": "jwt"})).with_profile(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"message": "database exploded"}),
    );
    let url = spawn_user_service(service).await;
    let (session, prefs) = store(&url);
    prefs.set_token("jwt").await.expect("seed token");
    session.restore().await;

    let err = session.load().await.expect_err("must surface");
    assert_eq!(err.to_string(), "database exploded");
    assert_eq!(session.token().await.as_deref(), Some("jwt"));
    assert_eq!(prefs.token().await.expect("read").as_deref(), Some("jwt"));
}

#[tokio::test]
async fn concurrent_loads_fetch_the_profile_once() {
    let service = UserService::new(json!({"token": "jwt"}))
        .with_profile_delay(Duration::from_millis(150));
    let hits = service.clone();
    let url = spawn_user_service(service).await;
    let (session, prefs) = store(&url);
    prefs.set_token("jwt").await.expect("seed token");
    session.restore().await;

    let (first, second) = tokio::join!(session.load(), session.load());
    first.expect("load");
    second.expect("load");
    assert_eq!(hits.profile_hits(), 1);
}

#[tokio::test]
async fn update_profile_is_a_guarded_no_op_when_logged_out() {
    let service = UserService::new(json!({"token": "jwt"}));
    let hits = service.clone();
    let url = spawn_user_service(service).await;
    let (session, _prefs) = store(&url);

    let patch = UserPatch {
        email: Some("new@example.com".into()),
        ..UserPatch::default()
    };
    session.update_profile(&patch).await.expect("no-op");
    assert_eq!(hits.profile_hits(), 0);
}

#[tokio::test]
async fn update_profile_replaces_user_with_server_representation() {
    let service = UserService::new(json!({"token": "jwt"})).with_profile(
        StatusCode::OK,
        json!({"code": 200, "data": {"id": 1, "username": "alice", "email": "new@example.com"}}),
    );
    let url = spawn_user_service(service).await;
    let (session, _prefs) = store(&url);
    session.login("alice", "pw").await.expect("login");

    let patch = UserPatch {
        email: Some("new@example.com".into()),
        ..UserPatch::default()
    };
    session.update_profile(&patch).await.expect("update");
    let snapshot = session.snapshot().await;
    assert_eq!(
        snapshot.user.expect("user").email.as_deref(),
        Some("new@example.com")
    );
}

#[tokio::test]
async fn update_password_accepts_a_plain_text_acknowledgment() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/users/login", post(|| async { Json(json!({"token": "jwt"})) }))
        .route(
            "/api/users/password",
            axum::routing::put(|| async { "password updated" }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let (session, _prefs) = store(&format!("http://{addr}"));
    session.login("alice", "pw").await.expect("login");

    let change = PasswordChange {
        old_password: "pw".into(),
        new_password: "pw2".into(),
    };
    session.update_password(&change).await.expect("update");
}

#[test]
fn extract_token_honors_precedence_order() {
    let body = json!({"token": "primary", "satoken": "fallback"});
    assert_eq!(extract_token(&body).as_deref(), Some("primary"));

    let body = json!({"data": {"token": "nested"}, "accessToken": "later"});
    assert_eq!(extract_token(&body).as_deref(), Some("nested"));

    assert_eq!(extract_token(&json!({"data": {}})), None);
}
