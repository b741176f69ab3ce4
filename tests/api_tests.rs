mod common;

use autoqualify::types::{
    ChatMessage, FeedStats, QualificationResult, ResendResponse, SendOutcome, SessionView,
    ViewState,
};
use autoqualify::AppState;
use axum::http::StatusCode;
use axum_test::TestServer;
use common::mocks::{qualification_reply, test_state, GatedLLMClient, MockLLMClient};
use rstest::rstest;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn server_with(llm: MockLLMClient) -> (TestServer, AppState) {
    let state = test_state(Arc::new(llm));
    let app = autoqualify::api::app(state.clone());
    (
        TestServer::new(app).expect("Failed to create test server"),
        state,
    )
}

fn scoring_server() -> (TestServer, AppState) {
    server_with(MockLLMClient::json(qualification_reply(
        "Happy to help! How large is your team?",
        "buyer@corp.com",
        82,
        "YES",
    )))
}

async fn new_session(server: &TestServer) -> String {
    let response = server.post("/api/sessions").await;
    response.assert_status(StatusCode::CREATED);
    let view: SessionView = response.json();
    assert_eq!(view.view, ViewState::Landing);
    view.session_id.to_string()
}

/// Walks a new session all the way to the role's dashboard.
async fn signed_in(server: &TestServer, role: &str, email: &str) -> String {
    let id = new_session(server).await;
    server
        .post(&format!("/api/sessions/{id}/start"))
        .await
        .assert_status_ok();
    server
        .post(&format!("/api/sessions/{id}/login"))
        .json(&json!({ "role": role, "email": email, "password": "hunter2" }))
        .await
        .assert_status_ok();
    server
        .post(&format!("/api/sessions/{id}/verify"))
        .await
        .assert_status_ok();
    id
}

// ============= Health Check Tests =============

#[tokio::test]
async fn test_health_check() {
    let (server, _) = scoring_server();
    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

// ============= Session Flow Tests =============

#[tokio::test]
async fn test_user_flow_reaches_dashboard_with_greeting() {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;

    let view: SessionView = server
        .post(&format!("/api/sessions/{id}/start"))
        .await
        .json();
    assert_eq!(view.view, ViewState::Auth);

    let view: SessionView = server
        .post(&format!("/api/sessions/{id}/signup"))
        .json(&json!({ "role": "USER", "email": " lead@corp.com ", "password": "pw" }))
        .await
        .json();
    assert_eq!(view.view, ViewState::VerifyEmail);
    assert_eq!(view.email.as_deref(), Some("lead@corp.com"));

    let view: SessionView = server
        .post(&format!("/api/sessions/{id}/verify"))
        .await
        .json();
    assert_eq!(view.view, ViewState::UserDashboard);

    let messages: Vec<ChatMessage> = server
        .get(&format!("/api/sessions/{id}/messages"))
        .await
        .json();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].text,
        "Hi! Welcome to AutoQualify. How can I help you today?"
    );
}

#[tokio::test]
async fn test_admin_login_lands_on_admin_dashboard() {
    let (server, _) = scoring_server();
    let id = signed_in(&server, "ADMIN", "ops@corp.com").await;

    let view: SessionView = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(view.view, ViewState::AdminDashboard);
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;

    server
        .post(&format!("/api/sessions/{id}/verify"))
        .expect_failure()
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .post(&format!("/api/sessions/{id}/logout"))
        .expect_failure()
        .await
        .assert_status(StatusCode::CONFLICT);

    let view: SessionView = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(view.view, ViewState::Landing);
}

#[tokio::test]
async fn test_back_returns_to_landing() {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;
    server.post(&format!("/api/sessions/{id}/start")).await;

    let view: SessionView = server
        .post(&format!("/api/sessions/{id}/back"))
        .await
        .json();
    assert_eq!(view.view, ViewState::Landing);
}

#[tokio::test]
async fn test_credentials_are_required() {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;
    server.post(&format!("/api/sessions/{id}/start")).await;

    let response = server
        .post(&format!("/api/sessions/{id}/login"))
        .json(&json!({ "role": "USER", "email": "  ", "password": "pw" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Email"));

    server
        .post(&format!("/api/sessions/{id}/login"))
        .json(&json!({ "role": "USER", "email": "a@b.co", "password": "" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let view: SessionView = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(view.view, ViewState::Auth);
}

#[rstest]
#[case::unknown_role(json!({ "role": "GUEST", "email": "a@b.co", "password": "pw" }))]
#[case::missing_password(json!({ "role": "USER", "email": "a@b.co" }))]
#[case::wrong_type(json!({ "role": "USER", "email": 7, "password": "pw" }))]
#[tokio::test]
async fn test_bad_credentials_body_is_json_error(#[case] body: Value) {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;
    server.post(&format!("/api/sessions/{id}/start")).await;

    let response = server
        .post(&format!("/api/sessions/{id}/signup"))
        .json(&body)
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(error["error"].as_str().unwrap().starts_with("Invalid input"));

    let view: SessionView = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(view.view, ViewState::Auth);
}

#[tokio::test]
async fn test_non_json_message_body_is_json_error() {
    let (server, state) = scoring_server();
    let id = signed_in(&server, "USER", "a@b.co").await;

    let response = server
        .post(&format!("/api/sessions/{id}/messages"))
        .text("hello")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
    assert!(state.feed.is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (server, _) = scoring_server();
    server
        .get(&format!("/api/sessions/{}", uuid::Uuid::new_v4()))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_session() {
    let (server, state) = scoring_server();
    let id = new_session(&server).await;

    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(state.sessions.is_empty());
    server
        .get(&format!("/api/sessions/{id}"))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resend_cooldown() {
    let (server, _) = scoring_server();
    let id = new_session(&server).await;
    server.post(&format!("/api/sessions/{id}/start")).await;
    server
        .post(&format!("/api/sessions/{id}/signup"))
        .json(&json!({ "role": "USER", "email": "a@b.co", "password": "pw" }))
        .await;

    let resend: ResendResponse = server
        .post(&format!("/api/sessions/{id}/resend"))
        .await
        .json();
    assert_eq!(resend.cooldown_secs, 60);

    let view: SessionView = server.get(&format!("/api/sessions/{id}")).await.json();
    assert!(view.resend_acknowledged);
    assert!(view.resend_cooldown_secs.is_some_and(|s| s > 0 && s <= 60));

    let response = server
        .post(&format!("/api/sessions/{id}/resend"))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_logout_clears_identity() {
    let (server, _) = scoring_server();
    let id = signed_in(&server, "USER", "a@b.co").await;

    let view: SessionView = server
        .post(&format!("/api/sessions/{id}/logout"))
        .await
        .json();
    assert_eq!(view.view, ViewState::Landing);
    assert!(view.role.is_none());
    assert!(view.email.is_none());
}

// ============= Chat Tests =============

#[tokio::test]
async fn test_send_message_returns_reply_and_feeds_admin() {
    let (server, state) = scoring_server();
    let id = signed_in(&server, "USER", "buyer@corp.com").await;

    let outcome: SendOutcome = server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "text": "Hi, I'd like pricing for the enterprise plan" }))
        .await
        .json();
    assert_eq!(
        outcome.reply.unwrap().text,
        "Happy to help! How large is your team?"
    );

    let messages: Vec<ChatMessage> = server
        .get(&format!("/api/sessions/{id}/messages"))
        .await
        .json();
    assert_eq!(messages.len(), 3);

    assert_eq!(state.feed.len(), 1);
    assert_eq!(
        state.feed.snapshot()[0].admin_insight.user_email,
        "buyer@corp.com"
    );
}

#[tokio::test]
async fn test_failed_qualification_is_ok_without_reply() {
    let (server, state) = server_with(MockLLMClient::new("<html>oops</html>"));
    let id = signed_in(&server, "USER", "a@b.co").await;

    let response = server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "text": "hello" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["reply"].is_null());
    assert_eq!(body["message"]["role"], "user");
    assert!(state.feed.is_empty());
}

#[tokio::test]
async fn test_send_rejects_blank_and_wrong_view() {
    let (server, _) = scoring_server();
    let id = signed_in(&server, "USER", "a@b.co").await;
    server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "text": "   " }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let admin = signed_in(&server, "ADMIN", "ops@corp.com").await;
    server
        .post(&format!("/api/sessions/{admin}/messages"))
        .json(&json!({ "text": "hello" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_second_send_while_waiting_is_busy() {
    let llm = Arc::new(GatedLLMClient::json(qualification_reply(
        "Let me check availability.",
        "buyer@corp.com",
        64,
        "YES",
    )));
    let state = test_state(llm.clone());
    let server = TestServer::new(autoqualify::api::app(state.clone()))
        .expect("Failed to create test server");
    let id = signed_in(&server, "USER", "buyer@corp.com").await;
    let path = format!("/api/sessions/{id}/messages");

    let first = async { server.post(&path).json(&json!({ "text": "Is a demo possible?" })).await };
    let second = async {
        llm.wait_started().await;
        let response = server
            .post(&path)
            .json(&json!({ "text": "Hello?" }))
            .expect_failure()
            .await;
        llm.release();
        response
    };
    let (first, second) = tokio::join!(first, second);

    second.assert_status(StatusCode::CONFLICT);
    assert!(second.json::<Value>()["error"].is_string());

    first.assert_status_ok();
    let outcome: SendOutcome = first.json();
    assert_eq!(outcome.reply.unwrap().text, "Let me check availability.");
    assert_eq!(state.feed.len(), 1);

    let messages: Vec<ChatMessage> = server.get(&path).await.json();
    let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
    assert!(!texts.contains(&"Hello?"));
}

// ============= Admin Feed Tests =============

#[tokio::test]
async fn test_feed_requires_admin_dashboard() {
    let (server, _) = scoring_server();
    let user = signed_in(&server, "USER", "a@b.co").await;

    for path in ["feed", "feed/stats", "feed/stream"] {
        server
            .get(&format!("/api/sessions/{user}/{path}"))
            .expect_failure()
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_sees_feed_latest_first_with_stats_and_search() {
    let (server, _) = scoring_server();
    let admin = signed_in(&server, "ADMIN", "ops@corp.com").await;

    for email in ["first@corp.com", "second@corp.com"] {
        let user = signed_in(&server, "USER", email).await;
        server
            .post(&format!("/api/sessions/{user}/messages"))
            .json(&json!({ "text": format!("pricing for {email}") }))
            .await
            .assert_status_ok();
    }

    let feed: Vec<QualificationResult> = server
        .get(&format!("/api/sessions/{admin}/feed"))
        .await
        .json();
    assert_eq!(feed.len(), 2);
    assert!(feed[0].timestamp >= feed[1].timestamp);

    let stats: FeedStats = server
        .get(&format!("/api/sessions/{admin}/feed/stats"))
        .await
        .json();
    assert_eq!(
        stats,
        FeedStats {
            live_signals: 2,
            high_intent_leads: 2
        }
    );

    let matches: Vec<QualificationResult> = server
        .get(&format!("/api/sessions/{admin}/feed"))
        .add_query_param("search", "PRICING")
        .await
        .json();
    assert_eq!(matches.len(), 2);

    let none: Vec<QualificationResult> = server
        .get(&format!("/api/sessions/{admin}/feed"))
        .add_query_param("search", "no-such-lead")
        .await
        .json();
    assert!(none.is_empty());
}

/// Serves `state` on a real socket; SSE needs a streaming body.
async fn spawn_server(state: AppState) -> String {
    let app = autoqualify::api::app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn http_signed_in(http: &reqwest::Client, base: &str, role: &str, email: &str) -> Uuid {
    let view: SessionView = http
        .post(format!("{base}/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = view.session_id;
    http.post(format!("{base}/sessions/{id}/start")).send().await.unwrap();
    http.post(format!("{base}/sessions/{id}/login"))
        .json(&json!({ "role": role, "email": email, "password": "pw" }))
        .send()
        .await
        .unwrap();
    http.post(format!("{base}/sessions/{id}/verify")).send().await.unwrap();
    id
}

fn live_state() -> AppState {
    test_state(Arc::new(MockLLMClient::json(qualification_reply(
        "Sure!",
        "live@corp.com",
        75,
        "YES",
    ))))
}

#[tokio::test]
async fn test_live_feed_streams_insight_events() {
    let base = spawn_server(live_state()).await;
    let http = reqwest::Client::new();
    let admin = http_signed_in(&http, &base, "ADMIN", "ops@corp.com").await;
    let user = http_signed_in(&http, &base, "USER", "live@corp.com").await;

    let mut stream = http
        .get(format!("{base}/sessions/{admin}/feed/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), reqwest::StatusCode::OK);

    let sent = http
        .post(format!("{base}/sessions/{user}/messages"))
        .json(&json!({ "text": "Can we book a demo next week?" }))
        .send()
        .await
        .unwrap();
    assert!(sent.status().is_success());

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buffer = String::new();
        while let Some(chunk) = stream.chunk().await.unwrap() {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            if buffer.contains("event: insight") && buffer.contains("live@corp.com") {
                return buffer;
            }
        }
        buffer
    })
    .await
    .expect("no insight event within timeout");

    assert!(received.contains("event: insight"));
    assert!(received.contains("\"userEmail\":\"live@corp.com\""));
}

#[rstest]
#[case::logout("logout")]
#[case::close("close")]
#[tokio::test]
async fn test_live_feed_ends_when_admin_leaves(#[case] leave: &str) {
    let state = live_state();
    let base = spawn_server(state.clone()).await;
    let http = reqwest::Client::new();
    let admin = http_signed_in(&http, &base, "ADMIN", "ops@corp.com").await;
    let user = http_signed_in(&http, &base, "USER", "live@corp.com").await;

    let mut stream = http
        .get(format!("{base}/sessions/{admin}/feed/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), reqwest::StatusCode::OK);

    let left = match leave {
        "logout" => http.post(format!("{base}/sessions/{admin}/logout")),
        _ => http.delete(format!("{base}/sessions/{admin}")),
    }
    .send()
    .await
    .unwrap();
    assert!(left.status().is_success());

    http.post(format!("{base}/sessions/{user}/messages"))
        .json(&json!({ "text": "What does the enterprise plan cost?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(state.feed.len(), 1);

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buffer = String::new();
        while let Some(chunk) = stream.chunk().await.unwrap() {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
        buffer
    })
    .await
    .expect("live feed stayed open after the admin left");

    assert!(!received.contains("event: insight"));
    assert!(!received.contains("live@corp.com"));
}
