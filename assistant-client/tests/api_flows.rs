use std::sync::Arc;

use assistant_client::models::DocumentUpdate;
use assistant_client::{AssistantClient, ClientError};
use common_auth::{FilePart, Gateway, GatewayConfig, TerminationReason};
use common_session::{FileSessionStore, InMemorySessionStore, SessionCredentials, SessionStore};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

fn client_for(server: &MockServer, store: Arc<dyn SessionStore>) -> AssistantClient {
    let gateway = Gateway::builder(GatewayConfig::new(server.url("/api/v1")))
        .with_store(store)
        .build()
        .expect("gateway builds");
    AssistantClient::new(gateway)
}

fn signed_in(access: &str) -> Arc<InMemorySessionStore> {
    Arc::new(InMemorySessionStore::with_session(SessionCredentials::new(
        access,
        Some("R1".to_string()),
        "7",
        "alice",
    )))
}

#[tokio::test]
async fn login_writes_session_file_without_roles() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/auth/login")
                .json_body(json!({ "username": "alice", "password": "s3cret" }));
            then.status(200).json_body(json!({
                "token": "T1",
                "refreshToken": "R1",
                "userId": 7,
                "username": "alice",
                "roles": ["ADMIN", "USER"]
            }));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let client = client_for(&server, Arc::new(FileSessionStore::new(&path)));

    let session = client.auth.login("alice", "s3cret").await.unwrap();
    login.assert_async().await;
    assert!(session.is_admin());
    assert_eq!(session.user_id, "7");

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        stored,
        json!({ "jwtToken": "T1", "refreshToken": "R1", "userId": "7", "username": "alice" })
    );
}

#[tokio::test]
async fn failed_login_reports_backend_detail_and_stores_nothing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(400)
                .json_body(json!({ "title": "Bad Request", "detail": "Invalid username or password" }));
        })
        .await;

    let store = Arc::new(InMemorySessionStore::new());
    let client = client_for(&server, store.clone());

    let err = client.auth.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid username or password");
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn chat_survives_an_expired_token() {
    let server = MockServer::start_async().await;
    let expired = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat")
                .header("authorization", "Bearer T1");
            then.status(401);
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/refresh-token");
            then.status(200)
                .json_body(json!({ "token": "T2", "refreshToken": "R2" }));
        })
        .await;
    let answered = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat")
                .header("authorization", "Bearer T2")
                .json_body(json!({ "message": "What changed in Q3?", "conversationId": null }));
            then.status(200)
                .json_body(json!({ "response": "Revenue grew.", "conversationId": 12 }));
        })
        .await;

    let store = signed_in("T1");
    let client = client_for(&server, store.clone());

    let reply = client.chat.send("What changed in Q3?", None).await.unwrap();
    assert_eq!(reply.response, "Revenue grew.");
    assert_eq!(reply.conversation_id.as_deref(), Some("12"));

    expired.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
    answered.assert_hits_async(1).await;

    let session = store.load().await.unwrap().unwrap();
    assert_eq!(session.access_token, "T2");
    assert_eq!(session.refresh_token(), Some("R2"));
}

#[tokio::test]
async fn quota_errors_carry_retry_hint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/chat");
            then.status(429).json_body(json!({
                "type": "https://errors.example.com/quota",
                "title": "Too Many Requests",
                "detail": "Gemini quota exhausted",
                "retryAfter": "30s"
            }));
        })
        .await;

    let client = client_for(&server, signed_in("T1"));
    let err = client.chat.send("hello", Some("3")).await.unwrap_err();

    match &err {
        ClientError::Api(problem) => assert!(problem.is_quota_exceeded()),
        other => panic!("expected api problem, got {other:?}"),
    }
    assert_eq!(err.user_message(), "API quota exceeded. Please retry in: 30s");
}

#[tokio::test]
async fn conversations_are_listed_for_the_user() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/conversations")
                .query_param("userId", "7")
                .header("authorization", "Bearer T1");
            then.status(200).json_body(json!([
                { "id": 1, "userId": 7, "title": "Onboarding", "createdAt": "2024-03-02T10:00:00" },
                { "id": "b2", "title": null }
            ]));
        })
        .await;

    let client = client_for(&server, signed_in("T1"));
    let conversations = client.conversations.list("7").await.unwrap();

    listing.assert_async().await;
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].id, "1");
    assert_eq!(conversations[0].user_id.as_deref(), Some("7"));
    assert_eq!(conversations[1].id, "b2");
    assert!(conversations[1].title.is_none());
}

#[tokio::test]
async fn upload_is_replayed_intact_after_refresh() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/documents/ingest")
                .header("authorization", "Bearer T1");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/refresh-token");
            then.status(200).json_body(json!({ "token": "T2" }));
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/documents/ingest")
                .header("authorization", "Bearer T2")
                .body_contains("filename=\"notes.txt\"")
                .body_contains("quarterly numbers");
            then.status(202)
                .json_body(json!({ "message": "Ingestion started", "jobId": "job-9" }));
        })
        .await;

    let client = client_for(&server, signed_in("T1"));
    let files = vec![FilePart::new("notes.txt", "quarterly numbers".as_bytes().to_vec())
        .with_content_type("text/plain")];

    let job = client.documents.ingest(files).await.unwrap();
    accepted.assert_async().await;
    assert_eq!(job.job_id, "job-9");
}

#[tokio::test]
async fn invalid_document_update_never_reaches_backend() {
    let server = MockServer::start_async().await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH).path("/api/v1/documents/5");
            then.status(200);
        })
        .await;

    let client = client_for(&server, signed_in("T1"));
    let update = DocumentUpdate {
        filename: Some(String::new()),
        summary: None,
    };

    let err = client.documents.update("5", &update).await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    patch.assert_hits_async(0).await;
}

#[tokio::test]
async fn register_then_login_uses_the_same_credentials() {
    let server = MockServer::start_async().await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/auth/register")
                .json_body(json!({ "username": "bob", "password": "pw" }));
            then.status(200).json_body(json!({ "id": 8, "username": "bob" }));
        })
        .await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/auth/login")
                .json_body(json!({ "username": "bob", "password": "pw" }));
            then.status(200)
                .json_body(json!({ "token": "T1", "userId": 8, "username": "bob" }));
        })
        .await;

    let store = Arc::new(InMemorySessionStore::new());
    let client = client_for(&server, store.clone());

    let session = client.auth.register_and_login("bob", "pw").await.unwrap();
    register.assert_async().await;
    login.assert_async().await;
    assert_eq!(session.user_id, "8");
    assert_eq!(session.refresh_token(), None);
    assert!(store.load().await.unwrap().is_some());
}

#[tokio::test]
async fn logout_signals_termination_once() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, signed_in("T1"));
    let mut events = client.gateway().subscribe();

    assert!(client.auth.logout().await);
    assert!(!client.auth.logout().await);

    let event = events.recv().await.unwrap();
    assert_eq!(event.reason, TerminationReason::LoggedOut);
    assert!(events.try_recv().is_err());
    assert!(matches!(
        client.auth.whoami().await,
        Err(ClientError::NotSignedIn)
    ));
}

#[tokio::test]
async fn deleting_a_tenant_user_accepts_empty_body() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/api/v1/tenants/users/u-3")
                .header("authorization", "Bearer T1");
            then.status(204);
        })
        .await;

    let client = client_for(&server, signed_in("T1"));
    client.users.delete("u-3").await.unwrap();
    delete.assert_async().await;
}

#[tokio::test]
async fn rejected_password_without_session_skips_refresh() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(401);
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/refresh-token");
            then.status(200).json_body(json!({ "token": "T2" }));
        })
        .await;

    let client = client_for(&server, Arc::new(InMemorySessionStore::new()));
    let err = client.auth.login("alice", "wrong").await.unwrap_err();

    assert!(matches!(err, ClientError::Invalid(_)));
    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn wrong_password_over_stale_session_keeps_refresh_credential_unspent() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(401);
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/refresh-token");
            then.status(401).body("refresh token expired");
        })
        .await;

    let store = signed_in("T0");
    let client = client_for(&server, store.clone());

    let err = client.auth.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)), "unexpected error: {err:?}");
    assert_eq!(err.user_message(), "invalid input: invalid username or password");
    login.assert_hits_async(1).await;
    refresh.assert_hits_async(0).await;
    assert!(store.load().await.unwrap().is_none());
}
