//! Router tests over a real listener and a temporary database.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use parley_core::app_info::{AUTHOR_KEY, AppInfoStore};
use parley_core::llm::{BoxLlmProvider, EventStream, LlmProvider, ModelRegistry};
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_types::config::GlobalConfig;
use parley_types::llm::{CompletionRequest, LlmError, StopReason, StreamEvent, Usage};
use parley_types::model::ModelConfig;

use crate::http::extractors::auth::issue_token;
use crate::http::router::build_router;
use crate::state::AppState;

/// What the scripted provider does on every request.
#[derive(Clone, Copy)]
enum Script {
    Reply,
    FailImmediately,
    FailAfterText,
}

struct ScriptedProvider(Script);

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, _request: CompletionRequest) -> EventStream {
        let events: Vec<Result<StreamEvent, LlmError>> = match self.0 {
            Script::Reply => vec![
                Ok(StreamEvent::Connected),
                Ok(StreamEvent::TextDelta { text: "Hello".into() }),
                Ok(StreamEvent::TextDelta { text: " world".into() }),
                Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn }),
                Ok(StreamEvent::Usage(Usage { input_tokens: 7, output_tokens: 2 })),
                Ok(StreamEvent::Done),
            ],
            Script::FailImmediately => vec![Err(LlmError::Stream("upstream down".into()))],
            Script::FailAfterText => vec![
                Ok(StreamEvent::TextDelta { text: "partial".into() }),
                Err(LlmError::Stream("connection reset".into())),
            ],
        };
        Box::pin(futures_util::stream::iter(events))
    }
}

fn model(id: &str) -> ModelConfig {
    ModelConfig {
        id: id.to_string(),
        name: id.to_string(),
        provider: "Test".to_string(),
        provider_id: "test".to_string(),
        context_window: 1000,
        tools: false,
        vision: false,
        description: None,
    }
}

fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for (id, script) in [
        ("test-model", Script::Reply),
        ("failing-model", Script::FailImmediately),
        ("flaky-model", Script::FailAfterText),
    ] {
        registry.register(
            model(id),
            Arc::new(move || Ok(BoxLlmProvider::new(ScriptedProvider(script)))),
        );
    }
    registry
}

struct TestServer {
    base: String,
    state: AppState,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start(config: GlobalConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}?mode=rwc", database_url(dir.path()));
        let pool = DatabasePool::new(&url).await.unwrap();
        let state = AppState::build(pool, config, registry(), dir.path().to_path_buf()).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    async fn default() -> Self {
        Self::start(GlobalConfig::default()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn chat(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn usage_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_usage")
            .fetch_one(&self.state.db_pool.reader)
            .await
            .unwrap()
    }

    async fn message_count(&self, chat_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.state.db_pool.reader)
            .await
            .unwrap()
    }
}

fn turn(model: &str, text: &str) -> Value {
    json!({
        "messages": [{ "role": "user", "content": text }],
        "chatId": "chat-1",
        "userId": "user-1",
        "model": model,
        "isAuthenticated": false,
    })
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::default().await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_chat_missing_fields_is_rejected_without_side_effects() {
    let server = TestServer::default().await;
    let resp = server
        .chat(json!({ "messages": [{ "role": "user", "content": "hi" }], "userId": "u" }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Error, missing information");
    assert_eq!(server.usage_rows().await, 0);
}

#[tokio::test]
async fn test_chat_malformed_json_is_bad_request() {
    let server = TestServer::default().await;
    let resp = server
        .client
        .post(server.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_chat_streams_data_lines_and_persists() {
    let server = TestServer::default().await;
    let resp = server.chat(turn("test-model", "Bonjour")).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-chat-id"], "chat-1");
    assert_eq!(resp.headers()["x-vercel-ai-data-stream"], "v1");
    let body = resp.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], r#"0:"Hello""#);
    assert_eq!(lines[1], r#"0:" world""#);
    let finish = lines.last().unwrap();
    assert!(finish.starts_with("d:"), "last line was {finish}");
    let finish: Value = serde_json::from_str(&finish[2..]).unwrap();
    assert_eq!(finish["finishReason"], "stop");
    assert_eq!(finish["usage"]["promptTokens"], 7);

    assert_eq!(server.usage_rows().await, 1);

    // Assistant messages are stored after the stream finishes.
    let mut stored = 0;
    for _ in 0..50 {
        stored = server.message_count("chat-1").await;
        if stored >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(stored, 2, "user and assistant message stored");
}

#[tokio::test]
async fn test_author_question_answers_without_model() {
    let server = TestServer::default().await;
    server.state.app_info.set(AUTHOR_KEY, "Ada").await.unwrap();

    let resp = server.chat(turn("does-not-exist", "Qui t'a créé ?")).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-chat-id"], "chat-1");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"]["role"], "assistant");
    assert_eq!(body["message"]["content"], "Cette application a été créée par Ada.");
    assert_eq!(server.usage_rows().await, 0);
    assert_eq!(server.message_count("chat-1").await, 0);
}

#[tokio::test]
async fn test_unknown_model_is_server_error() {
    let server = TestServer::default().await;
    let resp = server.chat(turn("nope", "hi")).await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Model nope not found");
    assert_eq!(server.usage_rows().await, 0);
}

#[tokio::test]
async fn test_daily_limit_returns_forbidden_with_code() {
    let mut config = GlobalConfig::default();
    config.usage.daily_limit_anonymous = 1;
    let server = TestServer::start(config).await;

    let first = server.chat(turn("test-model", "one")).await;
    assert_eq!(first.status(), 200);
    let _ = first.text().await.unwrap();

    let second = server.chat(turn("test-model", "two")).await;
    assert_eq!(second.status(), 403);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["code"], "DAILY_LIMIT_REACHED");
}

#[tokio::test]
async fn test_failure_before_output_is_server_error() {
    let server = TestServer::default().await;
    let resp = server.chat(turn("failing-model", "hi")).await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("upstream down"));
}

#[tokio::test]
async fn test_failure_after_output_ends_with_error_line() {
    let server = TestServer::default().await;
    let resp = server.chat(turn("flaky-model", "hi")).await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], r#"0:"partial""#);
    let last = lines.last().unwrap();
    assert!(last.starts_with("3:"), "last line was {last}");
    assert!(last.contains("connection reset"));
}

#[tokio::test]
async fn test_workspaces_require_token() {
    let server = TestServer::default().await;
    let resp = server
        .client
        .get(server.url("/api/workspaces"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .get(server.url("/api/workspaces"))
        .bearer_auth("prl_not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_workspace_lifecycle() {
    let server = TestServer::default().await;
    let owner = issue_token(&server.state, "owner").await.unwrap();
    let other = issue_token(&server.state, "other").await.unwrap();

    let resp = server
        .client
        .post(server.url("/api/workspaces"))
        .bearer_auth(&owner)
        .json(&json!({ "name": "Research" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["name"], "Research");
    let id = created["id"].as_str().unwrap().to_string();

    let listed: Value = server
        .client
        .get(server.url("/api/workspaces"))
        .header("x-api-key", &owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let resp = server
        .client
        .delete(server.url(&format!("/api/workspaces/{id}")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = server
        .client
        .delete(server.url("/api/workspaces/not-a-uuid"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = server
        .client
        .delete(server.url(&format!("/api/workspaces/{id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_create_and_list_agents() {
    let server = TestServer::default().await;
    let token = issue_token(&server.state, "maker").await.unwrap();
    let workspace = server
        .state
        .workspace_service
        .create("maker", "Lab")
        .await
        .unwrap();

    let agent = json!({
        "name": "Rust Helper",
        "description": "Answers Rust questions",
        "system_prompt": "You help with Rust.",
        "workspace_id": workspace.id.to_string(),
        "slug": "rust-helper",
    });

    let resp = server
        .client
        .post(server.url("/api/create-agent"))
        .json(&agent)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .post(server.url("/api/create-agent"))
        .bearer_auth(&token)
        .json(&agent)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["agent"]["slug"], "rust-helper");

    let resp = server
        .client
        .post(server.url("/api/create-agent"))
        .bearer_auth(&token)
        .json(&agent)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "SLUG_CONFLICT");

    let resp = server
        .client
        .post(server.url("/api/create-agent"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Incomplete" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let listing: Value = server
        .client
        .get(server.url(&format!("/api/agents?workspace_id={}", workspace.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["user_agents"].as_array().unwrap().len(), 1);

    let anonymous: Value = server
        .client
        .get(server.url("/api/agents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(anonymous["user_agents"].as_array().unwrap().is_empty());

    let resp = server
        .client
        .get(server.url("/api/agents?workspace_id=bogus"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let server = TestServer::default().await;

    let models: Value = server
        .client
        .get(server.url("/api/models"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = models["models"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["test-model", "failing-model", "flaky-model"]);

    let tools: Value = server
        .client
        .get(server.url("/api/tools"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        tools["tools"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == "webSearch")
    );
}
