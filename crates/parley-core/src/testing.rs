//! In-memory ports and scripted providers shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use serde_json::json;
use uuid::Uuid;

use parley_types::agent::{Agent, McpConfig};
use parley_types::chat::StoredMessage;
use parley_types::error::{ChatError, RepositoryError, ToolError};
use parley_types::llm::{CompletionRequest, LlmError, StopReason, StreamEvent, ToolDefinition, Usage};
use parley_types::model::ModelConfig;
use parley_types::usage::{UsageCounter, UsageRecord};
use parley_types::workspace::Workspace;

use crate::app_info::AppInfoStore;
use crate::chat::repository::MessageRepository;
use crate::chat::stream::{TurnEvent, TurnEventStream};
use crate::llm::{BoxLlmProvider, EventStream, LlmProvider, ModelRegistry};
use crate::repository::agent::{AgentRepository, WorkspaceScope};
use crate::repository::workspace::WorkspaceRepository;
use crate::tools::{RemoteToolLoader, StaticToolProvider, Tool, ToolSet};
use crate::usage::UsageStore;

pub const TEST_MODEL: &str = "test-model";

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Events one provider call emits.
pub struct Step(Vec<Result<StreamEvent, LlmError>>);

impl Step {
    pub fn text(chunks: &[&str]) -> Self {
        let mut events = vec![Ok(StreamEvent::Connected)];
        events.extend(chunks.iter().map(|c| {
            Ok(StreamEvent::TextDelta {
                text: c.to_string(),
            })
        }));
        events.push(Ok(StreamEvent::MessageDelta {
            stop_reason: StopReason::EndTurn,
        }));
        events.push(Ok(StreamEvent::Usage(Usage {
            input_tokens: 10,
            output_tokens: 5,
        })));
        events.push(Ok(StreamEvent::Done));
        Self(events)
    }

    pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> Self {
        Self(vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::ToolUseComplete {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }),
            Ok(StreamEvent::MessageDelta {
                stop_reason: StopReason::ToolUse,
            }),
            Ok(StreamEvent::Done),
        ])
    }

    /// Text chunks followed by an upstream error and no `Done`.
    pub fn text_then_error(chunks: &[&str], error: LlmError) -> Self {
        let mut events: Vec<_> = chunks
            .iter()
            .map(|c| {
                Ok(StreamEvent::TextDelta {
                    text: c.to_string(),
                })
            })
            .collect();
        events.push(Err(error));
        Self(events)
    }
}

/// Replays one `Step` per call and records every request.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        self.requests.clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        self.requests.lock().unwrap().push(request);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step(vec![Ok(StreamEvent::Done)]));
        Box::pin(futures_util::stream::iter(step.0))
    }
}

pub fn test_model_config() -> ModelConfig {
    ModelConfig {
        id: TEST_MODEL.to_string(),
        name: "Test Model".to_string(),
        provider: "Test".to_string(),
        provider_id: "test".to_string(),
        context_window: 8000,
        tools: true,
        vision: false,
        description: None,
    }
}

/// A registry serving `TEST_MODEL` from `provider`.
pub fn registry_with(provider: ScriptedProvider) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register(
        test_model_config(),
        Arc::new(move || Ok(BoxLlmProvider::new(provider.clone()))),
    );
    registry
}

pub async fn collect_events(stream: TurnEventStream) -> Vec<Result<TurnEvent, ChatError>> {
    stream.collect().await
}

/// Poll `condition` until it holds; panics after about two seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Returns its arguments unchanged.
pub struct EchoTool {
    definition: ToolDefinition,
}

impl EchoTool {
    pub fn named(name: &str) -> Self {
        Self {
            definition: ToolDefinition {
                name: name.to_string(),
                description: "Echo the arguments".to_string(),
                input_schema: json!({"type": "object"}),
            },
        }
    }
}

impl Tool for EchoTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Ok(arguments)
    }
}

/// Binds every requested id as an `EchoTool`.
pub struct EchoToolProvider;

impl StaticToolProvider for EchoToolProvider {
    fn bind(&self, tool_ids: &[String]) -> ToolSet {
        let mut set = ToolSet::new();
        for id in tool_ids {
            set.insert(EchoTool::named(id));
        }
        set
    }
}

/// Serves one `remote_echo` tool, or fails once `fail_with` is set.
#[derive(Default)]
pub struct FakeRemoteToolLoader {
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeRemoteToolLoader {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteToolLoader for FakeRemoteToolLoader {
    async fn load_tools(&self, _config: &McpConfig) -> Result<ToolSet, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ToolError::Transport(message));
        }
        let mut set = ToolSet::new();
        set.insert(EchoTool::named("remote_echo"));
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUsageStore {
    records: Mutex<HashMap<(String, NaiveDate), UsageRecord>>,
}

impl InMemoryUsageStore {
    /// Today's value of `counter` for `user_id`.
    pub fn count(&self, user_id: &str, counter: UsageCounter) -> u32 {
        let day = Utc::now().date_naive();
        self.records
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), day))
            .map(|r| r.count(counter))
            .unwrap_or(0)
    }
}

impl UsageStore for InMemoryUsageStore {
    async fn increment_if_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        counter: UsageCounter,
        limit: u32,
    ) -> Result<Option<u32>, RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry((user_id.to_string(), day))
            .or_insert_with(|| UsageRecord {
                user_id: user_id.to_string(),
                day,
                message_count: 0,
                special_agent_count: 0,
            });
        let slot = match counter {
            UsageCounter::Messages => &mut record.message_count,
            UsageCounter::SpecialAgent => &mut record.special_agent_count,
        };
        if *slot >= limit {
            return Ok(None);
        }
        *slot += 1;
        Ok(Some(*slot))
    }

    async fn get(&self, user_id: &str, day: NaiveDate) -> Result<Option<UsageRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), day))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<StoredMessage>>,
}

impl InMemoryMessageRepository {
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<StoredMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageRepository for InMemoryMessageRepository {
    async fn save_messages(&self, messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().extend_from_slice(messages);
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<StoredMessage>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }
}

pub struct FailingMessageRepository;

impl MessageRepository for FailingMessageRepository {
    async fn save_messages(&self, _messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        Err(RepositoryError::Connection)
    }

    async fn list_messages(&self, _chat_id: &str) -> Result<Vec<StoredMessage>, RepositoryError> {
        Err(RepositoryError::Connection)
    }
}

#[derive(Default)]
pub struct InMemoryAppInfoStore {
    values: Mutex<HashMap<String, String>>,
}

impl AppInfoStore for InMemoryAppInfoStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAgentRepository {
    agents: Mutex<Vec<Agent>>,
}

impl InMemoryAgentRepository {
    pub fn insert(&self, agent: Agent) {
        self.agents.lock().unwrap().push(agent);
    }
}

impl AgentRepository for InMemoryAgentRepository {
    async fn create(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        if agents.iter().any(|a| a.slug == agent.slug) {
            return Err(RepositoryError::Conflict(agent.slug.clone()));
        }
        agents.push(agent.clone());
        Ok(agent.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.lock().unwrap().iter().find(|a| &a.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Agent>, RepositoryError> {
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.lock().unwrap();
        Ok(slugs
            .iter()
            .filter_map(|s| agents.iter().find(|a| &a.slug == s).cloned())
            .collect())
    }

    async fn list_by_creator(
        &self,
        creator_id: &str,
        scope: WorkspaceScope,
    ) -> Result<Vec<Agent>, RepositoryError> {
        let mut found: Vec<Agent> = self
            .agents
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.creator_id == creator_id)
            .filter(|a| match scope {
                WorkspaceScope::In(id) => a.workspace_id == Some(id),
                WorkspaceScope::Unassigned => a.workspace_id.is_none(),
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryWorkspaceRepository {
    workspaces: Mutex<Vec<Workspace>>,
}

impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn create(&self, workspace: &Workspace) -> Result<Workspace, RepositoryError> {
        self.workspaces.lock().unwrap().push(workspace.clone());
        Ok(workspace.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, RepositoryError> {
        Ok(self
            .workspaces
            .lock()
            .unwrap()
            .iter()
            .find(|w| &w.id == id)
            .cloned())
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Workspace>, RepositoryError> {
        Ok(self
            .workspaces
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let mut workspaces = self.workspaces.lock().unwrap();
        let before = workspaces.len();
        workspaces.retain(|w| &w.id != id);
        if workspaces.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn sample_agent(slug: &str, creator_id: &str, workspace_id: Option<Uuid>) -> Agent {
    Agent {
        id: Uuid::now_v7(),
        slug: slug.to_string(),
        name: slug.to_string(),
        description: format!("The {slug} agent"),
        avatar_url: None,
        system_prompt: format!("You are {slug}."),
        model_preference: None,
        mcp_config: None,
        example_inputs: Vec::new(),
        tools: Vec::new(),
        remixable: false,
        is_public: true,
        max_steps: 5,
        creator_id: creator_id.to_string(),
        workspace_id,
        created_at: Utc::now(),
    }
}

pub fn sample_workspace(creator_id: &str) -> Workspace {
    Workspace {
        id: Uuid::now_v7(),
        name: "Research".to_string(),
        creator_id: creator_id.to_string(),
        created_at: Utc::now(),
    }
}
