//! Chat orchestrator: turns one validated chat turn into either a
//! synthesized author reply or a streamed model response.
//!
//! Order of a streamed turn: model lookup, usage gate, user message log,
//! agent resolution, tool loading, sanitization, model stream. Assistant
//! output is persisted by a detached task once the stream drains cleanly.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parley_types::agent::AgentConfig;
use parley_types::chat::{ChatMessage, ChatTurn};
use parley_types::config::ChatConfig;
use parley_types::error::ChatError;

use super::history::to_llm_messages;
use super::intent::{Intent, IntentClassifier};
use super::logger::MessageLogger;
use super::repository::MessageRepository;
use super::sanitize::clean_messages;
use super::stream::{ModelTurn, TurnEventStream, stream_model_turn};
use crate::app_info::{AUTHOR_KEY, AUTHOR_PLACEHOLDER, AppInfoStore};
use crate::llm::ModelRegistry;
use crate::repository::agent::AgentRepository;
use crate::service::resolver::AgentResolver;
use crate::tools::{RemoteToolLoader, StaticToolProvider, ToolSet};
use crate::usage::{UsageStore, UsageTracker};

/// What a turn produced.
pub enum TurnResponse {
    /// Answered without the model.
    Author { chat_id: String, message: ChatMessage },
    /// Streamed model output. The last item is `Finish` or an error.
    Stream {
        chat_id: String,
        events: TurnEventStream,
    },
}

/// Collaborators of the orchestrator, grouped for construction.
pub struct OrchestratorParts<U, M, A, K, R>
where
    U: UsageStore,
    M: MessageRepository,
    A: AgentRepository,
{
    pub models: Arc<ModelRegistry>,
    pub usage: UsageTracker<U>,
    pub logger: Arc<MessageLogger<M>>,
    pub agents: AgentResolver<A>,
    pub app_info: Arc<K>,
    pub remote_tools: Arc<R>,
    pub static_tools: Arc<dyn StaticToolProvider>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub config: ChatConfig,
}

pub struct ChatOrchestrator<U, M, A, K, R>
where
    U: UsageStore,
    M: MessageRepository,
    A: AgentRepository,
    K: AppInfoStore,
    R: RemoteToolLoader,
{
    models: Arc<ModelRegistry>,
    usage: UsageTracker<U>,
    logger: Arc<MessageLogger<M>>,
    agents: AgentResolver<A>,
    app_info: Arc<K>,
    remote_tools: Arc<R>,
    static_tools: Arc<dyn StaticToolProvider>,
    classifier: Arc<dyn IntentClassifier>,
    config: ChatConfig,
}

impl<U, M, A, K, R> ChatOrchestrator<U, M, A, K, R>
where
    U: UsageStore,
    M: MessageRepository + 'static,
    A: AgentRepository,
    K: AppInfoStore,
    R: RemoteToolLoader,
{
    pub fn new(parts: OrchestratorParts<U, M, A, K, R>) -> Self {
        Self {
            models: parts.models,
            usage: parts.usage,
            logger: parts.logger,
            agents: parts.agents,
            app_info: parts.app_info,
            remote_tools: parts.remote_tools,
            static_tools: parts.static_tools,
            classifier: parts.classifier,
            config: parts.config,
        }
    }

    /// Run one turn. Errors returned here happen before any output exists;
    /// later failures arrive as the final item of the event stream.
    pub async fn handle_turn(
        &self,
        turn: ChatTurn,
        cancel: CancellationToken,
    ) -> Result<TurnResponse, ChatError> {
        if let Some(message) = self.author_reply(&turn).await {
            info!(chat_id = %turn.chat_id, "answered author question");
            return Ok(TurnResponse::Author {
                chat_id: turn.chat_id,
                message,
            });
        }

        let model = self
            .models
            .get(&turn.model)
            .ok_or_else(|| ChatError::ModelNotFound(turn.model.clone()))?;
        let provider = model
            .create_provider()
            .map_err(|e| ChatError::Provider(e.to_string()))?;

        self.usage
            .check_and_track(&turn.user_id, &turn.model, turn.is_authenticated)
            .await?;

        if let Some(message) = turn.trailing_user_message() {
            self.logger
                .log_user_message(&turn.chat_id, &turn.user_id, message, &turn.model)
                .await;
        }

        let agent = self.agents.load_agent(turn.agent_id.as_deref()).await?;
        let tools = self.load_tools(agent.as_ref(), &turn.user_id).await?;

        let tools_active = !tools.is_empty() && model.config.tools;
        if !tools.is_empty() && !tools_active {
            warn!(model = %turn.model, "model does not support tools, calling without them");
        }
        let tools = if tools_active { tools } else { ToolSet::new() };

        let cleaned = clean_messages(&turn.messages, tools_active);
        let system = self.system_prompt(agent.as_ref(), turn.system_prompt.as_deref());
        debug!(
            chat_id = %turn.chat_id,
            model = %turn.model,
            messages = cleaned.len(),
            tools = tools.len(),
            "starting model stream"
        );

        let model_turn = ModelTurn {
            provider,
            model: turn.model.clone(),
            system,
            messages: to_llm_messages(&cleaned),
            tools,
            max_steps: if tools_active { self.config.max_tool_steps } else { 1 },
        };

        let logger = Arc::clone(&self.logger);
        let chat_id = turn.chat_id.clone();
        let user_id = turn.user_id;
        let model_id = turn.model;
        let on_finish = move |outcome: parley_types::chat::StreamOutcome| {
            tokio::spawn(async move {
                logger
                    .store_assistant_messages(&chat_id, &user_id, &model_id, &outcome.messages)
                    .await;
            });
        };

        Ok(TurnResponse::Stream {
            chat_id: turn.chat_id,
            events: stream_model_turn(model_turn, cancel, on_finish),
        })
    }

    async fn author_reply(&self, turn: &ChatTurn) -> Option<ChatMessage> {
        let latest = turn.latest_user_message()?;
        if self.classifier.classify(&latest.text()) != Some(Intent::AuthorQuestion) {
            return None;
        }

        let author = match self.app_info.get(AUTHOR_KEY).await {
            Ok(Some(author)) if !author.trim().is_empty() => author,
            Ok(_) => AUTHOR_PLACEHOLDER.to_string(),
            Err(e) => {
                warn!(error = %e, "failed to read author, using placeholder");
                AUTHOR_PLACEHOLDER.to_string()
            }
        };
        Some(ChatMessage::assistant(format!(
            "Cette application a été créée par {author}."
        )))
    }

    async fn load_tools(
        &self,
        agent: Option<&AgentConfig>,
        user_id: &str,
    ) -> Result<ToolSet, ChatError> {
        let Some(agent) = agent else {
            return Ok(ToolSet::new());
        };

        if self
            .config
            .special_usage_policy
            .applies(agent.has_static_tools(), agent.has_remote_tools())
        {
            self.usage.track_special_agent_usage(user_id).await?;
        }

        match &agent.mcp_config {
            Some(mcp) => {
                let tools = self
                    .remote_tools
                    .load_tools(mcp)
                    .await
                    .map_err(|e| ChatError::ToolDiscovery(e.to_string()))?;
                debug!(server = %mcp.server, tools = tools.len(), "remote tools loaded");
                Ok(tools)
            }
            None => Ok(self.static_tools.bind(&agent.tools)),
        }
    }

    /// Agent prompt, then the caller's, then the configured default.
    fn system_prompt(&self, agent: Option<&AgentConfig>, requested: Option<&str>) -> String {
        agent
            .map(|a| a.system_prompt.as_str())
            .filter(|p| !p.trim().is_empty())
            .or(requested.filter(|p| !p.trim().is_empty()))
            .unwrap_or(&self.config.default_system_prompt)
            .to_string()
    }
}
