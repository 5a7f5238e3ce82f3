//! Application state wiring all services together.
//!
//! Services are generic over repository traits; AppState pins them to the
//! SQLite implementations and the MCP tool loader.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::intent::{Intent, PatternIntentClassifier};
use parley_core::chat::logger::MessageLogger;
use parley_core::chat::{ChatOrchestrator, OrchestratorParts};
use parley_core::llm::ModelRegistry;
use parley_core::service::agent::AgentService;
use parley_core::service::resolver::AgentResolver;
use parley_core::service::workspace::WorkspaceService;
use parley_core::usage::UsageTracker;
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::llm::build_model_registry;
use parley_infra::mcp::McpToolLoader;
use parley_infra::sqlite::agent::SqliteAgentRepository;
use parley_infra::sqlite::app_info::SqliteAppInfoStore;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_infra::sqlite::usage::SqliteUsageStore;
use parley_infra::sqlite::workspace::SqliteWorkspaceRepository;
use parley_infra::tools::BuiltinToolProvider;
use parley_types::config::GlobalConfig;

pub type ConcreteOrchestrator = ChatOrchestrator<
    SqliteUsageStore,
    SqliteMessageRepository,
    SqliteAgentRepository,
    SqliteAppInfoStore,
    McpToolLoader,
>;

pub type ConcreteAgentService = AgentService<SqliteAgentRepository, SqliteWorkspaceRepository>;

pub type ConcreteWorkspaceService = WorkspaceService<SqliteWorkspaceRepository>;

/// Shared application state, used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub agent_service: Arc<ConcreteAgentService>,
    pub workspace_service: Arc<ConcreteWorkspaceService>,
    pub app_info: Arc<SqliteAppInfoStore>,
    pub models: Arc<ModelRegistry>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolve the data directory, load `config.toml`, open the database and
    /// register the built-in models.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let models = build_model_registry(&config.providers.google);

        Self::build(db_pool, config, models, data_dir)
    }

    /// Wire services over an open pool.
    pub fn build(
        db_pool: DatabasePool,
        config: GlobalConfig,
        models: ModelRegistry,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let models = Arc::new(models);
        let agent_repo = Arc::new(SqliteAgentRepository::new(db_pool.clone()));
        let workspace_repo = Arc::new(SqliteWorkspaceRepository::new(db_pool.clone()));
        let app_info = Arc::new(SqliteAppInfoStore::new(db_pool.clone()));

        let mut classifier = PatternIntentClassifier::with_defaults()?;
        for pattern in &config.chat.extra_author_patterns {
            classifier.add_pattern(Intent::AuthorQuestion, "custom", pattern)?;
        }

        let orchestrator = ChatOrchestrator::new(OrchestratorParts {
            models: Arc::clone(&models),
            usage: UsageTracker::new(
                Arc::new(SqliteUsageStore::new(db_pool.clone())),
                config.usage.clone(),
            ),
            logger: Arc::new(MessageLogger::new(Arc::new(SqliteMessageRepository::new(
                db_pool.clone(),
            )))),
            agents: AgentResolver::new(Arc::clone(&agent_repo)),
            app_info: Arc::clone(&app_info),
            remote_tools: Arc::new(McpToolLoader::new()),
            static_tools: Arc::new(BuiltinToolProvider::new(config.providers.exa.clone())),
            classifier: Arc::new(classifier),
            config: config.chat.clone(),
        });

        let agent_service = AgentService::new(
            agent_repo,
            Arc::clone(&workspace_repo),
            config.agents.curated_slugs.clone(),
        );
        let workspace_service = WorkspaceService::new(workspace_repo);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            agent_service: Arc::new(agent_service),
            workspace_service: Arc::new(workspace_service),
            app_info,
            models,
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
