//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `parley-core` using sqlx with split
//! read/write pools. List-valued and structured columns are JSON text.

use chrono::{DateTime, Utc};
use parley_core::repository::agent::{AgentRepository, WorkspaceScope};
use parley_types::agent::{Agent, McpConfig};
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `AgentRepository`.
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Agent.
struct AgentRow {
    id: String,
    slug: String,
    name: String,
    description: String,
    avatar_url: Option<String>,
    system_prompt: String,
    model_preference: Option<String>,
    mcp_config: Option<String>,
    example_inputs: String,
    tools: String,
    remixable: bool,
    is_public: bool,
    max_steps: i64,
    creator_id: String,
    workspace_id: Option<String>,
    created_at: String,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            avatar_url: row.try_get("avatar_url")?,
            system_prompt: row.try_get("system_prompt")?,
            model_preference: row.try_get("model_preference")?,
            mcp_config: row.try_get("mcp_config")?,
            example_inputs: row.try_get("example_inputs")?,
            tools: row.try_get("tools")?,
            remixable: row.try_get("remixable")?,
            is_public: row.try_get("is_public")?,
            max_steps: row.try_get("max_steps")?,
            creator_id: row.try_get("creator_id")?,
            workspace_id: row.try_get("workspace_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_agent(self) -> Result<Agent, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid agent id: {e}")))?;
        let workspace_id = self
            .workspace_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid workspace_id: {e}")))?;
        let mcp_config: Option<McpConfig> = self
            .mcp_config
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid mcp_config JSON: {e}")))?;
        let example_inputs: Vec<String> = serde_json::from_str(&self.example_inputs)
            .map_err(|e| RepositoryError::Query(format!("invalid example_inputs JSON: {e}")))?;
        let tools: Vec<String> = serde_json::from_str(&self.tools)
            .map_err(|e| RepositoryError::Query(format!("invalid tools JSON: {e}")))?;

        Ok(Agent {
            id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            avatar_url: self.avatar_url,
            system_prompt: self.system_prompt,
            model_preference: self.model_preference,
            mcp_config,
            example_inputs,
            tools,
            remixable: self.remixable,
            is_public: self.is_public,
            max_steps: self.max_steps as u32,
            creator_id: self.creator_id,
            workspace_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn rows_to_agents(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Agent>, RepositoryError> {
    let mut agents = Vec::with_capacity(rows.len());
    for row in rows {
        let agent_row = AgentRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        agents.push(agent_row.into_agent()?);
    }
    Ok(agents)
}

impl SqliteAgentRepository {
    async fn fetch_one_where(&self, column: &str, value: String) -> Result<Option<Agent>, RepositoryError> {
        let sql = format!("SELECT * FROM agents WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let agent_row =
                    AgentRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(agent_row.into_agent()?))
            }
            None => Ok(None),
        }
    }
}

impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mcp_config = agent
            .mcp_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let example_inputs = serde_json::to_string(&agent.example_inputs)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let tools =
            serde_json::to_string(&agent.tools).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"INSERT INTO agents (id, slug, name, description, avatar_url, system_prompt, model_preference, mcp_config,
                                   example_inputs, tools, remixable, is_public, max_steps, creator_id, workspace_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(agent.id.to_string())
        .bind(&agent.slug)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.avatar_url)
        .bind(&agent.system_prompt)
        .bind(&agent.model_preference)
        .bind(&mcp_config)
        .bind(&example_inputs)
        .bind(&tools)
        .bind(agent.remixable)
        .bind(agent.is_public)
        .bind(i64::from(agent.max_steps))
        .bind(&agent.creator_id)
        .bind(agent.workspace_id.map(|id| id.to_string()))
        .bind(agent.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(agent.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(agent.slug.clone()))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Agent>, RepositoryError> {
        self.fetch_one_where("id", id.to_string()).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Agent>, RepositoryError> {
        self.fetch_one_where("slug", slug.to_string()).await
    }

    async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<Agent>, RepositoryError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; slugs.len()].join(", ");
        let sql = format!("SELECT * FROM agents WHERE slug IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for slug in slugs {
            query = query.bind(slug);
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut agents = rows_to_agents(&rows)?;
        agents.sort_by_key(|a| slugs.iter().position(|s| s == &a.slug));
        Ok(agents)
    }

    async fn list_by_creator(
        &self,
        creator_id: &str,
        scope: WorkspaceScope,
    ) -> Result<Vec<Agent>, RepositoryError> {
        let rows = match scope {
            WorkspaceScope::In(workspace_id) => {
                sqlx::query(
                    "SELECT * FROM agents WHERE creator_id = ? AND workspace_id = ? ORDER BY created_at DESC",
                )
                .bind(creator_id)
                .bind(workspace_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
            WorkspaceScope::Unassigned => {
                sqlx::query(
                    "SELECT * FROM agents WHERE creator_id = ? AND workspace_id IS NULL ORDER BY created_at DESC",
                )
                .bind(creator_id)
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_agents(&rows)
    }
}
