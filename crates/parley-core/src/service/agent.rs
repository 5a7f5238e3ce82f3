//! Agent management service.
//!
//! Creates agents (validation, slug generation, the git-mcp repository
//! shortcut) and lists the agents visible to a user.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use parley_types::agent::{
    Agent, AgentListing, CreateAgentRequest, DEFAULT_AGENT_MAX_STEPS, McpConfig, slugify,
};
use parley_types::error::AgentError;

use crate::repository::agent::{AgentRepository, WorkspaceScope};
use crate::repository::workspace::WorkspaceRepository;
use crate::tools::catalog;

const SLUG_SUFFIX_LEN: usize = 6;
const GIT_MCP_BASE: &str = "https://gitmcp.io";
static REPOSITORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+$").expect("repository pattern is valid")
});

const REPOSITORY_EXAMPLE_INPUTS: &[&str] = &[
    "what does this repository do?",
    "how to install the project?",
    "how can I use this project?",
    "where is the main code located?",
];

pub struct AgentService<A: AgentRepository, W: WorkspaceRepository> {
    agents: Arc<A>,
    workspaces: Arc<W>,
    curated_slugs: Vec<String>,
}

impl<A: AgentRepository, W: WorkspaceRepository> AgentService<A, W> {
    pub fn new(agents: Arc<A>, workspaces: Arc<W>, curated_slugs: Vec<String>) -> Self {
        Self {
            agents,
            workspaces,
            curated_slugs,
        }
    }

    /// Create an agent owned by `creator_id` inside one of their workspaces.
    pub async fn create_agent(
        &self,
        creator_id: &str,
        request: CreateAgentRequest,
    ) -> Result<Agent, AgentError> {
        let repository = match non_blank(request.repository) {
            Some(repo) => Some(parse_repository(&repo)?),
            None => None,
        };

        let name = non_blank(request.name);
        let description = non_blank(request.description);
        let system_prompt = non_blank(request.system_prompt).or_else(|| {
            repository
                .as_ref()
                .map(|(owner, repo)| repository_system_prompt(owner, repo))
        });
        let workspace_id = non_blank(request.workspace_id);

        let (Some(name), Some(description), Some(system_prompt), Some(workspace_id)) =
            (name, description, system_prompt, workspace_id)
        else {
            return Err(AgentError::Validation("Missing required fields".to_string()));
        };

        let workspace_id = Uuid::parse_str(&workspace_id)
            .map_err(|_| AgentError::Validation("Invalid workspace_id".to_string()))?;
        let workspace = self
            .workspaces
            .get_by_id(&workspace_id)
            .await
            .map_err(|e| AgentError::Storage(e.to_string()))?;
        if workspace.is_none_or(|w| w.creator_id != creator_id) {
            return Err(AgentError::WorkspaceNotFound);
        }

        let tools = request.tools.unwrap_or_default();
        if let Some(unknown) = tools.iter().find(|id| catalog::lookup(id).is_none()) {
            return Err(AgentError::Validation(format!("Unknown tool '{unknown}'")));
        }

        let slug = match non_blank(request.slug) {
            Some(requested) => {
                let slug = slugify(&requested);
                if slug.is_empty() {
                    return Err(AgentError::Validation("Invalid slug".to_string()));
                }
                if self.agents.get_by_slug(&slug).await?.is_some() {
                    return Err(AgentError::SlugConflict(slug));
                }
                slug
            }
            None => generate_slug(&name),
        };

        let (mcp_config, example_inputs) = match &repository {
            Some((owner, repo)) => (
                Some(McpConfig::new(format!("{GIT_MCP_BASE}/{owner}/{repo}"))),
                request.example_inputs.unwrap_or_else(|| {
                    REPOSITORY_EXAMPLE_INPUTS.iter().map(|s| s.to_string()).collect()
                }),
            ),
            None => (request.mcp_config, request.example_inputs.unwrap_or_default()),
        };

        let agent = Agent {
            id: Uuid::now_v7(),
            slug,
            name,
            description,
            avatar_url: non_blank(request.avatar_url),
            system_prompt,
            model_preference: non_blank(request.model_preference),
            mcp_config,
            example_inputs,
            tools,
            remixable: request.remixable.unwrap_or(false),
            is_public: request.is_public.unwrap_or(true),
            max_steps: request.max_steps.unwrap_or(DEFAULT_AGENT_MAX_STEPS),
            creator_id: creator_id.to_string(),
            workspace_id: Some(workspace_id),
            created_at: Utc::now(),
        };

        let created = self.agents.create(&agent).await?;
        info!(agent_id = %created.id, slug = %created.slug, creator_id, "agent created");
        Ok(created)
    }

    /// Curated agents plus the user's own, either in `workspace_id` or, when
    /// absent, those not filed under any workspace.
    pub async fn list_agents(
        &self,
        user_id: Option<&str>,
        workspace_id: Option<Uuid>,
    ) -> Result<AgentListing, AgentError> {
        let curated = self.agents.list_by_slugs(&self.curated_slugs).await?;

        let user_agents = match user_id {
            Some(user_id) => {
                let scope = workspace_id.map_or(WorkspaceScope::Unassigned, WorkspaceScope::In);
                self.agents.list_by_creator(user_id, scope).await?
            }
            None => Vec::new(),
        };

        Ok(AgentListing {
            curated,
            user_agents,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_repository(value: &str) -> Result<(String, String), AgentError> {
    let invalid = || AgentError::Validation("Invalid repository format. Use owner/repo".to_string());
    if !REPOSITORY_PATTERN.is_match(value) {
        return Err(invalid());
    }
    let (owner, repo) = value.split_once('/').ok_or_else(invalid)?;
    Ok((owner.to_string(), repo.to_string()))
}

/// `{slugified-name}-{random suffix}`.
fn generate_slug(name: &str) -> String {
    let base = slugify(name);
    let base = if base.is_empty() { "agent".to_string() } else { base };
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{base}-{suffix}")
}

fn repository_system_prompt(owner: &str, repo: &str) -> String {
    format!(
        "You are a helpful GitHub assistant focused on the repository: {owner}/{repo}.

Use the available tools below to answer any questions. Always prefer using tools over guessing.

Tools available for this repository:
- `fetch_{repo}_documentation`: Fetch the entire documentation file. Use this first when asked about general concepts in {owner}/{repo}.
- `search_{repo}_documentation`: Semantically search the documentation. Use this for specific questions.
- `search_{repo}_code`: Search code with exact matches using the GitHub API. Use when asked about file contents or code examples.
- `fetch_generic_url_content`: Fetch absolute URLs when referenced in the docs or needed for context.

Never invent answers. Use tools and return what you find."
    )
}
