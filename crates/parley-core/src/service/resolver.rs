//! Agent resolver: turns a requested agent id or slug into the
//! configuration used for one turn.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use parley_types::agent::AgentConfig;
use parley_types::error::ChatError;

use crate::repository::agent::AgentRepository;

pub struct AgentResolver<A: AgentRepository> {
    repo: Arc<A>,
}

impl<A: AgentRepository> AgentResolver<A> {
    pub fn new(repo: Arc<A>) -> Self {
        Self { repo }
    }

    /// `Ok(None)` when no agent was requested. A requested agent that does
    /// not exist is `AgentNotFound`.
    pub async fn load_agent(&self, agent_id: Option<&str>) -> Result<Option<AgentConfig>, ChatError> {
        let Some(agent_id) = agent_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let by_id = match Uuid::parse_str(agent_id) {
            Ok(id) => self.repo.get_by_id(&id).await?,
            Err(_) => None,
        };
        let agent = match by_id {
            Some(agent) => agent,
            None => self
                .repo
                .get_by_slug(agent_id)
                .await?
                .ok_or_else(|| ChatError::AgentNotFound(agent_id.to_string()))?,
        };

        debug!(agent_id = %agent.id, slug = %agent.slug, tools = agent.tools.len(), "agent resolved");
        Ok(Some(agent.into()))
    }
}
