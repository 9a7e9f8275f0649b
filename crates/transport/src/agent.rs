//! The `Agent` trait and the registry resolving shard → agent.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use gateway_core::{Error, Result, UploadConfig};

use crate::filesystem::FilesystemAgent;

/// A remote file source.
///
/// Paths are relative to the agent's transport root, so the staged local
/// layout mirrors the remote one and path-based classification
/// (`reconciliation/...`) keeps working.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier; prefixes the audit trail.
    fn hostname(&self) -> &str;

    /// Paths listed for inbound files.
    fn inbound_paths(&self) -> &[String];

    /// Lists every regular file under `path`, recursively.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Reads the full contents of a remote file.
    async fn retrieve(&self, path: &str) -> Result<Vec<u8>>;

    /// Deletes a remote file.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Deletes a remote directory if (and only if) it is empty.
    async fn delete_empty_dir(&self, path: &str) -> Result<()>;
}

/// Registry of configured upload agents, keyed by agent name.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Builds the registry from the upload section of the config.
    pub fn from_config(cfg: &UploadConfig) -> Self {
        let mut agents: HashMap<String, Arc<dyn Agent>> = HashMap::new();
        for agent in &cfg.agents {
            agents.insert(agent.name.clone(), Arc::new(FilesystemAgent::new(agent)));
        }
        Self { agents }
    }

    /// Registers an agent under a name. Used by tests to inject mocks.
    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        self.agents.insert(name.into(), agent);
    }

    /// Resolves an agent by the shard table's `upload_agent` handle.
    pub fn find(&self, name: &str) -> Result<Arc<dyn Agent>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("unknown upload agent: {name}")))
    }
}
