//! Transport agents: the seam between the gateway and remote file sources.

pub mod agent;
pub mod filesystem;

pub use agent::{Agent, AgentRegistry};
pub use filesystem::FilesystemAgent;
