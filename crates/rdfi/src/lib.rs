//! RDFI inbound pipeline.
//!
//! A leader-elected periodic scheduler that, per shard, downloads newly
//! arrived ACH files from the shard's transport agent, persists them to the
//! audit trail, and dispatches each file through the registered processors,
//! which classify and re-emit typed events onto the bus.

pub mod alerting;
pub mod audit;
pub mod cleanup;
pub mod downloader;
pub mod files;
pub mod leader;
pub mod processors;
pub mod scheduler;

pub use alerting::{Alerter, Alerters};
pub use audit::{AuditSaver, AuditStorage};
pub use downloader::{DownloadBundle, Downloader};
pub use files::{process_dir, File};
pub use leader::{leader_key, Lease, LockBackend, MemoryLock};
pub use processors::{setup_processors, FileProcessor, Processors};
pub use scheduler::{PeriodicScheduler, Shutdown, TickSummary, Trigger};
