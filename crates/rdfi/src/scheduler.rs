//! The RDFI periodic scheduler.
//!
//! One control task owns the dispatch loop: an interval ticker, a
//! capacity-1 manual trigger carrying a reply channel, and the shutdown
//! signal. Shards are processed sequentially within a tick; cross-process
//! exclusion comes from the per-shard leader lease.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use gateway_core::{
    Error, ErrorsConfig, InboundConfig, OdfiConfig, Result, Shard, ShardingConfig,
};
use gateway_telemetry::metrics;
use gateway_transport::AgentRegistry;

use crate::alerting::Alerters;
use crate::audit::AuditSaver;
use crate::cleanup;
use crate::downloader::Downloader;
use crate::files::process_dir;
use crate::leader::{leader_key, LockBackend};
use crate::processors::Processors;

/// Outcome of one pass over the configured shard list.
///
/// Per-shard failures land in `errors` (and fan out to the alerters); the
/// pass itself always completes so a misbehaving shard cannot starve its
/// siblings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    /// Shards ticked to completion.
    pub processed: Vec<String>,
    /// Shards skipped: leadership held elsewhere, or not in the shard table.
    pub skipped: Vec<String>,
    /// Per-shard failures.
    pub errors: Vec<String>,
}

impl TickSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

struct TickRequest {
    reply: oneshot::Sender<TickSummary>,
}

/// Cloneable handle posting manual ticks into the scheduler loop.
#[derive(Clone)]
pub struct Trigger {
    tx: mpsc::Sender<TickRequest>,
}

impl Trigger {
    /// Requests one tick-all and awaits the aggregate outcome.
    ///
    /// The channel has capacity one: a second request while one is
    /// pending observes `TriggerBusy`, and `ShuttingDown` once the
    /// scheduler has stopped.
    pub async fn trigger(&self) -> Result<TickSummary> {
        let (reply, outcome) = oneshot::channel();
        self.tx
            .try_send(TickRequest { reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::TriggerBusy,
                mpsc::error::TrySendError::Closed(_) => Error::ShuttingDown,
            })?;
        outcome.await.map_err(|_| Error::ShuttingDown)
    }
}

/// Cloneable shutdown handle. Idempotent; safe before `start`.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

pub struct PeriodicScheduler {
    odfi: OdfiConfig,
    sharding: ShardingConfig,
    agents: AgentRegistry,

    downloader: Downloader,
    processors: Processors,

    lock: Arc<dyn LockBackend>,
    lock_ttl: Duration,
    alerters: Alerters,

    trigger_tx: mpsc::Sender<TickRequest>,
    trigger_rx: mpsc::Receiver<TickRequest>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PeriodicScheduler {
    pub fn new(
        inbound: &InboundConfig,
        sharding: ShardingConfig,
        agents: AgentRegistry,
        processors: Processors,
        lock: Arc<dyn LockBackend>,
        lock_ttl: Duration,
        errors: &ErrorsConfig,
    ) -> Result<Self> {
        let odfi = inbound
            .odfi
            .clone()
            .ok_or_else(|| Error::config("missing Inbound ODFI config"))?;

        let downloader = Downloader::new(&odfi.storage)?;
        let alerters = Alerters::from_config(errors)?;

        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            odfi,
            sharding,
            agents,
            downloader,
            processors,
            lock,
            lock_ttl,
            alerters,
            trigger_tx,
            trigger_rx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    /// Adds a sink beyond the configured ones. Tests use this to capture
    /// alerts.
    pub fn register_alerter(&mut self, alerter: Box<dyn crate::alerting::Alerter>) {
        self.alerters.push(alerter);
    }

    /// Handle for the admin trigger endpoint.
    pub fn trigger(&self) -> Trigger {
        Trigger {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Handle used to stop the dispatch loop.
    pub fn shutdown_handle(&self) -> Shutdown {
        Shutdown {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Runs the dispatch loop until shutdown.
    pub async fn start(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.odfi.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The interval fires immediately; swallow that so the schedule
        // starts one period out, matching a plain ticker.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_all().await;
                }
                request = self.trigger_rx.recv() => {
                    let Some(request) = request else { return Ok(()) };
                    let summary = self.tick_all().await;
                    let _ = request.reply.send(summary);
                }
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("rdfi: scheduler shutdown");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One pass over the configured shard list, in configuration order.
    async fn tick_all(&mut self) -> TickSummary {
        metrics().ticks_started.inc();
        let mut summary = TickSummary::default();

        for shard_name in self.odfi.shard_names.clone() {
            // Shutdown is observed between shards, never mid-file.
            if *self.shutdown_rx.borrow() {
                break;
            }

            let Some(shard) = self.sharding.find(&shard_name).cloned() else {
                warn!(shard = %shard_name, "unable to find shard");
                summary.skipped.push(shard_name);
                continue;
            };

            let key = leader_key(&shard_name);
            debug!(key = %key, "attempting to acquire ODFI leadership");

            match self.lock.acquire(&key, self.lock_ttl).await {
                Err(e) if e.is_lock_unavailable() => {
                    // Normal: another instance holds this shard.
                    info!(shard = %shard_name, "skipping ODFI processing: {e}");
                    metrics().leadership_contended.inc();
                    summary.skipped.push(shard_name);
                }
                Err(e) => {
                    warn!(shard = %shard_name, error = %e, "failed acquiring leadership");
                    self.alert_on_error(&e).await;
                    summary.errors.push(format!("{shard_name}: {e}"));
                }
                Ok(lease) => {
                    info!(shard = %shard.name, "starting rdfi periodic processing");
                    let start = Instant::now();
                    let result = self.tick(&shard).await;
                    metrics()
                        .tick_latency_ms
                        .observe(start.elapsed().as_millis() as u64);

                    match result {
                        Ok(()) => {
                            metrics().ticks_completed.inc();
                            info!(shard = %shard.name, "finished rdfi periodic processing");
                            summary.processed.push(shard_name);
                        }
                        Err(e) => {
                            metrics().tick_errors.inc();
                            warn!(shard = %shard.name, error = %e, "error with rdfi periodic processing");
                            self.alert_on_error(&e).await;
                            summary.errors.push(format!("{shard_name}: {e}"));
                        }
                    }

                    if let Err(e) = lease.release().await {
                        warn!(key = %key, error = %e, "failed releasing leadership");
                    }
                }
            }
        }

        summary
    }

    /// Download → audit + classify + dispatch → cleanup, for one shard.
    async fn tick(&self, shard: &Shard) -> Result<()> {
        let agent = self.agents.find(&shard.upload_agent)?;
        info!(hostname = agent.hostname(), "start retrieving and processing of inbound files");

        let bundle = self.downloader.copy_files_from_remote(&agent).await?;
        let audit_saver = AuditSaver::new(&self.odfi.audit, agent.hostname())?;

        let mut failures = bundle.failures.clone();
        if let Err(e) = process_dir(&bundle.dir, &audit_saver, &self.processors).await {
            match e {
                Error::Processor(errs) => failures.extend(errs),
                other => failures.push(other.to_string()),
            }
        }

        // The bundle is only destroyed at the end of a successful tick;
        // failures leave both sides in place for the next attempt.
        if !failures.is_empty() {
            return Err(Error::Processor(failures));
        }

        let storage = &self.odfi.storage;
        let mut deleted = HashSet::new();
        if !storage.keep_remote_files {
            deleted = cleanup::delete_remote_files(&agent, bundle.files.iter()).await?;
        }
        if storage.remove_zero_byte_files {
            let zero_byte: Vec<_> = bundle
                .zero_byte_files()
                .filter(|f| !deleted.contains(&f.remote_path))
                .collect();
            cleanup::delete_remote_files(&agent, zero_byte.into_iter()).await?;
        }
        if storage.cleanup_local_directory {
            cleanup::delete_local_directory(&bundle).await?;
        } else {
            cleanup::delete_empty_dirs(&agent, &bundle).await?;
        }
        Ok(())
    }

    async fn alert_on_error(&self, err: &Error) {
        self.alerters.alert_error(err).await;
    }
}
