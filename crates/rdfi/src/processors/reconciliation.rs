//! Credit reconciliation processor.
//!
//! The filepath is the best signal for treating a file as a recon file,
//! so this processor is inert unless a path matcher is configured.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gateway_core::{events, Error, Event, ProcessorConfig, Result};
use gateway_stream::Publisher;
use gateway_telemetry::metrics;

use crate::files::File;
use crate::processors::{send_event, FileProcessor};

pub struct ReconciliationEmitter {
    cfg: ProcessorConfig,
    publisher: Arc<dyn Publisher>,
}

impl ReconciliationEmitter {
    pub fn new(cfg: ProcessorConfig, publisher: Arc<dyn Publisher>) -> Option<Self> {
        if !cfg.enabled || cfg.path_matcher.is_empty() {
            return None;
        }
        Some(Self { cfg, publisher })
    }

    fn is_reconciliation_file(&self, file: &File) -> bool {
        file.path_str()
            .to_lowercase()
            .contains(&self.cfg.path_matcher.to_lowercase())
    }
}

#[async_trait]
impl FileProcessor for ReconciliationEmitter {
    fn kind(&self) -> &'static str {
        "reconciliation"
    }

    async fn handle(&self, file: &File) -> Result<()> {
        if !self.is_reconciliation_file(file) {
            return Ok(()); // skip the file
        }
        let Some(ach_file) = file.ach_file.as_ref() else {
            // A file dropped in the reconciliation path that we could not
            // parse is a real problem, not a skip.
            return Err(Error::internal(format!(
                "reconciliation file {} has no parsed ACH content",
                file.path_str()
            )));
        };

        let origin = ach_file.header.immediate_origin.as_str();
        let destination = ach_file.header.immediate_destination.as_str();
        metrics()
            .reconciliation_files_processed
            .inc(&[origin, destination]);
        info!(filepath = %file.path_str(), "rdfi: processing reconciliation file");

        let mut reconciliations = Vec::new();
        for batch in &ach_file.batches {
            for entry in &batch.entries {
                debug!(trace = %entry.trace_number, "rdfi: received reconciliation entry");
            }
            if !batch.entries.is_empty() {
                reconciliations.push(events::Batch {
                    header: batch.header.clone(),
                    entries: batch.entries.clone(),
                });
            }
        }

        if !reconciliations.is_empty() {
            let event = Event::ReconciliationFile(events::ReconciliationFile {
                filename: file.filename(),
                file: ach_file.clone(),
                reconciliations,
            });
            send_event(&self.publisher, event).await;
        }
        Ok(())
    }
}
