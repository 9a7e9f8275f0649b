//! Prenotification processor.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gateway_core::{events, Event, ProcessorConfig, Result};
use gateway_stream::Publisher;
use gateway_telemetry::metrics;

use crate::files::File;
use crate::processors::{send_event, FileProcessor};

pub struct PrenoteEmitter {
    cfg: ProcessorConfig,
    publisher: Arc<dyn Publisher>,
}

impl PrenoteEmitter {
    pub fn new(cfg: ProcessorConfig, publisher: Arc<dyn Publisher>) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        Some(Self { cfg, publisher })
    }
}

fn is_prenote_file(file: &ach::File) -> bool {
    file.batches
        .iter()
        .any(|b| b.entries.iter().any(|e| e.is_prenote()))
}

#[async_trait]
impl FileProcessor for PrenoteEmitter {
    fn kind(&self) -> &'static str {
        "prenote"
    }

    async fn handle(&self, file: &File) -> Result<()> {
        let Some(ach_file) = file.ach_file.as_ref() else {
            return Ok(());
        };
        if !is_prenote_file(ach_file) {
            return Ok(());
        }
        if !self.cfg.matches_path(&file.path_str()) {
            return Ok(()); // skip the file
        }

        let origin = ach_file.header.immediate_origin.as_str();
        let destination = ach_file.header.immediate_destination.as_str();

        let mut batches = Vec::new();
        for batch in &ach_file.batches {
            let prenotes: Vec<_> = batch
                .entries
                .iter()
                .filter(|e| e.is_prenote())
                .cloned()
                .collect();
            if prenotes.is_empty() {
                continue;
            }

            for entry in &prenotes {
                metrics()
                    .prenote_entries_processed
                    .inc(&[origin, destination]);
                debug!(
                    origin,
                    destination,
                    transaction_code = entry.transaction_code,
                    trace = %entry.trace_number,
                    "rdfi: prenote entry"
                );
            }

            batches.push(events::Batch {
                header: batch.header.clone(),
                entries: prenotes,
            });
        }

        info!(origin, destination, batches = batches.len(), "inbound: prenote file");

        let event = Event::PrenoteFile(events::PrenoteFile {
            filename: file.filename(),
            file: ach_file.clone(),
            batches,
        });
        send_event(&self.publisher, event).await;
        Ok(())
    }
}
