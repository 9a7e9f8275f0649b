//! Returned-entry processor.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gateway_core::{events, Event, ProcessorConfig, Result};
use gateway_stream::Publisher;
use gateway_telemetry::metrics;

use crate::files::File;
use crate::processors::{send_event, FileProcessor};

pub struct ReturnEmitter {
    cfg: ProcessorConfig,
    publisher: Arc<dyn Publisher>,
}

impl ReturnEmitter {
    pub fn new(cfg: ProcessorConfig, publisher: Arc<dyn Publisher>) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        Some(Self { cfg, publisher })
    }
}

fn is_return_file(file: &ach::File) -> bool {
    file.batches.iter().any(|b| b.has_returns())
}

#[async_trait]
impl FileProcessor for ReturnEmitter {
    fn kind(&self) -> &'static str {
        "return"
    }

    async fn handle(&self, file: &File) -> Result<()> {
        let Some(ach_file) = file.ach_file.as_ref() else {
            return Ok(());
        };
        if !is_return_file(ach_file) {
            return Ok(());
        }
        if !self.cfg.matches_path(&file.path_str()) {
            return Ok(()); // skip the file
        }

        let origin = ach_file.header.immediate_origin.as_str();
        let destination = ach_file.header.immediate_destination.as_str();

        let mut returns = Vec::new();
        for batch in &ach_file.batches {
            let returned: Vec<_> = batch
                .entries
                .iter()
                .filter(|e| e.addenda99.is_some())
                .cloned()
                .collect();
            if returned.is_empty() {
                continue;
            }

            for entry in &returned {
                // Guarded by the filter above.
                if let Some(addenda) = entry.addenda99.as_ref() {
                    metrics()
                        .return_entries_processed
                        .inc(&[origin, destination, &addenda.return_code]);
                    debug!(
                        origin,
                        destination,
                        code = %addenda.return_code,
                        trace = %entry.trace_number,
                        "rdfi: returned entry"
                    );
                }
            }

            returns.push(events::Batch {
                header: batch.header.clone(),
                entries: returned,
            });
        }

        info!(origin, destination, batches = returns.len(), "inbound: return file");

        let event = Event::ReturnFile(events::ReturnFile {
            filename: file.filename(),
            file: ach_file.clone(),
            returns,
        });
        send_event(&self.publisher, event).await;
        Ok(())
    }
}
