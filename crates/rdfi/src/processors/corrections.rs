//! Notification of Change (COR/NOC) processor.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gateway_core::{events, Event, ProcessorConfig, Result};
use gateway_stream::Publisher;
use gateway_telemetry::metrics;

use crate::files::File;
use crate::processors::{send_event, FileProcessor};

pub struct CorrectionEmitter {
    cfg: ProcessorConfig,
    publisher: Arc<dyn Publisher>,
}

impl CorrectionEmitter {
    pub fn new(cfg: ProcessorConfig, publisher: Arc<dyn Publisher>) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        Some(Self { cfg, publisher })
    }
}

fn is_correction_file(file: &ach::File) -> bool {
    // A file is a correction only when it actually carries NoC batches.
    !file.notification_of_change.is_empty()
}

#[async_trait]
impl FileProcessor for CorrectionEmitter {
    fn kind(&self) -> &'static str {
        "correction"
    }

    async fn handle(&self, file: &File) -> Result<()> {
        let Some(ach_file) = file.ach_file.as_ref() else {
            return Ok(());
        };
        if !is_correction_file(ach_file) {
            return Ok(());
        }
        if !self.cfg.matches_path(&file.path_str()) {
            return Ok(()); // skip the file
        }

        let origin = ach_file.header.immediate_origin.as_str();
        let destination = ach_file.header.immediate_destination.as_str();
        info!(
            origin,
            destination,
            batches = ach_file.notification_of_change.len(),
            "inbound: correction file"
        );

        let mut corrections = Vec::new();
        for batch in &ach_file.notification_of_change {
            corrections.push(events::Batch {
                header: batch.header.clone(),
                entries: batch.entries.clone(),
            });

            for entry in &batch.entries {
                let Some(addenda) = entry.addenda98.as_ref() else {
                    continue;
                };
                metrics()
                    .correction_codes_processed
                    .inc(&[origin, destination, &addenda.change_code]);

                debug!(
                    origin,
                    destination,
                    code = %addenda.change_code,
                    trace = %entry.trace_number,
                    "rdfi: correction entry"
                );
            }
        }

        let event = Event::CorrectionFile(events::CorrectionFile {
            filename: file.filename(),
            file: ach_file.clone(),
            corrections,
        });
        send_event(&self.publisher, event).await;
        Ok(())
    }
}
