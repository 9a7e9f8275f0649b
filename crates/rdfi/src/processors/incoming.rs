//! Catch-all processor for ordinary inbound files.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gateway_core::{events, Event, ProcessorConfig, Result};
use gateway_stream::Publisher;
use gateway_telemetry::metrics;

use crate::files::File;
use crate::processors::{send_event, FileProcessor};

pub struct IncomingEmitter {
    cfg: ProcessorConfig,
    publisher: Arc<dyn Publisher>,
}

impl IncomingEmitter {
    pub fn new(cfg: ProcessorConfig, publisher: Arc<dyn Publisher>) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        Some(Self { cfg, publisher })
    }
}

/// Ordinary inbound activity: at least one entry that is neither a
/// prenote nor carries correction/return addenda. NoC-only, return-only
/// and prenote-only files are left to their dedicated processors.
fn is_incoming_file(file: &ach::File) -> bool {
    file.batches.iter().any(|b| {
        b.entries
            .iter()
            .any(|e| !e.is_prenote() && e.addenda98.is_none() && e.addenda99.is_none())
    })
}

#[async_trait]
impl FileProcessor for IncomingEmitter {
    fn kind(&self) -> &'static str {
        "incoming"
    }

    async fn handle(&self, file: &File) -> Result<()> {
        let Some(ach_file) = file.ach_file.as_ref() else {
            return Ok(());
        };
        if !is_incoming_file(ach_file) {
            return Ok(());
        }
        if !self.cfg.matches_path(&file.path_str()) {
            return Ok(()); // skip the file
        }

        let origin = ach_file.header.immediate_origin.as_str();
        let destination = ach_file.header.immediate_destination.as_str();
        metrics()
            .incoming_files_processed
            .inc(&[origin, destination]);
        info!(
            origin,
            destination,
            entries = ach_file.entry_count(),
            "inbound: incoming file"
        );

        let event = Event::IncomingFile(events::IncomingFile {
            filename: file.filename(),
            file: ach_file.clone(),
        });
        send_event(&self.publisher, event).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_stream::MockPublisher;

    use crate::processors::testing::fixtures;

    fn emitter(publisher: &MockPublisher) -> IncomingEmitter {
        IncomingEmitter::new(
            ProcessorConfig {
                enabled: true,
                path_matcher: String::new(),
            },
            Arc::new(publisher.clone()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn emits_for_ordinary_files() {
        let publisher = MockPublisher::new();
        let emitter = emitter(&publisher);

        let file = File {
            filepath: "/staging/inbound/moov.ach".into(),
            ach_file: Some(fixtures::plain_file(2)),
        };
        emitter.handle(&file).await.unwrap();

        assert_eq!(publisher.sent_count(), 1);
        assert_eq!(
            publisher.sent()[0].1.get("eventType").unwrap(),
            "IncomingFile"
        );
    }

    #[tokio::test]
    async fn special_category_files_are_left_to_their_processors() {
        let publisher = MockPublisher::new();
        let emitter = emitter(&publisher);

        for ach_file in [
            fixtures::correction_file(&["C01"]),
            fixtures::return_file(&["R01"]),
            fixtures::prenote_file(1),
        ] {
            let file = File {
                filepath: "/staging/inbound/special.ach".into(),
                ach_file: Some(ach_file),
            };
            emitter.handle(&file).await.unwrap();
        }
        assert_eq!(publisher.sent_count(), 0);
    }
}
