//! The processor registry and the shared emitter plumbing.

pub mod corrections;
pub mod incoming;
pub mod prenote;
pub mod reconciliation;
pub mod returns;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use gateway_core::{Event, ProcessorsConfig, Result};
use gateway_stream::Publisher;

use crate::files::File;

pub use corrections::CorrectionEmitter;
pub use incoming::IncomingEmitter;
pub use prenote::PrenoteEmitter;
pub use reconciliation::ReconciliationEmitter;
pub use returns::ReturnEmitter;

/// A named handler over staged files.
///
/// The classifier predicate is implicit in `handle`: a processor that
/// does not recognize a file returns `Ok` without emitting, so later
/// processors still get to consider the same file.
#[async_trait]
pub trait FileProcessor: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn handle(&self, file: &File) -> Result<()>;
}

/// Ordered collection of processors. Registration order is execution
/// order and must be deterministic.
#[derive(Default)]
pub struct Processors(Vec<Box<dyn FileProcessor>>);

impl Processors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, processor: Box<dyn FileProcessor>) {
        self.0.push(processor);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.0.iter().map(|p| p.kind()).collect()
    }

    /// Runs every processor over `file` in registration order. Errors are
    /// recorded, never short-circuiting the remaining processors.
    pub async fn handle_all(&self, file: &File) -> Vec<String> {
        let mut failures = Vec::new();
        for processor in &self.0 {
            if let Err(e) = processor.handle(file).await {
                warn!(
                    kind = processor.kind(),
                    filepath = %file.path_str(),
                    error = %e,
                    "Processor failed"
                );
                failures.push(format!("{}: {e}", processor.kind()));
            }
        }
        failures
    }
}

/// Builds the registry from config. Disabled processors are absent;
/// registration order fixes execution order.
pub fn setup_processors(cfg: &ProcessorsConfig, publisher: Arc<dyn Publisher>) -> Processors {
    let mut processors = Processors::new();

    if let Some(p) = CorrectionEmitter::new(cfg.corrections.clone(), publisher.clone()) {
        processors.push(Box::new(p));
    }
    if let Some(p) = ReconciliationEmitter::new(cfg.reconciliations.clone(), publisher.clone()) {
        processors.push(Box::new(p));
    }
    if let Some(p) = ReturnEmitter::new(cfg.returns.clone(), publisher.clone()) {
        processors.push(Box::new(p));
    }
    if let Some(p) = PrenoteEmitter::new(cfg.prenotes.clone(), publisher.clone()) {
        processors.push(Box::new(p));
    }
    if let Some(p) = IncomingEmitter::new(cfg.incomings.clone(), publisher) {
        processors.push(Box::new(p));
    }

    processors
}

/// Publishes an event, logging (never failing) on transport errors: the
/// audit trail provides replay capability.
pub(crate) async fn send_event(publisher: &Arc<dyn Publisher>, event: Event) {
    let event_type = event.event_type();

    let body = match event.encode() {
        Ok(body) => body,
        Err(e) => {
            warn!(event_type, error = %e, "Failed to encode event");
            return;
        }
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("eventType".to_string(), event_type.to_string());

    if let Err(e) = publisher.send(body, metadata).await {
        warn!(event_type, error = %e, "Failed to publish event");
    }
}

/// Test doubles shared by unit and integration tests.
pub mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use gateway_core::{Error, Result};

    use super::FileProcessor;
    use crate::files::File;

    /// Records every filename it is handed; optionally fails.
    #[derive(Clone, Default)]
    pub struct MockProcessor {
        seen: Arc<Mutex<Vec<String>>>,
        should_fail: bool,
    }

    impl MockProcessor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::default()
            }
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl FileProcessor for MockProcessor {
        fn kind(&self) -> &'static str {
            "mock"
        }

        async fn handle(&self, file: &File) -> Result<()> {
            self.seen.lock().push(file.filename());
            if self.should_fail {
                return Err(Error::internal("mock processor failure"));
            }
            Ok(())
        }
    }

    /// In-memory ACH file builders for classifier tests.
    pub mod fixtures {
        use ach::{Addenda98, Addenda99, Batch, BatchHeader, EntryDetail, File, FileHeader};

        pub fn header() -> FileHeader {
            FileHeader {
                immediate_destination: "076401251".into(),
                immediate_origin: "991234567".into(),
                file_creation_date: "230628".into(),
                file_creation_time: "1200".into(),
                file_id_modifier: "A".into(),
                immediate_destination_name: "FED RESERVE".into(),
                immediate_origin_name: "MOOV BANK".into(),
            }
        }

        fn batch_header(sec: &str, number: u32) -> BatchHeader {
            BatchHeader {
                service_class_code: 225,
                company_name: "ACME CORP".into(),
                company_identification: "9912345678".into(),
                standard_entry_class_code: sec.into(),
                company_entry_description: "PAYROLL".into(),
                effective_entry_date: "230628".into(),
                odfi_identification: "07640125".into(),
                batch_number: number,
            }
        }

        fn entry(transaction_code: u8, amount: i64, trace: u64) -> EntryDetail {
            EntryDetail {
                transaction_code,
                rdfi_identification: "07640125".into(),
                check_digit: "9".into(),
                dfi_account_number: "12345678901".into(),
                amount,
                identification_number: "ID-1".into(),
                individual_name: "RECEIVER NAME".into(),
                trace_number: format!("{trace:015}"),
                addenda98: None,
                addenda99: None,
            }
        }

        /// One NoC batch per change code.
        pub fn correction_file(change_codes: &[&str]) -> File {
            let noc = change_codes
                .iter()
                .enumerate()
                .map(|(i, code)| {
                    let mut e = entry(21, 0, i as u64 + 1);
                    e.addenda98 = Some(Addenda98 {
                        change_code: code.to_string(),
                        original_trace: "076401250000001".into(),
                        original_dfi: "07640125".into(),
                        corrected_data: "corrected account data".into(),
                        trace_number: format!("{:015}", i + 1),
                    });
                    Batch {
                        header: batch_header("COR", i as u32 + 1),
                        entries: vec![e],
                    }
                })
                .collect();

            File {
                header: header(),
                batches: Vec::new(),
                notification_of_change: noc,
            }
        }

        /// One ordinary batch with `entries` live entries.
        pub fn plain_file(entries: usize) -> File {
            let entries = (0..entries)
                .map(|i| entry(22, 10_000 + i as i64, i as u64 + 1))
                .collect();
            File {
                header: header(),
                batches: vec![Batch {
                    header: batch_header("PPD", 1),
                    entries,
                }],
                notification_of_change: Vec::new(),
            }
        }

        /// One batch whose entries all carry return addenda.
        pub fn return_file(return_codes: &[&str]) -> File {
            let entries = return_codes
                .iter()
                .enumerate()
                .map(|(i, code)| {
                    let mut e = entry(26, 1_200, i as u64 + 1);
                    e.addenda99 = Some(Addenda99 {
                        return_code: code.to_string(),
                        original_trace: "076401250000001".into(),
                        date_of_death: String::new(),
                        original_dfi: "07640125".into(),
                        addenda_information: "return info".into(),
                        trace_number: format!("{:015}", i + 1),
                    });
                    e
                })
                .collect();
            File {
                header: header(),
                batches: vec![Batch {
                    header: batch_header("PPD", 1),
                    entries,
                }],
                notification_of_change: Vec::new(),
            }
        }

        /// One batch of zero-dollar prenote entries.
        pub fn prenote_file(entries: usize) -> File {
            let entries = (0..entries).map(|i| entry(23, 0, i as u64 + 1)).collect();
            File {
                header: header(),
                batches: vec![Batch {
                    header: batch_header("PPD", 1),
                    entries,
                }],
                notification_of_change: Vec::new(),
            }
        }
    }
}
