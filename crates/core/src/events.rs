//! Event envelope and typed payloads emitted onto the bus.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A batch summary carried inside RDFI event payloads: the batch header
/// plus the entries the classifier extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub header: ach::BatchHeader,
    #[serde(default)]
    pub entries: Vec<ach::EntryDetail>,
}

/// Notification of Change file observed on the RDFI side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionFile {
    pub filename: String,
    pub file: ach::File,
    #[serde(default)]
    pub corrections: Vec<Batch>,
}

/// Returned entries observed on the RDFI side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnFile {
    pub filename: String,
    pub file: ach::File,
    #[serde(default)]
    pub returns: Vec<Batch>,
}

/// Credit reconciliation file matched by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationFile {
    pub filename: String,
    pub file: ach::File,
    #[serde(default)]
    pub reconciliations: Vec<Batch>,
}

/// Prenotification entries observed on the RDFI side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrenoteFile {
    pub filename: String,
    pub file: ach::File,
    #[serde(default)]
    pub batches: Vec<Batch>,
}

/// Ordinary inbound file not claimed by a more specific category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFile {
    pub filename: String,
    pub file: ach::File,
}

/// ODFI ingress: a submitted file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueACHFile {
    pub file_id: String,
    pub shard_key: String,
    pub file: ach::File,
}

/// ODFI ingress: cancel a previously submitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelACHFile {
    pub file_id: String,
    pub shard_key: String,
}

/// The envelope written to the bus: `{"event_type": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum Event {
    CorrectionFile(CorrectionFile),
    ReturnFile(ReturnFile),
    ReconciliationFile(ReconciliationFile),
    PrenoteFile(PrenoteFile),
    IncomingFile(IncomingFile),
    QueueACHFile(QueueACHFile),
    CancelACHFile(CancelACHFile),
}

impl Event {
    /// The wire tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CorrectionFile(_) => "CorrectionFile",
            Self::ReturnFile(_) => "ReturnFile",
            Self::ReconciliationFile(_) => "ReconciliationFile",
            Self::PrenoteFile(_) => "PrenoteFile",
            Self::IncomingFile(_) => "IncomingFile",
            Self::QueueACHFile(_) => "QueueACHFile",
            Self::CancelACHFile(_) => "CancelACHFile",
        }
    }

    /// Serializes the envelope for publication.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes an envelope previously produced by [`Event::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
