//! Minimal NACHA (ACH) file codec.
//!
//! Parses the fixed-width 94-character wire format into a structural
//! representation: file header, batches with entry details, and the
//! Addenda98 (Notification of Change) / Addenda99 (return) records the
//! gateway classifies on. Also round-trips the JSON representation.

pub mod file;
pub mod records;

pub use file::{File, ParseError};
pub use records::{Addenda98, Addenda99, Batch, BatchHeader, EntryDetail, FileHeader};

/// Every NACHA record is exactly 94 characters.
pub const RECORD_LENGTH: usize = 94;

/// Standard Entry Class code carried by Notification of Change batches.
pub const SEC_COR: &str = "COR";
