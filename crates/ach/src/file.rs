//! NACHA file parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{Addenda98, Addenda99, Batch, BatchHeader, EntryDetail, FileHeader};
use crate::RECORD_LENGTH;

/// Errors produced while decoding a NACHA file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file is not valid text: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("record {line} is {len} characters, expected {RECORD_LENGTH}")]
    RecordLength { line: usize, len: usize },

    #[error("record {line} contains non-ASCII characters")]
    NonAscii { line: usize },

    #[error("no file header record found")]
    MissingFileHeader,

    #[error("record {line}: unexpected record type {kind:?}")]
    UnexpectedRecord { line: usize, kind: char },

    #[error("record {line}: entry detail outside of a batch")]
    EntryOutsideBatch { line: usize },

    #[error("record {line}: addenda record without a preceding entry")]
    OrphanAddenda { line: usize },

    #[error("record {line}: addenda type {kind:?} is not supported")]
    UnknownAddendaType { line: usize, kind: String },

    #[error("record {line}: invalid numeric field {field}: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("invalid ACH JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parsed ACH file.
///
/// Notification of Change batches (SEC `COR`, or any batch carrying
/// Addenda98 records) are partitioned into `notification_of_change`;
/// all other batches land in `batches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub header: FileHeader,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub notification_of_change: Vec<Batch>,
}

impl File {
    /// Decodes the fixed-width NACHA wire format.
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(input)?;
        let mut parser = Parser::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            parser.record(idx + 1, line)?;
        }

        parser.finish()
    }

    /// Decodes the JSON representation.
    pub fn from_json(input: &[u8]) -> Result<Self, ParseError> {
        Ok(serde_json::from_slice(input)?)
    }

    /// Total entry count across ordinary and NoC batches.
    pub fn entry_count(&self) -> usize {
        self.batches
            .iter()
            .chain(self.notification_of_change.iter())
            .map(|b| b.entries.len())
            .sum()
    }
}

#[derive(Default)]
struct Parser {
    header: Option<FileHeader>,
    batches: Vec<Batch>,
    current: Option<Batch>,
}

impl Parser {
    fn record(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
        if !text.is_ascii() {
            return Err(ParseError::NonAscii { line });
        }
        // Block padding rows are 94 nines; the file control record also
        // starts with '9'. Neither carries structure we keep.
        if text.len() != RECORD_LENGTH {
            return Err(ParseError::RecordLength {
                line,
                len: text.len(),
            });
        }

        match text.as_bytes()[0] {
            b'1' => {
                self.header = Some(parse_file_header(text));
                Ok(())
            }
            b'5' => {
                self.close_batch();
                self.current = Some(Batch {
                    header: parse_batch_header(line, text)?,
                    entries: Vec::new(),
                });
                Ok(())
            }
            b'6' => {
                let batch = self
                    .current
                    .as_mut()
                    .ok_or(ParseError::EntryOutsideBatch { line })?;
                batch.entries.push(parse_entry(line, text)?);
                Ok(())
            }
            b'7' => self.attach_addenda(line, text),
            b'8' => {
                self.close_batch();
                Ok(())
            }
            b'9' => Ok(()),
            other => Err(ParseError::UnexpectedRecord {
                line,
                kind: other as char,
            }),
        }
    }

    fn attach_addenda(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
        let entry = self
            .current
            .as_mut()
            .and_then(|b| b.entries.last_mut())
            .ok_or(ParseError::OrphanAddenda { line })?;

        match field(text, 1, 3) {
            "98" => {
                entry.addenda98 = Some(Addenda98 {
                    change_code: field(text, 3, 6).to_string(),
                    original_trace: field(text, 6, 21).to_string(),
                    original_dfi: field(text, 27, 35).to_string(),
                    corrected_data: field(text, 35, 64).to_string(),
                    trace_number: field(text, 79, 94).to_string(),
                });
                Ok(())
            }
            "99" => {
                entry.addenda99 = Some(Addenda99 {
                    return_code: field(text, 3, 6).to_string(),
                    original_trace: field(text, 6, 21).to_string(),
                    date_of_death: field(text, 21, 27).to_string(),
                    original_dfi: field(text, 27, 35).to_string(),
                    addenda_information: field(text, 35, 79).to_string(),
                    trace_number: field(text, 79, 94).to_string(),
                });
                Ok(())
            }
            // Payment-related addenda (05) and IAT addenda carry free-form
            // data the gateway does not classify on.
            "05" => Ok(()),
            other => Err(ParseError::UnknownAddendaType {
                line,
                kind: other.to_string(),
            }),
        }
    }

    fn close_batch(&mut self) {
        if let Some(batch) = self.current.take() {
            self.batches.push(batch);
        }
    }

    fn finish(mut self) -> Result<File, ParseError> {
        self.close_batch();
        let header = self.header.ok_or(ParseError::MissingFileHeader)?;

        let (noc, batches): (Vec<Batch>, Vec<Batch>) = self
            .batches
            .into_iter()
            .partition(|b| b.is_notification_of_change());

        Ok(File {
            header,
            batches,
            notification_of_change: noc,
        })
    }
}

/// Extracts a trimmed field from byte offsets of an ASCII record.
fn field(text: &str, start: usize, end: usize) -> &str {
    text[start..end].trim()
}

fn numeric<T: std::str::FromStr>(
    text: &str,
    line: usize,
    start: usize,
    end: usize,
    name: &'static str,
) -> Result<T, ParseError> {
    let value = field(text, start, end);
    value.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        field: name,
        value: value.to_string(),
    })
}

fn parse_file_header(text: &str) -> FileHeader {
    FileHeader {
        immediate_destination: field(text, 3, 13).to_string(),
        immediate_origin: field(text, 13, 23).to_string(),
        file_creation_date: field(text, 23, 29).to_string(),
        file_creation_time: field(text, 29, 33).to_string(),
        file_id_modifier: field(text, 33, 34).to_string(),
        immediate_destination_name: field(text, 40, 63).to_string(),
        immediate_origin_name: field(text, 63, 86).to_string(),
    }
}

fn parse_batch_header(line: usize, text: &str) -> Result<BatchHeader, ParseError> {
    Ok(BatchHeader {
        service_class_code: numeric(text, line, 1, 4, "serviceClassCode")?,
        company_name: field(text, 4, 20).to_string(),
        company_identification: field(text, 40, 50).to_string(),
        standard_entry_class_code: field(text, 50, 53).to_string(),
        company_entry_description: field(text, 53, 63).to_string(),
        effective_entry_date: field(text, 69, 75).to_string(),
        odfi_identification: field(text, 79, 87).to_string(),
        batch_number: numeric(text, line, 87, 94, "batchNumber")?,
    })
}

fn parse_entry(line: usize, text: &str) -> Result<EntryDetail, ParseError> {
    Ok(EntryDetail {
        transaction_code: numeric(text, line, 1, 3, "transactionCode")?,
        rdfi_identification: field(text, 3, 11).to_string(),
        check_digit: field(text, 11, 12).to_string(),
        dfi_account_number: field(text, 12, 29).to_string(),
        amount: numeric(text, line, 29, 39, "amount")?,
        identification_number: field(text, 39, 54).to_string(),
        individual_name: field(text, 54, 76).to_string(),
        trace_number: field(text, 79, 94).to_string(),
        addenda98: None,
        addenda99: None,
    })
}
