//! Record types for the NACHA fixed-width format.

use serde::{Deserialize, Serialize};

/// Transaction codes marking prenotification (zero-dollar) entries.
pub const PRENOTE_TRANSACTION_CODES: [u8; 4] = [23, 28, 33, 38];

/// File header record (type `1`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHeader {
    /// Routing number of the receiving point, as printed (leading space or zero trimmed).
    pub immediate_destination: String,
    /// Routing number or company identification of the sending point.
    pub immediate_origin: String,
    /// File creation date, `YYMMDD`.
    pub file_creation_date: String,
    /// File creation time, `HHMM`.
    pub file_creation_time: String,
    pub file_id_modifier: String,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
}

/// Batch header record (type `5`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHeader {
    pub service_class_code: u16,
    pub company_name: String,
    pub company_identification: String,
    /// Standard Entry Class code, e.g. `PPD`, `CCD`, `COR`.
    pub standard_entry_class_code: String,
    pub company_entry_description: String,
    pub effective_entry_date: String,
    pub odfi_identification: String,
    pub batch_number: u32,
}

/// Entry detail record (type `6`), with any attached addenda.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    pub transaction_code: u8,
    pub rdfi_identification: String,
    pub check_digit: String,
    pub dfi_account_number: String,
    /// Amount in cents.
    pub amount: i64,
    pub identification_number: String,
    pub individual_name: String,
    pub trace_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addenda98: Option<Addenda98>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addenda99: Option<Addenda99>,
}

impl EntryDetail {
    /// Whether this entry is a prenotification (zero-dollar test entry).
    pub fn is_prenote(&self) -> bool {
        PRENOTE_TRANSACTION_CODES.contains(&self.transaction_code)
    }
}

/// Notification of Change addenda record (type `7`, addenda type `98`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addenda98 {
    /// Change code, e.g. `C01` (incorrect account number).
    pub change_code: String,
    pub original_trace: String,
    pub original_dfi: String,
    pub corrected_data: String,
    pub trace_number: String,
}

/// Return addenda record (type `7`, addenda type `99`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addenda99 {
    /// Return reason code, e.g. `R01` (insufficient funds).
    pub return_code: String,
    pub original_trace: String,
    pub date_of_death: String,
    pub original_dfi: String,
    pub addenda_information: String,
    pub trace_number: String,
}

/// A batch: one header plus its entry details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub header: BatchHeader,
    #[serde(default)]
    pub entries: Vec<EntryDetail>,
}

impl Batch {
    /// Whether this batch carries Notification of Change records.
    pub fn is_notification_of_change(&self) -> bool {
        self.header.standard_entry_class_code == crate::SEC_COR
            || self.entries.iter().any(|e| e.addenda98.is_some())
    }

    /// Whether any entry in this batch carries a return addenda.
    pub fn has_returns(&self) -> bool {
        self.entries.iter().any(|e| e.addenda99.is_some())
    }
}
