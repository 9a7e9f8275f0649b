//! NACHA wire fixtures staged onto tempdir "remotes".

use std::path::Path;

/// File header record with a configurable origin, so parallel tests get
/// distinct metric label sets.
pub fn file_header(origin: &str) -> String {
    format!(
        "101{dest:>10}{origin:>10}2306281200A094101{dname:<23}{oname:<23}{refc:<8}",
        dest = " 076401251",
        origin = format!(" {origin}"),
        dname = "FED RESERVE",
        oname = "MOOV BANK",
        refc = "",
    )
}

pub fn batch_header(sec: &str, number: u32) -> String {
    format!(
        "5225{name:<16}{disc:<20}{company:<10}{sec}{descr:<10}{ddate:<6}230628{settle:<3}1{odfi}{number:07}",
        name = "ACME CORP",
        disc = "",
        company = "9912345678",
        descr = "PAYROLL",
        ddate = "",
        settle = "",
        odfi = "07640125",
    )
}

pub fn entry(tx: u8, amount: i64, trace: u64) -> String {
    format!(
        "6{tx:02}07640125 {account:<17}{amount:010}{id:<15}{name:<22}  0{trace:015}",
        account = "12345678901",
        id = "ID-1",
        name = "RECEIVER NAME",
    )
}

pub fn addenda98(code: &str) -> String {
    format!(
        "798{code}{orig:<15}{reserved:<6}{odfi}{corrected:<29}{reserved2:<15}{trace:015}",
        orig = "076401250000001",
        reserved = "",
        odfi = "07640125",
        corrected = "corrected account data",
        reserved2 = "",
        trace = 1,
    )
}

pub fn addenda99(code: &str) -> String {
    format!(
        "799{code}{orig:<15}{dod:<6}{odfi}{info:<44}{trace:015}",
        orig = "076401250000001",
        dod = "",
        odfi = "07640125",
        info = "return info",
        trace = 1,
    )
}

/// A file with one COR batch per change code.
pub fn correction_wire(origin: &str, change_codes: &[&str]) -> String {
    let mut records = vec![file_header(origin)];
    for (i, code) in change_codes.iter().enumerate() {
        records.push(batch_header("COR", i as u32 + 1));
        records.push(entry(21, 0, i as u64 + 1));
        records.push(addenda98(code));
    }
    records.join("\n")
}

/// A file with one ordinary batch of `entries` credit entries.
pub fn plain_wire(origin: &str, entries: usize) -> String {
    let mut records = vec![file_header(origin), batch_header("PPD", 1)];
    for i in 0..entries {
        records.push(entry(22, 10_000 + i as i64, i as u64 + 1));
    }
    records.join("\n")
}

/// A file whose entries all carry return addenda.
pub fn return_wire(origin: &str, return_codes: &[&str]) -> String {
    let mut records = vec![file_header(origin), batch_header("PPD", 1)];
    for (i, code) in return_codes.iter().enumerate() {
        records.push(entry(26, 1_200, i as u64 + 1));
        records.push(addenda99(code));
    }
    records.join("\n")
}

/// A file with one batch of zero-dollar prenote entries.
pub fn prenote_wire(origin: &str, entries: usize) -> String {
    let mut records = vec![file_header(origin), batch_header("PPD", 1)];
    for i in 0..entries {
        records.push(entry(23, 0, i as u64 + 1));
    }
    records.join("\n")
}

/// Writes `content` under the remote root, creating parent directories.
pub fn stage_remote(remote_root: &Path, relative: &str, content: &[u8]) {
    let full = remote_root.join(relative);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}
