//! Parser for the CA ledger (`index.txt`).
//!
//! Each line has six tab-separated fields:
//! `status, expiry, revocation, serial, flags, subject`. Parsing is total:
//! lines with a different field count are skipped and malformed
//! timestamps become `None`.

use certcenter_core::models::certificate::{
    CertificateIdentity, CertificateStatus, DistinguishedName,
};
use chrono::{DateTime, NaiveDate, Utc};

const FIELD_COUNT: usize = 6;

/// One ledger line, before the filesystem has been consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub status: CertificateStatus,
    pub not_after: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub serial: String,
    pub flags: String,
    pub subject: DistinguishedName,
}

impl LedgerEntry {
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != FIELD_COUNT {
            return None;
        }
        Some(Self {
            status: CertificateStatus::from_flag(fields[0]),
            not_after: parse_timestamp(fields[1]),
            revoked_at: parse_timestamp(fields[2]),
            serial: fields[3].to_string(),
            flags: fields[4].to_string(),
            subject: DistinguishedName::parse(fields[5]),
        })
    }

    pub fn identity(&self) -> CertificateIdentity {
        CertificateIdentity::from_subject(&self.subject)
    }

    /// A certificate without a readable expiry date never counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after.is_some_and(|t| t < now)
    }
}

pub fn parse_ledger(text: &str) -> Vec<LedgerEntry> {
    text.lines().filter_map(LedgerEntry::parse_line).collect()
}

/// Decode a compact `YYMMDDHHMMSSZ` timestamp as UTC, years offset from 2000.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.len() != 13 || !raw.as_bytes()[..12].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let field = |at: usize| raw[at..at + 2].parse::<u32>().ok();

    let year = 2000 + field(0)? as i32;
    NaiveDate::from_ymd_opt(year, field(2)?, field(4)?)?
        .and_hms_opt(field(6)?, field(8)?, field(10)?)
        .map(|naive| naive.and_utc())
}
