//! Registry reads: ledger + filesystem probe → ordered certificate records.

use certcenter_core::models::certificate::{CertificateRecord, ClassFilter};
use chrono::{DateTime, Utc};

use crate::error::PkiError;
use crate::layout::CaLayout;
use crate::ledger::{self, LedgerEntry};

/// Read-only view over the CA ledger. Every call re-reads the file.
///
/// The ledger is read through `tokio::fs`; classification then stats one
/// client path per record synchronously.
#[derive(Debug, Clone)]
pub struct Registry {
    layout: CaLayout,
}

impl Registry {
    pub fn new(layout: CaLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CaLayout {
        &self.layout
    }

    /// All records accepted by `filter`, sorted by id.
    pub async fn list(&self, filter: ClassFilter) -> Result<Vec<CertificateRecord>, PkiError> {
        self.list_at(filter, Utc::now()).await
    }

    pub async fn list_at(
        &self,
        filter: ClassFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<CertificateRecord>, PkiError> {
        let path = self.layout.ledger_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PkiError::RegistryUnavailable(format!(
                    "ledger {} is missing",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        // Subjects are not guaranteed to be UTF-8; a stray byte must not
        // hide the rest of the ledger.
        let text = String::from_utf8_lossy(&bytes);

        let mut records: Vec<CertificateRecord> = ledger::parse_ledger(&text)
            .into_iter()
            .map(|entry| self.record(entry, now))
            .filter(|record| filter.accepts(record.class))
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::debug!(path = %path.display(), count = records.len(), "Ledger read");
        Ok(records)
    }

    pub async fn find(&self, id: &str) -> Result<CertificateRecord, PkiError> {
        self.list(ClassFilter::All)
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| PkiError::RecordNotFound(id.to_string()))
    }

    fn record(&self, entry: LedgerEntry, now: DateTime<Utc>) -> CertificateRecord {
        let identity = entry.identity();
        let class = self.layout.classify(&identity);
        let expired = entry.is_expired_at(now);
        CertificateRecord {
            id: entry.serial,
            status: entry.status,
            not_after: entry.not_after,
            revoked_at: entry.revoked_at,
            flags: entry.flags,
            subject: entry.subject,
            identity,
            class,
            expired,
        }
    }
}
