#![forbid(unsafe_code)]

use filegate_contracts::{AccessKey, QuotaLimits};

use crate::ledger::Ledger;
use crate::minter::KeyMinter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAdmission {
    Admitted,
    UnknownKey,
    QuotaExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueAdmission {
    Issued(AccessKey),
    UnknownKey,
    QuotaExhausted,
}

/// Stateless admission rules over a ledger.
///
/// Callers hold the ledger guard across a whole call and nothing here
/// suspends, so each check-and-increment is atomic with respect to every
/// other handler.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRuntime {
    limits: QuotaLimits,
}

impl AdmissionRuntime {
    pub fn new(limits: QuotaLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Admits one upload for `key`, consuming a quota slot on success.
    /// A counter at `max_files` rejects; it is never clamped.
    pub fn try_register_upload(&self, ledger: &mut Ledger, key: &AccessKey) -> UploadAdmission {
        let Some(record) = ledger.record_mut(key) else {
            return UploadAdmission::UnknownKey;
        };
        if record.uploaded_file_count >= self.limits.max_files {
            return UploadAdmission::QuotaExhausted;
        }
        record.uploaded_file_count += 1;
        ledger.mark_dirty();
        UploadAdmission::Admitted
    }

    /// Issues a fresh key charged against `existing`'s issuance quota. The
    /// issued record always starts at zero counters; the issuance cap is a
    /// property of the issuing key.
    pub fn try_issue_key(
        &self,
        ledger: &mut Ledger,
        existing: &AccessKey,
        minter: &dyn KeyMinter,
    ) -> IssueAdmission {
        let issued_so_far = match ledger.record(existing) {
            Some(record) => record.issued_key_count,
            None => return IssueAdmission::UnknownKey,
        };
        if issued_so_far >= self.limits.max_keys {
            return IssueAdmission::QuotaExhausted;
        }
        // The minter is collision-resistant; re-mint on the off chance a
        // token is already present so a live record is never replaced.
        let mut fresh = minter.mint();
        while ledger.contains(&fresh) {
            fresh = minter.mint();
        }
        if let Some(record) = ledger.record_mut(existing) {
            record.issued_key_count += 1;
        }
        ledger.insert_fresh(fresh.clone());
        ledger.mark_dirty();
        IssueAdmission::Issued(fresh)
    }
}
