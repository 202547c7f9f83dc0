#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, Validate};

pub const MAX_ACCESS_KEY_LEN: usize = 128;

pub const DEFAULT_MAX_FILES: u32 = 10;
pub const DEFAULT_MAX_KEYS: u32 = 100;

/// Opaque token granting upload and issuance privileges under tracked quotas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(token: impl Into<String>) -> Result<Self, ContractViolation> {
        let key = Self(token.into());
        key.validate()?;
        Ok(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for AccessKey {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "access_key",
                reason: "must not be empty",
            });
        }
        if self.0.len() > MAX_ACCESS_KEY_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "access_key",
                reason: "must not exceed MAX_ACCESS_KEY_LEN bytes",
            });
        }
        if !self.0.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ContractViolation::InvalidValue {
                field: "access_key",
                reason: "must be visible ascii",
            });
        }
        Ok(())
    }
}

/// Per-key counters tracking consumed upload and issuance quota.
///
/// Both counters only ever move up, and only through the admission rules;
/// the serde names are the snapshot/wire field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    #[serde(rename = "uploadedFileCount")]
    pub uploaded_file_count: u32,
    #[serde(rename = "issuedKeyCount")]
    pub issued_key_count: u32,
}

impl KeyRecord {
    pub fn fresh() -> Self {
        Self::default()
    }
}

/// Configured per-key caps. An operation that would push a counter past its
/// cap is rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub max_files: u32,
    pub max_keys: u32,
}

impl QuotaLimits {
    pub fn v1(max_files: u32, max_keys: u32) -> Result<Self, ContractViolation> {
        let limits = Self {
            max_files,
            max_keys,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn mvp_v1() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl Validate for QuotaLimits {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.max_files == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "quota_limits.max_files",
                reason: "must be >= 1",
            });
        }
        if self.max_keys == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "quota_limits.max_keys",
                reason: "must be >= 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_keys_01_access_key_rejects_empty_and_oversized_tokens() {
        assert!(AccessKey::new("abc123").is_ok());
        assert!(AccessKey::new("").is_err());
        assert!(AccessKey::new("a".repeat(MAX_ACCESS_KEY_LEN)).is_ok());
        assert!(AccessKey::new("a".repeat(MAX_ACCESS_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn at_keys_02_access_key_rejects_non_visible_ascii() {
        assert!(AccessKey::new("has space").is_err());
        assert!(AccessKey::new("tab\there").is_err());
        assert!(AccessKey::new("k\u{e9}y").is_err());
    }

    #[test]
    fn at_keys_03_quota_limits_require_nonzero_caps() {
        assert!(QuotaLimits::v1(1, 1).is_ok());
        assert!(QuotaLimits::v1(0, 1).is_err());
        assert!(QuotaLimits::v1(1, 0).is_err());
        let defaults = QuotaLimits::mvp_v1();
        assert_eq!(defaults.max_files, DEFAULT_MAX_FILES);
        assert_eq!(defaults.max_keys, DEFAULT_MAX_KEYS);
    }

    #[test]
    fn at_keys_04_fresh_record_starts_at_zero() {
        let record = KeyRecord::fresh();
        assert_eq!(record.uploaded_file_count, 0);
        assert_eq!(record.issued_key_count, 0);
    }
}
