#![forbid(unsafe_code)]

pub mod common;
pub mod keys;
pub mod relay;

pub use common::{ContractViolation, Validate};
pub use keys::{AccessKey, KeyRecord, QuotaLimits, DEFAULT_MAX_FILES, DEFAULT_MAX_KEYS};
pub use relay::{ErrorBody, FilePart, KeyIssued, RelayError, UploadAccepted, UploadInput};
