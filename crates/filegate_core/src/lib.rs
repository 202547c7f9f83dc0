#![forbid(unsafe_code)]

pub mod admission;
pub mod blob;
pub mod ledger;
pub mod minter;

pub use admission::{AdmissionRuntime, IssueAdmission, UploadAdmission};
pub use blob::{BlobStore, ProviderCallError};
pub use ledger::Ledger;
pub use minter::{KeyMinter, RandKeyMinter};
