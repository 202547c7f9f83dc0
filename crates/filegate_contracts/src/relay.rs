#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// One decoded binary part of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub declared_size: u64,
    pub bytes: Vec<u8>,
}

/// Fully-decoded upload request. Lives only for the duration of one relay
/// call; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadInput {
    pub key: Option<String>,
    pub file: Option<FilePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadAccepted {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyIssued {
    #[serde(rename = "newKey")]
    pub new_key: String,
}

/// Closed error taxonomy of the relay surface. Wire codes are stable; new
/// variants must not renumber existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    NoKey,
    NoFile,
    KeyUnknown,
    UploadQuotaExceeded,
    StorageProviderError(String),
    KeyQuotaExceeded,
    Unauthorized,
}

impl RelayError {
    pub fn wire_code(&self) -> u16 {
        match self {
            RelayError::NoKey => 1,
            RelayError::NoFile => 2,
            RelayError::KeyUnknown => 3,
            RelayError::UploadQuotaExceeded => 4,
            RelayError::StorageProviderError(_) => 5,
            RelayError::KeyQuotaExceeded => 6,
            RelayError::Unauthorized => 7,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RelayError::NoKey => "a key is needed for this request".to_string(),
            RelayError::NoFile => "no file uploaded".to_string(),
            RelayError::KeyUnknown => "this key is not given out by this service".to_string(),
            RelayError::UploadQuotaExceeded => {
                "the maximum number of files has been reached for this key".to_string()
            }
            RelayError::StorageProviderError(detail) => detail.clone(),
            RelayError::KeyQuotaExceeded => {
                "the maximum number of new keys has been reached".to_string()
            }
            RelayError::Unauthorized => {
                "the shutdown secret is required to stop this service".to_string()
            }
        }
    }
}

/// Error body shape shared by every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: u16,
    pub message: String,
}

impl From<&RelayError> for ErrorBody {
    fn from(err: &RelayError) -> Self {
        Self {
            error: err.wire_code(),
            message: err.message(),
        }
    }
}
