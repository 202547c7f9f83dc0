#![forbid(unsafe_code)]

use std::fmt;

/// Classified failure from the blob-storage provider. Only the rendered
/// message ever reaches a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallError {
    pub provider: &'static str,
    pub kind: &'static str,
    pub http_status: Option<u16>,
}

impl ProviderCallError {
    pub fn new(provider: &'static str, kind: &'static str, http_status: Option<u16>) -> Self {
        Self {
            provider,
            kind,
            http_status,
        }
    }
}

impl fmt::Display for ProviderCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(
                f,
                "{} provider failed: {} (http {})",
                self.provider, self.kind, status
            ),
            None => write!(f, "{} provider failed: {}", self.provider, self.kind),
        }
    }
}

/// External capability: store bytes under a declared name, get back a
/// public URL.
///
/// Implementations may block; the relay calls them from the blocking pool
/// and never while holding the ledger guard.
pub trait BlobStore: Send + Sync {
    fn store(&self, name: &str, declared_size: u64, bytes: &[u8])
        -> Result<String, ProviderCallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_blob_01_error_rendering_includes_status_when_present() {
        let with_status = ProviderCallError::new("blobstore", "http_non_200", Some(503));
        assert_eq!(
            with_status.to_string(),
            "blobstore provider failed: http_non_200 (http 503)"
        );
        let without = ProviderCallError::new("blobstore", "timeout", None);
        assert_eq!(without.to_string(), "blobstore provider failed: timeout");
    }
}
