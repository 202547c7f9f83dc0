#![forbid(unsafe_code)]

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use filegate_core::{BlobStore, ProviderCallError};
use serde_json::Value;
use url::Url;

const PROVIDER: &str = "blobstore";

/// HTTP-backed blob-storage provider. Posts the raw bytes with Basic
/// credentials and expects `{"url": ...}` back.
pub struct HttpBlobStore {
    agent: ureq::Agent,
    endpoint: String,
    authorization: String,
}

impl HttpBlobStore {
    pub fn new(
        endpoint: &str,
        userid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<Self, String> {
        if timeout_ms == 0 {
            return Err("provider timeout must be > 0".to_string());
        }
        let parsed = Url::parse(endpoint)
            .map_err(|err| format!("invalid provider endpoint '{endpoint}': {err}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "provider endpoint '{endpoint}' must be http or https"
            ));
        }
        let timeout = Duration::from_millis(u64::from(timeout_ms).max(100));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent("filegate")
            .build();
        let credentials = BASE64_STANDARD.encode(format!("{userid}:{password}"));
        Ok(Self {
            agent,
            endpoint: endpoint.to_string(),
            authorization: format!("Basic {credentials}"),
        })
    }
}

impl BlobStore for HttpBlobStore {
    fn store(
        &self,
        name: &str,
        declared_size: u64,
        bytes: &[u8],
    ) -> Result<String, ProviderCallError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/octet-stream")
            .query("name", name)
            .query("size", &declared_size.to_string())
            .send_bytes(bytes)
            .map_err(provider_error_from_ureq)?;
        let body: Value = serde_json::from_reader(response.into_reader())
            .map_err(|_| ProviderCallError::new(PROVIDER, "json_parse", None))?;
        body.get("url")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| ProviderCallError::new(PROVIDER, "missing_url", None))
    }
}

fn provider_error_from_ureq(err: ureq::Error) -> ProviderCallError {
    match err {
        ureq::Error::Status(status, _) => {
            ProviderCallError::new(PROVIDER, "http_non_200", Some(status))
        }
        ureq::Error::Transport(transport) => {
            let combined = format!("{:?} {}", transport.kind(), transport);
            ProviderCallError::new(PROVIDER, classify_transport_error_kind(&combined), None)
        }
    }
}

fn classify_transport_error_kind(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") {
        "tls"
    } else if lower.contains("dns") {
        "dns"
    } else {
        "connection"
    }
}
