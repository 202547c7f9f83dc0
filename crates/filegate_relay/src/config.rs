#![forbid(unsafe_code)]

use std::path::PathBuf;

use filegate_contracts::{QuotaLimits, DEFAULT_MAX_FILES, DEFAULT_MAX_KEYS};

pub const DEFAULT_PROVIDER_TIMEOUT_MS: u32 = 30_000;

pub const USAGE: &str = "usage: filegate_http --port <port> --statefile <path> --endpoint <url> \
--userid <id> --password <secret> [--maxfiles <n>] [--maxkeys <n>] [--provider-timeout-ms <ms>]";

/// Parsed service configuration. `password` doubles as the shutdown shared
/// secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub statefile: PathBuf,
    pub limits: QuotaLimits,
    pub endpoint: String,
    pub userid: String,
    pub password: String,
    pub provider_timeout_ms: u32,
}

impl ServiceConfig {
    /// Parses `--option value` pairs; the iterator excludes the program
    /// name.
    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut port: Option<u16> = None;
        let mut statefile: Option<PathBuf> = None;
        let mut endpoint: Option<String> = None;
        let mut userid: Option<String> = None;
        let mut password: Option<String> = None;
        let mut max_files = DEFAULT_MAX_FILES;
        let mut max_keys = DEFAULT_MAX_KEYS;
        let mut provider_timeout_ms = DEFAULT_PROVIDER_TIMEOUT_MS;

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let value = args
                .next()
                .ok_or_else(|| format!("missing value for '{flag}'\n{USAGE}"))?;
            match flag.as_str() {
                "--port" => {
                    let parsed: u16 = value
                        .parse()
                        .map_err(|_| format!("invalid --port '{value}'"))?;
                    if parsed == 0 {
                        return Err("--port must be nonzero".to_string());
                    }
                    port = Some(parsed);
                }
                "--statefile" => statefile = Some(PathBuf::from(value)),
                "--endpoint" => endpoint = Some(value),
                "--userid" => userid = Some(value),
                "--password" => password = Some(value),
                "--maxfiles" => {
                    max_files = value
                        .parse()
                        .map_err(|_| format!("invalid --maxfiles '{value}'"))?;
                }
                "--maxkeys" => {
                    max_keys = value
                        .parse()
                        .map_err(|_| format!("invalid --maxkeys '{value}'"))?;
                }
                "--provider-timeout-ms" => {
                    provider_timeout_ms = value
                        .parse()
                        .map_err(|_| format!("invalid --provider-timeout-ms '{value}'"))?;
                }
                other => return Err(format!("unrecognized option '{other}'\n{USAGE}")),
            }
        }

        let limits = QuotaLimits::v1(max_files, max_keys)
            .map_err(|violation| format!("invalid quota limits: {violation:?}"))?;
        if provider_timeout_ms == 0 {
            return Err("--provider-timeout-ms must be nonzero".to_string());
        }

        Ok(Self {
            port: port.ok_or_else(|| format!("--port is required\n{USAGE}"))?,
            statefile: statefile.ok_or_else(|| format!("--statefile is required\n{USAGE}"))?,
            limits,
            endpoint: endpoint.ok_or_else(|| format!("--endpoint is required\n{USAGE}"))?,
            userid: userid.ok_or_else(|| format!("--userid is required\n{USAGE}"))?,
            password: password.ok_or_else(|| format!("--password is required\n{USAGE}"))?,
            provider_timeout_ms,
        })
    }
}
