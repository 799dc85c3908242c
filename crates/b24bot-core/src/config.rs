use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const DEFAULT_TOKENS_FILE: &str = "tokens.json";
const DEFAULT_OAUTH_URL: &str = "https://oauth.bitrix.info";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Path of the OAuth install endpoint relative to `host_url`.
pub const INSTALL_PATH: &str = "/install";
/// Path of the robot handler endpoint relative to `host_url`.
pub const HANDLER_PATH: &str = "/handler";

/// Typed configuration for the robot service.
#[derive(Clone, Debug)]
pub struct Config {
    // OAuth application
    pub client_id: String,
    pub client_secret: String,
    pub oauth_url: String,

    /// Public base URL of this deployment, without a trailing slash.
    pub host_url: String,

    // Runtime
    pub tokens_file: PathBuf,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .and_then(non_empty)
                .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
        };

        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let host_url = required("HOST_URL")?.trim().trim_end_matches('/').to_string();

        let oauth_url = lookup("BITRIX_OAUTH_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_OAUTH_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let tokens_file = PathBuf::from(
            lookup("TOKENS_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_TOKENS_FILE.to_string()),
        );

        let bind_raw = lookup("BIND_ADDR")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("BIND_ADDR {bind_raw:?} is invalid: {e}")))?;

        let request_timeout = Duration::from_secs(
            lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Ok(Self {
            client_id,
            client_secret,
            oauth_url,
            host_url,
            tokens_file,
            bind_addr,
            request_timeout,
        })
    }

    /// OAuth redirect URI registered for the application.
    pub fn redirect_uri(&self) -> String {
        format!("{}{INSTALL_PATH}", self.host_url)
    }

    /// Handler URL the portal calls when the robot step runs.
    pub fn handler_url(&self) -> String {
        format!("{}{HANDLER_PATH}", self.host_url)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
