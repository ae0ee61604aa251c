//! Configuration management for the cookbook proxy and pages.
//!
//! Configuration is read from the process environment exactly once, at
//! startup, into an immutable [`AppConfig`] value. The value is handed to the
//! HTTP client, the router and the terminal pages explicitly; nothing in the
//! crate reads the environment at request time.
//!
//! Sources, highest priority first:
//! 1. Environment variables
//! 2. `.env` file in the local data directory (`cookbook/.env`)
//! 3. Defaults documented on each field

use std::{env, path::PathBuf, time::Duration};

/// Audience requested when `COOKBOOK_AUDIENCE` is not set.
pub const DEFAULT_AUDIENCE: &str = "https://api.cookbook";

/// Address the proxy binds to when `SERVER_ADDRESS` is not set.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";

/// Scope requested from the identity provider when `AUTH_SCOPE` is not set.
pub const DEFAULT_SCOPE: &str = "openid profile email offline_access";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives at `<data dir>/cookbook/.env`:
/// - Linux: `~/.local/share/cookbook/.env`
/// - macOS: `~/Library/Application Support/cookbook/.env`
/// - Windows: `%LOCALAPPDATA%/cookbook/.env`
///
/// A missing file is not an error; the process environment alone may carry
/// the whole configuration.
///
/// # Errors
///
/// Fails if the parent directory cannot be created or the file exists but
/// cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.exists() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("cookbook/.env");
    path
}

/// Identity provider endpoints used by the `/api/auth/*` routes and `login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub logout_url: Option<String>,
}

/// Process-wide configuration, immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `COOKBOOK_API_URL`: origin used by the pages.
    pub public_api_url: String,
    /// `COOKBOOK_SERVER_API_URL`: origin preferred by the proxy routes.
    pub server_api_url: Option<String>,
    /// `COOKBOOK_AUDIENCE`, defaults to [`DEFAULT_AUDIENCE`].
    pub audience: String,
    /// `SERVER_ADDRESS`, defaults to [`DEFAULT_SERVER_ADDRESS`].
    pub server_addr: String,
    /// `COOKBOOK_REQUEST_TIMEOUT_SECS`, defaults to 30 seconds.
    pub request_timeout: Duration,
    /// Present only when `AUTH_AUTHORIZE_URL`, `AUTH_TOKEN_URL` and
    /// `AUTH_CLIENT_ID` are all set.
    pub identity: Option<IdentityConfig>,
}

impl AppConfig {
    /// Builds a configuration with defaults around a public API origin.
    pub fn new(public_api_url: impl Into<String>) -> Self {
        Self {
            public_api_url: trim_origin(public_api_url.into()),
            server_api_url: None,
            audience: DEFAULT_AUDIENCE.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            identity: None,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `COOKBOOK_API_URL` is missing, when the timeout is not a
    /// positive integer, or when the identity provider variables are only
    /// partially set.
    pub fn from_env() -> Result<Self, String> {
        let public_api_url = var("COOKBOOK_API_URL").ok_or("COOKBOOK_API_URL must be set")?;
        let mut config = Self::new(public_api_url);

        config.server_api_url = var("COOKBOOK_SERVER_API_URL").map(trim_origin);
        if let Some(audience) = var("COOKBOOK_AUDIENCE") {
            config.audience = audience;
        }
        if let Some(addr) = var("SERVER_ADDRESS") {
            config.server_addr = addr;
        }
        if let Some(secs) = var("COOKBOOK_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or("COOKBOOK_REQUEST_TIMEOUT_SECS must be a positive integer")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.identity = match (
            var("AUTH_AUTHORIZE_URL"),
            var("AUTH_TOKEN_URL"),
            var("AUTH_CLIENT_ID"),
        ) {
            (Some(authorize_url), Some(token_url), Some(client_id)) => Some(IdentityConfig {
                authorize_url,
                token_url,
                client_id,
                redirect_uri: var("AUTH_REDIRECT_URI").unwrap_or_else(|| {
                    format!("http://{}/api/auth/callback", config.server_addr)
                }),
                scope: var("AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                logout_url: var("AUTH_LOGOUT_URL"),
            }),
            (None, None, None) => None,
            _ => {
                return Err(
                    "AUTH_AUTHORIZE_URL, AUTH_TOKEN_URL and AUTH_CLIENT_ID must be set together"
                        .to_string(),
                );
            }
        };

        Ok(config)
    }

    /// Origin the proxy routes forward to: the server-only URL when present,
    /// the public one otherwise.
    pub fn proxy_api_url(&self) -> &str {
        self.server_api_url
            .as_deref()
            .unwrap_or(&self.public_api_url)
    }

    /// Base URL of the proxy server itself, used for `/api/` paths.
    pub fn local_url(&self) -> String {
        format!("http://{}", self.server_addr)
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn trim_origin(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
