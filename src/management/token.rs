use std::path::PathBuf;

use chrono::Utc;

use crate::{auth::IdentityProvider, types::Token, warning};

/// Seconds before expiry at which a cached token is refreshed.
const REFRESH_MARGIN_SECS: u64 = 240;

/// Access token of the terminal pages, persisted between invocations.
pub struct TokenCache {
    token: Token,
}

impl TokenCache {
    pub fn new(token: Token) -> Self {
        TokenCache { token }
    }

    pub async fn load() -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json).await.map_err(|e| e.to_string())
    }

    /// Removes the cached token. A missing cache is not an error.
    pub async fn clear() -> Result<(), String> {
        match async_fs::remove_file(Self::token_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Access token, refreshed through `idp` when close to expiry. If the
    /// refresh fails the old token is returned and the backend decides.
    pub async fn valid_token(&mut self, idp: Option<&IdentityProvider>) -> String {
        let now = Utc::now().timestamp() as u64;
        let refreshable = !self.token.refresh_token.is_empty();

        if self.token.expires_within(now, REFRESH_MARGIN_SECS) && refreshable {
            if let Some(idp) = idp {
                match idp.refresh(&self.token.refresh_token).await {
                    Ok(token) => {
                        self.token = token;
                        if let Err(e) = self.persist().await {
                            warning!("Failed to save refreshed token: {}", e);
                        }
                    }
                    Err(e) => warning!("Token refresh failed: {}", e),
                }
            }
        }

        self.token.access_token.clone()
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("cookbook/cache/token.json");
        path
    }
}
