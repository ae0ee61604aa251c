use std::time::{Duration, Instant};

use crate::{
    config::AppConfig,
    error, info,
    management::TokenCache,
    server::{AppState, start_api_server},
    session::SessionStore,
    success,
    types::Session,
    warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Signs in through the identity provider.
///
/// Runs the proxy in-process, sends the browser to its login route and waits
/// for the callback to open a session. The session's token is then cached for
/// the other pages.
pub async fn login(config: &AppConfig) {
    if config.identity.is_none() {
        error!(
            "No identity provider configured. Set AUTH_AUTHORIZE_URL, AUTH_TOKEN_URL and AUTH_CLIENT_ID."
        );
    }

    let store = SessionStore::new();
    let state = match AppState::with_store(config.clone(), store.clone()) {
        Ok(state) => state,
        Err(e) => error!("Cannot start login server. Err: {}", e),
    };

    tokio::spawn(async move {
        if let Err(e) = start_api_server(state).await {
            warning!("Login server stopped: {}", e);
        }
    });

    let login_url = format!("{}/api/auth/login", config.local_url());
    info!("Opening {} in your browser...", login_url);
    if webbrowser::open(&login_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            login_url
        )
    }

    match wait_for_session(&store).await {
        Some(session) => {
            if let Err(e) = TokenCache::new(session.token).persist().await {
                error!("Failed to save token to cache: {}", e);
            }
            success!("Logged in!");
        }
        None => error!("Login failed or timed out."),
    }
}

pub async fn logout() {
    match TokenCache::clear().await {
        Ok(()) => success!("Logged out."),
        Err(e) => error!("Failed to remove cached token: {}", e),
    }
}

async fn wait_for_session(store: &SessionStore) -> Option<Session> {
    let start = Instant::now();

    while start.elapsed() < LOGIN_TIMEOUT {
        if let Some(session) = store.first().await {
            return Some(session);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
