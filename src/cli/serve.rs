use crate::{
    config::AppConfig,
    error,
    server::{AppState, start_api_server},
    warning,
};

pub async fn serve(config: &AppConfig) {
    if config.identity.is_none() {
        warning!("No identity provider configured; /api/auth/* will answer 501");
    }

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => error!("Cannot start proxy. Err: {}", e),
    };

    if let Err(e) = start_api_server(state).await {
        error!("Proxy stopped. Err: {}", e);
    }
}
