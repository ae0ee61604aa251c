use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get},
};
use std::{net::SocketAddr, str::FromStr, sync::Arc};

use crate::{
    Res,
    api::{self, guard::require_session, upload::BODY_LIMIT},
    auth::IdentityProvider,
    client::ApiClient,
    config::AppConfig,
    info,
    session::{SessionAccessor, SessionStore},
};

/// Identity provider plus the store its callback writes sessions into.
#[derive(Clone)]
pub struct LoginFlow {
    pub idp: IdentityProvider,
    pub store: SessionStore,
}

/// State shared by every handler. Cheap to clone; nothing in it changes after
/// startup except the contents of the session store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiClient,
    pub sessions: Arc<dyn SessionAccessor>,
    pub login: Option<LoginFlow>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Res<Self> {
        Self::with_store(config, SessionStore::new())
    }

    /// State backed by `store`, which both the guard and the auth routes use.
    pub fn with_store(config: AppConfig, store: SessionStore) -> Res<Self> {
        let login = match &config.identity {
            Some(identity) => Some(LoginFlow {
                idp: IdentityProvider::new(
                    identity.clone(),
                    config.audience.clone(),
                    config.request_timeout,
                )?,
                store: store.clone(),
            }),
            None => None,
        };

        let mut state = Self::with_sessions(config, Arc::new(store))?;
        state.login = login;
        Ok(state)
    }

    /// State with an arbitrary session accessor and no login flow.
    pub fn with_sessions(config: AppConfig, sessions: Arc<dyn SessionAccessor>) -> Res<Self> {
        let api = ApiClient::new(config.proxy_api_url(), config.request_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            api,
            sessions,
            login: None,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/recipes", any(api::recipes::collection))
        .route("/recipes/{id}", any(api::recipes::item))
        .route("/recipes/{id}/export-pdf", any(api::export::export_pdf))
        .route(
            "/upload-photo",
            any(api::upload::upload_photo).layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .route("/auth/me", get(api::auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let auth = Router::new()
        .route("/auth/login", get(api::auth::login))
        .route("/auth/callback", get(api::auth::callback))
        .route("/auth/logout", get(api::auth::logout));

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", guarded.merge(auth))
        .with_state(state)
}

pub async fn start_api_server(state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(&state.config.server_addr)
        .map_err(|e| format!("Failed to parse server address: {}", e))?;
    let upstream = state.config.proxy_api_url().to_string();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Proxy listening on http://{} (backend {})", addr, upstream);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
