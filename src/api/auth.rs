use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;

use super::relay::error_response;
use crate::{
    auth::pkce,
    error::AuthError,
    server::AppState,
    session::{expired_session_cookie, session_cookie, session_id},
    types::Session,
    warning,
};

fn not_configured() -> Response {
    error_response(
        StatusCode::NOT_IMPLEMENTED,
        AuthError::NotConfigured.to_string(),
    )
}

/// `GET /api/auth/login`: starts the authorization code flow with PKCE.
pub async fn login(State(state): State<AppState>) -> Response {
    let Some(flow) = &state.login else {
        return not_configured();
    };

    let code_verifier = pkce::generate_code_verifier();
    let code_challenge = pkce::generate_code_challenge(&code_verifier);
    let login_state = pkce::generate_state();

    match flow.idp.authorize_url(&login_state, &code_challenge) {
        Ok(url) => {
            flow.store.start_login(&login_state, code_verifier).await;
            Redirect::to(&url).into_response()
        }
        Err(e) => {
            warning!("Cannot build authorization URL: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `GET /api/auth/callback`: exchanges the code, opens a session and sends
/// the browser home with the session cookie.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(flow) = &state.login else {
        return not_configured();
    };

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or_default();
        warning!("Identity provider refused login: {} {}", error, description);
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Login was refused by the identity provider.</h4>"),
        )
            .into_response();
    }

    let (Some(code), Some(login_state)) = (params.get("code"), params.get("state")) else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing authorization code.</h4>"),
        )
            .into_response();
    };

    let Some(pending) = flow.store.finish_login(login_state).await else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Unknown or expired login attempt.</h4>"),
        )
            .into_response();
    };

    match flow.idp.exchange_code(code, &pending.code_verifier).await {
        Ok(token) => {
            let id = flow.store.create(token).await;
            ([(SET_COOKIE, session_cookie(&id))], Redirect::to("/")).into_response()
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            (StatusCode::BAD_GATEWAY, Html("<h4>Login failed.</h4>")).into_response()
        }
    }
}

/// `GET /api/auth/logout`: drops the session and expires the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(flow) = &state.login else {
        return not_configured();
    };

    if let Some(id) = session_id(&headers) {
        flow.store.remove(&id).await;
    }

    let target = flow.idp.logout_url().unwrap_or("/");
    ([(SET_COOKIE, expired_session_cookie())], Redirect::to(target)).into_response()
}

/// `GET /api/auth/me`: what the proxy knows about the current session.
pub async fn me(Extension(session): Extension<Session>) -> Response {
    let token = &session.token;
    Json(json!({
        "scope": token.scope,
        "audience": token.audience,
        "expires_at": token.obtained_at + token.expires_in,
    }))
    .into_response()
}
