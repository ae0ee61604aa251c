mod common;

use std::{collections::HashMap, time::Duration};

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use cookbook::{
    auth::{IdentityProvider, pkce, resolve_token},
    config::{AppConfig, IdentityConfig},
    error::AuthError,
    server::{AppState, router},
    session::{SessionAccessor, SessionStore, session_cookie, session_id},
    types::Session,
};
use reqwest::Url;
use tower::ServiceExt;

use common::{FakeSessions, test_token};

const AUDIENCE: &str = "https://api.test";

fn identity(token_url: &str) -> IdentityConfig {
    IdentityConfig {
        authorize_url: "https://idp.example.com/authorize".to_string(),
        token_url: token_url.to_string(),
        client_id: "cookbook-client".to_string(),
        redirect_uri: "http://127.0.0.1:3000/api/auth/callback".to_string(),
        scope: "openid profile".to_string(),
        logout_url: Some("https://idp.example.com/logout".to_string()),
    }
}

fn session() -> Session {
    Session {
        id: "s1".to_string(),
        token: test_token(None),
    }
}

fn query(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .expect("valid URL")
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_resolve_token_prefers_audience_scoped_token() {
    let sessions = FakeSessions::with_scoped("scoped");

    let token = resolve_token(&sessions, &session(), Some(AUDIENCE)).await;
    assert_eq!(token.as_deref(), Some("scoped"));
}

#[tokio::test]
async fn test_resolve_token_falls_back_to_default_token() {
    let sessions = FakeSessions::unscoped_only("plain");

    let token = resolve_token(&sessions, &session(), Some(AUDIENCE)).await;
    assert_eq!(token.as_deref(), Some("plain"));

    let token = resolve_token(&sessions, &session(), None).await;
    assert_eq!(token.as_deref(), Some("plain"));
}

#[tokio::test]
async fn test_resolve_token_without_any_token_is_none() {
    let sessions = FakeSessions::tokenless();

    assert_eq!(resolve_token(&sessions, &session(), Some(AUDIENCE)).await, None);
    assert_eq!(resolve_token(&sessions, &session(), None).await, None);
}

#[tokio::test]
async fn test_store_checks_audience_and_expiry() {
    let store = SessionStore::new();
    let id = store.create(test_token(Some(AUDIENCE))).await;
    let session = store.get(&id).await.expect("session");

    assert_eq!(
        store.access_token(&session, Some(AUDIENCE)).await.unwrap(),
        "session-token"
    );
    assert_eq!(store.access_token(&session, None).await.unwrap(), "session-token");
    assert!(matches!(
        store.access_token(&session, Some("https://other")).await,
        Err(AuthError::AudienceUnavailable(_))
    ));

    store.remove(&id).await;
    assert!(matches!(
        store.access_token(&session, None).await,
        Err(AuthError::NoSession)
    ));

    let mut expired = test_token(Some(AUDIENCE));
    expired.obtained_at -= expired.expires_in + 10;
    let id = store.create(expired).await;
    let session = store.get(&id).await.expect("session");
    assert!(matches!(
        store.access_token(&session, None).await,
        Err(AuthError::TokenExpired)
    ));
}

#[tokio::test]
async fn test_store_finds_session_by_cookie() {
    let store = SessionStore::new();
    let id = store.create(test_token(None)).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        format!("theme=dark; cookbook_session={}; lang=en", id)
            .parse()
            .unwrap(),
    );
    let session = store.session(&headers).await.expect("session");
    assert_eq!(session.id, id);

    store.remove(&id).await;
    assert!(store.session(&headers).await.is_none());
}

#[test]
fn test_session_id_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(session_id(&headers), None);

    headers.insert(header::COOKIE, "cookbook_session=".parse().unwrap());
    assert_eq!(session_id(&headers), None);

    headers.insert(header::COOKIE, "other=1;cookbook_session=abc".parse().unwrap());
    assert_eq!(session_id(&headers).as_deref(), Some("abc"));

    assert!(session_cookie("abc").starts_with("cookbook_session=abc;"));
    assert!(session_cookie("abc").contains("HttpOnly"));
}

#[tokio::test]
async fn test_pending_login_is_single_use() {
    let store = SessionStore::new();
    store.start_login("state-1", "verifier-1".to_string()).await;

    let pending = store.finish_login("state-1").await.expect("pending login");
    assert_eq!(pending.code_verifier, "verifier-1");
    assert!(store.finish_login("state-1").await.is_none());
    assert!(store.finish_login("unknown").await.is_none());
}

#[test]
fn test_generate_code_verifier() {
    let verifier = pkce::generate_code_verifier();

    assert_eq!(verifier.len(), 128);
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(verifier, pkce::generate_code_verifier());
}

#[test]
fn test_generate_code_challenge() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        pkce::generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_generate_state() {
    let state = pkce::generate_state();
    assert_eq!(state.len(), 32);
    assert_ne!(state, pkce::generate_state());
}

#[test]
fn test_authorize_url_carries_pkce_and_audience() {
    let idp = IdentityProvider::new(
        identity("http://127.0.0.1:1/oauth/token"),
        AUDIENCE,
        Duration::from_secs(5),
    )
    .unwrap();

    let url = idp.authorize_url("xyz", "challenge").unwrap();
    assert!(url.starts_with("https://idp.example.com/authorize?"));

    let params = query(&url);
    assert_eq!(params["client_id"], "cookbook-client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["audience"], AUDIENCE);
    assert_eq!(params["state"], "xyz");
    assert_eq!(params["code_challenge"], "challenge");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:3000/api/auth/callback");
}

#[tokio::test]
async fn test_exchange_and_refresh() {
    let (base, _) = common::spawn_backend().await;
    let idp = IdentityProvider::new(
        identity(&format!("{}/oauth/token", base)),
        AUDIENCE,
        Duration::from_secs(5),
    )
    .unwrap();

    let token = idp.exchange_code("good-code", "verifier").await.unwrap();
    assert_eq!(token.access_token, "idp-access-token");
    assert_eq!(token.refresh_token, "idp-refresh-token");
    assert_eq!(token.audience.as_deref(), Some(AUDIENCE));
    assert_eq!(token.expires_in, 600);

    let refreshed = idp.refresh("idp-refresh-token").await.unwrap();
    assert_eq!(refreshed.access_token, "refreshed-access-token");
    assert_eq!(refreshed.refresh_token, "idp-refresh-token");

    let err = idp.exchange_code("bad-code", "verifier").await.unwrap_err();
    assert!(matches!(err, AuthError::Exchange(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_browser_login_flow_opens_a_session() {
    let (base, recorder) = common::spawn_backend().await;
    let mut config = AppConfig::new(&base);
    config.audience = AUDIENCE.to_string();
    config.identity = Some(identity(&format!("{}/oauth/token", base)));
    let app = router(AppState::with_store(config, SessionStore::new()).unwrap());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let state = query(location)["state"].clone();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/auth/callback?code=good-code&state={}", state))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/recipes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let call = recorder.last_call().await.expect("recorded call");
    assert_eq!(call.authorization.as_deref(), Some("Bearer idp-access-token"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://idp.example.com/logout"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_callback_rejects_unknown_state() {
    let (base, recorder) = common::spawn_backend().await;
    let mut config = AppConfig::new(&base);
    config.identity = Some(identity(&format!("{}/oauth/token", base)));
    let app = router(AppState::with_store(config, SessionStore::new()).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/callback?code=good-code&state=forged")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(recorder.calls().await.is_empty());
}

#[tokio::test]
async fn test_expired_session_is_treated_as_absent_and_dropped() {
    let store = SessionStore::new();
    let mut token = test_token(None);
    token.obtained_at = 0;
    token.expires_in = 1;
    let id = store.create(token).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        format!("cookbook_session={}", id).parse().unwrap(),
    );

    assert!(store.session(&headers).await.is_none());
    assert!(store.get(&id).await.is_none());
}

#[tokio::test]
async fn test_creating_a_session_drops_expired_ones() {
    let store = SessionStore::new();
    let mut expired = test_token(None);
    expired.obtained_at = 0;
    expired.expires_in = 1;
    let stale = store.create(expired).await;
    assert!(store.get(&stale).await.is_some());

    let fresh = store.create(test_token(None)).await;

    assert!(store.get(&stale).await.is_none());
    assert!(store.get(&fresh).await.is_some());
}

#[tokio::test]
async fn test_expired_session_is_rejected_by_the_guard() {
    let (base, recorder) = common::spawn_backend().await;
    let store = SessionStore::new();
    let mut token = test_token(None);
    token.obtained_at = 0;
    token.expires_in = 1;
    let id = store.create(token).await;

    let app = router(AppState::with_store(AppConfig::new(&base), store).unwrap());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes")
                .header(header::COOKIE, format!("cookbook_session={}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(recorder.calls().await.is_empty());
}
