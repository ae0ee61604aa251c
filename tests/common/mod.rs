#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Form, Multipart, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cookbook::{
    config::AppConfig,
    error::AuthError,
    server::{AppState, router},
    session::{SessionAccessor, session_id},
    types::{Session, Token},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::Mutex;

pub const VALID_SESSION: &str = "valid";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

/// Stand-in backend that records every call it receives.
#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<RecordedCall>>,
    recipes: Mutex<HashMap<String, Value>>,
    next_id: AtomicU64,
}

impl Recorder {
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().await.last().cloned()
    }
}

async fn record(State(recorder): State<Arc<Recorder>>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let call = RecordedCall {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
    };
    recorder.calls.lock().await.push(call);
    next.run(request).await
}

async fn list_recipes(State(recorder): State<Arc<Recorder>>) -> Json<Value> {
    let recipes = recorder.recipes.lock().await;
    Json(Value::Array(recipes.values().cloned().collect()))
}

async fn create_recipe(
    State(recorder): State<Arc<Recorder>>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    let id = format!("r{}", recorder.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    body["id"] = Value::String(id.clone());
    recorder.recipes.lock().await.insert(id, body.clone());
    Json(body)
}

async fn get_recipe(State(recorder): State<Arc<Recorder>>, Path(id): Path<String>) -> Response {
    if id == "plain" {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            "plain recipe",
        )
            .into_response();
    }
    match recorder.recipes.lock().await.get(&id) {
        Some(recipe) => Json(recipe.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response(),
    }
}

async fn update_recipe(
    State(recorder): State<Arc<Recorder>>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut recipes = recorder.recipes.lock().await;
    if !recipes.contains_key(&id) {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response();
    }
    body["id"] = Value::String(id.clone());
    recipes.insert(id, body.clone());
    Json(body).into_response()
}

async fn delete_recipe(State(recorder): State<Arc<Recorder>>, Path(id): Path<String>) -> StatusCode {
    match recorder.recipes.lock().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn export_pdf(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "url": format!("/files/{}.pdf", id),
        "style": body.get("style").cloned().unwrap_or(Value::Null),
    }))
}

async fn upload_photo(mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();

        return match filename.as_str() {
            "broken.jpg" => (StatusCode::OK, "definitely not json").into_response(),
            "too-big.jpg" => (
                StatusCode::PAYLOAD_TOO_LARGE,
                [(header::CONTENT_TYPE, "text/plain")],
                "Request Entity Too Large",
            )
                .into_response(),
            "rejected.jpg" => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": "unsupported image" })),
            )
                .into_response(),
            "absolute.jpg" => Json(json!({
                "photo_url": "https://cdn.example.com/abc.jpg",
            }))
            .into_response(),
            _ => Json(json!({
                "photo_url": "/photos/abc.jpg",
                "filename": filename,
                "content_type": content_type,
                "size": size,
            }))
            .into_response(),
        };
    }
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": "no file" }))).into_response()
}

async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Response {
    match (form.get("grant_type").map(String::as_str), form.get("code").map(String::as_str)) {
        (Some("authorization_code"), Some("good-code")) => Json(json!({
            "access_token": "idp-access-token",
            "refresh_token": "idp-refresh-token",
            "scope": "openid profile",
            "expires_in": 600,
        }))
        .into_response(),
        (Some("refresh_token"), _) => Json(json!({
            "access_token": "refreshed-access-token",
            "expires_in": 600,
        }))
        .into_response(),
        _ => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response(),
    }
}

/// Serves the stand-in backend on an ephemeral port.
pub async fn spawn_backend() -> (String, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());

    let app = Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/{id}/export-pdf", post(export_pdf))
        .route(
            "/upload-photo",
            post(upload_photo).layer(DefaultBodyLimit::max(8 * 1024 * 1024)),
        )
        .route("/oauth/token", post(token_endpoint))
        .route(
            "/text",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "hello plain") }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))) }),
        )
        .route("/empty-404", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/broken-json",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{not json") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "ok": true }))
            }),
        )
        .layer(middleware::from_fn_with_state(recorder.clone(), record))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stand-in backend");
    let addr = listener.local_addr().expect("backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stand-in backend");
    });

    (format!("http://{}", addr), recorder)
}

pub fn test_token(audience: Option<&str>) -> Token {
    Token {
        access_token: "session-token".to_string(),
        refresh_token: String::new(),
        scope: "openid".to_string(),
        audience: audience.map(str::to_string),
        expires_in: 3600,
        obtained_at: chrono::Utc::now().timestamp() as u64,
    }
}

/// Session accessor with fixed answers. The session exists when the request
/// carries `cookbook_session=valid`.
pub struct FakeSessions {
    pub scoped: Option<String>,
    pub unscoped: Option<String>,
}

impl FakeSessions {
    pub fn with_scoped(token: &str) -> Self {
        Self {
            scoped: Some(token.to_string()),
            unscoped: Some("unscoped-token".to_string()),
        }
    }

    pub fn unscoped_only(token: &str) -> Self {
        Self {
            scoped: None,
            unscoped: Some(token.to_string()),
        }
    }

    pub fn tokenless() -> Self {
        Self {
            scoped: None,
            unscoped: None,
        }
    }
}

#[async_trait]
impl SessionAccessor for FakeSessions {
    async fn session(&self, headers: &HeaderMap) -> Option<Session> {
        match session_id(headers) {
            Some(id) if id == VALID_SESSION => Some(Session {
                id,
                token: test_token(None),
            }),
            _ => None,
        }
    }

    async fn access_token(
        &self,
        _session: &Session,
        audience: Option<&str>,
    ) -> Result<String, AuthError> {
        match audience {
            Some(audience) => self
                .scoped
                .clone()
                .ok_or_else(|| AuthError::AudienceUnavailable(audience.to_string())),
            None => self.unscoped.clone().ok_or(AuthError::TokenExpired),
        }
    }
}

pub fn proxy(backend_url: &str, sessions: FakeSessions) -> Router {
    let state = AppState::with_sessions(AppConfig::new(backend_url), Arc::new(sessions))
        .expect("proxy state");
    router(state)
}

pub fn request(method: &str, uri: &str, signed_in: bool, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if signed_in {
        builder = builder.header(header::COOKIE, format!("theme=dark; cookbook_session={}", VALID_SESSION));
    }
    builder.body(body).expect("request")
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("cookbook_session={}", VALID_SESSION))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}

/// Multipart body with one file field.
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "cookbook-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}

pub fn upload_request(content_type: &str, body: Vec<u8>, signed_in: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload-photo")
        .header(header::CONTENT_TYPE, content_type);
    if signed_in {
        builder = builder.header(header::COOKIE, format!("cookbook_session={}", VALID_SESSION));
    }
    builder.body(Body::from(body)).expect("request")
}
