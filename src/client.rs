//! Typed HTTP client for the backend API.
//!
//! Every call to the backend, from the terminal pages and from the proxy
//! routes alike, goes through [`ApiClient`]. It owns the one implementation of
//! response decoding: a body declared as JSON is parsed (an unparsable body
//! becomes an empty object), anything else is kept as text.
//!
//! Paths that start with [`PROXY_PREFIX`] address the proxy server itself and
//! are resolved against the client's local origin instead of the API origin.

use std::time::Duration;

use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_TYPE, HeaderValue},
    multipart::Form,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Paths under this prefix belong to the proxy server, not the backend.
pub const PROXY_PREFIX: &str = "/api/";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    /// Reads and decodes a response body according to its content type.
    pub async fn read(response: Response) -> ApiResult<Self> {
        let is_json = is_json(response.headers().get(CONTENT_TYPE));
        let text = response.text().await?;
        Ok(Self::decode(is_json, text))
    }

    fn decode(is_json: bool, text: String) -> Self {
        if is_json {
            ApiBody::Json(serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Map::new())))
        } else {
            ApiBody::Text(text)
        }
    }

    /// True for an empty text body, `null` or an empty JSON object.
    pub fn is_empty(&self) -> bool {
        match self {
            ApiBody::Json(Value::Null) => true,
            ApiBody::Json(Value::Object(map)) => map.is_empty(),
            ApiBody::Json(_) => false,
            ApiBody::Text(text) => text.trim().is_empty(),
        }
    }

    /// Converts the body into the caller's type. Text bodies are handed over
    /// as a JSON string, so `T = String` receives the raw text.
    pub fn into_typed<T: DeserializeOwned>(self) -> ApiResult<T> {
        let value = match self {
            ApiBody::Json(value) => value,
            ApiBody::Text(text) => Value::String(text),
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Message used when the body accompanies a failed status.
    pub fn error_message(&self, status: StatusCode) -> String {
        if self.is_empty() {
            return status.canonical_reason().unwrap_or("Unknown error").to_string();
        }
        match self {
            ApiBody::Json(Value::String(text)) | ApiBody::Text(text) => text.clone(),
            ApiBody::Json(value) => value.to_string(),
        }
    }
}

/// Content types containing `application/json` are decoded as JSON.
pub fn is_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}

/// Status and decoded body of a backend response, success or not.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: ApiBody,
}

impl ApiResponse {
    /// Turns a non-success status into [`ApiError::Status`].
    pub fn into_result(self) -> ApiResult<ApiBody> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(ApiError::Status {
                status: self.status,
                message: self.body.error_message(self.status),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    local_url: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("cookbook/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            local_url: None,
        })
    }

    /// Sets the origin that `/api/` paths resolve against.
    pub fn with_local_url(mut self, local_url: impl Into<String>) -> Self {
        self.local_url = Some(local_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path`.
    pub fn resolve(&self, path: &str) -> ApiResult<String> {
        if path.starts_with(PROXY_PREFIX) {
            return match &self.local_url {
                Some(local) => Ok(format!("{}{}", local, path)),
                None => Err(ApiError::Config(format!(
                    "no local origin configured for proxy path {}",
                    path
                ))),
            };
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Sends a request and decodes the body without judging the status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let url = self.resolve(path)?;
        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            // `.json` sets `Content-Type: application/json`
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = ApiBody::read(response).await?;

        Ok(ApiResponse { status, body })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ApiResult<T> {
        self.call(Method::GET, path, None, token).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, Some(&body), token).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.call(Method::PUT, path, Some(&body), token).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ApiResult<T> {
        self.call(Method::DELETE, path, None, token).await
    }

    /// POSTs a multipart form. Like [`ApiClient::send`], the status is left
    /// for the caller to judge.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: Form,
        token: &str,
    ) -> ApiResult<ApiResponse> {
        let url = self.resolve(path)?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = ApiBody::read(response).await?;
        Ok(ApiResponse { status, body })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<T> {
        self.send(method, path, body, token)
            .await?
            .into_result()?
            .into_typed()
    }
}
