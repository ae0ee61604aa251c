//! # API Module
//!
//! HTTP handlers of the cookbook proxy server. The browser never talks to the
//! backend API directly; it calls these routes, which check for a signed-in
//! session, attach a bearer token and relay the call.
//!
//! ## Endpoints
//!
//! ### Recipes (session required)
//!
//! - [`recipes::collection`] - `GET`/`POST /api/recipes`
//! - [`recipes::item`] - `GET`/`PUT`/`DELETE /api/recipes/{id}`
//! - [`export::export_pdf`] - `POST /api/recipes/{id}/export-pdf`
//! - [`upload::upload_photo`] - `POST /api/upload-photo` (multipart)
//!
//! ### Authentication
//!
//! - [`auth::login`], [`auth::callback`], [`auth::logout`] - identity provider
//!   round trip under `/api/auth/*`
//! - [`auth::me`] - details of the current session (session required)
//!
//! ### Monitoring
//!
//! - [`health`] - status and version, no session required
//!
//! ## Guarantees
//!
//! Every handler answers with a well-formed response. Backend statuses and
//! bodies are relayed unchanged; failures of the forwarding itself become a
//! 500 with an `{"error": ...}` body; unsupported verbs get a 405 with an
//! `Allow` header.

pub mod auth;
pub mod export;
pub mod guard;
mod health;
pub mod recipes;
pub mod relay;
pub mod upload;

pub use health::health;
