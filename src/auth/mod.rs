//! # Auth Module
//!
//! Token resolution for the proxy routes and the identity provider
//! integration behind `/api/auth/*` and the `login` page.
//!
//! - [`resolve_token`] - obtains a bearer token for a session, first scoped to
//!   an audience, then unscoped; never fails the caller
//! - [`IdentityProvider`] - OAuth 2.0 authorization code flow with PKCE
//! - [`pkce`] - verifier, challenge and state generation

mod idp;
pub mod pkce;

pub use idp::IdentityProvider;

use crate::{session::SessionAccessor, types::Session, warning};

/// Resolves a bearer token for `session`.
///
/// Asks for an `audience`-scoped token first. When that fails, or no audience
/// is given, falls back to the session's default token. Returns `None` when
/// neither attempt succeeds; callers decide whether to proceed without a
/// token or reject the request. Session state is only read.
pub async fn resolve_token(
    sessions: &dyn SessionAccessor,
    session: &Session,
    audience: Option<&str>,
) -> Option<String> {
    if let Some(audience) = audience {
        match sessions.access_token(session, Some(audience)).await {
            Ok(token) => return Some(token),
            Err(e) => warning!("Scoped token unavailable, falling back: {}", e),
        }
    }

    match sessions.access_token(session, None).await {
        Ok(token) => Some(token),
        Err(e) => {
            warning!("No access token for session: {}", e);
            None
        }
    }
}
