use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::session::ScopedClient;
use crate::models::User;
use crate::AppState;

/// Where unauthenticated visitors of gated pages are sent.
pub const AUTH_PAGE: &str = "/auth";

/// Signed-in user for dashboard pages.
///
/// Rejects with a redirect to [`AUTH_PAGE`] when the session cookie is
/// missing, rejected by the provider, or cannot be checked.
pub struct RequireUser {
    pub user: User,
    pub client: ScopedClient,
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let client = ScopedClient::from_parts(parts, state);

        match client.current_user().await {
            Ok(Some(user)) => Ok(RequireUser { user, client }),
            Ok(None) => {
                tracing::debug!(path = %parts.uri.path(), "Unauthenticated dashboard request");
                Err(Redirect::to(AUTH_PAGE).into_response())
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %parts.uri.path(), "Could not verify session");
                Err(Redirect::to(AUTH_PAGE).into_response())
            }
        }
    }
}
