use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::middleware::session::{clear_session, store_session};
use crate::middleware::{ScopedClient, AUTH_PAGE};
use crate::AppState;

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub viewer_email: Option<String>,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-in page. Visitors who already have a session go straight to the dashboard.
pub async fn auth_page(client: ScopedClient) -> Response {
    if let Ok(Some(_)) = client.current_user().await {
        return Redirect::to("/dashboard").into_response();
    }

    AuthTemplate {
        viewer_email: None,
        email: String::new(),
        error: None,
    }
    .into_response()
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();

    match state
        .identity
        .sign_in_with_password(&email, &form.password)
        .await
    {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "User signed in");
            let jar = store_session(jar, &session, state.settings.server.secure_cookies);
            (jar, Redirect::to("/dashboard")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            (
                StatusCode::UNAUTHORIZED,
                AuthTemplate {
                    viewer_email: None,
                    email,
                    error: Some(e.to_string()),
                },
            )
                .into_response()
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    client: ScopedClient,
    jar: CookieJar,
) -> Response {
    // The browser is signed out even if the provider cannot be reached.
    if let Err(e) = client.sign_out().await {
        tracing::warn!(error = %e, "Failed to revoke session during sign-out");
    }

    let jar = clear_session(jar, state.settings.server.secure_cookies);
    (jar, Redirect::to(AUTH_PAGE)).into_response()
}
