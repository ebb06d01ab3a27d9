//! Auth cookie bridge.
//!
//! The provider session lives in two cookies. Each request gets its own
//! [`ScopedClient`] built from them, and [`refresh_session_middleware`]
//! keeps the pair fresh before handlers see it.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;

use crate::models::{Session, User, UserRow};
use crate::services::{IdentityClient, ProviderError, RecordsClient, TableQuery};
use crate::utils::jwt;
use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Refresh when the access token has less than this many seconds left.
const REFRESH_MARGIN_SECS: i64 = 30;

const SESSION_COOKIE_MAX_AGE: time::Duration = time::Duration::days(30);

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(SESSION_COOKIE_MAX_AGE)
        .build()
}

/// Cookies carrying a freshly issued session.
pub fn session_cookies(session: &Session, secure: bool) -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), secure),
        session_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone(), secure),
    ]
}

/// Cookies that expire the session in the browser.
pub fn cleared_session_cookies(secure: bool) -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE].map(|name| {
        let mut cookie = session_cookie(name, String::new(), secure);
        cookie.make_removal();
        cookie
    })
}

pub fn store_session(jar: CookieJar, session: &Session, secure: bool) -> CookieJar {
    session_cookies(session, secure)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie))
}

pub fn clear_session(jar: CookieJar, secure: bool) -> CookieJar {
    cleared_session_cookies(secure)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie))
}

/// Provider client bound to the current request's session cookies.
#[derive(Clone)]
pub struct ScopedClient {
    identity: IdentityClient,
    records: RecordsClient,
    access_token: Option<String>,
}

impl ScopedClient {
    pub fn new(identity: IdentityClient, records: RecordsClient, access_token: Option<String>) -> Self {
        Self {
            identity,
            records,
            access_token,
        }
    }

    /// Bind the provider clients to the access token cookie of `parts`.
    pub fn from_parts(parts: &Parts, state: &AppState) -> Self {
        let jar = CookieJar::from_headers(&parts.headers);
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        ScopedClient::new(state.identity.clone(), state.records.clone(), access_token)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The signed-in user, or `None` when there is no session or the provider
    /// rejects the token.
    pub async fn current_user(&self) -> Result<Option<User>, ProviderError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        match self.identity.get_user(token).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(error = %e, "Session token rejected by provider");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_password(&self, password: &str) -> Result<User, ProviderError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidRequest("Not authenticated".to_string()))?;
        self.identity.update_password(token, password).await
    }

    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        match self.access_token.as_deref() {
            Some(token) => self.identity.sign_out(token).await,
            None => Ok(()),
        }
    }

    /// Table query evaluated as the signed-in user (anonymous when signed out).
    pub fn table(&self, table: &str) -> TableQuery {
        let query = self.records.table(table);
        match &self.access_token {
            Some(token) => query.bearer(token.clone()),
            None => query,
        }
    }

    /// The `users` row of `user`, if one exists.
    pub async fn user_row(&self, user: &User) -> Result<Option<UserRow>, ProviderError> {
        self.table("users")
            .select(UserRow::COLUMNS)
            .eq("id", &user.id)
            .fetch_optional()
            .await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ScopedClient {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(ScopedClient::from_parts(parts, state))
    }
}

/// Rebuild the request `Cookie` header, replacing or dropping the session pair.
fn rewrite_cookie_header(req: &mut Request, jar: &CookieJar, session: Option<&Session>) {
    let mut pairs: Vec<String> = jar
        .iter()
        .filter(|c| c.name() != ACCESS_TOKEN_COOKIE && c.name() != REFRESH_TOKEN_COOKIE)
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect();

    if let Some(session) = session {
        pairs.push(format!("{}={}", ACCESS_TOKEN_COOKIE, session.access_token));
        pairs.push(format!("{}={}", REFRESH_TOKEN_COOKIE, session.refresh_token));
    }

    req.headers_mut().remove(header::COOKIE);
    if pairs.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&pairs.join("; ")) {
        req.headers_mut().insert(header::COOKIE, value);
    }
}

fn append_set_cookies(response: &mut Response, cookies: [Cookie<'static>; 2]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Keep the session cookies fresh.
///
/// When a refresh token is present and the access token is missing or about
/// to expire, the pair is exchanged with the provider. Handlers downstream see
/// the new tokens in the request, and the browser receives them via
/// `Set-Cookie`. A failed refresh signs the browser out.
pub async fn refresh_session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let refresh_token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    let Some(refresh_token) = refresh_token else {
        return next.run(req).await;
    };

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let needs_refresh = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| jwt::expires_within(c.value(), now, REFRESH_MARGIN_SECS))
        .unwrap_or(true);

    if !needs_refresh {
        return next.run(req).await;
    }

    let secure = state.settings.server.secure_cookies;
    match state.identity.refresh_session(&refresh_token).await {
        Ok(session) => {
            rewrite_cookie_header(&mut req, &jar, Some(&session));
            let mut response = next.run(req).await;
            append_set_cookies(&mut response, session_cookies(&session, secure));
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session refresh failed, clearing session cookies");
            rewrite_cookie_header(&mut req, &jar, None);
            let mut response = next.run(req).await;
            append_set_cookies(&mut response, cleared_session_cookies(secure));
            response
        }
    }
}
