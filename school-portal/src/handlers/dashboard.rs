//! Dashboard pages.
//!
//! Every page here takes [`RequireUser`], so unauthenticated visitors never
//! reach a handler body; they are redirected to the sign-in page. The shared
//! chrome (navigation, sidebar, footer) comes from `dashboard_base.html`.

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::RequireUser;
use crate::models::UserRow;
use crate::AppState;

/// Data every dashboard page needs for its layout.
struct Layout {
    viewer_email: Option<String>,
    display_name: String,
    is_admin: bool,
    row: Option<UserRow>,
}

async fn layout(auth: &RequireUser) -> Layout {
    let row = match auth.client.user_row(&auth.user).await {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(user_id = %auth.user.id, error = %e, "Could not load user row");
            None
        }
    };

    Layout {
        viewer_email: Some(auth.user.display_email()),
        display_name: row
            .as_ref()
            .map(UserRow::name)
            .unwrap_or_else(|| auth.user.display_email()),
        is_admin: row.as_ref().is_some_and(UserRow::is_admin),
        row,
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub viewer_email: Option<String>,
    pub current_page: &'static str,
    pub display_name: String,
    pub is_admin: bool,
    pub email: String,
    pub role: String,
    pub member_since: String,
}

pub async fn overview(auth: RequireUser) -> impl IntoResponse {
    let layout = layout(&auth).await;

    let role = layout
        .row
        .as_ref()
        .map(|r| r.role_label().to_string())
        .unwrap_or_else(|| "member".to_string());
    let member_since = layout
        .row
        .as_ref()
        .and_then(|r| r.created_at.clone())
        .or_else(|| auth.user.created_at.clone())
        .map(|ts| ts.chars().take(10).collect())
        .unwrap_or_else(|| "-".to_string());

    DashboardTemplate {
        viewer_email: layout.viewer_email,
        current_page: "overview",
        display_name: layout.display_name,
        is_admin: layout.is_admin,
        email: auth.user.display_email(),
        role,
        member_since,
    }
}

#[derive(Template)]
#[template(path = "fees.html")]
pub struct FeesTemplate {
    pub viewer_email: Option<String>,
    pub current_page: &'static str,
    pub display_name: String,
    pub is_admin: bool,
    pub payments_enabled: bool,
    pub razorpay_key_id: String,
    pub currency: String,
    pub payer_email: String,
}

pub async fn fees_page(State(state): State<AppState>, auth: RequireUser) -> impl IntoResponse {
    let layout = layout(&auth).await;

    FeesTemplate {
        viewer_email: layout.viewer_email,
        current_page: "fees",
        display_name: layout.display_name,
        is_admin: layout.is_admin,
        payments_enabled: state.razorpay.is_configured(),
        razorpay_key_id: state.razorpay.key_id().to_string(),
        currency: state.razorpay.currency().to_string(),
        payer_email: auth.user.email.clone().unwrap_or_default(),
    }
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub viewer_email: Option<String>,
    pub current_page: &'static str,
    pub display_name: String,
    pub is_admin: bool,
}

pub async fn settings_page(auth: RequireUser) -> impl IntoResponse {
    let layout = layout(&auth).await;

    SettingsTemplate {
        viewer_email: layout.viewer_email,
        current_page: "settings",
        display_name: layout.display_name,
        is_admin: layout.is_admin,
    }
}

#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersTemplate {
    pub viewer_email: Option<String>,
    pub current_page: &'static str,
    pub display_name: String,
    pub is_admin: bool,
    pub users: Vec<UserRow>,
    pub load_error: Option<String>,
    pub current_user_id: String,
}

/// User management. Non-admins are sent back to the dashboard overview.
pub async fn admin_users_page(auth: RequireUser) -> Response {
    let layout = layout(&auth).await;
    if !layout.is_admin {
        tracing::warn!(user_id = %auth.user.id, "Non-admin attempted to open user management");
        return Redirect::to("/dashboard").into_response();
    }

    let (users, load_error) = match auth
        .client
        .table("users")
        .select(UserRow::COLUMNS)
        .order("created_at", false)
        .fetch::<UserRow>()
        .await
    {
        Ok(users) => (users, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list users");
            (Vec::new(), Some(e.to_string()))
        }
    };

    AdminUsersTemplate {
        viewer_email: layout.viewer_email,
        current_page: "admin",
        display_name: layout.display_name,
        is_admin: layout.is_admin,
        users,
        load_error,
        current_user_id: auth.user.id.clone(),
    }
    .into_response()
}
