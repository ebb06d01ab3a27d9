//! Server actions invoked from dashboard pages.
//!
//! Each action answers with an [`ActionResult`]. Provider failures come back
//! as `success: false` carrying the provider's own message.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::middleware::ScopedClient;
use crate::models::{to_minor_units, ActionResult, User};
use crate::services::metrics::record_action;
use crate::services::razorpay::{new_receipt, RazorpayOrder};
use crate::utils::{ActionJson, ActionRejection};
use crate::AppState;

pub type ActionResponse<T = ()> = (StatusCode, Json<ActionResult<T>>);

const NOT_AUTHENTICATED: &str = "Not authenticated";
const USER_ID_REQUIRED: &str = "userId is required";

fn respond<T>(status: StatusCode, result: ActionResult<T>) -> ActionResponse<T> {
    (status, Json(result))
}

/// Unwrap an action body once the caller is known.
fn action_body<B, T>(
    payload: Result<ActionJson<B>, ActionRejection>,
    action: &'static str,
) -> Result<B, ActionResponse<T>> {
    payload.map(|ActionJson(body)| body).map_err(|rejection| {
        record_action(action, "rejected");
        rejection.into_action()
    })
}

/// Resolve the caller, or the response to send when there is none.
async fn require_user<T>(
    client: &ScopedClient,
    action: &'static str,
) -> Result<User, ActionResponse<T>> {
    match client.current_user().await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            record_action(action, "denied");
            Err(respond(
                StatusCode::UNAUTHORIZED,
                ActionResult::failed(NOT_AUTHENTICATED),
            ))
        }
        Err(e) => {
            tracing::error!(action, error = %e, "Could not resolve caller");
            record_action(action, "failed");
            Err(respond(StatusCode::OK, ActionResult::failed(e.to_string())))
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// `updateUserPassword(password)`
pub async fn update_password(
    client: ScopedClient,
    payload: Result<ActionJson<UpdatePasswordRequest>, ActionRejection>,
) -> ActionResponse {
    const ACTION: &str = "update_password";

    if client.access_token().is_none() {
        record_action(ACTION, "denied");
        return respond(
            StatusCode::UNAUTHORIZED,
            ActionResult::failed(NOT_AUTHENTICATED),
        );
    }

    let req = match action_body(payload, ACTION) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match client.update_password(&req.password).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Password updated");
            record_action(ACTION, "ok");
            respond(StatusCode::OK, ActionResult::done())
        }
        Err(e) if e.is_unauthorized() => {
            record_action(ACTION, "denied");
            respond(
                StatusCode::UNAUTHORIZED,
                ActionResult::failed(NOT_AUTHENTICATED),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password update failed");
            record_action(ACTION, "failed");
            respond(StatusCode::OK, ActionResult::failed(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
}

/// `deleteUser(userId)`
///
/// Admin only. Removes the student profile rows first, then the user row, and
/// stops at the first failure.
pub async fn delete_user(
    client: ScopedClient,
    payload: Result<ActionJson<DeleteUserRequest>, ActionRejection>,
) -> ActionResponse {
    const ACTION: &str = "delete_user";

    let caller = match require_user(&client, ACTION).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let req = match action_body(payload, ACTION) {
        Ok(req) => req,
        Err(response) => return response,
    };
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        record_action(ACTION, "rejected");
        return ActionRejection::invalid(USER_ID_REQUIRED).into_action();
    }

    let caller_row = match client.user_row(&caller).await {
        Ok(row) => row,
        Err(e) => {
            tracing::error!(user_id = %caller.id, error = %e, "Could not load caller role");
            record_action(ACTION, "failed");
            return respond(StatusCode::OK, ActionResult::failed(e.to_string()));
        }
    };

    if !caller_row.as_ref().is_some_and(|row| row.is_admin()) {
        tracing::warn!(user_id = %caller.id, target = %user_id, "Non-admin attempted to delete a user");
        record_action(ACTION, "denied");
        return respond(
            StatusCode::FORBIDDEN,
            ActionResult::failed("Only administrators can delete users"),
        );
    }

    if user_id == caller.id {
        record_action(ACTION, "denied");
        return respond(
            StatusCode::BAD_REQUEST,
            ActionResult::failed("You cannot delete your own account"),
        );
    }

    if let Err(e) = client
        .table("student_profiles")
        .eq("user_id", user_id)
        .delete()
        .await
    {
        tracing::error!(target = %user_id, error = %e, "Failed to delete student profile");
        record_action(ACTION, "failed");
        return respond(StatusCode::OK, ActionResult::failed(e.to_string()));
    }

    if let Err(e) = client.table("users").eq("id", user_id).delete().await {
        tracing::error!(target = %user_id, error = %e, "Failed to delete user row");
        record_action(ACTION, "failed");
        return respond(StatusCode::OK, ActionResult::failed(e.to_string()));
    }

    tracing::info!(admin_id = %caller.id, target = %user_id, "User deleted");
    record_action(ACTION, "ok");
    respond(StatusCode::OK, ActionResult::done())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentSessionRequest {
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than zero"))]
    pub amount: f64,
}

/// `createPaymentSession(amount)`
pub async fn create_payment_session(
    State(state): State<AppState>,
    client: ScopedClient,
    payload: Result<ActionJson<CreatePaymentSessionRequest>, ActionRejection>,
) -> ActionResponse<RazorpayOrder> {
    const ACTION: &str = "create_payment_session";

    let user = match require_user(&client, ACTION).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let req = match action_body(payload, ACTION) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let amount = match to_minor_units(req.amount) {
        Ok(amount) => amount,
        Err(e) => {
            record_action(ACTION, "denied");
            return respond(
                StatusCode::UNPROCESSABLE_ENTITY,
                ActionResult::failed(e.to_string()),
            );
        }
    };

    let receipt = new_receipt();
    let notes = json!({ "user_id": user.id, "purpose": "school_fees" });

    match state.razorpay.create_order(amount, &receipt, Some(notes)).await {
        Ok(order) => {
            tracing::info!(user_id = %user.id, order_id = %order.id, amount, "Payment session created");
            record_action(ACTION, "ok");
            respond(StatusCode::OK, ActionResult::with_data(order))
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Payment session creation failed");
            record_action(ACTION, "failed");
            respond(StatusCode::OK, ActionResult::failed(e.to_string()))
        }
    }
}
