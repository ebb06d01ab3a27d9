use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::models::ActionResult;

/// JSON body for a server action, validated before the handler sees it.
///
/// Handlers take it as `Result<ActionJson<T>, ActionRejection>` so the
/// session can be checked before a bad body is reported.
pub struct ActionJson<T>(pub T);

/// A body that could not be parsed (400) or failed validation (422).
#[derive(Debug)]
pub struct ActionRejection {
    pub status: StatusCode,
    pub message: String,
}

impl ActionRejection {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    /// The rejection in the action result shape, for any payload type.
    pub fn into_action<T>(self) -> (StatusCode, Json<ActionResult<T>>) {
        (self.status, Json(ActionResult::failed(self.message)))
    }
}

impl IntoResponse for ActionRejection {
    fn into_response(self) -> Response {
        self.into_action::<()>().into_response()
    }
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for ActionJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ActionRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ActionRejection {
                status: StatusCode::BAD_REQUEST,
                message: e.body_text(),
            })?;

        value
            .validate()
            .map_err(|e| ActionRejection::invalid(first_message(&e)))?;

        Ok(ActionJson(value))
    }
}

/// First human-readable message out of a validation failure.
fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
