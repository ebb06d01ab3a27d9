use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure talking to the auth/database provider.
///
/// `Display` yields the provider's own message so it can be handed back to
/// the browser unchanged.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from auth provider: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Build an error from a non-success provider response body.
    ///
    /// The identity API answers with `error_description`, `msg` or `error`;
    /// the table API with `message`. The raw body is used when none match.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown provider error")
                        .to_string()
                } else {
                    body.to_string()
                }
            });

        ProviderError::Api { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The provider rejected the caller's token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

/// Read a provider response, decoding the body on success.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(ProviderError::from_response(status, &body))
    }
}

/// Check a provider response whose body is not needed.
pub(crate) async fn read_empty(response: reqwest::Response) -> Result<(), ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await?;
    Err(ProviderError::from_response(status, &body))
}
