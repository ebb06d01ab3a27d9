use serde::{Deserialize, Serialize};

/// Plain result object returned by every server action.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    pub fn done() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}
