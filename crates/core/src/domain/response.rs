use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::IngestError;

pub const CREATED: &str = "Created";
pub const DATA_INSERTION_ISSUE: &str = "Data insertion issue";

/// Aggregate outcome returned for every confirmation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self { status: 200, success: true, error: None, data: Some(data) }
    }

    pub fn created() -> Self {
        Self { status: 200, success: true, error: Some(CREATED.to_string()), data: None }
    }

    pub fn mismatch() -> Self {
        Self {
            status: 400,
            success: false,
            error: Some(DATA_INSERTION_ISSUE.to_string()),
            data: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self { status, success: false, error: Some(error.into()), data: None }
    }
}

impl From<&IngestError> for ApiResponse {
    fn from(error: &IngestError) -> Self {
        Self::failure(error.status(), error.client_message())
    }
}
