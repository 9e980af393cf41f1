//! Registration wire format.
//!
//! ```json
//! // request
//! { "userData": "<installation identifier>" }
//! // response
//! { "success": true, "data": "https://example.com/page" }
//! ```

use serde::{Deserialize, Serialize};

use crate::ContentLocation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRequest {
    #[serde(rename = "userData")]
    pub user_data: String,
}

impl RegistrationRequest {
    #[must_use]
    pub fn new(user_data: impl Into<String>) -> Self {
        Self {
            user_data: user_data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<String>,
}

impl RegistrationResponse {
    /// The content location this response grants, if any.
    ///
    /// Present only for `success == true` with a non-empty `data`. Every other
    /// shape is a negative answer, not an error.
    #[must_use]
    pub fn effective_content_location(&self) -> Option<ContentLocation> {
        if !self.success {
            return None;
        }
        self.data
            .as_deref()
            .and_then(|data| ContentLocation::new(data).ok())
    }
}
