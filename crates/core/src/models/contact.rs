//! Contact form submission.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Email;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub sender_name: String,
    pub sender_email: Email,
    pub title: String,
    pub details: String,
}

impl ContactRequest {
    pub const MAX_TITLE: usize = 200;
    pub const MAX_DETAILS: usize = 5000;

    /// Check required fields before sending.
    ///
    /// # Errors
    ///
    /// Returns the first blank or oversized field.
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.sender_name.trim().is_empty() {
            return Err(ContactError::Missing("senderName"));
        }
        if self.title.trim().is_empty() {
            return Err(ContactError::Missing("title"));
        }
        if self.details.trim().is_empty() {
            return Err(ContactError::Missing("details"));
        }
        if self.title.chars().count() > Self::MAX_TITLE {
            return Err(ContactError::TooLong {
                field: "title",
                max: Self::MAX_TITLE,
            });
        }
        if self.details.chars().count() > Self::MAX_DETAILS {
            return Err(ContactError::TooLong {
                field: "details",
                max: Self::MAX_DETAILS,
            });
        }
        Ok(())
    }
}

/// `{"message": ...}` on success, `{"error": ...}` on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
