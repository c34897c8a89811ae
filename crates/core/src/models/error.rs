//! JSON error body.

use serde::{Deserialize, Serialize};

/// Error body returned by the forwarder and, in slightly different shapes,
/// by the backend.
///
/// The forwarder always writes `error`. The backend's exception handler
/// writes `message`, and some endpoints write `error`, so both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Body with only the `error` field set.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: None,
        }
    }

    /// The most specific text available, preferring `message`.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarder_shape() {
        let json = serde_json::to_string(&ErrorBody::new("Login failed")).unwrap();
        assert_eq!(json, r#"{"error":"Login failed"}"#);
    }

    #[test]
    fn test_text_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"status":500,"message":"Cart is empty","error":"x"}"#)
                .unwrap();
        assert_eq!(body.text(), Some("Cart is empty"));
        assert_eq!(ErrorBody::default().text(), None);
    }
}
