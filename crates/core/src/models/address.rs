//! Saved shipping addresses.

use serde::{Deserialize, Serialize};

use crate::types::AddressId;

/// A saved address. At most one per user has `is_default` set; the backend
/// enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub recipient_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// The first address flagged as default.
    #[must_use]
    pub fn find_default(addresses: &[Self]) -> Option<&Self> {
        addresses.iter().find(|a| a.is_default)
    }
}

/// Body for creating or updating an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub recipient_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl AddressRequest {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipientName", &self.recipient_name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_default() {
        let list: Vec<Address> = serde_json::from_str(
            r#"[
                {"id":1,"recipientName":"A","line1":"x","city":"c","postalCode":"p","country":"JP","phone":"1","isDefault":false},
                {"id":2,"recipientName":"B","line1":"y","city":"c","postalCode":"p","country":"JP","phone":"2","isDefault":true}
            ]"#,
        )
        .unwrap();
        assert_eq!(Address::find_default(&list).map(|a| a.id), Some(AddressId::new(2)));
        assert!(Address::find_default(&list[..1]).is_none());
    }

    #[test]
    fn test_missing_fields() {
        let req = AddressRequest {
            recipient_name: "Meiko".to_string(),
            line1: "  ".to_string(),
            city: "Tokyo".to_string(),
            country: "JP".to_string(),
            ..AddressRequest::default()
        };
        assert_eq!(req.missing_fields(), vec!["line1", "postalCode", "phone"]);
    }
}
