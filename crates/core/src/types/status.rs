//! Order status as reported by the backend.
//!
//! The client never drives this state machine. It only looks up labels and
//! the progress position for display.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Six ordered progress states, plus `Canceled` which can be entered from any
/// point and is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PaymentReceived,
    Processing,
    Preparing,
    ReadyForDelivery,
    InDelivery,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// The progress states in display order.
    pub const PROGRESS: [Self; 6] = [
        Self::PaymentReceived,
        Self::Processing,
        Self::Preparing,
        Self::ReadyForDelivery,
        Self::InDelivery,
        Self::Delivered,
    ];

    /// Position in the progress track, or `None` for `Canceled`.
    #[must_use]
    pub fn step_index(self) -> Option<usize> {
        Self::PROGRESS.iter().position(|s| *s == self)
    }

    /// Short human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PaymentReceived => "Payment",
            Self::Processing => "Processing",
            Self::Preparing => "Preparing",
            Self::ReadyForDelivery => "Ready",
            Self::InDelivery => "Shipping",
            Self::Delivered => "Delivered",
            Self::Canceled => "Canceled",
        }
    }

    /// Wire code, e.g. `READY_FOR_DELIVERY`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::Processing => "PROCESSING",
            Self::Preparing => "PREPARING",
            Self::ReadyForDelivery => "READY_FOR_DELIVERY",
            Self::InDelivery => "IN_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Whether no further status change is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Readable label for a raw status code that may be missing or unknown.
    ///
    /// Unknown codes are shown with underscores replaced by spaces.
    #[must_use]
    pub fn readable(code: Option<&str>) -> String {
        match code {
            None => "Unknown".to_string(),
            Some(raw) => raw
                .parse::<Self>()
                .map_or_else(|_| raw.replace('_', " "), |s| s.label().to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT_RECEIVED" => Ok(Self::PaymentReceived),
            "PROCESSING" => Ok(Self::Processing),
            "PREPARING" => Ok(Self::Preparing),
            "READY_FOR_DELIVERY" => Ok(Self::ReadyForDelivery),
            "IN_DELIVERY" => Ok(Self::InDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_index_orders_progress_states() {
        assert_eq!(OrderStatus::PaymentReceived.step_index(), Some(0));
        assert_eq!(OrderStatus::InDelivery.step_index(), Some(4));
        assert_eq!(OrderStatus::Delivered.step_index(), Some(5));
        assert_eq!(OrderStatus::Canceled.step_index(), None);
    }

    #[test]
    fn test_wire_code_matches_serde() {
        for status in OrderStatus::PROGRESS
            .into_iter()
            .chain([OrderStatus::Canceled])
        {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.code()));
            assert_eq!(status.code().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_readable_handles_missing_and_unknown() {
        assert_eq!(OrderStatus::readable(None), "Unknown");
        assert_eq!(OrderStatus::readable(Some("IN_DELIVERY")), "Shipping");
        assert_eq!(OrderStatus::readable(Some("ON_HOLD")), "ON HOLD");
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }
}
