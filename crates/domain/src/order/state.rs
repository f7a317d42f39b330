//! Order status policy.

use std::str::FromStr;

use common::{OrderStatus, ParseKindError};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Which status changes an order update may make.
///
/// ```text
/// Unrestricted:  any ──► any
/// ForwardOnly:   Started ──► Delivery ──► Finalized   (no way back)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// Any status may follow any status.
    #[default]
    Unrestricted,

    /// Status may stay or move forward, never backwards.
    ForwardOnly,
}

fn rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Started => 0,
        OrderStatus::Delivery => 1,
        OrderStatus::Finalized => 2,
    }
}

impl StatusPolicy {
    /// Returns true if an order in `from` may be moved to `to`.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusPolicy::Unrestricted => true,
            StatusPolicy::ForwardOnly => rank(to) >= rank(from),
        }
    }

    pub(crate) fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "order status cannot move from {from} to {to}"
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPolicy::Unrestricted => "unrestricted",
            StatusPolicy::ForwardOnly => "forward-only",
        }
    }
}

impl std::fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatusPolicy {
    type Err = ParseKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(StatusPolicy::Unrestricted),
            "forward-only" | "forward_only" => Ok(StatusPolicy::ForwardOnly),
            _ => Err(ParseKindError {
                what: "status policy",
                value: s.to_string(),
            }),
        }
    }
}
