//! Ledger configuration.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

/// What to do with an outbound movement larger than the stock on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderflowPolicy {
    /// Record the movement in full and floor stock at zero.
    #[default]
    Floor,
    /// Reject the movement with `InsufficientStock`; nothing is recorded.
    Reject,
}

impl fmt::Display for UnderflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnderflowPolicy::Floor => f.write_str("floor"),
            UnderflowPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for UnderflowPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(UnderflowPolicy::Floor),
            "reject" | "strict" => Ok(UnderflowPolicy::Reject),
            other => Err(DomainError::validation(
                "underflow",
                format!("unknown underflow policy '{other}' (expected floor or reject)"),
            )),
        }
    }
}

/// Settings for a `StockLedger` instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub underflow: UnderflowPolicy,
}

impl LedgerConfig {
    pub const UNDERFLOW_ENV: &'static str = "STOCKROOM_UNDERFLOW_POLICY";

    pub fn new(underflow: UnderflowPolicy) -> Self {
        Self { underflow }
    }

    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(Self::UNDERFLOW_ENV).ok())
    }

    fn from_value(underflow: Option<String>) -> Self {
        let underflow = match underflow {
            None => UnderflowPolicy::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(
                    "{} has an invalid value ({err}); using '{}'",
                    Self::UNDERFLOW_ENV,
                    UnderflowPolicy::default()
                );
                UnderflowPolicy::default()
            }),
        };
        Self { underflow }
    }
}
