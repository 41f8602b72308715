//! Stock movements: the append-only entries of an item's ledger.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, MovementId, UserId};

/// Direction/kind of a movement. The quantity is always positive; the sign
/// comes from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods received.
    In,
    /// Goods consumed or sold.
    Out,
    /// Count correction, booked as an increase.
    Adjustment,
    /// Goods moved away to another location.
    Transfer,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
        }
    }

    /// `In` and `Adjustment` add stock; `Out` and `Transfer` remove it.
    pub fn is_inbound(self) -> bool {
        matches!(self, MovementType::In | MovementType::Adjustment)
    }

    /// Signed stock change for `quantity` units of this kind.
    pub fn delta(self, quantity: i64) -> i64 {
        if self.is_inbound() { quantity } else { -quantity }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            "adjustment" => Ok(MovementType::Adjustment),
            "transfer" => Ok(MovementType::Transfer),
            other => Err(DomainError::validation(
                "type",
                format!("unknown movement type '{other}' (expected in, out, adjustment or transfer)"),
            )),
        }
    }
}

/// One recorded stock movement. Immutable once appended.
///
/// `quantity` is what the caller asked for, even when the floor policy clamped
/// the resulting stock at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub quantity: i64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Effective date; may differ from when the movement was recorded.
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl StockMovement {
    pub fn signed_delta(&self) -> i64 {
        self.kind.delta(self.quantity)
    }
}

/// Stock after applying `delta`, floored at zero.
pub fn apply_delta(stock: i64, delta: i64) -> i64 {
    stock.saturating_add(delta).max(0)
}

/// Recompute stock from an initial level by folding movements in ledger order.
pub fn replay_stock<'a>(initial_stock: i64, movements: impl IntoIterator<Item = &'a StockMovement>) -> i64 {
    movements
        .into_iter()
        .fold(initial_stock, |stock, m| apply_delta(stock, m.signed_delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movement(kind: MovementType, quantity: i64) -> StockMovement {
        StockMovement {
            id: MovementId::new(),
            kind,
            quantity,
            reason: "test".to_string(),
            reference: None,
            date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            created_by: None,
        }
    }

    #[test]
    fn kinds_carry_their_sign() {
        assert_eq!(MovementType::In.delta(5), 5);
        assert_eq!(MovementType::Adjustment.delta(5), 5);
        assert_eq!(MovementType::Out.delta(5), -5);
        assert_eq!(MovementType::Transfer.delta(5), -5);
    }

    #[test]
    fn apply_delta_floors_at_zero() {
        assert_eq!(apply_delta(10, -4), 6);
        assert_eq!(apply_delta(10, -40), 0);
        assert_eq!(apply_delta(0, -1), 0);
        assert_eq!(apply_delta(i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn replay_applies_floor_step_by_step() {
        // 5 - 10 floors to 0, then +3 gives 3 (not -2).
        let history = vec![movement(MovementType::Out, 10), movement(MovementType::In, 3)];
        assert_eq!(replay_stock(5, &history), 3);
    }

    #[test]
    fn parses_kind_case_insensitively() {
        assert_eq!("Transfer".parse::<MovementType>().unwrap(), MovementType::Transfer);
        let err = "gift".parse::<MovementType>().unwrap_err();
        assert_eq!(err.fields(), vec!["type"]);
    }

    #[test]
    fn serializes_kind_under_type_key() {
        let json = serde_json::to_value(movement(MovementType::Out, 2)).unwrap();
        assert_eq!(json["type"], "out");
        assert_eq!(json["quantity"], 2);
        assert!(json.get("reference").is_none());
    }
}
