//! Status bands: the coarse state shown for an item's stock level.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Item status. Everything except `Discontinued` is derived from stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    Discontinued,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Discontinued => "discontinued",
        }
    }

    /// Low or empty items, the ones the reorder alert lists.
    pub fn needs_attention(self) -> bool {
        matches!(self, StockStatus::LowStock | StockStatus::OutOfStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single place status is computed.
///
/// `discontinued` wins over every band. Otherwise:
/// `0` is out of stock, `1..=min_stock` is low, anything above is in stock.
pub fn derive_status(stock: i64, min_stock: i64, discontinued: bool) -> StockStatus {
    if discontinued {
        StockStatus::Discontinued
    } else if stock <= 0 {
        StockStatus::OutOfStock
    } else if stock <= min_stock {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(derive_status(0, 20, false), StockStatus::OutOfStock);
        assert_eq!(derive_status(1, 20, false), StockStatus::LowStock);
        assert_eq!(derive_status(20, 20, false), StockStatus::LowStock);
        assert_eq!(derive_status(21, 20, false), StockStatus::InStock);
    }

    #[test]
    fn zero_threshold_never_reports_low() {
        assert_eq!(derive_status(1, 0, false), StockStatus::InStock);
        assert_eq!(derive_status(0, 0, false), StockStatus::OutOfStock);
    }

    #[test]
    fn discontinued_is_sticky_regardless_of_stock() {
        for stock in [0, 5, 500] {
            assert_eq!(derive_status(stock, 20, true), StockStatus::Discontinued);
        }
    }

    #[test]
    fn serializes_with_snake_case_names() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");
        assert_eq!(StockStatus::LowStock.to_string(), "low_stock");
    }
}
