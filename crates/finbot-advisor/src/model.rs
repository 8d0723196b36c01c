//! Domain Models
//!
//! Portfolio holdings and the aggregates derived from them.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

/// Asset type used when a row carries none
pub const DEFAULT_ASSET_TYPE: &str = "stock";

/// Distribution bucket for holdings without a type
pub const OTHER_ASSET_TYPE: &str = "Other";

/// One portfolio line item, normalized from an uploaded CSV row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Ticker symbol (e.g., "AAPL")
    pub symbol: String,

    /// Human label (e.g., "Apple Inc.")
    pub asset_label: String,

    /// Units held
    pub shares: Decimal,

    /// Average cost per unit
    pub purchase_price: Decimal,

    /// Last price per unit
    pub current_price: Decimal,

    /// Position value
    pub market_value: Decimal,

    /// Unrealized gain (negative for a loss)
    pub gain_loss: Decimal,

    /// Free-form type ("stock", "etf", "crypto", ...)
    pub asset_type: String,
}

impl Holding {
    /// A holding known only by symbol and value
    pub fn new(symbol: impl Into<String>, market_value: Decimal) -> Self {
        let symbol = symbol.into();
        Self {
            asset_label: symbol.clone(),
            symbol,
            shares: Decimal::ZERO,
            purchase_price: Decimal::ZERO,
            current_price: Decimal::ZERO,
            market_value,
            gain_loss: Decimal::ZERO,
            asset_type: DEFAULT_ASSET_TYPE.into(),
        }
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = asset_type.into();
        self
    }

    pub fn with_gain_loss(mut self, gain_loss: Decimal) -> Self {
        self.gain_loss = gain_loss;
        self
    }

    /// Symbol if present, otherwise the label
    pub fn display_name(&self) -> &str {
        if self.symbol.is_empty() {
            &self.asset_label
        } else {
            &self.symbol
        }
    }

    /// Rows with neither a symbol nor a label carry no position
    pub fn is_blank(&self) -> bool {
        self.symbol.trim().is_empty() && self.asset_label.trim().is_empty()
    }

    /// Derive market value and gain/loss from per-unit prices when the
    /// row did not supply them. Fails when the product does not fit a
    /// `Decimal`.
    pub fn backfill(&mut self) -> Result<()> {
        if self.market_value.is_zero() && !self.shares.is_zero() && !self.current_price.is_zero() {
            self.market_value = self
                .shares
                .checked_mul(self.current_price)
                .ok_or_else(|| self.overflow("market value"))?;
        }

        if self.gain_loss.is_zero()
            && !self.market_value.is_zero()
            && !self.shares.is_zero()
            && !self.purchase_price.is_zero()
        {
            self.gain_loss = self
                .shares
                .checked_mul(self.purchase_price)
                .and_then(|cost| self.market_value.checked_sub(cost))
                .ok_or_else(|| self.overflow("gain/loss"))?;
        }

        Ok(())
    }

    fn overflow(&self, field: &str) -> AdvisorError {
        AdvisorError::parse_failure(format!("{}: {field} is too large", self.display_name()))
    }
}

/// A holding ranked by value with its share of the portfolio
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedHolding {
    pub symbol: String,
    pub value: Decimal,
    /// Percentage of total value, one decimal place
    pub percentage: Decimal,
}

/// Aggregate value per asset type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAllocation {
    pub asset_type: String,
    pub value: Decimal,
}

/// Portfolio aggregates, recomputed on every query
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalysis {
    pub holdings: Vec<Holding>,
    pub holdings_count: usize,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    /// Every holding, descending by value
    pub top_holdings: Vec<RankedHolding>,
    /// Value per asset type, in first-seen order
    pub distribution: Vec<TypeAllocation>,
}

impl PortfolioAnalysis {
    /// The largest position, if any
    pub fn top(&self) -> Option<&RankedHolding> {
        self.top_holdings.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_backfill_market_value_and_gain() {
        let mut holding = Holding::new("AAPL", Decimal::ZERO);
        holding.shares = dec!(10);
        holding.current_price = dec!(190);
        holding.purchase_price = dec!(150);

        holding.backfill().unwrap();
        assert_eq!(holding.market_value, dec!(1900));
        assert_eq!(holding.gain_loss, dec!(400));
    }

    #[test]
    fn test_backfill_keeps_supplied_values() {
        let mut holding = Holding::new("MSFT", dec!(5000)).with_gain_loss(dec!(-120));
        holding.shares = dec!(10);
        holding.current_price = dec!(1);
        holding.purchase_price = dec!(1);

        holding.backfill().unwrap();
        assert_eq!(holding.market_value, dec!(5000));
        assert_eq!(holding.gain_loss, dec!(-120));
    }

    #[test]
    fn test_backfill_overflow_is_parse_failure() {
        let mut holding = Holding::new("BIG", Decimal::ZERO);
        holding.shares = dec!(100000000000000000);
        holding.current_price = dec!(1000000000000);

        let err = holding.backfill().unwrap_err();
        assert!(matches!(err, AdvisorError::ParseFailure { .. }));
        assert!(err.to_string().contains("BIG"));
    }

    #[test]
    fn test_blank_and_display_name() {
        let mut holding = Holding::new("", Decimal::ZERO);
        assert!(holding.is_blank());

        holding.asset_label = "Vanguard Total Market".into();
        assert!(!holding.is_blank());
        assert_eq!(holding.display_name(), "Vanguard Total Market");
    }
}
