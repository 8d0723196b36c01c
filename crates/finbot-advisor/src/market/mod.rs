//! Market Data
//!
//! Price history used to draw charts. The chat flow has no licensed data
//! feed, so the default source is synthetic.

mod synthetic;

pub use synthetic::SyntheticPriceSource;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One point of a price series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Axis label (e.g., "13:00")
    pub label: String,
    pub price: Decimal,
}

/// One OHLC bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub label: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Named series for comparison charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub name: String,
    pub points: Vec<PricePoint>,
}

/// Price history provider (Strategy pattern)
///
/// Implement this for real market data vendors.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Hourly closes for the last `hours` hours
    async fn price_series(&self, topic: &str, hours: usize) -> Result<Vec<PricePoint>>;

    /// `count` OHLC bars
    async fn candles(&self, topic: &str, count: usize) -> Result<Vec<Candle>>;

    /// Series for several topics, in the order given
    async fn compare(&self, topics: &[String], hours: usize) -> Result<Vec<PriceSeries>> {
        let mut series = Vec::with_capacity(topics.len());
        for topic in topics {
            series.push(PriceSeries {
                name: topic.clone(),
                points: self.price_series(topic, hours).await?,
            });
        }
        Ok(series)
    }

    fn name(&self) -> &str;
}
