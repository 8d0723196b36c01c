//! Synthetic Price Source
//!
//! Random walk around each asset's representative price. Good enough to
//! illustrate a chart; never presented as real quotes.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{Candle, PricePoint, PriceSource};
use crate::error::Result;
use crate::lexicon::AssetLexicon;

/// Largest step per period, in basis points of the base price
const MAX_STEP_BPS: i64 = 100;

/// Largest candle wick, in basis points of the base price
const MAX_WICK_BPS: i64 = 50;

/// Random-walk price source seeded from the lexicon base prices
pub struct SyntheticPriceSource {
    lexicon: &'static AssetLexicon,
    rng: Mutex<StdRng>,
}

impl Default for SyntheticPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticPriceSource {
    pub fn new() -> Self {
        Self {
            lexicon: AssetLexicon::standard(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic output for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            lexicon: AssetLexicon::standard(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn hour_label(i: usize) -> String {
        format!("{}:00", i % 24)
    }

    /// A signed fraction of `base`, at most `max_bps` basis points
    fn step(rng: &mut StdRng, base: Decimal, max_bps: i64) -> Decimal {
        let bps = rng.gen_range(-max_bps..=max_bps);
        base * Decimal::new(bps, 4)
    }
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    async fn price_series(&self, topic: &str, hours: usize) -> Result<Vec<PricePoint>> {
        let base = self.lexicon.base_price(topic);
        let mut rng = self.rng.lock().await;

        let mut price = base;
        let points = (0..hours)
            .map(|i| {
                price += Self::step(&mut rng, base, MAX_STEP_BPS);
                PricePoint {
                    label: Self::hour_label(i),
                    price: price.round_dp(2),
                }
            })
            .collect();

        Ok(points)
    }

    async fn candles(&self, topic: &str, count: usize) -> Result<Vec<Candle>> {
        let base = self.lexicon.base_price(topic);
        let mut rng = self.rng.lock().await;

        let mut close = base;
        let candles = (0..count)
            .map(|i| {
                let open = close;
                close = open + Self::step(&mut rng, base, MAX_STEP_BPS);
                let high = open.max(close) + Self::step(&mut rng, base, MAX_WICK_BPS).abs();
                let low = open.min(close) - Self::step(&mut rng, base, MAX_WICK_BPS).abs();

                Candle {
                    label: Self::hour_label(i),
                    open: open.round_dp(2),
                    high: high.round_dp(2),
                    low: low.round_dp(2),
                    close: close.round_dp(2),
                }
            })
            .collect();

        Ok(candles)
    }

    fn name(&self) -> &str {
        "Synthetic"
    }
}
