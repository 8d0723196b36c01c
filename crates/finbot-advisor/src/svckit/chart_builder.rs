//! Chart Spec Builder
//!
//! Builds declarative chart payloads for the browser's charting library.
//! The builder only describes charts; it never renders them.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::market::{Candle, PricePoint, PriceSeries};
use crate::model::RankedHolding;
use crate::svckit::portfolio_analyzer::percentage_of;

pub const PRIMARY: &str = "#22c55e";
pub const DANGER: &str = "#ef4444";
pub const WARNING: &str = "#f59e0b";
pub const INFO: &str = "#3b82f6";

const BORDER: &str = "#0a0e1a";

/// Series colors for comparison charts, cycled by index
const COMPARISON_PALETTE: [&str; 3] = [PRIMARY, INFO, WARNING];

/// Slice colors for the portfolio donut; the last one is for "Others"
const DONUT_PALETTE: [&str; 11] = [
    "#22c55e", "#3b82f6", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#10b981", "#f97316",
    "#06b6d4", "#6366f1", "#64748b",
];

pub const OTHERS_LABEL: &str = "Others";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Doughnut,
    Candlestick,
}

/// A single color or one color per data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paint {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: Paint,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

/// OHLC point in the financial-chart plugin's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub x: String,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartData {
    Series {
        labels: Vec<String>,
        datasets: Vec<Dataset>,
    },
    Candles {
        label: String,
        points: Vec<OhlcPoint>,
    },
}

/// Donut slice with its share of the whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice {
    pub label: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

/// Declarative chart payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub data: ChartData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slices: Option<Vec<Slice>>,
    pub options: serde_json::Value,
}

impl ChartSpec {
    /// Labels of a series chart; empty for candlesticks
    pub fn labels(&self) -> &[String] {
        match &self.data {
            ChartData::Series { labels, .. } => labels,
            ChartData::Candles { .. } => &[],
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        match &self.data {
            ChartData::Series { datasets, .. } => datasets,
            ChartData::Candles { .. } => &[],
        }
    }
}

/// Chart payload builder
#[derive(Debug, Clone, Copy)]
pub struct ChartSpecBuilder {
    /// Named donut slices before the rest fold into "Others"
    max_slices: usize,
}

impl Default for ChartSpecBuilder {
    fn default() -> Self {
        Self { max_slices: 10 }
    }
}

impl ChartSpecBuilder {
    pub fn with_max_slices(max_slices: usize) -> Self {
        Self {
            max_slices: max_slices.max(1),
        }
    }

    /// Single-series line chart
    pub fn price_chart(&self, points: &[PricePoint], title: &str, label: &str) -> Option<ChartSpec> {
        if points.is_empty() {
            return None;
        }

        Some(ChartSpec {
            kind: ChartKind::Line,
            title: title.to_string(),
            data: ChartData::Series {
                labels: points.iter().map(|p| p.label.clone()).collect(),
                datasets: vec![Dataset {
                    label: Some(label.to_string()),
                    data: points.iter().map(|p| to_f64(p.price)).collect(),
                    background_color: Paint::One(translucent(PRIMARY)),
                    border_color: PRIMARY.to_string(),
                    fill: Some(true),
                    tension: Some(0.3),
                }],
            },
            slices: None,
            options: json!({
                "responsive": true,
                "plugins": {
                    "title": { "display": true, "text": title },
                    "legend": { "display": true, "position": "top" },
                    "tooltip": { "mode": "index", "intersect": false }
                },
                "scales": {
                    "x": { "display": true, "title": { "display": true, "text": "Time" } },
                    "y": { "display": true, "title": { "display": true, "text": "Price ($)" } }
                }
            }),
        })
    }

    /// Allocation donut: the largest positions by value, the remainder
    /// folded into one "Others" slice when non-empty.
    pub fn portfolio_donut(&self, holdings: &[RankedHolding], total_value: Decimal) -> Option<ChartSpec> {
        if holdings.is_empty() {
            return None;
        }

        let mut ranked: Vec<&RankedHolding> = holdings.iter().collect();
        ranked.sort_by(|a, b| b.value.cmp(&a.value));

        let (named, rest) = ranked.split_at(ranked.len().min(self.max_slices));
        let mut slices: Vec<Slice> = named
            .iter()
            .map(|h| Slice {
                label: h.symbol.clone(),
                value: h.value,
                percentage: percentage_of(h.value, total_value),
            })
            .collect();

        if !rest.is_empty() {
            let others: Decimal = rest.iter().map(|h| h.value).sum();
            slices.push(Slice {
                label: OTHERS_LABEL.to_string(),
                value: others,
                percentage: percentage_of(others, total_value),
            });
        }

        let colors = slices
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let color = if s.label == OTHERS_LABEL {
                    DONUT_PALETTE[DONUT_PALETTE.len() - 1]
                } else {
                    DONUT_PALETTE[i % (DONUT_PALETTE.len() - 1)]
                };
                color.to_string()
            })
            .collect();

        let title = format!("Portfolio Distribution - Total: ${}", total_value.round_dp(2));

        Some(ChartSpec {
            kind: ChartKind::Doughnut,
            title: "Portfolio Distribution".to_string(),
            data: ChartData::Series {
                labels: slices.iter().map(|s| s.label.clone()).collect(),
                datasets: vec![Dataset {
                    label: None,
                    data: slices.iter().map(|s| to_f64(s.value)).collect(),
                    background_color: Paint::Many(colors),
                    border_color: BORDER.to_string(),
                    fill: None,
                    tension: None,
                }],
            },
            slices: Some(slices),
            options: json!({
                "responsive": true,
                "cutout": "60%",
                "plugins": {
                    "title": { "display": true, "text": title },
                    "legend": { "position": "right", "labels": { "padding": 15 } }
                }
            }),
        })
    }

    /// Multi-series line chart; labels come from the first series
    pub fn comparison_chart(&self, series: &[PriceSeries], period: &str) -> Option<ChartSpec> {
        let first = series.first()?;

        let datasets = series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let color = COMPARISON_PALETTE[i % COMPARISON_PALETTE.len()];
                Dataset {
                    label: Some(s.name.clone()),
                    data: s.points.iter().map(|p| to_f64(p.price)).collect(),
                    background_color: Paint::One(translucent(color)),
                    border_color: color.to_string(),
                    fill: Some(false),
                    tension: Some(0.3),
                }
            })
            .collect();

        Some(ChartSpec {
            kind: ChartKind::Line,
            title: "Asset Comparison".to_string(),
            data: ChartData::Series {
                labels: first.points.iter().map(|p| p.label.clone()).collect(),
                datasets,
            },
            slices: None,
            options: json!({
                "responsive": true,
                "interaction": { "mode": "index", "intersect": false },
                "plugins": {
                    "title": { "display": true, "text": format!("Performance Comparison - {period}") }
                }
            }),
        })
    }

    pub fn candlestick_chart(&self, candles: &[Candle], title: &str) -> Option<ChartSpec> {
        if candles.is_empty() {
            return None;
        }

        Some(ChartSpec {
            kind: ChartKind::Candlestick,
            title: title.to_string(),
            data: ChartData::Candles {
                label: title.to_string(),
                points: candles
                    .iter()
                    .map(|c| OhlcPoint {
                        x: c.label.clone(),
                        o: to_f64(c.open),
                        h: to_f64(c.high),
                        l: to_f64(c.low),
                        c: to_f64(c.close),
                    })
                    .collect(),
            },
            slices: None,
            options: json!({
                "responsive": true,
                "plugins": {
                    "title": { "display": true, "text": title },
                    "legend": { "display": false }
                },
                "color": { "up": PRIMARY, "down": DANGER, "unchanged": INFO }
            }),
        })
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Hex color with a low alpha suffix
fn translucent(color: &str) -> String {
    format!("{color}20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ranked(symbol: &str, value: Decimal) -> RankedHolding {
        RankedHolding {
            symbol: symbol.into(),
            value,
            percentage: Decimal::ZERO,
        }
    }

    fn points(prices: &[Decimal]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                label: format!("{i}:00"),
                price: *p,
            })
            .collect()
    }

    #[test]
    fn test_empty_inputs_give_no_chart() {
        let builder = ChartSpecBuilder::default();
        assert!(builder.price_chart(&[], "t", "l").is_none());
        assert!(builder.portfolio_donut(&[], dec!(0)).is_none());
        assert!(builder.comparison_chart(&[], "1D").is_none());
        assert!(builder.candlestick_chart(&[], "t").is_none());
    }

    #[test]
    fn test_price_chart_shape() {
        let chart = ChartSpecBuilder::default()
            .price_chart(&points(&[dec!(100), dec!(101.5)]), "Gold Price Movement", "Gold")
            .unwrap();

        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.labels(), ["0:00", "1:00"]);
        assert_eq!(chart.datasets()[0].data, vec![100.0, 101.5]);

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["type"], "line");
        assert_eq!(json["data"]["datasets"][0]["borderColor"], PRIMARY);
        assert!(json.get("slices").is_none());
    }

    #[test]
    fn test_donut_folds_small_positions_into_others() {
        let holdings: Vec<RankedHolding> = (1..=13)
            .map(|i| ranked(&format!("H{i}"), Decimal::from(i * 100)))
            .collect();
        let total: Decimal = holdings.iter().map(|h| h.value).sum();

        let chart = ChartSpecBuilder::default().portfolio_donut(&holdings, total).unwrap();
        let slices = chart.slices.as_ref().unwrap();

        assert_eq!(slices.len(), 11);
        assert_eq!(slices[0].label, "H13");
        assert_eq!(slices[10].label, OTHERS_LABEL);
        // ranks 11..13 are H3, H2, H1
        assert_eq!(slices[10].value, dec!(600));

        let sum: Decimal = slices.iter().map(|s| s.value).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_donut_without_remainder_has_no_others() {
        let holdings = vec![ranked("AAPL", dec!(10000)), ranked("GOOGL", dec!(8000))];
        let chart = ChartSpecBuilder::default()
            .portfolio_donut(&holdings, dec!(18000))
            .unwrap();

        let slices = chart.slices.unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].percentage, dec!(55.6));
    }

    #[test]
    fn test_donut_with_zero_total() {
        let holdings: Vec<RankedHolding> = (0..12).map(|i| ranked(&format!("Z{i}"), dec!(0))).collect();
        let chart = ChartSpecBuilder::default().portfolio_donut(&holdings, dec!(0)).unwrap();

        let slices = chart.slices.unwrap();
        assert_eq!(slices.len(), 11);
        assert!(slices.iter().all(|s| s.percentage.is_zero()));

        let others = &slices[10];
        assert_eq!(others.label, OTHERS_LABEL);
        assert!(others.value.is_zero());
    }

    #[test]
    fn test_donut_keeps_others_for_zero_valued_tail() {
        let mut holdings: Vec<RankedHolding> =
            (1..=10).map(|i| ranked(&format!("H{i}"), dec!(100))).collect();
        holdings.push(ranked("DUST", dec!(0)));

        let chart = ChartSpecBuilder::default()
            .portfolio_donut(&holdings, dec!(1000))
            .unwrap();
        let slices = chart.slices.unwrap();

        assert_eq!(slices.len(), 11);
        assert_eq!(slices[10].label, OTHERS_LABEL);
        assert!(slices[10].value.is_zero());
        assert!(slices[10].percentage.is_zero());
    }

    #[test]
    fn test_comparison_colors_cycle() {
        let series: Vec<PriceSeries> = ["A", "B", "C", "D"]
            .iter()
            .map(|name| PriceSeries {
                name: (*name).to_string(),
                points: points(&[dec!(1), dec!(2)]),
            })
            .collect();

        let chart = ChartSpecBuilder::default().comparison_chart(&series, "24H").unwrap();
        let colors: Vec<_> = chart.datasets().iter().map(|d| d.border_color.as_str()).collect();
        assert_eq!(colors, vec![PRIMARY, INFO, WARNING, PRIMARY]);
        assert_eq!(chart.labels().len(), 2);
    }

    #[test]
    fn test_candlestick_payload() {
        let candles = vec![Candle {
            label: "0:00".into(),
            open: dec!(10),
            high: dec!(12),
            low: dec!(9),
            close: dec!(11),
        }];

        let chart = ChartSpecBuilder::default()
            .candlestick_chart(&candles, "Tesla Candles")
            .unwrap();
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["type"], "candlestick");
        assert_eq!(json["data"]["points"][0]["h"], 12.0);
    }
}
