//! Portfolio Analyzer
//!
//! Totals, ranking and type distribution over a set of holdings.
//! Recomputed on every portfolio query.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{AdvisorError, Result};
use crate::model::{Holding, OTHER_ASSET_TYPE, PortfolioAnalysis, RankedHolding, TypeAllocation};

/// Top-holding share above which a portfolio counts as concentrated
pub const CONCENTRATED_ABOVE: Decimal = dec!(30);

/// Top-holding share below which a broad portfolio counts as diversified
pub const DIVERSIFIED_BELOW: Decimal = dec!(15);

/// Holdings count a portfolio needs before it can count as diversified
pub const DIVERSIFIED_MIN_HOLDINGS: usize = 10;

/// How much of the portfolio sits in its largest position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concentration {
    Concentrated,
    Balanced,
    Diversified,
}

/// Aggregate holdings. Empty input is rejected.
pub fn analyze(holdings: &[Holding]) -> Result<PortfolioAnalysis> {
    if holdings.is_empty() {
        return Err(AdvisorError::InvalidInput(
            "portfolio has no holdings to analyze".into(),
        ));
    }

    let total_value = checked_total(holdings.iter().map(|h| h.market_value), "total value")?;
    let total_gain_loss = checked_total(holdings.iter().map(|h| h.gain_loss), "total gain/loss")?;

    let mut distribution: Vec<TypeAllocation> = Vec::new();
    for holding in holdings {
        let asset_type = if holding.asset_type.trim().is_empty() {
            OTHER_ASSET_TYPE
        } else {
            holding.asset_type.as_str()
        };

        match distribution.iter_mut().find(|a| a.asset_type == asset_type) {
            Some(bucket) => {
                bucket.value = bucket
                    .value
                    .checked_add(holding.market_value)
                    .ok_or_else(|| too_large(&format!("{asset_type} allocation")))?;
            }
            None => distribution.push(TypeAllocation {
                asset_type: asset_type.to_string(),
                value: holding.market_value,
            }),
        }
    }

    let mut top_holdings: Vec<RankedHolding> = holdings
        .iter()
        .map(|h| RankedHolding {
            symbol: h.display_name().to_string(),
            value: h.market_value,
            percentage: percentage_of(h.market_value, total_value),
        })
        .collect();
    // stable: equal values keep input order
    top_holdings.sort_by(|a, b| b.value.cmp(&a.value));

    Ok(PortfolioAnalysis {
        holdings: holdings.to_vec(),
        holdings_count: holdings.len(),
        total_value,
        total_gain_loss,
        top_holdings,
        distribution,
    })
}

fn checked_total(mut values: impl Iterator<Item = Decimal>, what: &str) -> Result<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v).ok_or_else(|| too_large(what)))
}

fn too_large(what: &str) -> AdvisorError {
    AdvisorError::InvalidInput(format!("portfolio {what} is too large to compute"))
}

/// `part / total * 100` to one decimal place; zero when the total is zero
pub fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (part / total * dec!(100)).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Classify the weight of the largest position
pub fn concentration(analysis: &PortfolioAnalysis) -> Concentration {
    let Some(top) = analysis.top() else {
        return Concentration::Balanced;
    };

    if top.percentage > CONCENTRATED_ABOVE {
        Concentration::Concentrated
    } else if top.percentage < DIVERSIFIED_BELOW
        && analysis.holdings_count > DIVERSIFIED_MIN_HOLDINGS
    {
        Concentration::Diversified
    } else {
        Concentration::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_ranking() {
        let holdings = vec![
            Holding::new("GOOGL", dec!(8000)).with_gain_loss(dec!(-200)),
            Holding::new("AAPL", dec!(10000)).with_gain_loss(dec!(1500)),
        ];

        let analysis = analyze(&holdings).unwrap();
        assert_eq!(analysis.holdings_count, 2);
        assert_eq!(analysis.total_value, dec!(18000));
        assert_eq!(analysis.total_gain_loss, dec!(1300));

        let top = analysis.top().unwrap();
        assert_eq!(top.symbol, "AAPL");
        assert_eq!(top.percentage, dec!(55.6));
        assert_eq!(analysis.top_holdings[1].percentage, dec!(44.4));

        let ranked_sum: Decimal = analysis.top_holdings.iter().map(|r| r.value).sum();
        assert_eq!(ranked_sum, analysis.total_value);
    }

    #[test]
    fn test_percentages_sum_to_about_hundred() {
        let holdings: Vec<Holding> = (1..=7)
            .map(|i| Holding::new(format!("H{i}"), Decimal::from(i * 137)))
            .collect();

        let analysis = analyze(&holdings).unwrap();
        let sum: Decimal = analysis.top_holdings.iter().map(|r| r.percentage).sum();
        assert!((sum - dec!(100)).abs() <= dec!(0.5), "sum was {sum}");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let holdings = vec![
            Holding::new("FIRST", dec!(500)),
            Holding::new("SECOND", dec!(500)),
            Holding::new("BIG", dec!(900)),
        ];

        let analysis = analyze(&holdings).unwrap();
        let order: Vec<_> = analysis.top_holdings.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["BIG", "FIRST", "SECOND"]);
    }

    #[test]
    fn test_distribution_by_type() {
        let holdings = vec![
            Holding::new("AAPL", dec!(100)),
            Holding::new("BTC", dec!(50)).with_asset_type("crypto"),
            Holding::new("MSFT", dec!(25)),
            Holding::new("???", dec!(5)).with_asset_type(""),
        ];

        let analysis = analyze(&holdings).unwrap();
        assert_eq!(analysis.distribution.len(), 3);
        assert_eq!(analysis.distribution[0].asset_type, "stock");
        assert_eq!(analysis.distribution[0].value, dec!(125));
        assert_eq!(analysis.distribution[2].asset_type, OTHER_ASSET_TYPE);
    }

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let holdings = vec![Holding::new("A", Decimal::ZERO), Holding::new("B", Decimal::ZERO)];
        let analysis = analyze(&holdings).unwrap();
        assert!(analysis.top_holdings.iter().all(|r| r.percentage.is_zero()));
    }

    #[test]
    fn test_oversized_total_is_invalid_input() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let holdings = vec![Holding::new("A", huge), Holding::new("B", huge)];

        let err = analyze(&holdings).unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(_)));
        assert!(err.to_string().contains("total value"));
    }

    #[test]
    fn test_empty_is_invalid_input() {
        assert!(matches!(analyze(&[]), Err(AdvisorError::InvalidInput(_))));
    }

    #[test]
    fn test_concentration_levels() {
        let concentrated =
            analyze(&[Holding::new("A", dec!(90)), Holding::new("B", dec!(10))]).unwrap();
        assert_eq!(concentration(&concentrated), Concentration::Concentrated);

        let broad: Vec<Holding> = (0..12).map(|i| Holding::new(format!("H{i}"), dec!(10))).collect();
        assert_eq!(concentration(&analyze(&broad).unwrap()), Concentration::Diversified);

        let middling: Vec<Holding> = (0..4).map(|i| Holding::new(format!("H{i}"), dec!(10))).collect();
        assert_eq!(concentration(&analyze(&middling).unwrap()), Concentration::Balanced);
    }
}
