//! Portfolio Ingestion
//!
//! Parses uploaded CSV exports into [`Holding`]s. Brokers label their
//! columns differently, so each field is looked up through a list of
//! aliases against normalized headers.

use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::model::{DEFAULT_ASSET_TYPE, Holding};

const SYMBOL_ALIASES: &[&str] = &["symbol", "ticker", "asset", "stock"];
const LABEL_ALIASES: &[&str] = &["asset", "name", "description", "symbol"];
const SHARES_ALIASES: &[&str] = &["shares", "quantity", "qty", "units"];
const PURCHASE_PRICE_ALIASES: &[&str] = &["purchase_price", "cost", "buy_price", "avg_cost"];
const CURRENT_PRICE_ALIASES: &[&str] = &["current_price", "price", "last_price", "market_price"];
const MARKET_VALUE_ALIASES: &[&str] = &["market_value", "value", "total_value", "position_value"];
const GAIN_LOSS_ALIASES: &[&str] = &["gain_loss", "pnl", "profit_loss", "unrealized_gain"];
const ASSET_TYPE_ALIASES: &[&str] = &["asset_type", "type", "category"];

static HEADER_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_]+").expect("valid header separator pattern"));

/// Holdings parsed from one file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPortfolio {
    pub holdings: Vec<Holding>,
    /// Normalized header row
    pub headers: Vec<String>,
    /// Data rows read, including discarded blank rows
    pub row_count: usize,
}

/// Result of [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub valid: bool,
    pub missing_fields: Vec<String>,
}

/// Column index per holding field, resolved once from the header row
#[derive(Debug, Default)]
struct ColumnMap {
    symbol: Option<usize>,
    label: Option<usize>,
    shares: Option<usize>,
    purchase_price: Option<usize>,
    current_price: Option<usize>,
    market_value: Option<usize>,
    gain_loss: Option<usize>,
    asset_type: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Self {
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|h| h == alias))
        };

        Self {
            symbol: find(SYMBOL_ALIASES),
            label: find(LABEL_ALIASES),
            shares: find(SHARES_ALIASES),
            purchase_price: find(PURCHASE_PRICE_ALIASES),
            current_price: find(CURRENT_PRICE_ALIASES),
            market_value: find(MARKET_VALUE_ALIASES),
            gain_loss: find(GAIN_LOSS_ALIASES),
            asset_type: find(ASSET_TYPE_ALIASES),
        }
    }

    fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.label.is_none() && self.market_value.is_none()
    }
}

/// Parse raw CSV bytes into holdings.
///
/// Fails with `ParseFailure` when no recognizable column exists or when
/// every row is blank.
pub fn parse_csv(content: &[u8]) -> Result<ParsedPortfolio> {
    let text = decode(content);
    if text.trim().is_empty() {
        return Err(AdvisorError::parse_failure("file is empty"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let columns = ColumnMap::resolve(&headers);
    if columns.is_empty() {
        return Err(AdvisorError::ParseFailure {
            reason: "no recognizable portfolio columns".into(),
            details: vec![format!("headers found: {}", headers.join(", "))],
        });
    }

    let mut holdings = Vec::new();
    let mut row_count = 0;
    for record in reader.records() {
        let record = record?;
        row_count += 1;

        let holding = holding_from_record(&record, &columns).map_err(|e| match e {
            AdvisorError::ParseFailure { reason, .. } => AdvisorError::ParseFailure {
                reason: format!("row {row_count}: {reason}"),
                details: Vec::new(),
            },
            other => other,
        })?;
        if !holding.is_blank() {
            holdings.push(holding);
        }
    }

    if holdings.is_empty() {
        return Err(AdvisorError::ParseFailure {
            reason: "no holdings found".into(),
            details: vec![format!("{row_count} data rows read")],
        });
    }

    tracing::debug!(rows = row_count, holdings = holdings.len(), "Parsed portfolio CSV");

    Ok(ParsedPortfolio {
        holdings,
        headers,
        row_count,
    })
}

/// Check that holdings carry enough data to analyze
pub fn validate(holdings: &[Holding]) -> Validation {
    let mut missing_fields = Vec::new();

    if !holdings.iter().any(|h| !h.symbol.trim().is_empty()) {
        missing_fields.push("symbol".to_string());
    }
    if !holdings.iter().any(|h| !h.market_value.is_zero()) {
        missing_fields.push("market_value".to_string());
    }

    Validation {
        valid: missing_fields.is_empty(),
        missing_fields,
    }
}

fn decode(content: &[u8]) -> String {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    String::from_utf8_lossy(content).into_owned()
}

fn normalize_header(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    HEADER_SEPARATORS.replace_all(&lower, "_").into_owned()
}

fn holding_from_record(record: &StringRecord, columns: &ColumnMap) -> Result<Holding> {
    let text = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };
    let number = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map_or(Decimal::ZERO, parse_number);

    let symbol = text(columns.symbol);
    let mut asset_label = text(columns.label);
    if asset_label.is_empty() {
        asset_label.clone_from(&symbol);
    }
    let asset_type = Some(text(columns.asset_type))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_ASSET_TYPE.to_string());

    let mut holding = Holding {
        symbol,
        asset_label,
        shares: number(columns.shares).max(Decimal::ZERO),
        purchase_price: number(columns.purchase_price).max(Decimal::ZERO),
        current_price: number(columns.current_price).max(Decimal::ZERO),
        market_value: number(columns.market_value).max(Decimal::ZERO),
        gain_loss: number(columns.gain_loss),
        asset_type,
    };
    holding.backfill()?;
    Ok(holding)
}

/// Parse a money cell: strips `$`, `,` and spaces; `(12.50)` is negative.
/// Unparseable cells count as zero.
fn parse_number(cell: &str) -> Decimal {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    let (negative, digits) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value = Decimal::from_str(digits).unwrap_or(Decimal::ZERO);
    if negative { -value } else { value }
}
