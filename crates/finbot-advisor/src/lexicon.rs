//! Asset Lexicon
//!
//! Static, ordered table of the assets the advisor recognizes by name.
//! Order matters: when a message names two assets, the entry listed
//! first wins. New entries go at the end.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Base price used for assets without an entry
pub const FALLBACK_BASE_PRICE: Decimal = dec!(100);

/// Minimum word length considered for fuzzy matching
const FUZZY_MIN_LEN: usize = 5;

/// Common words within one edit of an alias
const FUZZY_FALSE_FRIENDS: &[&str] = &["apply", "apples"];

/// Broad asset class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Stock,
    Commodity,
    Index,
}

/// One lexicon row
#[derive(Debug)]
pub struct AssetEntry {
    /// Canonical display name (e.g., "Bitcoin")
    pub name: &'static str,

    /// Lowercase aliases the message may use
    pub aliases: &'static [&'static str],

    /// Representative price for synthetic chart data
    pub base_price: Decimal,

    pub class: AssetClass,

    pattern: Regex,
}

impl AssetEntry {
    fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        base_price: Decimal,
        class: AssetClass,
    ) -> Self {
        let alternation = aliases
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
            .expect("lexicon aliases form a valid pattern");

        Self {
            name,
            aliases,
            base_price,
            class,
            pattern,
        }
    }

    /// Whether any alias occurs as a whole word
    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

/// Ordered asset table
#[derive(Debug)]
pub struct AssetLexicon {
    entries: Vec<AssetEntry>,
}

static STANDARD: Lazy<AssetLexicon> = Lazy::new(|| AssetLexicon {
    entries: vec![
        AssetEntry::new("Bitcoin", &["bitcoin", "btc"], dec!(43000), AssetClass::Crypto),
        AssetEntry::new("Ethereum", &["ethereum", "eth"], dec!(2200), AssetClass::Crypto),
        AssetEntry::new("Apple", &["apple", "aapl"], dec!(182), AssetClass::Stock),
        AssetEntry::new("Tesla", &["tesla", "tsla"], dec!(200), AssetClass::Stock),
        AssetEntry::new("Microsoft", &["microsoft", "msft"], dec!(378), AssetClass::Stock),
        AssetEntry::new("Amazon", &["amazon", "amzn"], dec!(3100), AssetClass::Stock),
        AssetEntry::new("Google", &["google", "googl", "alphabet"], dec!(142), AssetClass::Stock),
        AssetEntry::new("Gold", &["gold", "xau"], dec!(2040), AssetClass::Commodity),
        AssetEntry::new("Silver", &["silver", "xag"], dec!(23), AssetClass::Commodity),
        AssetEntry::new("Oil", &["oil", "crude", "wti", "brent"], dec!(75), AssetClass::Commodity),
        AssetEntry::new("S&P 500", &["s&p", "spx", "spy"], dec!(4500), AssetClass::Index),
        AssetEntry::new("Nasdaq 100", &["nasdaq", "qqq", "ndx"], dec!(15800), AssetClass::Index),
    ],
});

impl AssetLexicon {
    /// The built-in lexicon
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Entries in precedence order
    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    /// Look up by canonical name
    pub fn find(&self, name: &str) -> Option<&AssetEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// First entry, in table order, whose pattern occurs in the message
    pub fn first_match(&self, message: &str) -> Option<&AssetEntry> {
        self.entries.iter().find(|e| e.matches(message))
    }

    /// Every entry whose pattern occurs in the message, in table order
    pub fn all_matches(&self, message: &str) -> Vec<&AssetEntry> {
        self.entries.iter().filter(|e| e.matches(message)).collect()
    }

    /// Typo-tolerant lookup: a word of five or more letters within one
    /// edit (transpositions count as one) of an alias of similar length.
    pub fn fuzzy_match(&self, message: &str) -> Option<&AssetEntry> {
        let words: Vec<String> = message
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= FUZZY_MIN_LEN)
            .map(str::to_lowercase)
            .filter(|w| !FUZZY_FALSE_FRIENDS.contains(&w.as_str()))
            .collect();

        self.entries.iter().find(|entry| {
            entry
                .aliases
                .iter()
                .filter(|alias| alias.len() >= FUZZY_MIN_LEN)
                .any(|alias| words.iter().any(|w| strsim::osa_distance(w, alias) <= 1))
        })
    }

    /// Representative price for a topic
    pub fn base_price(&self, name: &str) -> Decimal {
        self.find(name).map_or(FALLBACK_BASE_PRICE, |e| e.base_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_match_whole_words() {
        let lexicon = AssetLexicon::standard();
        assert_eq!(lexicon.first_match("BTC price").map(|e| e.name), Some("Bitcoin"));
        assert_eq!(lexicon.first_match("AAPL earnings").map(|e| e.name), Some("Apple"));
        assert_eq!(lexicon.first_match("S&P 500 performance").map(|e| e.name), Some("S&P 500"));
        assert!(lexicon.first_match("the method is sound").is_none());
        assert!(lexicon.first_match("golden retriever").is_none());
    }

    #[test]
    fn test_first_match_follows_table_order() {
        let lexicon = AssetLexicon::standard();
        // Ethereum is named first in the message but Bitcoin precedes it in the table
        assert_eq!(
            lexicon.first_match("ethereum vs bitcoin").map(|e| e.name),
            Some("Bitcoin")
        );

        let names: Vec<_> = lexicon
            .all_matches("gold, oil and tesla")
            .iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Tesla", "Gold", "Oil"]);
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        let lexicon = AssetLexicon::standard();
        for (typo, expected) in [
            ("Appel stock", "Apple"),
            ("Microsft analysis", "Microsoft"),
            ("Bitcon price", "Bitcoin"),
            ("Teslas performance", "Tesla"),
            ("Googel trends", "Google"),
        ] {
            assert_eq!(lexicon.fuzzy_match(typo).map(|e| e.name), Some(expected), "{typo}");
        }
    }

    #[test]
    fn test_fuzzy_match_ignores_false_friends() {
        let lexicon = AssetLexicon::standard();
        assert!(lexicon.fuzzy_match("how do I apply for a loan").is_none());
        assert!(lexicon.fuzzy_match("the market").is_none());
    }

    #[test]
    fn test_base_price_fallback() {
        let lexicon = AssetLexicon::standard();
        assert_eq!(lexicon.base_price("Gold"), dec!(2040));
        assert_eq!(lexicon.base_price("Dogecoin"), FALLBACK_BASE_PRICE);
    }
}
