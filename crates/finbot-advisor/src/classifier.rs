//! Query Classifier
//!
//! Turns a free-text chat message into a [`QueryIntent`]. Classification is
//! pure and total: every message yields an intent, nothing errors.
//!
//! Rules run in strict precedence and the first match wins:
//!
//! 1. Portfolio token with a loaded portfolio
//! 2. Small talk and off-topic vocabulary (ordered rule list)
//! 3. Asset lexicon, then the fuzzy fallback
//! 4. Generic financial vocabulary
//! 5. Chart and comparison keywords
//! 6. Complexity keywords
//! 7. Welcome / clarification / general fallbacks

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::AssetLexicon;

/// Which pipeline path a message takes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Portfolio,
    NonFinancial,
    FinancialGeneral,
    General,
    Welcome,
    Clarification,
}

impl QueryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::NonFinancial => "non_financial",
            Self::FinancialGeneral => "financial_general",
            Self::General => "general",
            Self::Welcome => "welcome",
            Self::Clarification => "clarification",
        }
    }
}

/// Requested depth of an analysis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Small-talk family a non-financial message fell into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redirect {
    Greeting,
    Wellbeing,
    Thanks,
    OffTopic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    #[default]
    Line,
    Candlestick,
}

/// Classification result for one message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    #[serde(rename = "type")]
    pub kind: QueryKind,

    /// Canonical lexicon name of the asset, if any
    pub topic: Option<String>,

    pub complexity: Complexity,

    pub needs_chart: bool,

    /// Set only for non-financial messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,

    pub chart_style: ChartStyle,

    /// Every matched asset when the message asks for a comparison
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparison: Vec<String>,
}

impl QueryIntent {
    fn new(kind: QueryKind) -> Self {
        Self {
            kind,
            topic: None,
            complexity: Complexity::Medium,
            needs_chart: false,
            redirect: None,
            chart_style: ChartStyle::Line,
            comparison: Vec::new(),
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.comparison.len() >= 2
    }
}

struct NonFinancialRule {
    pattern: Regex,
    redirect: Redirect,
}

fn rule(pattern: &str, redirect: Redirect) -> NonFinancialRule {
    NonFinancialRule {
        pattern: Regex::new(pattern).expect("valid non-financial pattern"),
        redirect,
    }
}

static NON_FINANCIAL_RULES: Lazy<Vec<NonFinancialRule>> = Lazy::new(|| {
    vec![
        rule(
            r"(?i)\b(hello|hi|hey|greetings|good (morning|afternoon|evening))\b",
            Redirect::Greeting,
        ),
        rule(
            r"(?i)\b(how are you|how's it going|how is it going)\b",
            Redirect::Wellbeing,
        ),
        rule(r"(?i)\b(thank you|thanks|thx|appreciate it)\b", Redirect::Thanks),
        rule(
            r"(?i)\b(weather|food|pizza|pasta|recipes?|cook|cooking|bake|baking|restaurants?|movies?|films?|music|songs?|sports?|football|soccer|basketball|travel|vacation|medicine|doctor|politics|religion|games?|gaming|celebrit(y|ies)|fix(ing)? my car|programming|coding|exercise|workout|fitness|relationships?|dating)\b",
            Redirect::OffTopic,
        ),
    ]
});

static FINANCIAL_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(stocks?|shares|equit(y|ies)|crypto(currenc(y|ies))?|forex|currenc(y|ies)|invest(ing|ment|ments|or|ors)?|trading|traders?|markets?|economy|economic|inflation|interest rates?|bonds?|etfs?|dividends?|portfolios?|risk management|recession|federal reserve|earnings|commodit(y|ies)|hedge|volatility)\b",
    )
    .expect("valid financial vocabulary pattern")
});

static CHART_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)chart|graph|visual|trend|price movement|candlestick")
        .expect("valid chart pattern")
});

static CANDLE_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)candle|ohlc").expect("valid candle pattern"));

static COMPARISON_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(compare|comparing|comparison|vs\.?|versus)\b")
        .expect("valid comparison pattern")
});

static HIGH_COMPLEXITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)deep|depth|comprehensive|detailed|technical|thorough")
        .expect("valid complexity pattern")
});

static LOW_COMPLEXITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(simple|quick|quickly|brief|briefly|overview|summary|tl;?dr)\b")
        .expect("valid complexity pattern")
});

const PORTFOLIO_TOKENS: &[&str] = &["portfolio", "my holdings"];

/// Message classifier over an asset lexicon
#[derive(Clone, Copy, Debug)]
pub struct QueryClassifier {
    lexicon: &'static AssetLexicon,
    fuzzy: bool,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(AssetLexicon::standard())
    }
}

impl QueryClassifier {
    pub fn new(lexicon: &'static AssetLexicon) -> Self {
        Self {
            lexicon,
            fuzzy: true,
        }
    }

    /// Disable the typo-tolerant lexicon fallback
    #[must_use]
    pub fn without_fuzzy(mut self) -> Self {
        self.fuzzy = false;
        self
    }

    pub fn lexicon(&self) -> &'static AssetLexicon {
        self.lexicon
    }

    pub fn classify(&self, message: &str, has_portfolio: bool) -> QueryIntent {
        let intent = self.classify_inner(message, has_portfolio);
        tracing::debug!(
            kind = intent.kind.as_str(),
            topic = intent.topic.as_deref().unwrap_or("-"),
            complexity = intent.complexity.as_str(),
            needs_chart = intent.needs_chart,
            "Classified query"
        );
        intent
    }

    fn classify_inner(&self, message: &str, has_portfolio: bool) -> QueryIntent {
        let lower = message.to_lowercase();
        let mentions_portfolio = PORTFOLIO_TOKENS.iter().any(|t| lower.contains(t));

        if mentions_portfolio && has_portfolio {
            let mut intent = QueryIntent::new(QueryKind::Portfolio);
            intent.needs_chart = true;
            intent.complexity = Self::complexity(message);
            return intent;
        }

        if let Some(rule) = NON_FINANCIAL_RULES.iter().find(|r| r.pattern.is_match(message)) {
            let mut intent = QueryIntent::new(QueryKind::NonFinancial);
            intent.redirect = Some(rule.redirect);
            return intent;
        }

        let topic = self.lexicon.first_match(message).or_else(|| {
            if self.fuzzy {
                self.lexicon.fuzzy_match(message)
            } else {
                None
            }
        });

        let kind = if topic.is_some() {
            QueryKind::General
        } else if FINANCIAL_VOCABULARY.is_match(message) && !mentions_portfolio {
            QueryKind::FinancialGeneral
        } else if mentions_portfolio {
            QueryKind::Clarification
        } else if has_portfolio {
            QueryKind::General
        } else {
            QueryKind::Welcome
        };

        let mut intent = QueryIntent::new(kind);
        intent.complexity = Self::complexity(message);
        intent.needs_chart = topic.is_some() || CHART_KEYWORDS.is_match(message);

        if CANDLE_KEYWORDS.is_match(message) {
            intent.chart_style = ChartStyle::Candlestick;
        }

        if topic.is_some() && COMPARISON_KEYWORDS.is_match(message) {
            let matched = self.lexicon.all_matches(message);
            if matched.len() >= 2 {
                intent.comparison = matched.iter().map(|e| e.name.to_string()).collect();
            }
        }

        intent.topic = topic.map(|e| e.name.to_string());
        intent
    }

    fn complexity(message: &str) -> Complexity {
        if HIGH_COMPLEXITY.is_match(message) {
            Complexity::High
        } else if LOW_COMPLEXITY.is_match(message) {
            Complexity::Low
        } else {
            Complexity::Medium
        }
    }
}
