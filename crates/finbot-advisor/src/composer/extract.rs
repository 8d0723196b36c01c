//! Best-effort scanning of free-form analysis text.
//!
//! Nothing here fails: text that matches no pattern simply yields fewer
//! sections, actions or metrics.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::{ComposerLimits, KeyMetrics, Section, SectionKind};

pub const OVERVIEW: &str = "Overview";

const KNOWN_HEADINGS: &[&str] = &[
    "overview",
    "summary",
    "current price",
    "price action",
    "technical analysis",
    "technical outlook",
    "key levels",
    "key levels to watch",
    "support and resistance",
    "market sentiment",
    "what's driving the price",
    "drivers",
    "catalysts",
    "news",
    "fundamentals",
    "outlook",
    "entry/exit",
    "entry and exit",
    "trading strategy",
    "strategy",
    "recommendation",
    "recommendations",
    "risks",
    "main risks",
    "risk factors",
    "risk assessment",
    "bottom line",
];

/// Longest line, in words, that can be a keyword heading
const MAX_HEADING_WORDS: usize = 6;

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+)$").expect("valid heading pattern"));

static BOLD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*:?$").expect("valid bold pattern"));

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+").expect("valid bullet pattern"));

static BOX_DRAWING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2500}-\u{257F}]+").expect("valid box drawing pattern"));

static EXTRA_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank line pattern"));

static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\*\*)?(\$[\d,]+(?:\.\d+)?)(?:\*\*)?").expect("valid price pattern")
});

static ACTION_CLASSES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:buy|buying|accumulate|entry|enter|long)\b[^\n]*?\$\s?[\d,]+",
        r"(?i)\b(?:sell|selling|take profits?|exit|trim)\b[^\n]*?\$\s?[\d,]+",
        r"(?i)\bstop[- ]?loss(?:es)?\b[^\n]*?\$\s?[\d,]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid action pattern"))
    .collect()
});

static CURRENT_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:current(?:ly)?(?: price)?|trading (?:at|around)|price(?: is)?)[^$\n]{0,20}\$\s?([\d,]+(?:\.\d+)?)")
        .expect("valid current price pattern")
});

static ANY_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s?([\d,]+(?:\.\d+)?)").expect("valid price pattern"));

static CHANGE_24H: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:24\s?h(?:ours?)?|24-hour|today|daily|on the day)[^%\n]{0,40}?([+-]?\d+(?:\.\d+)?)\s?%")
        .expect("valid change pattern")
});

static CHANGE_24H_TRAILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([+-]?\d+(?:\.\d+)?)\s?%[^%\n]{0,40}?(?:24\s?h|24-hour|today|on the day)")
        .expect("valid change pattern")
});

static SUPPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)support[^$\n]{0,30}\$\s?([\d,]+(?:\.\d+)?)").expect("valid support pattern")
});

static RESISTANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)resistance[^$\n]{0,30}\$\s?([\d,]+(?:\.\d+)?)")
        .expect("valid resistance pattern")
});

/// Heading title if the line looks like one
pub fn heading(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = MARKDOWN_HEADING.captures(line) {
        return Some(clean_heading(&caps[1]));
    }
    if let Some(caps) = BOLD_LINE.captures(line) {
        return Some(clean_heading(&caps[1]));
    }

    let title = clean_heading(line);
    let lower = title.to_lowercase();
    let short = title.split_whitespace().count() <= MAX_HEADING_WORDS;
    let known = KNOWN_HEADINGS.iter().any(|k| lower == *k || lower.starts_with(&format!("{k} ")));
    (short && known && !BULLET.is_match(line)).then_some(title)
}

/// Strip markup and leading emoji from a heading
fn clean_heading(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '#' || c == ':' || c.is_whitespace())
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(':')
        .trim()
        .to_string()
}

pub fn section_kind(title: &str) -> SectionKind {
    let lower = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["risk", "warning", "caution"]) {
        SectionKind::Risk
    } else if has(&["technical", "level", "support", "resistance", "chart", "price action", "indicator"]) {
        SectionKind::Technical
    } else if has(&["entry", "exit", "strategy", "recommend", "action", "trade", "buy", "sell"]) {
        SectionKind::Actionable
    } else {
        SectionKind::General
    }
}

/// Content line without bullet markers or bold markup
fn clean_line(line: &str) -> String {
    let stripped = BULLET.replace(line.trim(), "");
    stripped.replace("**", "").trim().to_string()
}

/// Group lines under the most recent heading. Text before the first
/// heading becomes "Overview". Each section keeps at most
/// `limits.section_lines` lines; sections without content are dropped.
pub fn split_sections(text: &str, limits: &ComposerLimits) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::new(OVERVIEW, SectionKind::General);

    for line in text.lines() {
        if let Some(title) = heading(line) {
            let finished = std::mem::replace(&mut current, Section::new(&title, section_kind(&title)));
            if !finished.content.is_empty() {
                sections.push(finished);
            }
            continue;
        }

        let cleaned = clean_line(line);
        if !cleaned.chars().any(char::is_alphanumeric) {
            continue;
        }
        if current.content.len() < limits.section_lines {
            current.content.push(cleaned);
        }
    }

    if !current.content.is_empty() {
        sections.push(current);
    }
    sections
}

/// Buy, sell and stop-loss lines that name a dollar level.
pub fn extract_actions(text: &str, limits: &ComposerLimits) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();

    for class in ACTION_CLASSES.iter() {
        let mut taken = 0;
        for line in text.lines().filter(|l| class.is_match(l)) {
            if taken >= limits.actions_per_class || actions.len() >= limits.actions_total {
                break;
            }
            let action = clean_line(line);
            if !actions.contains(&action) {
                actions.push(action);
                taken += 1;
            }
        }
    }

    actions
}

fn capture_decimal(pattern: &Regex, text: &str) -> Option<Decimal> {
    let caps = pattern.captures(text)?;
    Decimal::from_str(&caps[1].replace(',', "")).ok()
}

pub fn extract_metrics(text: &str) -> KeyMetrics {
    KeyMetrics {
        current_price: capture_decimal(&CURRENT_PRICE, text).or_else(|| capture_decimal(&ANY_PRICE, text)),
        change_24h: capture_decimal(&CHANGE_24H, text)
            .or_else(|| capture_decimal(&CHANGE_24H_TRAILING, text)),
        support: capture_decimal(&SUPPORT, text),
        resistance: capture_decimal(&RESISTANCE, text),
    }
}

/// Reader-facing message text: box drawing removed, prices bolded, a
/// header added when the text has none, and long text truncated.
pub fn clean_analysis(text: &str, topic: &str, limits: &ComposerLimits) -> String {
    let stripped = BOX_DRAWING.replace_all(text, "");
    let collapsed = EXTRA_BLANK_LINES.replace_all(&stripped, "\n\n");
    let mut formatted = collapsed.trim().to_string();

    if !formatted.contains('📊') && !formatted.contains('💰') && !formatted.starts_with('#') {
        formatted = format!("💰 {topic} Quick Analysis\n\n{formatted}");
    }

    formatted = PRICE.replace_all(&formatted, "**${1}**").into_owned();

    let words: Vec<&str> = formatted.split(' ').collect();
    if words.len() > limits.max_words {
        formatted = format!(
            "{}...\n\n💡 *Want more details? Just ask for a deeper analysis!*",
            words[..limits.truncate_to_words.min(words.len())].join(" ")
        );
    }

    if !formatted.contains('💡') && !formatted.contains("questions") {
        formatted.push_str("\n\n💡 Got questions? I love talking finance! 😊");
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
Bitcoin is trading at $43,250 after a strong week.
It rose 2.4% in the last 24h on ETF inflows.

## Technical Analysis
- Support sits near $41,800
- Resistance around $45,000
- RSI is neutral
- MACD turning up

**Risk Factors**
- Regulatory headlines
- Leverage unwinds

Entry and exit
- Consider buying dips toward $42,000
- Take profits near $45,000
- Set a stop-loss at $40,500
- Buy more below $41,000
- Accumulate under $40,000
";

    #[test]
    fn test_heading_detection() {
        assert_eq!(heading("## Key Levels").as_deref(), Some("Key Levels"));
        assert_eq!(heading("**Risk Factors**").as_deref(), Some("Risk Factors"));
        assert_eq!(heading("📈 Technical Analysis:").as_deref(), Some("Technical Analysis"));
        assert!(heading("- risks are elevated this week").is_none());
        assert!(heading("Bitcoin is trading higher today").is_none());
    }

    #[test]
    fn test_split_sections() {
        let sections = split_sections(SAMPLE, &ComposerLimits::default());
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec![OVERVIEW, "Technical Analysis", "Risk Factors", "Entry and exit"]);

        assert_eq!(sections[1].kind, SectionKind::Technical);
        assert_eq!(sections[1].content.len(), 3);
        assert_eq!(sections[1].content[0], "Support sits near $41,800");
        assert_eq!(sections[2].kind, SectionKind::Risk);
        assert_eq!(sections[3].kind, SectionKind::Actionable);
    }

    #[test]
    fn test_action_caps() {
        let actions = extract_actions(SAMPLE, &ComposerLimits::default());
        assert_eq!(actions.len(), 4);
        // two buys, then sells, then the total cap
        assert_eq!(actions[0], "Consider buying dips toward $42,000");
        assert_eq!(actions[1], "Buy more below $41,000");
        assert_eq!(actions[2], "Take profits near $45,000");
    }

    #[test]
    fn test_metrics() {
        let metrics = extract_metrics(SAMPLE);
        assert_eq!(metrics.current_price, Some(dec!(43250)));
        assert_eq!(metrics.change_24h, Some(dec!(2.4)));
        assert_eq!(metrics.support, Some(dec!(41800)));
        assert_eq!(metrics.resistance, Some(dec!(45000)));

        assert_eq!(extract_metrics("no numbers here"), KeyMetrics::default());
    }

    #[test]
    fn test_clean_analysis_formats_text() {
        let text = "╔════╗\nGold at $2,040 today\n━━━━━━\nWatch **$2,000**";
        let cleaned = clean_analysis(text, "Gold", &ComposerLimits::default());

        assert!(cleaned.starts_with("💰 Gold Quick Analysis"));
        assert!(!cleaned.contains('═'));
        assert!(!cleaned.contains('━'));
        assert!(cleaned.contains("**$2,040**"));
        assert!(cleaned.contains("**$2,000**"));
        assert!(!cleaned.contains("****"));
    }

    #[test]
    fn test_clean_analysis_truncates_long_text() {
        let long = vec!["word"; 320].join(" ");
        let cleaned = clean_analysis(&long, "Oil", &ComposerLimits::default());
        assert!(cleaned.contains("Want more details?"));
        assert!(cleaned.split(' ').count() < 300);
    }
}
