//! Response Composer
//!
//! Assembles the structured reply shown in the chat window from a
//! classified intent and whatever source backs it: a portfolio analysis,
//! free-form analysis text, or nothing (static copy).
//!
//! Composition is a pure transform and never fails. Sizes are capped by
//! [`ComposerLimits`] to keep replies terse.

mod copy;
pub mod extract;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classifier::{QueryIntent, QueryKind, Redirect};
use crate::model::{PortfolioAnalysis, RankedHolding, TypeAllocation};
use crate::svckit::portfolio_analyzer::{CONCENTRATED_ABOVE, Concentration, concentration, percentage_of};

use copy::StaticCopy;

/// Caps applied to every composed reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerLimits {
    pub summary: usize,
    pub section_lines: usize,
    pub actions_per_class: usize,
    pub actions_total: usize,
    /// Analysis text longer than this many words is truncated
    pub max_words: usize,
    pub truncate_to_words: usize,
}

impl Default for ComposerLimits {
    fn default() -> Self {
        Self {
            summary: 3,
            section_lines: 3,
            actions_per_class: 2,
            actions_total: 4,
            max_words: 300,
            truncate_to_words: 280,
        }
    }
}

/// What backs a reply
#[derive(Debug, Clone, Copy)]
pub enum ReplySource<'a> {
    Portfolio(&'a PortfolioAnalysis),
    Analysis(&'a str),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Analysis,
    Portfolio,
    Guardrail,
    Guidance,
    Welcome,
    Clarification,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Technical,
    Risk,
    Actionable,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub kind: SectionKind,
    pub content: Vec<String>,
}

impl Section {
    pub fn new(title: &str, kind: SectionKind) -> Self {
        Self {
            title: title.to_string(),
            kind,
            content: Vec::new(),
        }
    }

    fn with_content(mut self, content: Vec<String>) -> Self {
        self.content = content;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
    /// Percent change over the last day
    #[serde(rename = "change24h", skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resistance: Option<Decimal>,
}

impl KeyMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Portfolio figures attached to portfolio replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub holdings_count: usize,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    pub top_holdings: Vec<RankedHolding>,
    pub distribution: Vec<TypeAllocation>,
}

/// The reply shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub title: String,
    /// Full reply text
    pub message: String,
    pub summary: Vec<String>,
    pub sections: Vec<Section>,
    pub action_items: Vec<String>,
    pub key_metrics: KeyMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<PortfolioSnapshot>,
}

impl StructuredReply {
    fn from_copy(kind: ReplyKind, copy: &StaticCopy, limits: &ComposerLimits) -> Self {
        Self {
            kind,
            title: copy.title.to_string(),
            message: copy.message.to_string(),
            summary: copy.summary.iter().take(limits.summary).map(ToString::to_string).collect(),
            sections: Vec::new(),
            action_items: Vec::new(),
            key_metrics: KeyMetrics::default(),
            portfolio: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer {
    limits: ComposerLimits,
}

impl ResponseComposer {
    pub fn new(limits: ComposerLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ComposerLimits {
        &self.limits
    }

    pub fn compose(&self, intent: &QueryIntent, source: ReplySource<'_>) -> StructuredReply {
        match source {
            ReplySource::Portfolio(analysis) => self.compose_portfolio(analysis),
            ReplySource::Analysis(text) => {
                let topic = intent.topic.as_deref().unwrap_or("Market");
                self.compose_analysis(topic, text)
            }
            ReplySource::None => self.compose_static(intent),
        }
    }

    fn compose_static(&self, intent: &QueryIntent) -> StructuredReply {
        let (kind, copy) = match intent.kind {
            QueryKind::NonFinancial => (
                ReplyKind::Guardrail,
                copy::redirect(intent.redirect.unwrap_or(Redirect::OffTopic)),
            ),
            QueryKind::FinancialGeneral => (ReplyKind::Guidance, copy::FINANCIAL_GENERAL),
            QueryKind::Welcome => (ReplyKind::Welcome, copy::WELCOME),
            // a portfolio intent with no analysis means nothing usable was uploaded
            QueryKind::Clarification | QueryKind::Portfolio => {
                (ReplyKind::Clarification, copy::CLARIFICATION)
            }
            QueryKind::General => (ReplyKind::General, copy::GENERAL),
        };
        StructuredReply::from_copy(kind, &copy, &self.limits)
    }

    fn compose_analysis(&self, topic: &str, text: &str) -> StructuredReply {
        let sections = extract::split_sections(text, &self.limits);
        let summary = sections
            .iter()
            .flat_map(|s| s.content.iter())
            .take(self.limits.summary)
            .cloned()
            .collect();

        StructuredReply {
            kind: ReplyKind::Analysis,
            title: format!("{topic} Analysis"),
            message: extract::clean_analysis(text, topic, &self.limits),
            summary,
            action_items: extract::extract_actions(text, &self.limits),
            key_metrics: extract::extract_metrics(text),
            sections,
            portfolio: None,
        }
    }

    fn compose_portfolio(&self, analysis: &PortfolioAnalysis) -> StructuredReply {
        let limits = &self.limits;
        let top = analysis.top();
        let gain_loss = analysis.total_gain_loss;
        let gain_text = if gain_loss >= Decimal::ZERO {
            format!("📈 Currently looking good: up ${:.2}", gain_loss)
        } else {
            format!("📉 Currently down a bit: ${:.2}", gain_loss.abs())
        };

        let mut summary = vec![
            format!(
                "{} holdings worth ${:.2}",
                analysis.holdings_count, analysis.total_value
            ),
            gain_text.clone(),
        ];
        if let Some(top) = top {
            summary.push(format!("Largest position: {} at {}%", top.symbol, top.percentage));
        }
        summary.truncate(limits.summary);

        let medals = ["🥇", "🥈", "🥉"];
        let top_lines: Vec<String> = analysis
            .top_holdings
            .iter()
            .take(limits.section_lines)
            .enumerate()
            .map(|(i, h)| {
                let medal = medals.get(i).copied().unwrap_or("•");
                format!("{medal} {}: {}%", h.symbol, h.percentage)
            })
            .collect();

        let mut by_type: Vec<&TypeAllocation> = analysis.distribution.iter().collect();
        by_type.sort_by(|a, b| b.value.cmp(&a.value));
        let type_lines = by_type
            .iter()
            .take(limits.section_lines)
            .map(|a| {
                format!(
                    "{}: ${:.2} ({}%)",
                    a.asset_type,
                    a.value,
                    percentage_of(a.value, analysis.total_value)
                )
            })
            .collect();

        let mut sections = vec![
            Section::new("Top Holdings", SectionKind::General).with_content(top_lines.clone()),
            Section::new("Allocation by Type", SectionKind::General).with_content(type_lines),
        ];

        let mut action_items = Vec::new();
        let mut concentration_note = None;
        match (concentration(analysis), top) {
            (Concentration::Concentrated, Some(top)) => {
                let note = format!("⚠️ Your top holding is {}% - consider diversifying!", top.percentage);
                sections.push(
                    Section::new("Concentration", SectionKind::Risk).with_content(vec![note.clone()]),
                );
                action_items.push(format!(
                    "Consider trimming {} below {}% of the portfolio",
                    top.symbol, CONCENTRATED_ABOVE
                ));
                concentration_note = Some(note);
            }
            (Concentration::Diversified, _) => {
                let note = "✅ Nice diversification across your holdings!".to_string();
                sections.push(
                    Section::new("Concentration", SectionKind::General).with_content(vec![note.clone()]),
                );
                concentration_note = Some(note);
            }
            _ => {}
        }
        if gain_loss < Decimal::ZERO {
            action_items.push("Review the positions behind the unrealized loss".to_string());
        }
        action_items.truncate(limits.actions_total);

        let mut message = format!(
            "💼 Your Portfolio Snapshot\n\nYou've got **{} holdings** worth **${:.2}**\n{gain_text}\n\n🏆 **Top Holdings:**\n{}\n",
            analysis.holdings_count,
            analysis.total_value,
            top_lines.join("\n"),
        );
        if let Some(note) = concentration_note {
            message.push_str(&format!("\n{note}\n"));
        }
        message.push_str("\n💡 Want detailed charts and insights? Just ask! 😊");

        StructuredReply {
            kind: ReplyKind::Portfolio,
            title: "Your Portfolio Snapshot".to_string(),
            message,
            summary,
            sections,
            action_items,
            key_metrics: KeyMetrics::default(),
            portfolio: Some(PortfolioSnapshot {
                holdings_count: analysis.holdings_count,
                total_value: analysis.total_value,
                total_gain_loss: analysis.total_gain_loss,
                top_holdings: analysis.top_holdings.iter().take(3).cloned().collect(),
                distribution: analysis.distribution.clone(),
            }),
        }
    }
}
