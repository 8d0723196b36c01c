//! # finbot-advisor
//!
//! Query classification, portfolio analysis and reply composition for a
//! finance chat assistant.
//!
//! ## Flow
//!
//! Every chat message takes exactly one path:
//!
//! - **Portfolio** - the visitor asked about an uploaded portfolio
//! - **Topic** - a known asset was named; ask the analysis provider
//! - **Static** - small talk, general finance or nothing recognizable
//!
//! ## Example: "analyze my portfolio"
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Your Portfolio Snapshot                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  2 holdings worth $18000.00                                 │
//! │  AAPL  ██████████████████████████  $10000 (55.6%)           │
//! │  GOOGL █████████████████████       $8000  (44.4%)           │
//! │  ⚠ Top holding above 30% - consider diversifying            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod composer;
pub mod error;
pub mod gateway;
pub mod lexicon;
pub mod market;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod svckit;

pub use classifier::{ChartStyle, Complexity, QueryClassifier, QueryIntent, QueryKind, Redirect};
pub use composer::{ComposerLimits, ReplyKind, ReplySource, ResponseComposer, StructuredReply};
pub use error::{AdvisorError, Result};
pub use gateway::{AnalysisGateway, GatewayConfig};
pub use lexicon::{AssetEntry, AssetLexicon};
pub use model::{Holding, PortfolioAnalysis, RankedHolding};
pub use pipeline::{ChatOutcome, ChatPipeline, PipelineConfig};
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use svckit::{ChartSpec, ChartSpecBuilder};
