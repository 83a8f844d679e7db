//! Price history analysis: trend, volatility and weekday statistics feeding a
//! small forward-chaining rule engine that decides whether to buy.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod recommendation;
pub mod rules;
pub mod storage;
pub mod utils;

pub use model::{AnalysisError, PriceObservation, PricePoint, PriceStats};
pub use recommendation::{Action, Recommendation, RecommendationSynthesizer, Resolution};
pub use rules::{Condition, Fact, FactValue, KnowledgeBase, Operator, Rule, RuleEngine};
