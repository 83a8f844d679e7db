use crate::model::{AnalysisError, PricePoint};
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const MIN_POINTS: usize = 5;

/// Coefficient-of-variation band edges, in percent.
pub const LOW_CV_BELOW: f64 = 5.0;
pub const MEDIUM_CV_BELOW: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityLabel {
    Low,
    Medium,
    High,
}

impl VolatilityLabel {
    pub fn from_cv(cv: f64) -> Self {
        if cv < LOW_CV_BELOW {
            VolatilityLabel::Low
        } else if cv < MEDIUM_CV_BELOW {
            VolatilityLabel::Medium
        } else {
            VolatilityLabel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityLabel::Low => "LOW",
            VolatilityLabel::Medium => "MEDIUM",
            VolatilityLabel::High => "HIGH",
        }
    }
}

impl fmt::Display for VolatilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volatility {
    pub label: VolatilityLabel,
    pub coefficient_of_variation: f64,
    pub std_dev: f64,
    pub range: f64,
}

pub struct VolatilityAnalyzer;

impl VolatilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Population dispersion of the series.
    pub fn analyze(&self, series: &[PricePoint]) -> Result<Volatility, AnalysisError> {
        let count = series.len();
        if count < MIN_POINTS {
            return Err(AnalysisError::insufficient("volatility", MIN_POINTS, count));
        }

        let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
        let mean = prices.iter().sum::<f64>() / count as f64;
        if mean == 0.0 {
            // CV is undefined for a zero mean
            return Err(AnalysisError::insufficient("volatility", MIN_POINTS, count));
        }
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / count as f64;
        let std_dev = variance.sqrt();
        let cv = std_dev * 100.0 / mean;

        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let label = VolatilityLabel::from_cv(cv);

        debug!("volatility: mean={:.2} std_dev={:.2} cv={:.2} -> {}", mean, std_dev, cv, label);

        Ok(Volatility {
            label,
            coefficient_of_variation: cv,
            std_dev,
            range: max - min,
        })
    }
}

impl Default for VolatilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
