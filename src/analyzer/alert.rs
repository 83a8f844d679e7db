use crate::model::PriceStats;
use serde::Serialize;
use std::fmt;

/// Within 5% of the historical minimum.
pub const EXCELLENT_OVER_MIN: f64 = 1.05;
/// At least 15% below the historical average.
pub const GOOD_OF_AVG: f64 = 0.85;
/// Within 5% of the historical maximum.
pub const HIGH_OF_MAX: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertClass {
    Excellent,
    Good,
    High,
    Normal,
}

impl AlertClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertClass::Excellent => "EXCELLENT",
            AlertClass::Good => "GOOD",
            AlertClass::High => "HIGH",
            AlertClass::Normal => "NORMAL",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AlertClass::Excellent => "Excellent price! Very close to the historical minimum",
            AlertClass::Good => "Good price, below the average",
            AlertClass::High => "High price, consider waiting",
            AlertClass::Normal => "Price within the normal range",
        }
    }
}

impl fmt::Display for AlertClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub classification: AlertClass,
    pub message: String,
    pub current_price: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub potential_savings: f64,
}

pub struct PriceAlertClassifier;

impl PriceAlertClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Checks run in order; the first match wins.
    pub fn classify(&self, current: f64, stats: &PriceStats) -> AlertClass {
        if current <= stats.min * EXCELLENT_OVER_MIN {
            AlertClass::Excellent
        } else if current <= stats.avg * GOOD_OF_AVG {
            AlertClass::Good
        } else if current >= stats.max * HIGH_OF_MAX {
            AlertClass::High
        } else {
            AlertClass::Normal
        }
    }

    pub fn alert(&self, current: f64, stats: &PriceStats) -> PriceAlert {
        let classification = self.classify(current, stats);
        PriceAlert {
            classification,
            message: classification.message().to_string(),
            current_price: current,
            avg_price: stats.avg,
            min_price: stats.min,
            potential_savings: (stats.avg - current).max(0.0),
        }
    }
}

impl Default for PriceAlertClassifier {
    fn default() -> Self {
        Self::new()
    }
}
