// Core structs: PriceObservation, PricePoint, PriceStats and error types
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single raw price reading for one product at one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub product: String,
    pub store: String,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

/// One point of a daily price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{stage}: insufficient data ({actual} points, need {required})")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        actual: usize,
    },
}

impl AnalysisError {
    pub fn insufficient(stage: &'static str, required: usize, actual: usize) -> Self {
        AnalysisError::InsufficientData {
            stage,
            required,
            actual,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed import file: {0}")]
    Json(#[from] serde_json::Error),
}
