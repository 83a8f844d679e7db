use crate::model::{AnalysisError, PricePoint};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Fewest points a regression is fitted over.
pub const MIN_POINTS: usize = 3;

/// Slope (price units per period) beyond which a series counts as moving.
pub const TREND_THRESHOLD: f64 = 0.1;

pub const DEFAULT_HORIZON: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    Rising,
    Falling,
    Stable,
}

impl TrendLabel {
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_THRESHOLD {
            TrendLabel::Rising
        } else if slope < -TREND_THRESHOLD {
            TrendLabel::Falling
        } else {
            TrendLabel::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Rising => "RISING",
            TrendLabel::Falling => "FALLING",
            TrendLabel::Stable => "STABLE",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub predicted_price: f64,
    /// R² scaled to 0..=100.
    pub confidence: f64,
    pub trend: TrendLabel,
    pub expected_change: f64,
    pub slope: f64,
    pub intercept: f64,
    pub horizon: u32,
}

/// Least-squares line through `(index, price)` pairs.
pub struct TrendForecaster {
    horizon: u32,
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

impl TrendForecaster {
    pub fn new(horizon: u32) -> Self {
        Self { horizon }
    }

    /// Fits the series and projects `horizon` periods past its last point.
    pub fn forecast(&self, series: &[PricePoint]) -> Result<Forecast, AnalysisError> {
        let n = series.len();
        if n < MIN_POINTS {
            return Err(AnalysisError::insufficient("trend", MIN_POINTS, n));
        }

        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.price))
            .collect();

        let nf = n as f64;
        let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
        let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
        let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

        // decided on the raw prices; the mean of a constant series can round
        let flat = series.windows(2).all(|w| w[0].price == w[1].price);

        // x values are distinct indices, so the denominator is positive for n >= 2
        let slope = if flat {
            0.0
        } else {
            (nf * sum_xy - sum_x * sum_y) / (nf * sum_x2 - sum_x * sum_x)
        };
        let intercept = if flat {
            series[0].price
        } else {
            (sum_y - slope * sum_x) / nf
        };
        let confidence = if flat {
            100.0
        } else {
            let mean_y = sum_y / nf;
            let sst: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
            let ssr: f64 = points
                .iter()
                .map(|(x, y)| (slope * x + intercept - y).powi(2))
                .sum();
            ((1.0 - ssr / sst) * 100.0).clamp(0.0, 100.0)
        };

        let k = self.horizon as f64;
        let predicted_price = slope * ((n - 1) as f64 + k) + intercept;
        let trend = TrendLabel::from_slope(slope);

        debug!(
            "trend: n={} slope={:.4} intercept={:.4} r2={:.1} -> {}",
            n, slope, intercept, confidence, trend
        );

        Ok(Forecast {
            predicted_price,
            confidence,
            trend,
            expected_change: slope * k,
            slope,
            intercept,
            horizon: self.horizon,
        })
    }
}
