use crate::model::{AnalysisError, PricePoint};
use crate::utils::weekday_name;
use chrono::{Datelike, Weekday};
use serde::Serialize;
use tracing::debug;

/// Two full weeks.
pub const MIN_POINTS: usize = 14;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalPattern {
    pub cheapest_day: Weekday,
    pub most_expensive_day: Weekday,
    pub price_difference: f64,
    pub recommendation: String,
}

/// Finds the weekday on which a product is cheapest on average.
pub struct SeasonalPatternDetector;

impl SeasonalPatternDetector {
    pub fn new() -> Self {
        Self
    }

    /// Average price per weekday, Monday first; `None` for days never observed.
    pub fn weekday_averages(series: &[PricePoint]) -> [Option<f64>; 7] {
        let mut buckets = [(0.0_f64, 0_usize); 7];
        for point in series {
            let slot = &mut buckets[point.date.weekday().num_days_from_monday() as usize];
            slot.0 += point.price;
            slot.1 += 1;
        }
        buckets.map(|(sum, count)| (count > 0).then(|| sum / count as f64))
    }

    pub fn detect(&self, series: &[PricePoint]) -> Result<SeasonalPattern, AnalysisError> {
        if series.len() < MIN_POINTS {
            return Err(AnalysisError::insufficient("seasonal", MIN_POINTS, series.len()));
        }

        let averages = Self::weekday_averages(series);
        let mut cheapest: Option<(Weekday, f64)> = None;
        let mut priciest: Option<(Weekday, f64)> = None;

        // strict comparisons keep the earliest weekday on ties
        for (day, avg) in WEEK.iter().zip(averages) {
            let Some(avg) = avg else { continue };
            if cheapest.is_none_or(|(_, best)| avg < best) {
                cheapest = Some((*day, avg));
            }
            if priciest.is_none_or(|(_, worst)| avg > worst) {
                priciest = Some((*day, avg));
            }
        }

        let (Some((cheapest_day, low)), Some((most_expensive_day, high))) = (cheapest, priciest)
        else {
            return Err(AnalysisError::insufficient("seasonal", MIN_POINTS, series.len()));
        };

        debug!(
            "seasonal: cheapest={:?} ({:.2}) priciest={:?} ({:.2})",
            cheapest_day, low, most_expensive_day, high
        );

        Ok(SeasonalPattern {
            cheapest_day,
            most_expensive_day,
            price_difference: high - low,
            recommendation: format!("Best day to buy: {}", weekday_name(cheapest_day)),
        })
    }
}

impl Default for SeasonalPatternDetector {
    fn default() -> Self {
        Self::new()
    }
}
