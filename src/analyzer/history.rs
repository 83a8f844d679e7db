use crate::model::{PriceObservation, PricePoint, PriceStats};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Collapses raw observations into one averaged point per calendar day,
/// ordered by date ascending.
pub fn daily_series(observations: &[PriceObservation]) -> Vec<PricePoint> {
    let mut grouped: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for obs in observations {
        let entry = grouped.entry(obs.recorded_at.date_naive()).or_insert((0.0, 0));
        entry.0 += obs.price;
        entry.1 += 1;
    }

    grouped
        .into_iter()
        .map(|(date, (sum, count))| PricePoint {
            date,
            price: sum / count as f64,
        })
        .collect()
}

/// Min/max/avg over every raw observation.
pub fn price_stats(observations: &[PriceObservation]) -> Option<PriceStats> {
    if observations.is_empty() {
        return None;
    }
    let count = observations.len();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for obs in observations {
        min = min.min(obs.price);
        max = max.max(obs.price);
        sum += obs.price;
    }
    Some(PriceStats {
        min,
        max,
        avg: sum / count as f64,
        count,
    })
}

/// Price of the most recent observation.
pub fn current_price(observations: &[PriceObservation]) -> Option<f64> {
    observations
        .iter()
        .max_by_key(|o| o.recorded_at)
        .map(|o| o.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(day: u32, hour: u32, price: f64) -> PriceObservation {
        PriceObservation {
            product: "kettle".into(),
            store: "shop".into(),
            price,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn same_day_observations_are_averaged() {
        let series = daily_series(&[obs(3, 9, 30.0), obs(1, 8, 10.0), obs(1, 20, 20.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(series[0].price, 15.0);
        assert_eq!(series[1].price, 30.0);
    }

    #[test]
    fn stats_and_current_price() {
        let history = [obs(1, 8, 10.0), obs(4, 8, 40.0), obs(2, 8, 25.0)];
        let stats = price_stats(&history).unwrap();
        assert_eq!((stats.min, stats.max, stats.count), (10.0, 40.0, 3));
        assert_eq!(stats.avg, 25.0);
        assert_eq!(current_price(&history), Some(40.0));
        assert!(price_stats(&[]).is_none());
    }
}
