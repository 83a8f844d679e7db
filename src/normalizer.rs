use crate::config::ProductConfig;
use crate::model::{ImportError, PriceObservation};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use tracing::warn;

/// A price reading as delivered by the lookup provider: free-text title,
/// not yet tied to a tracked product.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub title: String,
    pub store: String,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

pub fn load_rows(path: &str) -> Result<Vec<ImportRow>, ImportError> {
    let content = fs::read_to_string(path)?;
    let rows: Vec<ImportRow> = serde_json::from_str(&content)?;
    Ok(rows)
}

/// Reads an import file and keeps the rows that match a tracked product.
pub fn load_observations(
    path: &str,
    products: &[ProductConfig],
) -> Result<Vec<PriceObservation>, ImportError> {
    Ok(normalize_all(load_rows(path)?, products))
}

pub fn normalize_all(rows: Vec<ImportRow>, products: &[ProductConfig]) -> Vec<PriceObservation> {
    rows.into_iter()
        .filter_map(|row| {
            if !row.price.is_finite() || row.price < 0.0 {
                warn!("Skipping '{}': invalid price {}", row.title, row.price);
                return None;
            }
            match normalize_title(&row.title, products) {
                Some(product) => Some(PriceObservation {
                    product,
                    store: row.store,
                    price: row.price,
                    recorded_at: row.recorded_at,
                }),
                None => {
                    warn!("Skipping '{}': no tracked product matches", row.title);
                    None
                }
            }
        })
        .collect()
}

/// Name of the first configured product with a keyword found in `title`.
pub fn normalize_title(title: &str, products: &[ProductConfig]) -> Option<String> {
    let title = title.to_lowercase();

    for product in products {
        if title.contains(&product.name.to_lowercase()) {
            return Some(product.name.clone());
        }
        for keyword in &product.match_keywords {
            if title.contains(&keyword.to_lowercase()) {
                return Some(product.name.clone());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn products() -> Vec<ProductConfig> {
        vec![ProductConfig {
            name: "Switch OLED".into(),
            store: None,
            match_keywords: vec!["nintendo switch".into()],
            history_window_days: None,
        }]
    }

    fn row(title: &str, price: f64) -> ImportRow {
        ImportRow {
            title: title.into(),
            store: "store-a".into(),
            price,
            recorded_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn titles_match_by_name_or_keyword() {
        assert_eq!(normalize_title("NEW switch oled white", &products()).as_deref(), Some("Switch OLED"));
        assert_eq!(normalize_title("Nintendo Switch Lite", &products()).as_deref(), Some("Switch OLED"));
        assert_eq!(normalize_title("PlayStation 5", &products()), None);
    }

    #[test]
    fn unknown_and_invalid_rows_are_dropped() {
        let observations = normalize_all(
            vec![
                row("Nintendo Switch OLED", 299.0),
                row("Xbox Series S", 249.0),
                row("Nintendo Switch", -1.0),
            ],
            &products(),
        );
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].product, "Switch OLED");
        assert_eq!(observations[0].price, 299.0);
    }

    #[test]
    fn rows_deserialize_from_json() {
        let rows: Vec<ImportRow> = serde_json::from_str(
            r#"[{"title":"Switch OLED","store":"a","price":10.5,"recorded_at":"2024-06-01T10:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].price, 10.5);
    }
}
