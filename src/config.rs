use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    /// Restricts the history to one store; `None` uses every store.
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub match_keywords: Vec<String>,
    #[serde(default)]
    pub history_window_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleEventConfig {
    pub name: String,
    pub weekday: String,
    pub month: String,
}

impl Default for SaleEventConfig {
    fn default() -> Self {
        Self {
            name: "BLACK_FRIDAY".into(),
            weekday: "FRIDAY".into(),
            month: "NOVEMBER".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub forecast_horizon: u32,
    /// Current price below this share of the average counts as cheap.
    pub cheap_percent_of_average: f64,
    pub sale_event: SaleEventConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 7,
            cheap_percent_of_average: 80.0,
            sale_event: SaleEventConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    #[serde(default)]
    pub import_path: Option<String>,
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_section_is_optional() {
        let cfg = parse_config(
            r#"{
                "database_path": "data.db",
                "products": [{ "name": "espresso machine", "match_keywords": ["espresso"] }]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.forecast_horizon, 7);
        assert_eq!(cfg.analysis.cheap_percent_of_average, 80.0);
        assert_eq!(cfg.analysis.sale_event.month, "NOVEMBER");
        assert!(cfg.check_interval_seconds.is_none());
        assert!(cfg.products[0].store.is_none());
    }

    #[test]
    fn partial_analysis_section_keeps_other_defaults() {
        let cfg = parse_config(
            r#"{
                "database_path": ":memory:",
                "products": [],
                "analysis": { "cheap_percent_of_average": 70.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.cheap_percent_of_average, 70.0);
        assert_eq!(cfg.analysis.sale_event.weekday, "FRIDAY");
    }

    #[test]
    fn missing_products_is_an_error() {
        assert!(parse_config(r#"{ "database_path": "x.db" }"#).is_err());
    }
}
