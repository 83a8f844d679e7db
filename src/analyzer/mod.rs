// Analyzer module: one submodule per analysis stage over a price history.

pub mod history;
pub mod trend;
pub mod volatility;
pub mod seasonal;
pub mod alert;

pub use alert::{AlertClass, PriceAlert, PriceAlertClassifier};
pub use seasonal::{SeasonalPattern, SeasonalPatternDetector};
pub use trend::{Forecast, TrendForecaster, TrendLabel};
pub use volatility::{Volatility, VolatilityAnalyzer, VolatilityLabel};
