use crate::analyzer::history::{current_price, daily_series, price_stats};
use crate::analyzer::{
    AlertClass, Forecast, PriceAlert, PriceAlertClassifier, SeasonalPattern,
    SeasonalPatternDetector, TrendForecaster, TrendLabel, Volatility, VolatilityAnalyzer,
    VolatilityLabel,
};
use crate::config::AnalysisConfig;
use crate::model::{AnalysisError, PriceObservation, PriceStats};
use crate::rules::{Condition, Fact, FactValue, Operator, Rule, RuleEngine};
use crate::utils::{month_label, weekday_label};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// Subject of every fact about the analysed product.
pub const PRODUCT: &str = "product";
/// Subject of calendar facts.
pub const DATE: &str = "date";

pub const BUY_IMMEDIATELY: &str = "BUY_IMMEDIATELY";
pub const WAIT: &str = "WAIT";
pub const EXCELLENT: &str = "EXCELLENT";
pub const CHEAP: &str = "CHEAP";

/// Number of analysis stages that feed a recommendation.
const STAGES: usize = 4;
/// Confidence used when no forecast could be made.
const BASE_CONFIDENCE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    BuyImmediately,
    BuyNow,
    BuySoon,
    Wait,
    Monitor,
}

impl Action {
    pub fn message(&self) -> &'static str {
        match self {
            Action::BuyImmediately => "Buy immediately! A sale event meets a cheap price",
            Action::BuyNow => "Buy now! The price is at its best moment",
            Action::BuySoon => "Consider buying soon, prices might rise",
            Action::Wait => "Wait a little, prices might drop",
            Action::Monitor => "Keep an eye on the price",
        }
    }
}

/// Outcome read from the derived facts after inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    BuyImmediately,
    ExcellentOpportunity,
    Wait,
    Monitor,
}

impl Resolution {
    /// Fixed precedence, independent of rule priorities:
    /// buy immediately, then excellent opportunity, then wait, else monitor.
    pub fn resolve(derived: &[Fact]) -> Self {
        let has = |predicate: &str, value: &str| {
            let value = FactValue::from(value);
            derived
                .iter()
                .any(|f| f.is_about(predicate, PRODUCT) && f.value == value)
        };

        if has("recommendation", BUY_IMMEDIATELY) {
            Resolution::BuyImmediately
        } else if has("opportunity", EXCELLENT) {
            Resolution::ExcellentOpportunity
        } else if has("recommendation", WAIT) {
            Resolution::Wait
        } else {
            Resolution::Monitor
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Resolution::BuyImmediately => Action::BuyImmediately,
            Resolution::ExcellentOpportunity => Action::BuyNow,
            Resolution::Wait => Action::Wait,
            Resolution::Monitor => Action::Monitor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub action: Action,
    /// Set when the recommendation came out of the rule engine.
    pub resolution: Option<Resolution>,
    pub confidence: f64,
    pub message: String,
    pub derived_facts: Vec<Fact>,
    pub all_facts: Vec<Fact>,
    pub explanation_factors: Vec<String>,
    pub alert: Option<PriceAlert>,
}

/// Output of every analysis stage for one history; a stage without enough
/// data is simply absent.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub forecast: Option<Forecast>,
    pub volatility: Option<Volatility>,
    pub seasonal: Option<SeasonalPattern>,
    pub alert: Option<PriceAlert>,
    pub stats: Option<PriceStats>,
    pub current_price: Option<f64>,
}

impl Findings {
    pub fn available(&self) -> usize {
        [
            self.forecast.is_some(),
            self.volatility.is_some(),
            self.seasonal.is_some(),
            self.alert.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    pub fn trend(&self) -> Option<TrendLabel> {
        self.forecast.as_ref().map(|f| f.trend)
    }

    pub fn volatility_label(&self) -> Option<VolatilityLabel> {
        self.volatility.as_ref().map(|v| v.label)
    }

    pub fn alert_class(&self) -> Option<AlertClass> {
        self.alert.as_ref().map(|a| a.classification)
    }

    /// Current price as a percentage of the historical average.
    pub fn percent_of_average(&self) -> Option<f64> {
        match (self.current_price, self.stats) {
            (Some(current), Some(stats)) if stats.avg > 0.0 => Some(current / stats.avg * 100.0),
            _ => None,
        }
    }

    /// Forecast confidence, scaled down for every stage that is missing.
    pub fn confidence(&self) -> f64 {
        let base = self.forecast.as_ref().map_or(BASE_CONFIDENCE, |f| f.confidence);
        let coverage = self.available() as f64 / STAGES as f64;
        (base * (0.5 + 0.5 * coverage)).clamp(0.0, 100.0)
    }

    pub fn explanation_factors(&self) -> Vec<String> {
        let or_missing = |label: Option<String>| label.unwrap_or_else(|| "insufficient data".into());
        vec![
            format!("Trend: {}", or_missing(self.trend().map(|t| t.to_string()))),
            format!("Volatility: {}", or_missing(self.volatility_label().map(|v| v.to_string()))),
            format!("Alert: {}", or_missing(self.alert_class().map(|a| a.to_string()))),
            self.seasonal
                .as_ref()
                .map(|s| s.recommendation.clone())
                .unwrap_or_else(|| "No seasonal pattern detected".into()),
        ]
    }

    /// Facts the rule engine is seeded with.
    pub fn facts(&self, today: NaiveDate) -> Vec<Fact> {
        let mut facts = Vec::new();
        if let Some(current) = self.current_price {
            facts.push(Fact::new("current_price", PRODUCT, current));
        }
        if let Some(stats) = self.stats {
            facts.push(Fact::new("average_price", PRODUCT, stats.avg));
        }
        if let Some(percent) = self.percent_of_average() {
            facts.push(Fact::new("percent_of_average", PRODUCT, percent));
        }
        if let Some(trend) = self.trend() {
            facts.push(Fact::new("trend", PRODUCT, trend.as_str()));
        }
        if let Some(volatility) = self.volatility_label() {
            facts.push(Fact::new("volatility", PRODUCT, volatility.as_str()));
        }
        if let Some(alert) = self.alert_class() {
            facts.push(Fact::new("alert", PRODUCT, alert.as_str()));
        }
        if let Some(seasonal) = &self.seasonal {
            facts.push(Fact::new("cheapest_weekday", PRODUCT, weekday_label(seasonal.cheapest_day)));
        }
        facts.push(Fact::new("weekday", DATE, weekday_label(today.weekday())));
        facts.push(Fact::new("month", DATE, month_label(today)));
        facts
    }
}

/// A stage without enough data drops out of the analysis instead of failing it.
fn skip<T>(stage: Result<T, AnalysisError>) -> Option<T> {
    match stage {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("skipping factor: {}", e);
            None
        }
    }
}

/// Business rules every synthesizer starts with.
pub fn default_rules(config: &AnalysisConfig) -> Vec<Rule> {
    let sale = &config.sale_event;
    let sale_name = sale.name.to_uppercase();
    vec![
        Rule::new(
            "cheap_price",
            vec![Condition::new(
                "percent_of_average",
                PRODUCT,
                Operator::Lt,
                config.cheap_percent_of_average,
            )],
            Fact::new("price_class", PRODUCT, CHEAP),
            3,
        ),
        Rule::new(
            "excellent_opportunity",
            vec![
                Condition::new("price_class", PRODUCT, Operator::Eq, CHEAP),
                Condition::new("trend", PRODUCT, Operator::Eq, TrendLabel::Falling.as_str()),
            ],
            Fact::new("opportunity", PRODUCT, EXCELLENT),
            5,
        ),
        Rule::new(
            "wait_on_volatility",
            vec![
                Condition::new("volatility", PRODUCT, Operator::Eq, VolatilityLabel::High.as_str()),
                Condition::new("trend", PRODUCT, Operator::Eq, TrendLabel::Falling.as_str()),
            ],
            Fact::new("recommendation", PRODUCT, WAIT),
            4,
        ),
        Rule::new(
            "sale_event",
            vec![
                Condition::new("weekday", DATE, Operator::Eq, sale.weekday.to_uppercase()),
                Condition::new("month", DATE, Operator::Eq, sale.month.to_uppercase()),
            ],
            Fact::new("special_event", DATE, sale_name.clone()),
            2,
        ),
        Rule::new(
            "buy_on_sale_event",
            vec![
                Condition::new("special_event", DATE, Operator::Eq, sale_name),
                Condition::new("price_class", PRODUCT, Operator::Eq, CHEAP),
            ],
            Fact::new("recommendation", PRODUCT, BUY_IMMEDIATELY),
            6,
        ),
    ]
}

/// Runs every analysis stage over a price history and turns the results
/// into a purchase recommendation.
///
/// The synthesizer owns the rule set only; each call to [`analyze`] builds
/// a fresh [`RuleEngine`], so one instance can serve many products and
/// threads.
///
/// [`analyze`]: RecommendationSynthesizer::analyze
pub struct RecommendationSynthesizer {
    forecaster: TrendForecaster,
    volatility: VolatilityAnalyzer,
    seasonal: SeasonalPatternDetector,
    classifier: PriceAlertClassifier,
    rules: Vec<Rule>,
}

impl RecommendationSynthesizer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut synthesizer = Self::without_rules(config);
        synthesizer.rules = default_rules(config);
        synthesizer
    }

    pub fn without_rules(config: &AnalysisConfig) -> Self {
        Self {
            forecaster: TrendForecaster::new(config.forecast_horizon),
            volatility: VolatilityAnalyzer::new(),
            seasonal: SeasonalPatternDetector::new(),
            classifier: PriceAlertClassifier::new(),
            rules: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Adds a rule whose conditions all concern the analysed product.
    pub fn add_product_rule(
        &mut self,
        id: &str,
        conditions: Vec<(&str, Operator, FactValue)>,
        conclusion: Fact,
        priority: i32,
    ) {
        let conditions = conditions
            .into_iter()
            .map(|(predicate, operator, value)| Condition::new(predicate, PRODUCT, operator, value))
            .collect();
        self.add_rule(Rule::new(id, conditions, conclusion, priority));
    }

    pub fn findings(&self, history: &[PriceObservation]) -> Findings {
        let series = daily_series(history);
        let stats = price_stats(history);
        let current = current_price(history);

        let alert = match (current, stats) {
            (Some(current), Some(stats)) => Some(self.classifier.alert(current, &stats)),
            _ => None,
        };

        Findings {
            forecast: skip(self.forecaster.forecast(&series)),
            volatility: skip(self.volatility.analyze(&series)),
            seasonal: skip(self.seasonal.detect(&series)),
            alert,
            stats,
            current_price: current,
        }
    }

    pub fn analyze(
        &self,
        history: &[PriceObservation],
        today: NaiveDate,
    ) -> Result<Recommendation, AnalysisError> {
        self.analyze_with_facts(history, today, Vec::new())
    }

    /// Like [`analyze`](Self::analyze), with extra caller facts seeded
    /// alongside the computed ones.
    ///
    /// The resolution reads derived facts only: a seeded
    /// `recommendation` fact is visible to rule conditions but never
    /// decides the action by itself.
    pub fn analyze_with_facts(
        &self,
        history: &[PriceObservation],
        today: NaiveDate,
        extra: Vec<Fact>,
    ) -> Result<Recommendation, AnalysisError> {
        let findings = self.findings(history);
        if findings.is_empty() {
            return Err(AnalysisError::insufficient("recommendation", 1, history.len()));
        }

        let mut engine = RuleEngine::with_rules(self.rules.clone());
        for fact in findings.facts(today).into_iter().chain(extra) {
            engine.assert_fact(fact);
        }
        debug!("seeded {} facts, {} rules", engine.facts().len(), self.rules.len());

        let derived = engine.infer();
        let resolution = Resolution::resolve(&derived);
        let action = resolution.action();
        debug!("resolved {:?} -> {:?}", resolution, action);

        Ok(Recommendation {
            action,
            resolution: Some(resolution),
            confidence: findings.confidence(),
            message: action.message().to_string(),
            derived_facts: derived,
            all_facts: engine.into_knowledge_base().facts().to_vec(),
            explanation_factors: findings.explanation_factors(),
            alert: findings.alert,
        })
    }

    /// Plain decision tree without the rule engine: an excellent price buys
    /// now, a good price on a rising trend buys soon, a falling trend that
    /// is not highly volatile waits, anything else is monitored.
    pub fn best_time_to_buy(
        &self,
        history: &[PriceObservation],
    ) -> Result<Recommendation, AnalysisError> {
        let findings = self.findings(history);
        if findings.is_empty() {
            return Err(AnalysisError::insufficient("recommendation", 1, history.len()));
        }

        let alert = findings.alert_class();
        let trend = findings.trend();
        let action = if alert == Some(AlertClass::Excellent) {
            Action::BuyNow
        } else if alert == Some(AlertClass::Good) && trend == Some(TrendLabel::Rising) {
            Action::BuySoon
        } else if trend == Some(TrendLabel::Falling)
            && findings.volatility_label().is_some_and(|v| v != VolatilityLabel::High)
        {
            Action::Wait
        } else {
            Action::Monitor
        };

        Ok(Recommendation {
            action,
            resolution: None,
            confidence: findings.confidence(),
            message: action.message().to_string(),
            derived_facts: Vec::new(),
            all_facts: Vec::new(),
            explanation_factors: findings.explanation_factors(),
            alert: findings.alert,
        })
    }
}
