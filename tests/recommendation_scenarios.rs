//! End-to-end scenarios: raw history in, recommendation out.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use price_oracle::config::AnalysisConfig;
use price_oracle::recommendation::{BUY_IMMEDIATELY, CHEAP, DATE, PRODUCT, WAIT};
use price_oracle::{
    Action, Condition, Fact, Operator, PriceObservation, RecommendationSynthesizer, Resolution,
    Rule,
};

/// Twenty daily readings falling from 200 to 105.
fn falling_history() -> Vec<PriceObservation> {
    let start = Utc.with_ymd_and_hms(2024, 10, 20, 9, 0, 0).unwrap();
    (0..20)
        .map(|i| PriceObservation {
            product: "robot vacuum".into(),
            store: "megastore".into(),
            price: 200.0 - 5.0 * i as f64,
            recorded_at: start + Duration::days(i),
        })
        .collect()
}

fn black_friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 29).unwrap()
}

fn ordinary_friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 25).unwrap()
}

/// Trend-only waiting plus a sale rule chain.
fn sale_synthesizer() -> RecommendationSynthesizer {
    let mut synthesizer = RecommendationSynthesizer::without_rules(&AnalysisConfig::default());
    synthesizer.add_rule(Rule::new(
        "falling_means_wait",
        vec![Condition::new("trend", PRODUCT, Operator::Eq, "FALLING")],
        Fact::new("recommendation", PRODUCT, WAIT),
        1,
    ));
    synthesizer.add_rule(Rule::new(
        "cheap",
        vec![Condition::new("percent_of_average", PRODUCT, Operator::Lt, 80.0)],
        Fact::new("price_class", PRODUCT, CHEAP),
        3,
    ));
    synthesizer.add_rule(Rule::new(
        "sale_friday",
        vec![
            Condition::new("weekday", DATE, Operator::Eq, "FRIDAY"),
            Condition::new("month", DATE, Operator::Eq, "NOVEMBER"),
        ],
        Fact::new("special_event", DATE, "SALE"),
        2,
    ));
    synthesizer.add_rule(Rule::new(
        "buy_in_sale",
        vec![
            Condition::new("special_event", DATE, Operator::Eq, "SALE"),
            Condition::new("price_class", PRODUCT, Operator::Eq, CHEAP),
        ],
        Fact::new("recommendation", PRODUCT, BUY_IMMEDIATELY),
        6,
    ));
    synthesizer
}

#[test]
fn sale_friday_overrides_a_falling_trend() {
    let synthesizer = sale_synthesizer();
    let history = falling_history();

    let outside_sale = synthesizer.analyze(&history, ordinary_friday()).unwrap();
    assert_eq!(outside_sale.action, Action::Wait);

    let in_sale = synthesizer.analyze(&history, black_friday()).unwrap();
    assert_eq!(in_sale.resolution, Some(Resolution::BuyImmediately));
    assert_eq!(in_sale.action, Action::BuyImmediately);
    assert!(in_sale
        .derived_facts
        .contains(&Fact::new("recommendation", PRODUCT, WAIT)));
    assert!(in_sale
        .derived_facts
        .contains(&Fact::new("special_event", DATE, "SALE")));
}

#[test]
fn default_rules_buy_immediately_on_black_friday() {
    let synthesizer = RecommendationSynthesizer::new(&AnalysisConfig::default());
    let history = falling_history();

    let rec = synthesizer.analyze(&history, black_friday()).unwrap();
    assert_eq!(rec.action, Action::BuyImmediately);
    assert_eq!(rec.message, "Buy immediately! A sale event meets a cheap price");
    assert!(rec
        .all_facts
        .contains(&Fact::new("special_event", DATE, "BLACK_FRIDAY")));

    let factors = &rec.explanation_factors;
    assert_eq!(factors[0], "Trend: FALLING");
    assert_eq!(factors[1], "Volatility: HIGH");
    assert_eq!(factors[2], "Alert: EXCELLENT");
    assert!(factors[3].starts_with("Best day to buy: "));

    let alert = rec.alert.unwrap();
    assert_eq!(alert.current_price, 105.0);
    assert_eq!(alert.potential_savings, 47.5);
}

#[test]
fn derived_trace_is_stable_across_runs() {
    let synthesizer = RecommendationSynthesizer::new(&AnalysisConfig::default());
    let first = synthesizer.analyze(&falling_history(), black_friday()).unwrap();
    let second = synthesizer.analyze(&falling_history(), black_friday()).unwrap();
    assert_eq!(first.derived_facts, second.derived_facts);
    assert_eq!(first.all_facts, second.all_facts);
}

#[test]
fn recommendation_serializes_to_json() {
    let synthesizer = RecommendationSynthesizer::new(&AnalysisConfig::default());
    let rec = synthesizer.analyze(&falling_history(), black_friday()).unwrap();
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["action"], "BUY_IMMEDIATELY");
    assert_eq!(json["alert"]["classification"], "EXCELLENT");
    assert!(json["derived_facts"].as_array().unwrap().len() >= 3);
}
