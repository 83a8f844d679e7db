use chrono::{Duration, Utc};
use futures::future::join_all;
use price_oracle::analyzer::AlertClass;
use price_oracle::config::{load_config, AppConfig, ProductConfig};
use price_oracle::model::PriceObservation;
use price_oracle::normalizer::load_observations;
use price_oracle::recommendation::{Recommendation, RecommendationSynthesizer};
use price_oracle::storage::SqliteStorage;
use price_oracle::AnalysisError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration as TokioDuration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".into());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    if let Some(path) = &config.import_path {
        import_history(path, &config.products, storage.clone()).await;
    }

    let synthesizer = Arc::new(RecommendationSynthesizer::new(&config.analysis));

    loop {
        info!("Products to analyze: {}", config.products.len());

        let tasks: Vec<_> = config
            .products
            .iter()
            .map(|product| process_product(product, storage.clone(), synthesizer.clone()))
            .collect();
        join_all(tasks).await;

        let Some(interval) = config.check_interval_seconds else {
            break;
        };
        info!("Waiting {}s for the next run...", interval);
        sleep(TokioDuration::from_secs(interval)).await;
    }
}

async fn import_history(path: &str, products: &[ProductConfig], storage: Arc<Mutex<SqliteStorage>>) {
    info!("Importing price history from {}", path);
    let observations = match load_observations(path, products) {
        Ok(o) => o,
        Err(e) => {
            warn!("Import failed: {}", e);
            return;
        }
    };

    let storage = storage.lock().await;
    let mut saved = 0;
    for obs in &observations {
        match storage.record_price(obs) {
            Ok(()) => saved += 1,
            Err(e) => warn!("DB save error: {}", e),
        }
    }
    info!("Imported {} of {} observations", saved, observations.len());
}

/// Loads one product's history, analyzes it on a blocking worker and stores
/// the outcome.
async fn process_product(
    product: &ProductConfig,
    storage: Arc<Mutex<SqliteStorage>>,
    synthesizer: Arc<RecommendationSynthesizer>,
) {
    info!("Processing product: {}", product.name);

    let since = product
        .history_window_days
        .map(|days| Utc::now() - Duration::days(days));
    let history: Vec<PriceObservation> = match storage.lock().await.price_history(
        &product.name,
        product.store.as_deref(),
        since,
    ) {
        Ok(h) => h,
        Err(e) => {
            warn!("History load error for {}: {}", product.name, e);
            return;
        }
    };
    info!("Loaded {} observations", history.len());

    let today = Utc::now().date_naive();
    let analysis = tokio::task::spawn_blocking(move || synthesizer.analyze(&history, today)).await;

    let recommendation: Recommendation = match analysis {
        Ok(Ok(rec)) => rec,
        Ok(Err(AnalysisError::InsufficientData { actual, .. })) => {
            info!("Not enough history for {} ({} observations)", product.name, actual);
            return;
        }
        Err(e) => {
            error!("Analysis task for {} failed: {}", product.name, e);
            return;
        }
    };

    info!(
        "{}: {:?} ({:.0}% confidence) - {}",
        product.name, recommendation.action, recommendation.confidence, recommendation.message
    );
    for factor in &recommendation.explanation_factors {
        info!("  {}", factor);
    }

    let storage = storage.lock().await;
    if let Some(alert) = &recommendation.alert {
        if matches!(alert.classification, AlertClass::Excellent | AlertClass::Good) {
            info!(
                "Price alert {}: {:.2} (saves {:.2})",
                alert.classification, alert.current_price, alert.potential_savings
            );
            if let Err(e) = storage.save_alert(&product.name, alert) {
                warn!("Alert save failed: {}", e);
            }
        }
    }
    if let Err(e) = storage.record_event("recommendation", &product.name, &recommendation) {
        warn!("Event save failed: {}", e);
    }

    info!("Finished processing product: {}", product.name);
}
