//! Forecast boundary. Model training and inference live outside this
//! repository; the pipeline only consumes per-SKU predictions and signals.

use crate::core::types::{CardSignals, Forecast};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Forecast and signals for one canonical SKU, or None when the
    /// forecasting collaborator has nothing for it.
    async fn forecast(&self, canonical_sku: &str) -> Option<(Forecast, CardSignals)>;
}

/// Flat record as exported by the forecasting collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRecord {
    pub predicted_return_pct: f64,
    pub model_confidence: f64,
    #[serde(default)]
    pub scarcity_score: f64,
    #[serde(default)]
    pub gem_rate: f64,
    #[serde(default)]
    pub liquidity_score: f64,
    #[serde(default)]
    pub momentum_score: f64,
    #[serde(default)]
    pub stability_score: f64,
}

impl ForecastRecord {
    fn split(&self) -> (Forecast, CardSignals) {
        (
            Forecast {
                predicted_return_pct: self.predicted_return_pct,
                model_confidence: self.model_confidence,
            },
            CardSignals {
                scarcity_score: self.scarcity_score,
                gem_rate: self.gem_rate,
                liquidity_score: self.liquidity_score,
                momentum_score: self.momentum_score,
                stability_score: self.stability_score,
            },
        )
    }
}

/// File-backed provider: a JSON object keyed by canonical_sku. Suits batch
/// scans where the forecasting side drops a snapshot next to the listings.
pub struct FileForecastProvider {
    records: HashMap<String, ForecastRecord>,
}

impl FileForecastProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading forecasts {}", path.display()))?;
        let records: HashMap<String, ForecastRecord> =
            serde_json::from_str(&data).context("parsing forecasts json")?;
        info!(records = records.len(), path = %path.display(), "forecasts loaded");
        Ok(Self { records })
    }

    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

#[async_trait]
impl ForecastProvider for FileForecastProvider {
    async fn forecast(&self, canonical_sku: &str) -> Option<(Forecast, CardSignals)> {
        self.records.get(canonical_sku).map(ForecastRecord::split)
    }
}
