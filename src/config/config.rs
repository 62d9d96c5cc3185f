use crate::core::types::ListingQuality;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppCfg {
    #[serde(default)]
    pub ingest: IngestCfg,
    #[serde(default)]
    pub catalog: CatalogCfg,
    #[serde(default)]
    pub pipeline: PipelineCfg,
    #[serde(default)]
    pub decision: DecisionCfg,
    #[serde(default)]
    pub forecast: ForecastCfg,
    #[serde(default)]
    pub database: DatabaseCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestCfg {
    /// JSONL batch of listing records handed over by the ingestion collaborator.
    #[serde(rename = "batchPath")]
    pub batch_path: String,
    #[serde(rename = "seenCacheCapacity", default = "default_seen_capacity")]
    pub seen_cache_capacity: usize,
    #[serde(rename = "seenTtlHours", default = "default_seen_ttl_hours")]
    pub seen_ttl_hours: i64,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            batch_path: "data/listings.jsonl".to_string(),
            seen_cache_capacity: default_seen_capacity(),
            seen_ttl_hours: default_seen_ttl_hours(),
        }
    }
}

fn default_seen_capacity() -> usize {
    10_000
}
fn default_seen_ttl_hours() -> i64 {
    48
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogCfg {
    pub path: String,
    #[serde(with = "humantime_serde", default = "default_catalog_refresh")]
    pub refresh: Duration,
}

impl Default for CatalogCfg {
    fn default() -> Self {
        Self {
            path: "data/catalog.json".to_string(),
            refresh: default_catalog_refresh(),
        }
    }
}

fn default_catalog_refresh() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Full catalog-backed ruleset resolver.
    Ruleset,
    /// Declines every listing; filtering keeps working without reference data.
    Passthrough,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineCfg {
    /// Listings below this quality are rejected before resolution.
    #[serde(rename = "minQuality", default = "default_min_quality")]
    pub min_quality: ListingQuality,
    #[serde(default = "default_resolver")]
    pub resolver: ResolverKind,
    /// Composite match confidence (0-100) required to accept a resolution.
    #[serde(rename = "minResolutionConfidence", default = "default_min_resolution")]
    pub min_resolution_confidence: f64,
    /// Prices below this are treated as likely mislabeled accessories/codes.
    #[serde(rename = "lowPriceFloor", default = "default_low_price_floor")]
    pub low_price_floor: f64,
    /// Prices above this are treated as likely mispriced or fraudulent.
    #[serde(rename = "highPriceCeiling", default = "default_high_price_ceiling")]
    pub high_price_ceiling: f64,
    /// Price bucket floors for market tier assignment.
    #[serde(rename = "premiumPriceFloor", default = "default_premium_floor")]
    pub premium_price_floor: f64,
    #[serde(rename = "midPriceFloor", default = "default_mid_floor")]
    pub mid_price_floor: f64,
    /// Fan-out width for batch classification.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            min_quality: default_min_quality(),
            resolver: default_resolver(),
            min_resolution_confidence: default_min_resolution(),
            low_price_floor: default_low_price_floor(),
            high_price_ceiling: default_high_price_ceiling(),
            premium_price_floor: default_premium_floor(),
            mid_price_floor: default_mid_floor(),
            workers: default_workers(),
        }
    }
}

fn default_min_quality() -> ListingQuality {
    ListingQuality::Acceptable
}
fn default_resolver() -> ResolverKind {
    ResolverKind::Ruleset
}
fn default_min_resolution() -> f64 {
    85.0
}
fn default_low_price_floor() -> f64 {
    1.0
}
fn default_high_price_ceiling() -> f64 {
    10_000.0
}
fn default_premium_floor() -> f64 {
    100.0
}
fn default_mid_floor() -> f64 {
    20.0
}
fn default_workers() -> usize {
    4
}

/// Decision threshold table. Configuration data, not control flow: the
/// evaluator reads these values, so tuning never touches the logic.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DecisionCfg {
    #[serde(default)]
    pub buy: BuyCfg,
    #[serde(default)]
    pub watch: WatchCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BuyCfg {
    #[serde(rename = "minReturnPct", default = "default_buy_return")]
    pub min_return_pct: f64,
    #[serde(rename = "minConfidencePct", default = "default_buy_confidence")]
    pub min_confidence_pct: f64,
    #[serde(rename = "minScarcity", default = "default_buy_scarcity")]
    pub min_scarcity: f64,
    #[serde(rename = "maxGemRatePct", default = "default_buy_gem_rate")]
    pub max_gem_rate_pct: f64,
    #[serde(rename = "minLiquidity", default = "default_buy_liquidity")]
    pub min_liquidity: f64,
    #[serde(rename = "minMomentum", default = "default_buy_momentum")]
    pub min_momentum: f64,
    #[serde(rename = "minStability", default = "default_buy_stability")]
    pub min_stability: f64,
}

impl Default for BuyCfg {
    fn default() -> Self {
        Self {
            min_return_pct: default_buy_return(),
            min_confidence_pct: default_buy_confidence(),
            min_scarcity: default_buy_scarcity(),
            max_gem_rate_pct: default_buy_gem_rate(),
            min_liquidity: default_buy_liquidity(),
            min_momentum: default_buy_momentum(),
            min_stability: default_buy_stability(),
        }
    }
}

fn default_buy_return() -> f64 {
    20.0
}
fn default_buy_confidence() -> f64 {
    90.0
}
fn default_buy_scarcity() -> f64 {
    70.0
}
fn default_buy_gem_rate() -> f64 {
    15.0
}
fn default_buy_liquidity() -> f64 {
    7.0
}
fn default_buy_momentum() -> f64 {
    6.0
}
fn default_buy_stability() -> f64 {
    6.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchCfg {
    #[serde(rename = "minReturnPct", default = "default_watch_return")]
    pub min_return_pct: f64,
    #[serde(rename = "minConfidencePct", default = "default_watch_confidence")]
    pub min_confidence_pct: f64,
    /// Predicted returns at or below this are not worth watching.
    #[serde(rename = "maxDrawdownPct", default = "default_watch_drawdown")]
    pub max_drawdown_pct: f64,
}

impl Default for WatchCfg {
    fn default() -> Self {
        Self {
            min_return_pct: default_watch_return(),
            min_confidence_pct: default_watch_confidence(),
            max_drawdown_pct: default_watch_drawdown(),
        }
    }
}

fn default_watch_return() -> f64 {
    5.0
}
fn default_watch_confidence() -> f64 {
    70.0
}
fn default_watch_drawdown() -> f64 {
    -15.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastCfg {
    /// JSON map of canonical_sku -> forecast + signals.
    pub path: String,
}

impl Default for ForecastCfg {
    fn default() -> Self {
        Self {
            path: "data/forecasts.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_db_url(),
        }
    }
}

fn default_db_url() -> String {
    "postgres://localhost/cardmind".to_string()
}

impl AppCfg {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .context("building config")?;

        let app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.ingest.batch_path.is_empty(), "ingest.batchPath missing");
        anyhow::ensure!(
            self.pipeline.resolver == ResolverKind::Passthrough || !self.catalog.path.is_empty(),
            "catalog.path required for the ruleset resolver"
        );
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.pipeline.min_resolution_confidence),
            "pipeline.minResolutionConfidence must be within 0-100"
        );
        anyhow::ensure!(
            self.pipeline.low_price_floor < self.pipeline.high_price_ceiling,
            "pipeline.lowPriceFloor must be below highPriceCeiling"
        );
        anyhow::ensure!(
            self.pipeline.mid_price_floor < self.pipeline.premium_price_floor,
            "pipeline.midPriceFloor must be below premiumPriceFloor"
        );
        anyhow::ensure!(self.pipeline.workers > 0, "pipeline.workers must be > 0");
        anyhow::ensure!(
            self.decision.watch.min_return_pct > self.decision.watch.max_drawdown_pct,
            "decision.watch thresholds are inverted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_defaults_match_spec() {
        let cfg = AppCfg::default();
        assert_eq!(cfg.pipeline.min_quality, ListingQuality::Acceptable);
        assert_eq!(cfg.pipeline.min_resolution_confidence, 85.0);
        assert_eq!(cfg.decision.buy.min_return_pct, 20.0);
        assert_eq!(cfg.decision.buy.min_confidence_pct, 90.0);
        assert_eq!(cfg.decision.buy.max_gem_rate_pct, 15.0);
        assert_eq!(cfg.decision.watch.min_return_pct, 5.0);
        assert_eq!(cfg.decision.watch.max_drawdown_pct, -15.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_var_override() {
        // Set environment variable
        unsafe {
            env::set_var("PIPELINE__WORKERS", "8");
        }

        // Test that config::Environment picks it up
        let cfg = Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()
            .unwrap();

        let val = cfg.get_string("pipeline.workers").unwrap();
        assert_eq!(val, "8");

        unsafe {
            env::remove_var("PIPELINE__WORKERS");
        }
    }

    #[test]
    fn test_validate_rejects_inverted_price_bounds() {
        let mut cfg = AppCfg::default();
        cfg.pipeline.low_price_floor = 50_000.0;
        assert!(cfg.validate().is_err());
    }
}
