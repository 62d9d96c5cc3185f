use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[async_trait::async_trait]
pub trait Actor: Send + Sync + 'static {
    async fn run(self) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SystemStatus {
    Active,
    Halted(String), // Reason
}

// ----------- Domain messages -----------------

/// A single marketplace listing as observed by the ingestion boundary.
/// Immutable once created; consumed exactly once per pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Asking price. None when the marketplace did not expose one.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Free-text condition field as supplied by the seller.
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

/// Discrete trust tier derived from the numeric quality score.
/// Variant order is the score order, so `Ord` compares trust levels directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingQuality {
    Junk,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl ListingQuality {
    pub const ALL: [ListingQuality; 5] = [
        ListingQuality::Junk,
        ListingQuality::Poor,
        ListingQuality::Acceptable,
        ListingQuality::Good,
        ListingQuality::Excellent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingQuality::Junk => "junk",
            ListingQuality::Poor => "poor",
            ListingQuality::Acceptable => "acceptable",
            ListingQuality::Good => "good",
            ListingQuality::Excellent => "excellent",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    SingleCard,
    SealedProduct,
    BulkLot,
    Accessory,
    DigitalCode,
    CustomProxy,
}

impl CardType {
    pub const ALL: [CardType; 6] = [
        CardType::SingleCard,
        CardType::SealedProduct,
        CardType::BulkLot,
        CardType::Accessory,
        CardType::DigitalCode,
        CardType::CustomProxy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::SingleCard => "single_card",
            CardType::SealedProduct => "sealed_product",
            CardType::BulkLot => "bulk_lot",
            CardType::Accessory => "accessory",
            CardType::DigitalCode => "digital_code",
            CardType::CustomProxy => "custom_proxy",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            CardType::SingleCard => 0,
            CardType::SealedProduct => 1,
            CardType::BulkLot => 2,
            CardType::Accessory => 3,
            CardType::DigitalCode => 4,
            CardType::CustomProxy => 5,
        }
    }
}

/// Junk categories checked before any other classification.
/// `ALL` is the declared priority order; the first matching category wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCategory {
    DigitalCode,
    Accessory,
    BulkLot,
    CustomProxy,
}

impl ExclusionCategory {
    pub const ALL: [ExclusionCategory; 4] = [
        ExclusionCategory::DigitalCode,
        ExclusionCategory::Accessory,
        ExclusionCategory::BulkLot,
        ExclusionCategory::CustomProxy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionCategory::DigitalCode => "digital_code",
            ExclusionCategory::Accessory => "accessory",
            ExclusionCategory::BulkLot => "bulk_lot",
            ExclusionCategory::CustomProxy => "custom_proxy",
        }
    }

    pub fn card_type(&self) -> CardType {
        match self {
            ExclusionCategory::DigitalCode => CardType::DigitalCode,
            ExclusionCategory::Accessory => CardType::Accessory,
            ExclusionCategory::BulkLot => CardType::BulkLot,
            ExclusionCategory::CustomProxy => CardType::CustomProxy,
        }
    }
}

/// Canonical card condition vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCondition {
    Mint,
    NearMint,
    LightPlay,
    ModeratePlay,
    HeavyPlay,
    Damaged,
}

impl CardCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardCondition::Mint => "mint",
            CardCondition::NearMint => "near_mint",
            CardCondition::LightPlay => "light_play",
            CardCondition::ModeratePlay => "moderate_play",
            CardCondition::HeavyPlay => "heavy_play",
            CardCondition::Damaged => "damaged",
        }
    }
}

/// Outcome of classifying one listing. Pure function of the listing:
/// no hidden state, no time dependence beyond the supplied price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterResult {
    pub is_valid: bool,
    pub quality: ListingQuality,
    pub card_type: CardType,
    /// Confidence in the classification, clamped to [0, 1]. For excluded
    /// listings this is confidence that the listing is junk.
    pub confidence: f64,
    /// Raw quality score before the cutoff mapping, kept for audit records.
    pub quality_score: f64,
    pub detected_set: Option<String>,
    pub detected_set_code: Option<String>,
    pub detected_card_number: Option<String>,
    pub detected_grade: Option<String>,
    pub detected_condition: Option<CardCondition>,
    pub exclusion_reason: Option<ExclusionCategory>,
}

/// One row of the read-only reference catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical_sku: String,
    pub name: String,
    pub set_code: String,
    pub card_number: String,
    pub rarity: String,
}

/// Coarse price bucket derived from the observed price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTier {
    Premium,
    Mid,
    Budget,
}

impl MarketTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTier::Premium => "premium",
            MarketTier::Mid => "mid",
            MarketTier::Budget => "budget",
        }
    }
}

/// A listing resolved to exactly one catalog identity. One entity per
/// accepted listing; multiple entities may share a canonical_sku and are
/// retained as independent price observations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalCardEntity {
    /// References an existing CatalogEntry.
    pub canonical_sku: String,
    pub name_normalized: String,
    pub set_code: String,
    pub card_number: String,
    pub market_tier: MarketTier,
    pub filter_quality: ListingQuality,
    /// Composite match confidence on a 0-100 scale.
    pub resolution_confidence: f64,
    /// Original listing title, retained verbatim for audit.
    pub source_title: String,
    pub observed_price: Option<Decimal>,
}

/// Audit trail entry for a listing the pipeline rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub title: String,
    pub card_type: CardType,
    pub exclusion_reason: Option<ExclusionCategory>,
    pub quality_score: f64,
}

/// Per-SKU forecast supplied by the forecasting collaborator.
/// Both fields are percentages (25.0 means +25%, 95.0 means 95% confident).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Forecast {
    pub predicted_return_pct: f64,
    pub model_confidence: f64,
}

/// Externally supplied population and market signals for a canonical card.
/// Consumed, never computed, by the decision function.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CardSignals {
    /// 0-100, from grading population data.
    pub scarcity_score: f64,
    /// Percentage of top-grade copies in the graded population.
    pub gem_rate: f64,
    /// 0-10.
    pub liquidity_score: f64,
    /// 0-10.
    pub momentum_score: f64,
    /// 0-10.
    pub stability_score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Watch,
    Avoid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Watch => "WATCH",
            Action::Avoid => "AVOID",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Investment recommendation for one (entity, forecast) pair. Recomputed on
/// demand at scan time, never treated as an identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub canonical_sku: String,
    pub action: Action,
    pub predicted_return_pct: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub rationale: String,
    pub price_target_low: Option<Decimal>,
    pub price_target_high: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_ordering() {
        assert!(ListingQuality::Excellent > ListingQuality::Good);
        assert!(ListingQuality::Good > ListingQuality::Acceptable);
        assert!(ListingQuality::Acceptable > ListingQuality::Poor);
        assert!(ListingQuality::Poor > ListingQuality::Junk);
    }

    #[test]
    fn test_exclusion_maps_to_card_type() {
        assert_eq!(
            ExclusionCategory::DigitalCode.card_type(),
            CardType::DigitalCode
        );
        assert_eq!(ExclusionCategory::BulkLot.card_type(), CardType::BulkLot);
    }

    #[test]
    fn test_raw_listing_deserializes_with_defaults() {
        let listing: RawListing =
            serde_json::from_str(r#"{"title": "Charizard VMAX 074/172"}"#).unwrap();
        assert_eq!(listing.title, "Charizard VMAX 074/172");
        assert!(listing.description.is_empty());
        assert!(listing.price.is_none());
        assert!(listing.condition.is_none());
    }
}
