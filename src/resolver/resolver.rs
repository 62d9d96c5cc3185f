//! Canonical identity assignment. The resolver either maps a surviving
//! listing onto exactly one catalog entry or declines: identity errors
//! poison every downstream time series for that SKU, so false negatives are
//! preferred over false positives throughout.

use crate::core::types::{CanonicalCardEntity, FilterResult, MarketTier, RawListing};
use crate::filter::attributes::strip_set_tokens;
use crate::filter::normalizers::{normalize_for_matching, normalize_name};
use crate::resolver::catalog::{CatalogHandle, normalize_number};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::Arc;
use tracing::debug;

/// Weighting of the composite confidence (0-100): name similarity dominates,
/// structured-field agreement boosts.
const NAME_WEIGHT: f64 = 70.0;
const SET_BOOST: f64 = 20.0;
const NUMBER_BOOST: f64 = 10.0;

const CANDIDATE_LIMIT: usize = 32;

/// Capability interface over entity resolution. Two implementations: the
/// catalog-backed ruleset and a pass-through that declines everything, so
/// filtering keeps operating when reference data is unavailable.
pub trait Resolver: Send + Sync {
    fn resolve(&self, listing: &RawListing, filter: &FilterResult) -> Option<CanonicalCardEntity>;
}

/// Declines every listing. Selected by configuration when no catalog exists.
pub struct PassthroughResolver;

impl Resolver for PassthroughResolver {
    fn resolve(&self, listing: &RawListing, _filter: &FilterResult) -> Option<CanonicalCardEntity> {
        debug!(title = %listing.title, "passthrough resolver declining listing");
        None
    }
}

pub struct RulesetResolver {
    catalog: Arc<CatalogHandle>,
    min_confidence: f64,
    premium_price_floor: Decimal,
    mid_price_floor: Decimal,
}

impl RulesetResolver {
    pub fn new(
        catalog: Arc<CatalogHandle>,
        min_confidence: f64,
        premium_price_floor: f64,
        mid_price_floor: f64,
    ) -> Self {
        Self {
            catalog,
            min_confidence,
            premium_price_floor: Decimal::from_f64(premium_price_floor)
                .unwrap_or_else(|| Decimal::from(100)),
            mid_price_floor: Decimal::from_f64(mid_price_floor)
                .unwrap_or_else(|| Decimal::from(20)),
        }
    }

    /// Isolates the card name from a title by dropping set aliases,
    /// grading/condition/rarity vocabulary, card numbers and quantities.
    fn candidate_name(title: &str) -> String {
        lazy_static! {
            static ref GRADE_RE: Regex =
                Regex::new(r"\b(?:psa|bgs|cgc|beckett)\s*\d{1,2}(?:\.5)?\b").unwrap();
            static ref NUMBER_RE: Regex =
                Regex::new(r"(?:#\s*\d{1,3}[a-z]?\b|\b\d{1,3}\s*/\s*\d{1,3}\b|\bno\.?\s*\d{1,3}\b)").unwrap();
            static ref QUANTITY_RE: Regex = Regex::new(r"\bx\s*\d+\b|\b\d+\s*x\b").unwrap();
            static ref VOCAB_RE: Regex = Regex::new(
                r"\b(?:gem\s*mint|near\s*mint|mint|nm|lightly\s*played|light\s*play|lp|moderately\s*played|mp|heavily\s*played|hp|damaged|dmg|secret\s*rare|ultra\s*rare|rainbow\s*rare|holo\s*rare|full\s*art|alt\s*art|holo|rare|promo|graded|slab|pokemon|tcg|card)\b"
            )
            .unwrap();
        }

        let text = normalize_for_matching(title, "");
        let text = strip_set_tokens(&text);
        let text = GRADE_RE.replace_all(&text, " ");
        let text = NUMBER_RE.replace_all(&text, " ");
        let text = QUANTITY_RE.replace_all(&text, " ");
        let text = VOCAB_RE.replace_all(&text, " ");

        normalize_name(&text)
    }

    /// Composite confidence on a 0-100 scale.
    fn composite_score(name_similarity: f64, set_matches: bool, number_matches: bool) -> f64 {
        let mut score = NAME_WEIGHT * name_similarity;
        if set_matches {
            score += SET_BOOST;
        }
        if number_matches {
            score += NUMBER_BOOST;
        }
        score
    }

    /// Inclusive at the threshold: a score of exactly `min` is accepted.
    fn meets_threshold(score: f64, min: f64) -> bool {
        score >= min
    }

    fn market_tier(&self, price: Option<Decimal>) -> MarketTier {
        match price {
            Some(p) if p >= self.premium_price_floor => MarketTier::Premium,
            Some(p) if p >= self.mid_price_floor => MarketTier::Mid,
            _ => MarketTier::Budget,
        }
    }
}

impl Resolver for RulesetResolver {
    fn resolve(&self, listing: &RawListing, filter: &FilterResult) -> Option<CanonicalCardEntity> {
        if !filter.is_valid {
            return None;
        }

        let catalog = self.catalog.snapshot();
        let name = Self::candidate_name(&listing.title);
        if name.is_empty() {
            debug!(title = %listing.title, "no card name left after stripping tokens");
            return None;
        }

        // Fast path: exact set + number narrows to a single catalog entry.
        let candidates = match (&filter.detected_set_code, &filter.detected_card_number) {
            (Some(set), Some(number)) => match catalog.by_set_and_number(set, number) {
                Some(entry) => vec![entry],
                None => catalog.candidates(&name, CANDIDATE_LIMIT),
            },
            _ => catalog.candidates(&name, CANDIDATE_LIMIT),
        };

        let mut best: Option<(f64, &crate::core::types::CatalogEntry)> = None;
        for entry in candidates {
            let similarity = strsim::jaro_winkler(&name, &normalize_name(&entry.name));
            let set_matches = filter
                .detected_set_code
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(&entry.set_code));
            let number_matches = filter
                .detected_card_number
                .as_deref()
                .is_some_and(|n| normalize_number(n) == normalize_number(&entry.card_number));

            let score = Self::composite_score(similarity, set_matches, number_matches);
            if best.is_none_or(|(b, _)| score > b) {
                best = Some((score, entry));
            }
        }

        let (score, entry) = best?;
        if !Self::meets_threshold(score, self.min_confidence) {
            debug!(
                title = %listing.title,
                score,
                threshold = self.min_confidence,
                "resolution declined below confidence threshold"
            );
            return None;
        }

        Some(CanonicalCardEntity {
            canonical_sku: entry.canonical_sku.clone(),
            name_normalized: normalize_name(&entry.name),
            set_code: entry.set_code.clone(),
            card_number: entry.card_number.clone(),
            market_tier: self.market_tier(listing.price),
            filter_quality: filter.quality,
            resolution_confidence: score,
            source_title: listing.title.clone(),
            observed_price: listing.price,
        })
    }
}
