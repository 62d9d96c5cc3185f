//! Front door of the classification pipeline: exclusion check, type
//! assignment, quality scoring and attribute extraction for one listing.

use crate::core::types::{AuditRecord, FilterResult, ListingQuality, RawListing};
use crate::filter::{attributes, card_type, exclusions, normalizers, quality::QualityScorer};

#[derive(Debug, Clone)]
pub struct ListingFilter {
    scorer: QualityScorer,
}

impl ListingFilter {
    pub fn new(low_price_floor: f64, high_price_ceiling: f64) -> Self {
        Self {
            scorer: QualityScorer::new(low_price_floor, high_price_ceiling),
        }
    }

    /// Classifies a single listing. Total: every input maps to a defined
    /// FilterResult, and the same listing always maps to the same result.
    pub fn classify(&self, listing: &RawListing) -> FilterResult {
        let text = normalizers::normalize_for_matching(&listing.title, &listing.description);

        // Junk categories short-circuit everything else. Confidence is 1.0:
        // we are certain the listing is junk, not that it is a good card.
        if let Some(category) = exclusions::classify(&text) {
            tracing::debug!(
                title = %listing.title,
                category = category.as_str(),
                "listing excluded"
            );
            return FilterResult {
                is_valid: false,
                quality: ListingQuality::Junk,
                card_type: category.card_type(),
                confidence: 1.0,
                quality_score: 0.0,
                detected_set: None,
                detected_set_code: None,
                detected_card_number: None,
                detected_grade: None,
                detected_condition: None,
                exclusion_reason: Some(category),
            };
        }

        let card_type = card_type::classify(&text);

        let detected_set = attributes::extract_set(&text);
        let detected_card_number = attributes::extract_card_number(&text);
        let detected_grade = attributes::extract_grade(&text);
        // Seller-supplied condition field participates in condition detection.
        let condition_text = match &listing.condition {
            Some(c) => format!("{} {}", text, c.to_lowercase()),
            None => text.clone(),
        };
        let detected_condition = attributes::extract_condition(&condition_text);

        // Hype punctuation is a scoring signal, so score the raw combined
        // text rather than the squeezed one.
        let raw_text = format!("{} {}", listing.title, listing.description).to_lowercase();
        let quality_score = self.scorer.score(&raw_text, listing.price);
        let quality = QualityScorer::quality_for(quality_score);

        let confidence = Self::confidence(card_type, detected_set.is_some(), detected_card_number.is_some(), quality_score);

        FilterResult {
            // Invariant: invalid exactly when excluded or scored junk.
            is_valid: quality != ListingQuality::Junk,
            quality,
            card_type,
            confidence,
            quality_score,
            detected_set: detected_set.map(|s| s.name.to_string()),
            detected_set_code: detected_set.map(|s| s.code.to_string()),
            detected_card_number,
            detected_grade,
            detected_condition,
            exclusion_reason: None,
        }
    }

    /// Overall confidence in the classification: how strongly the evidence
    /// points at a specific, analyzable card.
    fn confidence(
        card_type: crate::core::types::CardType,
        has_set: bool,
        has_number: bool,
        quality_score: f64,
    ) -> f64 {
        use crate::core::types::CardType::*;

        let mut confidence = match card_type {
            SingleCard => 0.4,
            SealedProduct => 0.3,
            BulkLot | Accessory => 0.2,
            _ => 0.1,
        };
        if has_set {
            confidence += 0.3;
        }
        if has_number {
            confidence += 0.2;
        }
        confidence += quality_score * 0.1;

        confidence.clamp(0.0, 1.0)
    }

    pub fn audit_record(listing: &RawListing, result: &FilterResult) -> AuditRecord {
        AuditRecord {
            title: listing.title.clone(),
            card_type: result.card_type,
            exclusion_reason: result.exclusion_reason,
            quality_score: result.quality_score,
        }
    }
}
