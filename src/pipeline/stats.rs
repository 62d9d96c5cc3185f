//! Batch-level accumulator. Each parallel worker fills its own instance and
//! the results are merged after the fan-in, so no counter is ever shared
//! mutably across tasks.

use crate::core::types::{CardType, FilterResult, ListingQuality};

#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub total: u64,
    pub valid: u64,
    pub rejected: u64,
    pub resolved: u64,
    pub unresolved: u64,
    quality_counts: [u64; 5],
    card_type_counts: [u64; 6],
    confidence_sum: f64,
}

impl BatchStats {
    pub fn record_filter(&mut self, result: &FilterResult) {
        self.total += 1;
        if result.is_valid {
            self.valid += 1;
        } else {
            self.rejected += 1;
        }
        self.quality_counts[result.quality.index()] += 1;
        self.card_type_counts[result.card_type.index()] += 1;
        self.confidence_sum += result.confidence;
    }

    pub fn record_resolution(&mut self, resolved: bool) {
        if resolved {
            self.resolved += 1;
        } else {
            self.unresolved += 1;
        }
    }

    pub fn merge(&mut self, other: &BatchStats) {
        self.total += other.total;
        self.valid += other.valid;
        self.rejected += other.rejected;
        self.resolved += other.resolved;
        self.unresolved += other.unresolved;
        for i in 0..self.quality_counts.len() {
            self.quality_counts[i] += other.quality_counts[i];
        }
        for i in 0..self.card_type_counts.len() {
            self.card_type_counts[i] += other.card_type_counts[i];
        }
        self.confidence_sum += other.confidence_sum;
    }

    pub fn count_for_quality(&self, quality: ListingQuality) -> u64 {
        self.quality_counts[quality.index()]
    }

    pub fn count_for_card_type(&self, card_type: CardType) -> u64 {
        self.card_type_counts[card_type.index()]
    }

    pub fn average_confidence(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.confidence_sum / self.total as f64
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            valid = self.valid,
            rejected = self.rejected,
            resolved = self.resolved,
            unresolved = self.unresolved,
            avg_confidence = %format!("{:.2}", self.average_confidence()),
            "batch summary"
        );
        for quality in ListingQuality::ALL {
            let count = self.count_for_quality(quality);
            if count > 0 {
                tracing::info!(quality = quality.as_str(), count, "quality distribution");
            }
        }
        for card_type in CardType::ALL {
            let count = self.count_for_card_type(card_type);
            if count > 0 {
                tracing::info!(card_type = card_type.as_str(), count, "card type distribution");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(valid: bool, quality: ListingQuality, card_type: CardType, conf: f64) -> FilterResult {
        FilterResult {
            is_valid: valid,
            quality,
            card_type,
            confidence: conf,
            quality_score: 0.5,
            detected_set: None,
            detected_set_code: None,
            detected_card_number: None,
            detected_grade: None,
            detected_condition: None,
            exclusion_reason: None,
        }
    }

    #[test]
    fn test_record_and_query() {
        let mut stats = BatchStats::default();
        stats.record_filter(&result(true, ListingQuality::Good, CardType::SingleCard, 0.9));
        stats.record_filter(&result(false, ListingQuality::Junk, CardType::DigitalCode, 1.0));
        stats.record_resolution(true);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.count_for_quality(ListingQuality::Good), 1);
        assert_eq!(stats.count_for_card_type(CardType::DigitalCode), 1);
        assert!((stats.average_confidence() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_merge_matches_sequential_recording() {
        let a_results = [
            result(true, ListingQuality::Excellent, CardType::SingleCard, 0.9),
            result(false, ListingQuality::Junk, CardType::BulkLot, 1.0),
        ];
        let b_results = [result(true, ListingQuality::Acceptable, CardType::SealedProduct, 0.6)];

        let mut merged = BatchStats::default();
        let mut a = BatchStats::default();
        let mut b = BatchStats::default();
        for r in &a_results {
            a.record_filter(r);
            merged.record_filter(r);
        }
        for r in &b_results {
            b.record_filter(r);
            merged.record_filter(r);
        }

        let mut combined = BatchStats::default();
        combined.merge(&a);
        combined.merge(&b);

        assert_eq!(combined.total, merged.total);
        assert_eq!(combined.valid, merged.valid);
        assert_eq!(
            combined.count_for_quality(ListingQuality::Junk),
            merged.count_for_quality(ListingQuality::Junk)
        );
        assert!((combined.average_confidence() - merged.average_confidence()).abs() < 1e-9);
    }
}
