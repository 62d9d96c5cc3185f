//! Multi-factor trust scoring. Additive with fixed increments so that the
//! score, and therefore the mapped quality level, is monotonic in the
//! indicator set: adding a negative indicator can only lower the level.

use crate::core::types::ListingQuality;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

const BASE_SCORE: f64 = 0.5;
const POSITIVE_INCREMENT: f64 = 0.1;
const NEGATIVE_INCREMENT: f64 = 0.15;
const LOW_PRICE_PENALTY: f64 = 0.2;
const HIGH_PRICE_PENALTY: f64 = 0.3;
const DETAIL_BONUS: f64 = 0.1;
const DETAIL_LENGTH: usize = 100;

/// One indicator group. A group contributes its increment at most once no
/// matter how many of its patterns hit.
struct Indicator {
    name: &'static str,
    patterns: Vec<Regex>,
}

fn indicator(name: &'static str, patterns: &[&str]) -> Indicator {
    Indicator {
        name,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("quality pattern must compile"))
            .collect(),
    }
}

lazy_static! {
    static ref POSITIVE: Vec<Indicator> = vec![
        indicator(
            "professional_photos",
            &[
                r"\bprofessional\s*photo",
                r"\bhigh\s*res",
                r"\bclear\s*image",
                r"\bmultiple\s*angle",
                r"\bfront\s*and\s*back",
            ],
        ),
        indicator(
            "detailed_condition",
            &[
                r"\bcentering",
                r"\bcorners?\b",
                r"\bedges?\b",
                r"\bsurface",
                r"\bno\s*creases?",
                r"\bno\s*bends?",
                r"\bno\s*scratches?",
                r"\bgem\s*mint",
                r"\bmint\s*condition",
                r"\bnear\s*mint",
                r"\bpack\s*fresh",
            ],
        ),
        indicator(
            "shipping_quality",
            &[
                r"\bfast\s*shipping",
                r"\bfree\s*shipping",
                r"\btracked\s*shipping",
                r"\binsured",
                r"\btop\s*rated",
            ],
        ),
        indicator(
            "authenticity",
            &[
                r"\bofficial\b",
                r"\boriginal\b",
                r"\bauthentic",
                r"\bgenuine",
            ],
        ),
    ];
    static ref NEGATIVE: Vec<Indicator> = vec![
        indicator(
            "as_is_language",
            &[
                r"\bas\s*is\b",
                r"\bno\s*returns?\b",
                r"\bsold\s*as\s*seen",
                r"\bread\s*description",
                r"\bcheck\s*photos?",
            ],
        ),
        indicator(
            "condition_issues",
            &[
                r"\bscuffs?\b",
                r"\bscratch",
                r"\bdents?\b",
                r"\bbends?\b",
                r"\bwear\b",
                r"\bdamage",
            ],
        ),
        indicator(
            "hype_or_unclear",
            &[
                r"[!?]{2,}",
                r"\bmight\s*be\b",
                r"\bnot\s*sure\b",
                r"\bthink\s*it\s*is\b",
                r"\brare\s*find\b",
            ],
        ),
        indicator(
            "vague_description",
            &[
                r"\blook\s*at\s*pics",
                r"\bsee\s*pictures",
                r"\bestate\s*sale",
                r"\bfound\s*in\b",
            ],
        ),
    ];
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    low_price_floor: Decimal,
    high_price_ceiling: Decimal,
}

impl QualityScorer {
    pub fn new(low_price_floor: f64, high_price_ceiling: f64) -> Self {
        Self {
            low_price_floor: Decimal::from_f64(low_price_floor).unwrap_or(Decimal::ONE),
            high_price_ceiling: Decimal::from_f64(high_price_ceiling)
                .unwrap_or_else(|| Decimal::from(10_000)),
        }
    }

    /// Scores the pre-hype-squeeze text: excessive punctuation is itself a
    /// negative signal, so the caller passes the raw combined text here.
    pub fn score(&self, text: &str, price: Option<Decimal>) -> f64 {
        let mut score = BASE_SCORE;

        for ind in POSITIVE.iter() {
            if ind.patterns.iter().any(|re| re.is_match(text)) {
                tracing::trace!(indicator = ind.name, "positive quality indicator");
                score += POSITIVE_INCREMENT;
            }
        }

        for ind in NEGATIVE.iter() {
            if ind.patterns.iter().any(|re| re.is_match(text)) {
                tracing::trace!(indicator = ind.name, "negative quality indicator");
                score -= NEGATIVE_INCREMENT;
            }
        }

        if let Some(p) = price {
            if p < self.low_price_floor {
                score -= LOW_PRICE_PENALTY;
            } else if p > self.high_price_ceiling {
                score -= HIGH_PRICE_PENALTY;
            }
        }

        if text.len() > DETAIL_LENGTH {
            score += DETAIL_BONUS;
        }

        score.clamp(0.0, 1.0)
    }

    /// Fixed, ordered cutoffs. Monotonic: a lower score never maps to a
    /// higher level.
    pub fn quality_for(score: f64) -> ListingQuality {
        if score >= 0.8 {
            ListingQuality::Excellent
        } else if score >= 0.65 {
            ListingQuality::Good
        } else if score >= 0.5 {
            ListingQuality::Acceptable
        } else if score >= 0.3 {
            ListingQuality::Poor
        } else {
            ListingQuality::Junk
        }
    }
}
