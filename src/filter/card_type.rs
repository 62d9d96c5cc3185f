//! Card type assignment for listings that survived exclusion.
//!
//! Weighted signal groups per product category; the strongest signal wins,
//! with two deliberate biases: explicit single-card wording cancels the
//! packaging bias, and when nothing fires the default is SINGLE_CARD (the
//! system is optimized for single-card analysis).

use crate::core::types::CardType;
use lazy_static::lazy_static;
use regex::Regex;

struct Signal {
    re: Regex,
    weight: f64,
}

fn signals(patterns: &[(&str, f64)]) -> Vec<Signal> {
    patterns
        .iter()
        .map(|(p, w)| Signal {
            re: Regex::new(p).expect("type signal must compile"),
            weight: *w,
        })
        .collect()
}

lazy_static! {
    static ref DIGITAL: Vec<Signal> = signals(&[
        (r"\b(?:tcg\s*online|ptcgo|tcgo|digital)\b", 2.0),
        (r"\bcode\b", 1.5),
    ]);
    static ref SEALED: Vec<Signal> = signals(&[
        (r"\b(?:booster\s*(?:pack|box)|elite\s*trainer|theme\s*deck)\b", 2.0),
        (r"\b(?:tin|collection\s*box|starter\s*deck)\b", 2.0),
        (r"\b(?:sealed|unopened|factory\s*sealed)\b", 2.0),
    ]);
    static ref BULK: Vec<Signal> = signals(&[
        (r"\b(?:lot\s*of|bulk|random)\b", 2.0),
        (r"\b(?:mixed\s*lot|card\s*lot)\b", 2.0),
    ]);
    static ref ACCESSORY: Vec<Signal> = signals(&[
        (r"\b(?:sleeve|protector|binder)\b", 2.0),
        (r"\b(?:playmat|dice|counter)\b", 2.0),
    ]);
    static ref CUSTOM: Vec<Signal> = signals(&[
        (r"\b(?:custom|proxy|fan\s*made|ooak)\b", 2.0),
        (r"\b(?:altered|painted|custom\s*art)\b", 2.0),
    ]);
    static ref SINGLE: Vec<Signal> = signals(&[
        (r"\b(?:pokemon\s*card|trading\s*card|single\s*card)\b", 1.0),
        (r"\b(?:holo|rare|common|uncommon)\b", 1.0),
        (r"\b(?:ex|gx|v|vmax|vstar)\b", 1.0),
    ]);
    /// Explicit single-card wording that overrides packaging terms, e.g.
    /// "single card from sealed case break".
    static ref SINGLE_EXPLICIT: Regex =
        Regex::new(r"\b(?:single\s*card|single)\b").unwrap();
}

fn weight_of(group: &[Signal], text: &str) -> f64 {
    group
        .iter()
        .filter(|s| s.re.is_match(text))
        .map(|s| s.weight)
        .sum()
}

pub fn classify(text: &str) -> CardType {
    let single = weight_of(&SINGLE, text);

    let mut sealed = weight_of(&SEALED, text);
    if sealed > 0.0 && SINGLE_EXPLICIT.is_match(text) {
        sealed = 0.0;
    }

    // Candidate order doubles as the tie-break priority.
    let candidates = [
        (CardType::DigitalCode, weight_of(&DIGITAL, text)),
        (CardType::SealedProduct, sealed),
        (CardType::BulkLot, weight_of(&BULK, text)),
        (CardType::Accessory, weight_of(&ACCESSORY, text)),
        (CardType::CustomProxy, weight_of(&CUSTOM, text)),
    ];

    let mut best = (CardType::SingleCard, 0.0_f64);
    for (card_type, weight) in candidates {
        if weight > best.1 {
            best = (card_type, weight);
        }
    }

    // Absence of contrary evidence favors the single-card path.
    if best.1 > single { best.0 } else { CardType::SingleCard }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_product_detected() {
        for text in [
            "pokemon brilliant stars booster box sealed",
            "pokemon elite trainer box evolving skies unopened",
            "pokemon theme deck factory sealed",
            "pokemon tin collection box",
        ] {
            assert_eq!(classify(text), CardType::SealedProduct, "{text}");
        }
    }

    #[test]
    fn test_explicit_single_card_beats_packaging_terms() {
        assert_eq!(
            classify("charizard holo single card pulled from sealed booster box"),
            CardType::SingleCard
        );
    }

    #[test]
    fn test_default_is_single_card() {
        assert_eq!(classify("charizard 4/102 base set"), CardType::SingleCard);
        assert_eq!(classify(""), CardType::SingleCard);
    }

    #[test]
    fn test_bulk_lot_detected() {
        assert_eq!(
            classify("pokemon mixed lot 40 cards"),
            CardType::BulkLot
        );
    }

    #[test]
    fn test_single_card_signals_win_over_weak_noise() {
        assert_eq!(
            classify("charizard vmax secret rare pokemon card"),
            CardType::SingleCard
        );
    }
}
