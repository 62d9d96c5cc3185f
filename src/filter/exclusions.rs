//! Ordered junk-category matching. Runs first and short-circuits the
//! pipeline: a hit means the listing can never be a usable card record.

use crate::core::types::ExclusionCategory;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGITAL_CODE: Vec<Regex> = compile(&[
        r"\b(?:tcg\s*online|ptcgo|tcgo|digital\s*code|code\s*card|online\s*code)\b",
        r"\b(?:unused\s*code|redeem\s*code|download\s*code)\b",
    ]);
    static ref ACCESSORY: Vec<Regex> = compile(&[
        r"\b(?:sleeves?|deck\s*box|binder|playmat|dice|coin|token)\b",
        r"\b(?:storage|organizer|folder|album)\b",
        r"\b(?:figure|plush|toy|statue|model)\b",
    ]);
    static ref BULK_LOT: Vec<Regex> = compile(&[
        r"\b(?:random\s*(?:card|lot)|mystery\s*(?:box|pack)|grab\s*bag)\b",
        r"\b(?:choose\s*your|pick\s*your|you\s*choose|complete\s*your\s*set)\b",
        r"\b(?:lot\s*of\s*\d+|bulk\s*lot|\d+\s*card\s*lot)\b",
    ]);
    static ref CUSTOM_PROXY: Vec<Regex> = compile(&[
        r"\b(?:fake|proxy|custom|fan\s*made|reproduction|reprint)\b",
        r"\b(?:not\s*official|unofficial|knock\s*off)\b",
    ]);
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("exclusion pattern must compile"))
        .collect()
}

fn patterns_for(category: ExclusionCategory) -> &'static [Regex] {
    match category {
        ExclusionCategory::DigitalCode => &DIGITAL_CODE,
        ExclusionCategory::Accessory => &ACCESSORY,
        ExclusionCategory::BulkLot => &BULK_LOT,
        ExclusionCategory::CustomProxy => &CUSTOM_PROXY,
    }
}

/// Returns the first category (in `ExclusionCategory::ALL` order) with a
/// matching pattern, or None when the listing survives.
pub fn classify(text: &str) -> Option<ExclusionCategory> {
    for category in ExclusionCategory::ALL {
        if patterns_for(category).iter().any(|re| re.is_match(text)) {
            return Some(category);
        }
    }
    None
}
