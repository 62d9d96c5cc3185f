//! Structured attribute extraction from normalized listing text: set,
//! card number, grading-company grade, and condition. Extraction is total;
//! an absent pattern just leaves the field unset.

use crate::core::types::CardCondition;
use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use regex::Regex;

/// One known set: canonical code, display name, and the lowercase aliases
/// that identify it in listing text. Order is the declared match priority —
/// more specific entries (Base Set 2, Gym Challenge) come before the generic
/// ones they overlap with.
#[derive(Debug, PartialEq)]
pub struct SetDef {
    pub code: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

pub static SET_TABLE: &[SetDef] = &[
    // Scarlet & Violet era
    SetDef { code: "PAL", name: "Paldea Evolved", aliases: &["paldea evolved", "pal"] },
    SetDef { code: "OBF", name: "Obsidian Flames", aliases: &["obsidian flames", "obf"] },
    SetDef { code: "MEW", name: "151", aliases: &["pokemon 151", "151"] },
    SetDef { code: "PAR", name: "Paradox Rift", aliases: &["paradox rift", "par"] },
    SetDef { code: "SVI", name: "Scarlet & Violet Base", aliases: &["scarlet & violet", "scarlet violet", "svi"] },
    // Sword & Shield era
    SetDef { code: "CRZ", name: "Crown Zenith", aliases: &["crown zenith", "crz"] },
    SetDef { code: "SIT", name: "Silver Tempest", aliases: &["silver tempest", "sit"] },
    SetDef { code: "LOR", name: "Lost Origin", aliases: &["lost origin", "lor"] },
    SetDef { code: "PGO", name: "Pokemon GO", aliases: &["pokemon go", "pgo"] },
    SetDef { code: "ASR", name: "Astral Radiance", aliases: &["astral radiance", "asr"] },
    SetDef { code: "BRS", name: "Brilliant Stars", aliases: &["brilliant stars", "brs"] },
    SetDef { code: "FST", name: "Fusion Strike", aliases: &["fusion strike", "fst"] },
    SetDef { code: "CEL", name: "Celebrations", aliases: &["celebrations", "cel"] },
    SetDef { code: "EVS", name: "Evolving Skies", aliases: &["evolving skies", "evs"] },
    SetDef { code: "CRE", name: "Chilling Reign", aliases: &["chilling reign", "cre"] },
    SetDef { code: "BST", name: "Battle Styles", aliases: &["battle styles", "bst"] },
    SetDef { code: "SHF", name: "Shining Fates", aliases: &["shining fates", "shf"] },
    SetDef { code: "VIV", name: "Vivid Voltage", aliases: &["vivid voltage", "viv"] },
    SetDef { code: "CPA", name: "Champions Path", aliases: &["champions path", "champion's path", "cpa"] },
    SetDef { code: "DAA", name: "Darkness Ablaze", aliases: &["darkness ablaze", "daa"] },
    SetDef { code: "RCL", name: "Rebel Clash", aliases: &["rebel clash", "rcl"] },
    SetDef { code: "SSH", name: "Sword & Shield Base", aliases: &["sword & shield", "sword shield", "ssh"] },
    // Classic era, specific entries before the generic Base Set
    SetDef { code: "B2", name: "Base Set 2", aliases: &["base set 2", "base 2"] },
    SetDef { code: "BASE", name: "Base Set", aliases: &["base set", "wotc base", "shadowless"] },
    SetDef { code: "JUN", name: "Jungle", aliases: &["jungle"] },
    SetDef { code: "FOS", name: "Fossil", aliases: &["fossil"] },
    SetDef { code: "TR", name: "Team Rocket", aliases: &["team rocket"] },
    SetDef { code: "GYM1", name: "Gym Heroes", aliases: &["gym heroes"] },
    SetDef { code: "GYM2", name: "Gym Challenge", aliases: &["gym challenge"] },
    SetDef { code: "NEO1", name: "Neo Genesis", aliases: &["neo genesis"] },
    SetDef { code: "NEO2", name: "Neo Discovery", aliases: &["neo discovery"] },
    SetDef { code: "NEO3", name: "Neo Revelation", aliases: &["neo revelation"] },
    SetDef { code: "NEO4", name: "Neo Destiny", aliases: &["neo destiny"] },
];

lazy_static! {
    /// Automaton over every alias; PATTERN_TO_SET maps a pattern id back to
    /// its position in SET_TABLE for priority selection.
    static ref SET_AC: AhoCorasick = {
        let patterns: Vec<&str> = SET_TABLE.iter().flat_map(|s| s.aliases.iter().copied()).collect();
        AhoCorasick::new(&patterns).expect("set alias automaton must build")
    };
    static ref PATTERN_TO_SET: Vec<usize> = SET_TABLE
        .iter()
        .enumerate()
        .flat_map(|(i, s)| s.aliases.iter().map(move |_| i))
        .collect();

    static ref GRADE_PSA: Regex = Regex::new(r"\bpsa\s*(10|[1-9])\b").unwrap();
    static ref GRADE_BGS: Regex = Regex::new(r"\b(?:bgs|beckett)\s*(\d{1,2}(?:\.5)?)\b").unwrap();
    static ref GRADE_CGC: Regex = Regex::new(r"\bcgc\s*(\d{1,2}(?:\.5)?)\b").unwrap();

    static ref NUMBER_HASH: Regex = Regex::new(r"#\s*(\d{1,3}[a-z]?)\b").unwrap();
    static ref NUMBER_SLASH: Regex = Regex::new(r"\b(\d{1,3})\s*/\s*\d{1,3}\b").unwrap();
    static ref NUMBER_NO: Regex = Regex::new(r"\bno\.?\s*(\d{1,3})\b").unwrap();
}

/// Aho-Corasick has no word boundaries, so `tr` inside `trainer` would match.
/// Accept a hit only when both ends sit on non-alphanumeric boundaries.
fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let left_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let right_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
    left_ok && right_ok
}

/// Detects the card set. All alias hits are collected and the entry earliest
/// in SET_TABLE wins, making the priority order explicit and testable.
pub fn extract_set(text: &str) -> Option<&'static SetDef> {
    let mut best: Option<usize> = None;
    for m in SET_AC.find_overlapping_iter(text) {
        if !is_word_bounded(text, m.start(), m.end()) {
            continue;
        }
        let set_idx = PATTERN_TO_SET[m.pattern().as_usize()];
        best = Some(match best {
            Some(b) if b <= set_idx => b,
            _ => set_idx,
        });
    }
    best.map(|i| &SET_TABLE[i])
}

/// Detects a grading-company grade: company token followed by a numeric
/// grade in 1-10, half grades included. Returns the canonical string form,
/// e.g. "PSA 10" or "BGS 9.5".
pub fn extract_grade(text: &str) -> Option<String> {
    if let Some(cap) = GRADE_PSA.captures(text) {
        return Some(format!("PSA {}", &cap[1]));
    }
    for (company, re) in [("BGS", &*GRADE_BGS), ("CGC", &*GRADE_CGC)] {
        if let Some(cap) = re.captures(text) {
            let grade: f64 = cap[1].parse().ok()?;
            if (1.0..=10.0).contains(&grade) {
                return Some(format!("{} {}", company, &cap[1]));
            }
        }
    }
    None
}

/// Extracts a card number from `#NNN`, `NNN/NNN`, or `no. NNN` forms, in
/// that order. Bare numbers are deliberately not treated as card numbers:
/// they collide with grades and HP values.
pub fn extract_card_number(text: &str) -> Option<String> {
    for re in [&*NUMBER_HASH, &*NUMBER_SLASH, &*NUMBER_NO] {
        if let Some(cap) = re.captures(text) {
            return Some(cap[1].to_string());
        }
    }
    None
}

/// Condition vocabulary in declared priority order. NearMint precedes Mint
/// so that "near mint" is never claimed by the bare "mint" pattern.
static CONDITION_TABLE: &[(CardCondition, &[&str])] = &[
    (CardCondition::NearMint, &["near mint", "near-mint", "nm"]),
    (CardCondition::Mint, &["gem mint", "mint", "mt"]),
    (CardCondition::LightPlay, &["lightly played", "light play", "lp"]),
    (CardCondition::ModeratePlay, &["moderately played", "moderate play", "mp"]),
    (CardCondition::HeavyPlay, &["heavily played", "heavy play", "hp"]),
    (CardCondition::Damaged, &["damaged", "dmg"]),
];

lazy_static! {
    static ref CONDITION_RES: Vec<(CardCondition, Vec<Regex>)> = CONDITION_TABLE
        .iter()
        .map(|(cond, words)| {
            let res = words
                .iter()
                .map(|w| {
                    Regex::new(&format!(r"\b{}\b", regex::escape(w)))
                        .expect("condition pattern must compile")
                })
                .collect();
            (*cond, res)
        })
        .collect();
}

/// True when the match at `start` is preceded by a number, as in "120 hp" —
/// that is a stat line, not a condition.
fn preceded_by_digit(text: &str, start: usize) -> bool {
    text[..start]
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit())
}

pub fn extract_condition(text: &str) -> Option<CardCondition> {
    for (cond, res) in CONDITION_RES.iter() {
        for re in res {
            if let Some(m) = re.find(text) {
                if *cond == CardCondition::HeavyPlay && preceded_by_digit(text, m.start()) {
                    continue;
                }
                return Some(*cond);
            }
        }
    }
    None
}

/// Removes set aliases from text, used by the resolver when isolating the
/// card name from a title.
pub fn strip_set_tokens(text: &str) -> String {
    let mut keep = vec![true; text.len()];
    for m in SET_AC.find_overlapping_iter(text) {
        if is_word_bounded(text, m.start(), m.end()) {
            for flag in keep.iter_mut().take(m.end()).skip(m.start()) {
                *flag = false;
            }
        }
    }
    let stripped: String = text
        .char_indices()
        .filter(|(i, _)| keep[*i])
        .map(|(_, c)| c)
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_detection() {
        let cases = [
            ("charizard ex paldea evolved pal", "PAL"),
            ("pikachu vmax vivid voltage viv", "VIV"),
            ("umbreon vmax evolving skies", "EVS"),
            ("charizard base set wotc holo", "BASE"),
            ("mew 151 pokemon card", "MEW"),
            ("charizard vmax 074/172 brilliant stars secret rare psa 10", "BRS"),
        ];
        for (text, code) in cases {
            assert_eq!(extract_set(text).map(|s| s.code), Some(code), "{text}");
        }
    }

    #[test]
    fn test_set_detection_prefers_specific_entry() {
        // "base set 2" also contains "base set"; B2 is declared first.
        assert_eq!(
            extract_set("blastoise base set 2 holo").map(|s| s.code),
            Some("B2")
        );
    }

    #[test]
    fn test_set_alias_requires_word_boundary() {
        // "lor" must not fire inside "explorer", nor "evs" inside "sleeves".
        assert_eq!(extract_set("explorer sleeves for cards"), None);
    }

    #[test]
    fn test_set_detection_returns_display_name() {
        let set = extract_set("charizard brilliant stars").unwrap();
        assert_eq!(set.name, "Brilliant Stars");
        assert_eq!(set.code, "BRS");
    }

    #[test]
    fn test_grade_detection() {
        assert_eq!(extract_grade("charizard psa 10 gem mint"), Some("PSA 10".into()));
        assert_eq!(extract_grade("pikachu bgs 9.5 beckett"), Some("BGS 9.5".into()));
        assert_eq!(extract_grade("umbreon cgc 8.5 graded"), Some("CGC 8.5".into()));
        assert_eq!(extract_grade("charizard psa 7 near mint"), Some("PSA 7".into()));
        assert_eq!(extract_grade("charizard near mint"), None);
        // Out-of-range grades are not grades.
        assert_eq!(extract_grade("cgc 11 slab"), None);
    }

    #[test]
    fn test_card_number_extraction() {
        assert_eq!(
            extract_card_number("charizard #006/165 brilliant stars"),
            Some("006".into())
        );
        assert_eq!(
            extract_card_number("pikachu 025/172 pokemon card"),
            Some("025".into())
        );
        assert_eq!(
            extract_card_number("umbreon no. 094 evolving skies"),
            Some("094".into())
        );
        // A bare number is not a card number.
        assert_eq!(extract_card_number("charizard psa 10"), None);
    }

    #[test]
    fn test_condition_detection() {
        assert_eq!(
            extract_condition("charizard mint condition pokemon card"),
            Some(CardCondition::Mint)
        );
        assert_eq!(
            extract_condition("pikachu near mint nm pokemon"),
            Some(CardCondition::NearMint)
        );
        assert_eq!(
            extract_condition("umbreon lightly played lp card"),
            Some(CardCondition::LightPlay)
        );
        assert_eq!(
            extract_condition("charizard heavily played pokemon"),
            Some(CardCondition::HeavyPlay)
        );
        assert_eq!(
            extract_condition("damaged pokemon card as is"),
            Some(CardCondition::Damaged)
        );
        assert_eq!(extract_condition("charizard vmax 074/172"), None);
    }

    #[test]
    fn test_hp_stat_is_not_a_condition() {
        assert_eq!(extract_condition("pikachu v 190 hp full art"), None);
        assert_eq!(
            extract_condition("charizard hp card played hard"),
            Some(CardCondition::HeavyPlay)
        );
    }

    #[test]
    fn test_strip_set_tokens() {
        assert_eq!(
            strip_set_tokens("charizard vmax brilliant stars secret rare"),
            "charizard vmax secret rare"
        );
    }
}
