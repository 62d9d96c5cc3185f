use deunicode::deunicode;
use regex::Regex;

/// Normalization used by all pattern matching stages: lowercase, URLs out,
/// unicode folded to ASCII, repeated hype punctuation squeezed, whitespace
/// collapsed. Card-relevant punctuation (`/`, `#`, `.`) survives so that
/// numbers like `074/172` and grades like `9.5` stay matchable.
pub fn normalize_for_matching(title: &str, description: &str) -> String {
    lazy_static::lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"https?://\S+").unwrap();
        static ref HYPE_RE: Regex = Regex::new(r"[!?*]{2,}").unwrap(); // squeeze !!!, ???, ***
    }

    let combined = format!("{} {}", title, description);

    let lower = combined.to_lowercase();
    let no_url = URL_RE.replace_all(&lower, "");
    let ascii = deunicode(&no_url); // Pokémon -> pokemon
    let squeezed = HYPE_RE.replace_all(&ascii, |caps: &regex::Captures| caps[0][..1].to_string());

    let collapsed = squeezed.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.trim().to_string()
}

/// Aggressive normalization for the duplicate-observation guard: everything
/// `normalize_for_matching` does, plus all punctuation stripped, so rewritten
/// relists of the same item hash identically.
pub fn normalize_for_dedup(title: &str, description: &str) -> String {
    lazy_static::lazy_static! {
        static ref PUNCT_RE: Regex = Regex::new(r"[^\w\s]").unwrap();
    }

    let matched = normalize_for_matching(title, description);
    let no_punct = PUNCT_RE.replace_all(&matched, " ");

    no_punct
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Canonical form for card names, used both as the catalog index key and for
/// similarity scoring. Punctuation-free so `Farfetch'd` and `farfetchd`
/// collide deliberately.
pub fn normalize_name(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref PUNCT_RE: Regex = Regex::new(r"[^\w\s]").unwrap();
    }

    let lower = name.to_lowercase();
    let ascii = deunicode(&lower);
    let no_punct = PUNCT_RE.replace_all(&ascii, "");

    no_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}
