//! Read-only reference catalog. Loaded once at startup and shared across
//! workers; a refresh replaces the whole table behind `CatalogHandle` so
//! in-flight resolutions never observe a half-updated catalog.

use crate::core::types::CatalogEntry;
use crate::filter::normalizers::normalize_name;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

pub struct Catalog {
    entries: Vec<CatalogEntry>,
    /// normalized name -> entry indices (several printings share a name)
    by_name: HashMap<String, Vec<usize>>,
    /// (set_code, normalized card number) fast path
    by_set_number: HashMap<(String, String), usize>,
    /// normalized-name keys sorted for prefix narrowing
    sorted_keys: Vec<String>,
}

/// Card numbers compare without leading zeros: "074" and "74" are the same
/// printing.
pub fn normalize_number(number: &str) -> String {
    let trimmed = number.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

impl Catalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_set_number = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            by_name.entry(normalize_name(&entry.name)).or_default().push(i);
            by_set_number.insert(
                (
                    entry.set_code.to_uppercase(),
                    normalize_number(&entry.card_number),
                ),
                i,
            );
        }

        let mut sorted_keys: Vec<String> = by_name.keys().cloned().collect();
        sorted_keys.sort();

        Self {
            entries,
            by_name,
            by_set_number,
            sorted_keys,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&data).context("parsing catalog json")?;
        info!(entries = entries.len(), path = %path.display(), "catalog loaded");
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_sku(&self, sku: &str) -> bool {
        self.entries.iter().any(|e| e.canonical_sku == sku)
    }

    /// Exact (set_code, card_number) lookup.
    pub fn by_set_and_number(&self, set_code: &str, number: &str) -> Option<&CatalogEntry> {
        self.by_set_number
            .get(&(set_code.to_uppercase(), normalize_number(number)))
            .map(|&i| &self.entries[i])
    }

    /// Bounded candidate list for fuzzy scoring: exact normalized-name hits
    /// first, then entries whose key starts with the query's first token.
    /// Prefix narrowing keeps lookup cost bounded as the catalog grows.
    pub fn candidates(&self, normalized_name: &str, limit: usize) -> Vec<&CatalogEntry> {
        let mut out: Vec<&CatalogEntry> = Vec::new();

        if let Some(indices) = self.by_name.get(normalized_name) {
            out.extend(indices.iter().map(|&i| &self.entries[i]));
        }

        let Some(first_token) = normalized_name.split_whitespace().next() else {
            return out;
        };

        let start = self.sorted_keys.partition_point(|k| k.as_str() < first_token);
        for key in self.sorted_keys[start..]
            .iter()
            .take_while(|k| k.starts_with(first_token))
        {
            if key == normalized_name {
                continue; // already added via the exact hit
            }
            if let Some(indices) = self.by_name.get(key) {
                out.extend(indices.iter().map(|&i| &self.entries[i]));
            }
            if out.len() >= limit {
                break;
            }
        }

        out.truncate(limit);
        out
    }
}

/// Shared, atomically replaceable catalog reference. Readers snapshot an
/// `Arc<Catalog>` and keep using it even if a refresh lands mid-batch.
pub struct CatalogHandle {
    inner: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.inner.read().expect("catalog lock poisoned").clone()
    }

    /// Swaps in a freshly built table. In-flight snapshots are untouched.
    pub fn replace(&self, catalog: Catalog) {
        let mut guard = self.inner.write().expect("catalog lock poisoned");
        *guard = Arc::new(catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sku: &str, name: &str, set: &str, number: &str) -> CatalogEntry {
        CatalogEntry {
            canonical_sku: sku.to_string(),
            name: name.to_string(),
            set_code: set.to_string(),
            card_number: number.to_string(),
            rarity: "Secret Rare".to_string(),
        }
    }

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            entry("BRS-074-CHARIZARD_VMAX", "Charizard VMAX", "BRS", "074"),
            entry("BRS-017-CHARIZARD_V", "Charizard V", "BRS", "017"),
            entry("EVS-095-UMBREON_VMAX", "Umbreon VMAX", "EVS", "095"),
        ])
    }

    #[test]
    fn test_number_normalization() {
        assert_eq!(normalize_number("074"), "74");
        assert_eq!(normalize_number("74"), "74");
        assert_eq!(normalize_number("0"), "0");
        assert_eq!(normalize_number("H25"), "h25");
    }

    #[test]
    fn test_set_number_fast_path() {
        let c = sample();
        let hit = c.by_set_and_number("brs", "74").unwrap();
        assert_eq!(hit.canonical_sku, "BRS-074-CHARIZARD_VMAX");
        assert!(c.by_set_and_number("BRS", "999").is_none());
    }

    #[test]
    fn test_candidates_exact_then_prefix() {
        let c = sample();
        let hits = c.candidates("charizard vmax", 10);
        assert_eq!(hits[0].canonical_sku, "BRS-074-CHARIZARD_VMAX");
        // Prefix narrowing also surfaces the other Charizard printing.
        assert!(hits.iter().any(|e| e.canonical_sku == "BRS-017-CHARIZARD_V"));
        assert!(!hits.iter().any(|e| e.canonical_sku == "EVS-095-UMBREON_VMAX"));
    }

    #[test]
    fn test_candidates_bounded() {
        let entries: Vec<CatalogEntry> = (0..50)
            .map(|i| entry(&format!("SKU-{i}"), &format!("pikachu form {i}"), "EVS", &i.to_string()))
            .collect();
        let c = Catalog::from_entries(entries);
        assert_eq!(c.candidates("pikachu", 10).len(), 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let json = serde_json::to_string(&vec![entry(
            "BRS-074-CHARIZARD_VMAX",
            "Charizard VMAX",
            "BRS",
            "074",
        )])
        .unwrap();
        std::fs::write(&path, json).unwrap();

        let c = Catalog::load(&path).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.contains_sku("BRS-074-CHARIZARD_VMAX"));
    }

    #[test]
    fn test_handle_replace_is_atomic_for_readers() {
        let handle = CatalogHandle::new(sample());
        let before = handle.snapshot();
        assert_eq!(before.len(), 3);

        handle.replace(Catalog::from_entries(vec![entry(
            "NEW-001-MEW",
            "Mew",
            "MEW",
            "001",
        )]));

        // Old snapshot still sees the old table; new snapshots see the new one.
        assert_eq!(before.len(), 3);
        assert_eq!(handle.snapshot().len(), 1);
    }
}
