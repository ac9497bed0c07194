//! Free-text bond search.

use crate::domain::BondRecord;

/// Maximum number of matches rendered in the bond list.
pub const DISPLAY_LIMIT: usize = 200;

/// Case-insensitive substring search over issuer name, bond id, and ISIN.
///
/// - an empty/whitespace query returns every bond, in input order
/// - otherwise a bond matches when any of the three fields contains the
///   lowercased query; missing fields compare as `""`
/// - the result is a stable filter (no sorting, no dedup)
pub fn filter_bonds<'a>(bonds: &'a [BondRecord], query: &str) -> Vec<&'a BondRecord> {
    if query.trim().is_empty() {
        return bonds.iter().collect();
    }

    let needle = query.to_lowercase();
    bonds.iter().filter(|b| matches(b, &needle)).collect()
}

fn matches(bond: &BondRecord, needle: &str) -> bool {
    let isin = bond.isin.as_deref().unwrap_or("");
    [bond.issuer_name.as_str(), bond.id.as_str(), isin]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Filter result split into the rendered window and the full match count.
#[derive(Debug, Clone)]
pub struct FilteredBonds<'a> {
    /// At most [`DISPLAY_LIMIT`] matches, in input order.
    pub shown: Vec<&'a BondRecord>,
    /// Number of matches before truncation.
    pub total: usize,
}

impl<'a> FilteredBonds<'a> {
    pub fn new(bonds: &'a [BondRecord], query: &str) -> Self {
        let mut shown = filter_bonds(bonds, query);
        let total = shown.len();
        shown.truncate(DISPLAY_LIMIT);
        Self { shown, total }
    }

    pub fn is_truncated(&self) -> bool {
        self.total > self.shown.len()
    }

    /// "Showing N of M matching bonds" line.
    pub fn summary(&self) -> String {
        let mut out = format!("Showing {} of {} matching bonds", self.shown.len(), self.total);
        if self.is_truncated() {
            out.push_str(&format!(" (showing first {DISPLAY_LIMIT})"));
        }
        out
    }
}
