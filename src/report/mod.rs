//! Text rendering of bonds, impact estimates, analyses, and market snapshots.
//!
//! Field-level helpers live here so the TUI and the one-shot commands agree
//! on how a value looks; whole-report layouts are in [`format`].

pub mod format;

pub use format::{
    format_analysis, format_bond_detail, format_bond_list, format_market, impact_lines,
    returns_lines, summary_lines,
};

use crate::domain::BondRecord;

/// Length of the use-of-proceeds preview shown under each bond row.
pub const PREVIEW_CHARS: usize = 80;

/// Placeholder for a missing value.
pub const MISSING: &str = "—";

/// First [`PREVIEW_CHARS`] characters, with `…` when cut.
pub fn proceeds_preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// `issue → maturity`, with `?` for a missing year.
pub fn year_span(bond: &BondRecord) -> String {
    format!("{} → {}", year(bond.issue_year), year(bond.maturity_year))
}

fn year(v: Option<f64>) -> String {
    match v {
        Some(y) if y != 0.0 => plain_number(y),
        _ => "?".to_string(),
    }
}

/// USD amount with thousands separators, else the raw amount, else `—`.
pub fn amount_label(bond: &BondRecord) -> String {
    match (bond.amount_issued_usd, bond.amount_issued) {
        (Some(usd), _) if usd != 0.0 => format!("${}", thousands(usd)),
        (_, Some(raw)) if raw != 0.0 => plain_number(raw),
        _ => MISSING.to_string(),
    }
}

/// `12,345,678` (up to two decimals, trailing zeros dropped).
pub fn thousands(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let rounded = (v.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if v < 0.0 && (whole > 0 || cents > 0) {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if cents > 0 {
        let frac = format!("{cents:02}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Integers without a decimal point, everything else as-is.
pub fn plain_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Fixed two decimals, or `—`.
pub fn fmt2(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| MISSING.to_string())
}

/// Text or `fallback` when missing/blank.
pub fn or_default<'a>(v: Option<&'a str>, fallback: &'a str) -> &'a str {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => fallback,
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_at_eighty_chars() {
        let long = "x".repeat(81);
        let p = proceeds_preview(&long);
        assert_eq!(p.chars().count(), 81);
        assert!(p.ends_with('…'));

        let exact = "y".repeat(80);
        assert_eq!(proceeds_preview(&exact), exact);
        assert_eq!(proceeds_preview(""), "");
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        let text = "é".repeat(85);
        assert_eq!(proceeds_preview(&text).chars().count(), 81);
    }

    #[test]
    fn years_fall_back_to_question_mark() {
        let mut b = BondRecord {
            issue_year: Some(2021.0),
            ..BondRecord::default()
        };
        assert_eq!(year_span(&b), "2021 → ?");
        b.maturity_year = Some(2031.0);
        assert_eq!(year_span(&b), "2021 → 2031");
    }

    #[test]
    fn amount_prefers_usd() {
        let mut b = BondRecord {
            amount_issued: Some(500.0),
            amount_issued_usd: Some(1_250_000_000.0),
            ..BondRecord::default()
        };
        assert_eq!(amount_label(&b), "$1,250,000,000");
        b.amount_issued_usd = None;
        assert_eq!(amount_label(&b), "500");
        b.amount_issued = None;
        assert_eq!(amount_label(&b), "—");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(1234567.5), "1,234,567.5");
        assert_eq!(thousands(-2500.25), "-2,500.25");
    }

    #[test]
    fn blank_text_uses_fallback() {
        assert_eq!(or_default(Some("  "), "None"), "None");
        assert_eq!(or_default(None, "None"), "None");
        assert_eq!(or_default(Some("CBI"), "None"), "CBI");
    }
}
