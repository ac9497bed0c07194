//! Multi-line reports for the one-shot commands.

use crate::analytics::{FilteredBonds, PRICE_ONLY_LABEL, Returns};
use crate::domain::{
    AnalysisResult, BondDetail, Horizon, ImpactEstimate, Instrument, MarketSummary, Mode,
    TransparencyComponents,
};

use super::{MISSING, amount_label, fmt2, or_default, proceeds_preview, truncate, year_span};

/// Bond table with the "showing N of M" line on top.
pub fn format_bond_list(filtered: &FilteredBonds<'_>) -> String {
    let mut out = String::new();
    out.push_str(&filtered.summary());
    out.push_str("\n\n");

    out.push_str(
        format!(
            "{:<16} {:<36} {:<8} {:<13} {:>18}",
            "bond_id", "issuer", "currency", "years", "amount"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<16} {:-<36} {:-<8} {:-<13} {:->18}\n", "", "", "", "", ""));

    for b in &filtered.shown {
        out.push_str(
            format!(
                "{:<16} {:<36} {:<8} {:<13} {:>18}",
                truncate(&b.id, 16),
                truncate(&b.issuer_name, 36),
                truncate(&b.currency, 8),
                year_span(b),
                amount_label(b),
            )
            .trim_end(),
        );
        out.push('\n');

        let preview = proceeds_preview(&b.use_of_proceeds);
        if !preview.is_empty() {
            out.push_str(&format!("{:16} {preview}\n", ""));
        }
    }

    out
}

/// Lines describing a chosen impact estimate.
pub fn impact_lines(impact: Option<&ImpactEstimate>) -> Vec<String> {
    let Some(impact) = impact else {
        return vec!["No impact prediction available.".to_string()];
    };

    let mut lines = Vec::new();
    if let Some(claimed) = impact.claimed {
        lines.push(format!("Claims {claimed:.2} tons CO₂"));
    }

    let mut predicted = format!("Predicted {} tons CO₂/year", fmt2(impact.predicted));
    if let Some(u) = impact.uncertainty {
        predicted.push_str(&format!(" ± {u:.2}"));
    }
    if impact.source.is_some_and(|s| s.is_model()) {
        predicted.push_str(" (ML intensity model)");
    }
    lines.push(predicted);

    if let Some(gap) = impact.gap {
        lines.push(format!("Gap vs claim: {gap:.2} tons"));
    }
    lines
}

fn component_lines(components: &TransparencyComponents) -> Vec<String> {
    [
        ("Use of proceeds clarity", components.use_of_proceeds_clarity),
        ("Reporting practices", components.reporting_practices),
        ("Verification strength", components.verification_strength),
    ]
    .into_iter()
    .filter_map(|(label, v)| v.map(|v| format!("  {label}: {v:.2}")))
    .collect()
}

pub fn format_bond_detail(detail: &BondDetail, mode: Mode, impact: Option<&ImpactEstimate>) -> String {
    let bond = &detail.bond;
    let scores = &detail.scores;
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", or_default(Some(bond.issuer_name.as_str()), MISSING)));
    out.push_str(&format!("Use of proceeds: {}\n\n", bond.use_of_proceeds));

    out.push_str("Bond metadata:\n");
    out.push_str(&format!("- Bond ID: {}\n", or_default(Some(bond.id.as_str()), MISSING)));
    out.push_str(&format!("- ISIN: {}\n", or_default(bond.isin.as_deref(), MISSING)));
    out.push_str(&format!(
        "- Dataset: {}\n",
        or_default(bond.source_dataset.as_deref(), MISSING)
    ));
    out.push_str(&format!("- Amount issued: {}\n", amount_label(bond)));
    out.push_str(&format!("- Issue → Maturity: {}\n", year_span(bond)));
    out.push_str(&format!(
        "- External review: {}\n",
        or_default(bond.external_review_type.as_deref(), "None")
    ));
    out.push_str(&format!(
        "- Certification: {}\n\n",
        or_default(bond.certification.as_deref(), "None")
    ));

    out.push_str(&format!("Impact (mode: {}):\n", mode.display_name()));
    for line in impact_lines(impact) {
        out.push_str(&format!("  {line}\n"));
    }
    out.push('\n');

    out.push_str(&format!("Transparency score: {:.2} / 100\n", scores.transparency_score));
    if let Some(components) = &scores.components {
        for line in component_lines(components) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "Greenwashing risk: {}\n",
        scores
            .greenwashing_risk
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| MISSING.to_string())
    ));

    out
}

pub fn format_analysis(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("=== Analysis Results ===\n");
    out.push_str(&format!("Mode used: {}\n", result.mode.as_str()));
    out.push_str(&format!("Transparency score: {:.2}\n", result.transparency_score));
    out.push_str(&format!("Rule-based score: {}\n", fmt2(result.rule_based_score)));
    if let Some(ml) = result.ml_score {
        out.push_str(&format!("ML score: {ml:.2}\n"));
    }
    if let Some(components) = &result.components {
        for line in component_lines(components) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "Risk: {}\n",
        result
            .greenwashing_risk
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| MISSING.to_string())
    ));

    if let Some(impact) = &result.impact_prediction {
        out.push_str(&format!(
            "Impact: Claims {} → Predicted {}\n",
            fmt2(impact.claimed),
            fmt2(impact.predicted)
        ));
    }

    if !result.explanations.is_empty() {
        out.push_str("\nWhy?\n");
        for ex in &result.explanations {
            out.push_str(&format!("- {ex}\n"));
        }
    }
    out
}

/// Period and annualized return lines, or the insufficient-data note.
pub fn returns_lines(horizon: Horizon, returns: &Returns) -> Vec<String> {
    if returns.is_insufficient() {
        return vec!["Not enough data to compute returns.".to_string()];
    }
    let mut lines = Vec::new();
    if let Some(p) = returns.period_return {
        lines.push(format!("Price return ({}): {p:.2}%", horizon.label()));
    }
    if let Some(a) = returns.annualized_return {
        lines.push(format!("Annualized return ({PRICE_ONLY_LABEL}): {a:.2}%"));
    }
    lines
}

/// Latest price and yields; nothing for a missing snapshot.
pub fn summary_lines(summary: Option<&MarketSummary>) -> Vec<String> {
    let Some(s) = summary else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(price) = s.price {
        let date = s.date.map(|d| d.to_string()).unwrap_or_else(|| MISSING.to_string());
        lines.push(format!("Latest price: {price:.2} (as of {date})"));
    }
    if let Some(ytm) = s.yield_to_maturity {
        lines.push(format!("Yield to maturity: {ytm:.2}%"));
    }
    if let Some(ytw) = s.yield_to_worst {
        lines.push(format!("Yield to worst: {ytw:.2}%"));
    }
    lines
}

pub fn format_market(
    instrument: Instrument,
    horizon: Horizon,
    points: usize,
    returns: &Returns,
    summary: Option<&MarketSummary>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ({}) ===\n", instrument.label, horizon.label()));
    if points == 0 {
        out.push_str("Market data not available yet.\n");
    } else {
        out.push_str(&format!("Points: {points}\n"));
    }
    for line in returns_lines(horizon, returns) {
        out.push_str(&line);
        out.push('\n');
    }
    for line in summary_lines(summary) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BondRecord, ImpactSource, RiskLevel, ScoreBundle};
    use chrono::NaiveDate;

    fn bond(id: &str, issuer: &str) -> BondRecord {
        BondRecord {
            id: id.to_string(),
            issuer_name: issuer.to_string(),
            currency: "EUR".to_string(),
            use_of_proceeds: "Renewable energy".to_string(),
            ..BondRecord::default()
        }
    }

    #[test]
    fn bond_list_reports_counts_and_rows() {
        let bonds = vec![bond("GB-1", "Acme Power"), bond("GB-2", "Borealis")];
        let filtered = FilteredBonds::new(&bonds, "acme");
        let text = format_bond_list(&filtered);
        assert!(text.starts_with("Showing 1 of 1 matching bonds\n"));
        assert!(text.contains("GB-1"));
        assert!(!text.contains("GB-2"));
        assert!(text.contains("Renewable energy"));
    }

    #[test]
    fn model_sourced_impact_is_annotated() {
        let impact = ImpactEstimate {
            claimed: Some(1000.0),
            predicted: Some(850.0),
            uncertainty: Some(120.0),
            gap: None,
            source: Some(ImpactSource::MlFallback),
        };
        let lines = impact_lines(Some(&impact));
        assert_eq!(lines[0], "Claims 1000.00 tons CO₂");
        assert_eq!(
            lines[1],
            "Predicted 850.00 tons CO₂/year ± 120.00 (ML intensity model)"
        );

        let rule = ImpactEstimate {
            source: Some(ImpactSource::Rule),
            claimed: None,
            uncertainty: None,
            ..impact
        };
        assert_eq!(impact_lines(Some(&rule)), ["Predicted 850.00 tons CO₂/year"]);
        assert_eq!(impact_lines(None), ["No impact prediction available."]);
    }

    #[test]
    fn detail_shows_metadata_fallbacks() {
        let detail = BondDetail {
            bond: bond("GB-1", "Acme Power"),
            scores: ScoreBundle {
                transparency_score: 72.5,
                greenwashing_risk: Some(RiskLevel::Label("low".to_string())),
                ..ScoreBundle::default()
            },
        };
        let text = format_bond_detail(&detail, Mode::Rule, None);
        assert!(text.contains("- ISIN: —"));
        assert!(text.contains("- External review: None"));
        assert!(text.contains("Transparency score: 72.50 / 100"));
        assert!(text.contains("Greenwashing risk: low"));
        assert!(text.contains("No impact prediction available."));
    }

    #[test]
    fn analysis_lists_explanations() {
        let result = AnalysisResult {
            mode: Mode::Blend,
            transparency_score: 61.0,
            rule_based_score: None,
            ml_score: Some(58.25),
            greenwashing_risk: Some(RiskLevel::Score(0.4)),
            impact_prediction: None,
            explanations: vec!["No external review.".to_string()],
            components: None,
        };
        let text = format_analysis(&result);
        assert!(text.contains("Mode used: blend"));
        assert!(text.contains("Rule-based score: —"));
        assert!(text.contains("ML score: 58.25"));
        assert!(text.contains("Risk: 0.40"));
        assert!(text.contains("- No external review."));
    }

    #[test]
    fn market_labels_price_only_proxy() {
        let returns = Returns {
            period_return: Some(10.0),
            annualized_return: Some(10.0),
        };
        let summary = MarketSummary {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            price: Some(52.1),
            yield_to_maturity: Some(3.456),
            yield_to_worst: None,
        };
        let text = format_market(
            Instrument::find("grnb").unwrap(),
            Horizon::OneYear,
            250,
            &returns,
            Some(&summary),
        );
        assert!(text.contains("Price return (1Y): 10.00%"));
        assert!(text.contains("Annualized return (price-only proxy): 10.00%"));
        assert!(text.contains("Latest price: 52.10 (as of 2024-05-01)"));
        assert!(text.contains("Yield to maturity: 3.46%"));
        assert!(!text.contains("Yield to worst"));
    }

    #[test]
    fn market_without_data_degrades() {
        let text = format_market(
            Instrument::find("bgrn").unwrap(),
            Horizon::ThreeMonths,
            0,
            &Returns::default(),
            None,
        );
        assert!(text.contains("Market data not available yet."));
        assert!(text.contains("Not enough data to compute returns."));
    }
}
