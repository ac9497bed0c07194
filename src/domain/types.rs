//! Shared domain types.
//!
//! These mirror the JSON shapes served by the bond/market backend. They are
//! plain values: sessions own them, nothing holds references across entities,
//! and relationships (bond ↔ detail, instrument ↔ series) are by id.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::lenient;

/// One bond from the listing endpoint. Never mutated after decoding.
///
/// Text fields decode leniently: a missing or non-string value becomes an
/// empty string (or `None` for optional fields) rather than failing the whole
/// listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BondRecord {
    #[serde(rename = "bond_id", default, deserialize_with = "lenient::key")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub issuer_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub use_of_proceeds: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub isin: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub issue_year: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub maturity_year: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub amount_issued: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub amount_issued_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub claimed_impact_co2_tons: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub actual_impact_co2_tons: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub external_review_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub certification: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub source_dataset: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub impact_source: Option<String>,
}

/// Which estimator a chosen [`ImpactEstimate`] came from.
///
/// Assigned by `analytics::impact::choose_impact`; the backend's own labels
/// are not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSource {
    Rule,
    Ml,
    /// Rule mode was requested but only the model estimate existed.
    MlFallback,
}

impl ImpactSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ImpactSource::Rule => "rule",
            ImpactSource::Ml => "ml",
            ImpactSource::MlFallback => "ml_fallback",
        }
    }

    /// Whether the estimate came from the ML intensity model.
    pub fn is_model(self) -> bool {
        matches!(self, ImpactSource::Ml | ImpactSource::MlFallback)
    }
}

/// Claimed vs predicted CO₂ impact (tons).
///
/// `predicted` is optional on the wire: the rule estimator returns all-null
/// fields when it has nothing to go on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactEstimate {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub claimed: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub predicted: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub uncertainty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_source")]
    pub source: Option<ImpactSource>,
}

/// Scoring mode for analysis requests and impact selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Rule,
    Ml,
    Blend,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Rule, Mode::Ml, Mode::Blend];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Rule => "rule",
            Mode::Ml => "ml",
            Mode::Blend => "blend",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Rule => "Rule",
            Mode::Ml => "ML",
            Mode::Blend => "Blend",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Mode::Rule => Mode::Ml,
            Mode::Ml => Mode::Blend,
            Mode::Blend => Mode::Rule,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule" => Ok(Mode::Rule),
            "ml" => Ok(Mode::Ml),
            "blend" => Ok(Mode::Blend),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Greenwashing risk indicator: the backend sends either a label
/// (`"medium"`) or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskLevel {
    Score(f64),
    Label(String),
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Score(v) => write!(f, "{v:.2}"),
            RiskLevel::Label(s) => write!(f, "{s}"),
        }
    }
}

/// Breakdown of the transparency score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransparencyComponents {
    #[serde(default)]
    pub use_of_proceeds_clarity: Option<f64>,
    #[serde(default)]
    pub reporting_practices: Option<f64>,
    #[serde(default)]
    pub verification_strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBundle {
    /// 0–100.
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub transparency_score: f64,
    #[serde(default)]
    pub greenwashing_risk: Option<RiskLevel>,
    #[serde(default)]
    pub impact_prediction: Option<ImpactEstimate>,
    #[serde(default)]
    pub impact_prediction_ml: Option<ImpactEstimate>,
    #[serde(default)]
    pub components: Option<TransparencyComponents>,
}

/// `GET /bonds/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondDetail {
    pub bond: BondRecord,
    pub scores: ScoreBundle,
}

/// `GET /bonds/{id}/compute_rule`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleRecompute {
    #[serde(default)]
    pub impact_prediction_rule: Option<ImpactEstimate>,
}

/// Body of `POST /analyze_text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_impact_co2_tons: Option<f64>,
}

impl AnalyzeRequest {
    /// Build a request; an omitted mode defaults to [`Mode::Rule`].
    pub fn new(text: impl Into<String>, claimed_tons: Option<f64>, mode: Option<Mode>) -> Self {
        Self {
            text: text.into(),
            mode: mode.unwrap_or_default(),
            claimed_impact_co2_tons: claimed_tons,
        }
    }
}

/// Response of an ad-hoc text analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub transparency_score: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rule_based_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ml_score: Option<f64>,
    #[serde(default)]
    pub greenwashing_risk: Option<RiskLevel>,
    #[serde(default)]
    pub impact_prediction: Option<ImpactEstimate>,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub components: Option<TransparencyComponents>,
}

/// One point of a price series. Series are ordered earliest first.
///
/// `value` is not guaranteed positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(deserialize_with = "lenient::date")]
    pub time: NaiveDate,
    pub value: f64,
}

/// Latest market snapshot for an instrument.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub yield_to_maturity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub yield_to_worst: Option<f64>,
}

/// `GET /market/series/{instrument}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SeriesSummary {
    #[serde(default)]
    pub latest: Option<MarketSummary>,
}

/// Nominal look-back window for market data and annualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
}

impl Horizon {
    pub const ALL: [Horizon; 4] = [
        Horizon::ThreeMonths,
        Horizon::SixMonths,
        Horizon::OneYear,
        Horizon::ThreeYears,
    ];

    /// Days used when a label is not recognized.
    pub const DEFAULT_DAYS: u32 = 365;

    pub fn label(self) -> &'static str {
        match self {
            Horizon::ThreeMonths => "3M",
            Horizon::SixMonths => "6M",
            Horizon::OneYear => "1Y",
            Horizon::ThreeYears => "3Y",
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Horizon::ThreeMonths => 90,
            Horizon::SixMonths => 180,
            Horizon::OneYear => 365,
            Horizon::ThreeYears => 365 * 3,
        }
    }

    /// Resolve a label; anything unrecognized maps to the 365-day default.
    pub fn from_label(label: &str) -> Horizon {
        Horizon::ALL
            .into_iter()
            .find(|h| h.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(Horizon::OneYear)
    }

    pub fn next(self) -> Self {
        match self {
            Horizon::ThreeMonths => Horizon::SixMonths,
            Horizon::SixMonths => Horizon::OneYear,
            Horizon::OneYear => Horizon::ThreeYears,
            Horizon::ThreeYears => Horizon::ThreeYears,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Horizon::ThreeMonths => Horizon::ThreeMonths,
            Horizon::SixMonths => Horizon::ThreeMonths,
            Horizon::OneYear => Horizon::SixMonths,
            Horizon::ThreeYears => Horizon::OneYear,
        }
    }
}

/// Reference instrument offered by the market view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub id: &'static str,
    pub label: &'static str,
}

pub const INSTRUMENTS: [Instrument; 2] = [
    Instrument {
        id: "grnb",
        label: "GRNB – VanEck Green Bond ETF",
    },
    Instrument {
        id: "bgrn",
        label: "BGRN – iShares USD Green Bond ETF",
    },
];

pub const DEFAULT_INSTRUMENT: &str = "grnb";

impl Instrument {
    pub fn find(id: &str) -> Option<Instrument> {
        INSTRUMENTS
            .into_iter()
            .find(|i| i.id.eq_ignore_ascii_case(id.trim()))
    }
}
