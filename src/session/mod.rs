//! Stateful orchestration of remote data.
//!
//! Each session owns the view state for one area of the client and follows
//! the same pattern:
//!
//! 1. a user action mutates state and returns a [`Ticket`] describing the
//!    request to send (or `None` when nothing needs fetching)
//! 2. the driver performs the request off the UI thread (see the `load_*`
//!    helpers in each module)
//! 3. the response is handed back to the session together with its ticket;
//!    the session applies it only if the ticket is still current
//!
//! State is only ever mutated from the driver's thread, so sessions need no
//! locking.

pub mod analysis;
pub mod bonds;
pub mod market;
pub mod ticket;

pub use analysis::AnalysisSession;
pub use bonds::BondSession;
pub use market::{MarketKey, MarketSession};
pub use ticket::{RequestGate, Ticket};

/// What happened when a response was handed to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The response updated session state.
    Applied,
    /// The request failed; the affected view shows a placeholder.
    Degraded(String),
    /// The response belonged to a superseded request and was dropped.
    Discarded,
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory [`PrismApi`] used by the session tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::data::PrismApi;
    use crate::domain::{
        AnalysisResult, AnalyzeRequest, BondDetail, BondRecord, PricePoint, RuleRecompute,
        SeriesSummary,
    };
    use crate::error::ApiError;

    #[derive(Default)]
    pub struct FakeApi {
        bonds: Vec<BondRecord>,
        bonds_down: bool,
        details: HashMap<String, BondDetail>,
        rules: HashMap<String, RuleRecompute>,
        analysis: Option<AnalysisResult>,
        series: HashMap<(String, u32), Vec<PricePoint>>,
        summaries: HashMap<(String, u32), SeriesSummary>,
        last_limit: Mutex<Option<usize>>,
        analyze_calls: Mutex<Vec<AnalyzeRequest>>,
    }

    fn missing(endpoint: &str) -> ApiError {
        ApiError::Status {
            endpoint: endpoint.to_string(),
            status: 404,
        }
    }

    impl FakeApi {
        /// Listing endpoint answers 503.
        pub fn failing_bonds() -> Self {
            Self {
                bonds_down: true,
                ..Self::default()
            }
        }

        pub fn with_bonds(mut self, bonds: Vec<BondRecord>) -> Self {
            self.bonds = bonds;
            self
        }

        pub fn with_detail(mut self, detail: BondDetail) -> Self {
            self.details.insert(detail.bond.id.clone(), detail);
            self
        }

        pub fn with_rule(mut self, id: &str, rule: RuleRecompute) -> Self {
            self.rules.insert(id.to_string(), rule);
            self
        }

        pub fn with_analysis(mut self, result: AnalysisResult) -> Self {
            self.analysis = Some(result);
            self
        }

        pub fn with_series(mut self, instrument: &str, days: u32, prices: Vec<PricePoint>) -> Self {
            self.series.insert((instrument.to_string(), days), prices);
            self
        }

        pub fn with_summary(mut self, instrument: &str, days: u32, summary: SeriesSummary) -> Self {
            self.summaries.insert((instrument.to_string(), days), summary);
            self
        }

        pub fn last_limit(&self) -> Option<usize> {
            *self.last_limit.lock().unwrap()
        }

        pub fn analyze_calls(&self) -> Vec<AnalyzeRequest> {
            self.analyze_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PrismApi for FakeApi {
        async fn list_bonds(&self, limit: usize) -> Result<Vec<BondRecord>, ApiError> {
            *self.last_limit.lock().unwrap() = Some(limit);
            if self.bonds_down {
                return Err(ApiError::Status {
                    endpoint: "bonds".to_string(),
                    status: 503,
                });
            }
            Ok(self.bonds.iter().take(limit).cloned().collect())
        }

        async fn bond_detail(&self, bond_id: &str) -> Result<BondDetail, ApiError> {
            self.details.get(bond_id).cloned().ok_or_else(|| missing("bond_detail"))
        }

        async fn compute_rule(&self, bond_id: &str) -> Result<RuleRecompute, ApiError> {
            self.rules.get(bond_id).cloned().ok_or_else(|| missing("compute_rule"))
        }

        async fn analyze_text(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ApiError> {
            self.analyze_calls.lock().unwrap().push(request.clone());
            self.analysis.clone().ok_or_else(|| ApiError::Status {
                endpoint: "analyze_text".to_string(),
                status: 500,
            })
        }

        async fn price_series(&self, instrument: &str, days: u32) -> Result<Vec<PricePoint>, ApiError> {
            self.series
                .get(&(instrument.to_string(), days))
                .cloned()
                .ok_or_else(|| missing("market"))
        }

        async fn series_summary(&self, instrument: &str, days: u32) -> Result<SeriesSummary, ApiError> {
            self.summaries
                .get(&(instrument.to_string(), days))
                .cloned()
                .ok_or_else(|| missing("market_series"))
        }
    }
}
