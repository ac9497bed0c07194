//! Bond browsing: listing, search, selection, detail, and rule recompute.
//!
//! Flow:
//!
//! - `select(id)` clears the previous detail and issues a detail ticket
//! - `apply_detail` stores the detail; in rule mode it also hands back a
//!   recompute ticket
//! - `apply_rule` patches only `scores.impact_prediction` of the stored detail
//!
//! Detail responses must match the current selection, and recompute responses
//! additionally require rule mode to still be active.

use crate::analytics::{FilteredBonds, choose_impact};
use crate::data::PrismApi;
use crate::domain::{BondDetail, BondRecord, ImpactEstimate, Mode, RuleRecompute};
use crate::error::ApiError;

use super::{RequestGate, Resolution, Ticket};

/// Loading state of the bond listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Ready,
    Unavailable(String),
}

/// Outcome of [`BondSession::apply_detail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailApplied {
    pub resolution: Resolution,
    /// Follow-up rule recompute to send, if rule mode is active.
    pub recompute: Option<Ticket<String>>,
}

#[derive(Debug, Clone)]
pub struct BondSession {
    bonds: Vec<BondRecord>,
    list_state: ListState,
    query: String,
    selected: Option<String>,
    detail: Option<BondDetail>,
    detail_error: Option<String>,
    impact_mode: Mode,
    list_gate: RequestGate<usize>,
    detail_gate: RequestGate<String>,
    rule_gate: RequestGate<String>,
}

impl Default for BondSession {
    fn default() -> Self {
        Self::new(Mode::Rule)
    }
}

impl BondSession {
    pub fn new(impact_mode: Mode) -> Self {
        Self {
            bonds: Vec::new(),
            list_state: ListState::Idle,
            query: String::new(),
            selected: None,
            detail: None,
            detail_error: None,
            impact_mode,
            list_gate: RequestGate::new(),
            detail_gate: RequestGate::new(),
            rule_gate: RequestGate::new(),
        }
    }

    pub fn bonds(&self) -> &[BondRecord] {
        &self.bonds
    }

    pub fn list_state(&self) -> &ListState {
        &self.list_state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn detail(&self) -> Option<&BondDetail> {
        self.detail.as_ref()
    }

    /// Why the last detail fetch for the current selection failed, if it did.
    pub fn detail_error(&self) -> Option<&str> {
        self.detail_error.as_deref()
    }

    pub fn impact_mode(&self) -> Mode {
        self.impact_mode
    }

    pub fn is_detail_loading(&self) -> bool {
        self.selected.is_some() && self.detail.is_none() && self.detail_error.is_none()
    }

    // ---- listing ----

    pub fn request_list(&mut self, limit: usize) -> Ticket<usize> {
        self.list_state = ListState::Loading;
        self.list_gate.issue(limit)
    }

    pub fn apply_list(
        &mut self,
        ticket: &Ticket<usize>,
        result: Result<Vec<BondRecord>, ApiError>,
    ) -> Resolution {
        if !self.list_gate.is_current(ticket) {
            return Resolution::Discarded;
        }
        match result {
            Ok(bonds) => {
                tracing::info!(count = bonds.len(), "bond list loaded");
                self.bonds = bonds;
                self.list_state = ListState::Ready;
                Resolution::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "bond list unavailable");
                let reason = err.to_string();
                self.list_state = ListState::Unavailable(reason.clone());
                Resolution::Degraded(reason)
            }
        }
    }

    // ---- search ----

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
    }

    /// Current search results (first 200 shown, full count kept).
    pub fn visible(&self) -> FilteredBonds<'_> {
        FilteredBonds::new(&self.bonds, &self.query)
    }

    // ---- selection / detail ----

    /// Select a bond. Returns the detail request to send, or `None` when the
    /// bond is already selected.
    pub fn select(&mut self, bond_id: &str) -> Option<Ticket<String>> {
        if self.selected.as_deref() == Some(bond_id) {
            return None;
        }
        self.selected = Some(bond_id.to_string());
        self.detail = None;
        self.detail_error = None;
        self.rule_gate.clear();
        Some(self.detail_gate.issue(bond_id.to_string()))
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.detail = None;
        self.detail_error = None;
        self.detail_gate.clear();
        self.rule_gate.clear();
    }

    pub fn apply_detail(
        &mut self,
        ticket: &Ticket<String>,
        result: Result<BondDetail, ApiError>,
    ) -> DetailApplied {
        if !self.detail_gate.is_current(ticket) || self.selected.as_ref() != Some(ticket.key()) {
            tracing::debug!(bond_id = %ticket.key(), "stale bond detail discarded");
            return DetailApplied {
                resolution: Resolution::Discarded,
                recompute: None,
            };
        }

        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.detail_error = None;
                DetailApplied {
                    resolution: Resolution::Applied,
                    recompute: self.issue_recompute(),
                }
            }
            Err(err) => {
                tracing::warn!(bond_id = %ticket.key(), error = %err, "bond detail unavailable");
                let reason = err.to_string();
                self.detail_error = Some(reason.clone());
                DetailApplied {
                    resolution: Resolution::Degraded(reason),
                    recompute: None,
                }
            }
        }
    }

    // ---- impact mode / rule recompute ----

    /// Switch the impact mode. Entering rule mode with a loaded detail returns
    /// a recompute request; leaving it invalidates any in-flight recompute.
    pub fn set_impact_mode(&mut self, mode: Mode) -> Option<Ticket<String>> {
        if mode == self.impact_mode {
            return None;
        }
        self.impact_mode = mode;
        if mode == Mode::Rule {
            self.issue_recompute()
        } else {
            self.rule_gate.clear();
            None
        }
    }

    fn issue_recompute(&mut self) -> Option<Ticket<String>> {
        if self.impact_mode != Mode::Rule || self.detail.is_none() {
            return None;
        }
        let id = self.selected.clone()?;
        Some(self.rule_gate.issue(id))
    }

    /// Apply a rule recompute. Only `scores.impact_prediction` is replaced;
    /// the ML estimate and every other score are left as fetched.
    pub fn apply_rule(
        &mut self,
        ticket: &Ticket<String>,
        result: Result<RuleRecompute, ApiError>,
    ) -> Resolution {
        let still_wanted = self.rule_gate.is_current(ticket)
            && self.impact_mode == Mode::Rule
            && self.selected.as_ref() == Some(ticket.key());
        let Some(detail) = self.detail.as_mut().filter(|_| still_wanted) else {
            tracing::debug!(bond_id = %ticket.key(), "stale rule recompute discarded");
            return Resolution::Discarded;
        };

        match result {
            Ok(RuleRecompute {
                impact_prediction_rule: Some(estimate),
            }) => {
                detail.scores.impact_prediction = Some(estimate);
                Resolution::Applied
            }
            Ok(RuleRecompute {
                impact_prediction_rule: None,
            }) => Resolution::Degraded("rule recompute returned no estimate".to_string()),
            Err(err) => {
                tracing::warn!(bond_id = %ticket.key(), error = %err, "rule recompute unavailable");
                Resolution::Degraded(err.to_string())
            }
        }
    }

    /// The impact estimate to display for the current detail and mode.
    pub fn impact(&self) -> Option<ImpactEstimate> {
        let scores = &self.detail.as_ref()?.scores;
        choose_impact(
            scores.impact_prediction.as_ref(),
            scores.impact_prediction_ml.as_ref(),
            self.impact_mode,
        )
    }
}

pub async fn load_list(
    api: &dyn PrismApi,
    ticket: Ticket<usize>,
) -> (Ticket<usize>, Result<Vec<BondRecord>, ApiError>) {
    let result = api.list_bonds(*ticket.key()).await;
    (ticket, result)
}

pub async fn load_detail(
    api: &dyn PrismApi,
    ticket: Ticket<String>,
) -> (Ticket<String>, Result<BondDetail, ApiError>) {
    let result = api.bond_detail(ticket.key()).await;
    (ticket, result)
}

pub async fn load_rule(
    api: &dyn PrismApi,
    ticket: Ticket<String>,
) -> (Ticket<String>, Result<RuleRecompute, ApiError>) {
    let result = api.compute_rule(ticket.key()).await;
    (ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImpactSource, ScoreBundle};
    use crate::session::fake::FakeApi;

    fn detail(id: &str, rule: Option<ImpactEstimate>, ml: Option<ImpactEstimate>) -> BondDetail {
        BondDetail {
            bond: BondRecord {
                id: id.to_string(),
                issuer_name: format!("Issuer {id}"),
                ..BondRecord::default()
            },
            scores: ScoreBundle {
                transparency_score: 60.0,
                impact_prediction: rule,
                impact_prediction_ml: ml,
                ..ScoreBundle::default()
            },
        }
    }

    fn predicted(v: f64) -> ImpactEstimate {
        ImpactEstimate {
            predicted: Some(v),
            ..ImpactEstimate::default()
        }
    }

    #[test]
    fn late_detail_for_previous_selection_is_dropped() {
        let mut s = BondSession::new(Mode::Ml);
        let a = s.select("A").unwrap();
        let b = s.select("B").unwrap();

        let applied_b = s.apply_detail(&b, Ok(detail("B", None, None)));
        assert_eq!(applied_b.resolution, Resolution::Applied);

        let applied_a = s.apply_detail(&a, Ok(detail("A", None, None)));
        assert_eq!(applied_a.resolution, Resolution::Discarded);
        assert_eq!(s.detail().unwrap().bond.id, "B");
    }

    #[test]
    fn early_detail_for_previous_selection_is_dropped() {
        let mut s = BondSession::new(Mode::Ml);
        let a = s.select("A").unwrap();
        let b = s.select("B").unwrap();

        assert_eq!(s.apply_detail(&a, Ok(detail("A", None, None))).resolution, Resolution::Discarded);
        assert!(s.detail().is_none());
        assert!(s.is_detail_loading());

        s.apply_detail(&b, Ok(detail("B", None, None)));
        assert_eq!(s.detail().unwrap().bond.id, "B");
    }

    #[test]
    fn reselecting_same_bond_sends_nothing() {
        let mut s = BondSession::default();
        assert!(s.select("A").is_some());
        assert!(s.select("A").is_none());
    }

    #[test]
    fn detail_failure_degrades() {
        let mut s = BondSession::new(Mode::Ml);
        let t = s.select("A").unwrap();
        let err = ApiError::Status {
            endpoint: "bond_detail".into(),
            status: 404,
        };
        let applied = s.apply_detail(&t, Err(err));
        assert!(matches!(applied.resolution, Resolution::Degraded(_)));
        assert!(s.detail().is_none());
        assert!(s.detail_error().is_some());
        assert!(!s.is_detail_loading());
    }

    #[test]
    fn rule_mode_requests_recompute_after_detail() {
        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let applied = s.apply_detail(&t, Ok(detail("X", None, None)));
        let recompute = applied.recompute.unwrap();
        assert_eq!(recompute.key(), "X");

        let mut ml = BondSession::new(Mode::Ml);
        let t = ml.select("X").unwrap();
        assert!(ml.apply_detail(&t, Ok(detail("X", None, None))).recompute.is_none());
    }

    #[test]
    fn recompute_patches_only_rule_estimate() {
        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let r = s
            .apply_detail(&t, Ok(detail("X", Some(predicted(1.0)), Some(predicted(9.0)))))
            .recompute
            .unwrap();

        let res = s.apply_rule(
            &r,
            Ok(RuleRecompute {
                impact_prediction_rule: Some(predicted(5.0)),
            }),
        );
        assert_eq!(res, Resolution::Applied);

        let scores = &s.detail().unwrap().scores;
        assert_eq!(scores.impact_prediction.as_ref().unwrap().predicted, Some(5.0));
        assert_eq!(scores.impact_prediction_ml.as_ref().unwrap().predicted, Some(9.0));
        assert_eq!(scores.transparency_score, 60.0);
    }

    #[test]
    fn recompute_dropped_after_leaving_rule_mode() {
        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let r = s
            .apply_detail(&t, Ok(detail("X", None, Some(predicted(9.0)))))
            .recompute
            .unwrap();

        assert!(s.set_impact_mode(Mode::Ml).is_none());
        let res = s.apply_rule(
            &r,
            Ok(RuleRecompute {
                impact_prediction_rule: Some(predicted(5.0)),
            }),
        );
        assert_eq!(res, Resolution::Discarded);
        assert!(s.detail().unwrap().scores.impact_prediction.is_none());

        // Back in rule mode a fresh recompute is issued.
        let again = s.set_impact_mode(Mode::Rule).unwrap();
        assert_eq!(again.key(), "X");
        assert!(again.generation() > r.generation());
    }

    #[test]
    fn recompute_dropped_after_deselect() {
        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let r = s.apply_detail(&t, Ok(detail("X", None, None))).recompute.unwrap();
        s.deselect();
        let res = s.apply_rule(
            &r,
            Ok(RuleRecompute {
                impact_prediction_rule: Some(predicted(5.0)),
            }),
        );
        assert_eq!(res, Resolution::Discarded);
        assert!(s.detail().is_none());
    }

    #[test]
    fn recompute_failure_keeps_existing_estimate() {
        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let r = s
            .apply_detail(&t, Ok(detail("X", Some(predicted(1.0)), None)))
            .recompute
            .unwrap();
        let res = s.apply_rule(
            &r,
            Err(ApiError::Transport {
                endpoint: "compute_rule".into(),
                reason: "connection refused".into(),
            }),
        );
        assert!(matches!(res, Resolution::Degraded(_)));
        assert_eq!(s.impact().unwrap().predicted, Some(1.0));
    }

    #[test]
    fn list_failure_is_reported_not_raised() {
        let mut s = BondSession::default();
        let t = s.request_list(5000);
        assert_eq!(s.list_state(), &ListState::Loading);
        let res = s.apply_list(
            &t,
            Err(ApiError::Transport {
                endpoint: "bonds".into(),
                reason: "timeout".into(),
            }),
        );
        assert!(matches!(res, Resolution::Degraded(_)));
        assert!(matches!(s.list_state(), ListState::Unavailable(_)));
        assert!(s.bonds().is_empty());
    }

    #[test]
    fn search_filters_loaded_list() {
        let mut s = BondSession::default();
        let t = s.request_list(10);
        s.apply_list(
            &t,
            Ok(vec![
                BondRecord {
                    id: "GB-1".into(),
                    issuer_name: "Orsted".into(),
                    ..BondRecord::default()
                },
                BondRecord {
                    id: "GB-2".into(),
                    issuer_name: "Iberdrola".into(),
                    ..BondRecord::default()
                },
            ]),
        );
        s.set_query("ORS");
        let view = s.visible();
        assert_eq!(view.total, 1);
        assert_eq!(view.shown[0].id, "GB-1");
        s.pop_query_char();
        s.pop_query_char();
        s.pop_query_char();
        assert_eq!(s.visible().total, 2);
    }

    #[tokio::test]
    async fn rule_mode_end_to_end_with_recompute() {
        let api = FakeApi::default()
            .with_detail(detail("X", None, None))
            .with_rule(
                "X",
                RuleRecompute {
                    impact_prediction_rule: Some(predicted(42.0)),
                },
            );

        let mut s = BondSession::new(Mode::Rule);
        let t = s.select("X").unwrap();
        let (t, res) = load_detail(&api, t).await;
        let applied = s.apply_detail(&t, res);
        assert_eq!(applied.resolution, Resolution::Applied);
        assert!(s.detail().unwrap().scores.impact_prediction.is_none());
        assert!(s.impact().is_none());

        let (r, res) = load_rule(&api, applied.recompute.unwrap()).await;
        assert_eq!(s.apply_rule(&r, res), Resolution::Applied);

        let impact = s.impact().unwrap();
        assert_eq!(impact.predicted, Some(42.0));
        assert_eq!(impact.source, Some(ImpactSource::Rule));
    }

    #[tokio::test]
    async fn list_loads_through_api() {
        let api = FakeApi::default().with_bonds(vec![BondRecord {
            id: "GB-1".into(),
            ..BondRecord::default()
        }]);
        let mut s = BondSession::default();
        let t = s.request_list(5000);
        let (t, res) = load_list(&api, t).await;
        assert_eq!(s.apply_list(&t, res), Resolution::Applied);
        assert_eq!(s.bonds().len(), 1);
        assert_eq!(api.last_limit(), Some(5000));
    }
}
