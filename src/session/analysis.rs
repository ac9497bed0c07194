//! Ad-hoc disclosure text analysis.

use crate::data::PrismApi;
use crate::domain::{AnalysisResult, AnalyzeRequest, Mode};
use crate::error::AnalysisFailed;

use super::{RequestGate, Resolution, Ticket};

/// Parse the free-form "claimed tons" input.
///
/// Empty, non-numeric, or non-finite input is dropped from the request rather
/// than rejected.
pub fn parse_claimed(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(input = trimmed, "ignoring non-numeric claimed impact");
            None
        }
    }
}

/// Send one analysis request. Failures are not retried.
pub async fn analyze(
    api: &dyn PrismApi,
    text: &str,
    claimed_tons: Option<f64>,
    mode: Option<Mode>,
) -> Result<AnalysisResult, AnalysisFailed> {
    let request = AnalyzeRequest::new(text, claimed_tons, mode);
    api.analyze_text(&request).await.map_err(AnalysisFailed)
}

/// Perform the request described by a ticket from [`AnalysisSession::submit`].
pub async fn load_analysis(
    api: &dyn PrismApi,
    ticket: Ticket<AnalyzeRequest>,
) -> (Ticket<AnalyzeRequest>, Result<AnalysisResult, AnalysisFailed>) {
    let result = api.analyze_text(ticket.key()).await.map_err(AnalysisFailed);
    (ticket, result)
}

/// Form state for the analyzer: input text, claimed value, mode, and the
/// last result.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    text: String,
    claimed_input: String,
    mode: Mode,
    loading: bool,
    result: Option<AnalysisResult>,
    failure: Option<String>,
    gate: RequestGate<AnalyzeRequest>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn push_text_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn pop_text_char(&mut self) {
        self.text.pop();
    }

    pub fn claimed_input(&self) -> &str {
        &self.claimed_input
    }

    pub fn set_claimed_input(&mut self, input: impl Into<String>) {
        self.claimed_input = input.into();
    }

    pub fn push_claimed_char(&mut self, c: char) {
        self.claimed_input.push(c);
    }

    pub fn pop_claimed_char(&mut self) {
        self.claimed_input.pop();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// User-facing failure notice from the last attempt.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn dismiss_failure(&mut self) {
        self.failure = None;
    }

    /// Submission is blocked while a request is in flight or the text is blank.
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.text.trim().is_empty()
    }

    /// Start an analysis. Clears the previous result and returns the request
    /// to send, or `None` when submission is blocked.
    pub fn submit(&mut self) -> Option<Ticket<AnalyzeRequest>> {
        if !self.can_submit() {
            return None;
        }
        let request = AnalyzeRequest::new(
            self.text.clone(),
            parse_claimed(&self.claimed_input),
            Some(self.mode),
        );
        self.loading = true;
        self.result = None;
        self.failure = None;
        Some(self.gate.issue(request))
    }

    pub fn apply(
        &mut self,
        ticket: &Ticket<AnalyzeRequest>,
        result: Result<AnalysisResult, AnalysisFailed>,
    ) -> Resolution {
        if !self.gate.is_current(ticket) {
            return Resolution::Discarded;
        }
        self.loading = false;
        match result {
            Ok(res) => {
                self.result = Some(res);
                Resolution::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "text analysis failed");
                let notice = err.to_string();
                self.failure = Some(notice.clone());
                Resolution::Degraded(notice)
            }
        }
    }
}
