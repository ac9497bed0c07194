//! Market data for reference instruments: price series + latest summary,
//! keyed by (instrument, horizon).

use crate::analytics::{Returns, compute_returns};
use crate::data::PrismApi;
use crate::domain::{DEFAULT_INSTRUMENT, Horizon, INSTRUMENTS, MarketSummary, PricePoint};

use super::{RequestGate, Resolution, Ticket};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketKey {
    pub instrument: String,
    pub horizon: Horizon,
}

impl MarketKey {
    pub fn new(instrument: impl Into<String>, horizon: Horizon) -> Self {
        Self {
            instrument: instrument.into(),
            horizon,
        }
    }

    pub fn days(&self) -> u32 {
        self.horizon.days()
    }
}

impl Default for MarketKey {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUMENT, Horizon::default())
    }
}

/// The two independent requests issued for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRequests {
    pub series: Ticket<MarketKey>,
    pub summary: Ticket<MarketKey>,
}

/// Fetch a price series. Any failure degrades to an empty series.
pub async fn fetch_series(api: &dyn PrismApi, instrument: &str, days: u32) -> Vec<PricePoint> {
    match api.price_series(instrument, days).await {
        Ok(mut prices) => {
            if !prices.is_sorted_by_key(|p| p.time) {
                tracing::debug!(instrument, "price series out of order; sorting");
                prices.sort_by_key(|p| p.time);
            }
            prices
        }
        Err(err) => {
            tracing::warn!(instrument, days, error = %err, "price series unavailable");
            Vec::new()
        }
    }
}

/// Fetch the latest market snapshot. Any failure (or a missing `latest`)
/// resolves to `None`.
pub async fn fetch_summary(api: &dyn PrismApi, instrument: &str, days: u32) -> Option<MarketSummary> {
    match api.series_summary(instrument, days).await {
        Ok(summary) => summary.latest,
        Err(err) => {
            tracing::warn!(instrument, days, error = %err, "market summary unavailable");
            None
        }
    }
}

pub async fn load_series(
    api: &dyn PrismApi,
    ticket: Ticket<MarketKey>,
) -> (Ticket<MarketKey>, Vec<PricePoint>) {
    let key = ticket.key();
    let prices = fetch_series(api, &key.instrument, key.days()).await;
    (ticket, prices)
}

pub async fn load_summary(
    api: &dyn PrismApi,
    ticket: Ticket<MarketKey>,
) -> (Ticket<MarketKey>, Option<MarketSummary>) {
    let key = ticket.key();
    let summary = fetch_summary(api, &key.instrument, key.days()).await;
    (ticket, summary)
}

/// Run both requests concurrently.
pub async fn load_both(
    api: &dyn PrismApi,
    requests: MarketRequests,
) -> (
    (Ticket<MarketKey>, Vec<PricePoint>),
    (Ticket<MarketKey>, Option<MarketSummary>),
) {
    tokio::join!(load_series(api, requests.series), load_summary(api, requests.summary))
}

#[derive(Debug, Clone, Default)]
pub struct MarketSession {
    key: Option<MarketKey>,
    prices: Vec<PricePoint>,
    series_loaded: bool,
    summary: Option<MarketSummary>,
    series_gate: RequestGate<MarketKey>,
    summary_gate: RequestGate<MarketKey>,
}

impl MarketSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&MarketKey> {
        self.key.as_ref()
    }

    /// Price series for the current key (empty while loading or on failure).
    pub fn prices(&self) -> &[PricePoint] {
        &self.prices
    }

    pub fn summary(&self) -> Option<&MarketSummary> {
        self.summary.as_ref()
    }

    pub fn is_series_loading(&self) -> bool {
        self.key.is_some() && !self.series_loaded
    }

    /// Returns over the current series, annualized with the horizon the
    /// series was requested for.
    pub fn returns(&self) -> Returns {
        match &self.key {
            Some(key) => compute_returns(&self.prices, key.days()),
            None => Returns::default(),
        }
    }

    /// Point the view at a new (instrument, horizon). Returns both requests to
    /// send, or `None` when the key did not change.
    pub fn select(&mut self, key: MarketKey) -> Option<MarketRequests> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }
        self.key = Some(key.clone());
        self.prices.clear();
        self.series_loaded = false;
        self.summary = None;
        Some(MarketRequests {
            series: self.series_gate.issue(key.clone()),
            summary: self.summary_gate.issue(key),
        })
    }

    /// Switch instrument, keeping the horizon.
    pub fn select_instrument(&mut self, instrument: &str) -> Option<MarketRequests> {
        let horizon = self.key.as_ref().map(|k| k.horizon).unwrap_or_default();
        self.select(MarketKey::new(instrument, horizon))
    }

    /// Switch horizon, keeping the instrument.
    pub fn select_horizon(&mut self, horizon: Horizon) -> Option<MarketRequests> {
        let instrument = self
            .key
            .as_ref()
            .map(|k| k.instrument.clone())
            .unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string());
        self.select(MarketKey::new(instrument, horizon))
    }

    /// Cycle through the known instruments.
    pub fn next_instrument(&mut self) -> Option<MarketRequests> {
        let current = self
            .key
            .as_ref()
            .map(|k| k.instrument.as_str())
            .unwrap_or(DEFAULT_INSTRUMENT);
        let idx = INSTRUMENTS.iter().position(|i| i.id == current).unwrap_or(0);
        let next = INSTRUMENTS[(idx + 1) % INSTRUMENTS.len()];
        self.select_instrument(next.id)
    }

    /// Leave the market view: drop data and ignore anything still in flight.
    pub fn reset(&mut self) {
        self.key = None;
        self.prices.clear();
        self.series_loaded = false;
        self.summary = None;
        self.series_gate.clear();
        self.summary_gate.clear();
    }

    pub fn apply_series(&mut self, ticket: &Ticket<MarketKey>, prices: Vec<PricePoint>) -> Resolution {
        if !self.series_gate.is_current(ticket) {
            tracing::debug!(instrument = %ticket.key().instrument, "stale price series discarded");
            return Resolution::Discarded;
        }
        self.series_loaded = true;
        self.prices = prices;
        if self.prices.is_empty() {
            Resolution::Degraded("market data not available".to_string())
        } else {
            Resolution::Applied
        }
    }

    pub fn apply_summary(
        &mut self,
        ticket: &Ticket<MarketKey>,
        summary: Option<MarketSummary>,
    ) -> Resolution {
        if !self.summary_gate.is_current(ticket) {
            tracing::debug!(instrument = %ticket.key().instrument, "stale market summary discarded");
            return Resolution::Discarded;
        }
        self.summary = summary;
        if self.summary.is_some() {
            Resolution::Applied
        } else {
            Resolution::Degraded("market summary not available".to_string())
        }
    }
}
