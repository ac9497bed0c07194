//! HTTP+JSON client for the bond/market backend.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::domain::{
    AnalysisResult, AnalyzeRequest, BondDetail, BondRecord, PricePoint, RuleRecompute,
    SeriesSummary,
};
use crate::error::{ApiError, AppError};

/// The six endpoints the client consumes.
///
/// Every call may fail; callers decide how a failure degrades.
#[async_trait]
pub trait PrismApi: Send + Sync {
    /// `GET /bonds?limit=N`
    async fn list_bonds(&self, limit: usize) -> Result<Vec<BondRecord>, ApiError>;

    /// `GET /bonds/{id}`
    async fn bond_detail(&self, bond_id: &str) -> Result<BondDetail, ApiError>;

    /// `GET /bonds/{id}/compute_rule`
    async fn compute_rule(&self, bond_id: &str) -> Result<RuleRecompute, ApiError>;

    /// `POST /analyze_text`
    async fn analyze_text(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ApiError>;

    /// `GET /market/{instrument}?days=N`
    async fn price_series(&self, instrument: &str, days: u32) -> Result<Vec<PricePoint>, ApiError>;

    /// `GET /market/series/{instrument}?days=N`
    async fn series_summary(&self, instrument: &str, days: u32) -> Result<SeriesSummary, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    http: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let base_url = Url::parse(settings.api_base.trim())
            .map_err(|e| AppError::new(2, format!("Invalid API base URL '{}': {e}", settings.api_base)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::new(
                2,
                format!("API base URL cannot carry paths: {}", settings.api_base),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = settings.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Append path segments to the base URL. Segments are percent-encoded, so
    /// bond ids with `/` or spaces stay a single segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, %url, "GET");
        let request = self.http.get(url).query(query);
        self.send_json(endpoint, request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let res = request.send().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = res.text().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        decode(endpoint, &text)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, text: &str) -> Result<T, ApiError> {
    serde_json::from_str::<T>(text).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl PrismApi for HttpApi {
    async fn list_bonds(&self, limit: usize) -> Result<Vec<BondRecord>, ApiError> {
        self.get_json("bonds", self.url(&["bonds"]), &[("limit", limit.to_string())])
            .await
    }

    async fn bond_detail(&self, bond_id: &str) -> Result<BondDetail, ApiError> {
        self.get_json("bond_detail", self.url(&["bonds", bond_id]), &[])
            .await
    }

    async fn compute_rule(&self, bond_id: &str) -> Result<RuleRecompute, ApiError> {
        self.get_json("compute_rule", self.url(&["bonds", bond_id, "compute_rule"]), &[])
            .await
    }

    async fn analyze_text(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ApiError> {
        let url = self.url(&["analyze_text"]);
        tracing::debug!(endpoint = "analyze_text", %url, mode = request.mode.as_str(), "POST");
        let builder = self.http.post(url).json(request);
        self.send_json("analyze_text", builder).await
    }

    async fn price_series(&self, instrument: &str, days: u32) -> Result<Vec<PricePoint>, ApiError> {
        self.get_json(
            "market",
            self.url(&["market", instrument]),
            &[("days", days.to_string())],
        )
        .await
    }

    async fn series_summary(&self, instrument: &str, days: u32) -> Result<SeriesSummary, ApiError> {
        self.get_json(
            "market_series",
            self.url(&["market", "series", instrument]),
            &[("days", days.to_string())],
        )
        .await
    }
}
