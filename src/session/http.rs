//! `reqwest` client for the signal backend.

use crate::{
    core::geo::LatLng,
    data::model::{
        CoverageAnalysis, CoverageRequest, RecommendationRequest, RecommendationResponse,
        SignalMeasurement, Tower,
    },
    session::analysis::{AnalysisService, DataSource},
    MapError, Result,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Error body returned by the backend on rejected requests
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// Backend client implementing both [`DataSource`] and [`AnalysisService`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("signalmap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, f64)],
    ) -> Result<T> {
        log::debug!("GET {}", path);
        let response = self
            .authorize(self.client.get(self.url(path)).query(query))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// POSTs `body`; non-success answers become `AnalysisRequestFailed`
    /// carrying the backend's `detail` when it sent one
    async fn post_analysis<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        log::debug!("POST {}", path);
        let response = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(|e| MapError::AnalysisRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&text)
                .map(|body| match body.detail {
                    serde_json::Value::String(message) => message,
                    other => other.to_string(),
                })
                .unwrap_or_else(|_| status.to_string());
            return Err(MapError::AnalysisRequestFailed(detail));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MapError::AnalysisRequestFailed(e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl DataSource for HttpBackend {
    async fn measurements(&self) -> Result<Vec<SignalMeasurement>> {
        self.get_json("/signals/", &[]).await
    }

    async fn towers(&self) -> Result<Vec<Tower>> {
        self.get_json("/towers/", &[]).await
    }

    async fn nearby_towers(&self, center: LatLng, radius_km: f64) -> Result<Vec<Tower>> {
        self.get_json(
            "/towers/nearby",
            &[
                ("latitude", center.lat),
                ("longitude", center.lng),
                ("radius_km", radius_km),
            ],
        )
        .await
    }
}

#[async_trait]
impl AnalysisService for HttpBackend {
    async fn analyze_coverage(&self, request: &CoverageRequest) -> Result<CoverageAnalysis> {
        self.post_analysis("/analysis/coverage-heatmap", request).await
    }

    async fn recommend_towers(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        self.post_analysis("/recommendations/towers", request).await
    }
}
