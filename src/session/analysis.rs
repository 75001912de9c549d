//! Collaborator interfaces of the hosting session.
//!
//! Coverage and recommendation algorithms live behind a black-box service;
//! the session only builds requests and stores responses.

use crate::{
    core::geo::LatLng,
    data::model::{
        CoverageAnalysis, CoverageRequest, RecommendationRequest, RecommendationResponse,
        SignalMeasurement, Tower,
    },
    Result,
};
use async_trait::async_trait;

/// Source of the measurement and tower collections
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn measurements(&self) -> Result<Vec<SignalMeasurement>>;

    async fn towers(&self) -> Result<Vec<Tower>>;

    /// Towers within `radius_km` of `center`
    async fn nearby_towers(&self, center: LatLng, radius_km: f64) -> Result<Vec<Tower>>;
}

/// Coverage analysis and tower placement service
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze_coverage(&self, request: &CoverageRequest) -> Result<CoverageAnalysis>;

    async fn recommend_towers(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse>;
}
