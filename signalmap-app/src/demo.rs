//! Offline backend with synthetic data, used with `--demo`.

use async_trait::async_trait;
use signalmap::{
    data::model::{
        CoverageAnalysis, CoverageRequest, Location, RecommendationRequest,
        RecommendationResponse,
    },
    prelude::*,
};

const CENTER: (f64, f64) = (-23.5505, -46.6333);
const GRID_STEPS: usize = 12;

pub struct DemoBackend;

/// Smooth synthetic signal field, strongest near the centre
fn field_dbm(lat: f64, lng: f64) -> f64 {
    let d = ((lat - CENTER.0).powi(2) + (lng - CENTER.1).powi(2)).sqrt();
    let ripple = (lat * 400.0).sin() * (lng * 300.0).cos() * 6.0;
    (-55.0 - d * 2500.0 + ripple).max(-120.0)
}

fn quality(dbm: f64, threshold: f64) -> &'static str {
    if dbm >= -70.0 {
        "excellent"
    } else if dbm >= threshold {
        "good"
    } else if dbm >= -100.0 {
        "fair"
    } else {
        "poor"
    }
}

#[async_trait]
impl DataSource for DemoBackend {
    async fn measurements(&self) -> Result<Vec<SignalMeasurement>> {
        let operators = ["Vivo", "Claro", "TIM"];
        let types = ["4g", "5g", "3g"];
        Ok((0..60)
            .map(|i| {
                let angle = i as f64 * 0.61;
                let radius = 0.002 + (i % 10) as f64 * 0.0025;
                let lat = CENTER.0 + angle.sin() * radius;
                let lng = CENTER.1 + angle.cos() * radius;
                SignalMeasurement {
                    id: i + 1,
                    latitude: lat,
                    longitude: lng,
                    signal_strength_dbm: field_dbm(lat, lng).round(),
                    operator: Some(operators[i as usize % operators.len()].to_string()),
                    signal_type: types[i as usize % types.len()].to_string(),
                    measured_at: String::new(),
                }
            })
            .collect())
    }

    async fn towers(&self) -> Result<Vec<Tower>> {
        Ok(vec![
            Tower {
                id: 1,
                latitude: CENTER.0 + 0.004,
                longitude: CENTER.1 - 0.003,
                operator: "Vivo".to_string(),
                cell_id: "724-06-1001".to_string(),
            },
            Tower {
                id: 2,
                latitude: CENTER.0 - 0.006,
                longitude: CENTER.1 + 0.005,
                operator: "Claro".to_string(),
                cell_id: "724-05-2002".to_string(),
            },
        ])
    }

    async fn nearby_towers(&self, _center: LatLng, _radius_km: f64) -> Result<Vec<Tower>> {
        self.towers().await
    }
}

#[async_trait]
impl AnalysisService for DemoBackend {
    async fn analyze_coverage(&self, request: &CoverageRequest) -> Result<CoverageAnalysis> {
        let lats = request.polygon.iter().map(|p| p[0]);
        let lngs = request.polygon.iter().map(|p| p[1]);
        let (min_lat, max_lat) = lats.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min_lng, max_lng) = lngs.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let mut grid = Vec::new();
        for row in 0..=GRID_STEPS {
            for col in 0..=GRID_STEPS {
                let lat = min_lat + (max_lat - min_lat) * row as f64 / GRID_STEPS as f64;
                let lng = min_lng + (max_lng - min_lng) * col as f64 / GRID_STEPS as f64;
                let dbm = field_dbm(lat, lng).round();
                grid.push(CoverageGridPoint::new(lat, lng, dbm, quality(dbm, request.threshold_dbm)));
            }
        }

        let covered = grid.iter().filter(|p| p.signal_dbm >= request.threshold_dbm).count();
        let total = grid.len();
        let avg = grid.iter().map(|p| p.signal_dbm).sum::<f64>() / total as f64;
        let total_area_km2 = (max_lat - min_lat) * 111.0 * (max_lng - min_lng) * 102.0;

        Ok(CoverageAnalysis {
            stats: CoverageStats {
                coverage_pct: covered as f64 / total as f64 * 100.0,
                gap_area_km2: total_area_km2 * (total - covered) as f64 / total as f64,
                total_area_km2,
                avg_signal_dbm: Some(avg),
                grid_points_analyzed: total as u64,
            },
            grid,
        })
    }

    async fn recommend_towers(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        let chunk = (request.gaps.len() / request.max_recommendations.max(1)).max(1);
        let recommendations = request
            .gaps
            .chunks(chunk)
            .take(request.max_recommendations)
            .enumerate()
            .map(|(i, gaps)| {
                let n = gaps.len() as f64;
                let priority = match i {
                    0 => Priority::High,
                    1 | 2 => Priority::Medium,
                    _ => Priority::Low,
                };
                Recommendation {
                    id: String::new(),
                    location: Location {
                        latitude: gaps.iter().map(|g| g.latitude).sum::<f64>() / n,
                        longitude: gaps.iter().map(|g| g.longitude).sum::<f64>() / n,
                    },
                    score: 9.0 - i as f64 * 1.3,
                    priority,
                    population_reached: gaps.len() as u64 * 850,
                    reason: format!("covers {} weak grid cells", gaps.len()),
                    gap_count: gaps.len() as u32,
                }
            })
            .collect();
        Ok(RecommendationResponse { recommendations })
    }
}
