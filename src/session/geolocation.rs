use crate::{core::geo::LatLng, MapError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Yields the user's current position
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<LatLng>;
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub LatLng);

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<LatLng> {
        Ok(self.0)
    }
}

/// The environment has no geolocation capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl GeolocationProvider for Unsupported {
    async fn current_position(&self) -> Result<LatLng> {
        Err(MapError::GeolocationUnavailable(
            "geolocation is not supported in this environment".to_string(),
        ))
    }
}

/// Asks `provider` for a position, giving up after `timeout`
#[cfg(feature = "tokio-runtime")]
pub async fn locate(provider: &dyn GeolocationProvider, timeout: Duration) -> Result<LatLng> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(position) => position,
        Err(_) => Err(MapError::GeolocationUnavailable(format!(
            "no position within {} ms",
            timeout.as_millis()
        ))),
    }
}

/// Asks `provider` for a position; without a runtime timer the timeout is not enforced
#[cfg(not(feature = "tokio-runtime"))]
pub async fn locate(provider: &dyn GeolocationProvider, _timeout: Duration) -> Result<LatLng> {
    provider.current_position().await
}
