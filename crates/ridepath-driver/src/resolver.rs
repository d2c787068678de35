//! Route cities resolver
//!
//! Combines the basic route cities with an ETA estimate. The estimate comes
//! from the ETA cache when it holds the same city pair, otherwise from the
//! backend, and is written through to the cache on success. A failed estimate
//! degrades to the basic result; only a failed basic fetch yields `None`.

use ridepath_cache::EtaCache;
use ridepath_core::{DriverApi, NewEtaCacheEntry, RouteCities, RouteCitiesResponse};
use std::fmt;
use std::sync::Arc;

/// Resolves the driver's start and destination cities with an ETA
#[derive(Clone)]
pub struct RouteCitiesResolver {
    api: Arc<dyn DriverApi>,
    cache: EtaCache,
}

impl RouteCitiesResolver {
    /// Create resolver
    #[must_use]
    pub fn new(api: Arc<dyn DriverApi>, cache: EtaCache) -> Self {
        Self { api, cache }
    }

    /// Route cities with the best ETA available, `None` if the route is unknown
    pub async fn resolve(&self) -> Option<RouteCities> {
        let basic = self.fetch_basic().await?;
        let result = RouteCities::from_response(&basic);

        if let Some(hit) = self
            .cache
            .get(basic.start_city_id, basic.end_city_id)
            .await
        {
            return Some(result.with_eta(hit.eta_minutes, hit.distance_km));
        }

        Some(self.fetch_eta(result).await)
    }

    /// Drop the cached ETA and resolve again
    pub async fn refresh(&self) -> Option<RouteCities> {
        self.cache.invalidate().await;
        self.resolve().await
    }

    async fn fetch_basic(&self) -> Option<RouteCitiesResponse> {
        match self.api.route_cities().await {
            Ok(response) if response.success => Some(response),
            Ok(response) => {
                tracing::info!(
                    "No route cities: {}",
                    response.message.as_deref().unwrap_or("unsuccessful response")
                );
                None
            }
            Err(e) => {
                tracing::error!("Failed to fetch route cities: {}", e);
                None
            }
        }
    }

    async fn fetch_eta(&self, mut result: RouteCities) -> RouteCities {
        let fresh = match self.api.route_cities_with_eta().await {
            Ok(fresh) if fresh.success => fresh,
            Ok(_) => {
                tracing::warn!("ETA endpoint reported failure; returning route without ETA");
                return result;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch ETA, returning route without it: {}", e);
                return result;
            }
        };

        result.eta_minutes = fresh.eta_minutes;
        result.distance_km = fresh.distance_km;

        if let (Some(eta_minutes), Some(distance_km)) = (fresh.eta_minutes, fresh.distance_km) {
            self.cache
                .put(NewEtaCacheEntry {
                    start_city_id: result.start_city_id,
                    end_city_id: result.end_city_id,
                    start_city: result.start_point.clone(),
                    end_city: result.end_point.clone(),
                    eta_minutes,
                    distance_km,
                })
                .await;
        }

        result
    }
}

impl fmt::Debug for RouteCitiesResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCitiesResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
