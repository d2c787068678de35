//! Route setup form
//!
//! Holds the ordered waypoint cities of a route while the driver builds it.
//! Order is travel order: the first city is the start, the last the
//! destination.
//!
//! City search is debounced. Each call supersedes the previous one; a
//! superseded search never overwrites newer results.

use crate::error::{RouteSetupError, GENERIC_SAVE_FAILURE};
use crate::guard::InFlight;
use chrono::NaiveTime;
use indexmap::IndexMap;
use parking_lot::Mutex;
use ridepath_core::{City, CityId, DriverApi, RideType, RouteDefinition, SetupConfig};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Minimum trimmed query length that triggers a remote search
pub const MIN_QUERY_LEN: usize = 2;

/// Error flag text shown under the search box
pub const SEARCH_FAILED: &str = "Failed to search cities";

#[derive(Debug, Default)]
struct SearchState {
    results: Vec<City>,
    error: Option<String>,
    loading: bool,
}

/// Controller behind the route setup screen
pub struct RouteSetupForm {
    api: Arc<dyn DriverApi>,
    cities: Mutex<IndexMap<CityId, City>>,
    search: Mutex<SearchState>,
    generation: AtomicU64,
    submitting: AtomicBool,
    debounce: Duration,
    search_timeout: Duration,
}

impl RouteSetupForm {
    /// Create an empty form
    #[must_use]
    pub fn new(api: Arc<dyn DriverApi>, config: &SetupConfig) -> Self {
        Self {
            api,
            cities: Mutex::new(IndexMap::new()),
            search: Mutex::new(SearchState::default()),
            generation: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
            debounce: config.search_debounce(),
            search_timeout: config.search_timeout(),
        }
    }

    /// Append `city`; `false` if a city with the same id is already selected
    pub fn add_city(&self, city: City) -> bool {
        let mut cities = self.cities.lock();
        if cities.contains_key(&city.id) {
            return false;
        }
        cities.insert(city.id, city);
        true
    }

    /// Remove the city with `city_id`, keeping the order of the rest
    pub fn remove_city(&self, city_id: CityId) -> bool {
        self.cities.lock().shift_remove(&city_id).is_some()
    }

    /// Selected cities in travel order
    #[must_use]
    pub fn selected_cities(&self) -> Vec<City> {
        self.cities.lock().values().cloned().collect()
    }

    /// Debounced city search
    ///
    /// Queries shorter than two characters (after trimming) clear the results
    /// without a request. Failures and timeouts leave empty results and set
    /// the error flag.
    pub async fn search_cities(&self, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let query = query.trim();

        if query.chars().count() < MIN_QUERY_LEN {
            *self.search.lock() = SearchState::default();
            return;
        }

        tokio::time::sleep(self.debounce).await;
        if self.is_superseded(generation) {
            tracing::trace!("search for {:?} superseded during debounce", query);
            return;
        }

        self.search.lock().loading = true;
        let outcome = tokio::time::timeout(self.search_timeout, self.api.search_cities(query)).await;

        if self.is_superseded(generation) {
            tracing::trace!("discarding stale results for {:?}", query);
            return;
        }

        let mut state = self.search.lock();
        state.loading = false;
        match outcome {
            Ok(Ok(results)) => {
                tracing::debug!("{} cities match {:?}", results.len(), query);
                state.results = results;
                state.error = None;
            }
            Ok(Err(e)) => {
                tracing::warn!("City search failed: {}", e);
                state.results.clear();
                state.error = Some(SEARCH_FAILED.to_string());
            }
            Err(_) => {
                tracing::warn!("City search timed out after {:?}", self.search_timeout);
                state.results.clear();
                state.error = Some(SEARCH_FAILED.to_string());
            }
        }
    }

    #[must_use]
    pub fn search_results(&self) -> Vec<City> {
        self.search.lock().results.clone()
    }

    #[must_use]
    pub fn search_error(&self) -> Option<String> {
        self.search.lock().error.clone()
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.search.lock().loading
    }

    /// Save the route with the selected cities
    ///
    /// # Errors
    /// - `RouteSetupError::Validation` if fewer than two cities are selected;
    ///   nothing is sent
    /// - `RouteSetupError::Busy` if a previous submit is pending
    /// - `RouteSetupError::Rejected` if the backend answers `success: false`
    /// - `RouteSetupError::Api` on transport failure
    pub async fn submit(
        &self,
        ride_type: RideType,
        usual_start_time: NaiveTime,
        usual_end_time: NaiveTime,
    ) -> Result<(), RouteSetupError> {
        let city_ids: Vec<CityId> = self.cities.lock().keys().copied().collect();
        let route = RouteDefinition::new(city_ids, ride_type, usual_start_time, usual_end_time)?;

        let _guard = InFlight::acquire(&self.submitting).ok_or(RouteSetupError::Busy)?;

        tracing::info!(
            "Saving {} route through {} cities",
            route.ride_type(),
            route.city_ids().len()
        );

        let response = self.api.save_route(&route).await.map_err(|e| {
            tracing::error!("Failed to save route: {}", e);
            RouteSetupError::from(e)
        })?;

        if response.success {
            Ok(())
        } else {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_SAVE_FAILURE.to_string());
            tracing::warn!("Route rejected: {}", message);
            Err(RouteSetupError::Rejected(message))
        }
    }

    /// Check if a submit is pending
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) != generation
    }
}

impl fmt::Debug for RouteSetupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSetupForm")
            .field("cities", &self.cities.lock().len())
            .field("debounce", &self.debounce)
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}
