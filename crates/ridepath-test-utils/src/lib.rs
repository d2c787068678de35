//! Testing utilities for the Ridepath workspace
//!
//! Shared fakes, fixtures, and a controllable clock.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use ridepath_core::{
    ApiError, AttendancePayload, ChatApi, ChatMessage, City, Clock, Conversation, Coordinates,
    DriverApi, OptimizedRoute, RouteCitiesResponse, RouteDefinition, SaveRouteResponse, Stop,
    StopStatus, StopType,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::Semaphore;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_millis(millis: i64) -> Self {
        Self::new(Utc.timestamp_millis_opt(millis).unwrap())
    }

    pub fn at_secs(secs: i64) -> Self {
        Self::new(Utc.timestamp_opt(secs, 0).unwrap())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn city(id: i64, name: &str) -> City {
    City::new(id, name, 51.0 + id as f64 / 100.0, -1.0 - id as f64 / 100.0)
}

pub fn stop(child_id: i64, stop_type: StopType, eta_secs: i64) -> Stop {
    Stop {
        lat: 52.0 + child_id as f64 / 1000.0,
        lng: -1.5 - child_id as f64 / 1000.0,
        stop_type,
        child_id,
        address: format!("{child_id} School Lane"),
        eta_secs,
        leg_distance_meters: 1_200,
        child_name: Some(format!("Child {child_id}")),
        status: StopStatus::Pending,
    }
}

/// `n` stops, pickups first then dropoffs, ten minutes apart from `base_eta`
pub fn stops(n: usize, base_eta: i64) -> Vec<Stop> {
    (0..n)
        .map(|i| {
            let stop_type = if i < n.div_ceil(2) {
                StopType::Pickup
            } else {
                StopType::Dropoff
            };
            stop(i as i64 + 1, stop_type, base_eta + i as i64 * 600)
        })
        .collect()
}

pub fn route_cities_response(
    start_city_id: i64,
    end_city_id: i64,
    start_point: &str,
    end_point: &str,
) -> RouteCitiesResponse {
    RouteCitiesResponse {
        success: true,
        start_point: start_point.to_string(),
        end_point: end_point.to_string(),
        start_city_id,
        end_city_id,
        ..RouteCitiesResponse::default()
    }
}

pub fn optimized_route(stops: Vec<Stop>) -> OptimizedRoute {
    OptimizedRoute {
        degraded: false,
        total_distance_meters: stops.iter().map(|s| s.leg_distance_meters).sum(),
        total_duration_secs: 600 * stops.len() as i64,
        polyline: None,
        stops,
    }
}

fn unconfigured(endpoint: &str) -> ApiError {
    ApiError::Transport(format!("{endpoint} not configured in fake"))
}

/// Scriptable in-memory `DriverApi`
///
/// Unconfigured endpoints fail with a transport error; attendance succeeds
/// unless a failure was queued.
#[derive(Debug)]
pub struct FakeDriverApi {
    route_cities: Mutex<Result<RouteCitiesResponse, ApiError>>,
    route_cities_with_eta: Mutex<Result<RouteCitiesResponse, ApiError>>,
    optimized_route: Mutex<Result<OptimizedRoute, ApiError>>,
    attendance_results: Mutex<VecDeque<Result<(), ApiError>>>,
    save_route: Mutex<Result<SaveRouteResponse, ApiError>>,
    search: Mutex<Result<Vec<City>, ApiError>>,
    search_by_query: Mutex<HashMap<String, Vec<City>>>,
    search_delays: Mutex<HashMap<String, StdDuration>>,
    attendance_gate: Option<Arc<Semaphore>>,

    route_cities_calls: AtomicUsize,
    eta_calls: AtomicUsize,
    optimize_positions: Mutex<Vec<Option<Coordinates>>>,
    attendance_calls: Mutex<Vec<AttendancePayload>>,
    saved_routes: Mutex<Vec<RouteDefinition>>,
    search_queries: Mutex<Vec<String>>,
}

impl Default for FakeDriverApi {
    fn default() -> Self {
        Self {
            route_cities: Mutex::new(Err(unconfigured("route-cities"))),
            route_cities_with_eta: Mutex::new(Err(unconfigured("route-cities-with-eta"))),
            optimized_route: Mutex::new(Err(unconfigured("optimize-route"))),
            attendance_results: Mutex::new(VecDeque::new()),
            save_route: Mutex::new(Ok(SaveRouteResponse {
                success: true,
                message: None,
            })),
            search: Mutex::new(Ok(Vec::new())),
            search_by_query: Mutex::new(HashMap::new()),
            search_delays: Mutex::new(HashMap::new()),
            attendance_gate: None,
            route_cities_calls: AtomicUsize::new(0),
            eta_calls: AtomicUsize::new(0),
            optimize_positions: Mutex::new(Vec::new()),
            attendance_calls: Mutex::new(Vec::new()),
            saved_routes: Mutex::new(Vec::new()),
            search_queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakeDriverApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route_cities(self, response: RouteCitiesResponse) -> Self {
        *self.route_cities.lock() = Ok(response);
        self
    }

    pub fn with_route_cities_error(self, error: ApiError) -> Self {
        *self.route_cities.lock() = Err(error);
        self
    }

    pub fn with_eta_response(self, response: RouteCitiesResponse) -> Self {
        *self.route_cities_with_eta.lock() = Ok(response);
        self
    }

    pub fn with_eta_error(self, error: ApiError) -> Self {
        *self.route_cities_with_eta.lock() = Err(error);
        self
    }

    pub fn with_stops(self, stops: Vec<Stop>) -> Self {
        *self.optimized_route.lock() = Ok(optimized_route(stops));
        self
    }

    pub fn with_optimize_error(self, error: ApiError) -> Self {
        *self.optimized_route.lock() = Err(error);
        self
    }

    pub fn with_save_response(self, response: SaveRouteResponse) -> Self {
        *self.save_route.lock() = Ok(response);
        self
    }

    pub fn with_save_error(self, error: ApiError) -> Self {
        *self.save_route.lock() = Err(error);
        self
    }

    pub fn with_search_results(self, cities: Vec<City>) -> Self {
        *self.search.lock() = Ok(cities);
        self
    }

    pub fn with_search_error(self, error: ApiError) -> Self {
        *self.search.lock() = Err(error);
        self
    }

    /// Results for one query, overriding the shared search result
    pub fn with_search_results_for(self, query: &str, cities: Vec<City>) -> Self {
        self.search_by_query.lock().insert(query.to_string(), cities);
        self
    }

    /// Searches for `query` answer only after `delay` (Tokio time)
    pub fn with_search_delay(self, query: &str, delay: StdDuration) -> Self {
        self.search_delays.lock().insert(query.to_string(), delay);
        self
    }

    /// Attendance calls block until a permit is added to `gate`
    pub fn with_attendance_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.attendance_gate = Some(gate);
        self
    }

    /// Make the next attendance call fail
    pub fn fail_next_attendance(&self, error: ApiError) {
        self.attendance_results.lock().push_back(Err(error));
    }

    pub fn set_stops(&self, stops: Vec<Stop>) {
        *self.optimized_route.lock() = Ok(optimized_route(stops));
    }

    pub fn set_optimize_error(&self, error: ApiError) {
        *self.optimized_route.lock() = Err(error);
    }

    pub fn set_eta_response(&self, response: RouteCitiesResponse) {
        *self.route_cities_with_eta.lock() = Ok(response);
    }

    pub fn route_cities_calls(&self) -> usize {
        self.route_cities_calls.load(Ordering::SeqCst)
    }

    pub fn eta_calls(&self) -> usize {
        self.eta_calls.load(Ordering::SeqCst)
    }

    pub fn optimize_positions(&self) -> Vec<Option<Coordinates>> {
        self.optimize_positions.lock().clone()
    }

    pub fn attendance_calls(&self) -> Vec<AttendancePayload> {
        self.attendance_calls.lock().clone()
    }

    pub fn saved_routes(&self) -> Vec<RouteDefinition> {
        self.saved_routes.lock().clone()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.lock().clone()
    }
}

#[async_trait]
impl DriverApi for FakeDriverApi {
    async fn route_cities(&self) -> Result<RouteCitiesResponse, ApiError> {
        self.route_cities_calls.fetch_add(1, Ordering::SeqCst);
        self.route_cities.lock().clone()
    }

    async fn route_cities_with_eta(&self) -> Result<RouteCitiesResponse, ApiError> {
        self.eta_calls.fetch_add(1, Ordering::SeqCst);
        self.route_cities_with_eta.lock().clone()
    }

    async fn optimize_route(
        &self,
        position: Option<Coordinates>,
    ) -> Result<OptimizedRoute, ApiError> {
        self.optimize_positions.lock().push(position);
        self.optimized_route.lock().clone()
    }

    async fn mark_attendance(&self, payload: &AttendancePayload) -> Result<(), ApiError> {
        self.attendance_calls.lock().push(payload.clone());
        if let Some(gate) = &self.attendance_gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ApiError::Transport("gate closed".to_string()))?;
            permit.forget();
        }
        self.attendance_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn save_route(&self, route: &RouteDefinition) -> Result<SaveRouteResponse, ApiError> {
        self.saved_routes.lock().push(route.clone());
        self.save_route.lock().clone()
    }

    async fn search_cities(&self, query: &str) -> Result<Vec<City>, ApiError> {
        self.search_queries.lock().push(query.to_string());
        let delay = self.search_delays.lock().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(cities) = self.search_by_query.lock().get(query) {
            return Ok(cities.clone());
        }
        self.search.lock().clone()
    }
}

/// Scriptable `ChatApi` counting polls
#[derive(Debug, Default)]
pub struct FakeChatApi {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<ChatMessage>>,
    failing: Mutex<bool>,
    conversation_polls: AtomicUsize,
    message_polls: AtomicUsize,
}

impl FakeChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_conversations(&self, conversations: Vec<Conversation>) {
        *self.conversations.lock() = conversations;
    }

    pub fn set_messages(&self, messages: Vec<ChatMessage>) {
        *self.messages.lock() = messages;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn conversation_polls(&self) -> usize {
        self.conversation_polls.load(Ordering::SeqCst)
    }

    pub fn message_polls(&self) -> usize {
        self.message_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.conversation_polls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock() {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(self.conversations.lock().clone())
    }

    async fn messages(&self, _conversation_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        self.message_polls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock() {
            return Err(ApiError::Transport("offline".to_string()));
        }
        Ok(self.messages.lock().clone())
    }
}

pub fn conversation(id: i64, title: &str) -> Conversation {
    Conversation {
        id,
        title: title.to_string(),
        last_message: None,
        unread_count: 0,
    }
}
