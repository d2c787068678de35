//! Route traversal state machine
//!
//! ```text
//! NotStarted ──load ok──▶ InProgress { index } ──attendance ok──▶ InProgress { index + 1 }
//!     ▲    └──load ok, no stops──▶ Completed ◀──attendance ok on last stop──┘
//!     └── load failed (error recorded)
//! ```
//!
//! # Critical Invariant
//!
//! The cursor only moves after the backend confirms attendance for the
//! current stop. A failed, cancelled, or duplicate request leaves it where it
//! was, so no stop is ever skipped silently.

use crate::error::{NavigationError, TraversalError};
use crate::guard::InFlight;
use crate::navigation::{directions_url, UrlOpener};
use parking_lot::Mutex;
use ridepath_core::format::{format_eta, minutes_until};
use ridepath_core::{
    AttendancePayload, Clock, Coordinates, DriverApi, OptimizedRoute, Stop, StopStatus,
};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Where the driver is along today's route
#[derive(Debug, Clone, PartialEq)]
pub enum TraversalState {
    /// No route loaded; `error` holds the last load failure
    NotStarted { error: Option<String> },
    /// `index` always points at a stop of `stops`
    InProgress { stops: Vec<Stop>, index: usize },
    /// Every stop completed (or the route had none)
    Completed { stops: Vec<Stop> },
}

impl TraversalState {
    fn from_stops(stops: Vec<Stop>) -> Self {
        if stops.is_empty() {
            Self::Completed { stops }
        } else {
            Self::InProgress { stops, index: 0 }
        }
    }

    /// Stop the driver is heading to
    #[must_use]
    pub fn current(&self) -> Option<&Stop> {
        match self {
            Self::InProgress { stops, index } => stops.get(*index),
            _ => None,
        }
    }

    /// Stop after the current one
    #[must_use]
    pub fn next(&self) -> Option<&Stop> {
        match self {
            Self::InProgress { stops, index } => stops.get(index + 1),
            _ => None,
        }
    }

    /// Cursor position; equals the stop count once completed
    #[must_use]
    pub fn current_index(&self) -> usize {
        match self {
            Self::NotStarted { .. } => 0,
            Self::InProgress { index, .. } => *index,
            Self::Completed { stops } => stops.len(),
        }
    }

    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        match self {
            Self::NotStarted { .. } => &[],
            Self::InProgress { stops, .. } | Self::Completed { stops } => stops,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    fn complete_current(&mut self) {
        let taken = std::mem::replace(self, Self::NotStarted { error: None });
        *self = match taken {
            Self::InProgress { mut stops, index } => {
                stops[index].status = StopStatus::Completed;
                if index + 1 >= stops.len() {
                    Self::Completed { stops }
                } else {
                    Self::InProgress {
                        stops,
                        index: index + 1,
                    }
                }
            }
            other => other,
        };
    }
}

/// Totals reported by the optimizer for the loaded route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSummary {
    pub degraded: bool,
    pub total_distance_meters: i64,
    pub total_duration_secs: i64,
    pub polyline: Option<String>,
}

impl RouteSummary {
    fn from_route(route: &OptimizedRoute) -> Self {
        Self {
            degraded: route.degraded,
            total_distance_meters: route.total_distance_meters,
            total_duration_secs: route.total_duration_secs,
            polyline: route.polyline.clone(),
        }
    }
}

/// Today's route, walked stop by stop
///
/// Loading and attendance marking share one in-flight slot: while either is
/// pending, further calls fail with `TraversalError::Busy` without touching
/// the network.
pub struct RouteTraversal {
    api: Arc<dyn DriverApi>,
    clock: Arc<dyn Clock>,
    state: Mutex<TraversalState>,
    summary: Mutex<Option<RouteSummary>>,
    in_flight: AtomicBool,
}

impl RouteTraversal {
    /// Create traversal in `NotStarted`
    #[must_use]
    pub fn new(api: Arc<dyn DriverApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            state: Mutex::new(TraversalState::NotStarted { error: None }),
            summary: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetch today's optimized stops and restart at the first one
    ///
    /// # Errors
    /// - `TraversalError::Busy` if another action is pending
    /// - `TraversalError::Load` if the optimizer call fails; a machine that
    ///   never loaded stays `NotStarted` with the error recorded, a loaded
    ///   one keeps its current route
    pub async fn load(&self, position: Option<Coordinates>) -> Result<(), TraversalError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(TraversalError::Busy)?;

        match self.api.optimize_route(position).await {
            Ok(route) => {
                if route.degraded {
                    tracing::warn!("optimizer returned a degraded route");
                }
                tracing::info!("Loaded today's route: {} stops", route.stops.len());
                *self.summary.lock() = Some(RouteSummary::from_route(&route));
                *self.state.lock() = TraversalState::from_stops(route.stops);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load today's route: {}", e);
                let mut state = self.state.lock();
                if let TraversalState::NotStarted { error } = &mut *state {
                    *error = Some(e.user_message());
                }
                Err(TraversalError::Load(e))
            }
        }
    }

    /// Confirm the current stop with the backend, then advance
    ///
    /// # Errors
    /// - `TraversalError::Busy` if another action is pending
    /// - `TraversalError::NoCurrentStop` before loading or after completion
    /// - `TraversalError::Attendance` if the backend did not confirm; the
    ///   state is unchanged
    pub async fn mark_current_complete(&self, notes: &str) -> Result<(), TraversalError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(TraversalError::Busy)?;

        let (index, payload) = {
            let state = self.state.lock();
            let stop = state.current().ok_or(TraversalError::NoCurrentStop)?;
            (state.current_index(), AttendancePayload::completed(stop, notes))
        };

        tracing::info!(
            "Marking stop {} ({} child {}) complete",
            index,
            payload.stop_type,
            payload.child_id
        );

        if let Err(e) = self.api.mark_attendance(&payload).await {
            tracing::warn!("Attendance not confirmed for stop {}: {}", index, e);
            return Err(TraversalError::Attendance(e));
        }

        let mut state = self.state.lock();
        state.complete_current();
        if state.is_completed() {
            tracing::info!("Route completed");
        }
        Ok(())
    }

    /// Open external turn-by-turn navigation to `stop`
    ///
    /// # Errors
    /// - `NavigationError::OpenFailed` if the opener refuses the link
    pub fn open_external_navigation(
        &self,
        stop: &Stop,
        opener: &dyn UrlOpener,
    ) -> Result<(), NavigationError> {
        let url = directions_url(stop.coordinates());
        opener.open(&url).map_err(|reason| {
            tracing::warn!("Could not open maps: {}", reason);
            NavigationError::OpenFailed { url, reason }
        })
    }

    /// Remaining time to `stop`, e.g. `"12 min"`; never negative
    #[must_use]
    pub fn stop_eta_label(&self, stop: &Stop) -> String {
        format_eta(minutes_until(stop.eta_secs, self.clock.now()))
    }

    #[must_use]
    pub fn current(&self) -> Option<Stop> {
        self.state.lock().current().cloned()
    }

    #[must_use]
    pub fn next(&self) -> Option<Stop> {
        self.state.lock().next().cloned()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.lock().current_index()
    }

    #[must_use]
    pub fn stops(&self) -> Vec<Stop> {
        self.state.lock().stops().to_vec()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.lock().is_completed()
    }

    /// Snapshot of the full state
    #[must_use]
    pub fn state(&self) -> TraversalState {
        self.state.lock().clone()
    }

    /// Optimizer totals of the loaded route
    #[must_use]
    pub fn summary(&self) -> Option<RouteSummary> {
        self.summary.lock().clone()
    }

    /// Check if a load or attendance call is pending
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(std::sync::atomic::Ordering::Acquire)
    }
}

impl fmt::Debug for RouteTraversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTraversal")
            .field("state", &*self.state.lock())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
