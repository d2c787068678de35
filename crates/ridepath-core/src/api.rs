//! Service seams towards the ride backend
//!
//! Implement these traits to plug a transport into the driver services.
//! `ridepath-client` provides the HTTP implementation; tests substitute fakes.

use crate::error::ApiError;
use crate::types::{
    AttendancePayload, ChatMessage, City, Conversation, Coordinates, OptimizedRoute,
    RouteCitiesResponse, RouteDefinition, SaveRouteResponse,
};
use async_trait::async_trait;

/// Driver endpoints of the ride backend
#[async_trait]
pub trait DriverApi: Send + Sync {
    /// `GET /driver/route-cities`
    async fn route_cities(&self) -> Result<RouteCitiesResponse, ApiError>;

    /// `GET /driver/route-cities-with-eta`
    async fn route_cities_with_eta(&self) -> Result<RouteCitiesResponse, ApiError>;

    /// `POST /driver/optimize-route`
    async fn optimize_route(
        &self,
        position: Option<Coordinates>,
    ) -> Result<OptimizedRoute, ApiError>;

    /// `POST /driver/mark-attendance`
    async fn mark_attendance(&self, payload: &AttendancePayload) -> Result<(), ApiError>;

    /// `POST /driver/cities`
    async fn save_route(&self, route: &RouteDefinition) -> Result<SaveRouteResponse, ApiError>;

    /// `GET /cities?q=<query>`
    async fn search_cities(&self, query: &str) -> Result<Vec<City>, ApiError>;
}

/// Chat endpoints polled by the chat list and chat room screens
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chat/conversations`
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// `GET /chat/conversations/{id}/messages`
    async fn messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, ApiError>;
}

/// Source of the bearer token attached to backend requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, `None` when signed out
    async fn bearer_token(&self) -> Option<String>;
}

/// Token fixed at construction time
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Create provider returning `token`
    #[inline]
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}
