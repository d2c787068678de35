//! reqwest-backed implementation of the backend seams

use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use ridepath_core::{
    ApiConfig, ApiError, AttendancePayload, ChatApi, ChatMessage, City, Conversation,
    Coordinates, DriverApi, OptimizedRoute, RouteCitiesResponse, RouteDefinition,
    SaveRouteResponse, StaticToken, TokenProvider,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Longest error body kept in `ApiError::Status`
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct OptimizeRouteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

/// Ride backend over HTTP
#[derive(Clone)]
pub struct HttpDriverApi {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    timeout: Option<Duration>,
}

impl HttpDriverApi {
    /// Create client from configuration
    ///
    /// # Errors
    /// - `ClientError::InvalidBaseUrl` if `base_url` is not absolute http(s)
    /// - `ClientError::Build` if the TLS backend cannot be initialised
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut raw = config.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url =
            Url::parse(&raw).map_err(|e| ClientError::invalid_base_url(&raw, e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::invalid_base_url(raw, "scheme must be http or https"));
        }

        let timeout = config.request_timeout();
        let mut builder =
            Client::builder().user_agent(concat!("ridepath/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            tokens: Arc::new(StaticToken::new(config.token.clone())),
            timeout,
        })
    }

    /// With a token source other than the configured static token
    #[inline]
    #[must_use]
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Base URL all endpoint paths are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Transport(format!("bad endpoint {path}: {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = match self.tokens.bearer_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| self.map_transport(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        tracing::warn!("backend answered {}: {}", status, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let url = response.url().clone();
        let text = response.text().await.map_err(|e| self.map_transport(&e))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("undecodable response from {}: {}", url, e);
            ApiError::Decode(e.to_string())
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        self.decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!("POST {}", url);
        let response = self.send(self.client.post(url).json(body)).await?;
        self.decode(response).await
    }

    fn map_transport(&self, error: &reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                duration_secs: self.timeout.map_or(0, |t| t.as_secs()),
            }
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}

impl fmt::Debug for HttpDriverApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDriverApi")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DriverApi for HttpDriverApi {
    async fn route_cities(&self) -> Result<RouteCitiesResponse, ApiError> {
        self.get_json(self.endpoint("driver/route-cities")?).await
    }

    async fn route_cities_with_eta(&self) -> Result<RouteCitiesResponse, ApiError> {
        self.get_json(self.endpoint("driver/route-cities-with-eta")?).await
    }

    async fn optimize_route(
        &self,
        position: Option<Coordinates>,
    ) -> Result<OptimizedRoute, ApiError> {
        let body = OptimizeRouteBody {
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
        };
        self.post_json("driver/optimize-route", &body).await
    }

    async fn mark_attendance(&self, payload: &AttendancePayload) -> Result<(), ApiError> {
        let url = self.endpoint("driver/mark-attendance")?;
        tracing::debug!("POST {} child={}", url, payload.child_id);
        self.send(self.client.post(url).json(payload)).await?;
        Ok(())
    }

    async fn save_route(&self, route: &RouteDefinition) -> Result<SaveRouteResponse, ApiError> {
        self.post_json("driver/cities", route).await
    }

    async fn search_cities(&self, query: &str) -> Result<Vec<City>, ApiError> {
        let mut url = self.endpoint("cities")?;
        url.query_pairs_mut().append_pair("q", query);
        self.get_json(url).await
    }
}

#[async_trait]
impl ChatApi for HttpDriverApi {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(self.endpoint("chat/conversations")?).await
    }

    async fn messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        let path = format!("chat/conversations/{conversation_id}/messages");
        self.get_json(self.endpoint(&path)?).await
    }
}
