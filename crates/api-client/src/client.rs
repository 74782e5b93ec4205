//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::PreviewApi;
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::session::{ExtractionSession, WsConnector};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Client for the extraction worker
///
/// Wraps `reqwest` for the one-shot routes and hands out
/// [`ExtractionSession`]s for the streaming route. Every HTTP request carries
/// a correlation ID. Nothing is retried; a failed request is reported once.
#[derive(Clone)]
pub struct ExtractorClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl ExtractorClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("osm-extractor-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Access the road preview endpoint
    #[must_use]
    pub fn preview(&self) -> PreviewApi {
        PreviewApi::new(self.clone())
    }

    /// Create an idle extraction session against this worker
    pub fn extraction_session(&self) -> ApiResult<ExtractionSession> {
        let ws_url = self.config.extract_ws_url()?;
        Ok(ExtractionSession::new(WsConnector, self.preview(), ws_url))
    }

    /// Perform a POST request to an absolute URL
    #[instrument(skip(self, body), fields(request_id))]
    pub async fn post_url<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_url(Method::POST, url, Some(body)).await
    }

    /// Execute a single request to an absolute URL
    async fn request_url<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let context = ErrorContext {
            request_id: Some(request_id.clone()),
            endpoint: url.to_string(),
            method: method.to_string(),
        };

        let mut request = self
            .inner
            .request(method, url)
            .header(X_REQUEST_ID, &request_id);
        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let result = match request.send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => Err(ApiError::Request(e)),
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => debug!(
                request_id = %request_id,
                elapsed_ms = elapsed.as_millis(),
                "Request succeeded"
            ),
            Err(e) => warn!(
                context = %context,
                elapsed_ms = elapsed.as_millis(),
                error = %e,
                "Request failed"
            ),
        }
        result
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(ApiError::Request)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }
}
