use crate::config::Config;
use crate::error::ApiError;
use crate::store::TokenStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Thin wrapper over a shared `reqwest::Client`: joins paths onto the
/// configured base URL, attaches the bearer credential when one is present,
/// and normalizes every failure into [`ApiError`]. No retries, no backoff —
/// callers decide whether to retry or degrade.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

fn build_http_client(request_timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(request_timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn transport_error(error: &reqwest::Error) -> ApiError {
    ApiError {
        message: error.to_string(),
        code: "NETWORK_ERROR".to_string(),
        status: None,
    }
}

fn is_json_content_type(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// Error message precedence: backend `message` field, then the HTTP status
/// text, then a generic fallback. `code` defaults to `HTTP_<status>`.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body: Option<serde_json::Value> = if is_json_content_type(&response) {
        response.json().await.ok()
    } else {
        None
    };

    let backend_message = body
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .filter(|message| !message.is_empty());
    let backend_code = body
        .as_ref()
        .and_then(|value| value.get("code"))
        .and_then(serde_json::Value::as_str)
        .filter(|code| !code.is_empty());

    ApiError {
        message: backend_message
            .or(status.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string(),
        code: backend_code
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP_{}", status.as_u16())),
        status: Some(status),
    }
}

impl ApiClient {
    pub fn new(config: &Config, tokens: Arc<TokenStore>) -> Self {
        Self {
            http: build_http_client(config.request_timeout_secs, config.connect_timeout_secs),
            base_url: config.base_url(),
            tokens,
        }
    }

    /// Client against an explicit base URL with default timeouts. Test entry
    /// point, also handy for library callers without a config file.
    pub fn with_base_url(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            http: build_http_client(120, 10),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.tokens.get() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|error| transport_error(&error))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Parse the body as `T`. The body is only read as JSON when the response
    /// content-type says so; anything else is a decode failure for typed
    /// callers.
    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !is_json_content_type(&response) {
            return Err(ApiError {
                message: "response was not JSON".to_string(),
                code: "DECODE_ERROR".to_string(),
                status: Some(status),
            });
        }
        response.json().await.map_err(|error| ApiError {
            message: format!("response JSON decode failed: {error}"),
            code: "DECODE_ERROR".to_string(),
            status: Some(status),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.builder(Method::GET, path)).await?;
        Self::parse_json(response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.builder(Method::POST, path).json(body))
            .await?;
        Self::parse_json(response).await
    }

    pub async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.builder(Method::PATCH, path).json(body))
            .await?;
        Self::parse_json(response).await
    }

    /// DELETE calls return no body worth parsing.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.builder(Method::DELETE, path)).await?;
        Ok(())
    }

    /// POST returning the raw response for incremental body consumption
    /// (chat streaming). Non-success status is still normalized before any
    /// streaming starts.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.builder(Method::POST, path).json(body)).await
    }
}
