//! HTTP client for the backend

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::ApiResponse;
use crate::auth::AuthToken;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// JSON client bound to the configured base URL
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from the API config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("api.base_url is not configured".to_string()));
        }
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid api.base_url '{}': {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// Resolve an endpoint path against the base URL, keeping the base path
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| Error::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<ApiResponse<T>> {
        let request = self.request(Method::GET, path, token)?;
        self.send(request).await
    }

    pub async fn post<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
        token: Option<&AuthToken>,
    ) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.request(Method::POST, path, token)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    pub async fn put<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path, token)?.json(body);
        self.send(request).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        tracing::debug!("{} {}", method, url.path());

        let mut request = self.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        Ok(request)
    }

    /// Send a request and decode the envelope.
    ///
    /// Error statuses that still carry an envelope are returned as a
    /// non-success response; anything else is a network error.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(mut envelope) => {
                if !status.is_success() {
                    tracing::debug!("Backend answered {}", status);
                    envelope.success = false;
                }
                Ok(envelope)
            }
            Err(e) if status.is_success() => {
                Err(Error::Network(format!("Invalid response body: {}", e)))
            }
            Err(_) => Err(Error::Network(format!("Unexpected status {}", status))),
        }
    }
}

/// Substitute `:name` placeholders in an endpoint template.
///
/// Values are percent-encoded so an id can never change the path shape.
pub fn fill_path(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |path, (name, value)| {
        let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        path.replace(&format!(":{}", name), &encoded)
    })
}
