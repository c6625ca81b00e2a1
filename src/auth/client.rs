//! Auth endpoints of the backend

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiClient, ApiResponse};
use crate::auth::models::{AuthToken, LoginRequest, User};
use crate::config::EndpointsConfig;
use crate::error::Result;

/// Remote auth operations the session layer depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET current-user`: verify a token and return its user
    async fn current_user(&self, token: &AuthToken) -> Result<ApiResponse<User>>;

    /// `POST logout`: invalidate the token server-side
    async fn logout(&self, token: &AuthToken) -> Result<ApiResponse<Value>>;

    /// `POST login-init`: send an OTP to the phone number
    async fn login_init(&self, request: &LoginRequest) -> Result<ApiResponse<Value>>;

    /// `POST login`: exchange phone + OTP for a token
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>>;
}

/// [`AuthApi`] over HTTP
#[derive(Clone)]
pub struct HttpAuthApi {
    client: ApiClient,
    endpoints: EndpointsConfig,
}

impl HttpAuthApi {
    pub fn new(client: ApiClient, endpoints: EndpointsConfig) -> Self {
        Self { client, endpoints }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn current_user(&self, token: &AuthToken) -> Result<ApiResponse<User>> {
        self.client
            .get(&self.endpoints.current_user, Some(token))
            .await
    }

    async fn logout(&self, token: &AuthToken) -> Result<ApiResponse<Value>> {
        self.client
            .post::<Value, Value>(&self.endpoints.logout, None, Some(token))
            .await
    }

    async fn login_init(&self, request: &LoginRequest) -> Result<ApiResponse<Value>> {
        self.client
            .post(&self.endpoints.login_init, Some(request), None)
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>> {
        self.client
            .post(&self.endpoints.login, Some(request), None)
            .await
    }
}
