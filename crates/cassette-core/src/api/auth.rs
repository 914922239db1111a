//! Account endpoints: login, registration, logout and profile settings

use serde_json::json;

use super::body_of;
use crate::client::{token_field, AuthenticatedRequestClient};
use crate::error::{ApiError, Result};
use crate::executor::RequestDescriptor;
use crate::models::{
    ApiKeyUpdate, AuthResponse, LlmSettings, LoginRequest, ProfileUpdate, RegisterRequest,
    SettingsResponse, UserProfile,
};

pub const LOGIN_ENDPOINT: &str = "/auth/login/";
pub const REGISTER_ENDPOINT: &str = "/auth/register/";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout/";
pub const PROFILE_ENDPOINT: &str = "/auth/profile/";
pub const API_KEY_ENDPOINT: &str = "/auth/api-key/";

impl AuthenticatedRequestClient {
    /// Exchange username and password for a token pair and store it
    pub async fn login(&self, username: &str, password: &str) -> std::result::Result<AuthResponse, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let descriptor = RequestDescriptor::post(LOGIN_ENDPOINT)
            .with_body(body_of(&request))
            .public();

        let body = self.execute(&descriptor).await?;
        self.store_issued_tokens(&body);
        log::info!("[api:auth] Logged in as {}", username);
        Ok(serde_json::from_value(body)?)
    }

    /// Create an account; the server logs the new user in right away
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;

        let descriptor = RequestDescriptor::post(REGISTER_ENDPOINT)
            .with_body(body_of(request))
            .public();

        let body = self.execute(&descriptor).await?;
        self.store_issued_tokens(&body);
        log::info!("[api:auth] Registered {}", request.username);
        Ok(serde_json::from_value(body).map_err(ApiError::from)?)
    }

    /// Blacklist the refresh token on the server and forget both tokens.
    ///
    /// Never fails: server errors are logged and the local pair is cleared
    /// regardless.
    pub async fn logout(&self) {
        if let Some(refresh) = self.credentials().refresh_token() {
            let descriptor =
                RequestDescriptor::post(LOGOUT_ENDPOINT).with_body(json!({ "refresh": refresh }));
            if let Err(err) = self.execute(&descriptor).await {
                log::warn!("[api:auth] Logout request failed, clearing locally: {}", err);
            }
        }

        self.credentials().clear();
        log::info!("[api:auth] Logged out");
    }

    pub async fn get_profile(&self) -> std::result::Result<UserProfile, ApiError> {
        self.execute_as(&RequestDescriptor::get(PROFILE_ENDPOINT)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> std::result::Result<UserProfile, ApiError> {
        let descriptor = RequestDescriptor::patch(PROFILE_ENDPOINT).with_body(body_of(update));
        self.execute_as(&descriptor).await
    }

    /// Legacy single-key update (OpenAI key)
    pub async fn set_api_key(&self, update: &ApiKeyUpdate) -> std::result::Result<SettingsResponse, ApiError> {
        let descriptor = RequestDescriptor::patch(API_KEY_ENDPOINT).with_body(body_of(update));
        self.execute_as(&descriptor).await
    }

    pub async fn update_llm_settings(
        &self,
        settings: &LlmSettings,
    ) -> std::result::Result<SettingsResponse, ApiError> {
        let descriptor = RequestDescriptor::patch(API_KEY_ENDPOINT).with_body(body_of(settings));
        self.execute_as(&descriptor).await
    }

    /// Store `access`/`refresh` from a login or registration response
    fn store_issued_tokens(&self, body: &serde_json::Value) {
        match token_field(body, "access") {
            Some(access) => self
                .credentials()
                .store_pair(access, token_field(body, "refresh")),
            None => log::warn!("[api:auth] Auth response carried no access token"),
        }
    }
}
