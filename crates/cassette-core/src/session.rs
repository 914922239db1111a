//! Session inspection
//!
//! Reads the claims of a stored access token to show who is logged in and
//! when the token expires. Tokens are signed by the server with a key the
//! client never sees, so the signature is not checked: this is for display
//! only and never decides whether a request is sent.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims issued by the server's token endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
}

/// Display view of the current access token
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub user_id: Option<String>,
    pub token_type: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Decode `token`'s claims without verifying its signature or expiry.
///
/// Returns `None` for anything that isn't a well-formed JWT.
pub fn inspect_token(token: &str) -> Option<SessionInfo> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::new();

    let claims = match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims,
        Err(err) => {
            log::debug!("[api:auth] Access token is not a readable JWT: {}", err);
            return None;
        }
    };

    Some(SessionInfo {
        user_id: claims.user_id.map(|id| match id {
            Value::String(s) => s,
            other => other.to_string(),
        }),
        token_type: claims.token_type,
        expires_at: claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
    })
}
