use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials submitted from the login form.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    pub password: Secret<String>,
}

impl LoginRequest {
    /// Body for `POST /api/auth/login`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Identity returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Readonly,
    Other(String),
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role {
            "admin" => Role::Admin,
            "readonly" => Role::Readonly,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Identity verified by the route guard for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes wrapped by the route guard
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "CurrentUser requested on an unguarded route");
            (StatusCode::INTERNAL_SERVER_ERROR, "Missing verified identity").into_response()
        })
    }
}
