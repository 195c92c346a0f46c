use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::users::repo_types::User;

/// Standard JWT claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub session_ttl: Duration,
}

/// Request body for user registration. Fields stay optional so presence
/// checks can answer with the API's own error envelope instead of a
/// deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for the forgot-password flow.
#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

/// Request body for the reset-password flow.
#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

/// Plain acknowledgement body shared by most endpoints.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
    pub success: bool,
}

impl ApiMessage {
    pub fn ok(message: &str) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

/// Public part of the user returned after login.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub success: bool,
    pub user: SessionUser,
}

/// Response returned by the me endpoint.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub message: String,
    pub success: bool,
}
