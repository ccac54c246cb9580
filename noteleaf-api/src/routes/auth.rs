/// Token issuance endpoint
///
/// Login is a form-encoded credential exchange: username and password in,
/// short-lived bearer token out. There is no refresh flow; clients simply
/// log in again when the token expires.
///
/// # Endpoints
///
/// - `POST /v1/auth/token` - Exchange credentials for a bearer token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Form, Json};
use chrono::Duration;
use noteleaf_shared::{
    auth::{jwt, password},
    models::user::User,
};
use serde::{Deserialize, Serialize};

/// Token request (form-encoded)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Login name
    pub username: String,

    /// Password
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed bearer token
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Issues a bearer token for valid credentials
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/token
/// Content-Type: application/x-www-form-urlencoded
///
/// username=ada&password=secret
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "bearer"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password. The two cases
///   share one message so the endpoint does not confirm which usernames exist.
/// - `403 Forbidden`: Valid credentials for a deactivated account.
pub async fn issue_token(
    State(state): State<AppState>,
    Form(req): Form<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    let claims = jwt::Claims::with_expiration(
        &user.username,
        Duration::minutes(state.config.jwt.expiry_minutes),
    );
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
