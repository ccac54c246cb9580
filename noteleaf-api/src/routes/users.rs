/// User endpoints
///
/// Registration is public; everything else requires a bearer token. The
/// `/users/me` pair lets any account manage its own profile, while the
/// id-addressed routes are admin-only account management. Self-service
/// updates can never touch `is_active` or `is_admin`; only an admin can
/// change privilege flags, and only through the admin routes.
///
/// # Endpoints
///
/// - `POST /v1/users` - Register a new account (public)
/// - `GET /v1/users/me` - Current account's profile
/// - `PUT /v1/users/me` - Update own profile
/// - `GET /v1/users` - List accounts (admin)
/// - `GET /v1/users/:id` - Fetch one account (admin)
/// - `PUT /v1/users/:id` - Update any account (admin)
/// - `DELETE /v1/users/:id` - Delete an account (admin, not oneself)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AdminUser, CurrentUser},
    pagination::{DataResponse, ListResponse, MessageResponse, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use noteleaf_shared::{
    auth::password,
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Distinguishes an absent field from an explicit null.
///
/// With this deserializer a missing field stays `None` while `null`
/// becomes `Some(None)`, which the patch types translate into writing
/// SQL NULL.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// User representation in API responses
///
/// Identical to the model minus the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 100, message = "Username must be 3 to 100 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 100, message = "Email must be at most 100 characters"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

/// Self-service profile update
///
/// Deliberately has no privilege or activation fields.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 100, message = "Email must be at most 100 characters"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// New display name; explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub full_name: Option<Option<String>>,
}

/// Admin account update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 100, message = "Username must be 3 to 100 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 100, message = "Email must be at most 100 characters"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub full_name: Option<Option<String>>,

    pub is_active: Option<bool>,

    pub is_admin: Option<bool>,
}

/// Registers a new account
///
/// New accounts start active and without admin rights.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the username/email is taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<PublicUser>>)> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::CONTROLLER
        .create(
            &state.db,
            &CreateUser {
                username: req.username,
                email: req.email,
                password_hash,
                full_name: req.full_name,
                is_active: true,
                is_admin: false,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(PublicUser::from(user))),
    ))
}

/// Current account's profile
pub async fn get_me(
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<DataResponse<PublicUser>>> {
    Ok(Json(DataResponse::new(PublicUser::from(user))))
}

/// Updates the current account's own profile
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<DataResponse<PublicUser>>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let password_hash = match req.password {
        Some(ref password) => Some(password::hash_password(password)?),
        None => None,
    };

    let updated = User::CONTROLLER
        .update(
            &state.db,
            &user,
            &UpdateUser {
                email: req.email,
                password_hash,
                full_name: req.full_name,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(DataResponse::new(PublicUser::from(updated))))
}

/// Lists all accounts, paginated (admin)
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<PublicUser>>> {
    let total = User::CONTROLLER.count(&state.db, &[]).await?;
    let users = User::CONTROLLER
        .read_page(&state.db, params.offset(), params.page_size())
        .await?;

    let data = users.into_iter().map(PublicUser::from).collect();
    Ok(Json(ListResponse::new(data, &params, total)))
}

/// Fetches one account by id (admin)
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DataResponse<PublicUser>>> {
    let user = User::CONTROLLER
        .get_by_id(&state.db, id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(DataResponse::new(PublicUser::from(user))))
}

/// Updates any account, including privilege flags (admin)
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<DataResponse<PublicUser>>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let user = User::CONTROLLER
        .get_by_id(&state.db, id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let password_hash = match req.password {
        Some(ref password) => Some(password::hash_password(password)?),
        None => None,
    };

    let updated = User::CONTROLLER
        .update(
            &state.db,
            &user,
            &UpdateUser {
                username: req.username,
                email: req.email,
                password_hash,
                full_name: req.full_name,
                is_active: req.is_active,
                is_admin: req.is_admin,
            },
        )
        .await?;

    Ok(Json(DataResponse::new(PublicUser::from(updated))))
}

/// Deletes an account (admin)
///
/// Admins cannot delete their own account; demote or deactivate first,
/// from another admin account.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if admin.id == id {
        return Err(ApiError::validation(
            "administrators cannot delete their own account",
        ));
    }

    User::CONTROLLER.delete_by_id(&state.db, id).await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
