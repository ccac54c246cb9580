/// Category endpoints
///
/// Categories are a shared vocabulary: any authenticated account can read
/// them, only admins can write. Deletion is refused while notes still
/// reference the category.
///
/// # Endpoints
///
/// - `GET /v1/categories` - List categories, paginated
/// - `POST /v1/categories` - Create a category (admin)
/// - `GET /v1/categories/:id` - Fetch one category
/// - `PUT /v1/categories/:id` - Update a category (admin)
/// - `DELETE /v1/categories/:id` - Delete an unused category (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AdminUser, CurrentUser},
    pagination::{DataResponse, ListResponse, MessageResponse, PageParams},
    routes::users::double_option,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use noteleaf_shared::models::category::{Category, CreateCategory, UpdateCategory};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Category creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

/// Category update request; explicit null clears the description
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Lists categories, paginated
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<Category>>> {
    let total = Category::CONTROLLER.count(&state.db, &[]).await?;
    let data = Category::CONTROLLER
        .read_page(&state.db, params.offset(), params.page_size())
        .await?;

    Ok(Json(ListResponse::new(data, &params, total)))
}

/// Creates a category (admin)
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or the name is taken
pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Category>>)> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let category = Category::CONTROLLER
        .create(
            &state.db,
            &CreateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// Fetches one category by id
pub async fn get_category(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DataResponse<Category>>> {
    let category = Category::CONTROLLER
        .get_by_id(&state.db, id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(DataResponse::new(category)))
}

/// Updates a category (admin)
pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<DataResponse<Category>>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let category = Category::CONTROLLER
        .get_by_id(&state.db, id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    let updated = Category::CONTROLLER
        .update(
            &state.db,
            &category,
            &UpdateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(DataResponse::new(updated)))
}

/// Deletes a category (admin)
///
/// # Errors
///
/// - `400 Bad Request`: The category is still referenced by notes
/// - `404 Not Found`: No such category
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Category::delete_if_unused(&state.db, id).await?;

    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
