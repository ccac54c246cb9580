/// Note endpoints
///
/// Every operation here is scoped by the caller's access set: a note the
/// caller has no share row for is reported as 404, never 403, so the API
/// does not reveal which note ids exist. Deleting a note cascades to its
/// attachments, removing rows first and then attempting the backing files;
/// a file that refuses to go is surfaced as a `warning` on the response
/// rather than blocking the delete.
///
/// # Endpoints
///
/// - `GET /v1/notes` - List accessible notes, paginated
/// - `GET /v1/notes/search/:text` - Title search within accessible notes
/// - `POST /v1/notes` - Create a note (creator gets access)
/// - `GET /v1/notes/:id` - Fetch one accessible note
/// - `PUT /v1/notes/:id` - Update an accessible note
/// - `DELETE /v1/notes/:id` - Delete a note and its attachments
/// - `POST /v1/notes/:id/share/:user_id` - Grant another account access
/// - `DELETE /v1/notes/:id/share/:user_id` - Revoke an account's access

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::CurrentUser,
    pagination::{DataResponse, ListResponse, MessageResponse, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use noteleaf_shared::models::{
    attachment::Attachment,
    category::Category,
    note::{CreateNote, Note, UpdateNote},
    user::User,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::routes::users::double_option;

/// Note creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub published: bool,

    pub category_id: Option<Uuid>,
}

/// Note update request; explicit null detaches the category
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,

    pub published: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
}

/// Rejects a category id that doesn't resolve, with a readable message
/// instead of a foreign-key failure.
async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> ApiResult<()> {
    Category::CONTROLLER
        .get_by_id(&state.db, category_id, false)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::validation("category does not exist"))
}

/// Fetches a note the caller can see, or 404
async fn accessible_note(state: &AppState, note_id: Uuid, user_id: Uuid) -> ApiResult<Note> {
    Note::fetch_for_user(&state.db, note_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

/// Lists the caller's accessible notes, paginated
pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<Note>>> {
    let total = Note::count_for_user(&state.db, user.id).await?;
    let data =
        Note::list_for_user(&state.db, user.id, params.offset(), params.page_size()).await?;

    Ok(Json(ListResponse::new(data, &params, total)))
}

/// Case-insensitive title search within the caller's accessible notes
pub async fn search_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(text): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<Note>>> {
    let total = Note::search_count_for_user(&state.db, user.id, &text).await?;
    let data = Note::search_for_user(
        &state.db,
        user.id,
        &text,
        params.offset(),
        params.page_size(),
    )
    .await?;

    Ok(Json(ListResponse::new(data, &params, total)))
}

/// Creates a note; the creator becomes its first accessor
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Note>>)> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    if let Some(category_id) = req.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let note = Note::create_owned(
        &state.db,
        CreateNote {
            title: req.title,
            content: req.content,
            published: req.published,
            category_id: req.category_id,
        },
        user.id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(note))))
}

/// Fetches one accessible note
pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DataResponse<Note>>> {
    let note = accessible_note(&state, id, user.id).await?;
    Ok(Json(DataResponse::new(note)))
}

/// Updates an accessible note
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<Json<DataResponse<Note>>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let note = accessible_note(&state, id, user.id).await?;

    if let Some(Some(category_id)) = req.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let updated = Note::CONTROLLER
        .update(
            &state.db,
            &note,
            &UpdateNote {
                title: req.title,
                content: req.content,
                published: req.published,
                category_id: req.category_id,
            },
        )
        .await?;

    Ok(Json(DataResponse::new(updated)))
}

/// Deletes a note, cascading to its attachments
///
/// Rows go first, files second; a file that cannot be removed leaves a
/// `warning` on the response but the note is gone regardless.
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let note = accessible_note(&state, id, user.id).await?;

    let paths = Attachment::storage_paths_for_note(&state.db, note.id).await?;

    // Shares and attachment rows go with the note via ON DELETE CASCADE
    Note::CONTROLLER.delete_by_id(&state.db, note.id).await?;

    let mut failed = 0usize;
    for path in &paths {
        if !state.storage.remove(path).await {
            failed += 1;
        }
    }

    let response = if failed > 0 {
        MessageResponse::with_warning(
            "Note deleted successfully",
            format!("{} attachment file(s) could not be removed", failed),
        )
    } else {
        MessageResponse::new("Note deleted successfully")
    };

    Ok(Json(response))
}

/// Grants another account access to a note
///
/// Sharing with an account that already has access is a no-op, reported
/// as such rather than as an error.
///
/// # Errors
///
/// - `400 Bad Request`: The target user does not exist
/// - `404 Not Found`: The note is not accessible to the caller
pub async fn share_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, target_user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let note = accessible_note(&state, id, user.id).await?;

    User::CONTROLLER
        .get_by_id(&state.db, target_user_id, false)
        .await?
        .ok_or_else(|| ApiError::validation("target user does not exist"))?;

    let changed = Note::grant_access(&state.db, note.id, target_user_id).await?;

    let message = if changed {
        "Note shared successfully"
    } else {
        "Note is already shared with this user"
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Revokes an account's access to a note
///
/// # Errors
///
/// - `400 Bad Request`: The target user does not exist, or the target is
///   the note's only remaining accessor
/// - `404 Not Found`: The note is not accessible to the caller
pub async fn unshare_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, target_user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let note = accessible_note(&state, id, user.id).await?;

    User::CONTROLLER
        .get_by_id(&state.db, target_user_id, false)
        .await?
        .ok_or_else(|| ApiError::validation("target user does not exist"))?;

    let changed = Note::revoke_access(&state.db, note.id, target_user_id).await?;

    let message = if changed {
        "Note unshared successfully"
    } else {
        "Note is not shared with this user"
    };
    Ok(Json(MessageResponse::new(message)))
}
