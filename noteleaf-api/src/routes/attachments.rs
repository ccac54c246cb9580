/// Attachment endpoints
///
/// Uploads are multipart: a required `file` part plus an optional
/// `description` text part. Access follows the parent note, with one
/// asymmetry: note-addressed routes report an inaccessible note as 404,
/// while attachment-addressed routes report an existing attachment under
/// an inaccessible note as 403 (the attachment id was evidently known to
/// the caller, so there is nothing left to hide).
///
/// # Endpoints
///
/// - `POST /v1/notes/:id/attachments` - Upload a file onto a note
/// - `GET /v1/notes/:id/attachments` - List a note's attachments
/// - `GET /v1/attachments/:id` - Fetch attachment metadata
/// - `DELETE /v1/attachments/:id` - Delete an attachment and its file

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::CurrentUser,
    pagination::{DataResponse, MessageResponse},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use noteleaf_shared::models::{
    attachment::{Attachment, CreateAttachment},
    note::Note,
};
use uuid::Uuid;

/// MIME type recorded when the client does not supply one
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Longest accepted description, matching the column width
const MAX_DESCRIPTION_LEN: usize = 255;

/// One parsed multipart upload
struct UploadParts {
    filename: String,
    mime_type: String,
    data: Vec<u8>,
    description: Option<String>,
}

/// Pulls the `file` and optional `description` parts out of the request
async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadParts> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| ApiError::validation("file part must carry a filename"))?;
                let mime_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed to read upload: {}", e)))?
                    .to_vec();
                file = Some((filename, mime_type, data));
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed to read upload: {}", e)))?;
                if text.len() > MAX_DESCRIPTION_LEN {
                    return Err(ApiError::validation(format!(
                        "Description must be at most {} characters",
                        MAX_DESCRIPTION_LEN
                    )));
                }
                description = Some(text);
            }
            // Unknown parts are ignored rather than rejected
            _ => {}
        }
    }

    let (filename, mime_type, data) =
        file.ok_or_else(|| ApiError::validation("missing file part"))?;

    Ok(UploadParts {
        filename,
        mime_type,
        data,
        description,
    })
}

/// Fetches an attachment, applying the 404/403 split described above
async fn authorized_attachment(
    state: &AppState,
    attachment_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Attachment> {
    let attachment = Attachment::CONTROLLER
        .get_by_id(&state.db, attachment_id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    if !Note::is_accessible(&state.db, attachment.note_id, user_id).await? {
        return Err(ApiError::Forbidden(
            "No access to this attachment's note".to_string(),
        ));
    }

    Ok(attachment)
}

/// Uploads a file onto a note
///
/// The file lands on disk first; if recording the metadata row then
/// fails, the orphaned file is removed before the error propagates.
///
/// # Errors
///
/// - `400 Bad Request`: Missing file part, missing filename, or an
///   oversized description
/// - `404 Not Found`: The note is not accessible to the caller
pub async fn upload_attachment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(note_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DataResponse<Attachment>>)> {
    let note = Note::fetch_for_user(&state.db, note_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    let upload = read_upload(multipart).await?;

    let stored = state
        .storage
        .save(user.id, &upload.filename, &upload.data)
        .await?;

    let created = Attachment::CONTROLLER
        .create(
            &state.db,
            &CreateAttachment {
                note_id: note.id,
                filename: upload.filename,
                storage_path: stored.relative_path.clone(),
                size_bytes: stored.size_bytes,
                mime_type: upload.mime_type,
                description: upload.description,
            },
        )
        .await;

    match created {
        Ok(attachment) => Ok((StatusCode::CREATED, Json(DataResponse::new(attachment)))),
        Err(e) => {
            state.storage.remove(&stored.relative_path).await;
            Err(e.into())
        }
    }
}

/// Lists a note's attachments
pub async fn list_attachments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Json<DataResponse<Vec<Attachment>>>> {
    let note = Note::fetch_for_user(&state.db, note_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    let attachments = Attachment::list_for_note(&state.db, note.id).await?;
    Ok(Json(DataResponse::new(attachments)))
}

/// Fetches attachment metadata by id
pub async fn get_attachment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DataResponse<Attachment>>> {
    let attachment = authorized_attachment(&state, id, user.id).await?;
    Ok(Json(DataResponse::new(attachment)))
}

/// Deletes an attachment and its backing file
///
/// The row goes first; if the file then refuses to be removed, the
/// response still reports the delete but carries a `warning`.
pub async fn delete_attachment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let attachment = authorized_attachment(&state, id, user.id).await?;

    Attachment::CONTROLLER
        .delete_by_id(&state.db, attachment.id)
        .await?;

    let response = if state.storage.remove(&attachment.storage_path).await {
        MessageResponse::new("Attachment deleted successfully")
    } else {
        MessageResponse::with_warning(
            "Attachment deleted successfully",
            "the attachment file could not be removed",
        )
    };

    Ok(Json(response))
}
