/// Integration tests for the Noteleaf API
///
/// These tests exercise the full router end-to-end:
/// - Registration and the token exchange
/// - Bearer authentication and the admin gate
/// - Note CRUD scoped to the caller's access set
/// - Sharing, unsharing, and the last-accessor guard
/// - Category lifecycle and the in-use delete refusal
/// - Multipart attachment upload
///
/// They need a PostgreSQL instance (DATABASE_URL, or the local default)
/// and are ignored by default.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn health_reports_connected_database() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(common::empty_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup(&[]).await.unwrap();
}

/// Register a fresh account, then log in with it via the form endpoint
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn register_then_exchange_credentials_for_token() {
    let ctx = TestContext::new().await.unwrap();
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("reg-{}", &suffix[..12]);

    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "POST",
            "/v1/users",
            None,
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "a-long-enough-password",
                "full_name": "Reg Test"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["username"], username.as_str());
    assert_eq!(body["data"]["is_admin"], false);
    // The hash must never appear in API responses
    assert!(body["data"].get("password_hash").is_none());
    let new_user_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    let login = Request::builder()
        .method("POST")
        .uri("/v1/auth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password=a-long-enough-password",
            username
        )))
        .unwrap();

    let response = ctx.app.clone().call(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().unwrap().len() > 20);

    ctx.cleanup(&[new_user_id]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn login_rejects_wrong_password_and_unknown_account_alike() {
    let ctx = TestContext::new().await.unwrap();

    let wrong = Request::builder()
        .method("POST")
        .uri("/v1/auth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password=not-the-password",
            ctx.user.username
        )))
        .unwrap();
    let response = ctx.app.clone().call(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = common::body_json(response).await;

    let unknown = Request::builder()
        .method("POST")
        .uri("/v1/auth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(
            "username=no-such-account&password=whatever-at-all",
        ))
        .unwrap();
    let response = ctx.app.clone().call(unknown).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = common::body_json(response).await;

    // Same message either way, so usernames cannot be probed
    assert_eq!(wrong_body["message"], unknown_body["message"]);

    ctx.cleanup(&[]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn protected_routes_require_a_bearer_token() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .call(common::empty_request("GET", "/v1/notes", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            "/v1/notes",
            Some("Bearer not-a-real-token"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[]).await.unwrap();
}

/// Full note lifecycle: create, read, update, list, delete
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn note_lifecycle_through_the_api() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let title = format!("lifecycle-{}", Uuid::new_v4().simple());

    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "POST",
            "/v1/notes",
            Some(&auth),
            json!({ "title": title, "content": "first draft" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created["data"]["published"], false);
    let note_id = created["data"]["id"].as_str().unwrap().to_string();

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/notes/{}", note_id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "PUT",
            &format!("/v1/notes/{}", note_id),
            Some(&auth),
            json!({ "content": "second draft", "published": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = common::body_json(response).await;
    assert_eq!(updated["data"]["content"], "second draft");
    assert_eq!(updated["data"]["published"], true);
    assert_eq!(updated["data"]["title"], title.as_str());

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            "/v1/notes?page=0&page_size=5",
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = common::body_json(response).await;
    assert_eq!(listed["metadata"]["current_page"], 0);
    assert_eq!(listed["metadata"]["page_size"], 5);
    assert_eq!(listed["metadata"]["total_items"], 1);
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/notes/{}", note_id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = common::body_json(response).await;
    assert_eq!(deleted["message"], "Note deleted successfully");
    assert!(deleted.get("warning").is_none());

    ctx.cleanup(&[]).await.unwrap();
}

/// A note outside the caller's access set looks exactly like a missing one
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn inaccessible_note_is_reported_missing() {
    let ctx = TestContext::new().await.unwrap();
    let note = ctx
        .seed_note(&format!("private-{}", Uuid::new_v4().simple()))
        .await
        .unwrap();
    let (stranger, stranger_token) = ctx.other_account(false).await.unwrap();
    let stranger_auth = format!("Bearer {}", stranger_token);

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/notes/{}", note.id),
            Some(&stranger_auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Note not found");

    // Same shape as a genuinely absent id
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/notes/{}", Uuid::new_v4()),
            Some(&stranger_auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup(&[stranger.id]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn sharing_grants_access_and_repeats_are_no_ops() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let note = ctx
        .seed_note(&format!("shared-{}", Uuid::new_v4().simple()))
        .await
        .unwrap();
    let (friend, friend_token) = ctx.other_account(false).await.unwrap();
    let friend_auth = format!("Bearer {}", friend_token);

    let share_uri = format!("/v1/notes/{}/share/{}", note.id, friend.id);
    let response = ctx
        .app
        .clone()
        .call(common::empty_request("POST", &share_uri, Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Note shared successfully");

    // Second share of the same pair changes nothing
    let response = ctx
        .app
        .clone()
        .call(common::empty_request("POST", &share_uri, Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Note is already shared with this user");

    // The friend can now read and edit the note
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/notes/{}", note.id),
            Some(&friend_auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Sharing with an account that does not exist is a validation failure
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "POST",
            &format!("/v1/notes/{}/share/{}", note.id, Uuid::new_v4()),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "target user does not exist");

    // And so is revoking one
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/notes/{}/share/{}", note.id, Uuid::new_v4()),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup(&[friend.id]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn unsharing_refuses_to_strand_a_note() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let note = ctx
        .seed_note(&format!("strand-{}", Uuid::new_v4().simple()))
        .await
        .unwrap();
    let (friend, _) = ctx.other_account(false).await.unwrap();

    // Revoking someone who never had access is a reported no-op
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/notes/{}/share/{}", note.id, friend.id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Note is not shared with this user");

    // Revoking the only remaining accessor is refused outright
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/notes/{}/share/{}", note.id, ctx.user.id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup(&[friend.id]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn admin_routes_reject_regular_accounts() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();

    let response = ctx
        .app
        .clone()
        .call(common::empty_request("GET", "/v1/users", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (admin, admin_token) = ctx.other_account(true).await.unwrap();
    let admin_auth = format!("Bearer {}", admin_token);

    let response = ctx
        .app
        .clone()
        .call(common::empty_request("GET", "/v1/users", Some(&admin_auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert!(body["metadata"]["total_items"].as_i64().unwrap() >= 2);

    // Admins cannot delete their own account
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/users/{}", admin.id),
            Some(&admin_auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup(&[admin.id]).await.unwrap();
}

/// Self-service updates must not be able to touch privilege flags
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn profile_update_cannot_escalate_privileges() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();

    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "PUT",
            "/v1/users/me",
            Some(&auth),
            json!({ "full_name": "Renamed", "is_admin": true, "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["full_name"], "Renamed");
    assert_eq!(body["data"]["is_admin"], false);
    assert_eq!(body["data"]["is_active"], true);

    ctx.cleanup(&[]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn category_writes_are_admin_only_and_in_use_deletes_are_refused() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let (admin, admin_token) = ctx.other_account(true).await.unwrap();
    let admin_auth = format!("Bearer {}", admin_token);
    let name = format!("cat-{}", Uuid::new_v4().simple());

    // Regular accounts cannot create categories
    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "POST",
            "/v1/categories",
            Some(&auth),
            json!({ "name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "POST",
            "/v1/categories",
            Some(&admin_auth),
            json!({ "name": name, "description": "integration" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = common::body_json(response).await;
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    // Attach a note, then the delete must be refused
    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "POST",
            "/v1/notes",
            Some(&auth),
            json!({
                "title": format!("categorized-{}", Uuid::new_v4().simple()),
                "category_id": category_id
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let note = common::body_json(response).await;
    let note_id = note["data"]["id"].as_str().unwrap().to_string();

    let delete_uri = format!("/v1/categories/{}", category_id);
    let response = ctx
        .app
        .clone()
        .call(common::empty_request("DELETE", &delete_uri, Some(&admin_auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Detach the note with an explicit null, then the delete goes through
    let response = ctx
        .app
        .clone()
        .call(common::json_request(
            "PUT",
            &format!("/v1/notes/{}", note_id),
            Some(&auth),
            json!({ "category_id": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detached = common::body_json(response).await;
    assert!(detached["data"]["category_id"].is_null());

    let response = ctx
        .app
        .clone()
        .call(common::empty_request("DELETE", &delete_uri, Some(&admin_auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Category deleted successfully");

    ctx.cleanup(&[admin.id]).await.unwrap();
}

/// Upload an attachment via multipart, then fetch and delete it
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn attachment_upload_and_access_rules() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let note = ctx
        .seed_note(&format!("attach-{}", Uuid::new_v4().simple()))
        .await
        .unwrap();

    let boundary = "noteleaf-test-boundary";
    let payload = format!(
        "--{b}\r\n\
         content-disposition: form-data; name=\"file\"; filename=\"hello.txt\"\r\n\
         content-type: text/plain\r\n\r\n\
         hello attachments\r\n\
         --{b}\r\n\
         content-disposition: form-data; name=\"description\"\r\n\r\n\
         a greeting\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let upload = Request::builder()
        .method("POST")
        .uri(format!("/v1/notes/{}/attachments", note.id))
        .header("authorization", &auth)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(payload))
        .unwrap();

    let response = ctx.app.clone().call(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let attachment = common::body_json(response).await;
    assert_eq!(attachment["data"]["filename"], "hello.txt");
    assert_eq!(attachment["data"]["mime_type"], "text/plain");
    assert_eq!(attachment["data"]["description"], "a greeting");
    assert_eq!(
        attachment["data"]["size_bytes"].as_i64().unwrap(),
        "hello attachments".len() as i64
    );
    let attachment_id = attachment["data"]["id"].as_str().unwrap().to_string();

    // A stranger sees the attachment id but not the note behind it
    let (stranger, stranger_token) = ctx.other_account(false).await.unwrap();
    let stranger_auth = format!("Bearer {}", stranger_token);
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/attachments/{}", attachment_id),
            Some(&stranger_auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/attachments/{}", attachment_id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Attachment deleted successfully");
    assert!(body.get("warning").is_none());

    ctx.cleanup(&[stranger.id]).await.unwrap();
}

/// Deleting a note takes its attachments with it, rows and files both
#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn deleting_a_note_removes_its_attachment_files() {
    let ctx = TestContext::new().await.unwrap();
    let auth = ctx.auth_header();
    let note = ctx
        .seed_note(&format!("cascade-{}", Uuid::new_v4().simple()))
        .await
        .unwrap();

    let boundary = "noteleaf-test-boundary";
    let payload = format!(
        "--{b}\r\n\
         content-disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         content-type: text/plain\r\n\r\n\
         doomed bytes\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let upload = Request::builder()
        .method("POST")
        .uri(format!("/v1/notes/{}/attachments", note.id))
        .header("authorization", &auth)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(payload))
        .unwrap();

    let response = ctx.app.clone().call(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let attachment = common::body_json(response).await;
    let attachment_id = attachment["data"]["id"].as_str().unwrap().to_string();
    let storage_path = attachment["data"]["storage_path"].as_str().unwrap();
    let file_path = ctx.upload_root().join(storage_path);
    assert!(file_path.exists(), "uploaded file missing on disk");

    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "DELETE",
            &format!("/v1/notes/{}", note.id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Note deleted successfully");
    assert!(body.get("warning").is_none());

    // The attachment row is gone along with the note
    let response = ctx
        .app
        .clone()
        .call(common::empty_request(
            "GET",
            &format!("/v1/attachments/{}", attachment_id),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And so is the file behind it
    assert!(!file_path.exists(), "attachment file survived note delete");

    ctx.cleanup(&[]).await.unwrap();
}
