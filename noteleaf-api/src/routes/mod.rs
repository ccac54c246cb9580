/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Token issuance (login)
/// - `users`: Registration, profile, and admin account management
/// - `categories`: Category CRUD (admin writes)
/// - `notes`: Note CRUD, title search, and sharing
/// - `attachments`: Attachment upload, listing, and removal

pub mod attachments;
pub mod auth;
pub mod categories;
pub mod health;
pub mod notes;
pub mod users;
