//! # Noteleaf API Server Library
//!
//! This library provides the core functionality for the Noteleaf API server.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, and the authentication gate
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors for the authenticated user
//! - `pagination`: Page parameters and response envelopes
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod routes;
