//! Multipart file ingestion and generic insert API.
//!
//! `main.rs` wires configuration, the SQLite pool and the upload root into an
//! [`state::AppState`] and serves [`routes::routes::app`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
