//! Octosearch: repository search across GitHub and Gitea behind one endpoint.
//!
//! This crate is the service around the [`repo_search`] engine:
//! configuration loading, backend wiring at startup, and the HTTP API.
//!
//! # Architecture
//!
//! - **Config**: TOML file plus environment overrides; tokens from the
//!   environment only
//! - **Startup**: builds one long-lived client per backend and registers
//!   them by name
//! - **Server**: `axum` router exposing `/search-repos` and
//!   `/available-engines`

pub mod config;
pub mod error;
pub mod server;
pub mod startup;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use server::{AppState, SearchServer};
