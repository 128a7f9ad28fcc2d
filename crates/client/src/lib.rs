//! HTTP client for the Civica workflow backend.
//!
//! Provides the shared request adapter (base URL, bearer token, error
//! normalization) and one typed service per backend resource group.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod services;

pub use auth::{SharedToken, StaticToken, TokenProvider};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorKind};
pub use http::HttpClient;
