//! # Ariadne Common Library
//!
//! Shared code for the Ariadne link resolver including:
//! - OpenURL query parsing
//! - API response envelope types
//! - Configuration loading
//! - Logging initialization

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod openurl;

pub use error::{Error, Result};
pub use openurl::OpenUrlQuery;
