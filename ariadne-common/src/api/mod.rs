//! API module for the shared HTTP response envelope
//!
//! # Design Principle
//!
//! This module contains ONLY shared types with no HTTP framework
//! dependencies. The resolver service wraps them with axum responses.

pub mod types;

pub use types::{CitationSupplemental, Link, Record, ResolverResponse};
