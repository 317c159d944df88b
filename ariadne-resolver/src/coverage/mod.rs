//! Coverage service (SFX knowledge base) integration
//!
//! The coverage service is mandatory: any failure to build, send, or
//! interpret its request fails the whole resolution.

pub mod request;
pub mod response;

pub use request::{build_request, CoverageRequest, Genre};
pub use response::{interpret, CoverageResponse, CoverageTarget, TargetKind};

use ariadne_common::OpenUrlQuery;
use thiserror::Error;
use tracing::{debug, info};

use crate::upstream::UpstreamError;

/// Coverage service errors
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("genre not in list of allowed genres: {0}")]
    InvalidGenre(String),

    #[error("no citation fields in query string")]
    NoCitationFields,

    #[error("could not serialize citation field '{0}'")]
    Serialize(String),

    #[error("invalid coverage service URL {0}")]
    InvalidUrl(String),

    #[error("coverage service request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("could not parse coverage service response: {0}")]
    Decode(String),

    #[error("could not identify context object in coverage service response")]
    NoContextObject,
}

/// Client for the coverage service
#[derive(Debug, Clone)]
pub struct CoverageClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoverageClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the outbound request without sending it
    pub fn prepare(&self, query: &OpenUrlQuery) -> Result<CoverageRequest, CoverageError> {
        build_request(&self.base_url, query)
    }

    /// Send a prepared request and interpret the response
    pub async fn fetch(&self, request: &CoverageRequest) -> Result<CoverageResponse, CoverageError> {
        info!(dumped_request = %request.dump, genre = %request.genre, "Coverage service request");

        let response = request.upstream.send(&self.http).await?;
        debug!(status = response.status, body = %response.body, "Coverage service response");

        interpret(&response.body)
    }

    /// Build, send, and interpret in one step
    pub async fn resolve(&self, query: &OpenUrlQuery) -> Result<CoverageResponse, CoverageError> {
        let request = self.prepare(query)?;
        self.fetch(&request).await
    }
}
