//! Catalog service (Primo discovery index) integration
//!
//! Unlike the coverage service, every failure here is recoverable: the
//! orchestrator falls back to the coverage answer.

pub mod frbr;
pub mod request;
pub mod response;

pub use frbr::{expand_group, GroupOutcome};
pub use request::{extract_isbn, CatalogSettings};
pub use response::{CatalogDoc, LinkType, SearchResponse};

use ariadne_common::OpenUrlQuery;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::link::{reconcile, NormalizedLink};
use crate::upstream::{UpstreamError, UpstreamRequest};

/// Catalog service errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no isbn or rft.isbn in query string")]
    MissingIsbn,

    #[error("invalid catalog service URL {0}")]
    InvalidUrl(String),

    #[error("catalog service request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("could not parse catalog service response: {0}")]
    Decode(String),
}

/// Initial ISBN search, built but not yet sent
#[derive(Debug, Clone)]
pub struct CatalogRequest {
    pub isbn: String,
    pub upstream: UpstreamRequest,
    pub dump: String,
}

/// Outcome of a catalog search including FRBR expansion
#[derive(Debug, Clone, Default)]
pub struct CatalogResponse {
    pub isbn: String,
    pub request_dump: String,
    /// Member search dumps in issue order
    pub frbr_request_dumps: Vec<String>,
    /// Raw bodies: initial search first, then member searches in document order
    pub response_bodies: Vec<String>,
    /// FRBR follow-ups that failed and contributed nothing
    pub failed_groups: usize,
    /// Reconciled links
    pub links: Vec<NormalizedLink>,
}

impl CatalogResponse {
    pub fn is_found(&self) -> bool {
        !self.links.is_empty()
    }
}

/// How one initial search hit feeds the link pool
enum DocSource<'a> {
    Direct(&'a CatalogDoc),
    Group(usize),
}

/// Client for the catalog service
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    settings: CatalogSettings,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, settings: CatalogSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Build the initial ISBN search without sending it
    pub fn prepare(&self, query: &OpenUrlQuery) -> Result<CatalogRequest, CatalogError> {
        let isbn = extract_isbn(query)?;
        let upstream = request::isbn_search_request(&self.settings, &isbn)?;
        let dump = upstream.dump();
        Ok(CatalogRequest { isbn, upstream, dump })
    }

    /// Run the initial search and expand any active FRBR groups
    pub async fn search(&self, request: &CatalogRequest) -> Result<CatalogResponse, CatalogError> {
        info!(isbn = %request.isbn, dumped_request = %request.dump, "Catalog ISBN search request");

        let response = request.upstream.send(&self.http).await?;
        debug!(status = response.status, body = %response.body, "Catalog ISBN search response");

        let docs = SearchResponse::parse(&response.body)?.docs;

        let mut group_ids: Vec<&str> = Vec::new();
        let mut sources = Vec::with_capacity(docs.len());
        for doc in &docs {
            if !doc.is_active_frbr_group() {
                sources.push(DocSource::Direct(doc));
                continue;
            }
            match doc.frbr_group_id() {
                Some(group_id) => {
                    let index = match group_ids.iter().position(|known| *known == group_id) {
                        Some(index) => index,
                        None => {
                            group_ids.push(group_id);
                            group_ids.len() - 1
                        }
                    };
                    sources.push(DocSource::Group(index));
                }
                None => warn!(isbn = %request.isbn, "Active FRBR group without a group id, skipping"),
            }
        }

        let outcomes: Vec<GroupOutcome> = join_all(
            group_ids
                .iter()
                .map(|group_id| expand_group(&self.http, &self.settings, &request.isbn, group_id)),
        )
        .await;

        let mut pool = Vec::new();
        let mut used = vec![false; outcomes.len()];
        for source in sources {
            match source {
                DocSource::Direct(doc) => pool.extend(doc.deliverable_links()),
                DocSource::Group(index) => {
                    if !used[index] {
                        used[index] = true;
                        pool.extend(outcomes[index].links.iter().cloned());
                    }
                }
            }
        }

        let failed_groups = outcomes.iter().filter(|outcome| outcome.error.is_some()).count();
        let mut frbr_request_dumps = Vec::with_capacity(outcomes.len());
        let mut response_bodies = vec![response.body];
        for outcome in outcomes {
            if !outcome.request_dump.is_empty() {
                frbr_request_dumps.push(outcome.request_dump);
            }
            if let Some(body) = outcome.response_body {
                response_bodies.push(body);
            }
        }

        let links = reconcile(pool);
        debug!(
            isbn = %request.isbn,
            docs = docs.len(),
            groups = group_ids.len(),
            failed_groups,
            links = links.len(),
            "Catalog search complete"
        );

        Ok(CatalogResponse {
            isbn: request.isbn.clone(),
            request_dump: request.dump.clone(),
            frbr_request_dumps,
            response_bodies,
            failed_groups,
            links,
        })
    }

    /// Build and search in one step
    pub async fn resolve(&self, query: &OpenUrlQuery) -> Result<CatalogResponse, CatalogError> {
        let request = self.prepare(query)?;
        self.search(&request).await
    }
}
