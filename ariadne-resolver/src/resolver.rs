//! Resolution orchestrator
//!
//! One pass per request, in a fixed order:
//! 1. Coverage service. Any failure here fails the request.
//! 2. Coverage found something substantive: that is the answer, the
//!    catalog service is not queried.
//! 3. Otherwise the catalog service. Its links win only when there are
//!    some; a failed or empty catalog search falls back to the coverage
//!    answer unchanged.

use ariadne_common::config::ResolverConfig;
use ariadne_common::OpenUrlQuery;
use tracing::{info, warn};

use crate::catalog::{CatalogClient, CatalogError, CatalogResponse, CatalogSettings};
use crate::coverage::{CoverageClient, CoverageError, CoverageResponse};
use crate::link::NormalizedLink;

const USER_AGENT: &str = concat!("ariadne-resolver/", env!("CARGO_PKG_VERSION"));

/// Backend whose links were returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    Coverage,
    Catalog,
}

impl LinkSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkSource::Coverage => "coverage",
            LinkSource::Catalog => "catalog",
        }
    }
}

/// Final verdict for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub source: LinkSource,
    pub found: bool,
    pub links: Vec<NormalizedLink>,
}

impl ResolutionResult {
    fn from_coverage(coverage: CoverageResponse) -> Self {
        Self {
            source: LinkSource::Coverage,
            found: coverage.found,
            links: coverage.links,
        }
    }
}

/// Pick the answer from the coverage result and, when the coverage
/// service found nothing substantive, the catalog outcome.
///
/// `catalog` is `None` when the catalog service was not consulted.
pub fn choose(
    coverage: CoverageResponse,
    catalog: Option<Result<CatalogResponse, CatalogError>>,
) -> ResolutionResult {
    if coverage.found {
        return ResolutionResult::from_coverage(coverage);
    }

    match catalog {
        Some(Ok(catalog)) if catalog.is_found() => ResolutionResult {
            source: LinkSource::Catalog,
            found: true,
            links: catalog.links,
        },
        Some(Ok(catalog)) => {
            info!(isbn = %catalog.isbn, "Catalog search produced no links, using coverage result");
            ResolutionResult::from_coverage(coverage)
        }
        Some(Err(e)) => {
            warn!(error = %e, "Catalog search failed, using coverage result");
            ResolutionResult::from_coverage(coverage)
        }
        None => ResolutionResult::from_coverage(coverage),
    }
}

/// Dual-backend link resolver. Holds only read-only configuration, so one
/// instance is shared by every request.
#[derive(Debug, Clone)]
pub struct Resolver {
    coverage: CoverageClient,
    catalog: CatalogClient,
}

impl Resolver {
    /// Build both backend clients over one pooled HTTP client whose
    /// per-call timeout is `config.upstream_timeout`
    pub fn new(config: &ResolverConfig) -> ariadne_common::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ariadne_common::Error::Internal(format!("could not build HTTP client: {e}")))?;

        let settings = CatalogSettings {
            base_url: config.catalog_url.clone(),
            institution: config.catalog_institution.clone(),
            api_key: config.catalog_api_key.clone(),
        };

        Ok(Self {
            coverage: CoverageClient::new(http.clone(), config.coverage_url.clone()),
            catalog: CatalogClient::new(http, settings),
        })
    }

    pub fn coverage(&self) -> &CoverageClient {
        &self.coverage
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Resolve a raw OpenURL query string
    pub async fn resolve(&self, raw_query: &str) -> Result<ResolutionResult, CoverageError> {
        let query = OpenUrlQuery::parse(raw_query);
        self.resolve_query(&query).await
    }

    pub async fn resolve_query(&self, query: &OpenUrlQuery) -> Result<ResolutionResult, CoverageError> {
        let coverage = self.coverage.resolve(query).await?;
        if coverage.found {
            return Ok(choose(coverage, None));
        }

        let catalog = self.catalog.resolve(query).await;
        Ok(choose(coverage, Some(catalog)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{CoverageTarget, TargetKind};
    use crate::upstream::UpstreamError;

    fn coverage(found: bool, links: Vec<NormalizedLink>) -> CoverageResponse {
        let kind = if found {
            TargetKind::Delivery
        } else {
            TargetKind::InterlibraryLoan
        };
        let targets = links
            .iter()
            .map(|link| CoverageTarget {
                name: link.display_name.clone(),
                public_name: link.display_name.clone(),
                url: link.url.clone(),
                coverage_text: None,
                kind,
            })
            .collect();

        CoverageResponse {
            found,
            targets,
            links,
            raw_body: String::new(),
        }
    }

    fn catalog(links: Vec<NormalizedLink>) -> CatalogResponse {
        CatalogResponse {
            isbn: "9780198129103".to_string(),
            links,
            ..Default::default()
        }
    }

    fn ill_link() -> NormalizedLink {
        NormalizedLink::new("Request via ILL", "https://ill.library.nyu.edu/x", "")
    }

    #[test]
    fn test_found_coverage_wins_over_catalog() {
        let coverage_links = vec![NormalizedLink::new("JSTOR", "https://jstor.example/", "1990-")];
        let result = choose(
            coverage(true, coverage_links.clone()),
            Some(Ok(catalog(vec![NormalizedLink::new("E-book", "https://ebook.example/", "")]))),
        );

        assert_eq!(result.source, LinkSource::Coverage);
        assert!(result.found);
        assert_eq!(result.links, coverage_links);
    }

    #[test]
    fn test_catalog_links_replace_unfound_coverage() {
        let catalog_links = vec![NormalizedLink::new("E-book", "https://ebook.example/", "")];
        let result = choose(coverage(false, vec![ill_link()]), Some(Ok(catalog(catalog_links.clone()))));

        assert_eq!(result.source, LinkSource::Catalog);
        assert!(result.found);
        assert_eq!(result.links, catalog_links);
    }

    #[test]
    fn test_empty_catalog_reverts_to_coverage() {
        let result = choose(coverage(false, vec![ill_link()]), Some(Ok(catalog(Vec::new()))));

        assert_eq!(result.source, LinkSource::Coverage);
        assert!(!result.found);
        assert_eq!(result.links, vec![ill_link()]);
    }

    #[test]
    fn test_catalog_failure_keeps_coverage_floor() {
        let failures = vec![
            CatalogError::MissingIsbn,
            CatalogError::Upstream(UpstreamError::Transport("connection refused".to_string())),
            CatalogError::Upstream(UpstreamError::Timeout("timed out".to_string())),
            CatalogError::Decode("expected value".to_string()),
        ];

        for failure in failures {
            let floor = coverage(false, vec![ill_link()]);
            let expected = floor.links.clone();
            let result = choose(floor, Some(Err(failure)));

            assert_eq!(result.source, LinkSource::Coverage);
            assert!(!result.found);
            assert_eq!(result.links, expected);
        }
    }

    #[test]
    fn test_unconsulted_catalog_uses_coverage() {
        let result = choose(coverage(false, Vec::new()), None);
        assert_eq!(result.source, LinkSource::Coverage);
        assert!(!result.found);
        assert!(result.links.is_empty());
    }

    #[test]
    fn test_new_uses_configured_urls() {
        let config = ResolverConfig {
            coverage_url: "http://127.0.0.1:1/sfx".to_string(),
            catalog_url: "http://127.0.0.1:2/pnxs".to_string(),
            ..Default::default()
        };
        let resolver = Resolver::new(&config).unwrap();

        assert_eq!(resolver.coverage().base_url(), "http://127.0.0.1:1/sfx");
        assert_eq!(resolver.catalog().settings().base_url, "http://127.0.0.1:2/pnxs");
        assert_eq!(resolver.catalog().settings().institution, "NYU");
    }
}
