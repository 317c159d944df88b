//! Response normalizer: turns a resolution verdict into the API envelope

use ariadne_common::api::{Link, ResolverResponse};

use crate::link::NormalizedLink;
use crate::resolver::ResolutionResult;

impl From<NormalizedLink> for Link {
    fn from(link: NormalizedLink) -> Self {
        Link {
            display_name: link.display_name,
            url: link.url,
            coverage_text: link.coverage_text,
        }
    }
}

/// Envelope with a single record carrying the chosen links
pub fn to_response(result: ResolutionResult) -> ResolverResponse {
    let links = result.links.into_iter().map(Link::from).collect();
    ResolverResponse::with_links(result.found, links)
}
