//! FRBR group expansion
//!
//! A search hit flagged as an active work group stands for several
//! editions. Its links are not trusted directly: the group's members are
//! fetched with a second search and only members that list the requested
//! ISBN literally among their identifiers contribute links.
//!
//! A failed member search contributes no links, the same as a group with
//! no matching member. The failure is kept on the outcome for logging.

use tracing::{debug, info, warn};

use super::request::{frbr_member_request, CatalogSettings};
use super::response::{CatalogDoc, SearchResponse};
use super::CatalogError;
use crate::link::NormalizedLink;

/// Result of expanding one FRBR group
#[derive(Debug)]
pub struct GroupOutcome {
    pub group_id: String,
    /// Dump of the member search, empty if it could not be built
    pub request_dump: String,
    pub response_body: Option<String>,
    /// Member documents returned by the search
    pub member_count: usize,
    /// Members listing the requested ISBN
    pub matched_count: usize,
    pub links: Vec<NormalizedLink>,
    pub error: Option<CatalogError>,
}

impl GroupOutcome {
    fn failed(group_id: &str, request_dump: String, error: CatalogError) -> Self {
        Self {
            group_id: group_id.to_string(),
            request_dump,
            response_body: None,
            member_count: 0,
            matched_count: 0,
            links: Vec::new(),
            error: Some(error),
        }
    }
}

/// Links of the members that list `isbn` exactly. Non-matching members
/// are dropped entirely.
pub fn matching_member_links(members: &[CatalogDoc], isbn: &str) -> (usize, Vec<NormalizedLink>) {
    let mut matched = 0;
    let mut links = Vec::new();

    for member in members.iter().filter(|member| member.lists_isbn(isbn)) {
        matched += 1;
        links.extend(member.deliverable_links());
    }

    (matched, links)
}

/// Fetch the members of `group_id` and keep those matching `isbn`
pub async fn expand_group(
    http: &reqwest::Client,
    settings: &CatalogSettings,
    isbn: &str,
    group_id: &str,
) -> GroupOutcome {
    let request = match frbr_member_request(settings, isbn, group_id) {
        Ok(request) => request,
        Err(e) => return GroupOutcome::failed(group_id, String::new(), e),
    };
    let request_dump = request.dump();
    info!(group_id = %group_id, dumped_request = %request_dump, "Catalog FRBR member request");

    let response = match request.send(http).await {
        Ok(response) => response,
        Err(e) => {
            warn!(group_id = %group_id, error = %e, "Catalog FRBR member request failed");
            return GroupOutcome::failed(group_id, request_dump, e.into());
        }
    };
    debug!(group_id = %group_id, body = %response.body, "Catalog FRBR member response");

    let members = match SearchResponse::parse(&response.body) {
        Ok(parsed) => parsed.docs,
        Err(e) => {
            warn!(group_id = %group_id, error = %e, "Could not decode FRBR member response");
            let mut outcome = GroupOutcome::failed(group_id, request_dump, e);
            outcome.response_body = Some(response.body);
            return outcome;
        }
    };

    let (matched_count, links) = matching_member_links(&members, isbn);
    debug!(
        group_id = %group_id,
        members = members.len(),
        matched = matched_count,
        links = links.len(),
        "Expanded FRBR group"
    );

    GroupOutcome {
        group_id: group_id.to_string(),
        request_dump,
        response_body: Some(response.body),
        member_count: members.len(),
        matched_count,
        links,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::response::{Delivery, DeliveryLink, LinkType, Pnx, Search};

    fn member(isbns: &[&str], url: &str) -> CatalogDoc {
        CatalogDoc {
            delivery: Delivery {
                link: vec![
                    DeliveryLink {
                        hyperlink_text: "Online".to_string(),
                        link_url: url.to_string(),
                        link_type: LinkType::LinkToResource,
                    },
                    DeliveryLink {
                        hyperlink_text: "Price".to_string(),
                        link_url: format!("{url}price"),
                        link_type: LinkType::LinkToPrice,
                    },
                ],
            },
            pnx: Pnx {
                search: Search {
                    isbn: isbns.iter().map(|s| s.to_string()).collect(),
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_only_matching_members_contribute() {
        let members = vec![
            member(&["9780198129103", "0198129106"], "https://match.example/"),
            member(&["9780198129110"], "https://sibling.example/"),
        ];

        let (matched, links) = matching_member_links(&members, "9780198129103");
        assert_eq!(matched, 1);
        assert_eq!(links, vec![NormalizedLink::new("Online", "https://match.example/", "")]);
    }

    #[test]
    fn test_isbn_variant_does_not_match() {
        // ISBN-10 form of the same book is not listed
        let members = vec![member(&["0198129106"], "https://isbn10.example/")];
        let (matched, links) = matching_member_links(&members, "9780198129103");
        assert_eq!(matched, 0);
        assert!(links.is_empty());
    }

    #[test]
    fn test_no_members_contributes_nothing() {
        let (matched, links) = matching_member_links(&[], "9780198129103");
        assert_eq!(matched, 0);
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_group_search_contributes_nothing() {
        // Bind an ephemeral port and release it so nothing is listening there
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings = CatalogSettings {
            base_url: format!("http://{addr}/pnxs"),
            institution: "NYU".to_string(),
            api_key: None,
        };
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();

        let outcome = expand_group(&http, &settings, "9780198129103", "G1").await;
        assert!(outcome.links.is_empty());
        assert!(outcome.error.is_some());
        assert!(outcome.request_dump.contains("multiFacets=facet_frbrgroupid%2Cinclude%2CG1"));
    }
}
