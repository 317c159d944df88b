//! Catalog service search requests
//!
//! Searches use the `field,exact,value` query syntax against a fixed
//! institutional scope. FRBR member searches add a facet filter on the
//! group identifier.

use ariadne_common::OpenUrlQuery;
use url::Url;

use super::CatalogError;
use crate::upstream::UpstreamRequest;

/// Logical OpenURL field carrying the identifier searched for
pub const ISBN_FIELD: &str = "isbn";
/// Query parameter carrying the FRBR group facet filter
pub const FRBR_MEMBER_SEARCH_PARAM: &str = "multiFacets";

const RESULT_LIMIT: &str = "50";

/// Fixed parameters of every catalog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub base_url: String,
    /// Sent as both `inst` and `vid`
    pub institution: String,
    pub api_key: Option<String>,
}

/// The ISBN to search for: `rft.isbn` preferred over a bare `isbn`
pub fn extract_isbn(query: &OpenUrlQuery) -> Result<String, CatalogError> {
    query
        .field_first(ISBN_FIELD)
        .map(str::to_string)
        .ok_or(CatalogError::MissingIsbn)
}

/// Initial ISBN search
pub fn isbn_search_request(settings: &CatalogSettings, isbn: &str) -> Result<UpstreamRequest, CatalogError> {
    search_request(settings, isbn, None)
}

/// Search restricted to members of FRBR group `group_id`
pub fn frbr_member_request(
    settings: &CatalogSettings,
    isbn: &str,
    group_id: &str,
) -> Result<UpstreamRequest, CatalogError> {
    search_request(settings, isbn, Some(group_id))
}

fn search_request(
    settings: &CatalogSettings,
    isbn: &str,
    group_id: Option<&str>,
) -> Result<UpstreamRequest, CatalogError> {
    let mut url = Url::parse(&settings.base_url)
        .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;

    {
        // Sorted by key so dumps are stable
        let mut pairs = url.query_pairs_mut();
        if let Some(api_key) = &settings.api_key {
            pairs.append_pair("apikey", api_key);
        }
        pairs.append_pair("inst", &settings.institution);
        pairs.append_pair("limit", RESULT_LIMIT);
        if let Some(group_id) = group_id {
            pairs.append_pair(
                FRBR_MEMBER_SEARCH_PARAM,
                &format!("facet_frbrgroupid,include,{group_id}"),
            );
        }
        pairs.append_pair("offset", "0");
        pairs.append_pair("q", &format!("isbn,exact,{isbn}"));
        pairs.append_pair("scope", "all");
        pairs.append_pair("vid", &settings.institution);
    }

    Ok(UpstreamRequest::get(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ISBN: &str = "1111111111111";

    fn settings() -> CatalogSettings {
        CatalogSettings {
            base_url: "http://bobcat.example.edu/primo_library/libweb/webservices/rest/primo-explore/v1/pnxs"
                .to_string(),
            institution: "NYU".to_string(),
            api_key: None,
        }
    }

    #[test]
    fn test_extract_isbn_bare() {
        let query = OpenUrlQuery::parse("param1=1&isbn=1111111111111");
        assert_eq!(extract_isbn(&query).unwrap(), TEST_ISBN);
    }

    #[test]
    fn test_extract_isbn_prefers_prefixed() {
        let query = OpenUrlQuery::parse("isbn=2222222222222&rft.isbn=1111111111111");
        assert_eq!(extract_isbn(&query).unwrap(), TEST_ISBN);
    }

    #[test]
    fn test_extract_isbn_case_insensitive() {
        let query = OpenUrlQuery::parse("ISBN=1111111111111");
        assert_eq!(extract_isbn(&query).unwrap(), TEST_ISBN);
    }

    #[test]
    fn test_extract_isbn_missing() {
        for query_string in ["param1=1&param2=2", "", "isbn="] {
            let query = OpenUrlQuery::parse(query_string);
            assert!(matches!(extract_isbn(&query), Err(CatalogError::MissingIsbn)), "{query_string}");
        }
    }

    #[test]
    fn test_isbn_search_dump() {
        let request = isbn_search_request(&settings(), TEST_ISBN).unwrap();
        assert_eq!(
            request.dump(),
            "GET /primo_library/libweb/webservices/rest/primo-explore/v1/pnxs?inst=NYU&limit=50&offset=0\
             &q=isbn%2Cexact%2C1111111111111&scope=all&vid=NYU HTTP/1.1\r\nHost: bobcat.example.edu\r\n"
        );
    }

    #[test]
    fn test_frbr_member_dump() {
        let request = frbr_member_request(&settings(), TEST_ISBN, "2222222222").unwrap();
        assert_eq!(
            request.dump(),
            "GET /primo_library/libweb/webservices/rest/primo-explore/v1/pnxs?inst=NYU&limit=50\
             &multiFacets=facet_frbrgroupid%2Cinclude%2C2222222222&offset=0\
             &q=isbn%2Cexact%2C1111111111111&scope=all&vid=NYU HTTP/1.1\r\nHost: bobcat.example.edu\r\n"
        );
    }

    #[test]
    fn test_api_key_included_when_configured() {
        let settings = CatalogSettings {
            api_key: Some("secret".to_string()),
            ..settings()
        };
        let request = isbn_search_request(&settings, TEST_ISBN).unwrap();
        assert!(request.url.query().unwrap().starts_with("apikey=secret&inst=NYU"));
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = CatalogSettings {
            base_url: "not a url".to_string(),
            ..settings()
        };
        assert!(matches!(
            isbn_search_request(&settings, TEST_ISBN),
            Err(CatalogError::InvalidUrl(_))
        ));
    }
}
