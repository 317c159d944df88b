//! Shared API response types
//!
//! Every response from the resolver endpoint, success or failure, uses the
//! same envelope so callers have a single parsing path:
//!
//! ```json
//! {"errors": [], "found": true, "records": [{"citation_supplemental": {}, "links": [...]}]}
//! ```

use serde::{Deserialize, Serialize};

/// A single delivery link as presented to callers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Link {
    pub display_name: String,
    pub url: String,
    /// Free-text coverage statement, empty when not applicable
    pub coverage_text: String,
}

/// Reserved for supplementary citation metadata; always serialized as `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CitationSupplemental {}

/// One resolved record. Only one record is produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    pub citation_supplemental: CitationSupplemental,
    pub links: Vec<Link>,
}

/// Response envelope for `/v0/`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverResponse {
    pub errors: Vec<String>,
    pub found: bool,
    pub records: Vec<Record>,
}

impl ResolverResponse {
    /// Successful response carrying a single record
    pub fn with_links(found: bool, links: Vec<Link>) -> Self {
        Self {
            errors: Vec::new(),
            found,
            records: vec![Record {
                citation_supplemental: CitationSupplemental::default(),
                links,
            }],
        }
    }

    /// Error response: `found` is false and there are no records
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            found: false,
            records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let response = ResolverResponse::with_links(
            true,
            vec![Link {
                display_name: "ILL".to_string(),
                url: "https://ill.example/x".to_string(),
                coverage_text: String::new(),
            }],
        );

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "errors": [],
                "found": true,
                "records": [{
                    "citation_supplemental": {},
                    "links": [{
                        "display_name": "ILL",
                        "url": "https://ill.example/x",
                        "coverage_text": ""
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = ResolverResponse::error("Invalid coverage service request");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "errors": ["Invalid coverage service request"],
                "found": false,
                "records": []
            })
        );
    }
}
