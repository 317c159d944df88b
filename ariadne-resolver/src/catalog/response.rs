//! Catalog service (Primo) search response model

use serde::{Deserialize, Deserializer, Serialize};

use super::CatalogError;
use crate::link::NormalizedLink;

/// Facet value marking a document as an active multi-edition work group
pub const ACTIVE_FRBR_GROUP_TYPE: &str = "5";
/// Label used for full-text links that carry no hyperlink text
pub const DEFAULT_LINK_DISPLAY_NAME: &str = "Link to Online Resource";

const LINK_TYPE_NAMESPACE: &str = "http://purl.org/pnx/linkType/";

/// Delivery link type. Only [`LinkType::LinkToResource`] is delivered to
/// callers; anything unrecognised stays in [`LinkType::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum LinkType {
    /// `linktorsrc`: full text / online resource
    LinkToResource,
    /// `linktoprice`: price or availability information
    LinkToPrice,
    /// `linktoholdings`
    LinkToHoldings,
    /// `thumbnail`
    Thumbnail,
    /// `backlink`
    BackLink,
    Unknown(String),
    #[default]
    Missing,
}

impl LinkType {
    /// Types allowed into the link pool
    pub fn is_deliverable(&self) -> bool {
        matches!(self, LinkType::LinkToResource)
    }
}

impl From<String> for LinkType {
    fn from(raw: String) -> Self {
        if raw.is_empty() {
            return LinkType::Missing;
        }
        // Only the full namespaced URI is recognised
        let known = match raw.strip_prefix(LINK_TYPE_NAMESPACE) {
            Some("linktorsrc") => Some(LinkType::LinkToResource),
            Some("linktoprice") => Some(LinkType::LinkToPrice),
            Some("linktoholdings") => Some(LinkType::LinkToHoldings),
            Some("thumbnail") => Some(LinkType::Thumbnail),
            Some("backlink") => Some(LinkType::BackLink),
            _ => None,
        };
        known.unwrap_or(LinkType::Unknown(raw))
    }
}

impl From<LinkType> for String {
    fn from(link_type: LinkType) -> Self {
        let token = match link_type {
            LinkType::LinkToResource => "linktorsrc",
            LinkType::LinkToPrice => "linktoprice",
            LinkType::LinkToHoldings => "linktoholdings",
            LinkType::Thumbnail => "thumbnail",
            LinkType::BackLink => "backlink",
            LinkType::Unknown(raw) => return raw,
            LinkType::Missing => return String::new(),
        };
        format!("{LINK_TYPE_NAMESPACE}{token}")
    }
}

/// A `null` value reads as the type's default, the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `null` list reads as empty and `null` elements as their default
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().map(Option::unwrap_or_default).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveryLink {
    #[serde(rename = "hyperlinkText", default, deserialize_with = "null_as_default")]
    pub hyperlink_text: String,
    #[serde(rename = "linkURL", default, deserialize_with = "null_as_default")]
    pub link_url: String,
    #[serde(rename = "linkType", default, deserialize_with = "null_as_default")]
    pub link_type: LinkType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Delivery {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub link: Vec<DeliveryLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Facets {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub frbrtype: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub frbrgroupid: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Search {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub isbn: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pnx {
    #[serde(default, deserialize_with = "null_as_default")]
    pub facets: Facets,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search: Search,
}

/// One search-result document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogDoc {
    #[serde(default, deserialize_with = "null_as_default")]
    pub delivery: Delivery,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pnx: Pnx,
}

impl CatalogDoc {
    /// Flagged as a grouped multi-edition work rather than one edition
    pub fn is_active_frbr_group(&self) -> bool {
        self.pnx
            .facets
            .frbrtype
            .iter()
            .any(|frbr_type| frbr_type == ACTIVE_FRBR_GROUP_TYPE)
    }

    /// First non-blank FRBR group identifier
    pub fn frbr_group_id(&self) -> Option<&str> {
        self.pnx
            .facets
            .frbrgroupid
            .iter()
            .map(|id| id.trim())
            .find(|id| !id.is_empty())
    }

    /// Literal membership of `isbn` in this document's identifiers
    pub fn lists_isbn(&self, isbn: &str) -> bool {
        self.pnx.search.isbn.iter().any(|candidate| candidate == isbn)
    }

    /// Deliverable links, in response order
    pub fn deliverable_links(&self) -> Vec<NormalizedLink> {
        self.delivery
            .link
            .iter()
            .filter(|link| link.link_type.is_deliverable())
            .map(|link| {
                let display_name = if link.hyperlink_text.is_empty() {
                    DEFAULT_LINK_DISPLAY_NAME
                } else {
                    link.hyperlink_text.as_str()
                };
                NormalizedLink::new(display_name, link.link_url.clone(), "")
            })
            .collect()
    }
}

/// Body of a catalog search response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub docs: Vec<CatalogDoc>,
}

impl SearchResponse {
    pub fn parse(body: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}
