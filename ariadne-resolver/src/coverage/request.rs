//! Coverage service request construction
//!
//! The coverage (SFX) service is queried with a form POST whose
//! `url_ctx_val` carries the citation as a Z39.88-2004 XML context object.

use std::fmt;
use std::str::FromStr;

use ariadne_common::OpenUrlQuery;
use quick_xml::escape::escape;
use tracing::debug;
use url::Url;

use super::CoverageError;
use crate::upstream::UpstreamRequest;

/// Legacy source identifier; some values trip the service's security filter
pub const SOURCE_ID_PARAM: &str = "sid";
/// Parameter the source identifier is moved to
pub const REFERRER_ID_PARAM: &str = "rfr_id";

const DOI_RESOLVER_URL: &str = "http://dx.doi.org";

/// OpenURL genres accepted by the coverage service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Genre {
    #[default]
    Journal,
    Book,
    Conference,
    Article,
    Preprint,
    Proceeding,
    BookItem,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Journal => "journal",
            Genre::Book => "book",
            Genre::Conference => "conference",
            Genre::Article => "article",
            Genre::Preprint => "preprint",
            Genre::Proceeding => "proceeding",
            Genre::BookItem => "bookitem",
        }
    }

    /// Metadata format name used in the XML context object
    fn metadata_format(&self) -> &'static str {
        match self {
            Genre::Book | Genre::BookItem => "book",
            _ => "journal",
        }
    }
}

impl FromStr for Genre {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "journal" => Ok(Genre::Journal),
            "book" => Ok(Genre::Book),
            "conference" => Ok(Genre::Conference),
            "article" => Ok(Genre::Article),
            "preprint" => Ok(Genre::Preprint),
            "proceeding" => Ok(Genre::Proceeding),
            "bookitem" => Ok(Genre::BookItem),
            _ => Err(CoverageError::InvalidGenre(s.to_string())),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound coverage request plus its diagnostic dump
#[derive(Debug, Clone)]
pub struct CoverageRequest {
    pub upstream: UpstreamRequest,
    pub dump: String,
    pub genre: Genre,
    pub ignores_date_threshold: bool,
}

/// Genre of the citation: absent defaults to journal, unknown is an error
pub fn resolve_genre(query: &OpenUrlQuery) -> Result<Genre, CoverageError> {
    match query.field_first("genre") {
        Some(raw) => raw.parse(),
        None => Ok(Genre::default()),
    }
}

/// Move every `sid` value to `rfr_id`, after any existing `rfr_id` values
pub fn rewrite_source_id(query: &mut OpenUrlQuery) {
    for value in query.remove(SOURCE_ID_PARAM) {
        query.push(REFERRER_ID_PARAM, value);
    }
}

/// Build the coverage request for `query`, stamped with the current time
pub fn build_request(base_url: &str, query: &OpenUrlQuery) -> Result<CoverageRequest, CoverageError> {
    let timestamp = chrono::Local::now().to_rfc3339();
    build_request_at(base_url, query, &timestamp)
}

/// Build the coverage request with an explicit context-object timestamp
pub fn build_request_at(
    base_url: &str,
    query: &OpenUrlQuery,
    timestamp: &str,
) -> Result<CoverageRequest, CoverageError> {
    let url = Url::parse(base_url).map_err(|e| CoverageError::InvalidUrl(format!("{base_url}: {e}")))?;

    let mut query = query.clone();
    rewrite_source_id(&mut query);

    let fields = query.citation_fields();
    if fields.is_empty() {
        return Err(CoverageError::NoCitationFields);
    }

    let genre = resolve_genre(&query)?;
    let referrer = query.first(REFERRER_ID_PARAM).unwrap_or_default().to_string();
    let context_object = context_object_xml(&fields, genre, &referrer, timestamp)?;

    // A citation with its own date wants the service's date-threshold filtering
    let ignores_date_threshold = query.field_first("date").is_none() && query.field_first("year").is_none();

    let mut params: Vec<(&str, String)> = vec![
        ("url_ver", "Z39.88-2004".to_string()),
        ("url_ctx_fmt", "info:ofi/fmt:xml:xsd:ctx".to_string()),
        ("sfx.response_type", "multi_obj_xml".to_string()),
        ("sfx.show_availability", "1".to_string()),
    ];
    if ignores_date_threshold {
        params.push(("sfx.ignore_date_threshold", "1".to_string()));
    }
    params.push(("sfx.doi_url", DOI_RESOLVER_URL.to_string()));
    params.push(("url_ctx_val", context_object));

    let upstream = UpstreamRequest::post_form(url, &params);
    let dump = upstream.dump();

    Ok(CoverageRequest {
        upstream,
        dump,
        genre,
        ignores_date_threshold,
    })
}

/// Render the citation as an XML context object.
///
/// Values are XML-escaped. Field names that cannot be element names are
/// skipped, and values with characters XML cannot carry are rejected.
fn context_object_xml(
    fields: &[(String, Vec<String>)],
    genre: Genre,
    referrer: &str,
    timestamp: &str,
) -> Result<String, CoverageError> {
    let format = genre.metadata_format();
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(concat!(
        r#"<ctx:context-objects xmlns:ctx="info:ofi/fmt:xml:xsd:ctx" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
        r#"xsi:schemaLocation="info:ofi/fmt:xml:xsd:ctx http://www.openurl.info/registry/docs/info:ofi/fmt:xml:xsd:ctx">"#
    ));
    xml.push_str(&format!(
        r#"<ctx:context-object timestamp="{}" version="Z39.88-2004" identifier="">"#,
        escape(timestamp)
    ));

    if !referrer.is_empty() {
        check_xml_chars(REFERRER_ID_PARAM, referrer)?;
        xml.push_str(&format!(
            "<ctx:referrer><ctx:identifier>{}</ctx:identifier></ctx:referrer>",
            escape(referrer)
        ));
    }

    xml.push_str("<ctx:referent><ctx:metadata-by-val>");
    xml.push_str(&format!("<ctx:format>info:ofi/fmt:xml:xsd:{format}</ctx:format>"));
    xml.push_str("<ctx:metadata>");
    xml.push_str(&format!(
        r#"<rft:{format} xmlns:rft="info:ofi/fmt:xml:xsd:{format}" xsi:schemaLocation="info:ofi/fmt:xml:xsd:{format} http://www.openurl.info/registry/docs/info:ofi/fmt:xml:xsd:{format}">"#
    ));
    xml.push_str(&format!("<rft:genre>{}</rft:genre>", genre.as_str()));

    for (name, values) in fields {
        if name == "genre" {
            continue;
        }
        if !is_element_name(name) {
            debug!(field = %name, "Skipping citation field with unusable name");
            continue;
        }
        for value in values {
            check_xml_chars(name, value)?;
            xml.push_str(&format!("<rft:{name}>{}</rft:{name}>", escape(value.as_str())));
        }
    }

    xml.push_str(&format!("</rft:{format}>"));
    xml.push_str("</ctx:metadata></ctx:metadata-by-val></ctx:referent>");
    xml.push_str("</ctx:context-object></ctx:context-objects>");

    Ok(xml)
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// XML 1.0 forbids most C0 control characters, even escaped
fn check_xml_chars(field: &str, value: &str) -> Result<(), CoverageError> {
    if value
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r') && (c as u32) < 0x20)
    {
        return Err(CoverageError::Serialize(field.to_string()));
    }
    Ok(())
}
