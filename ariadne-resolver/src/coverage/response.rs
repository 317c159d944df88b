//! Coverage service response interpretation
//!
//! The service answers with a `ctx_obj_set` document. Only the first
//! context object and its first target list are consulted; every nested
//! list is read as "first element, or absent when empty".

use serde::Deserialize;
use tracing::warn;

use super::CoverageError;
use crate::link::{reconcile, NormalizedLink};

/// Generic "ask a librarian" referral, always removed from the answer
pub const ASK_A_LIBRARIAN_URL: &str = "http://library.nyu.edu/ask/";
/// Host of interlibrary-loan referral targets
pub const ILL_DOMAIN: &str = "ill.library.nyu.edu";

#[derive(Debug, Default, Deserialize)]
struct ContextObjectSet {
    #[serde(rename = "ctx_obj", default)]
    context_objects: Vec<ContextObject>,
}

#[derive(Debug, Default, Deserialize)]
struct ContextObject {
    #[serde(rename = "ctx_obj_targets", default)]
    target_lists: Vec<TargetList>,
}

#[derive(Debug, Default, Deserialize)]
struct TargetList {
    #[serde(rename = "target", default)]
    targets: Vec<RawTarget>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTarget {
    #[serde(default)]
    target_name: String,
    #[serde(default)]
    target_public_name: String,
    #[serde(default)]
    target_url: String,
    #[serde(default)]
    coverage: Vec<Coverage>,
}

#[derive(Debug, Default, Deserialize)]
struct Coverage {
    #[serde(default)]
    coverage_text: Vec<CoverageText>,
}

#[derive(Debug, Default, Deserialize)]
struct CoverageText {
    #[serde(default)]
    threshold_text: Vec<ThresholdText>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdText {
    #[serde(default)]
    coverage_statement: Vec<String>,
}

impl ContextObject {
    fn first_target_list(&self) -> Option<&TargetList> {
        self.target_lists.first()
    }
}

impl RawTarget {
    /// Statements of the first threshold text of the first coverage text of
    /// the first coverage block, joined with ". "
    fn coverage_statement(&self) -> Option<String> {
        let threshold = self
            .coverage
            .first()?
            .coverage_text
            .first()?
            .threshold_text
            .first()?;
        Some(threshold.coverage_statement.join(". "))
    }
}

/// How a target participates in the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A substantive delivery option
    Delivery,
    /// Interlibrary-loan referral: returned, but does not count as found
    InterlibraryLoan,
    /// Generic "ask a librarian" referral: removed
    AskALibrarian,
    /// No URL at all: removed
    Empty,
}

impl TargetKind {
    pub fn classify(url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() {
            TargetKind::Empty
        } else if url == ASK_A_LIBRARIAN_URL {
            TargetKind::AskALibrarian
        } else if url.contains(ILL_DOMAIN) {
            TargetKind::InterlibraryLoan
        } else {
            TargetKind::Delivery
        }
    }
}

/// One candidate link offered by the coverage service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTarget {
    pub name: String,
    pub public_name: String,
    pub url: String,
    pub coverage_text: Option<String>,
    pub kind: TargetKind,
}

impl CoverageTarget {
    fn from_raw(raw: &RawTarget) -> Self {
        Self {
            name: raw.target_name.clone(),
            public_name: raw.target_public_name.clone(),
            url: raw.target_url.clone(),
            coverage_text: raw.coverage_statement(),
            kind: TargetKind::classify(&raw.target_url),
        }
    }

    pub fn to_link(&self) -> NormalizedLink {
        NormalizedLink::new(
            self.public_name.clone(),
            self.url.clone(),
            self.coverage_text.clone().unwrap_or_default(),
        )
    }
}

/// Interpreted coverage response
#[derive(Debug, Clone)]
pub struct CoverageResponse {
    /// At least one substantive delivery target survived filtering
    pub found: bool,
    /// Surviving targets in response order
    pub targets: Vec<CoverageTarget>,
    /// Reconciled links built from `targets`
    pub links: Vec<NormalizedLink>,
    pub raw_body: String,
}

/// Parse and interpret a coverage service response body
pub fn interpret(body: &str) -> Result<CoverageResponse, CoverageError> {
    let set: ContextObjectSet =
        quick_xml::de::from_str(body).map_err(|e| CoverageError::Decode(e.to_string()))?;

    let context_object = set.context_objects.first().ok_or(CoverageError::NoContextObject)?;
    let raw_targets = context_object
        .first_target_list()
        .map(|list| list.targets.as_slice())
        .unwrap_or_default();

    let targets: Vec<CoverageTarget> = raw_targets
        .iter()
        .map(CoverageTarget::from_raw)
        .filter(|target| match target.kind {
            TargetKind::AskALibrarian => false,
            TargetKind::Empty => {
                warn!(target_name = %target.name, "Removing target with empty target URL");
                false
            }
            TargetKind::Delivery | TargetKind::InterlibraryLoan => true,
        })
        .collect();

    let found = is_found(&targets);
    let links = reconcile(targets.iter().map(CoverageTarget::to_link));

    Ok(CoverageResponse {
        found,
        targets,
        links,
        raw_body: body.to_string(),
    })
}

/// True iff some target is a substantive delivery option
pub fn is_found(targets: &[CoverageTarget]) -> bool {
    targets.iter().any(|target| target.kind == TargetKind::Delivery)
}
