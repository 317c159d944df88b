//! Backend-agnostic link model and the link reconciler

use std::collections::HashSet;

/// A delivery link reduced to the shape both backends share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLink {
    pub display_name: String,
    pub url: String,
    /// Empty when the backend has no coverage statement
    pub coverage_text: String,
}

impl NormalizedLink {
    pub fn new(display_name: impl Into<String>, url: impl Into<String>, coverage_text: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            url: url.into(),
            coverage_text: coverage_text.into(),
        }
    }
}

/// Deduplicate by exact URL (first occurrence wins), then stable-sort by
/// display name, ignoring case.
///
/// Applying this to its own output returns the same list.
pub fn reconcile<I>(links: I) -> Vec<NormalizedLink>
where
    I: IntoIterator<Item = NormalizedLink>,
{
    let mut seen = HashSet::new();
    let mut reconciled: Vec<NormalizedLink> = links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect();

    // sort_by_cached_key is stable
    reconciled.sort_by_cached_key(|link| link.display_name.to_lowercase());
    reconciled
}
