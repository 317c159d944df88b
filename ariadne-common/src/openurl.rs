//! OpenURL query string parsing
//!
//! Turns the raw query string of an inbound resolver request into a
//! multi-valued parameter map. Parsing never fails: malformed percent
//! escapes are kept literally, invalid UTF-8 is replaced, and empty or
//! key-less pairs are skipped, so whatever can be recovered is returned.
//!
//! Field lookups are ASCII case-insensitive. Citation fields may be given
//! in KEV form (`rft.isbn`) or in the older bare form (`isbn`); when both
//! are present the `rft.` form wins.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Prefix used by Z39.88-2004 KEV referent fields
pub const REFERENT_PREFIX: &str = "rft.";

/// Bare (OpenURL 0.1) field names accepted as citation fields when no
/// `rft.`-prefixed twin is present.
const BARE_CITATION_FIELDS: &[&str] = &[
    "genre", "aulast", "aufirst", "auinit", "auinit1", "auinitm", "au", "aucorp", "issn",
    "eissn", "coden", "isbn", "sici", "bici", "title", "stitle", "atitle", "btitle", "jtitle",
    "volume", "part", "issue", "spage", "epage", "pages", "artnum", "date", "year", "ssn",
    "quarter", "pub", "place", "edition", "series", "tpages",
];

/// Parsed OpenURL parameters, in first-appearance order of each key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenUrlQuery {
    params: Vec<(String, Vec<String>)>,
}

impl OpenUrlQuery {
    /// Parse a raw query string. A leading `?` is ignored.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut query = Self::default();

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            query.push(key, value.into_owned());
        }

        query
    }

    /// Append a value under `key` (exact key match for grouping)
    pub fn push(&mut self, key: &str, value: String) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value),
            None => self.params.push((key.to_string(), vec![value])),
        }
    }

    /// Remove every key equal to `name` (case-insensitive), returning the
    /// removed values in order.
    pub fn remove(&mut self, name: &str) -> Vec<String> {
        let mut removed = Vec::new();
        self.params.retain(|(key, values)| {
            if key.eq_ignore_ascii_case(name) {
                removed.extend(values.iter().cloned());
                false
            } else {
                true
            }
        });
        removed
    }

    /// All values for `name`, matched case-insensitively across key variants
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect()
    }

    /// First value for `name`, case-insensitive
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).into_iter().next()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Values of a logical citation field, preferring `rft.<field>` over a
    /// bare `<field>`. The bare form is only consulted when no prefixed form
    /// exists.
    pub fn field(&self, field: &str) -> Vec<&str> {
        let prefixed = self.values(&format!("{REFERENT_PREFIX}{field}"));
        if !prefixed.is_empty() {
            return prefixed;
        }
        self.values(field)
    }

    /// First non-empty value of a logical citation field
    pub fn field_first(&self, field: &str) -> Option<&str> {
        self.field(field)
            .into_iter()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Citation fields keyed by logical (unprefixed, lower-cased) name.
    ///
    /// Every `rft.`-prefixed key is included. A bare key is included only if
    /// it is a known OpenURL citation field and has no prefixed twin.
    pub fn citation_fields(&self) -> Vec<(String, Vec<String>)> {
        let mut fields: Vec<(String, Vec<String>)> = Vec::new();

        for (key, values) in &self.params {
            let lowered = key.to_ascii_lowercase();
            let Some(name) = lowered.strip_prefix(REFERENT_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            merge_field(&mut fields, name, values);
        }

        for (key, values) in &self.params {
            let name = key.to_ascii_lowercase();
            if !BARE_CITATION_FIELDS.contains(&name.as_str()) {
                continue;
            }
            if self.contains(&format!("{REFERENT_PREFIX}{name}")) {
                continue;
            }
            merge_field(&mut fields, &name, values);
        }

        fields
    }
}

fn merge_field(fields: &mut Vec<(String, Vec<String>)>, name: &str, values: &[String]) {
    match fields.iter_mut().find(|(existing, _)| existing == name) {
        Some((_, existing)) => existing.extend(values.iter().cloned()),
        None => fields.push((name.to_string(), values.to_vec())),
    }
}

impl Serialize for OpenUrlQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (key, values) in &self.params {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}
