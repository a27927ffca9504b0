//! URL construction: base URL + path template + query parameters.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{Error, ErrorKind, Result};
use crate::security::url::encode_param;

/// Every path template must live under this prefix.
pub const API_PREFIX: &str = "/api/v3/";

const PLACEHOLDER: &str = "{}";

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Not supplied; the key is omitted.
    Absent,
    /// A single value with set semantics.
    Single(String),
    /// Repeated `key=` entries in list order. `None` elements are skipped.
    List(Vec<Option<String>>),
}

impl QueryValue {
    fn emitted(&self) -> Vec<&str> {
        match self {
            QueryValue::Absent => Vec::new(),
            QueryValue::Single(v) if v.is_empty() => Vec::new(),
            QueryValue::Single(v) => vec![v.as_str()],
            QueryValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_deref())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Absent, Into::into)
    }
}

/// Query parameters keyed by name. Setting a key again replaces its value.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Expand `{}` placeholders in `template` with independently escaped segments.
///
/// A `/` inside a segment value is percent-encoded rather than treated as a
/// path separator. Segments that would expand to `.` or `..` are rejected.
pub fn expand_path(template: &str, segments: &[String]) -> Result<String> {
    if !template.starts_with(API_PREFIX) {
        return Err(invalid_path(format!(
            "path template must start with {API_PREFIX}: {template}"
        )));
    }
    if template.contains(['?', '#', '\\']) || template.contains("://") {
        return Err(invalid_path(format!(
            "path template must be a bare path: {template}"
        )));
    }

    let placeholders = template.matches(PLACEHOLDER).count();
    if placeholders != segments.len() {
        return Err(invalid_path(format!(
            "path template {template} expects {placeholders} segments, got {}",
            segments.len()
        )));
    }

    let mut out = String::with_capacity(template.len() + segments.iter().map(String::len).sum::<usize>());
    let mut rest = template;
    for segment in segments {
        if segment.is_empty() {
            return Err(invalid_path(format!(
                "empty path segment for template {template}"
            )));
        }
        // Counts were checked above, so every segment has a placeholder.
        let (head, tail) = rest.split_once(PLACEHOLDER).unwrap_or((rest, ""));
        out.push_str(head);
        out.push_str(&encode_param(segment));
        rest = tail;
    }
    out.push_str(rest);

    if out.split('/').any(|s| s == "." || s == "..") {
        return Err(invalid_path(format!("dot segment in path {out}")));
    }

    Ok(out)
}

/// Join `path` onto `base` and merge `query` into any existing query string.
///
/// The base path prefix is kept. Empty and absent values are omitted, lists
/// become repeated keys, and call-supplied keys replace base keys.
pub fn build_url(base: &Url, path: &str, query: &QueryParams) -> Result<Url> {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{path}"));
    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = base
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in query {
        if key.trim().is_empty() {
            continue;
        }
        let values = value.emitted();
        if values.is_empty() {
            continue;
        }
        pairs.retain(|(k, _)| k != key);
        pairs.extend(values.into_iter().map(|v| (key.clone(), v.to_string())));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }

    Ok(url)
}

fn invalid_path(message: String) -> Error {
    Error::new(ErrorKind::InvalidPath(message))
}
