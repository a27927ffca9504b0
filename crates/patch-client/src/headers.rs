//! Case-insensitive header merging.
//!
//! Headers reach a request from three sources, applied in this order:
//!
//! 1. client default headers
//! 2. headers derived from the access token and account type
//! 3. per-call headers from [`RequestOptions`](crate::RequestOptions)
//!
//! Later sources override earlier ones. Names are compared
//! case-insensitively and emitted in HTTP title case, so `accept` and
//! `ACCEPT` collapse into a single `Accept` entry.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::AccountType;

pub const ACCEPT: &str = "Accept";
pub const ACCOUNT_TYPE: &str = "Account-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

const BEARER_PREFIX: &str = "Bearer ";

/// An ordered set of headers with one entry per case-insensitive name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any entry whose name differs only by case.
    ///
    /// Blank names are dropped and `false` is returned.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> bool {
        match canonical_header_key(name.as_ref()) {
            Some(key) => {
                self.entries.insert(key, value.into());
                true
            }
            None => false,
        }
    }

    /// Apply a batch of headers in lexicographic order of their raw names.
    ///
    /// Sorting makes the winner deterministic when a batch holds two names
    /// that differ only by case.
    pub fn apply<K, V, I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut batch: Vec<(K, V)> = batch.into_iter().collect();
        batch.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));
        for (name, value) in batch {
            self.insert(name, value);
        }
    }

    /// Look up a header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = canonical_header_key(name)?;
        self.entries.get(&key).map(String::as_str)
    }

    /// Returns true if a header with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a header by case-insensitive name.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = canonical_header_key(name)?;
        self.entries.remove(&key)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no headers are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a non-blank `Authorization` header is present.
    pub fn has_authorization(&self) -> bool {
        self.get(AUTHORIZATION)
            .is_some_and(|v| !v.trim().is_empty())
    }
}

impl fmt::Debug for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.iter() {
            if name == AUTHORIZATION {
                map.entry(&name, &"[REDACTED]");
            } else {
                map.entry(&name, &value);
            }
        }
        map.finish()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        set.apply(iter);
        set
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Canonicalize a header name to HTTP title case (`content-type` -> `Content-Type`).
///
/// Returns `None` for blank names.
pub fn canonical_header_key(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        upper = ch == '-';
    }
    Some(out)
}

/// Format a token as an `Authorization` value.
///
/// Tokens that already carry a `Bearer ` prefix (any case) pass through
/// unchanged.
pub fn as_bearer(token: &str) -> String {
    let has_prefix = token
        .get(..BEARER_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(BEARER_PREFIX));
    if has_prefix {
        token.to_string()
    } else {
        format!("{BEARER_PREFIX}{token}")
    }
}

/// Headers derived from the effective access token and account type.
pub fn auth_headers(token: Option<&str>, account_type: Option<AccountType>) -> HeaderSet {
    let mut headers = HeaderSet::new();
    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        headers.insert(AUTHORIZATION, as_bearer(token));
    }
    if let Some(account_type) = account_type {
        headers.insert(ACCOUNT_TYPE, account_type.as_str());
    }
    headers
}

/// Merge header sources in order; later sources win per case-insensitive name.
pub fn merge_headers<'a, I>(sources: I) -> HeaderSet
where
    I: IntoIterator<Item = &'a HeaderSet>,
{
    let mut merged = HeaderSet::new();
    for source in sources {
        for (name, value) in source {
            merged.insert(name, value);
        }
    }
    merged
}
