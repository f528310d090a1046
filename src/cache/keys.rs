//! Cache keys for read endpoints
//!
//! A key is rendered from an endpoint path and its query parameters. Parameters
//! are sorted by name so the order in which a caller supplies them never changes
//! the key, and values are escaped so distinct parameter sets never collide.
//! A name given more than once keeps every value, in the order supplied, as a
//! repeated query parameter does on the wire.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of one logical request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts a key for the given endpoint path (e.g. `/attractions/region`)
    pub fn builder(endpoint: impl Into<String>) -> CacheKeyBuilder {
        CacheKeyBuilder {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey(s.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        CacheKey(s)
    }
}

/// Builder returned by [`CacheKey::builder`]
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    endpoint: String,
    params: BTreeMap<String, Vec<String>>,
}

impl CacheKeyBuilder {
    /// Adds a parameter. A later value for the same name is kept alongside
    /// the earlier ones.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Adds a parameter only when a value is present
    ///
    /// Absent optional parameters leave the key unchanged, matching a request
    /// that omits them from the query string.
    pub fn opt_param<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn build(self) -> CacheKey {
        let mut key = escape(&self.endpoint);
        for (name, values) in &self.params {
            for value in values {
                key.push(':');
                key.push_str(&escape(name));
                key.push('=');
                key.push_str(&escape(value));
            }
        }
        CacheKey(key)
    }
}

/// Percent-escapes the separator characters used in rendered keys
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}
