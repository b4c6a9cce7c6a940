//! Request identity and intercepted request types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// The (method, URL) pair that identifies a request in the cache.
///
/// Lookups are exact-match on both fields. In practice the agent only
/// ever caches GET requests, but the method is part of the identity so
/// that a POST to the same URL can never shadow a cached GET.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    /// Identity for a GET request, the common case.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Flat string form used as the key in persisted generation maps.
    pub fn storage_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An intercepted request, as handed to the agent's fetch handler.
///
/// `is_navigation` distinguishes top-level document loads from
/// sub-resource requests; the router picks its strategy from it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub is_navigation: bool,
}

impl FetchRequest {
    /// A top-level document load.
    pub fn navigation(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            headers: HashMap::new(),
            is_navigation: true,
        }
    }

    /// A sub-resource request (script, stylesheet, image, API call...).
    pub fn subresource(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            headers: HashMap::new(),
            is_navigation: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The cache identity for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), self.url.as_str())
    }

    /// Whether the request declares it accepts HTML content.
    ///
    /// Decides if the offline fallback document is a meaningful answer
    /// when both cache and network fail. Navigation requests accept HTML
    /// by definition, whether or not the header is present.
    pub fn accepts_html(&self) -> bool {
        if self.is_navigation {
            return true;
        }
        self.headers
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("accept") && value.contains("text/html"))
    }
}

// ============================================================================
// Tests
// ============================================================================
