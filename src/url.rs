// src/url.rs

//! Outbound API URL construction.
//!
//! URLs are only built here, never fetched. Nothing is URL-encoded: keys,
//! values and explicit query strings are inserted literally, so callers must
//! pass already-encoded text.

use indexmap::IndexMap;

use crate::config::ConfigFile;

/// Environment query parameters, appended in insertion order.
pub type QueryParams = IndexMap<String, String>;

/// Append an optional explicit query string and the environment parameters
/// to `base_path`.
///
/// - A non-empty `explicit_query` is appended verbatim after `?`.
/// - Otherwise a bare `?` is appended when `env_params` is non-empty.
/// - Each parameter is appended as `key=value`, separated by `&` from
///   whatever query text precedes it.
///
/// ```
/// use domwatch::url::{build_url, QueryParams};
///
/// let mut env = QueryParams::new();
/// env.insert("a".into(), "1".into());
/// assert_eq!(build_url("/ep", Some("x=9"), &env), "/ep?x=9&a=1");
/// ```
pub fn build_url(base_path: &str, explicit_query: Option<&str>, env_params: &QueryParams) -> String {
    let mut url = String::from(base_path);
    let mut needs_separator = false;

    match explicit_query {
        Some(query) if !query.is_empty() => {
            url.push('?');
            url.push_str(query);
            needs_separator = true;
        }
        _ if !env_params.is_empty() => url.push('?'),
        _ => {}
    }

    for (key, value) in env_params {
        if needs_separator {
            url.push('&');
        }
        url.push_str(key);
        url.push('=');
        url.push_str(value);
        needs_separator = true;
    }

    url
}

/// The data-connector API: a fixed endpoint plus per-environment query
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataConnector {
    endpoint: String,
    query_params: QueryParams,
}

impl DataConnector {
    pub fn new(endpoint: impl Into<String>, query_params: QueryParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            query_params,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            cfg.data_connector.endpoint.clone(),
            cfg.data_connector.query_params.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// URL for `path` under the endpoint, with the environment parameters
    /// appended.
    pub fn api_url(&self, path: &str, query: Option<&str>) -> String {
        let base = format!("{}{}", self.endpoint, path);
        build_url(&base, query, &self.query_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_params_only() {
        let env = params(&[("a", "1"), ("b", "2")]);
        assert_eq!(build_url("/ep", None, &env), "/ep?a=1&b=2");
        assert_eq!(build_url("/ep", Some(""), &env), "/ep?a=1&b=2");
    }

    #[test]
    fn explicit_query_then_env_params() {
        let env = params(&[("a", "1")]);
        assert_eq!(build_url("/ep", Some("x=9"), &env), "/ep?x=9&a=1");
    }

    #[test]
    fn nothing_to_append() {
        assert_eq!(build_url("/ep", None, &QueryParams::new()), "/ep");
        assert_eq!(build_url("/ep", Some(""), &QueryParams::new()), "/ep");
    }

    #[test]
    fn explicit_query_without_env_params() {
        assert_eq!(
            build_url("/ep", Some("x=9&y=8"), &QueryParams::new()),
            "/ep?x=9&y=8"
        );
    }

    #[test]
    fn insertion_order_is_kept() {
        let env = params(&[("zeta", "z"), ("alpha", "a")]);
        assert_eq!(build_url("", None, &env), "?zeta=z&alpha=a");
    }

    #[test]
    fn values_are_not_encoded() {
        let env = params(&[("q", "a b&c")]);
        assert_eq!(build_url("/s", None, &env), "/s?q=a b&c");
    }

    #[test]
    fn data_connector_prefixes_endpoint() {
        let dc = DataConnector::new("https://api.example.com", params(&[("env", "prod")]));
        assert_eq!(
            dc.api_url("/v1/items", None),
            "https://api.example.com/v1/items?env=prod"
        );
        assert_eq!(
            dc.api_url("/v1/items", Some("page=2")),
            "https://api.example.com/v1/items?page=2&env=prod"
        );
    }
}
