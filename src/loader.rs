//! Blocking HTTP loader for pages, linked stylesheets and frame documents.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::{Error, InspectConfig, Result};

/// Thin wrapper over a `reqwest` blocking client configured from
/// [`InspectConfig`].
#[derive(Debug, Clone)]
pub struct Loader {
    client: Client,
}

impl Loader {
    pub fn new(config: &InspectConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| Error::ConfigError(format!("Invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ConfigError(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ConfigError(format!("Invalid header value for {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Non-success statuses are errors.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        log::debug!("fetching {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("GET {} returned {}", url, status)));
        }

        resp.text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))
    }
}

/// Resolve `href` against `base`, falling back to `href` when either does
/// not parse.
pub(crate) fn resolve_url(base: Option<&str>, href: &str) -> String {
    base.and_then(|b| url::Url::parse(b).ok())
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            resolve_url(Some("http://example.com/dir/page.html"), "style.css"),
            "http://example.com/dir/style.css"
        );
        assert_eq!(
            resolve_url(Some("http://example.com/dir/page.html"), "/root.css"),
            "http://example.com/root.css"
        );
        assert_eq!(resolve_url(None, "style.css"), "style.css");
    }

    #[test]
    fn rejects_bad_header_config() {
        let mut config = InspectConfig::default();
        config.headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(Loader::new(&config), Err(Error::ConfigError(_))));
    }
}
