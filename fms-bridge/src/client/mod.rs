//! Remote service clients
//!
//! The engine only talks to the two remote systems through the
//! [`StatusSource`] and [`StatusSink`] traits. The HTTP implementations live in
//! the submodules; both are stateless apart from their base address,
//! credential and HTTP agent, and perform exactly one request per call.

use crate::types::{Result, SourceStatus, SyncError, TargetStatus};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub mod source;
pub mod target;

pub use source::SourceClient;
pub use target::TargetClient;

/// Default per-request timeout, well under the minimum sync interval
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches current vehicle status from the Source system
pub trait StatusSource {
    /// Fetch the status of the vehicle with the given Source id
    fn fetch_status(&self, source_id: &str) -> Result<SourceStatus>;
}

/// Pushes translated vehicle status to the Target system
pub trait StatusSink {
    /// Push a status for the vehicle with the given Target id
    fn push_status(&self, target_id: &str, status: &TargetStatus) -> Result<()>;
}

impl<T: StatusSource + ?Sized> StatusSource for &T {
    fn fetch_status(&self, source_id: &str) -> Result<SourceStatus> {
        (**self).fetch_status(source_id)
    }
}

impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    fn fetch_status(&self, source_id: &str) -> Result<SourceStatus> {
        (**self).fetch_status(source_id)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for &T {
    fn push_status(&self, target_id: &str, status: &TargetStatus) -> Result<()> {
        (**self).push_status(target_id, status)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    fn push_status(&self, target_id: &str, status: &TargetStatus) -> Result<()> {
        (**self).push_status(target_id, status)
    }
}

/// Connection settings shared by both HTTP clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the remote API (e.g. `https://api.example.com`)
    pub base_url: String,
    /// Access key or bearer token
    pub api_key: String,
    /// Timeout applied to each request as a whole
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a client configuration with the default timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder method: set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the settings and parse the base address
    fn parse(&self, service: &'static str) -> Result<Url> {
        if self.api_key.trim().is_empty() {
            return Err(SyncError::MissingCredential(service));
        }
        parse_base_url(&self.base_url)
    }
}

/// Parse a base address, normalising it to end with `/`
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| SyncError::InvalidBaseAddress {
        address: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("address is empty"));
    }

    let normalised = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&normalised).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("address cannot be used as a base"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("address must not carry a query or fragment"));
    }

    Ok(url)
}

/// Append path segments (percent-encoded) to a base address
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SyncError::InvalidBaseAddress {
            address: base.to_string(),
            reason: "address cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Agent with a whole-request timeout; proxies from the environment are ignored
fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .proxy(None)
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

fn request_error(err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Json(e) => SyncError::MalformedPayload(e.to_string()),
        other => SyncError::Transport(other.to_string()),
    }
}

/// Turn a non-2xx response into an `HttpStatus` error carrying the body
fn check_status(
    response: &mut ureq::http::Response<ureq::Body>,
    endpoint: &Url,
) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let detail = response
        .body_mut()
        .read_to_string()
        .unwrap_or_default()
        .trim()
        .to_string();

    Err(SyncError::HttpStatus {
        status: status.as_u16(),
        endpoint: endpoint.path().to_string(),
        detail: if detail.is_empty() {
            status.canonical_reason().unwrap_or("no detail").to_string()
        } else {
            detail
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");

        let url = parse_base_url(" http://localhost:8080/ ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_invalid_base_urls() {
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("https://example.com/?key=1").is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = parse_base_url("https://api.example.com/root").unwrap();
        let url = endpoint(&base, &["vehicle", "a b/c", "status"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/root/vehicle/a%20b%2Fc/status");
    }

    #[test]
    fn test_missing_credential() {
        let config = ClientConfig::new("https://api.example.com", "  ");
        assert_eq!(
            config.parse("source"),
            Err(SyncError::MissingCredential("source"))
        );
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new("https://api.example.com", "key")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.parse("target").is_ok());
    }
}
