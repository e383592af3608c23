//! HTTP client for the Source status-tracking service

use super::{build_agent, check_status, endpoint, request_error, ClientConfig, StatusSource};
use crate::types::{Result, SourceStatus};
use url::Url;

/// Fetches vehicle status with a GET per vehicle, authenticated by access key
pub struct SourceClient {
    agent: ureq::Agent,
    base_url: Url,
    access_key: String,
}

impl SourceClient {
    /// Create a client, validating base address and access key
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.parse("source access key")?;
        Ok(Self {
            agent: build_agent(config.timeout),
            base_url,
            access_key: config.api_key.clone(),
        })
    }

    /// Status endpoint for one vehicle (without the access key)
    pub fn status_url(&self, source_id: &str) -> Result<Url> {
        endpoint(
            &self.base_url,
            &["api", "v2", "using-vehicles", "get-status", source_id],
        )
    }
}

impl StatusSource for SourceClient {
    fn fetch_status(&self, source_id: &str) -> Result<SourceStatus> {
        let url = self.status_url(source_id)?;
        log::trace!("GET {}", url);

        let mut response = self
            .agent
            .get(url.as_str())
            .query("accesskey", &self.access_key)
            .header("Accept", "application/json")
            .call()
            .map_err(request_error)?;

        check_status(&mut response, &url)?;

        response
            .body_mut()
            .read_json::<SourceStatus>()
            .map_err(request_error)
    }
}
