//! HTTP client for the Target dispatch service

use super::{build_agent, check_status, endpoint, request_error, ClientConfig, StatusSink};
use crate::types::{Result, TargetStatus};
use url::Url;

/// Pushes vehicle status with a POST per vehicle, authenticated by bearer token
pub struct TargetClient {
    agent: ureq::Agent,
    base_url: Url,
    authorization: String,
}

impl TargetClient {
    /// Create a client, validating base address and token
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.parse("target api key")?;
        Ok(Self {
            agent: build_agent(config.timeout),
            base_url,
            authorization: format!("Bearer {}", config.api_key.trim()),
        })
    }

    /// Status endpoint for one vehicle
    pub fn status_url(&self, target_id: &str) -> Result<Url> {
        endpoint(
            &self.base_url,
            &["interfaces", "public", "vehicle", target_id, "status"],
        )
    }
}

impl StatusSink for TargetClient {
    fn push_status(&self, target_id: &str, status: &TargetStatus) -> Result<()> {
        let url = self.status_url(target_id)?;
        log::trace!("POST {} (status {})", url, status.status);

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .send_json(status)
            .map_err(request_error)?;

        check_status(&mut response, &url)
    }
}
