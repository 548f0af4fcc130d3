//! Outage API service.
//!
//! Named operations for the three endpoints this client uses, built on the
//! request executor.

use reqwest::Method;
use serde_json::Value;
use urlencoding::encode;

use crate::error::{FetchError, FetchResult, Result};
use crate::models::{Config, EnrichedOutage, Outage, SiteInfo};
use crate::services::executor::RequestExecutor;

/// Client for the outages API.
pub struct OutageApi {
    executor: RequestExecutor,
}

impl OutageApi {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Create a client for the configured API.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(RequestExecutor::from_config(config)?))
    }

    /// Fetch every outage known to the API.
    pub async fn get_all_outages(&self) -> FetchResult<Vec<Outage>> {
        self.executor.execute(Method::GET, "/outages", None).await
    }

    /// Fetch the devices of a site.
    pub async fn get_site_info(&self, site_id: &str) -> FetchResult<SiteInfo> {
        let endpoint = format!("/site-info/{}", encode(site_id));
        self.executor.execute(Method::GET, &endpoint, None).await
    }

    /// Post enriched outages for a site.
    ///
    /// Returns `Ok(None)` without calling the API when there is nothing to
    /// post, otherwise the server's acknowledgment.
    pub async fn post_site_outages(
        &self,
        site_id: &str,
        outages: &[EnrichedOutage],
    ) -> FetchResult<Option<Value>> {
        if outages.is_empty() {
            log::warn!("No outages to post. Skipping the POST operation.");
            return Ok(None);
        }

        let body = serde_json::to_value(outages).map_err(|e| FetchError::Encode(e.to_string()))?;
        let endpoint = format!("/site-outages/{}", encode(site_id));

        match self
            .executor
            .execute::<Value>(Method::POST, &endpoint, Some(&body))
            .await
        {
            Ok(response) => {
                log::info!("Outages posted successfully.");
                Ok(Some(response))
            }
            Err(e) => {
                log::error!("Failed to post the outages: {}", e);
                Err(e)
            }
        }
    }
}
