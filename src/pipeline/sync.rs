// src/pipeline/sync.rs

//! Outage sync pipeline: fetch, transform, post.

use serde_json::Value;

use crate::error::{AppError, Result, Stage};
use crate::models::EnrichedOutage;
use crate::services::OutageApi;
use crate::utils;

use super::transform::filter_and_transform;

/// Options for one sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Stop after the transform instead of posting
    pub dry_run: bool,
}

/// How a sync run ended when nothing failed.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Outages were accepted by the API
    Posted { count: usize, response: Value },
    /// No outage survived the filter, so nothing was sent
    NothingToPost,
    /// Dry run; the outages that would have been posted
    DryRun { outages: Vec<EnrichedOutage> },
}

/// Run the full sync for one site.
///
/// Any failed API call stops the run before later stages; nothing is posted
/// unless both fetches succeeded.
pub async fn run_sync(api: &OutageApi, site_id: &str, options: &SyncOptions) -> Result<SyncOutcome> {
    utils::log::header(&format!("Syncing outages for site '{site_id}'"));
    let total_steps = if options.dry_run { 3 } else { 4 };

    utils::log::step(1, total_steps, "Fetching all outages");
    let outages = api
        .get_all_outages()
        .await
        .map_err(|e| AppError::stage(Stage::FetchOutages, e))?;
    log::info!("Fetched {} outages.", outages.len());

    utils::log::step(2, total_steps, &format!("Fetching site information for '{site_id}'"));
    let site_info = api
        .get_site_info(site_id)
        .await
        .map_err(|e| AppError::stage(Stage::FetchSiteInfo, e))?;
    log::info!("Fetched site information ({} devices).", site_info.devices.len());

    utils::log::step(3, total_steps, "Filtering and transforming outages");
    let processed = filter_and_transform(&outages, &site_info);
    log::info!("Filtered and transformed {} outages.", processed.len());
    for outage in &processed {
        log::debug!("{} {} ({})", outage.id(), outage.outage.begin, outage.name);
    }

    if options.dry_run {
        log::info!("Dry run, not posting.");
        return Ok(SyncOutcome::DryRun { outages: processed });
    }

    utils::log::step(4, total_steps, "Posting processed outages");
    let count = processed.len();
    let response = api
        .post_site_outages(site_id, &processed)
        .await
        .map_err(|e| AppError::stage(Stage::PostOutages, e))?;

    match response {
        Some(response) => {
            utils::log::summary(
                "Sync complete",
                &[("Site", site_id.to_string()), ("Posted", count.to_string())],
            );
            Ok(SyncOutcome::Posted { count, response })
        }
        None => Ok(SyncOutcome::NothingToPost),
    }
}
