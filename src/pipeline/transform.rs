// src/pipeline/transform.rs

//! Outage filtering and enrichment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{EnrichedOutage, Outage, SiteInfo};

/// Unix time of 2022-01-01T00:00:00Z; outages that began earlier are ignored.
pub const CUTOFF_UNIX_SECS: i64 = 1_640_995_200;

/// The cutoff instant as a UTC timestamp.
pub fn cutoff() -> DateTime<Utc> {
    DateTime::from_timestamp(CUTOFF_UNIX_SECS, 0).unwrap_or_default()
}

/// Keep outages that began at or after the cutoff on a device of the site,
/// tagging each with the device name.
///
/// Input order is preserved. If the site lists a device id twice the last
/// entry's name is used. An outage whose `begin` cannot be parsed is dropped
/// with a warning.
pub fn filter_and_transform(outages: &[Outage], site_info: &SiteInfo) -> Vec<EnrichedOutage> {
    let cutoff = cutoff();
    let device_names: HashMap<&str, &str> = site_info
        .devices
        .iter()
        .map(|device| (device.id.as_str(), device.name.as_str()))
        .collect();

    outages
        .iter()
        .filter_map(|outage| {
            let Some(begin) = outage.begin_at() else {
                log::warn!(
                    "Skipping outage for device {}: unparseable begin '{}'",
                    outage.id,
                    outage.begin
                );
                return None;
            };
            if begin < cutoff {
                return None;
            }
            let name = device_names.get(outage.id.as_str())?;
            Some(EnrichedOutage::new(outage.clone(), *name))
        })
        .collect()
}
