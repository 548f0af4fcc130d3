// src/lib.rs

//! Outage sync library
//!
//! Fetches device outages and site metadata from the outages API, keeps the
//! outages that belong to the site's devices and began on or after the
//! cutoff, and posts them back tagged with device names.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
