//! Runtime settings for the geocoding stage, injected through the
//! environment so no credential lives in the source.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Endpoint used when `GEOCODING_ENDPOINT` is unset.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Lookups in flight at once unless `GEOCODING_POOL_WIDTH` overrides it.
pub const DEFAULT_POOL_WIDTH: usize = 50;

/// Per-request timeout unless `GEOCODING_TIMEOUT_SECS` overrides it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for the geocoding stage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Access credential sent with every lookup.
    pub api_key: String,
    /// Geocoding endpoint URL.
    pub endpoint: String,
    /// Maximum number of concurrent lookups.
    pub pool_width: usize,
    /// Upper bound on a single lookup round trip.
    pub request_timeout: Duration,
}

impl Config {
    /// Read settings from the environment. The API key is required, the
    /// rest have defaults. Invalid values fail here, before any geocoding
    /// work starts.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEOCODING_API_KEY")
            .context("GEOCODING_API_KEY is not set; a geocoding API credential is required")?;

        let endpoint =
            env::var("GEOCODING_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let pool_width = match env::var("GEOCODING_POOL_WIDTH") {
            Ok(raw) => {
                let width: usize = raw
                    .parse()
                    .with_context(|| format!("GEOCODING_POOL_WIDTH is not a number: {raw:?}"))?;
                if width == 0 {
                    bail!("GEOCODING_POOL_WIDTH must be at least 1");
                }
                width
            }
            Err(_) => DEFAULT_POOL_WIDTH,
        };

        let request_timeout = match env::var("GEOCODING_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("GEOCODING_TIMEOUT_SECS is not a number: {raw:?}"))?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            endpoint,
            pool_width,
            request_timeout,
        })
    }
}
