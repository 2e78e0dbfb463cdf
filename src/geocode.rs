//! Client for a Google-style geocoding HTTP API.
//!
//! A lookup failure never escapes this module: every transport error,
//! non-success HTTP status, provider error status, and undecodable payload
//! is folded into [`Resolution::Unresolved`] and logged, so one bad address
//! cannot abort a batch.

use std::future::Future;

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::config::Config;

/// The outcome of geocoding a single address.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The provider returned at least one match; the coordinates come from
    /// the first result, later candidates are ignored.
    Resolved { latitude: f64, longitude: f64 },
    /// The lookup produced no usable coordinates.
    Unresolved { reason: ResolveFailure },
}

impl Resolution {
    /// Both coordinates, present only for resolved addresses.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match *self {
            Resolution::Resolved {
                latitude,
                longitude,
            } => Some((latitude, longitude)),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Why a lookup came back without coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveFailure {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("no results found for the address")]
    ZeroResults,
    #[error("provider status {0}")]
    ProviderStatus(String),
    #[error("malformed response: {0}")]
    MalformedPayload(String),
    #[error("lookup was aborted before completing")]
    Aborted,
}

/// An address-to-coordinates resolver.
///
/// The batch resolver needs exactly this one capability, so tests can stand
/// in a stub without a network.
pub trait ResolveAddress {
    fn resolve(&self, address: &str) -> impl Future<Output = Resolution> + Send;
}

/// The provider's response envelope. Only the fields this crate consumes
/// are modeled.
#[derive(Debug, Deserialize)]
struct GeocodePayload {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: ResultGeometry,
}

#[derive(Debug, Deserialize)]
struct ResultGeometry {
    location: ResultLocation,
}

#[derive(Debug, Deserialize)]
struct ResultLocation {
    lat: f64,
    lng: f64,
}

/// Geocodes addresses through the configured HTTP endpoint.
pub struct GeocodeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn lookup(&self, address: &str) -> Result<(f64, f64), ResolveFailure> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ResolveFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveFailure::HttpStatus(status.as_u16()));
        }

        let payload: GeocodePayload = response
            .json()
            .await
            .map_err(|e| ResolveFailure::MalformedPayload(e.to_string()))?;

        interpret(payload)
    }
}

impl ResolveAddress for GeocodeClient {
    async fn resolve(&self, address: &str) -> Resolution {
        match self.lookup(address).await {
            Ok((latitude, longitude)) => Resolution::Resolved {
                latitude,
                longitude,
            },
            Err(reason) => {
                warn!("Could not geocode {address:?}: {reason}. Continuing.");
                Resolution::Unresolved { reason }
            }
        }
    }
}

/// Map a decoded payload to coordinates. Only the first result is
/// consulted; an `OK` payload with an empty result list counts as zero
/// results.
fn interpret(payload: GeocodePayload) -> Result<(f64, f64), ResolveFailure> {
    match payload.status.as_str() {
        "OK" => match payload.results.first() {
            Some(result) => Ok((result.geometry.location.lat, result.geometry.location.lng)),
            None => Err(ResolveFailure::ZeroResults),
        },
        "ZERO_RESULTS" => Err(ResolveFailure::ZeroResults),
        other => Err(ResolveFailure::ProviderStatus(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> GeocodePayload {
        serde_json::from_str(json).expect("payload should decode")
    }

    #[test]
    fn takes_the_first_result_only() {
        let payload = payload(
            r#"{
                "status": "OK",
                "results": [
                    {"geometry": {"location": {"lat": 59.329323, "lng": 18.068581}}},
                    {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
                ]
            }"#,
        );
        assert_eq!(interpret(payload), Ok((59.329323, 18.068581)));
    }

    #[test]
    fn zero_results_status_is_unresolved() {
        let payload = payload(r#"{"status": "ZERO_RESULTS", "results": []}"#);
        assert_eq!(interpret(payload), Err(ResolveFailure::ZeroResults));
    }

    #[test]
    fn ok_with_no_results_is_unresolved() {
        let payload = payload(r#"{"status": "OK"}"#);
        assert_eq!(interpret(payload), Err(ResolveFailure::ZeroResults));
    }

    #[test]
    fn other_statuses_are_unresolved() {
        let payload = payload(r#"{"status": "REQUEST_DENIED", "results": []}"#);
        assert_eq!(
            interpret(payload),
            Err(ResolveFailure::ProviderStatus("REQUEST_DENIED".into()))
        );
    }

    #[test]
    fn payload_without_status_fails_to_decode() {
        let result = serde_json::from_str::<GeocodePayload>(r#"{"results": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn result_without_location_fails_to_decode() {
        let result = serde_json::from_str::<GeocodePayload>(
            r#"{"status": "OK", "results": [{"geometry": {}}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn coordinates_are_absent_for_unresolved() {
        let unresolved = Resolution::Unresolved {
            reason: ResolveFailure::ZeroResults,
        };
        assert_eq!(unresolved.coordinates(), None);

        let resolved = Resolution::Resolved {
            latitude: 48.8,
            longitude: 2.3,
        };
        assert_eq!(resolved.coordinates(), Some((48.8, 2.3)));
    }
}
