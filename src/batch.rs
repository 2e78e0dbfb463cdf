//! Concurrent batch resolution over a bounded worker pool.
//!
//! Lookups run in parallel up to the pool width, but results land in input
//! order: every task carries its row index and writes into its own slot.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::warn;
use tokio::sync::Semaphore;

use crate::geocode::{Resolution, ResolveAddress, ResolveFailure};

/// Resolve every address, with at most `width` lookups in flight.
///
/// The returned vector has the same length as `addresses`, and `output[i]`
/// is the outcome for `addresses[i]` regardless of completion order. A
/// failed lookup never cancels or delays any other, and the batch returns
/// only once every lookup has settled.
pub async fn resolve_all<R>(
    resolver: Arc<R>,
    addresses: Vec<String>,
    width: usize,
) -> Vec<Resolution>
where
    R: ResolveAddress + Send + Sync + 'static,
{
    // Pre-filled slots so a task that never reports leaves an explicit
    // unresolved outcome at its index.
    let mut outcomes = vec![
        Resolution::Unresolved {
            reason: ResolveFailure::Aborted
        };
        addresses.len()
    ];

    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut tasks = FuturesUnordered::new();

    for (index, address) in addresses.into_iter().enumerate() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Worker pool closed, skipping address {address:?}");
                continue;
            }
        };

        let resolver = Arc::clone(&resolver);
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            (index, resolver.resolve(&address).await)
        }));
    }

    while let Some(joined) = tasks.next().await {
        match joined {
            Ok((index, resolution)) => outcomes[index] = resolution,
            Err(join_error) => warn!("Geocoding task panicked: {join_error:?}"),
        }
    }

    outcomes
}

/// Summary counts for a completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

impl BatchReport {
    pub fn tally(outcomes: &[Resolution]) -> Self {
        let resolved = outcomes
            .iter()
            .filter(|outcome| outcome.coordinates().is_some())
            .count();
        Self {
            total: outcomes.len(),
            resolved,
            unresolved: outcomes.len() - resolved,
        }
    }
}
