//! Scrape aggregation
//!
//! Runs a set of providers concurrently and merges whatever they return.
//! A provider that errors or exceeds the timeout contributes nothing; the
//! scrape as a whole never fails.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, instrument, trace, warn};

use crate::providers::MetricsProvider;

/// Collect from all `providers` concurrently and join the non-empty
/// outputs with newlines, in provider order.
#[instrument(skip_all, fields(providers = providers.len()))]
pub async fn aggregate(providers: &[Arc<dyn MetricsProvider>], timeout: Duration) -> String {
    let results = join_all(providers.iter().map(|provider| async move {
        let outcome = tokio::time::timeout(timeout, provider.collect()).await;
        (provider.name(), outcome)
    }))
    .await;

    let fragments: Vec<String> = results
        .into_iter()
        .filter_map(|(name, outcome)| match outcome {
            Ok(Ok(text)) => {
                trace!("{name}: collected {} bytes", text.len());
                Some(text)
            }
            Ok(Err(e)) => {
                error!("{name}: collection failed: {:#}", e);
                None
            }
            Err(_) => {
                warn!("{name}: collection timed out after {timeout:?}");
                None
            }
        })
        .filter(|text| !text.is_empty())
        .collect();

    fragments.join("\n")
}
