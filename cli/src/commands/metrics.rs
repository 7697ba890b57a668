//! Metrics command implementation

use super::describe_error;
use crate::utils::formatting::{format_snapshot_human, format_snapshot_json, OutputFormat};
use anyhow::Result;
use fluxpay_sdk::{interpret_metrics, MetricsWebhook};
use tracing::info;

/// Execute the metrics command: fetch the counters once and print them
///
/// Unlike the background poller, a failed fetch is reported to the caller.
///
/// # Errors
/// Returns error if the webhook is unreachable or answers with something
/// other than metrics
pub async fn execute(webhook: &dyn MetricsWebhook, output_format: OutputFormat) -> Result<String> {
    info!("Fetching dashboard metrics");

    let response = webhook
        .fetch_metrics()
        .await
        .map_err(|e| describe_error(&e))?;
    let snapshot = interpret_metrics(&response).map_err(|e| describe_error(&e))?;

    match output_format {
        OutputFormat::Human => Ok(format_snapshot_human(&snapshot)),
        OutputFormat::Json => format_snapshot_json(&snapshot),
    }
}
