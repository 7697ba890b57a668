//! Watch command implementation
//!
//! Runs the dashboard controller's background poller and prints every
//! snapshot it publishes until interrupted.

use crate::{
    config::FluxPayCliConfig,
    utils::formatting::{format_count_up_frame, format_snapshot_line, OutputFormat},
};
use anyhow::Result;
use fluxpay_sdk::{CountUp, DashboardConfig, MetricsSnapshot, MetricsWebhook, PaymentDashboardController};
use std::{io::Write, time::Duration};
use tracing::{info, warn};

#[derive(Clone, Debug, Default)]
pub struct WatchOptions {
    /// Poll interval override; the dashboard default applies when `None`
    pub interval: Option<Duration>,
    /// Animate counter changes (human output only)
    pub animate: bool,
    /// Stop after this many snapshots
    pub max_updates: Option<u64>,
}

/// Execute the watch command
///
/// # Errors
/// Returns error if the controller cannot be started or output fails
pub async fn execute<W: MetricsWebhook + 'static>(
    webhook: W,
    mut dashboard: DashboardConfig,
    options: &WatchOptions,
    output_format: OutputFormat,
    config: &FluxPayCliConfig,
) -> Result<String> {
    if let Some(interval) = options.interval {
        dashboard.poll_interval = interval;
    }
    let controller = PaymentDashboardController::new(webhook, dashboard)?;
    let mut updates = controller.subscribe();
    let mut previous = controller.snapshot();
    let mut received = 0u64;

    info!(
        "Watching metrics every {}s",
        controller.config().poll_interval.as_secs()
    );
    controller.start()?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {e}");
                }
                info!("Received Ctrl-C, stopping watch");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if options.animate && output_format == OutputFormat::Human {
                    animate(&previous, &snapshot, config).await?;
                } else {
                    println!("{}", format_snapshot_line(&snapshot, output_format)?);
                }
                previous = snapshot;
                received = received.saturating_add(1);
                if options.max_updates.is_some_and(|max| received >= max) {
                    break;
                }
            }
        }
    }

    controller.dispose().await;
    Ok(format!("Stopped watching after {received} update(s)"))
}

/// Count the four counters up from the previous snapshot to the new one
async fn animate(from: &MetricsSnapshot, to: &MetricsSnapshot, config: &FluxPayCliConfig) -> Result<()> {
    let duration = config.count_up_duration();
    let fps = config.frame_rate();
    let frames = |from: f64, to: f64| CountUp::new(from, to, duration).frames(fps);

    let invested = frames(from.invested.to_units(), to.invested.to_units());
    let billed = frames(from.billed.to_units(), to.billed.to_units());
    let roas = frames(from.roas, to.roas);
    let profit = frames(from.profit.to_units(), to.profit.to_units());

    let mut stdout = std::io::stdout();
    for (((invested, billed), roas), profit) in invested.iter().zip(&billed).zip(&roas).zip(&profit) {
        // Clear to end of line; frames can get shorter
        write!(
            stdout,
            "\r{}\x1b[K",
            format_count_up_frame(*invested, *billed, *roas, *profit)
        )?;
        stdout.flush()?;
        tokio::time::sleep(config.frame_interval()).await;
    }
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxpay_sdk::{MetricsSimulator, SimulatorConfig};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_after_max_updates() {
        let simulator = Arc::new(MetricsSimulator::new(SimulatorConfig::default()).unwrap());
        let dashboard = DashboardConfig::from_url("https://hooks.example.com/fluxpay").unwrap();
        let options = WatchOptions {
            interval: Some(Duration::from_secs(60)),
            animate: false,
            max_updates: Some(3),
        };

        let output = execute(
            Arc::clone(&simulator),
            dashboard,
            &options,
            OutputFormat::Json,
            &FluxPayCliConfig::new(),
        )
        .await
        .unwrap();

        assert_eq!(output, "Stopped watching after 3 update(s)");
        assert_eq!(simulator.stats().fetches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_completes() {
        let config = FluxPayCliConfig {
            animation_fps: 10,
            count_up_duration_ms: 200,
            ..FluxPayCliConfig::new()
        };
        let from = MetricsSnapshot::zero();
        let to = MetricsSnapshot::new(
            fluxpay_sdk::Money::from_cents(100_000),
            fluxpay_sdk::Money::from_cents(250_000),
            fluxpay_sdk::Money::from_cents(150_000),
        );
        animate(&from, &to, &config).await.unwrap();
    }
}
