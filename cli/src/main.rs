//! `FluxPay` CLI - Command-line interface for the `FluxPay` payment dashboard
//!
//! Submits payments to the metrics webhook, prints and watches the dashboard
//! counters, and runs offline simulations against an in-memory webhook.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use fluxpay_cli::{
    commands::{
        self,
        mask::MaskKind,
        simulate::SimulateRequest,
        submit::SubmitRequest,
        watch::WatchOptions,
    },
    config::{DashboardOverrides, FluxPayCliConfig},
    utils::formatting::{parse_output_format, OutputFormat},
};
use fluxpay_sdk::{HttpWebhook, PaymentDashboardController, SuccessConvention};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fluxpay-cli",
    version,
    about = "Command-line interface for the FluxPay payment dashboard",
    author = "FluxPay Team"
)]
struct Cli {
    /// Webhook receiving submissions (and serving metrics unless --metrics-url is set)
    #[arg(long)]
    webhook_url: Option<String>,

    /// Separate endpoint for metrics refreshes
    #[arg(long)]
    metrics_url: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    /// How submission responses are judged: explicit-status or http-2xx
    #[arg(long)]
    success_convention: Option<SuccessConvention>,

    /// JSON product catalog replacing the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a payment through the dashboard form
    Submit {
        /// Customer phone, digits or masked
        #[arg(long)]
        phone: String,

        /// Product key from the catalog; omit for an open amount
        #[arg(long)]
        product: Option<String>,

        /// Plan key, required for products with plans
        #[arg(long)]
        plan: Option<String>,

        /// Amount typed as digits read as cents (e.g. 1990 = R$ 19,90)
        #[arg(long)]
        amount: Option<String>,
    },

    /// Fetch and display the dashboard metrics once
    Metrics,

    /// Poll the metrics and print every update until Ctrl-C
    Watch {
        /// Poll interval in seconds
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Animate counter changes
        #[arg(long)]
        animate: bool,

        /// Stop after this many updates
        #[arg(long)]
        max_updates: Option<u64>,
    },

    /// Show how the dashboard masks a phone or currency input
    Mask {
        #[arg(value_enum)]
        kind: MaskKind,

        /// Raw input as typed
        raw: String,
    },

    /// Run submissions against an in-memory webhook
    Simulate {
        /// Number of submissions
        #[arg(long)]
        submissions: Option<u64>,

        /// Random seed for reproducible results
        #[arg(long)]
        seed: Option<u64>,

        /// Probability in [0, 1] that the simulated webhook fails
        #[arg(long, default_value = "0.1")]
        failure_rate: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = FluxPayCliConfig::new();

    // Use configuration with CLI overrides
    let default_output_format = parse_output_format(&config.default_output_format)?;
    let output_format = cli.output.unwrap_or(default_output_format);

    // Execute command
    let result = execute_command(&cli, &config, output_format).await;

    // Handle output formatting
    match result {
        Ok(output) => match output_format {
            OutputFormat::Human => println!("{output}"),
            OutputFormat::Json => {
                // Commands already produce JSON in this mode; plain messages are wrapped as strings
                let data = serde_json::from_str::<serde_json::Value>(&output)
                    .unwrap_or(serde_json::Value::String(output));
                let json_output = serde_json::json!({
                    "success": true,
                    "data": data
                });
                println!("{}", serde_json::to_string_pretty(&json_output)?);
            }
        },
        Err(e) => {
            match output_format {
                OutputFormat::Human => eprintln!("Error: {e}"),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "success": false,
                        "error": e.to_string()
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn execute_command(
    cli: &Cli,
    config: &FluxPayCliConfig,
    output_format: OutputFormat,
) -> Result<String> {
    let overrides = DashboardOverrides {
        webhook_url: cli.webhook_url.clone(),
        metrics_url: cli.metrics_url.clone(),
        success_convention: cli.success_convention,
        catalog_path: cli.catalog.clone(),
    };
    let dashboard = config.dashboard_config(&overrides)?;

    match &cli.command {
        Commands::Submit {
            phone,
            product,
            plan,
            amount,
        } => {
            let webhook = HttpWebhook::new(&dashboard)?;
            let controller = PaymentDashboardController::new(webhook, dashboard)?;
            let request = SubmitRequest {
                phone,
                product: product.as_deref(),
                plan: plan.as_deref(),
                amount: amount.as_deref(),
            };
            commands::execute_submit(&controller, &request, output_format).await
        }

        Commands::Metrics => {
            let webhook = HttpWebhook::new(&dashboard)?;
            commands::execute_metrics(&webhook, output_format).await
        }

        Commands::Watch {
            interval_secs,
            animate,
            max_updates,
        } => {
            let webhook = HttpWebhook::new(&dashboard)?;
            let options = WatchOptions {
                interval: interval_secs.map(Duration::from_secs),
                animate: *animate,
                max_updates: *max_updates,
            };
            commands::execute_watch(webhook, dashboard, &options, output_format, config).await
        }

        Commands::Mask { kind, raw } => commands::execute_mask(
            *kind,
            raw,
            dashboard.phone_policy.max_digits,
            output_format,
        ),

        Commands::Simulate {
            submissions,
            seed,
            failure_rate,
        } => {
            let request = SimulateRequest {
                submissions: submissions.unwrap_or(config.default_simulation_submissions),
                seed: *seed,
                failure_rate: *failure_rate,
            };
            commands::execute_simulate(dashboard, &request, output_format).await
        }
    }
}
