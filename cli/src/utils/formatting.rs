//! Output formatting utilities for the `FluxPay` CLI

use anyhow::{anyhow, Result};
use fluxpay_sdk::{format_brl, format_roas, MetricsSnapshot, Money, SimulatorStats, SubmissionReceipt};
use serde_json::json;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Parse output format from string
///
/// # Errors
/// Returns an error for anything other than `human` or `json`
pub fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
    match format_str.to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(anyhow!("Invalid output format: {format_str}")),
    }
}

/// Format the dashboard counters for a terminal
#[must_use]
pub fn format_snapshot_human(snapshot: &MetricsSnapshot) -> String {
    let display = snapshot.display();
    let mut output = String::new();

    let _ = writeln!(output, "{:<10} {:>18}", "Invested", display.invested);
    let _ = writeln!(output, "{:<10} {:>18}", "Billed", display.billed);
    let _ = writeln!(output, "{:<10} {:>18}", "ROAS", display.roas);
    let _ = write!(output, "{:<10} {:>18}", "Profit", display.profit);
    if let Some(updated_at) = snapshot.updated_at {
        let _ = write!(
            output,
            "\n{:<10} {:>18}",
            "Updated",
            updated_at.format("%Y-%m-%d %H:%M:%S").to_string()
        );
    }
    output
}

fn snapshot_value(snapshot: &MetricsSnapshot) -> serde_json::Value {
    let display = snapshot.display();
    json!({
        "invested_cents": snapshot.invested.cents(),
        "billed_cents": snapshot.billed.cents(),
        "profit_cents": snapshot.profit.cents(),
        "roas": snapshot.roas,
        "updated_at": snapshot.updated_at,
        "display": display,
    })
}

/// Format the dashboard counters for JSON output
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_snapshot_json(snapshot: &MetricsSnapshot) -> Result<String> {
    serde_json::to_string_pretty(&snapshot_value(snapshot))
        .map_err(|e| anyhow!("Failed to serialize metrics to JSON: {e}"))
}

/// Single-line snapshot, used for streaming updates
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_snapshot_line(snapshot: &MetricsSnapshot, output_format: OutputFormat) -> Result<String> {
    match output_format {
        OutputFormat::Human => {
            let display = snapshot.display();
            Ok(format!(
                "Invested {} | Billed {} | ROAS {} | Profit {}",
                display.invested, display.billed, display.roas, display.profit
            ))
        }
        OutputFormat::Json => serde_json::to_string(&snapshot_value(snapshot))
            .map_err(|e| anyhow!("Failed to serialize metrics to JSON: {e}")),
    }
}

/// One animation frame of the counters, values in currency units
#[must_use]
pub fn format_count_up_frame(invested: f64, billed: f64, roas: f64, profit: f64) -> String {
    let money = |units: f64| format_brl(Money::from_units(units));
    format!(
        "Invested {} | Billed {} | ROAS {} | Profit {}",
        money(invested),
        money(billed),
        format_roas(roas),
        money(profit)
    )
}

/// Format an accepted submission for human-readable output
#[must_use]
pub fn format_receipt_human(receipt: &SubmissionReceipt) -> String {
    let submission = &receipt.submission;
    let mut output = format!("{}\n\n", receipt.notice.message);

    let _ = writeln!(output, "Phone:    {} digits", submission.phone.len());
    let _ = writeln!(
        output,
        "Product:  {}",
        submission.product.as_deref().unwrap_or("(open amount)")
    );
    if let Some(plan) = &submission.plan {
        let _ = writeln!(output, "Plan:     {plan}");
    }
    let _ = write!(output, "Amount:   {}", submission.amount);

    match &receipt.snapshot {
        Some(snapshot) => {
            output.push_str("\n\n");
            output.push_str(&format_snapshot_human(snapshot));
        }
        None => output.push_str("\n\nWebhook returned no metrics"),
    }
    output
}

/// Format an accepted submission for JSON output
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_receipt_json(receipt: &SubmissionReceipt) -> Result<String> {
    let submission = &receipt.submission;
    let value = json!({
        "notice": receipt.notice,
        "submission": {
            "phone_digits": submission.phone.len(),
            "product": submission.product,
            "plan": submission.plan,
            "amount": submission.amount,
        },
        "metrics": receipt.snapshot.as_ref().map(snapshot_value),
    });
    serde_json::to_string_pretty(&value)
        .map_err(|e| anyhow!("Failed to serialize submission to JSON: {e}"))
}

/// Summary of a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub submissions: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub simulator: SimulatorStats,
    pub snapshot: MetricsSnapshot,
}

#[must_use]
pub fn format_simulation_human(summary: &SimulationSummary) -> String {
    let mut output = String::from("Simulation complete\n\n");
    let _ = writeln!(output, "Submissions: {}", summary.submissions);
    let _ = writeln!(output, "Accepted:    {}", summary.accepted);
    let _ = writeln!(output, "Rejected:    {}", summary.rejected);
    let _ = writeln!(output, "Fetches:     {}\n", summary.simulator.fetches);
    output.push_str(&format_snapshot_human(&summary.snapshot));
    output
}

/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_simulation_json(summary: &SimulationSummary) -> Result<String> {
    let value = json!({
        "submissions": summary.submissions,
        "accepted": summary.accepted,
        "rejected": summary.rejected,
        "simulator": {
            "accepted": summary.simulator.accepted,
            "failed": summary.simulator.failed,
            "fetches": summary.simulator.fetches,
        },
        "metrics": snapshot_value(&summary.snapshot),
    });
    serde_json::to_string_pretty(&value)
        .map_err(|e| anyhow!("Failed to serialize simulation summary to JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxpay_sdk::{Notice, PaymentSubmission};

    fn scenario_snapshot() -> MetricsSnapshot {
        MetricsSnapshot::new(
            Money::from_cents(100_000),
            Money::from_cents(250_000),
            Money::from_cents(150_000),
        )
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("human").unwrap(), OutputFormat::Human);
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("yaml").is_err());
    }

    #[test]
    fn test_snapshot_human() {
        let output = format_snapshot_human(&scenario_snapshot());
        assert!(output.contains("R$ 1.000,00"));
        assert!(output.contains("R$ 2.500,00"));
        assert!(output.contains("2.50x"));
        assert!(output.contains("R$ 1.500,00"));
    }

    #[test]
    fn test_snapshot_json() {
        let output = format_snapshot_json(&scenario_snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["billed_cents"], 250_000);
        assert_eq!(value["display"]["roas"], "2.50x");
        assert_eq!(value["display"]["profit"], "R$ 1.500,00");
    }

    #[test]
    fn test_snapshot_line_is_single_line() {
        let snapshot = scenario_snapshot();
        for format in [OutputFormat::Human, OutputFormat::Json] {
            let line = format_snapshot_line(&snapshot, format).unwrap();
            assert!(!line.contains('\n'));
        }
    }

    #[test]
    fn test_count_up_frame() {
        assert_eq!(
            format_count_up_frame(1000.0, 2500.0, 2.5, 1500.0),
            "Invested R$ 1.000,00 | Billed R$ 2.500,00 | ROAS 2.50x | Profit R$ 1.500,00"
        );
    }

    #[test]
    fn test_receipt_formats() {
        let receipt = SubmissionReceipt {
            submission: PaymentSubmission {
                phone: "11987654321".to_string(),
                product: Some("guia_noiva_inteligente".to_string()),
                plan: Some("premium".to_string()),
                amount: Money::from_cents(1990),
            },
            snapshot: None,
            notice: Notice::success("Pagamento registrado com sucesso!"),
        };

        let human = format_receipt_human(&receipt);
        assert!(human.starts_with("Pagamento registrado com sucesso!"));
        assert!(human.contains("R$ 19,90"));
        // Full phone numbers stay out of the output
        assert!(!human.contains("11987654321"));

        let value: serde_json::Value =
            serde_json::from_str(&format_receipt_json(&receipt).unwrap()).unwrap();
        assert_eq!(value["notice"]["kind"], "success");
        assert_eq!(value["submission"]["plan"], "premium");
        assert_eq!(value["submission"]["phone_digits"], 11);
        assert_eq!(value["submission"]["amount"], 1990);
        assert!(value["submission"].get("phone").is_none());
        assert!(!value.to_string().contains("11987654321"));
        assert!(value["metrics"].is_null());
    }
}
