//! Submit command implementation

use super::describe_error;
use crate::utils::formatting::{format_receipt_human, format_receipt_json, OutputFormat};
use anyhow::Result;
use fluxpay_sdk::{MetricsWebhook, PaymentDashboardController};
use tracing::info;

/// Form values as typed on the command line
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    pub phone: &'a str,
    pub product: Option<&'a str>,
    pub plan: Option<&'a str>,
    pub amount: Option<&'a str>,
}

/// Execute the submit command
///
/// Fills the form through the same handlers an interactive dashboard would
/// use, then submits it once.
///
/// # Errors
/// Returns error if validation fails or the webhook rejects the payment
pub async fn execute<W: MetricsWebhook + 'static>(
    controller: &PaymentDashboardController<W>,
    request: &SubmitRequest<'_>,
    output_format: OutputFormat,
) -> Result<String> {
    info!("Starting payment submission");

    controller.input_phone(request.phone);
    controller.select_product(request.product);
    controller.select_plan(request.plan);
    if let Some(amount) = request.amount {
        controller.input_amount(amount);
    }

    let receipt = controller.submit().await.map_err(|e| describe_error(&e))?;
    info!(
        "Payment accepted, amount {}",
        receipt.submission.amount
    );

    match output_format {
        OutputFormat::Human => Ok(format_receipt_human(&receipt)),
        OutputFormat::Json => format_receipt_json(&receipt),
    }
}
