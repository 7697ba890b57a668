//! Simulation command implementation
//!
//! Drives the dashboard controller against the in-memory metrics simulator
//! with randomly generated forms, so the full submit/refresh cycle can be
//! exercised without a real webhook. Runs are reproducible for a given seed.

use crate::utils::formatting::{
    format_simulation_human, format_simulation_json, OutputFormat, SimulationSummary,
};
use anyhow::{anyhow, Result};
use fluxpay_sdk::{
    Catalog, DashboardConfig, MetricsSimulator, PaymentDashboardController, PaymentForm, Pricing,
    SimulatorConfig,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};

const AREA_CODES: [u8; 8] = [11, 21, 31, 41, 51, 61, 71, 81];

#[derive(Clone, Debug)]
pub struct SimulateRequest {
    pub submissions: u64,
    pub seed: Option<u64>,
    pub failure_rate: f64,
}

impl SimulateRequest {
    /// Validate command parameters
    pub fn validate(&self) -> Result<()> {
        if self.submissions == 0 {
            return Err(anyhow!("Submissions must be greater than 0"));
        }
        if self.submissions > 10_000 {
            return Err(anyhow!("Submissions must not exceed 10,000"));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(anyhow!(
                "Failure rate must be between 0 and 1, got: {}",
                self.failure_rate
            ));
        }
        Ok(())
    }
}

/// Generates plausible dashboard forms from the catalog
pub struct FormGenerator {
    rng: StdRng,
    catalog: Catalog,
}

impl FormGenerator {
    #[must_use]
    pub fn new(seed: u64, catalog: Catalog) -> Self {
        Self {
            // Offset so forms do not mirror the simulator's own draws
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            catalog,
        }
    }

    fn phone(&mut self) -> String {
        let area = AREA_CODES[self.rng.gen_range(0..AREA_CODES.len())];
        let subscriber: u32 = self.rng.gen_range(0..100_000_000);
        format!("{area}9{subscriber:08}")
    }

    fn open_amount(&mut self) -> String {
        // R$ 10,00 to R$ 500,00, typed as cents
        self.rng.gen_range(1_000_u32..=50_000).to_string()
    }

    /// Next random form: a catalog product with one of its plans, or an open amount
    pub fn next_form(&mut self) -> PaymentForm {
        let phone = self.phone();
        let choice = self.rng.gen_range(0..=self.catalog.products.len());

        let Some(product) = self.catalog.products.get(choice).cloned() else {
            return PaymentForm {
                phone,
                product: None,
                plan: None,
                amount: self.open_amount(),
            };
        };

        match &product.pricing {
            Pricing::Plans { plans } => {
                let plan = &plans[self.rng.gen_range(0..plans.len())];
                PaymentForm {
                    phone,
                    product: Some(product.key.clone()),
                    plan: Some(plan.key.clone()),
                    amount: String::new(),
                }
            }
            Pricing::OpenAmount => PaymentForm {
                phone,
                product: Some(product.key.clone()),
                plan: None,
                amount: self.open_amount(),
            },
        }
    }
}

/// Execute the simulate command
///
/// # Errors
/// Returns error if the request or simulator configuration is invalid
pub async fn execute(
    dashboard: DashboardConfig,
    request: &SimulateRequest,
    output_format: OutputFormat,
) -> Result<String> {
    request.validate()?;
    let seed = request.seed.unwrap_or_else(rand::random);
    info!(
        "Starting simulation: {} submissions, seed {}, failure rate {}",
        request.submissions, seed, request.failure_rate
    );

    let simulator = Arc::new(MetricsSimulator::new(SimulatorConfig {
        seed,
        failure_rate: request.failure_rate,
        ..SimulatorConfig::default()
    })?);
    let mut forms = FormGenerator::new(seed, dashboard.catalog.clone());
    let controller = PaymentDashboardController::new(Arc::clone(&simulator), dashboard)?;

    let mut accepted = 0u64;
    let mut rejected = 0u64;
    for index in 0..request.submissions {
        controller.fill(forms.next_form());
        match controller.submit().await {
            Ok(receipt) => {
                accepted = accepted.saturating_add(1);
                debug!("Submission {index} accepted: {}", receipt.submission.amount);
            }
            Err(e) => {
                rejected = rejected.saturating_add(1);
                warn!("Submission {index} rejected: {e}");
            }
        }
    }

    let snapshot = match controller.refresh_metrics().await {
        Some(snapshot) => snapshot,
        None => controller.snapshot(),
    };

    let summary = SimulationSummary {
        submissions: request.submissions,
        accepted,
        rejected,
        simulator: simulator.stats(),
        snapshot,
    };
    info!("Simulation finished: {accepted} accepted, {rejected} rejected");

    match output_format {
        OutputFormat::Human => Ok(format_simulation_human(&summary)),
        OutputFormat::Json => format_simulation_json(&summary),
    }
}
