//! In-memory metrics webhook for demos and tests
//!
//! Behaves like the real webhook from the controller's point of view: every
//! accepted submission is added to the billed total, a random ad spend is
//! added to the invested total, and the reply carries the updated metrics in
//! the `{status, investido, faturamentoTotal, lucro}` shape. A configurable
//! share of requests fails with HTTP 500. Runs are reproducible for a given
//! seed.

#![forbid(unsafe_code)]

use crate::{
    error::{FluxPayError, Result},
    types::Money,
    webhook::MetricsWebhook,
    wire::{SubmissionPayload, WebhookResponse, STATUS_OK},
};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;
use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};
use tracing::{debug, info};

/// Knobs for the simulated webhook
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// Probability in `[0, 1]` that a request answers HTTP 500
    pub failure_rate: f64,
    /// Ad spend drawn per accepted submission, as a fraction of its amount
    pub min_spend_ratio: f64,
    pub max_spend_ratio: f64,
    /// Artificial delay before answering
    pub latency: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            failure_rate: 0.0,
            min_spend_ratio: 0.2,
            max_spend_ratio: 0.6,
            latency: Duration::ZERO,
        }
    }
}

impl SimulatorConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(FluxPayError::Config(format!(
                "Failure rate must be between 0 and 1, got: {}",
                self.failure_rate
            )));
        }
        let finite = self.min_spend_ratio.is_finite() && self.max_spend_ratio.is_finite();
        if !(finite && self.min_spend_ratio >= 0.0 && self.min_spend_ratio <= self.max_spend_ratio) {
            return Err(FluxPayError::Config(format!(
                "Invalid spend ratio range: {}..{}",
                self.min_spend_ratio, self.max_spend_ratio
            )));
        }
        Ok(())
    }
}

/// Counters describing what the simulator has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub accepted: u64,
    pub failed: u64,
    pub fetches: u64,
}

#[derive(Debug)]
struct SimulatorState {
    rng: StdRng,
    invested: Money,
    billed: Money,
    stats: SimulatorStats,
}

/// Webhook double that keeps metrics in memory
#[derive(Debug)]
pub struct MetricsSimulator {
    config: SimulatorConfig,
    state: Mutex<SimulatorState>,
}

impl MetricsSimulator {
    /// Create a simulator starting from zero metrics
    ///
    /// # Errors
    /// Returns an error if the failure rate or spend ratios are out of range
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        info!(
            service = "fluxpay-sdk",
            component = "metrics_simulator",
            event = "simulator_created",
            seed = config.seed,
            failure_rate = config.failure_rate,
            "Metrics simulator initialized"
        );
        Ok(Self {
            state: Mutex::new(SimulatorState {
                rng: StdRng::seed_from_u64(config.seed),
                invested: Money::ZERO,
                billed: Money::ZERO,
                stats: SimulatorStats::default(),
            }),
            config,
        })
    }

    #[must_use]
    pub fn stats(&self) -> SimulatorStats {
        self.lock().stats
    }

    /// Current totals as `(invested, billed)`
    #[must_use]
    pub fn totals(&self) -> (Money, Money) {
        let state = self.lock();
        (state.invested, state.billed)
    }

    fn lock(&self) -> MutexGuard<'_, SimulatorState> {
        // A panic while holding the lock cannot leave the totals half-written
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn delay(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn failure() -> WebhookResponse {
        WebhookResponse::new(
            500,
            json!({"status": "error", "mensagem": "Falha simulada no processamento."}).to_string(),
        )
    }

    fn record(&self, payload: &SubmissionPayload) -> WebhookResponse {
        let mut state = self.lock();
        if state.rng.gen::<f64>() < self.config.failure_rate {
            state.stats.failed = state.stats.failed.saturating_add(1);
            return Self::failure();
        }

        let amount = Money::from_units(payload.valor);
        let ratio = if self.config.max_spend_ratio > self.config.min_spend_ratio {
            state
                .rng
                .gen_range(self.config.min_spend_ratio..self.config.max_spend_ratio)
        } else {
            self.config.min_spend_ratio
        };
        let spend = Money::from_units(amount.to_units() * ratio);

        state.billed = state.billed.saturating_add(amount);
        state.invested = state.invested.saturating_add(spend);
        state.stats.accepted = state.stats.accepted.saturating_add(1);

        debug!(
            amount_cents = amount.cents(),
            spend_cents = spend.cents(),
            billed_cents = state.billed.cents(),
            "Simulated submission accepted"
        );

        WebhookResponse::ok_json(&json!({
            "status": STATUS_OK,
            "mensagem": "Pagamento registrado com sucesso!",
            "investido": state.invested.to_units(),
            "faturamentoTotal": state.billed.to_units(),
            "lucro": state.billed.saturating_sub(state.invested).to_units(),
        }))
    }
}

#[async_trait]
impl MetricsWebhook for MetricsSimulator {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookResponse> {
        self.delay().await;
        Ok(self.record(payload))
    }

    async fn fetch_metrics(&self) -> Result<WebhookResponse> {
        self.delay().await;
        let mut state = self.lock();
        state.stats.fetches = state.stats.fetches.saturating_add(1);
        Ok(WebhookResponse::ok_json(&json!({
            "investido": state.invested.to_units(),
            "faturado": state.billed.to_units(),
            "lucro": state.billed.saturating_sub(state.invested).to_units(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{interpret_metrics, interpret_submission};
    use crate::config::SuccessConvention;

    fn payload(valor: f64) -> SubmissionPayload {
        SubmissionPayload {
            telefone: "11987654321".to_string(),
            produto: None,
            plano: None,
            valor,
        }
    }

    #[tokio::test]
    async fn test_simulator_accumulates_metrics() {
        let simulator = MetricsSimulator::new(SimulatorConfig::default()).unwrap();

        let first = simulator.submit(&payload(19.9)).await.unwrap();
        let reply = interpret_submission(&first, SuccessConvention::ExplicitStatus).unwrap();
        let snapshot = reply.snapshot.unwrap();
        assert_eq!(snapshot.billed, Money::from_cents(1990));
        assert!(snapshot.invested.cents() >= 398 && snapshot.invested.cents() <= 1194);
        assert_eq!(snapshot.profit, snapshot.billed.saturating_sub(snapshot.invested));

        simulator.submit(&payload(10.0)).await.unwrap();
        let (_, billed) = simulator.totals();
        assert_eq!(billed, Money::from_cents(2990));

        let metrics = interpret_metrics(&simulator.fetch_metrics().await.unwrap()).unwrap();
        assert_eq!(metrics.billed, Money::from_cents(2990));
        assert_eq!(
            simulator.stats(),
            SimulatorStats {
                accepted: 2,
                failed: 0,
                fetches: 1
            }
        );
    }

    #[tokio::test]
    async fn test_simulator_is_deterministic() {
        let run = || async {
            let simulator = MetricsSimulator::new(SimulatorConfig {
                seed: 7,
                failure_rate: 0.3,
                ..SimulatorConfig::default()
            })
            .unwrap();
            for _ in 0..20 {
                simulator.submit(&payload(50.0)).await.unwrap();
            }
            (simulator.totals(), simulator.stats())
        };
        assert_eq!(run().await, run().await);
    }

    #[tokio::test]
    async fn test_simulator_always_fails_at_full_rate() {
        let simulator = MetricsSimulator::new(SimulatorConfig {
            failure_rate: 1.0,
            ..SimulatorConfig::default()
        })
        .unwrap();
        let response = simulator.submit(&payload(19.9)).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(simulator.totals(), (Money::ZERO, Money::ZERO));
        assert_eq!(simulator.stats().failed, 1);
    }

    #[test]
    fn test_simulator_config_validation() {
        assert!(MetricsSimulator::new(SimulatorConfig {
            failure_rate: 1.5,
            ..SimulatorConfig::default()
        })
        .is_err());
        assert!(MetricsSimulator::new(SimulatorConfig {
            min_spend_ratio: 0.8,
            max_spend_ratio: 0.2,
            ..SimulatorConfig::default()
        })
        .is_err());
        assert!(MetricsSimulator::new(SimulatorConfig {
            max_spend_ratio: f64::INFINITY,
            ..SimulatorConfig::default()
        })
        .is_err());
        assert!(MetricsSimulator::new(SimulatorConfig {
            min_spend_ratio: f64::NAN,
            ..SimulatorConfig::default()
        })
        .is_err());
    }
}
