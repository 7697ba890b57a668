//! Payment dashboard controller
//!
//! Owns the form, the metrics snapshot, the in-flight guard, and the
//! background poller. One instance is built at startup; `start()` begins
//! polling and `dispose()` stops it.
//!
//! # Example
//!
//! ```no_run
//! use fluxpay_sdk::{DashboardConfig, HttpWebhook, PaymentDashboardController};
//!
//! # async fn run() -> fluxpay_sdk::Result<()> {
//! let config = DashboardConfig::from_url("https://hooks.example.com/fluxpay")?;
//! let webhook = HttpWebhook::new(&config)?;
//! let controller = PaymentDashboardController::new(webhook, config)?;
//! controller.start()?;
//!
//! controller.input_phone("11987654321");
//! controller.select_product(Some("guia_noiva_inteligente"));
//! controller.select_plan(Some("premium"));
//! match controller.submit().await {
//!     Ok(receipt) => println!("{}", receipt.notice.message),
//!     Err(error) => eprintln!("{}", error.notice().message),
//! }
//!
//! controller.dispose().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use crate::{
    config::DashboardConfig,
    error::{FluxPayError, Notice, Result, DEFAULT_SUCCESS_MESSAGE},
    normalize::{mask_phone, normalize_currency_input},
    types::{MetricsSnapshot, PaymentForm, PaymentSubmission, SubmissionState},
    validation::validate,
    webhook::MetricsWebhook,
    wire::{interpret_metrics, interpret_submission, SubmissionPayload},
};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, warn};

/// Result of an accepted submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    /// What was sent
    pub submission: PaymentSubmission,
    /// Snapshot published from the response, if it carried metrics
    pub snapshot: Option<MetricsSnapshot>,
    pub notice: Notice,
}

/// Releases the in-flight flag when the submission ends, however it ends
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct Poller {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct Inner<W> {
    webhook: W,
    config: DashboardConfig,
    form: Mutex<PaymentForm>,
    in_flight: AtomicBool,
    snapshot: watch::Sender<MetricsSnapshot>,
}

impl<W: MetricsWebhook> Inner<W> {
    fn form(&self) -> MutexGuard<'_, PaymentForm> {
        // The form holds plain strings, a poisoned lock still has a usable value
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the snapshot wholesale; last writer wins
    fn publish(&self, snapshot: MetricsSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    async fn refresh(&self) -> Option<MetricsSnapshot> {
        let result = match self.webhook.fetch_metrics().await {
            Ok(response) => interpret_metrics(&response),
            Err(error) => Err(error),
        };

        match result {
            Ok(snapshot) => {
                debug!(
                    service = "fluxpay-sdk",
                    component = "dashboard_controller",
                    event = "metrics_refreshed",
                    invested_cents = snapshot.invested.cents(),
                    billed_cents = snapshot.billed.cents(),
                    profit_cents = snapshot.profit.cents(),
                );
                self.publish(snapshot.clone());
                Some(snapshot)
            }
            Err(error) => {
                warn!(
                    service = "fluxpay-sdk",
                    component = "dashboard_controller",
                    event = "metrics_refresh_failed",
                    error = %error,
                    "Keeping last known metrics"
                );
                None
            }
        }
    }
}

/// The dashboard's business logic, free of any rendering concerns
pub struct PaymentDashboardController<W: MetricsWebhook + 'static> {
    inner: Arc<Inner<W>>,
    poller: Mutex<Option<Poller>>,
}

impl<W: MetricsWebhook + 'static> PaymentDashboardController<W> {
    /// Create a controller with a zeroed snapshot and an empty form
    ///
    /// # Errors
    /// Returns an error if the configuration is inconsistent
    pub fn new(webhook: W, config: DashboardConfig) -> Result<Self> {
        config.check()?;
        let (snapshot, _) = watch::channel(MetricsSnapshot::zero());

        info!(
            service = "fluxpay-sdk",
            component = "dashboard_controller",
            event = "controller_created",
            webhook_url = %config.webhook_url,
            poll_interval_secs = config.poll_interval.as_secs(),
            success_convention = ?config.success_convention,
            "Dashboard controller initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                webhook,
                config,
                form: Mutex::new(PaymentForm::default()),
                in_flight: AtomicBool::new(false),
                snapshot,
            }),
            poller: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn webhook(&self) -> &W {
        &self.inner.webhook
    }

    // ========================================
    // Form handlers
    // ========================================

    /// Phone field changed; stores and returns the masked value
    pub fn input_phone(&self, raw: &str) -> String {
        let masked = mask_phone(raw, self.inner.config.phone_policy.max_digits);
        self.inner.form().phone.clone_from(&masked);
        masked
    }

    /// Currency field changed; stores and returns the masked value
    pub fn input_amount(&self, raw: &str) -> String {
        let display = normalize_currency_input(raw).display;
        self.inner.form().amount.clone_from(&display);
        display
    }

    /// Product selection changed; a different product clears the plan
    pub fn select_product(&self, product: Option<&str>) {
        let mut form = self.inner.form();
        let product = product.map(ToString::to_string);
        if form.product != product {
            form.plan = None;
        }
        form.product = product;
    }

    pub fn select_plan(&self, plan: Option<&str>) {
        self.inner.form().plan = plan.map(ToString::to_string);
    }

    /// Replace the whole form, masking phone and amount like the handlers do
    pub fn fill(&self, form: PaymentForm) {
        let phone = mask_phone(&form.phone, self.inner.config.phone_policy.max_digits);
        let amount = normalize_currency_input(&form.amount).display;
        *self.inner.form() = PaymentForm {
            phone,
            amount,
            ..form
        };
    }

    /// Current form contents
    #[must_use]
    pub fn form(&self) -> PaymentForm {
        self.inner.form().clone()
    }

    // ========================================
    // Submission
    // ========================================

    #[must_use]
    pub fn state(&self) -> SubmissionState {
        if self.inner.in_flight.load(Ordering::Acquire) {
            SubmissionState::Submitting
        } else {
            SubmissionState::Idle
        }
    }

    /// Validate the form and send it to the webhook
    ///
    /// At most one submission runs at a time; a call made while another is
    /// in flight fails with [`FluxPayError::SubmissionInFlight`] without
    /// contacting the webhook. On success the snapshot is replaced (when the
    /// response carries metrics) and the form is cleared. On any failure the
    /// form is left as it was so the user can retry.
    ///
    /// # Errors
    /// Returns validation, network, or server errors; use
    /// [`FluxPayError::notice`] for the user-facing message
    pub async fn submit(&self) -> Result<SubmissionReceipt> {
        let Some(_guard) = InFlightGuard::acquire(&self.inner.in_flight) else {
            debug!(
                service = "fluxpay-sdk",
                component = "dashboard_controller",
                event = "submission_ignored",
                "Submission already in flight"
            );
            return Err(FluxPayError::SubmissionInFlight);
        };

        let form = self.form();
        let config = &self.inner.config;
        let submission = PaymentSubmission::from_form(&form, &config.catalog, &config.phone_policy)?;
        validate(&submission, &config.catalog, &config.phone_policy)?;

        let payload = SubmissionPayload::from(&submission);
        info!(
            service = "fluxpay-sdk",
            component = "dashboard_controller",
            event = "submission_started",
            phone_digits = submission.phone.len(),
            product = submission.product.as_deref().unwrap_or("-"),
            plan = submission.plan.as_deref().unwrap_or("-"),
            amount_cents = submission.amount.cents(),
        );

        let reply = match self.inner.webhook.submit(&payload).await {
            Ok(response) => interpret_submission(&response, config.success_convention),
            Err(error) => Err(error),
        }
        .map_err(|error| {
            warn!(
                service = "fluxpay-sdk",
                component = "dashboard_controller",
                event = "submission_failed",
                error = %error,
                transient = error.is_transient(),
            );
            error
        })?;

        if let Some(snapshot) = &reply.snapshot {
            self.inner.publish(snapshot.clone());
        }
        self.inner.form().reset();

        info!(
            service = "fluxpay-sdk",
            component = "dashboard_controller",
            event = "submission_accepted",
            metrics_updated = reply.snapshot.is_some(),
        );

        Ok(SubmissionReceipt {
            submission,
            snapshot: reply.snapshot,
            notice: Notice::success(reply.message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string())),
        })
    }

    // ========================================
    // Metrics
    // ========================================

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot replacement
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MetricsSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Fetch metrics once
    ///
    /// Failures are logged and swallowed: the last snapshot stays in place and
    /// `None` is returned.
    pub async fn refresh_metrics(&self) -> Option<MetricsSnapshot> {
        self.inner.refresh().await
    }

    // ========================================
    // Lifecycle
    // ========================================

    fn poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the background poller is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poller().is_some()
    }

    /// Start background polling
    ///
    /// The first refresh happens immediately, then every
    /// `config.poll_interval`. Returns `false` if polling was already running.
    ///
    /// # Errors
    /// Returns an error when called outside a Tokio runtime
    pub fn start(&self) -> Result<bool> {
        let mut poller = self.poller();
        if poller.is_some() {
            return Ok(false);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FluxPayError::Generic(format!("start() requires a Tokio runtime: {e}")))?;

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let period = inner.config.poll_interval;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        // A refresh in progress is dropped on shutdown
                        tokio::select! {
                            _ = &mut shutdown_rx => break,
                            _ = inner.refresh() => {}
                        }
                    }
                }
            }
            debug!(
                service = "fluxpay-sdk",
                component = "dashboard_controller",
                event = "poller_stopped",
            );
        });

        info!(
            service = "fluxpay-sdk",
            component = "dashboard_controller",
            event = "poller_started",
            interval_secs = period.as_secs(),
        );
        *poller = Some(Poller { shutdown, handle });
        Ok(true)
    }

    /// Stop background polling and wait for the task to finish
    pub async fn dispose(&self) {
        let Some(Poller { shutdown, handle }) = self.poller().take() else {
            return;
        };
        // The task may already be gone if it panicked
        let _ = shutdown.send(());
        if let Err(join_error) = handle.await {
            if !join_error.is_cancelled() {
                error!(
                    service = "fluxpay-sdk",
                    component = "dashboard_controller",
                    event = "poller_join_failed",
                    error = %join_error,
                );
            }
        }
        info!(
            service = "fluxpay-sdk",
            component = "dashboard_controller",
            event = "controller_disposed",
        );
    }
}

impl<W: MetricsWebhook + 'static> Drop for PaymentDashboardController<W> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller().take() {
            poller.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{MetricsSimulator, SimulatorConfig};

    fn controller() -> PaymentDashboardController<MetricsSimulator> {
        let config = DashboardConfig::from_url("https://hooks.example.com/fluxpay").unwrap();
        PaymentDashboardController::new(MetricsSimulator::new(SimulatorConfig::default()).unwrap(), config)
            .unwrap()
    }

    #[test]
    fn test_form_handlers_mask_input() {
        let controller = controller();
        assert_eq!(controller.input_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(controller.input_amount("1990"), "R$ 19,90");

        controller.select_product(Some("guia_noiva_inteligente"));
        controller.select_plan(Some("premium"));
        // Re-selecting the same product keeps the plan
        controller.select_product(Some("guia_noiva_inteligente"));
        assert_eq!(controller.form().plan.as_deref(), Some("premium"));
        // Switching clears it
        controller.select_product(None);
        assert_eq!(controller.form().plan, None);
    }

    #[test]
    fn test_fill_masks_fields() {
        let controller = controller();
        controller.fill(PaymentForm {
            phone: "5511987654321".to_string(),
            product: None,
            plan: None,
            amount: "15075".to_string(),
        });
        let form = controller.form();
        assert_eq!(form.phone, "+55 (11) 98765-4321");
        assert_eq!(form.amount, "R$ 150,75");
    }

    #[test]
    fn test_in_flight_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(first);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let controller = controller();
        assert!(controller.start().is_err());
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_submit_with_simulator_updates_snapshot() {
        let controller = controller();
        controller.input_phone("11987654321");
        controller.select_product(Some("guia_noiva_inteligente"));
        controller.select_plan(Some("premium"));

        let receipt = controller.submit().await.unwrap();
        assert_eq!(receipt.notice.message, "Pagamento registrado com sucesso!");
        assert_eq!(controller.snapshot().billed.cents(), 1990);
        assert!(controller.form().is_empty());
        assert_eq!(controller.state(), SubmissionState::Idle);
    }
}
