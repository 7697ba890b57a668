//! `FluxPay` SDK - payment capture and metrics dashboard core
//!
//! This crate holds the business logic behind the `FluxPay` dashboard: a small
//! form that records a payment against a product catalog, and a set of
//! counters (invested, billed, ROAS, profit) kept in sync with a webhook.
//! It includes utilities for:
//!
//! - Normalizing and masking phone and currency input
//! - Validating submissions against the product catalog
//! - Talking to the metrics webhook and interpreting its responses
//! - Polling metrics in the background and animating counter changes
//!
//! # Example Usage
//!
//! ```no_run
//! use fluxpay_sdk::{DashboardConfig, HttpWebhook, PaymentDashboardController};
//!
//! # async fn run() -> fluxpay_sdk::Result<()> {
//! let config = DashboardConfig::from_env()?;
//! let controller = PaymentDashboardController::new(HttpWebhook::new(&config)?, config)?;
//!
//! controller.input_phone("11987654321");
//! controller.input_amount("15000");
//! let receipt = controller.submit().await?;
//! println!("{}", receipt.notice.message);
//!
//! let metrics = controller.snapshot().display();
//! println!("ROAS {}", metrics.roas);
//! # Ok(())
//! # }
//! ```
//!
//! Formatting helpers work without any I/O:
//!
//! ```
//! use fluxpay_sdk::{format_brl, mask_phone, Money};
//!
//! assert_eq!(format_brl(Money::from_cents(100_000)), "R$ 1.000,00");
//! assert_eq!(mask_phone("11987654321", 13), "(11) 98765-4321");
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod config;
pub mod controller;
pub mod countup;
pub mod error;
pub mod format;
pub mod normalize;
pub mod simulator;
pub mod types;
pub mod validation;
pub mod webhook;
pub mod wire;

// Re-export commonly used items
pub use catalog::{Catalog, Plan, Pricing, Product, GUIA_NOIVA_PRODUCT};
pub use config::{DashboardConfig, RefreshMethod, SuccessConvention};
pub use controller::{PaymentDashboardController, SubmissionReceipt};
pub use countup::{ease_out_cubic, CountUp, DEFAULT_COUNT_UP_DURATION};
pub use error::{FluxPayError, Notice, NoticeKind, Result, ValidationError};
pub use simulator::{MetricsSimulator, SimulatorConfig, SimulatorStats};
pub use types::{
    MetricsDisplay, MetricsSnapshot, Money, PaymentForm, PaymentSubmission, SubmissionState,
};
pub use validation::{validate, validate_phone, PhonePolicy};
pub use webhook::{HttpWebhook, MetricsWebhook};
pub use wire::{
    interpret_metrics, interpret_submission, MetricsPayload, SubmissionPayload, SubmissionReply,
    WebhookResponse,
};

// Re-export formatting utilities
pub use format::{compute_roas, format_brl, format_roas};
pub use normalize::{
    mask_phone, normalize_currency_input, normalize_phone, parse_currency_display, CurrencyInput,
};
