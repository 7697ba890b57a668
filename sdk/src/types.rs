//! Core data types shared across the SDK
//!
//! Money is carried as integer cents everywhere inside the SDK. Conversion to
//! floating-point currency units only happens at the webhook boundary and for
//! display.

#![forbid(unsafe_code)]

use crate::{
    catalog::{Catalog, Pricing},
    error::ValidationError,
    format::{compute_roas, format_brl, format_roas},
    normalize::{normalize_currency_input, normalize_phone},
    validation::PhonePolicy,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A BRL amount in integer cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a currency-unit amount (e.g. `19.9`) to cents, rounding to the
    /// nearest cent. Non-finite input maps to zero.
    #[must_use]
    pub fn from_units(units: f64) -> Self {
        if !units.is_finite() {
            return Self::ZERO;
        }
        // Float-to-int casts saturate, so out-of-range values clamp to the i64 bounds
        #[allow(clippy::cast_possible_truncation)]
        let cents = (units * 100.0).round() as i64;
        Self(cents)
    }

    /// Amount in currency units, as sent to the webhook
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // cents stay far below 2^52 for real payments
    pub fn to_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Money {
    fn from(cents: u64) -> Self {
        Self(i64::try_from(cents).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_brl(*self))
    }
}

/// Whether a submission is currently being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
}

/// Raw contents of the payment form as the user typed them
///
/// `phone` and `amount` hold the masked display strings; normalization to
/// digits happens when the form is turned into a [`PaymentSubmission`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub phone: String,
    pub product: Option<String>,
    pub plan: Option<String>,
    pub amount: String,
}

impl PaymentForm {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phone.is_empty() && self.product.is_none() && self.plan.is_none() && self.amount.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A normalized payment ready to be validated and sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSubmission {
    /// Digits only
    pub phone: String,
    pub product: Option<String>,
    pub plan: Option<String>,
    pub amount: Money,
}

impl PaymentSubmission {
    /// Resolve a form into a submission
    ///
    /// When the selected product has plans, the amount always comes from the
    /// catalog price of the chosen plan and any typed amount is ignored.
    /// Open-amount forms (no product, or an open-amount product) take the
    /// currency-masked text field instead.
    pub fn from_form(
        form: &PaymentForm,
        catalog: &Catalog,
        policy: &PhonePolicy,
    ) -> Result<Self, ValidationError> {
        let phone = normalize_phone(&form.phone, policy.max_digits);
        if phone.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let product = non_blank(form.product.as_deref());
        let plan = non_blank(form.plan.as_deref());

        let amount = match product.as_deref() {
            Some(product_key) => {
                let product_entry = catalog
                    .product(product_key)
                    .ok_or_else(|| ValidationError::UnknownProduct(product_key.to_string()))?;
                match &product_entry.pricing {
                    Pricing::Plans { .. } => {
                        let plan_key = plan.as_deref().ok_or_else(|| ValidationError::PlanRequired {
                            product: product_key.to_string(),
                        })?;
                        product_entry
                            .plan(plan_key)
                            .ok_or_else(|| ValidationError::UnknownPlan {
                                product: product_key.to_string(),
                                plan: plan_key.to_string(),
                            })?
                            .price
                    }
                    Pricing::OpenAmount => {
                        if let Some(plan_key) = plan.as_deref() {
                            return Err(ValidationError::UnknownPlan {
                                product: product_key.to_string(),
                                plan: plan_key.to_string(),
                            });
                        }
                        typed_amount(&form.amount)?
                    }
                }
            }
            None => {
                if let Some(plan_key) = plan {
                    return Err(ValidationError::PlanWithoutProduct(plan_key));
                }
                typed_amount(&form.amount)?
            }
        };

        Ok(Self {
            phone,
            product,
            plan,
            amount,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn typed_amount(raw: &str) -> Result<Money, ValidationError> {
    let input = normalize_currency_input(raw);
    if input.display.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(Money::from(input.cents))
}

/// The dashboard counters
///
/// Replaced wholesale on every update; never merged field by field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub invested: Money,
    pub billed: Money,
    /// Return on ad spend, `billed / invested` or 0 when nothing was invested
    pub roas: f64,
    pub profit: Money,
    /// When this snapshot was received; `None` for the startup snapshot
    pub updated_at: Option<DateTime<Utc>>,
}

impl MetricsSnapshot {
    /// Snapshot shown before any data arrives
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            invested: Money::ZERO,
            billed: Money::ZERO,
            roas: 0.0,
            profit: Money::ZERO,
            updated_at: None,
        }
    }

    /// Build a snapshot with ROAS derived from invested and billed
    #[must_use]
    pub fn new(invested: Money, billed: Money, profit: Money) -> Self {
        Self {
            invested,
            billed,
            roas: compute_roas(invested, billed),
            profit,
            updated_at: Some(Utc::now()),
        }
    }

    /// Formatted values as the dashboard shows them
    #[must_use]
    pub fn display(&self) -> MetricsDisplay {
        MetricsDisplay {
            invested: format_brl(self.invested),
            billed: format_brl(self.billed),
            roas: format_roas(self.roas),
            profit: format_brl(self.profit),
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

/// Display strings for the four dashboard counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsDisplay {
    pub invested: String,
    pub billed: String,
    pub roas: String,
    pub profit: String,
}
