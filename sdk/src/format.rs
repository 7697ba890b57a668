//! Display formatting for dashboard values
//!
//! Currency follows the pt-BR convention (`R$ 1.234,56`). ROAS is shown with
//! two decimals and an `x` suffix.

#![forbid(unsafe_code)]
#![allow(clippy::arithmetic_side_effects)] // Division/remainder by non-zero constants only

use crate::types::Money;

/// Format an amount as Brazilian reais
///
/// # Examples
/// ```
/// use fluxpay_sdk::{format::format_brl, Money};
///
/// assert_eq!(format_brl(Money::from_cents(100_000)), "R$ 1.000,00");
/// assert_eq!(format_brl(Money::from_cents(-5_050)), "-R$ 50,50");
/// assert_eq!(format_brl(Money::ZERO), "R$ 0,00");
/// ```
#[must_use]
pub fn format_brl(amount: Money) -> String {
    let cents = amount.cents();
    let magnitude = cents.unsigned_abs();
    let units = group_thousands(magnitude / 100);
    let fraction = magnitude % 100;
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}R$ {units},{fraction:02}")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

/// Return on ad spend: `billed / invested`, or 0 when nothing was invested
///
/// # Examples
/// ```
/// use fluxpay_sdk::{format::compute_roas, Money};
///
/// assert_eq!(compute_roas(Money::from_cents(100_000), Money::from_cents(250_000)), 2.5);
/// assert_eq!(compute_roas(Money::ZERO, Money::from_cents(250_000)), 0.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)] // Ratio for display, precision loss is irrelevant
pub fn compute_roas(invested: Money, billed: Money) -> f64 {
    if invested.cents() > 0 {
        billed.cents() as f64 / invested.cents() as f64
    } else {
        0.0
    }
}

/// Format ROAS as `2.50x`
#[must_use]
pub fn format_roas(roas: f64) -> String {
    let value = if roas.is_finite() { roas } else { 0.0 };
    format!("{value:.2}x")
}
