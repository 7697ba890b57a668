//! Validation utilities for payment submissions

use crate::{
    catalog::{Catalog, Pricing},
    error::ValidationError,
    normalize::DEFAULT_PHONE_MAX_DIGITS,
    types::PaymentSubmission,
};

/// Shortest phone accepted: area code plus an 8-digit landline
pub const DEFAULT_PHONE_MIN_DIGITS: usize = 10;

/// Accepted phone length range, in digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonePolicy {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for PhonePolicy {
    fn default() -> Self {
        Self {
            min_digits: DEFAULT_PHONE_MIN_DIGITS,
            max_digits: DEFAULT_PHONE_MAX_DIGITS,
        }
    }
}

/// Validate a phone number that has already been normalized to digits
///
/// # Errors
/// Returns an error if the phone is empty, contains non-digits, or its
/// length is outside the policy range
pub fn validate_phone(phone: &str, policy: &PhonePolicy) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits != phone.len() {
        return Err(ValidationError::PhoneNotDigits);
    }

    if digits < policy.min_digits {
        return Err(ValidationError::PhoneTooShort {
            min: policy.min_digits,
            actual: digits,
        });
    }
    if digits > policy.max_digits {
        return Err(ValidationError::PhoneTooLong {
            max: policy.max_digits,
            actual: digits,
        });
    }
    Ok(())
}

/// Validate a submission before it is sent
///
/// Checks phone length, product/plan consistency against the catalog, and
/// that the amount is positive. Validation failure means nothing is sent.
///
/// # Errors
/// Returns the first rule the submission breaks
pub fn validate(
    submission: &PaymentSubmission,
    catalog: &Catalog,
    policy: &PhonePolicy,
) -> Result<(), ValidationError> {
    validate_phone(&submission.phone, policy)?;

    match (&submission.product, &submission.plan) {
        (Some(product_key), plan) => {
            let product = catalog
                .product(product_key)
                .ok_or_else(|| ValidationError::UnknownProduct(product_key.clone()))?;
            match (&product.pricing, plan) {
                (Pricing::Plans { .. }, None) => {
                    return Err(ValidationError::PlanRequired {
                        product: product_key.clone(),
                    });
                }
                (Pricing::Plans { .. }, Some(plan_key)) if product.plan(plan_key).is_none() => {
                    return Err(ValidationError::UnknownPlan {
                        product: product_key.clone(),
                        plan: plan_key.clone(),
                    });
                }
                (Pricing::OpenAmount, Some(plan_key)) => {
                    return Err(ValidationError::UnknownPlan {
                        product: product_key.clone(),
                        plan: plan_key.clone(),
                    });
                }
                _ => {}
            }
        }
        (None, Some(plan_key)) => {
            return Err(ValidationError::PlanWithoutProduct(plan_key.clone()));
        }
        (None, None) => {}
    }

    if !submission.amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount);
    }

    Ok(())
}
