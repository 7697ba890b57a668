//! Input normalization and masking for the payment form
//!
//! Everything here is pure and idempotent: feeding an already-normalized or
//! already-masked value back in gives the same result, and empty or fully
//! non-numeric input produces an empty value instead of an error.

#![forbid(unsafe_code)]

use crate::{format::format_brl, types::Money};

/// Longest phone accepted: two-digit country code plus an 11-digit national number
pub const DEFAULT_PHONE_MAX_DIGITS: usize = 13;

/// Longest digit run accepted by the currency field, keeps cents exact in `f64`
pub const MAX_CURRENCY_DIGITS: usize = 15;

/// Keep only ASCII digits, truncated to `max_digits`
///
/// # Examples
/// ```
/// use fluxpay_sdk::normalize::normalize_phone;
///
/// assert_eq!(normalize_phone("(11) 98765-4321", 13), "11987654321");
/// assert_eq!(normalize_phone("+55 11 98765-4321 ext", 11), "55119876543");
/// assert_eq!(normalize_phone("abc", 13), "");
/// ```
#[must_use]
pub fn normalize_phone(raw: &str, max_digits: usize) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(max_digits)
        .collect()
}

/// Progressive display mask for a phone number
///
/// Applied on every keystroke, so partial numbers get a partial mask:
///
/// | digits | mask                 |
/// |--------|----------------------|
/// | 0-2    | `11`                 |
/// | 3-6    | `(11) 9876`          |
/// | 7-10   | `(11) 9876-5432`     |
/// | 11     | `(11) 98765-4321`    |
/// | 12     | `+55 (11) 9876-5432` |
/// | 13     | `+55 (11) 98765-4321`|
///
/// # Examples
/// ```
/// use fluxpay_sdk::normalize::mask_phone;
///
/// assert_eq!(mask_phone("11987654321", 13), "(11) 98765-4321");
/// assert_eq!(mask_phone("5511987654321", 13), "+55 (11) 98765-4321");
/// ```
#[must_use]
pub fn mask_phone(raw: &str, max_digits: usize) -> String {
    let digits = normalize_phone(raw, max_digits);
    match digits.len() {
        0..=2 => digits,
        3..=11 => mask_national(&digits),
        _ => {
            let (country, national) = digits.split_at(2);
            format!("+{country} {}", mask_national(national))
        }
    }
}

fn mask_national(digits: &str) -> String {
    let (area, number) = digits.split_at(2.min(digits.len()));
    match number.len() {
        0 => area.to_string(),
        1..=4 => format!("({area}) {number}"),
        5..=8 => {
            let (head, tail) = number.split_at(4);
            format!("({area}) {head}-{tail}")
        }
        _ => {
            let (head, tail) = number.split_at(5);
            format!("({area}) {head}-{tail}")
        }
    }
}

/// Result of masking the currency field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyInput {
    /// Numeric value kept for submission
    pub cents: u64,
    /// Text shown in the field; empty when no digits were typed
    pub display: String,
}

/// Treat the digits typed so far as cents and format them as BRL
///
/// # Examples
/// ```
/// use fluxpay_sdk::normalize::normalize_currency_input;
///
/// let input = normalize_currency_input("1990");
/// assert_eq!(input.cents, 1990);
/// assert_eq!(input.display, "R$ 19,90");
///
/// // Re-masking the display is a no-op
/// assert_eq!(normalize_currency_input(&input.display), input);
///
/// assert_eq!(normalize_currency_input("").display, "");
/// ```
#[must_use]
pub fn normalize_currency_input(raw: &str) -> CurrencyInput {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return CurrencyInput {
            cents: 0,
            display: String::new(),
        };
    }

    let cents = digits_to_cents(&digits);
    CurrencyInput {
        cents,
        display: format_brl(Money::from(cents)),
    }
}

/// Inverse of the currency mask: read a displayed value back into cents
#[must_use]
pub fn parse_currency_display(display: &str) -> u64 {
    normalize_currency_input(display).cents
}

fn digits_to_cents(digits: &str) -> u64 {
    let significant = digits.trim_start_matches('0');
    let kept = &significant[..significant.len().min(MAX_CURRENCY_DIGITS)];
    // At most 15 ASCII digits fit in u64; an empty run is zero
    kept.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_digits_only_and_bounded() {
        for len in 0..=20 {
            let raw: String = "9".repeat(len);
            let normalized = normalize_phone(&raw, DEFAULT_PHONE_MAX_DIGITS);
            assert!(normalized.chars().all(|c| c.is_ascii_digit()));
            assert!(normalized.len() <= DEFAULT_PHONE_MAX_DIGITS);
            assert_eq!(normalized.len(), len.min(DEFAULT_PHONE_MAX_DIGITS));
        }
        assert_eq!(normalize_phone("", 13), "");
        assert_eq!(normalize_phone("١٢٣ 12", 13), "12");
    }

    #[test]
    fn test_normalize_phone_idempotent() {
        let once = normalize_phone("+55 (11) 98765-4321", 11);
        assert_eq!(normalize_phone(&once, 11), once);
    }

    #[test]
    fn test_mask_phone_progressive() {
        let full = "11987654321";
        let expected = [
            "1",
            "11",
            "(11) 9",
            "(11) 98",
            "(11) 987",
            "(11) 9876",
            "(11) 9876-5",
            "(11) 9876-54",
            "(11) 9876-543",
            "(11) 9876-5432",
            "(11) 98765-4321",
        ];
        for (len, want) in (1..=full.len()).zip(expected) {
            assert_eq!(mask_phone(&full[..len], 13), want, "prefix length {len}");
        }
    }

    #[test]
    fn test_mask_phone_country_code_and_idempotence() {
        assert_eq!(mask_phone("551132654321", 13), "+55 (11) 3265-4321");
        assert_eq!(mask_phone("5511987654321", 13), "+55 (11) 98765-4321");
        assert_eq!(mask_phone("55119876543219999", 13), "+55 (11) 98765-4321");

        let masked = mask_phone("11987654321", 13);
        assert_eq!(mask_phone(&masked, 13), masked);
        assert_eq!(mask_phone("", 13), "");
        assert_eq!(mask_phone("--", 13), "");
    }

    #[test]
    fn test_currency_input() {
        assert_eq!(normalize_currency_input("5").display, "R$ 0,05");
        assert_eq!(normalize_currency_input("0").display, "R$ 0,00");
        assert_eq!(normalize_currency_input("123456").display, "R$ 1.234,56");
        assert_eq!(normalize_currency_input("R$ 19,90").cents, 1990);
        assert_eq!(normalize_currency_input("abc").cents, 0);
        assert_eq!(normalize_currency_input("abc").display, "");
        assert_eq!(normalize_currency_input("0001").cents, 1);
    }

    #[test]
    fn test_currency_round_trip() {
        let samples = [
            0_u64,
            1,
            99,
            100,
            1990,
            123_456,
            100_000_000,
            999_999_999_999_999,
        ];
        for cents in samples {
            let input = normalize_currency_input(&cents.to_string());
            assert_eq!(input.cents, cents);
            assert_eq!(parse_currency_display(&input.display), cents, "{}", input.display);
        }
    }

    #[test]
    fn test_currency_input_caps_digits() {
        let input = normalize_currency_input(&"9".repeat(30));
        assert_eq!(input.cents, 999_999_999_999_999);
    }
}
