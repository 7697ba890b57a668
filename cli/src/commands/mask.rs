//! Mask command implementation
//!
//! Shows what the dashboard fields display for a given raw input.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use fluxpay_sdk::{mask_phone, normalize_currency_input, normalize_phone};
use serde_json::json;

use crate::utils::formatting::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MaskKind {
    /// Progressive phone mask, e.g. `(11) 98765-4321`
    Phone,
    /// Digits read as cents, e.g. `R$ 19,90`
    Currency,
}

/// Execute the mask command
///
/// # Errors
/// Returns error if JSON serialization fails
pub fn execute(
    kind: MaskKind,
    raw: &str,
    phone_max_digits: usize,
    output_format: OutputFormat,
) -> Result<String> {
    let (masked, value) = match kind {
        MaskKind::Phone => {
            let digits = normalize_phone(raw, phone_max_digits);
            (mask_phone(raw, phone_max_digits), json!({ "digits": digits }))
        }
        MaskKind::Currency => {
            let input = normalize_currency_input(raw);
            (input.display, json!({ "cents": input.cents }))
        }
    };

    match output_format {
        OutputFormat::Human => Ok(masked),
        OutputFormat::Json => {
            let mut output = json!({ "input": raw, "masked": masked });
            if let (Some(output), Some(value)) = (output.as_object_mut(), value.as_object()) {
                output.extend(value.clone());
            }
            serde_json::to_string_pretty(&output)
                .map_err(|e| anyhow!("Failed to serialize mask result to JSON: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone_progressively() {
        let steps = [
            ("11", "11"),
            ("119", "(11) 9"),
            ("1198765", "(11) 9876-5"),
            ("11987654321", "(11) 98765-4321"),
        ];
        for (raw, expected) in steps {
            assert_eq!(execute(MaskKind::Phone, raw, 13, OutputFormat::Human).unwrap(), expected);
        }
    }

    #[test]
    fn test_mask_currency() {
        assert_eq!(
            execute(MaskKind::Currency, "100000", 13, OutputFormat::Human).unwrap(),
            "R$ 1.000,00"
        );
        assert_eq!(execute(MaskKind::Currency, "abc", 13, OutputFormat::Human).unwrap(), "");
    }

    #[test]
    fn test_mask_json() {
        let output = execute(MaskKind::Currency, "1990", 13, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["masked"], "R$ 19,90");
        assert_eq!(value["cents"], 1990);

        let output = execute(MaskKind::Phone, "(11) 98765-4321", 13, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["digits"], "11987654321");
    }
}
