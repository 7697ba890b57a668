//! Command implementations for the `FluxPay` CLI
//!
//! This module contains the individual command implementations, each in their own file
//! for better organization and maintainability.

pub mod mask;
pub mod metrics;
pub mod simulate;
pub mod submit;
pub mod watch;

use fluxpay_sdk::FluxPayError;

// Re-export command execution functions for easy access
pub use mask::execute as execute_mask;
pub use metrics::execute as execute_metrics;
pub use simulate::execute as execute_simulate;
pub use submit::execute as execute_submit;
pub use watch::execute as execute_watch;

/// Turn an SDK error into a CLI error led by the user-facing notice
#[must_use]
pub fn describe_error(error: &FluxPayError) -> anyhow::Error {
    let notice = error.notice();
    match error {
        // The notice already is the validation reason
        FluxPayError::Validation(_) => anyhow::anyhow!(notice.message),
        _ => anyhow::anyhow!("{} ({error})", notice.message),
    }
}
