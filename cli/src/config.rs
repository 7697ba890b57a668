//! Configuration management for the `FluxPay` CLI
//!
//! CLI-only settings, read from environment variables with sensible defaults.
//! Dashboard settings (URLs, timeouts, phone policy) live in the SDK's
//! `DashboardConfig`; this layer supplies the defaults the CLI falls back to.

use anyhow::{anyhow, Result};
use fluxpay_sdk::{
    config::{parse_http_url, WEBHOOK_URL_VAR},
    Catalog, DashboardConfig, SuccessConvention,
};
use std::{env, path::PathBuf, time::Duration};

/// Highest frame rate `watch --animate` will render at
pub const MAX_ANIMATION_FPS: u32 = 120;

/// Longest count-up animation in milliseconds
pub const MAX_COUNT_UP_DURATION_MS: u64 = 10_000;

/// Global flags that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct DashboardOverrides {
    pub webhook_url: Option<String>,
    pub metrics_url: Option<String>,
    pub success_convention: Option<SuccessConvention>,
    /// JSON product catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,
}

/// Centralized configuration for the `FluxPay` CLI
#[derive(Debug, Clone)]
pub struct FluxPayCliConfig {
    /// Webhook used when neither `--webhook-url` nor `FLUXPAY_WEBHOOK_URL` is given
    pub default_webhook_url: String,

    /// Default output format for CLI commands
    pub default_output_format: String,

    /// Frames per second for `watch --animate`
    pub animation_fps: u32,

    /// Length of one count-up animation in milliseconds
    pub count_up_duration_ms: u64,

    /// Submissions generated by `simulate` when `--submissions` is omitted
    pub default_simulation_submissions: u64,
}

impl FluxPayCliConfig {
    /// Create a new configuration instance with values from environment variables
    /// or sensible defaults if not set
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_webhook_url: env::var("FLUXPAY_WEBHOOK_URL")
                .unwrap_or_else(|_| "http://localhost:5678/webhook/fluxpay".to_string()),

            default_output_format: env::var("FLUXPAY_DEFAULT_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "human".to_string()),

            animation_fps: env::var("FLUXPAY_ANIMATION_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|fps| *fps > 0)
                .map_or(30, |fps: u32| fps.min(MAX_ANIMATION_FPS)),

            count_up_duration_ms: env::var("FLUXPAY_COUNT_UP_DURATION_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(1000, |ms: u64| ms.min(MAX_COUNT_UP_DURATION_MS)),

            default_simulation_submissions: env::var("FLUXPAY_SIMULATION_SUBMISSIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }

    #[must_use]
    pub fn count_up_duration(&self) -> Duration {
        Duration::from_millis(self.count_up_duration_ms.min(MAX_COUNT_UP_DURATION_MS))
    }

    /// Animation frame rate, kept within `1..=MAX_ANIMATION_FPS`
    #[must_use]
    pub fn frame_rate(&self) -> u32 {
        self.animation_fps.clamp(1, MAX_ANIMATION_FPS)
    }

    /// Delay between two animation frames
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1)
            .checked_div(self.frame_rate())
            .unwrap_or(Duration::from_millis(33))
    }

    /// Resolve the SDK configuration: flags, then `FLUXPAY_*` variables, then defaults
    ///
    /// # Errors
    /// Returns an error if a URL or variable is invalid or the catalog file
    /// cannot be read
    pub fn dashboard_config(&self, overrides: &DashboardOverrides) -> Result<DashboardConfig> {
        let webhook_url = overrides
            .webhook_url
            .clone()
            .unwrap_or_else(|| self.default_webhook_url.clone());

        let mut config = DashboardConfig::from_vars(|key| {
            if key == WEBHOOK_URL_VAR {
                Some(webhook_url.clone())
            } else {
                env::var(key).ok()
            }
        })?;

        if let Some(url) = &overrides.metrics_url {
            config.metrics_url = Some(parse_http_url(url)?);
        }
        if let Some(convention) = overrides.success_convention {
            config.success_convention = convention;
        }
        if let Some(path) = &overrides.catalog_path {
            let json = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Failed to read catalog '{}': {e}", path.display()))?;
            config.catalog = Catalog::from_json(&json)?;
        }

        config.check()?;
        Ok(config)
    }
}

impl Default for FluxPayCliConfig {
    fn default() -> Self {
        Self::new()
    }
}
