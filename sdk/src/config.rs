//! Dashboard configuration
//!
//! The only required value is the webhook URL. Everything else has a default
//! and can be overridden through `FLUXPAY_*` environment variables.

use crate::{
    catalog::Catalog,
    error::{FluxPayError, Result},
    validation::PhonePolicy,
};
use std::{env, str::FromStr, time::Duration};
use url::Url;

pub const WEBHOOK_URL_VAR: &str = "FLUXPAY_WEBHOOK_URL";
pub const METRICS_URL_VAR: &str = "FLUXPAY_METRICS_URL";
pub const REFRESH_METHOD_VAR: &str = "FLUXPAY_REFRESH_METHOD";
pub const POLL_INTERVAL_VAR: &str = "FLUXPAY_POLL_INTERVAL_SECS";
pub const REQUEST_TIMEOUT_VAR: &str = "FLUXPAY_REQUEST_TIMEOUT_SECS";
pub const SUCCESS_CONVENTION_VAR: &str = "FLUXPAY_SUCCESS_CONVENTION";
pub const PHONE_MIN_DIGITS_VAR: &str = "FLUXPAY_PHONE_MIN_DIGITS";
pub const PHONE_MAX_DIGITS_VAR: &str = "FLUXPAY_PHONE_MAX_DIGITS";

/// Background refresh period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Upper bound on a single webhook call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How a submission response is judged successful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessConvention {
    /// 2xx and a JSON body with `status: "ok"`
    #[default]
    ExplicitStatus,
    /// Any 2xx with an empty or metrics-shaped body
    Http2xx,
}

impl FromStr for SuccessConvention {
    type Err = FluxPayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "explicit-status" | "status" => Ok(Self::ExplicitStatus),
            "http-2xx" | "2xx" => Ok(Self::Http2xx),
            other => Err(FluxPayError::Config(format!(
                "Invalid success convention: {other} (expected explicit-status or http-2xx)"
            ))),
        }
    }
}

/// HTTP method used by the background metrics refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMethod {
    #[default]
    Get,
    Post,
}

impl FromStr for RefreshMethod {
    type Err = FluxPayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            other => Err(FluxPayError::Config(format!(
                "Invalid refresh method: {other} (expected get or post)"
            ))),
        }
    }
}

/// Everything the controller and the HTTP webhook need to run
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Endpoint receiving payment submissions
    pub webhook_url: Url,
    /// Endpoint answering metrics refreshes; the webhook URL when `None`
    pub metrics_url: Option<Url>,
    pub refresh_method: RefreshMethod,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub success_convention: SuccessConvention,
    pub phone_policy: PhonePolicy,
    pub catalog: Catalog,
}

impl DashboardConfig {
    /// Configuration with defaults for everything but the webhook URL
    #[must_use]
    pub fn new(webhook_url: Url) -> Self {
        Self {
            webhook_url,
            metrics_url: None,
            refresh_method: RefreshMethod::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            success_convention: SuccessConvention::default(),
            phone_policy: PhonePolicy::default(),
            catalog: Catalog::default(),
        }
    }

    /// Parse the webhook URL and build a default configuration
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL
    pub fn from_url(webhook_url: &str) -> Result<Self> {
        Ok(Self::new(parse_http_url(webhook_url)?))
    }

    /// Read configuration from `FLUXPAY_*` environment variables
    ///
    /// # Errors
    /// Returns an error if the webhook URL is missing or any value is invalid
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns an error if the webhook URL is missing or any value is invalid
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup(WEBHOOK_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| FluxPayError::Config(format!("{WEBHOOK_URL_VAR} must be set")))?;
        let mut config = Self::from_url(&webhook_url)?;

        if let Some(url) = lookup(METRICS_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.metrics_url = Some(parse_http_url(&url)?);
        }
        if let Some(method) = lookup(REFRESH_METHOD_VAR) {
            config.refresh_method = method.parse()?;
        }
        if let Some(secs) = lookup(POLL_INTERVAL_VAR) {
            config.poll_interval = Duration::from_secs(parse_positive(POLL_INTERVAL_VAR, &secs)?);
        }
        if let Some(secs) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout = Duration::from_secs(parse_positive(REQUEST_TIMEOUT_VAR, &secs)?);
        }
        if let Some(convention) = lookup(SUCCESS_CONVENTION_VAR) {
            config.success_convention = convention.parse()?;
        }
        if let Some(min) = lookup(PHONE_MIN_DIGITS_VAR) {
            config.phone_policy.min_digits = usize::try_from(parse_positive(PHONE_MIN_DIGITS_VAR, &min)?)
                .map_err(|e| FluxPayError::Config(e.to_string()))?;
        }
        if let Some(max) = lookup(PHONE_MAX_DIGITS_VAR) {
            config.phone_policy.max_digits = usize::try_from(parse_positive(PHONE_MAX_DIGITS_VAR, &max)?)
                .map_err(|e| FluxPayError::Config(e.to_string()))?;
        }

        config.check()?;
        Ok(config)
    }

    /// Endpoint used for background refreshes
    #[must_use]
    pub fn refresh_url(&self) -> &Url {
        self.metrics_url.as_ref().unwrap_or(&self.webhook_url)
    }

    /// Reject combinations the controller cannot work with
    ///
    /// # Errors
    /// Returns an error if the phone policy range is empty or an interval is zero
    pub fn check(&self) -> Result<()> {
        if self.phone_policy.min_digits > self.phone_policy.max_digits {
            return Err(FluxPayError::Config(format!(
                "Phone min digits ({}) exceeds max digits ({})",
                self.phone_policy.min_digits, self.phone_policy.max_digits
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(FluxPayError::Config("Poll interval must be positive".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(FluxPayError::Config("Request timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Parse an absolute http(s) URL
///
/// # Errors
/// Returns an error if parsing fails or the scheme is not http/https
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FluxPayError::Config(format!(
            "Unsupported URL scheme '{scheme}' in {raw}"
        ))),
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(FluxPayError::Config(format!(
            "{name} must be a positive integer, got: {raw}"
        ))),
    }
}
