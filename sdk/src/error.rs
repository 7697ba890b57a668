//! Error types for the FluxPay SDK
//!
//! Errors fall into three user-facing families:
//!
//! - **Validation**: user-correctable problems with the form, shown inline
//! - **Network**: connectivity problems and timeouts, retried by resubmitting
//! - **Server**: non-2xx responses or an explicit error status from the webhook
//!
//! Every error can be turned into a [`Notice`] carrying the message a person
//! filling in the form should see.
//!
//! # Example
//!
//! ```rust
//! use fluxpay_sdk::error::{FluxPayError, NoticeKind};
//!
//! let error = FluxPayError::Server { status: Some(500), message: None };
//! let notice = error.notice();
//! assert_eq!(notice.kind, NoticeKind::Error);
//! assert_eq!(notice.message, "Erro ao processar pagamento.");
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type for FluxPay SDK operations
pub type Result<T> = std::result::Result<T, FluxPayError>;

/// Message shown when the submission succeeds and the server sent no text
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Pagamento registrado com sucesso!";
/// Message shown when the server rejects the payment without explaining why
pub const DEFAULT_SERVER_ERROR_MESSAGE: &str = "Erro ao processar pagamento.";
/// Message shown when the webhook cannot be reached
pub const NETWORK_ERROR_MESSAGE: &str = "Erro ao conectar com o servidor. Verifique sua conexão.";
/// Message shown when required form fields are empty
pub const MISSING_FIELDS_MESSAGE: &str = "Por favor, preencha todos os campos.";
/// Message shown when a submission is attempted while another one is running
pub const IN_FLIGHT_MESSAGE: &str = "Um pagamento já está sendo enviado. Aguarde.";

/// Reasons a payment submission is rejected before it leaves the process
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required form fields are empty
    #[error("Por favor, preencha todos os campos.")]
    MissingFields,

    /// Phone number contains something other than digits
    #[error("Telefone inválido: use apenas dígitos.")]
    PhoneNotDigits,

    /// Phone number has fewer digits than the policy allows
    #[error("Telefone inválido: informe ao menos {min} dígitos (recebido {actual}).")]
    PhoneTooShort { min: usize, actual: usize },

    /// Phone number has more digits than the policy allows
    #[error("Telefone inválido: no máximo {max} dígitos (recebido {actual}).")]
    PhoneTooLong { max: usize, actual: usize },

    /// Product key is not in the catalog
    #[error("Produto desconhecido: {0}")]
    UnknownProduct(String),

    /// Product has plans and none was selected
    #[error("Selecione um plano para o produto {product}.")]
    PlanRequired { product: String },

    /// Plan key does not belong to the selected product
    #[error("Plano {plan} não existe para o produto {product}.")]
    UnknownPlan { product: String, plan: String },

    /// Plan selected without a product
    #[error("Selecione um produto antes de escolher o plano {0}.")]
    PlanWithoutProduct(String),

    /// Amount is zero or negative
    #[error("O valor deve ser maior que zero.")]
    NonPositiveAmount,
}

/// Error types that can occur when using the FluxPay SDK
#[derive(Error, Debug)]
pub enum FluxPayError {
    /// Submission rejected locally, nothing was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Connectivity failure talking to the webhook
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook did not answer within the configured timeout
    #[error("Request to webhook timed out")]
    Timeout,

    /// Non-2xx response or an explicit error status in the body
    #[error("Server error (status {status:?}): {}", message.as_deref().unwrap_or("no message"))]
    Server {
        status: Option<u16>,
        message: Option<String>,
    },

    /// 2xx response whose body could not be understood
    #[error("Malformed webhook response: {0}")]
    MalformedResponse(String),

    /// Error from serde JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Another submission is still running
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// Generic error with message
    #[error("FluxPay SDK error: {0}")]
    Generic(String),
}

impl From<reqwest::Error> for FluxPayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::MalformedResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<url::ParseError> for FluxPayError {
    fn from(error: url::ParseError) -> Self {
        Self::Config(format!("Invalid URL: {error}"))
    }
}

impl From<String> for FluxPayError {
    fn from(msg: String) -> Self {
        Self::Generic(msg)
    }
}

impl From<&str> for FluxPayError {
    fn from(msg: &str) -> Self {
        Self::Generic(msg.to_string())
    }
}

impl From<anyhow::Error> for FluxPayError {
    fn from(error: anyhow::Error) -> Self {
        Self::Generic(error.to_string())
    }
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message meant for the person using the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl FluxPayError {
    /// Convert the error into the notice shown to the user
    ///
    /// Server-provided messages win over the generic fallback.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(reason) => Notice::error(reason.to_string()),
            Self::Network(_) | Self::Timeout => Notice::error(NETWORK_ERROR_MESSAGE),
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Notice::error(message.clone()),
            Self::SubmissionInFlight => Notice::error(IN_FLIGHT_MESSAGE),
            Self::Server { .. }
            | Self::MalformedResponse(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Generic(_) => Notice::error(DEFAULT_SERVER_ERROR_MESSAGE),
        }
    }

    /// True for failures where resubmitting the same form may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::SubmissionInFlight)
    }
}
