//! Webhook wire format and response interpretation
//!
//! This is the compatibility boundary with the webhook: field-name variants
//! (`faturamentoTotal` vs `faturado`), numbers sent as strings, and the two
//! success conventions are all resolved here so the rest of the SDK only sees
//! [`MetricsSnapshot`] values and [`FluxPayError`]s.

#![forbid(unsafe_code)]

use crate::{
    config::SuccessConvention,
    error::{FluxPayError, Result},
    format::compute_roas,
    types::{MetricsSnapshot, Money, PaymentSubmission},
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status value marking an accepted submission
pub const STATUS_OK: &str = "ok";

/// JSON body POSTed to the webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub telefone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plano: Option<String>,
    /// Amount in currency units, e.g. `19.9`
    pub valor: f64,
}

impl From<&PaymentSubmission> for SubmissionPayload {
    fn from(submission: &PaymentSubmission) -> Self {
        Self {
            telefone: submission.phone.clone(),
            produto: submission.product.clone(),
            plano: submission.plan.clone(),
            valor: submission.amount.to_units(),
        }
    }
}

/// Raw HTTP answer from the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Convenience constructor for a 200 with a JSON body
    #[must_use]
    pub fn ok_json(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Metrics as the webhook sends them; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricsPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mensagem: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub investido: Option<f64>,
    #[serde(default, rename = "faturamentoTotal", deserialize_with = "lenient_number")]
    pub faturamento_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub faturado: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lucro: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub roas: Option<f64>,
}

impl MetricsPayload {
    /// Billed amount under either of the field names the webhook uses
    #[must_use]
    pub fn billed(&self) -> Option<f64> {
        self.faturamento_total.or(self.faturado)
    }

    /// True when at least one metric field is present
    #[must_use]
    pub fn has_metrics(&self) -> bool {
        self.investido.is_some() || self.billed().is_some() || self.lucro.is_some() || self.roas.is_some()
    }

    /// Build a snapshot; missing amounts default to zero
    ///
    /// ROAS is recomputed from invested and billed whenever both are present,
    /// and is 0 whenever nothing was invested. An upstream `roas` is only used
    /// when invested is positive and billed is missing.
    #[must_use]
    pub fn to_snapshot(&self) -> MetricsSnapshot {
        let invested = Money::from_units(self.investido.unwrap_or(0.0));
        let billed = Money::from_units(self.billed().unwrap_or(0.0));
        let profit = Money::from_units(self.lucro.unwrap_or(0.0));

        let roas = match (self.billed(), self.roas) {
            (None, Some(upstream)) if invested.is_positive() => upstream,
            _ => compute_roas(invested, billed),
        };

        MetricsSnapshot {
            invested,
            billed,
            roas,
            profit,
            updated_at: Some(Utc::now()),
        }
    }

    fn is_ok_status(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.trim().eq_ignore_ascii_case(STATUS_OK))
    }
}

/// Accept JSON numbers and numeric strings; anything else counts as absent
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|number| number.is_finite()))
}

/// What a successful submission told us
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReply {
    /// New snapshot when the body carried metrics
    pub snapshot: Option<MetricsSnapshot>,
    /// Server-provided message, if any
    pub message: Option<String>,
}

fn parse_object(body: &str) -> Result<MetricsPayload> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FluxPayError::MalformedResponse(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(FluxPayError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| FluxPayError::MalformedResponse(e.to_string()))
}

fn server_error(status: u16, body: &str) -> FluxPayError {
    // Error bodies may still carry a useful message
    let message = parse_object(body).ok().and_then(|payload| payload.mensagem);
    FluxPayError::Server {
        status: Some(status),
        message,
    }
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

/// Decide whether a submission response is a success
///
/// Non-2xx is always a failure, and so is a 2xx body that is not JSON. The
/// [`SuccessConvention`] decides the rest:
///
/// - `ExplicitStatus`: the body must be an object with `status: "ok"`; its
///   metrics (missing ones as zero) become the new snapshot.
/// - `Http2xx`: an empty body is success without metrics; an object is
///   success unless it carries a non-`ok` status, and must contain at least
///   one metric field unless its status is `ok`.
///
/// # Errors
/// Returns `Server` for rejected submissions and `MalformedResponse` for
/// bodies that cannot be understood
pub fn interpret_submission(
    response: &WebhookResponse,
    convention: SuccessConvention,
) -> Result<SubmissionReply> {
    if !response.is_success() {
        return Err(server_error(response.status, &response.body));
    }

    match convention {
        SuccessConvention::ExplicitStatus => {
            let payload = parse_object(&response.body)?;
            if !payload.is_ok_status() {
                return Err(FluxPayError::Server {
                    status: Some(response.status),
                    message: non_blank(payload.mensagem),
                });
            }
            Ok(SubmissionReply {
                snapshot: Some(payload.to_snapshot()),
                message: non_blank(payload.mensagem),
            })
        }
        SuccessConvention::Http2xx => {
            if response.body.trim().is_empty() {
                return Ok(SubmissionReply {
                    snapshot: None,
                    message: None,
                });
            }
            let payload = parse_object(&response.body)?;
            if payload.status.is_some() && !payload.is_ok_status() {
                return Err(FluxPayError::Server {
                    status: Some(response.status),
                    message: non_blank(payload.mensagem),
                });
            }
            if payload.has_metrics() {
                Ok(SubmissionReply {
                    snapshot: Some(payload.to_snapshot()),
                    message: non_blank(payload.mensagem),
                })
            } else if payload.is_ok_status() {
                Ok(SubmissionReply {
                    snapshot: None,
                    message: non_blank(payload.mensagem),
                })
            } else {
                Err(FluxPayError::MalformedResponse(
                    "2xx body has no recognizable metrics".to_string(),
                ))
            }
        }
    }
}

/// Interpret a metrics refresh response
///
/// # Errors
/// Returns `Server` for non-2xx or an explicit error status and
/// `MalformedResponse` for empty or non-object bodies
pub fn interpret_metrics(response: &WebhookResponse) -> Result<MetricsSnapshot> {
    if !response.is_success() {
        return Err(server_error(response.status, &response.body));
    }
    if response.body.trim().is_empty() {
        return Err(FluxPayError::MalformedResponse(
            "empty metrics response".to_string(),
        ));
    }
    let payload = parse_object(&response.body)?;
    if payload.status.is_some() && !payload.is_ok_status() {
        return Err(FluxPayError::Server {
            status: Some(response.status),
            message: non_blank(payload.mensagem),
        });
    }
    Ok(payload.to_snapshot())
}
