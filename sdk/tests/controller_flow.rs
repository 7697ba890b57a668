//! End-to-end controller behavior against a scripted webhook

use async_trait::async_trait;
use fluxpay_sdk::{
    DashboardConfig, FluxPayError, MetricsSnapshot, MetricsWebhook, Money, NoticeKind,
    PaymentDashboardController, Result, SubmissionPayload, SubmissionState, SuccessConvention,
    ValidationError, WebhookResponse,
};
use serde_json::json;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::Notify;

/// Replays queued responses and records what it was sent
#[derive(Default)]
struct ScriptedWebhook {
    submit_replies: Mutex<VecDeque<Result<WebhookResponse>>>,
    metrics_replies: Mutex<VecDeque<Result<WebhookResponse>>>,
    submitted: Mutex<Vec<SubmissionPayload>>,
    fetches: Mutex<u32>,
    /// When set, `submit` waits for a notification before answering
    gate: Option<Arc<Notify>>,
    /// When set, `fetch_metrics` waits for a notification before answering
    fetch_gate: Option<Arc<Notify>>,
}

impl ScriptedWebhook {
    fn queue_submit(&self, reply: Result<WebhookResponse>) {
        self.submit_replies.lock().unwrap().push_back(reply);
    }

    fn queue_metrics(&self, reply: Result<WebhookResponse>) {
        self.metrics_replies.lock().unwrap().push_back(reply);
    }

    fn submitted(&self) -> Vec<SubmissionPayload> {
        self.submitted.lock().unwrap().clone()
    }

    fn fetches(&self) -> u32 {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl MetricsWebhook for ScriptedWebhook {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<WebhookResponse> {
        self.submitted.lock().unwrap().push(payload.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.submit_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WebhookResponse::new(500, "")))
    }

    async fn fetch_metrics(&self) -> Result<WebhookResponse> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }
        self.metrics_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FluxPayError::Network("no scripted reply".to_string())))
    }
}

fn config() -> DashboardConfig {
    DashboardConfig::from_url("https://hooks.example.com/fluxpay").unwrap()
}

fn controller(webhook: &Arc<ScriptedWebhook>) -> PaymentDashboardController<Arc<ScriptedWebhook>> {
    PaymentDashboardController::new(Arc::clone(webhook), config()).unwrap()
}

fn metrics_body(invested: u32, billed: u32, profit: u32) -> WebhookResponse {
    WebhookResponse::ok_json(&json!({
        "status": "ok",
        "investido": invested,
        "faturamentoTotal": billed,
        "lucro": profit
    }))
}

fn fill_premium(controller: &PaymentDashboardController<Arc<ScriptedWebhook>>) {
    controller.input_phone("11987654321");
    controller.select_product(Some("guia_noiva_inteligente"));
    controller.select_plan(Some("premium"));
}

#[tokio::test]
async fn test_premium_submission_sends_catalog_price() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Ok(metrics_body(1000, 2500, 1500)));
    let controller = controller(&webhook);
    fill_premium(&controller);
    // A typed amount is ignored when the product has plans
    controller.input_amount("100");

    let receipt = controller.submit().await.unwrap();

    let sent = webhook.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        serde_json::to_value(&sent[0]).unwrap(),
        json!({
            "telefone": "11987654321",
            "produto": "guia_noiva_inteligente",
            "plano": "premium",
            "valor": 19.9
        })
    );

    assert_eq!(receipt.notice.kind, NoticeKind::Success);
    assert_eq!(receipt.notice.message, "Pagamento registrado com sucesso!");

    let display = controller.snapshot().display();
    assert_eq!(display.invested, "R$ 1.000,00");
    assert_eq!(display.billed, "R$ 2.500,00");
    assert_eq!(display.roas, "2.50x");
    assert_eq!(display.profit, "R$ 1.500,00");
    assert!(controller.form().is_empty());
}

#[tokio::test]
async fn test_open_amount_submission() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Ok(metrics_body(10, 150, 140)));
    let controller = controller(&webhook);
    controller.input_phone("(11) 3456-7890");
    controller.input_amount("15000");

    controller.submit().await.unwrap();

    assert_eq!(
        serde_json::to_value(&webhook.submitted()[0]).unwrap(),
        json!({"telefone": "1134567890", "valor": 150.0})
    );
}

#[tokio::test]
async fn test_server_error_keeps_form_and_metrics() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Ok(metrics_body(1000, 2500, 1500)));
    webhook.queue_submit(Ok(WebhookResponse::new(500, "Internal Server Error")));
    let controller = controller(&webhook);

    fill_premium(&controller);
    controller.submit().await.unwrap();
    let before = controller.snapshot();

    fill_premium(&controller);
    let form = controller.form();
    let error = controller.submit().await.unwrap_err();

    assert!(matches!(error, FluxPayError::Server { status: Some(500), .. }));
    assert_eq!(error.notice().kind, NoticeKind::Error);
    assert_eq!(error.notice().message, "Erro ao processar pagamento.");
    assert_eq!(controller.form(), form);
    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_explicit_error_status_shows_server_message() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Ok(WebhookResponse::ok_json(
        &json!({"status": "error", "mensagem": "Telefone bloqueado"}),
    )));
    let controller = controller(&webhook);
    fill_premium(&controller);

    let error = controller.submit().await.unwrap_err();
    assert_eq!(error.notice().message, "Telefone bloqueado");
    assert_eq!(controller.snapshot(), MetricsSnapshot::zero());
}

#[tokio::test]
async fn test_network_failure_message() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Err(FluxPayError::Network("connection refused".to_string())));
    let controller = controller(&webhook);
    fill_premium(&controller);

    let error = controller.submit().await.unwrap_err();
    assert_eq!(
        error.notice().message,
        "Erro ao conectar com o servidor. Verifique sua conexão."
    );
    assert!(!controller.form().is_empty());
}

#[tokio::test]
async fn test_validation_failure_never_reaches_webhook() {
    let webhook = Arc::new(ScriptedWebhook::default());
    let controller = controller(&webhook);

    let error = controller.submit().await.unwrap_err();
    assert!(matches!(
        error,
        FluxPayError::Validation(ValidationError::MissingFields)
    ));
    assert_eq!(error.notice().message, "Por favor, preencha todos os campos.");

    controller.input_phone("11987654321");
    controller.select_product(Some("guia_noiva_inteligente"));
    let error = controller.submit().await.unwrap_err();
    assert!(matches!(
        error,
        FluxPayError::Validation(ValidationError::PlanRequired { .. })
    ));

    assert!(webhook.submitted().is_empty());
}

#[tokio::test]
async fn test_concurrent_submission_is_rejected() {
    let gate = Arc::new(Notify::new());
    let webhook = Arc::new(ScriptedWebhook {
        gate: Some(Arc::clone(&gate)),
        ..ScriptedWebhook::default()
    });
    webhook.queue_submit(Ok(metrics_body(1, 2, 1)));
    let controller = Arc::new(controller(&webhook));
    fill_premium(&controller);

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit().await }
    });

    // Wait until the first submission is parked inside the webhook
    while webhook.submitted().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.state(), SubmissionState::Submitting);

    let second = controller.submit().await.unwrap_err();
    assert!(matches!(second, FluxPayError::SubmissionInFlight));
    assert_eq!(webhook.submitted().len(), 1);

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(controller.state(), SubmissionState::Idle);
    assert_eq!(controller.snapshot().billed, Money::from_cents(200));
}

#[tokio::test]
async fn test_http2xx_convention_accepts_empty_body() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_submit(Ok(WebhookResponse::new(204, "")));
    let mut config = config();
    config.success_convention = SuccessConvention::Http2xx;
    let controller = PaymentDashboardController::new(Arc::clone(&webhook), config).unwrap();
    fill_premium(&controller);

    let receipt = controller.submit().await.unwrap();
    assert!(receipt.snapshot.is_none());
    assert_eq!(controller.snapshot(), MetricsSnapshot::zero());
    assert!(controller.form().is_empty());
}

#[tokio::test]
async fn test_refresh_failure_keeps_snapshot() {
    let webhook = Arc::new(ScriptedWebhook::default());
    webhook.queue_metrics(Ok(WebhookResponse::ok_json(
        &json!({"investido": 1000, "faturado": 2500, "lucro": 1500}),
    )));
    webhook.queue_metrics(Ok(WebhookResponse::new(502, "Bad Gateway")));
    webhook.queue_metrics(Ok(WebhookResponse::new(200, "not json")));
    let controller = controller(&webhook);

    let first = controller.refresh_metrics().await.unwrap();
    assert_eq!(first.billed, Money::from_cents(250_000));

    assert!(controller.refresh_metrics().await.is_none());
    assert!(controller.refresh_metrics().await.is_none());
    assert!(controller.refresh_metrics().await.is_none());
    assert_eq!(controller.snapshot(), first);
}

#[tokio::test(start_paused = true)]
async fn test_poller_refreshes_on_interval_until_disposed() {
    let webhook = Arc::new(ScriptedWebhook::default());
    for billed in [100, 200, 300, 400] {
        webhook.queue_metrics(Ok(WebhookResponse::ok_json(
            &json!({"investido": 50, "faturado": billed, "lucro": billed - 50}),
        )));
    }
    let mut config = config();
    config.poll_interval = Duration::from_secs(300);
    let controller = PaymentDashboardController::new(Arc::clone(&webhook), config).unwrap();
    let mut updates = controller.subscribe();

    assert!(controller.start().unwrap());
    assert!(!controller.start().unwrap());
    assert!(controller.is_running());

    // First refresh happens right away
    updates.changed().await.unwrap();
    assert_eq!(controller.snapshot().billed, Money::from_cents(10_000));
    assert_eq!(webhook.fetches(), 1);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(webhook.fetches(), 2);
    assert_eq!(controller.snapshot().billed, Money::from_cents(20_000));

    controller.dispose().await;
    assert!(!controller.is_running());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(webhook.fetches(), 2);
}

#[tokio::test]
async fn test_dispose_cancels_refresh_in_progress() {
    let webhook = Arc::new(ScriptedWebhook {
        fetch_gate: Some(Arc::new(Notify::new())),
        ..ScriptedWebhook::default()
    });
    webhook.queue_metrics(Ok(metrics_body(100, 300, 200)));
    let controller = controller(&webhook);

    assert!(controller.start().unwrap());
    // Wait until the first refresh is parked inside the webhook
    while webhook.fetches() == 0 {
        tokio::task::yield_now().await;
    }

    tokio::time::timeout(Duration::from_secs(1), controller.dispose())
        .await
        .expect("dispose should not wait for the pending refresh");
    assert!(!controller.is_running());
    assert_eq!(controller.snapshot(), MetricsSnapshot::zero());
}
