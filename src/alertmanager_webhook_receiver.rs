use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::Extension,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    alarm::{AlarmData, AlarmSender},
    alert::{self, Qualification},
    debug_dump::DebugDump,
    metrics::{BridgeMetrics, SkipReason},
};

fn default_path() -> String {
    String::from("/input")
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertReceiverSettings {
    pub bind_address: IpAddr,
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
}

impl AlertReceiverSettings {
    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// shared, read only state of the webhook handler
pub struct State<S> {
    pub sender: S,
    /// address of the unit alarms are sent to
    pub address: String,
    /// severity that triggers an alarm
    pub page_severity: String,
    pub metrics: BridgeMetrics,
}

/// id of a webhook request, used in logs and debug dumps
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

async fn assign_request_id(mut req: Request<Body>, next: Next<Body>) -> Response {
    req.extensions_mut().insert(RequestId(Uuid::new_v4()));
    next.run(req).await
}

/// writes the raw webhook body to the [DebugDump] before it reaches the handler
async fn dump_inbound(req: Request<Body>, next: Next<Body>) -> Response {
    let (parts, body) = req.into_parts();

    let body = match hyper::body::to_bytes(body).await {
        Ok(body) => body,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    if let (Some(dump), Some(RequestId(request_id))) =
        (parts.extensions.get::<DebugDump>(), parts.extensions.get::<RequestId>())
    {
        dump.inbound(*request_id, &body).await;
    }

    next.run(Request::from_parts(parts, Body::from(body))).await
}

async fn prometheus_receiver<S: AlarmSender>(
    Extension(state): Extension<Arc<State<S>>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Bytes,
) -> (StatusCode, String) {
    let data: alert::Data = match serde_json::from_slice(&body) {
        Ok(data) => data,
        Err(err) => {
            tracing::debug!(%request_id, "failed to deserialize alert: {err}");
            return (StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    tracing::debug!(
        %request_id,
        receiver = %data.receiver,
        group_key = %data.group_key,
        alerts = data.alerts.len(),
        "received alerts"
    );

    for alert in data.alerts.iter() {
        state.metrics.record_received(match alert.status {
            alert::AlertStatus::Firing => "firing",
            alert::AlertStatus::Resolved => "resolved",
            alert::AlertStatus::Unknown => "unknown",
        });

        match alert.qualify(&state.page_severity) {
            Qualification::Forward => {}
            Qualification::IgnoredStatus => {
                tracing::debug!(%request_id, "ignoring alert with status {:?}", alert.status);
                state.metrics.record_skipped(SkipReason::Status);
                continue;
            }
            Qualification::MissingSeverity => {
                tracing::warn!(
                    %request_id,
                    alertname = alert.labels.alertname.as_deref().unwrap_or_default(),
                    "alert has no severity label, not forwarding it"
                );
                state.metrics.record_skipped(SkipReason::MissingSeverity);
                continue;
            }
            Qualification::IgnoredSeverity(severity) => {
                tracing::info!(%request_id, %severity, "no action on severity");
                state.metrics.record_skipped(SkipReason::Severity);
                continue;
            }
        }

        let alarm = AlarmData::from_alert(alert, &state.address);

        let result = {
            let _timer = state.metrics.forward_timer();
            state.sender.send_alert(&alarm, request_id).await
        };

        state.metrics.record_forwarded(result.is_ok());

        if let Err(err) = result {
            tracing::error!(%request_id, external_id = %alarm.external_id, "failed to forward alert: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, String::from("ERROR"));
        }
    }

    (StatusCode::OK, String::from("OK"))
}

/// router with the webhook route, split from [run_prometheus_receiver] for tests
///
/// * `dump` - dump every incoming body here, if set
pub fn router<S: AlarmSender>(path: &str, state: Arc<State<S>>, dump: Option<DebugDump>) -> Router {
    let mut app = Router::new().route(path, post(prometheus_receiver::<S>)).layer(Extension(state));

    if let Some(dump) = dump {
        app = app.layer(middleware::from_fn(dump_inbound)).layer(Extension(dump));
    }

    app.layer(middleware::from_fn(assign_request_id))
}

pub async fn run_prometheus_receiver<S: AlarmSender>(
    settings: &AlertReceiverSettings,
    state: Arc<State<S>>,
    dump: Option<DebugDump>,
) -> Result<()> {
    let addr = settings.to_socket_addr();
    let app = router(&settings.path, state, dump);

    tracing::info!("listening for alertmanager webhooks on {addr}{}", settings.path);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("prometheus endpoint crashed")?;

    Ok(())
}
