//! Storage event intake for both trigger variants.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use pngflow_core::{
    ConversionEvent, EventOutcome, EventReport, InputError, PushEnvelope, TriggerSource,
};

use crate::metrics::EVENTS_REFUSED;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Body returned when an event is refused with 400.
#[derive(Debug, Serialize)]
pub struct EventErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<EventReport>,
}

type EventResult = Result<Json<EventReport>, (StatusCode, Json<EventErrorResponse>)>;

fn refused(trigger: TriggerSource, err: &InputError) -> (StatusCode, Json<EventErrorResponse>) {
    EVENTS_REFUSED
        .with_label_values(&[trigger.as_str(), err.kind()])
        .inc();
    warn!(trigger = trigger.as_str(), kind = err.kind(), "Refusing event: {}", err);
    (
        StatusCode::BAD_REQUEST,
        Json(EventErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
            report: None,
        }),
    )
}

fn parse_json(
    trigger: TriggerSource,
    body: &[u8],
) -> Result<Value, (StatusCode, Json<EventErrorResponse>)> {
    serde_json::from_slice(body)
        .map_err(|e| refused(trigger, &InputError::InvalidPayload(e.to_string())))
}

// ============================================================================
// Handlers
// ============================================================================

/// Push-subscription delivery: `{message: {data: base64(JSON)}}`.
///
/// Answers 400 when the envelope cannot be decoded or the file name is
/// refused by the untracked-file policy; 200 for everything else, including
/// pipeline failures.
pub async fn push_event(State(state): State<Arc<AppState>>, body: Bytes) -> EventResult {
    let trigger = TriggerSource::Push;
    let value = parse_json(trigger, &body)?;
    let envelope: PushEnvelope = serde_json::from_value(value)
        .map_err(|e| refused(trigger, &InputError::InvalidPayload(e.to_string())))?;
    let event = ConversionEvent::from_push_envelope(&envelope).map_err(|e| refused(trigger, &e))?;

    let report = state.pipeline().handle(&event).await;
    let rejection = match &report.outcome {
        EventOutcome::Rejected { reason } => Some(reason.clone()),
        _ => None,
    };
    if let Some(reason) = rejection {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(EventErrorResponse {
                error: reason,
                kind: "rejected",
                report: Some(report),
            }),
        ));
    }

    log_report(&report);
    Ok(Json(report))
}

/// Direct object descriptor delivery. Acknowledged with 200 once the JSON
/// parses; the outcome is only logged and echoed.
pub async fn storage_event(State(state): State<Arc<AppState>>, body: Bytes) -> EventResult {
    let trigger = TriggerSource::Direct;
    let value = parse_json(trigger, &body)?;

    let report = match ConversionEvent::from_object(value, trigger) {
        Ok(event) => state.pipeline().handle(&event).await,
        Err(e) => {
            EVENTS_REFUSED
                .with_label_values(&[trigger.as_str(), e.kind()])
                .inc();
            warn!(kind = e.kind(), "Acknowledging unusable event: {}", e);
            EventReport {
                bucket: String::new(),
                name: String::new(),
                trigger,
                message_id: None,
                outcome: EventOutcome::Rejected {
                    reason: e.to_string(),
                },
                duration_ms: 0,
            }
        }
    };

    log_report(&report);
    Ok(Json(report))
}

fn log_report(report: &EventReport) {
    info!(
        bucket = %report.bucket,
        key = %report.name,
        outcome = report.outcome.label(),
        duration_ms = report.duration_ms,
        "Event acknowledged"
    );
}
