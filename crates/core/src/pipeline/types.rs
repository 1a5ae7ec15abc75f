//! Types for the pipeline module.

use serde::Serialize;

use super::event::TriggerSource;

/// A step of event handling that can fail after the event is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Workspace,
    Download,
    Conversion,
    Upload,
    Tracking,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Workspace => "workspace",
            Stage::Download => "download",
            Stage::Conversion => "conversion",
            Stage::Upload => "upload",
            Stage::Tracking => "tracking",
        }
    }
}

/// What happened to the order after its item was converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackingOutcome {
    /// The file name carried no identifiers; nothing was tracked.
    Untracked,
    /// The item was marked, other approved items are still pending.
    Incomplete,
    /// The order completed and the webhook was delivered.
    Notified,
    /// The order completed but the webhook failed. Not retried.
    NotificationFailed { error: String },
    /// The order completed and another event owns the notification.
    AlreadyNotified,
    /// The order completed and no notifier is configured.
    CompleteWithoutNotifier,
}

/// Final outcome of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Out of scope (not a PDF). No side effects.
    Ignored { reason: String },
    /// Malformed or refused by policy. No side effects.
    Rejected { reason: String },
    /// Rendered image uploaded.
    Converted {
        output_bucket: String,
        output_key: String,
        aggregation: TrackingOutcome,
    },
    /// A stage failed after the event was accepted. The workspace was removed.
    Failed { stage: Stage, error: String },
}

impl EventOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Ignored { .. } => "ignored",
            EventOutcome::Rejected { .. } => "rejected",
            EventOutcome::Converted { .. } => "converted",
            EventOutcome::Failed { .. } => "failed",
        }
    }
}

/// Report returned for every handled event.
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub bucket: String,
    pub name: String,
    pub trigger: TriggerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(flatten)]
    pub outcome: EventOutcome,
    pub duration_ms: u64,
}
