//! Per-event orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{PipelineConfig, UntrackedFilePolicy};
use crate::filename::{self, FilenameIdentifiers};
use crate::items::{AggregationOutcome, CompletionAggregator, StoreError};
use crate::metrics;
use crate::notifier::Notifier;
use crate::rasterizer::{Rasterizer, RenderOptions};
use crate::storage::ObjectStorage;
use crate::workspace::Workspace;

use super::error::{InputError, PipelineError};
use super::event::ConversionEvent;
use super::types::{EventOutcome, EventReport, TrackingOutcome};

/// Name of the downloaded document inside a workspace.
const SOURCE_FILE: &str = "source.pdf";
const PNG_CONTENT_TYPE: &str = "image/png";

/// An event that passed screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenedEvent {
    /// Identifiers for tracking, `None` when converting an untracked file.
    pub ids: Option<FilenameIdentifiers>,
    pub output_key: String,
}

/// Runs one event through workspace, download, render, upload and tracking.
///
/// Collaborators are shared; each call gets its own workspace, so events
/// can be handled concurrently.
pub struct EventPipeline {
    config: PipelineConfig,
    storage: Arc<dyn ObjectStorage>,
    rasterizer: Arc<dyn Rasterizer>,
    render_options: RenderOptions,
    aggregator: CompletionAggregator,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EventPipeline {
    pub fn new(
        config: PipelineConfig,
        storage: Arc<dyn ObjectStorage>,
        rasterizer: Arc<dyn Rasterizer>,
        render_options: RenderOptions,
        aggregator: CompletionAggregator,
    ) -> Self {
        Self {
            config,
            storage,
            rasterizer,
            render_options,
            aggregator,
            notifier: None,
        }
    }

    /// Sets the notifier called when an order completes.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Checks an event against the file name contract. No side effects.
    pub fn screen(&self, event: &ConversionEvent) -> Result<ScreenedEvent, InputError> {
        let output_key = filename::output_key(&event.name).ok_or_else(|| InputError::NotPdf {
            name: event.name.clone(),
        })?;

        let ids = filename::parse_identifiers(&event.name);
        if ids.is_none() && self.config.untracked_files == UntrackedFilePolicy::Reject {
            return Err(InputError::UntrackedFilename {
                name: event.name.clone(),
            });
        }

        Ok(ScreenedEvent { ids, output_key })
    }

    /// Handles one event to completion. Never fails: every outcome, including
    /// stage failures, is reported in the returned `EventReport`.
    pub async fn handle(&self, event: &ConversionEvent) -> EventReport {
        let span = info_span!(
            "event",
            bucket = %event.bucket,
            key = %event.name,
            trigger = event.source.as_str()
        );
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: &ConversionEvent) -> EventReport {
        let started = Instant::now();

        let outcome = match self.screen(event) {
            Err(e) if e.is_ignorable() => {
                debug!(reason = %e, "Ignoring event");
                EventOutcome::Ignored {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(reason = %e, "Rejecting event");
                EventOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
            Ok(screened) => match self.process(event, &screened).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let stage = e.stage();
                    error!(stage = stage.as_str(), error = %e, "Event failed");
                    metrics::STAGE_FAILURES
                        .with_label_values(&[stage.as_str()])
                        .inc();
                    EventOutcome::Failed {
                        stage,
                        error: e.to_string(),
                    }
                }
            },
        };

        let elapsed = started.elapsed();
        metrics::EVENTS_TOTAL
            .with_label_values(&[event.source.as_str(), outcome.label()])
            .inc();
        metrics::EVENT_DURATION
            .with_label_values(&[outcome.label()])
            .observe(elapsed.as_secs_f64());

        EventReport {
            bucket: event.bucket.clone(),
            name: event.name.clone(),
            trigger: event.source,
            message_id: event.message_id.clone(),
            outcome,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    /// Runs the side-effecting stages inside a workspace that is always removed.
    async fn process(
        &self,
        event: &ConversionEvent,
        screened: &ScreenedEvent,
    ) -> Result<EventOutcome, PipelineError> {
        let mut workspace = Workspace::create(&self.config.workspace_root, &event.name)
            .await
            .map_err(PipelineError::Workspace)?;

        let result = self.run_stages(&workspace, event, screened).await;
        workspace.delete().await;
        result
    }

    async fn run_stages(
        &self,
        workspace: &Workspace,
        event: &ConversionEvent,
        screened: &ScreenedEvent,
    ) -> Result<EventOutcome, PipelineError> {
        let input = workspace.file_path(SOURCE_FILE);
        self.storage
            .download(&event.bucket, &event.name, &input)
            .await
            .map_err(PipelineError::Download)?;
        if let Ok(meta) = tokio::fs::metadata(&input).await {
            metrics::TRANSFER_BYTES
                .with_label_values(&["download"])
                .inc_by(meta.len());
        }

        let (rendered, rendered_bytes) = self.render(&input).await?;

        let output_bucket = self
            .config
            .output_bucket
            .clone()
            .unwrap_or_else(|| event.bucket.clone());
        self.storage
            .upload(
                &rendered,
                &output_bucket,
                &screened.output_key,
                PNG_CONTENT_TYPE,
            )
            .await
            .map_err(PipelineError::Upload)?;
        metrics::TRANSFER_BYTES
            .with_label_values(&["upload"])
            .inc_by(rendered_bytes);
        info!(
            output_bucket = %output_bucket,
            output_key = %screened.output_key,
            "Uploaded rendered image"
        );

        let aggregation = match &screened.ids {
            Some(ids) => self.track(ids).await?,
            None => {
                info!("No order identifiers in file name, skipping tracking");
                TrackingOutcome::Untracked
            }
        };

        Ok(EventOutcome::Converted {
            output_bucket,
            output_key: screened.output_key.clone(),
            aggregation,
        })
    }

    /// Renders the input, returning the image path and its size.
    async fn render(&self, input: &Path) -> Result<(PathBuf, u64), PipelineError> {
        let started = Instant::now();
        match self.rasterizer.render(input, &self.render_options).await {
            Ok(output) => {
                metrics::CONVERSION_DURATION
                    .with_label_values(&["success"])
                    .observe(output.duration_ms as f64 / 1000.0);
                debug!(
                    rasterizer = self.rasterizer.name(),
                    duration_ms = output.duration_ms,
                    size_bytes = output.size_bytes,
                    "Rendered document"
                );
                Ok((output.output_path, output.size_bytes))
            }
            Err(e) => {
                metrics::CONVERSION_DURATION
                    .with_label_values(&["failed"])
                    .observe(started.elapsed().as_secs_f64());
                Err(e.into())
            }
        }
    }

    /// Marks the item, re-evaluates the order and notifies on completion.
    async fn track(&self, ids: &FilenameIdentifiers) -> Result<TrackingOutcome, StoreError> {
        let Some(notifier) = &self.notifier else {
            if self.aggregator.mark_and_check(ids).await? {
                metrics::ORDERS_COMPLETED.inc();
                info!(order_id = %ids.order_id, "Order complete, no notifier configured");
                return Ok(TrackingOutcome::CompleteWithoutNotifier);
            }
            return Ok(TrackingOutcome::Incomplete);
        };

        match self.aggregator.record_and_check(ids).await? {
            AggregationOutcome::Incomplete => Ok(TrackingOutcome::Incomplete),
            AggregationOutcome::AlreadyNotified => {
                metrics::NOTIFICATIONS_TOTAL
                    .with_label_values(&["already_notified"])
                    .inc();
                Ok(TrackingOutcome::AlreadyNotified)
            }
            AggregationOutcome::Complete => {
                metrics::ORDERS_COMPLETED.inc();
                match notifier.notify(&ids.order_id).await {
                    Ok(()) => {
                        metrics::NOTIFICATIONS_TOTAL
                            .with_label_values(&["sent"])
                            .inc();
                        info!(order_id = %ids.order_id, notifier = notifier.name(), "Order completion notified");
                        Ok(TrackingOutcome::Notified)
                    }
                    Err(e) => {
                        metrics::NOTIFICATIONS_TOTAL
                            .with_label_values(&["failed"])
                            .inc();
                        warn!(order_id = %ids.order_id, error = %e, "Completion notification failed");
                        Ok(TrackingOutcome::NotificationFailed {
                            error: e.to_string(),
                        })
                    }
                }
            }
        }
    }
}
