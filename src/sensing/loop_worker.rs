use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{MonitorError, SessionError};
use crate::metrics::MetricsCollector;
use crate::models::{AlertEvent, FinalizedSessionStats, LivePosture, PostureUpdate};

use super::pipeline::Pipeline;
use super::queue::SampleQueue;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

/// Requests from the outside that must be applied in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    DismissNotification,
}

/// Outbound streams of one session.
#[derive(Clone)]
pub struct SessionChannels {
    pub updates: broadcast::Sender<PostureUpdate>,
    pub alerts: broadcast::Sender<AlertEvent>,
    pub live: watch::Sender<LivePosture>,
}

pub async fn sensing_loop(
    session_id: String,
    mut pipeline: Pipeline,
    queue: Arc<SampleQueue>,
    channels: SessionChannels,
    metrics: MetricsCollector,
    mut control_rx: mpsc::UnboundedReceiver<ControlCommand>,
    cancel_token: CancellationToken,
) -> Result<FinalizedSessionStats, SessionError> {
    log_info!("sensing loop started for session {}", session_id);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop for session {} draining", session_id);
                break;
            }
            Some(command) = control_rx.recv() => {
                // Samples accepted before the command was sent come first.
                process_pending(&session_id, &mut pipeline, &queue, &channels, &metrics).await;
                apply_command(&session_id, &mut pipeline, &channels, command);
            }
            _ = queue.notified() => {
                process_pending(&session_id, &mut pipeline, &queue, &channels, &metrics).await;
            }
        }
    }

    // Everything accepted before the stop request still counts.
    queue.close();
    process_pending(&session_id, &mut pipeline, &queue, &channels, &metrics).await;

    let invalid = queue.invalid_samples() + metrics.invalid_samples().await;
    let (finalized, closing) = pipeline.finish(Utc::now(), queue.samples_dropped(), invalid)?;

    if let Some(alert) = closing {
        metrics.record_alerts(1).await;
        let _ = channels.alerts.send(alert);
    }
    let _ = channels.live.send(pipeline.live());

    if finalized.samples_dropped > 0 || finalized.invalid_samples > 0 {
        log_warn!(
            "session {} finished with {} dropped and {} invalid samples",
            session_id,
            finalized.samples_dropped,
            finalized.invalid_samples
        );
    }
    log_info!(
        "sensing loop for session {} finished: {} samples, {:.1}% upright, {} corrections",
        session_id,
        finalized.sample_count,
        finalized.upright_percentage,
        finalized.correction_count
    );

    Ok(finalized)
}

async fn process_pending(
    session_id: &str,
    pipeline: &mut Pipeline,
    queue: &SampleQueue,
    channels: &SessionChannels,
    metrics: &MetricsCollector,
) {
    while let Some(sample) = queue.pop() {
        match pipeline.process(&sample) {
            Ok(output) => {
                if output.classification.changed() {
                    log_debug!(
                        "session {}: {} -> {} at {:.1}°",
                        session_id,
                        output.classification.previous,
                        output.classification.state,
                        output.classification.tilt_angle_deg
                    );
                }

                metrics
                    .record_processed(&output.classification, output.alerts.len())
                    .await;

                // Lagging or absent subscribers never hold up the pipeline.
                let _ = channels.updates.send(output.update);
                for alert in output.alerts {
                    let _ = channels.alerts.send(alert);
                }
                let _ = channels.live.send(pipeline.live());
            }
            Err(MonitorError::Sample(err)) => {
                log_debug!("session {}: dropping sample: {err}", session_id);
                metrics.record_invalid().await;
            }
            Err(err) => {
                log_error!("session {}: pipeline rejected sample: {err}", session_id);
                break;
            }
        }
    }
}

fn apply_command(
    session_id: &str,
    pipeline: &mut Pipeline,
    channels: &SessionChannels,
    command: ControlCommand,
) {
    match command {
        ControlCommand::DismissNotification => {
            if pipeline.dismiss_notification() {
                log_debug!("session {}: notification dismissed", session_id);
            }
            let _ = channels.live.send(pipeline.live());
        }
    }
}
