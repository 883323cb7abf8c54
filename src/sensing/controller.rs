use std::sync::Arc;

use anyhow::{bail, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{MonitorError, SessionError};
use crate::metrics::MetricsCollector;
use crate::models::FinalizedSessionStats;

use super::loop_worker::{sensing_loop, ControlCommand, SessionChannels};
use super::pipeline::Pipeline;
use super::queue::SampleQueue;

/// Owns the worker task of one session.
pub struct SensingController {
    session_id: String,
    queue: Arc<SampleQueue>,
    handle: Option<JoinHandle<Result<FinalizedSessionStats, SessionError>>>,
    cancel_token: Option<CancellationToken>,
}

impl SensingController {
    pub fn new(session_id: impl Into<String>, queue: Arc<SampleQueue>) -> Self {
        Self {
            session_id: session_id.into(),
            queue,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_sensing(
        &mut self,
        pipeline: Pipeline,
        channels: SessionChannels,
        metrics: MetricsCollector,
        control_rx: mpsc::UnboundedReceiver<ControlCommand>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sensing already active for session {}", self.session_id);
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(
            self.session_id.clone(),
            pipeline,
            Arc::clone(&self.queue),
            channels,
            metrics,
            control_rx,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Refuses new samples, lets the worker finish what was already
    /// accepted, and returns the finalized statistics.
    pub async fn stop_sensing(&mut self) -> Result<FinalizedSessionStats, MonitorError> {
        self.queue.close();

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let Some(handle) = self.handle.take() else {
            return Err(SessionError::SessionClosed(self.session_id.clone()).into());
        };

        info!("waiting for session {} to drain", self.session_id);
        match handle.await {
            Ok(result) => result.map_err(MonitorError::from),
            Err(join_err) => Err(MonitorError::WorkerFailed(format!(
                "sensing loop for session {} failed to join: {join_err}",
                self.session_id
            ))),
        }
    }
}

impl Drop for SensingController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
