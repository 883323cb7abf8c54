use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch};

use crate::error::{MonitorError, SessionError};
use crate::models::{AlertEvent, LivePosture, PostureUpdate, RawSample, SensorSample};
use crate::sensing::{ControlCommand, Enqueued, SampleQueue};

/// Caller-side view of one live session.
///
/// Cloning is cheap. Ingest goes straight to the session's queue, so the
/// device link never contends with other sessions.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    patient_id: String,
    profile_version: u32,
    started_at: DateTime<Utc>,
    queue: Arc<SampleQueue>,
    updates: broadcast::Sender<PostureUpdate>,
    alerts: broadcast::Sender<AlertEvent>,
    live: watch::Receiver<LivePosture>,
    control: mpsc::UnboundedSender<ControlCommand>,
}

impl SessionHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        session_id: String,
        patient_id: String,
        profile_version: u32,
        started_at: DateTime<Utc>,
        queue: Arc<SampleQueue>,
        updates: broadcast::Sender<PostureUpdate>,
        alerts: broadcast::Sender<AlertEvent>,
        live: watch::Receiver<LivePosture>,
        control: mpsc::UnboundedSender<ControlCommand>,
    ) -> Self {
        Self {
            session_id,
            patient_id,
            profile_version,
            started_at,
            queue,
            updates,
            alerts,
            live,
            control,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// Version of the calibration profile this session runs against.
    pub fn profile_version(&self) -> u32 {
        self.profile_version
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ingest(&self, raw: RawSample) -> Result<Enqueued, MonitorError> {
        self.queue.ingest(raw)
    }

    pub fn push(&self, sample: SensorSample) -> Result<Enqueued, MonitorError> {
        self.queue.push(sample)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PostureUpdate> {
        self.updates.subscribe()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alerts.subscribe()
    }

    pub fn live_posture(&self) -> LivePosture {
        *self.live.borrow()
    }

    pub fn watch_live(&self) -> watch::Receiver<LivePosture> {
        self.live.clone()
    }

    pub fn dismiss_notification(&self) -> Result<(), MonitorError> {
        self.control
            .send(ControlCommand::DismissNotification)
            .map_err(|_| MonitorError::from(SessionError::SessionClosed(self.session_id.clone())))
    }

    pub(crate) fn queue(&self) -> &Arc<SampleQueue> {
        &self.queue
    }
}
