use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use uuid::Uuid;

use crate::{
    calibration::{self, CalibrationConfig},
    db::{
        models::{ProfileRecord, SessionRecord},
        Database,
    },
    error::{CalibrationError, MonitorError, SessionError},
    metrics::{MetricsCollector, MetricsSnapshot},
    models::{
        AlertEvent, AssessmentAnswers, CalibrationProfile, CalibrationStatus,
        FinalizedSessionStats, LivePosture, PostureUpdate, RawSample, SensorSample,
    },
    sensing::{Enqueued, Pipeline, SampleQueue, SensingController, SessionChannels},
    settings::SettingsStore,
};

use super::handle::SessionHandle;

const UPDATE_CHANNEL_CAPACITY: usize = 256;
const ALERT_CHANNEL_CAPACITY: usize = 64;

struct ActiveSession {
    handle: SessionHandle,
    sensing: SensingController,
    metrics: MetricsCollector,
}

/// Entry point of the engine: owns calibration profiles and live sessions.
#[derive(Clone)]
pub struct MonitorController {
    db: Database,
    settings: Arc<SettingsStore>,
    profiles: Arc<Mutex<HashMap<String, ProfileRecord>>>,
    sessions: Arc<Mutex<HashMap<String, ActiveSession>>>,
}

impl MonitorController {
    /// Loads stored profiles and closes out sessions a previous run left open.
    pub async fn open(db: Database, settings: Arc<SettingsStore>) -> Result<Self> {
        let stale = db.get_incomplete_sessions().await?;
        for session in stale {
            warn!(
                "session {} for patient {} was left running; marking interrupted",
                session.id, session.patient_id
            );
            db.mark_session_interrupted(&session.id, Utc::now()).await?;
        }

        let profiles = db.latest_profiles().await?;
        info!("loaded calibration profiles for {} patients", profiles.len());

        Ok(Self {
            db,
            settings,
            profiles: Arc::new(Mutex::new(profiles)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Builds and activates a profile from intake answers alone.
    pub async fn calibrate(
        &self,
        patient_id: &str,
        answers: &AssessmentAnswers,
    ) -> Result<CalibrationProfile, CalibrationError> {
        let config = self.settings.calibration_config();
        let profile = calibration::build(answers, &config)
            .map_err(|err| {
                warn!("calibration failed for patient {patient_id}: {err}");
                err
            })?;
        Ok(self.activate_profile(patient_id, profile).await)
    }

    /// Like `calibrate`, with the baseline averaged from a capture window.
    pub async fn calibrate_with_capture(
        &self,
        patient_id: &str,
        answers: &AssessmentAnswers,
        capture: &[SensorSample],
    ) -> Result<CalibrationProfile, CalibrationError> {
        let config = self.settings.calibration_config();
        let profile = calibration::capture_baseline(capture, config.capture)
            .and_then(|baseline| calibration::build_with_baseline(answers, baseline, &config))
            .map_err(|err| {
                warn!("calibration failed for patient {patient_id}: {err}");
                err
            })?;
        Ok(self.activate_profile(patient_id, profile).await)
    }

    /// Replaces the warning threshold of the active profile, as a new version.
    pub async fn override_warning_threshold(
        &self,
        patient_id: &str,
        warning_deg: f64,
    ) -> Result<CalibrationProfile, MonitorError> {
        let current = self
            .active_profile(patient_id)
            .await
            .ok_or_else(|| MonitorError::NotCalibrated(patient_id.to_string()))?;

        let config: CalibrationConfig = self.settings.calibration_config();
        let profile = calibration::with_warning_override(&current.profile, warning_deg, &config)?;
        Ok(self.activate_profile(patient_id, profile).await)
    }

    pub async fn calibration_status(&self, patient_id: &str) -> CalibrationStatus {
        self.profiles
            .lock()
            .await
            .get(patient_id)
            .map(ProfileRecord::status)
            .unwrap_or(CalibrationStatus::NotCalibrated)
    }

    pub async fn active_profile(&self, patient_id: &str) -> Option<ProfileRecord> {
        self.profiles.lock().await.get(patient_id).cloned()
    }

    pub async fn profile_history(&self, patient_id: &str) -> Result<Vec<ProfileRecord>> {
        self.db.get_profile_history(patient_id).await
    }

    pub async fn session_history(&self, patient_id: &str) -> Result<Vec<SessionRecord>> {
        self.db.list_sessions(patient_id).await
    }

    pub async fn start_session(&self, patient_id: &str) -> Result<SessionHandle, MonitorError> {
        let record = self
            .active_profile(patient_id)
            .await
            .ok_or_else(|| MonitorError::NotCalibrated(patient_id.to_string()))?;

        let settings = self.settings.settings();
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let queue = Arc::new(SampleQueue::new(
            session_id.clone(),
            settings.queue_capacity(),
        ));
        let (updates, _) = broadcast::channel::<PostureUpdate>(UPDATE_CHANNEL_CAPACITY);
        let (alerts, _) = broadcast::channel::<AlertEvent>(ALERT_CHANNEL_CAPACITY);
        let (live_tx, live_rx) = watch::channel(LivePosture::default());
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let handle = SessionHandle::new(
            session_id.clone(),
            patient_id.to_string(),
            record.version,
            started_at,
            Arc::clone(&queue),
            updates.clone(),
            alerts.clone(),
            live_rx,
            control_tx,
        );

        let pipeline = Pipeline::new(
            session_id.clone(),
            started_at,
            record.profile,
            settings.alert_config(),
        );
        let metrics = MetricsCollector::new();
        let mut sensing = SensingController::new(session_id.clone(), queue);
        sensing
            .start_sensing(
                pipeline,
                SessionChannels {
                    updates,
                    alerts,
                    live: live_tx,
                },
                metrics.clone(),
                control_rx,
            )
            .map_err(|err| MonitorError::WorkerFailed(err.to_string()))?;

        self.db.record_session_start(&SessionRecord::running(
            session_id.clone(),
            patient_id,
            record.id.clone(),
            started_at,
        ));

        self.sessions.lock().await.insert(
            session_id.clone(),
            ActiveSession {
                handle: handle.clone(),
                sensing,
                metrics,
            },
        );

        info!(
            "started session {session_id} for patient {patient_id} (profile v{}, queue capacity {})",
            record.version,
            settings.queue_capacity()
        );
        Ok(handle)
    }

    /// Stops accepting samples, waits for the queued ones, and returns the
    /// session's final statistics.
    pub async fn stop_session(
        &self,
        handle: &SessionHandle,
    ) -> Result<FinalizedSessionStats, MonitorError> {
        let active = self
            .sessions
            .lock()
            .await
            .remove(handle.session_id())
            .ok_or_else(|| SessionError::SessionClosed(handle.session_id().to_string()))?;

        let ActiveSession { mut sensing, .. } = active;
        match sensing.stop_sensing().await {
            Ok(stats) => {
                self.db.record_session_finished(&stats);
                info!(
                    "stopped session {} after {}ms",
                    stats.session_id,
                    stats.duration_ms()
                );
                Ok(stats)
            }
            Err(err) => {
                error!("session {} did not finish cleanly: {err}", handle.session_id());
                if let Err(db_err) = self
                    .db
                    .mark_session_interrupted(handle.session_id(), Utc::now())
                    .await
                {
                    error!("failed to mark session {} interrupted: {db_err}", handle.session_id());
                }
                Err(err)
            }
        }
    }

    pub fn ingest(&self, handle: &SessionHandle, raw: RawSample) -> Result<Enqueued, MonitorError> {
        handle.ingest(raw)
    }

    pub fn subscribe(&self, handle: &SessionHandle) -> broadcast::Receiver<PostureUpdate> {
        handle.subscribe()
    }

    pub fn subscribe_alerts(&self, handle: &SessionHandle) -> broadcast::Receiver<AlertEvent> {
        handle.subscribe_alerts()
    }

    pub fn live_posture(&self, handle: &SessionHandle) -> LivePosture {
        handle.live_posture()
    }

    pub fn dismiss_notification(&self, handle: &SessionHandle) -> Result<(), MonitorError> {
        handle.dismiss_notification()
    }

    pub async fn metrics(&self, handle: &SessionHandle) -> Result<MetricsSnapshot, MonitorError> {
        let metrics = self
            .sessions
            .lock()
            .await
            .get(handle.session_id())
            .map(|active| active.metrics.clone())
            .ok_or_else(|| SessionError::SessionClosed(handle.session_id().to_string()))?;
        Ok(metrics.get_snapshot(handle.queue()).await)
    }

    /// Looks up a live session by id, e.g. for a device link reconnecting.
    pub async fn session(&self, session_id: &str) -> Result<SessionHandle, MonitorError> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|active| active.handle.clone())
            .ok_or_else(|| MonitorError::UnknownSession(session_id.to_string()))
    }

    pub async fn active_sessions(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    async fn activate_profile(
        &self,
        patient_id: &str,
        profile: CalibrationProfile,
    ) -> CalibrationProfile {
        let mut profiles = self.profiles.lock().await;
        let version = profiles
            .get(patient_id)
            .map(|current| current.version + 1)
            .unwrap_or(1);

        let record = ProfileRecord::new(patient_id, version, profile);
        self.db.record_profile(&record);
        profiles.insert(patient_id.to_string(), record);

        info!(
            "patient {patient_id} calibrated: v{version}, warning {:.1}°, danger {:.1}°",
            profile.warning_threshold_deg, profile.danger_threshold_deg
        );
        profile
    }
}
