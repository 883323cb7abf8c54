//! Synchronous per-session pipeline: estimate, classify, dispatch, aggregate.
//!
//! Samples must be fed in arrival order; the classifier's next state depends
//! on its previous one. The async worker wraps this type, and tests drive it
//! directly.

use chrono::{DateTime, Utc};

use crate::alerts::{AlertConfig, AlertDispatcher};
use crate::classifier::PostureClassifier;
use crate::error::{MonitorError, SessionError};
use crate::models::{
    AlertEvent, CalibrationProfile, Classification, FinalizedSessionStats, LivePosture,
    PostureUpdate, SensorSample,
};
use crate::session::SessionAggregator;
use crate::tilt;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub update: PostureUpdate,
    pub classification: Classification,
    pub alerts: Vec<AlertEvent>,
}

pub struct Pipeline {
    profile: CalibrationProfile,
    classifier: PostureClassifier,
    dispatcher: AlertDispatcher,
    aggregator: SessionAggregator,
    live: LivePosture,
}

impl Pipeline {
    pub fn new(
        session_id: impl Into<String>,
        start_time: DateTime<Utc>,
        profile: CalibrationProfile,
        alert_config: AlertConfig,
    ) -> Self {
        Self {
            classifier: PostureClassifier::new(&profile),
            dispatcher: AlertDispatcher::new(alert_config),
            aggregator: SessionAggregator::start(session_id, start_time),
            live: LivePosture::default(),
            profile,
        }
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn live(&self) -> LivePosture {
        self.live
    }

    pub fn process(&mut self, sample: &SensorSample) -> Result<PipelineOutput, MonitorError> {
        if self.aggregator.is_closed() {
            return Err(
                SessionError::SessionClosed(self.aggregator.stats().session_id.clone()).into(),
            );
        }

        let reading = tilt::estimate(sample, &self.profile)?;
        let classification = self.classifier.classify(&reading);
        let alerts = self.dispatcher.dispatch(&classification);
        self.aggregator.observe(&reading, classification.state)?;

        self.live.apply(sample, &reading, classification.state);
        self.live.haptic_active = self.dispatcher.haptic_active();
        self.live.notification_visible = self.dispatcher.notification_visible();

        Ok(PipelineOutput {
            update: PostureUpdate {
                state: classification.state,
                reading,
            },
            classification,
            alerts,
        })
    }

    pub fn dismiss_notification(&mut self) -> bool {
        let dismissed = self.dispatcher.dismiss();
        self.live.notification_visible = false;
        dismissed
    }

    /// Finalizes the statistics and returns any closing alert.
    pub fn finish(
        &mut self,
        end_time: DateTime<Utc>,
        samples_dropped: u64,
        invalid_samples: u64,
    ) -> Result<(FinalizedSessionStats, Option<AlertEvent>), SessionError> {
        let finalized = self
            .aggregator
            .finish(end_time, samples_dropped, invalid_samples)?;
        let closing = self.dispatcher.shutdown(end_time);

        self.live.haptic_active = false;
        self.live.notification_visible = false;

        Ok((finalized, closing))
    }
}
