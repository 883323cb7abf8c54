use chrono::{DateTime, Utc};

use crate::error::SessionError;
use crate::models::{FinalizedSessionStats, PostureState, SessionStats, TiltReading};

/// Owns a session's running statistics until it is finished.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    stats: SessionStats,
    last_state: PostureState,
    closed: bool,
}

impl SessionAggregator {
    pub fn start(session_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            stats: SessionStats::new(session_id.into(), start_time),
            last_state: PostureState::Safe,
            closed: false,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn observe(&mut self, reading: &TiltReading, state: PostureState) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::SessionClosed(self.stats.session_id.clone()));
        }

        self.stats.sample_count += 1;
        if state == PostureState::Safe {
            self.stats.safe_sample_count += 1;
        }
        self.stats.tilt_angle_sum += reading.magnitude();
        if state == PostureState::Unsafe && self.last_state != PostureState::Unsafe {
            self.stats.correction_count += 1;
        }
        self.last_state = state;

        Ok(())
    }

    /// Closes the session. `samples_dropped` and `invalid_samples` come from
    /// the ingest side, which the aggregator never sees.
    pub fn finish(
        &mut self,
        end_time: DateTime<Utc>,
        samples_dropped: u64,
        invalid_samples: u64,
    ) -> Result<FinalizedSessionStats, SessionError> {
        if self.closed {
            return Err(SessionError::SessionClosed(self.stats.session_id.clone()));
        }
        self.closed = true;

        Ok(FinalizedSessionStats {
            session_id: self.stats.session_id.clone(),
            start_time: self.stats.start_time,
            end_time,
            sample_count: self.stats.sample_count,
            safe_sample_count: self.stats.safe_sample_count,
            correction_count: self.stats.correction_count,
            upright_percentage: self.stats.upright_percentage(),
            average_tilt_deg: self.stats.average_tilt_deg(),
            samples_dropped,
            invalid_samples,
        })
    }
}
