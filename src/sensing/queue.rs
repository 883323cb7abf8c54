use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::error::{MonitorError, SampleError, SessionError};
use crate::models::{RawSample, SensorSample};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Slots reserved up front; larger queues grow on demand.
const PREALLOCATED_SLOTS: usize = 1_024;

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Accepted,
    /// Accepted after discarding the oldest queued sample.
    DroppedOldest,
}

struct QueueState {
    samples: VecDeque<SensorSample>,
    last_timestamp: Option<DateTime<Utc>>,
    closed: bool,
}

/// Ingestor and bounded buffer in front of one session's pipeline.
///
/// Pushing never blocks on the consumer. When the buffer is full the oldest
/// sample is discarded, since stale tilt is worse than missing tilt.
pub struct SampleQueue {
    session_id: String,
    capacity: usize,
    state: Mutex<QueueState>,
    notify: Notify,
    dropped: AtomicU64,
    rejected: AtomicU64,
}

impl SampleQueue {
    pub fn new(session_id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            session_id: session_id.into(),
            capacity,
            state: Mutex::new(QueueState {
                samples: VecDeque::with_capacity(capacity.min(PREALLOCATED_SLOTS)),
                last_timestamp: None,
                closed: false,
            }),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Stamps a device sample with its arrival time when it carries none.
    pub fn ingest(&self, raw: RawSample) -> Result<Enqueued, MonitorError> {
        self.push(SensorSample::from_raw(raw, Utc::now()))
    }

    pub fn push(&self, sample: SensorSample) -> Result<Enqueued, MonitorError> {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return Err(SessionError::SessionClosed(self.session_id.clone()).into());
            }

            if let Err(err) = sample.validate() {
                return Err(self.reject(err));
            }
            if state
                .last_timestamp
                .map_or(false, |last| sample.timestamp < last)
            {
                return Err(self.reject(SampleError::OutOfOrder));
            }
            state.last_timestamp = Some(sample.timestamp);

            let outcome = if state.samples.len() >= self.capacity {
                state.samples.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Enqueued::DroppedOldest
            } else {
                Enqueued::Accepted
            };
            state.samples.push_back(sample);
            outcome
        };

        if outcome == Enqueued::DroppedOldest {
            log_debug!("queue full for session {}; dropped oldest sample", self.session_id);
        }
        self.notify.notify_one();
        Ok(outcome)
    }

    pub fn pop(&self) -> Option<SensorSample> {
        self.lock().samples.pop_front()
    }

    /// Stops accepting samples. Already queued samples stay available.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub async fn notified(&self) {
        self.notify.notified().await
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn invalid_samples(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    fn reject(&self, err: SampleError) -> MonitorError {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        log_debug!("rejected sample for session {}: {err}", self.session_id);
        err.into()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_at(ms: i64, roll: f64) -> SensorSample {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        SensorSample::new(start + Duration::milliseconds(ms), 0.0, roll, 0.0, 10.0, 10.0)
    }

    #[test]
    fn full_queue_drops_oldest_and_counts() {
        let queue = SampleQueue::new("s-1", 3);
        for i in 0..3 {
            assert_eq!(queue.push(sample_at(i, i as f64)).unwrap(), Enqueued::Accepted);
        }
        assert_eq!(queue.push(sample_at(3, 3.0)).unwrap(), Enqueued::DroppedOldest);
        assert_eq!(queue.push(sample_at(4, 4.0)).unwrap(), Enqueued::DroppedOldest);

        assert_eq!(queue.samples_dropped(), 2);
        assert_eq!(queue.len(), 3);
        let rolls: Vec<f64> = std::iter::from_fn(|| queue.pop()).map(|s| s.roll_deg).collect();
        assert_eq!(rolls, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn invalid_sample_is_rejected_and_counted() {
        let queue = SampleQueue::new("s-1", 3);
        let mut bad = sample_at(0, 0.0);
        bad.fsr_right = -2.0;

        let result = queue.push(bad);
        assert!(matches!(
            result,
            Err(MonitorError::Sample(SampleError::InvalidSample { .. }))
        ));
        assert_eq!(queue.invalid_samples(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn out_of_order_sample_is_rejected() {
        let queue = SampleQueue::new("s-1", 3);
        queue.push(sample_at(100, 0.0)).unwrap();
        let result = queue.push(sample_at(50, 0.0));
        assert!(matches!(
            result,
            Err(MonitorError::Sample(SampleError::OutOfOrder))
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn closed_queue_refuses_new_samples_but_keeps_queued_ones() {
        let queue = SampleQueue::new("s-9", 3);
        queue.push(sample_at(0, 1.0)).unwrap();
        queue.close();

        let result = queue.push(sample_at(1, 1.0));
        assert!(matches!(
            result,
            Err(MonitorError::Session(SessionError::SessionClosed(ref id))) if id == "s-9"
        ));
        assert!(queue.pop().is_some());
    }

    #[test]
    fn ingest_stamps_missing_timestamp() {
        let queue = SampleQueue::new("s-1", 3);
        let before = Utc::now();
        queue
            .ingest(RawSample {
                timestamp: None,
                pitch_deg: 0.0,
                roll_deg: 0.0,
                yaw_deg: 0.0,
                fsr_left: 0.0,
                fsr_right: 0.0,
            })
            .unwrap();
        assert!(queue.pop().unwrap().timestamp >= before);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let queue = SampleQueue::new("s-1", 0);
        assert_eq!(queue.capacity(), 1);
    }

    #[test]
    fn huge_capacity_grows_on_demand() {
        let queue = SampleQueue::new("s-1", usize::MAX);
        assert_eq!(queue.capacity(), usize::MAX);

        for i in 0..2_000 {
            assert_eq!(queue.push(sample_at(i, 0.0)).unwrap(), Enqueued::Accepted);
        }
        assert_eq!(queue.len(), 2_000);
        assert_eq!(queue.samples_dropped(), 0);
    }
}
