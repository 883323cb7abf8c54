use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AlertEvent, AlertKind, Classification, Direction, FeedbackMode, PostureState};

use super::messages::notification_message;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub mode: FeedbackMode,
    /// Auto-hide hint attached to notifications. `None` keeps them until
    /// dismissed.
    pub display_duration_ms: Option<u64>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            mode: FeedbackMode::Both,
            display_duration_ms: Some(5_000),
        }
    }
}

/// Turns classifier transitions into feedback events.
///
/// Events fire only on transitions; a session that stays in one state
/// produces nothing further. Re-triggering is bounded by the classifier's
/// hysteresis.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    config: AlertConfig,
    haptic_active: bool,
    notification_visible: bool,
    last_level: PostureState,
    last_tilt_deg: f64,
    last_direction: Direction,
}

impl AlertDispatcher {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            haptic_active: false,
            notification_visible: false,
            last_level: PostureState::Safe,
            last_tilt_deg: 0.0,
            last_direction: Direction::Center,
        }
    }

    pub fn config(&self) -> AlertConfig {
        self.config
    }

    pub fn haptic_active(&self) -> bool {
        self.haptic_active
    }

    pub fn notification_visible(&self) -> bool {
        self.notification_visible
    }

    pub fn dispatch(&mut self, classification: &Classification) -> Vec<AlertEvent> {
        self.last_level = classification.state;
        self.last_tilt_deg = classification.tilt_angle_deg;
        self.last_direction = classification.direction;

        if !classification.changed() {
            return Vec::new();
        }

        // Any transition re-arms notification delivery.
        self.notification_visible = false;

        let mut events = Vec::new();

        if classification.previous == PostureState::Unsafe && self.haptic_active {
            self.haptic_active = false;
            events.push(self.event(AlertKind::HapticStop, classification));
        }

        if classification.escalated() {
            if self.config.mode.notifications() {
                self.notification_visible = true;
                events.push(self.event(AlertKind::Notify, classification));
            }

            if classification.state == PostureState::Unsafe && self.config.mode.haptics() {
                self.haptic_active = true;
                events.push(self.event(AlertKind::HapticStart, classification));
            }
        }

        events
    }

    /// Hides the current notification until the next state transition.
    /// Returns whether a notification was showing.
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.notification_visible, false)
    }

    /// Releases the actuator when a session ends mid-excursion.
    pub fn shutdown(&mut self, timestamp: DateTime<Utc>) -> Option<AlertEvent> {
        self.notification_visible = false;
        if !self.haptic_active {
            return None;
        }
        self.haptic_active = false;

        Some(AlertEvent {
            kind: AlertKind::HapticStop,
            level: self.last_level,
            tilt_angle_deg: self.last_tilt_deg,
            direction: self.last_direction,
            timestamp,
            message: None,
            display_duration_ms: None,
        })
    }

    fn event(&self, kind: AlertKind, classification: &Classification) -> AlertEvent {
        let (message, display_duration_ms) = match kind {
            AlertKind::Notify => (
                Some(notification_message(
                    classification.state,
                    classification.tilt_angle_deg,
                    classification.direction,
                )),
                self.config.display_duration_ms,
            ),
            AlertKind::HapticStart | AlertKind::HapticStop => (None, None),
        };

        AlertEvent {
            kind,
            level: classification.state,
            tilt_angle_deg: classification.tilt_angle_deg,
            direction: classification.direction,
            timestamp: classification.timestamp,
            message,
            display_duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilt::direction_for;

    fn transition(previous: PostureState, state: PostureState, tilt: f64) -> Classification {
        Classification {
            state,
            previous,
            direction: direction_for(tilt),
            tilt_angle_deg: tilt,
            timestamp: Utc::now(),
        }
    }

    fn kinds(events: &[AlertEvent]) -> Vec<AlertKind> {
        events.iter().map(|event| event.kind).collect()
    }

    fn dispatcher(mode: FeedbackMode) -> AlertDispatcher {
        AlertDispatcher::new(AlertConfig {
            mode,
            display_duration_ms: Some(5_000),
        })
    }

    #[test]
    fn entering_warning_notifies_once() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        let events = dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Warning, 9.0));

        assert_eq!(kinds(&events), vec![AlertKind::Notify]);
        assert_eq!(events[0].level, PostureState::Warning);
        assert_eq!(events[0].display_duration_ms, Some(5_000));
        assert!(events[0].message.as_deref().unwrap().starts_with("Posture warning"));

        let repeat = dispatcher.dispatch(&transition(PostureState::Warning, PostureState::Warning, 9.5));
        assert!(repeat.is_empty());
    }

    #[test]
    fn entering_unsafe_notifies_and_starts_haptics() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        let events = dispatcher.dispatch(&transition(PostureState::Warning, PostureState::Unsafe, -16.0));

        assert_eq!(kinds(&events), vec![AlertKind::Notify, AlertKind::HapticStart]);
        assert_eq!(events[1].direction, Direction::Left);
        assert_eq!(events[1].message, None);
        assert!(dispatcher.haptic_active());
    }

    #[test]
    fn leaving_unsafe_stops_haptics_without_notifying() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Unsafe, 16.0));
        let events = dispatcher.dispatch(&transition(PostureState::Unsafe, PostureState::Warning, 12.0));

        assert_eq!(kinds(&events), vec![AlertKind::HapticStop]);
        assert!(!dispatcher.haptic_active());

        let safe = dispatcher.dispatch(&transition(PostureState::Warning, PostureState::Safe, 3.0));
        assert!(safe.is_empty());
    }

    #[test]
    fn feedback_mode_filters_channels() {
        let unsafe_entry = transition(PostureState::Safe, PostureState::Unsafe, 20.0);

        let mut none = dispatcher(FeedbackMode::None);
        assert!(none.dispatch(&unsafe_entry).is_empty());

        let mut notifications = dispatcher(FeedbackMode::NotificationsOnly);
        assert_eq!(kinds(&notifications.dispatch(&unsafe_entry)), vec![AlertKind::Notify]);

        let mut haptics = dispatcher(FeedbackMode::HapticOnly);
        assert_eq!(kinds(&haptics.dispatch(&unsafe_entry)), vec![AlertKind::HapticStart]);
        let stop = haptics.dispatch(&transition(PostureState::Unsafe, PostureState::Warning, 10.0));
        assert_eq!(kinds(&stop), vec![AlertKind::HapticStop]);
    }

    #[test]
    fn no_haptic_stop_when_haptics_never_started() {
        let mut dispatcher = dispatcher(FeedbackMode::NotificationsOnly);
        dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Unsafe, 20.0));
        let events = dispatcher.dispatch(&transition(PostureState::Unsafe, PostureState::Warning, 10.0));
        assert!(events.is_empty());
    }

    #[test]
    fn dismissal_hides_notification_until_next_transition() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Warning, 9.0));
        assert!(dispatcher.notification_visible());

        assert!(dispatcher.dismiss());
        assert!(!dispatcher.notification_visible());
        assert!(!dispatcher.dismiss());

        // Staying in Warning does not bring it back.
        dispatcher.dispatch(&transition(PostureState::Warning, PostureState::Warning, 9.5));
        assert!(!dispatcher.notification_visible());

        // Escalation re-arms.
        let events = dispatcher.dispatch(&transition(PostureState::Warning, PostureState::Unsafe, 16.0));
        assert_eq!(events[0].kind, AlertKind::Notify);
        assert!(dispatcher.notification_visible());
    }

    #[test]
    fn dismissal_does_not_stop_haptics() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Unsafe, 16.0));
        dispatcher.dismiss();
        assert!(dispatcher.haptic_active());
    }

    #[test]
    fn shutdown_releases_active_haptics() {
        let mut dispatcher = dispatcher(FeedbackMode::Both);
        dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Unsafe, 17.0));

        let stop = dispatcher.shutdown(Utc::now()).unwrap();
        assert_eq!(stop.kind, AlertKind::HapticStop);
        assert_eq!(stop.level, PostureState::Unsafe);
        assert_eq!(stop.tilt_angle_deg, 17.0);
        assert!(dispatcher.shutdown(Utc::now()).is_none());
    }

    #[test]
    fn notification_without_auto_hide() {
        let mut dispatcher = AlertDispatcher::new(AlertConfig {
            mode: FeedbackMode::NotificationsOnly,
            display_duration_ms: None,
        });
        let events = dispatcher.dispatch(&transition(PostureState::Safe, PostureState::Warning, 8.5));
        assert_eq!(events[0].display_duration_ms, None);
    }
}
