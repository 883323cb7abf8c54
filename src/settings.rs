use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use crate::alerts::AlertConfig;
use crate::calibration::CalibrationConfig;
use crate::models::FeedbackMode;

/// Upper bound on per-session queued samples: ten minutes at 100 Hz.
pub const MAX_QUEUE_CAPACITY: usize = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    pub feedback_mode: FeedbackMode,
    /// Auto-hide hint for notifications; `None` keeps them until dismissed.
    pub notification_display_ms: Option<u64>,
    /// Expected device sample rate.
    pub sample_rate_hz: u32,
    /// Longest burst the ingest queue should absorb, in seconds.
    pub queue_burst_secs: f64,
    pub calibration: CalibrationConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            feedback_mode: FeedbackMode::Both,
            notification_display_ms: Some(5_000),
            sample_rate_hz: 50,
            queue_burst_secs: 1.0,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl MonitorSettings {
    pub fn alert_config(&self) -> AlertConfig {
        AlertConfig {
            mode: self.feedback_mode,
            display_duration_ms: self.notification_display_ms,
        }
    }

    /// Twice the expected burst, kept within `1..=MAX_QUEUE_CAPACITY`.
    pub fn queue_capacity(&self) -> usize {
        let burst = f64::from(self.sample_rate_hz) * self.queue_burst_secs.max(0.0);
        let slots = (2.0 * burst).ceil().min(MAX_QUEUE_CAPACITY as f64);
        // NaN (zero rate times an infinite burst) casts to zero.
        (slots as usize).max(1)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<MonitorSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed settings at {}: {err}",
                    path.display()
                );
                MonitorSettings::default()
            })
        } else {
            MonitorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> MonitorSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calibration_config(&self) -> CalibrationConfig {
        self.settings().calibration
    }

    pub fn update_feedback_mode(&self, mode: FeedbackMode) -> Result<()> {
        self.update(|settings| settings.feedback_mode = mode)
    }

    pub fn update_notification_display(&self, display_ms: Option<u64>) -> Result<()> {
        self.update(|settings| settings.notification_display_ms = display_ms)
    }

    pub fn replace(&self, settings: MonitorSettings) -> Result<()> {
        self.update(|current| *current = settings)
    }

    fn update(&self, apply: impl FnOnce(&mut MonitorSettings)) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &MonitorSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.settings();

        assert_eq!(settings.feedback_mode, FeedbackMode::Both);
        assert_eq!(settings.notification_display_ms, Some(5_000));
        assert_eq!(settings.queue_capacity(), 100);
    }

    #[test]
    fn updates_persist_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store.update_feedback_mode(FeedbackMode::HapticOnly).unwrap();
        store.update_notification_display(None).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        let settings = reloaded.settings();
        assert_eq!(settings.feedback_mode, FeedbackMode::HapticOnly);
        assert_eq!(settings.notification_display_ms, None);
        assert_eq!(settings.alert_config().mode, FeedbackMode::HapticOnly);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "feedbackMode": "notificationsOnly", "sampleRateHz": 100 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.feedback_mode, FeedbackMode::NotificationsOnly);
        assert_eq!(settings.queue_capacity(), 200);
        assert_eq!(settings.calibration, CalibrationConfig::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings, MonitorSettings::default());
    }

    #[test]
    fn oversized_burst_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "sampleRateHz": 4294967295, "queueBurstSecs": 1e30 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.queue_capacity(), MAX_QUEUE_CAPACITY);

        let zero_rate = MonitorSettings {
            sample_rate_hz: 0,
            queue_burst_secs: f64::INFINITY,
            ..MonitorSettings::default()
        };
        assert_eq!(zero_rate.queue_capacity(), 1);
    }
}
