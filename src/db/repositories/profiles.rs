use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{read_datetime, read_u32},
    models::ProfileRecord,
};

fn row_to_profile(row: &Row) -> Result<ProfileRecord> {
    let profile_json: String = row.get("profile_json")?;

    Ok(ProfileRecord {
        id: row.get("id")?,
        patient_id: row.get("patient_id")?,
        version: read_u32(row, "version")?,
        created_at: read_datetime(row, "created_at")?,
        profile: serde_json::from_str(&profile_json).context("failed to decode profile_json")?,
    })
}

impl Database {
    pub fn record_profile(&self, record: &ProfileRecord) {
        let record = record.clone();
        self.submit("store calibration profile", move |conn| {
            let profile_json = serde_json::to_string(&record.profile)?;
            conn.execute(
                "INSERT INTO calibration_profiles (id, patient_id, version, warning_threshold_deg, danger_threshold_deg, baseline_pitch, baseline_roll, stroke_timeline_months, profile_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.patient_id,
                    record.version,
                    record.profile.warning_threshold_deg,
                    record.profile.danger_threshold_deg,
                    record.profile.baseline_pitch,
                    record.profile.baseline_roll,
                    record.profile.stroke_timeline.months(),
                    profile_json,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        });
    }

    /// Newest profile of every patient, keyed by patient id.
    pub async fn latest_profiles(&self) -> Result<HashMap<String, ProfileRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.patient_id, p.version, p.profile_json, p.created_at
                 FROM calibration_profiles p
                 WHERE p.version = (
                     SELECT MAX(version) FROM calibration_profiles
                     WHERE patient_id = p.patient_id
                 )",
            )?;

            let mut rows = stmt.query([])?;
            let mut profiles = HashMap::new();
            while let Some(row) = rows.next()? {
                let record = row_to_profile(row)?;
                profiles.insert(record.patient_id.clone(), record);
            }
            Ok(profiles)
        })
        .await
    }

    /// Every stored version for one patient, oldest first.
    pub async fn get_profile_history(&self, patient_id: &str) -> Result<Vec<ProfileRecord>> {
        let patient_id = patient_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, patient_id, version, profile_json, created_at
                 FROM calibration_profiles
                 WHERE patient_id = ?1
                 ORDER BY version ASC",
            )?;

            let mut rows = stmt.query(params![patient_id])?;
            let mut history = Vec::new();
            while let Some(row) = rows.next()? {
                history.push(row_to_profile(row)?);
            }
            Ok(history)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{build, CalibrationConfig};
    use crate::models::{
        AssessmentAnswers, MobilityAid, SeverityLevel, StrokeSide, StrokeTimeline, TherapyStatus,
    };

    fn answers(severity: u8) -> AssessmentAnswers {
        AssessmentAnswers {
            stroke_side: StrokeSide::Right,
            severity_level: SeverityLevel::new(severity).unwrap(),
            mobility_level: MobilityAid::Walker,
            stroke_timeline: StrokeTimeline::Recent,
            therapy_status: TherapyStatus::Active,
        }
    }

    #[tokio::test]
    async fn history_keeps_every_version_and_latest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("vertex.db")).unwrap();
        let config = CalibrationConfig::default();

        let first = ProfileRecord::new("p-1", 1, build(&answers(3), &config).unwrap());
        let second = ProfileRecord::new("p-1", 2, build(&answers(5), &config).unwrap());
        let other = ProfileRecord::new("p-2", 1, build(&answers(1), &config).unwrap());
        db.record_profile(&first);
        db.record_profile(&second);
        db.record_profile(&other);

        let history = db.get_profile_history("p-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], first);
        assert_eq!(history[1], second);

        let latest = db.latest_profiles().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["p-1"].version, 2);
        assert_eq!(latest["p-1"].profile, second.profile);
        assert_eq!(latest["p-2"].id, other.id);
    }

    #[tokio::test]
    async fn duplicate_version_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("vertex.db")).unwrap();
        let profile = build(&answers(2), &CalibrationConfig::default()).unwrap();

        db.record_profile(&ProfileRecord::new("p-1", 1, profile));
        db.record_profile(&ProfileRecord::new("p-1", 1, profile));

        assert_eq!(db.get_profile_history("p-1").await.unwrap().len(), 1);
    }
}
