use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{read_datetime, read_optional_datetime, read_status, read_u64, to_sql_int},
    models::SessionRecord,
};
use crate::models::{FinalizedSessionStats, SessionStatus};

const SESSION_COLUMNS: &str = "id, patient_id, profile_id, status, started_at, stopped_at, sample_count, safe_sample_count, correction_count, upright_percentage, average_tilt_deg, samples_dropped, invalid_samples, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get("id")?,
        patient_id: row.get("patient_id")?,
        profile_id: row.get("profile_id")?,
        status: read_status(row, "status")?,
        started_at: read_datetime(row, "started_at")?,
        stopped_at: read_optional_datetime(row, "stopped_at")?,
        sample_count: read_u64(row, "sample_count")?,
        safe_sample_count: read_u64(row, "safe_sample_count")?,
        correction_count: read_u64(row, "correction_count")?,
        upright_percentage: row.get("upright_percentage")?,
        average_tilt_deg: row.get("average_tilt_deg")?,
        samples_dropped: read_u64(row, "samples_dropped")?,
        invalid_samples: read_u64(row, "invalid_samples")?,
        created_at: read_datetime(row, "created_at")?,
        updated_at: read_datetime(row, "updated_at")?,
    })
}

impl Database {
    pub fn record_session_start(&self, session: &SessionRecord) {
        let record = session.clone();
        self.submit("insert session", move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, patient_id, profile_id, status, started_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.patient_id,
                    record.profile_id,
                    record.status.as_str(),
                    record.started_at.to_rfc3339(),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        });
    }

    pub fn record_session_finished(&self, stats: &FinalizedSessionStats) {
        let stats = stats.clone();
        self.submit("finalize session", move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     stopped_at = ?2,
                     sample_count = ?3,
                     safe_sample_count = ?4,
                     correction_count = ?5,
                     upright_percentage = ?6,
                     average_tilt_deg = ?7,
                     samples_dropped = ?8,
                     invalid_samples = ?9,
                     updated_at = ?10
                 WHERE id = ?11",
                params![
                    SessionStatus::Completed.as_str(),
                    stats.end_time.to_rfc3339(),
                    to_sql_int(stats.sample_count)?,
                    to_sql_int(stats.safe_sample_count)?,
                    to_sql_int(stats.correction_count)?,
                    stats.upright_percentage,
                    stats.average_tilt_deg,
                    to_sql_int(stats.samples_dropped)?,
                    to_sql_int(stats.invalid_samples)?,
                    Utc::now().to_rfc3339(),
                    stats.session_id,
                ],
            )?;
            Ok(())
        });
    }

    pub async fn mark_session_interrupted(
        &self,
        session_id: &str,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     stopped_at = ?2,
                     updated_at = ?2
                 WHERE id = ?3",
                params![
                    SessionStatus::Interrupted.as_str(),
                    stopped_at.to_rfc3339(),
                    session_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_incomplete_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE status = 'Running'
                 ORDER BY started_at DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let row = stmt
                .query_row(params![session_id], |row| Ok(row_to_session(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    /// Sessions of one patient, newest first.
    pub async fn list_sessions(&self, patient_id: &str) -> Result<Vec<SessionRecord>> {
        let patient_id = patient_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE patient_id = ?1
                 ORDER BY started_at DESC"
            ))?;

            let mut rows = stmt.query(params![patient_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }
}
