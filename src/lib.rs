pub mod alerts;
pub mod calibration;
pub mod classifier;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod tilt;
mod utils;

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

pub use db::Database;
pub use error::{CalibrationError, MonitorError, SampleError, SessionError, UnstableReason};
pub use monitor::{MonitorController, SessionHandle};
pub use settings::{MonitorSettings, SettingsStore};

use models::{AssessmentAnswers, FinalizedSessionStats, RawSample};

const CLI_PATIENT_ID: &str = "cli";

/// Directory holding the database and settings file.
pub fn data_dir() -> PathBuf {
    env::var_os("VERTEX_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vertex-data"))
}

/// `vertex <assessment.json> [samples.jsonl]`
///
/// Calibrates from the assessment, replays JSON-lines samples (stdin when no
/// file is given) through one session, and prints every alert followed by the
/// final statistics, one JSON document per line.
pub fn run() -> Result<FinalizedSessionStats> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = env::args_os().skip(1);
    let Some(assessment_path) = args.next().map(PathBuf::from) else {
        bail!("usage: vertex <assessment.json> [samples.jsonl]");
    };
    let samples_path = args.next().map(PathBuf::from);

    info!("Vertex starting up...");

    // One thread: yielding after each sample lets the session worker keep
    // pace with the file reader, so replays are not thinned by backpressure.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let stats = runtime.block_on(replay(&data_dir(), &assessment_path, samples_path.as_deref()))?;
    Ok(stats)
}

async fn replay(
    data_dir: &Path,
    assessment_path: &Path,
    samples_path: Option<&Path>,
) -> Result<FinalizedSessionStats> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let database = Database::new(data_dir.join("vertex.sqlite3"))?;
    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
    let monitor = MonitorController::open(database, settings).await?;

    let assessment = tokio::fs::read_to_string(assessment_path)
        .await
        .with_context(|| format!("failed to read {}", assessment_path.display()))?;
    let answers: AssessmentAnswers =
        serde_json::from_str(&assessment).context("failed to parse assessment answers")?;
    monitor.calibrate(CLI_PATIENT_ID, &answers).await?;

    let handle = monitor.start_session(CLI_PATIENT_ID).await?;
    let mut alerts = handle.subscribe_alerts();
    let printer = tokio::spawn(async move {
        loop {
            match alerts.recv().await {
                Ok(alert) => match serde_json::to_string(&alert) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("failed to encode alert: {err}"),
                },
                Err(RecvError::Lagged(missed)) => warn!("alert printer skipped {missed} alerts"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match samples_path {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawSample>(&line) {
            Ok(raw) => {
                if let Err(err) = monitor.ingest(&handle, raw) {
                    warn!("line {line_no}: {err}");
                }
            }
            Err(err) => warn!("line {line_no}: not a sample: {err}"),
        }
        tokio::task::yield_now().await;
    }

    let stats = monitor.stop_session(&handle).await?;
    // Last sender gone: the printer drains what is left and exits.
    drop(handle);
    if let Err(err) = printer.await {
        warn!("alert printer failed: {err}");
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn replay_reports_session_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let assessment_path = dir.path().join("assessment.json");
        std::fs::write(
            &assessment_path,
            r#"{"strokeSide":"left","severityLevel":3,"mobilityLevel":"cane","strokeTimeline":"moderate","therapyStatus":"active"}"#,
        )
        .unwrap();

        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let rolls = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 16.0, 17.0, 16.0];
        let mut lines: Vec<String> = rolls
            .iter()
            .enumerate()
            .map(|(i, roll)| {
                serde_json::json!({
                    "timestamp": start + Duration::milliseconds(20 * i as i64),
                    "pitchDeg": 0.0,
                    "rollDeg": roll,
                    "yawDeg": 0.0,
                    "fsrLeft": 300.0,
                    "fsrRight": 300.0,
                })
                .to_string()
            })
            .collect();
        lines.insert(3, String::new());
        lines.insert(5, "not a sample".to_string());
        let samples_path = dir.path().join("samples.jsonl");
        std::fs::write(&samples_path, lines.join("\n")).unwrap();

        let data_dir = dir.path().join("data");
        let stats = replay(&data_dir, &assessment_path, Some(&samples_path))
            .await
            .unwrap();

        assert_eq!(stats.sample_count, 10);
        assert_eq!(stats.correction_count, 1);
        assert!((stats.upright_percentage - 70.0).abs() < 1e-9);
        assert_eq!(stats.samples_dropped, 0);
        assert!(data_dir.join("vertex.sqlite3").exists());
    }

    #[tokio::test]
    async fn replay_fails_on_unreadable_assessment() {
        let dir = tempfile::tempdir().unwrap();
        let assessment_path = dir.path().join("assessment.json");
        std::fs::write(&assessment_path, r#"{"severityLevel":9}"#).unwrap();

        let result = replay(&dir.path().join("data"), &assessment_path, None).await;
        assert!(result.is_err());
    }
}
