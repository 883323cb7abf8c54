use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Command {
    Run(Job),
    Close,
}

/// Owns the store thread; closing it flushes every queued job first.
struct StoreThread {
    commands: mpsc::Sender<Command>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreThread {
    fn drop(&mut self) {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };

        if self.commands.send(Command::Close).is_err() {
            error!("Store thread exited before close was requested");
        }
        if let Err(panic) = handle.join() {
            error!("Store thread panicked: {panic:?}");
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("failed to enable WAL mode")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(mut conn: Connection, commands: mpsc::Receiver<Command>) {
    for command in commands {
        match command {
            Command::Run(job) => job(&mut conn),
            Command::Close => break,
        }
    }
    debug!("Store thread drained its queue");
}

/// Handle to the local store. Every statement runs on one dedicated thread,
/// in the order it was queued.
#[derive(Clone)]
pub struct Database {
    store: Arc<StoreThread>,
    path: Arc<PathBuf>,
}

impl Database {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("vertex-store".into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, command_rx);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn store thread")?;

        ready_rx
            .recv()
            .context("store thread exited during start-up")??;

        info!("Database ready at {}", path.display());

        Ok(Self {
            store: Arc::new(StoreThread {
                commands: command_tx,
                thread: Mutex::new(Some(thread)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `task` on the store thread and waits for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(Box::new(move |conn| {
            // The caller may have given up waiting; nothing to report then.
            let _ = reply_tx.send(task(conn));
        }))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("store thread stopped before replying"))?
    }

    /// Queues a write without waiting for it. Failures are logged under
    /// `label`. A later `execute` observes every earlier `submit`.
    pub fn submit<F>(&self, label: &'static str, task: F)
    where
        F: FnOnce(&mut Connection) -> Result<()> + Send + 'static,
    {
        let queued = self.enqueue(Box::new(move |conn| {
            if let Err(err) = task(conn) {
                error!("Failed to {label}: {err:#}");
            }
        }));

        if let Err(err) = queued {
            error!("Failed to {label}: {err:#}");
        }
    }

    fn enqueue(&self, job: Job) -> Result<()> {
        self.store
            .commands
            .send(Command::Run(job))
            .map_err(|_| anyhow!("store thread is no longer running"))
    }
}
