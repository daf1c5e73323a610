//! Single-worker execution lane owning the SQLite connection.
//!
//! # Responsibility
//! - Run submitted jobs one at a time, strictly in submission order.
//! - Keep the connection confined to the lane thread.
//! - Stamp mutations with a clock that never runs backwards.
//!
//! # Invariants
//! - At most one job touches the connection at any instant.
//! - Job `N` has fully finished (including commit) before job `N + 1` starts.
//! - A job that cannot be queued is handed back to the caller, never dropped.
//! - A panicking job does not stop the lane.

use crate::db::DbError;
use crate::repo::store::SqliteNoteStore;
use crate::repo::RepoResult;
use crossbeam::channel::{self, Receiver, Sender};
use log::{error, info};
use rusqlite::Connection;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

const LANE_THREAD_NAME: &str = "notekeep-lane";

/// Work item executed on the lane.
pub trait LaneJob: Send + 'static {
    /// Runs the job against the lane's store.
    fn run(self: Box<Self>, ctx: &mut LaneContext);

    /// Called instead of [`LaneJob::run`] when the job could not be queued.
    fn abandon(self: Box<Self>);
}

/// State owned by the lane thread and lent to each job.
pub struct LaneContext {
    conn: Connection,
    clock: LaneClock,
}

impl LaneContext {
    /// Store view over the lane connection.
    pub fn store(&self) -> SqliteNoteStore<'_> {
        SqliteNoteStore::new_unchecked(&self.conn)
    }

    /// Timestamp for the current mutation, in epoch milliseconds.
    pub fn now_ms(&mut self) -> i64 {
        self.clock.tick()
    }
}

/// Wall clock clamped to be non-decreasing across ticks.
#[derive(Debug, Default)]
struct LaneClock {
    last_ms: i64,
}

impl LaneClock {
    fn tick(&mut self) -> i64 {
        self.last_ms = self.last_ms.max(wall_clock_ms());
        self.last_ms
    }
}

/// Handle to a running lane. Clones feed the same worker.
#[derive(Clone)]
pub struct SerialLane {
    sender: Sender<Box<dyn LaneJob>>,
}

impl SerialLane {
    /// Verifies `conn` against the store contract and starts the worker.
    ///
    /// The worker exits once every handle is dropped and the queue is empty.
    pub fn spawn(conn: Connection) -> RepoResult<Self> {
        SqliteNoteStore::try_new(&conn)?;

        let (sender, receiver) = channel::unbounded::<Box<dyn LaneJob>>();
        let ctx = LaneContext {
            conn,
            clock: LaneClock::default(),
        };
        thread::Builder::new()
            .name(LANE_THREAD_NAME.to_string())
            .spawn(move || lane_loop(ctx, receiver))
            .map_err(DbError::Io)?;

        info!("event=lane_start module=lane status=ok thread={LANE_THREAD_NAME}");
        Ok(Self { sender })
    }

    /// Queues `job` behind everything submitted before it.
    ///
    /// Returns the job when the worker is gone.
    pub fn submit(&self, job: Box<dyn LaneJob>) -> Result<(), Box<dyn LaneJob>> {
        self.sender.send(job).map_err(|err| err.into_inner())
    }

    /// Number of jobs waiting behind the one currently running.
    pub fn queued(&self) -> usize {
        self.sender.len()
    }

    /// A lane whose worker has already exited.
    #[cfg(test)]
    pub(crate) fn closed() -> Self {
        let (sender, _) = channel::unbounded();
        Self { sender }
    }
}

fn lane_loop(mut ctx: LaneContext, receiver: Receiver<Box<dyn LaneJob>>) {
    let mut processed: u64 = 0;
    while let Ok(job) = receiver.recv() {
        if catch_unwind(AssertUnwindSafe(|| job.run(&mut ctx))).is_err() {
            error!("event=lane_job module=lane status=error error_code=job_panicked");
        }
        processed += 1;
    }
    info!("event=lane_stop module=lane status=ok processed={processed}");
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
