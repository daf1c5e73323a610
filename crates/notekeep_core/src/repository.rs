//! Asynchronous notes repository.
//!
//! # Responsibility
//! - Expose the notes/folders surface as non-blocking operations.
//! - Route every operation through one [`SerialLane`].
//! - Deliver each outcome to the configured [`Dispatcher`].
//!
//! # Invariants
//! - Every call returns immediately and its callback fires exactly once.
//! - Callbacks never run on the lane thread.
//! - Operations submitted O1 then O2 (through any clone) execute O1 fully
//!   before O2 starts, so a read observes every earlier write.
//! - Missing rows on update/delete/toggle are successful no-ops.

use crate::config::NotesConfig;
use crate::db::{open_db_in_memory, open_db_with};
use crate::dispatch::Dispatcher;
use crate::lane::{LaneContext, LaneJob, SerialLane};
use crate::model::folder::{Folder, FolderId};
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::query::filter::{build_note_filter, NoteScope};
use crate::repo::store::{NoteFlag, NoteStore};
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, trace, warn};
use rusqlite::Connection;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Cloneable handle to the notes store. All clones share one lane.
#[derive(Clone)]
pub struct NotesRepository {
    lane: SerialLane,
    dispatcher: Arc<dyn Dispatcher>,
}

impl NotesRepository {
    /// Opens the database named by `config` and starts the lane.
    pub fn open(config: &NotesConfig, dispatcher: Arc<dyn Dispatcher>) -> RepoResult<Self> {
        let conn = open_db_with(&config.db_path, config.db_options())?;
        Self::from_connection(conn, dispatcher)
    }

    /// Starts a repository over a private in-memory database.
    pub fn in_memory(dispatcher: Arc<dyn Dispatcher>) -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?, dispatcher)
    }

    /// Starts a repository over an already-bootstrapped connection.
    ///
    /// The connection moves onto the lane; nothing else may use it afterwards.
    pub fn from_connection(
        conn: Connection,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> RepoResult<Self> {
        Ok(Self {
            lane: SerialLane::spawn(conn)?,
            dispatcher,
        })
    }

    /// Lists every note, optionally text-filtered.
    pub fn list_notes<C>(&self, query: Option<&str>, callback: C)
    where
        C: FnOnce(RepoResult<Vec<Note>>) + Send + 'static,
    {
        self.list_scoped("list_notes", NoteScope::All, query, callback);
    }

    /// Lists favorite notes, optionally text-filtered.
    pub fn list_favorite_notes<C>(&self, query: Option<&str>, callback: C)
    where
        C: FnOnce(RepoResult<Vec<Note>>) + Send + 'static,
    {
        self.list_scoped("list_favorite_notes", NoteScope::Favorites, query, callback);
    }

    /// Lists notes filed under `folder_id`, optionally text-filtered.
    pub fn list_notes_in_folder<C>(
        &self,
        folder_id: FolderId,
        query: Option<&str>,
        callback: C,
    ) where
        C: FnOnce(RepoResult<Vec<Note>>) + Send + 'static,
    {
        self.list_scoped(
            "list_notes_in_folder",
            NoteScope::Folder(folder_id),
            query,
            callback,
        );
    }

    /// Lists folders by name.
    pub fn list_folders<C>(&self, callback: C)
    where
        C: FnOnce(RepoResult<Vec<Folder>>) + Send + 'static,
    {
        self.submit("list_folders", |ctx| ctx.store().list_folders(), callback);
    }

    /// Loads one note. Unknown ids yield `None`.
    pub fn get_note<C>(&self, id: NoteId, callback: C)
    where
        C: FnOnce(RepoResult<Option<Note>>) + Send + 'static,
    {
        self.submit("get_note", move |ctx| ctx.store().get_note(id), callback);
    }

    /// Inserts a note stamped with the current time and yields its id.
    pub fn create_note<C>(&self, draft: NoteDraft, callback: C)
    where
        C: FnOnce(RepoResult<NoteId>) + Send + 'static,
    {
        self.submit(
            "create_note",
            move |ctx| {
                let now_ms = ctx.now_ms();
                ctx.store().insert_note(&draft, now_ms)
            },
            callback,
        );
    }

    /// Overwrites every mutable field of note `id` and refreshes its timestamp.
    pub fn update_note<C>(&self, id: NoteId, draft: NoteDraft, callback: C)
    where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.submit(
            "update_note",
            move |ctx| {
                let now_ms = ctx.now_ms();
                let changed = ctx.store().update_note(id, &draft, now_ms)?;
                log_missing_row("update_note", changed);
                Ok(())
            },
            callback,
        );
    }

    /// Deletes note `id`. Deleting an unknown id succeeds.
    pub fn delete_note<C>(&self, id: NoteId, callback: C)
    where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.submit(
            "delete_note",
            move |ctx| {
                let changed = ctx.store().delete_note(id)?;
                log_missing_row("delete_note", changed);
                Ok(())
            },
            callback,
        );
    }

    /// Sets the favorite flag and refreshes the timestamp.
    pub fn set_favorite<C>(&self, id: NoteId, value: bool, callback: C)
    where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.set_flag("set_favorite", id, NoteFlag::Favorite, value, callback);
    }

    /// Sets the pinned flag and refreshes the timestamp.
    pub fn set_pinned<C>(&self, id: NoteId, value: bool, callback: C)
    where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.set_flag("set_pinned", id, NoteFlag::Pinned, value, callback);
    }

    /// Creates a folder under the trimmed `name` and yields its id.
    ///
    /// # Errors
    /// - [`RepoError::DuplicateFolderName`] when the name is taken.
    /// - [`RepoError::InvalidInput`] when the name is blank.
    pub fn create_folder<C>(&self, name: &str, callback: C)
    where
        C: FnOnce(RepoResult<FolderId>) + Send + 'static,
    {
        let name = name.to_string();
        self.submit(
            "create_folder",
            move |ctx| ctx.store().insert_folder(&name),
            callback,
        );
    }

    /// Unfiles every note in folder `id`, then deletes the folder.
    ///
    /// Both steps run inside one lane job and one transaction, so no other
    /// operation can observe notes pointing at a removed folder.
    pub fn delete_folder<C>(&self, id: FolderId, callback: C)
    where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.submit(
            "delete_folder",
            move |ctx| {
                let outcome = ctx.store().delete_folder(id)?;
                debug!(
                    "event=folder_delete module=repo notes_unfiled={} folder_removed={}",
                    outcome.notes_unfiled, outcome.folder_removed
                );
                Ok(())
            },
            callback,
        );
    }

    fn list_scoped<C>(
        &self,
        op: &'static str,
        scope: NoteScope,
        query: Option<&str>,
        callback: C,
    ) where
        C: FnOnce(RepoResult<Vec<Note>>) + Send + 'static,
    {
        let query = query.map(str::to_string);
        self.submit(
            op,
            move |ctx| {
                let filter = build_note_filter(scope, query.as_deref());
                ctx.store().list_notes(filter.as_ref())
            },
            callback,
        );
    }

    fn set_flag<C>(
        &self,
        op: &'static str,
        id: NoteId,
        flag: NoteFlag,
        value: bool,
        callback: C,
    ) where
        C: FnOnce(RepoResult<()>) + Send + 'static,
    {
        self.submit(
            op,
            move |ctx| {
                let now_ms = ctx.now_ms();
                let changed = ctx.store().set_flag(id, flag, value, now_ms)?;
                log_missing_row(op, changed);
                Ok(())
            },
            callback,
        );
    }

    fn submit<T, W, C>(&self, op: &'static str, work: W, callback: C)
    where
        T: Send + 'static,
        W: FnOnce(&mut LaneContext) -> RepoResult<T> + Send + 'static,
        C: FnOnce(RepoResult<T>) + Send + 'static,
    {
        let job = Box::new(Operation {
            op,
            submitted_at: Instant::now(),
            work,
            callback,
            dispatcher: Arc::clone(&self.dispatcher),
            _result: PhantomData,
        });
        match self.lane.submit(job) {
            Ok(()) => trace!(
                "event=repo_submit module=repo op={op} queued={}",
                self.lane.queued()
            ),
            Err(job) => job.abandon(),
        }
    }
}

/// One queued repository call: lane-side work plus main-side callback.
struct Operation<T, W, C> {
    op: &'static str,
    submitted_at: Instant,
    work: W,
    callback: C,
    dispatcher: Arc<dyn Dispatcher>,
    _result: PhantomData<fn() -> T>,
}

impl<T, W, C> LaneJob for Operation<T, W, C>
where
    T: Send + 'static,
    W: FnOnce(&mut LaneContext) -> RepoResult<T> + Send + 'static,
    C: FnOnce(RepoResult<T>) + Send + 'static,
{
    fn run(self: Box<Self>, ctx: &mut LaneContext) {
        let Operation {
            op,
            submitted_at,
            work,
            callback,
            dispatcher,
            ..
        } = *self;
        let started_at = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| work(ctx)))
            .unwrap_or_else(|_| Err(RepoError::LanePanicked));
        log_outcome(op, &result, submitted_at, started_at);
        dispatcher.dispatch(Box::new(move || callback(result)));
    }

    fn abandon(self: Box<Self>) {
        let Operation {
            op,
            callback,
            dispatcher,
            ..
        } = *self;
        warn!("event=repo_op module=repo op={op} status=error error_code=lane_closed");
        dispatcher.dispatch(Box::new(move || callback(Err(RepoError::LaneClosed))));
    }
}

fn log_outcome<T>(op: &str, result: &RepoResult<T>, submitted_at: Instant, started_at: Instant) {
    let queued_ms = started_at.duration_since(submitted_at).as_millis();
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!(
            "event=repo_op module=repo op={op} status=ok queued_ms={queued_ms} duration_ms={duration_ms}"
        ),
        Err(err @ (RepoError::DuplicateFolderName { .. } | RepoError::InvalidInput(_))) => warn!(
            "event=repo_op module=repo op={op} status=rejected duration_ms={duration_ms} error={err}"
        ),
        Err(err) => error!(
            "event=repo_op module=repo op={op} status=error duration_ms={duration_ms} schema_drift={} error={err}",
            err.is_schema_drift()
        ),
    }
}

fn log_missing_row(op: &str, changed: usize) {
    if changed == 0 {
        debug!("event=repo_op module=repo op={op} status=noop reason=row_not_found");
    }
}
