//! Debounced autosave scheduling.
//!
//! # Responsibility
//! - Hold at most one pending commit per note.
//! - Release commits once their quiescence window has elapsed.
//!
//! # Invariants
//! - Scheduling a commit cancels any pending commit for the same note.
//! - The scheduler owns no timer or thread; callers pass `now` explicitly
//!   and poll with [`AutosaveScheduler::flush_due`].
//! - A released commit is removed before it runs. A commit that fails on
//!   store contention goes back in the queue unless a newer edit for the same
//!   note was scheduled meanwhile; any other failure is final.

use crate::model::block::Block;
use crate::model::note::{NoteId, NoteRecord};
use crate::repo::note_repo::NoteRepository;
use crate::service::note_service::{NoteService, NoteServiceError};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Default quiescence window after the last edit.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCommit {
    due_at: Instant,
    blocks: Vec<Block>,
}

/// Commit released by [`AutosaveScheduler::take_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCommit {
    pub note_id: NoteId,
    pub blocks: Vec<Block>,
}

/// Result of running one released commit.
#[derive(Debug)]
pub struct AutosaveOutcome {
    pub note_id: NoteId,
    pub result: Result<NoteRecord, NoteServiceError>,
    /// Failed commit was queued again for another attempt.
    pub requeued: bool,
}

/// Per-note debounced commit queue.
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    delay: Duration,
    pending: BTreeMap<NoteId, PendingCommit>,
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a commit of `blocks` at `now + delay`.
    ///
    /// Returns `true` when a pending commit for the note was canceled.
    pub fn schedule(&mut self, note_id: NoteId, blocks: Vec<Block>, now: Instant) -> bool {
        let due_at = now + self.delay;
        let replaced = self
            .pending
            .insert(note_id, PendingCommit { due_at, blocks })
            .is_some();
        debug!(
            "event=autosave_schedule module=autosave status=ok note_id={} replaced={} delay_ms={}",
            note_id,
            replaced,
            self.delay.as_millis()
        );
        replaced
    }

    /// Cancels the pending commit of one note; `true` if one existed.
    pub fn cancel(&mut self, note_id: NoteId) -> bool {
        let canceled = self.pending.remove(&note_id).is_some();
        if canceled {
            debug!("event=autosave_cancel module=autosave status=ok note_id={note_id}");
        }
        canceled
    }

    pub fn is_pending(&self, note_id: NoteId) -> bool {
        self.pending.contains_key(&note_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest due instant among pending commits.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|commit| commit.due_at).min()
    }

    /// `true` when at least one commit is due at `now`.
    pub fn has_due(&self, now: Instant) -> bool {
        self.next_due().is_some_and(|due_at| due_at <= now)
    }

    /// Puts a released commit back, due one delay after `now`.
    ///
    /// Returns `false` and drops `commit` when the note already has a
    /// pending (newer) commit.
    pub fn requeue(&mut self, commit: DueCommit, now: Instant) -> bool {
        if self.pending.contains_key(&commit.note_id) {
            debug!(
                "event=autosave_requeue module=autosave status=skipped note_id={} reason=newer_pending",
                commit.note_id
            );
            return false;
        }
        let due_at = now + self.delay;
        debug!(
            "event=autosave_requeue module=autosave status=ok note_id={} delay_ms={}",
            commit.note_id,
            self.delay.as_millis()
        );
        self.pending.insert(
            commit.note_id,
            PendingCommit {
                due_at,
                blocks: commit.blocks,
            },
        );
        true
    }

    /// Removes and returns every commit due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<DueCommit> {
        let mut due = self
            .pending
            .iter()
            .filter(|(_, commit)| commit.due_at <= now)
            .map(|(note_id, commit)| (commit.due_at, *note_id))
            .collect::<Vec<_>>();
        due.sort();

        due.into_iter()
            .filter_map(|(_, note_id)| {
                self.pending
                    .remove(&note_id)
                    .map(|commit| DueCommit {
                        note_id,
                        blocks: commit.blocks,
                    })
            })
            .collect()
    }

    /// Runs every due commit through the save pipeline.
    ///
    /// Commits failing on store contention are requeued at `now + delay`.
    pub fn flush_due<R: NoteRepository>(
        &mut self,
        now: Instant,
        service: &NoteService<R>,
    ) -> Vec<AutosaveOutcome> {
        let due = self.take_due(now);
        let mut outcomes = Vec::with_capacity(due.len());
        for commit in due {
            let note_id = commit.note_id;
            let result = service.save_blocks(note_id, &commit.blocks);
            let requeued = match &result {
                Ok(_) => false,
                Err(err) => {
                    warn!(
                        "event=autosave_commit module=autosave status=error note_id={} busy={} error={}",
                        note_id,
                        err.is_busy(),
                        err
                    );
                    err.is_busy() && self.requeue(commit, now)
                }
            };
            outcomes.push(AutosaveOutcome {
                note_id,
                result,
                requeued,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::{AutosaveScheduler, DueCommit};
    use crate::db::DbError;
    use crate::model::block::Block;
    use crate::model::note::{NoteDraft, NoteId, NoteRecord};
    use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError, RepoResult};
    use crate::service::note_service::NoteService;
    use std::cell::{Cell, RefCell};
    use std::time::{Duration, Instant};
    use uuid::Uuid;

    /// In-memory repository whose next `busy_updates` saves fail as busy.
    #[derive(Default)]
    struct ContendedRepo {
        busy_updates: Cell<usize>,
        saved: RefCell<Vec<(NoteId, String)>>,
    }

    impl NoteRepository for ContendedRepo {
        fn create_note(&self, _draft: &NoteDraft) -> RepoResult<NoteId> {
            Ok(Uuid::new_v4())
        }

        fn update_note(&self, note_id: NoteId, draft: &NoteDraft) -> RepoResult<()> {
            if self.busy_updates.get() > 0 {
                self.busy_updates.set(self.busy_updates.get() - 1);
                let busy = rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                    None,
                );
                return Err(RepoError::Db(DbError::Sqlite(busy)));
            }
            self.saved
                .borrow_mut()
                .push((note_id, draft.content.clone()));
            Ok(())
        }

        fn delete_note(&self, note_id: NoteId) -> RepoResult<()> {
            Err(RepoError::NotFound(note_id))
        }

        fn get_note(&self, note_id: NoteId) -> RepoResult<Option<NoteRecord>> {
            Ok(self
                .saved
                .borrow()
                .iter()
                .rev()
                .find(|(id, _)| *id == note_id)
                .map(|(_, content)| NoteRecord {
                    note_id,
                    content: content.clone(),
                    checklist: Vec::new(),
                    updated_at: 0,
                }))
        }

        fn get_notes(&self, _query: &NoteListQuery) -> RepoResult<Vec<NoteRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn reschedule_cancels_pending_commit() {
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(500));
        let note_id = Uuid::new_v4();
        let start = Instant::now();

        assert!(!scheduler.schedule(note_id, vec![Block::text("a")], start));
        assert!(scheduler.schedule(
            note_id,
            vec![Block::text("ab")],
            start + Duration::from_millis(300)
        ));
        assert_eq!(scheduler.pending_count(), 1);

        assert!(scheduler
            .take_due(start + Duration::from_millis(500))
            .is_empty());

        let due = scheduler.take_due(start + Duration::from_millis(800));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].blocks, vec![Block::text("ab")]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn take_due_orders_by_due_time() {
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(100));
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let start = Instant::now();

        scheduler.schedule(second, vec![Block::text("2")], start + Duration::from_millis(10));
        scheduler.schedule(first, vec![Block::text("1")], start);
        assert_eq!(scheduler.next_due(), Some(start + Duration::from_millis(100)));

        let due = scheduler.take_due(start + Duration::from_secs(1));
        let order = due.iter().map(|commit| commit.note_id).collect::<Vec<_>>();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn cancel_removes_pending_commit() {
        let mut scheduler = AutosaveScheduler::default();
        let note_id = Uuid::new_v4();
        scheduler.schedule(note_id, Vec::new(), Instant::now());

        assert!(scheduler.cancel(note_id));
        assert!(!scheduler.cancel(note_id));
        assert!(!scheduler.is_pending(note_id));
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn busy_commit_is_requeued_and_retried() {
        let repo = ContendedRepo::default();
        repo.busy_updates.set(1);
        let service = NoteService::new(repo);
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(100));
        let note_id = Uuid::new_v4();
        let start = Instant::now();

        scheduler.schedule(note_id, vec![Block::text("draft")], start);
        let first = scheduler.flush_due(start + Duration::from_millis(100), &service);
        assert_eq!(first.len(), 1);
        assert!(first[0].result.as_ref().is_err_and(|err| err.is_busy()));
        assert!(first[0].requeued);
        assert!(scheduler.is_pending(note_id));
        assert!(!scheduler.has_due(start + Duration::from_millis(150)));

        let second = scheduler.flush_due(start + Duration::from_millis(200), &service);
        assert_eq!(second.len(), 1);
        assert_eq!(
            second[0].result.as_ref().map(|record| record.content.as_str()).ok(),
            Some("draft")
        );
        assert!(!second[0].requeued);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn requeue_never_overrides_a_newer_edit() {
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(100));
        let note_id = Uuid::new_v4();
        let start = Instant::now();

        scheduler.schedule(note_id, vec![Block::text("newer")], start);
        let stale = DueCommit {
            note_id,
            blocks: vec![Block::text("older")],
        };
        assert!(!scheduler.requeue(stale, start));

        let due = scheduler.take_due(start + Duration::from_millis(100));
        assert_eq!(due[0].blocks, vec![Block::text("newer")]);
    }
}
