//! Cooperative scheduling
//!
//! Two kinds of deferral, both drained by the frame loop at fixed points:
//! - deferred tasks run at the start of the next frame (merges found during
//!   a physics step, releasing a dropped piece, post-merge game-over checks)
//! - timers fire once the frame clock reaches their due time (game-over
//!   confirmation, spawn retry)
//!
//! Cancelling everything bumps an epoch, so a [`TimerId`] handed out before a
//! restart can never cancel or match a timer from the new session.

use std::collections::VecDeque;

use super::piece::PieceId;

/// Work postponed to the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Fuse two pieces already claimed as merge candidates. `retry` marks
    /// the second and last attempt after a failed one.
    Merge { a: PieceId, b: PieceId, retry: bool },
    /// Make a dropped piece dynamic and collidable
    Release(PieceId),
    CheckGameOver,
}

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Re-check an overflow observed on this piece
    ConfirmGameOver(PieceId),
    /// Try again to stage a piece the player asked for
    SpawnRetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    epoch: u32,
    seq: u64,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due: f64,
    kind: TimerKind,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    deferred: VecDeque<Task>,
    timers: Vec<Timer>,
    next_seq: u64,
    epoch: u32,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next frame
    pub fn defer(&mut self, task: Task) {
        self.deferred.push_back(task);
    }

    /// Take every task queued so far. Tasks deferred while these run land
    /// in the following frame.
    pub fn take_deferred(&mut self) -> Vec<Task> {
        self.deferred.drain(..).collect()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn schedule(&mut self, due: f64, kind: TimerKind) -> TimerId {
        let id = TimerId {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.timers.push(Timer { id, due, kind });
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Remove and return timers due at `now`, earliest first
    pub fn take_due(&mut self, now: f64) -> Vec<(TimerId, TimerKind)> {
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|t| {
            if t.due <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.seq.cmp(&b.id.seq)));
        due.into_iter().map(|t| (t.id, t.kind)).collect()
    }

    /// Drop every deferred task and timer and invalidate outstanding ids
    pub fn cancel_all(&mut self) {
        self.deferred.clear();
        self.timers.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_tasks_wait_for_next_drain() {
        let mut sched = Scheduler::new();
        sched.defer(Task::CheckGameOver);
        let tasks = sched.take_deferred();
        assert_eq!(tasks, vec![Task::CheckGameOver]);

        // Deferring while handling lands in the next batch
        sched.defer(Task::Release(PieceId(3)));
        assert_eq!(sched.deferred_len(), 1);
        assert_eq!(sched.take_deferred(), vec![Task::Release(PieceId(3))]);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut sched = Scheduler::new();
        sched.schedule(300.0, TimerKind::SpawnRetry);
        sched.schedule(100.0, TimerKind::ConfirmGameOver(PieceId(1)));
        assert!(sched.take_due(50.0).is_empty());

        let fired: Vec<TimerKind> = sched.take_due(400.0).into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            fired,
            vec![TimerKind::ConfirmGameOver(PieceId(1)), TimerKind::SpawnRetry]
        );
        assert_eq!(sched.timer_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(100.0, TimerKind::SpawnRetry);
        assert!(sched.is_pending(TimerKind::SpawnRetry));
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(sched.take_due(1000.0).is_empty());
    }

    #[test]
    fn test_stale_ids_do_not_survive_cancel_all() {
        let mut sched = Scheduler::new();
        let stale = sched.schedule(100.0, TimerKind::SpawnRetry);
        sched.defer(Task::CheckGameOver);
        sched.cancel_all();
        assert_eq!(sched.deferred_len(), 0);

        let fresh = sched.schedule(100.0, TimerKind::SpawnRetry);
        assert_ne!(stale, fresh);
        assert!(!sched.cancel(stale));
        assert!(sched.is_pending(TimerKind::SpawnRetry));
    }
}
