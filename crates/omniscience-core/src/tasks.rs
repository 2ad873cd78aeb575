//! Named, independently cancellable timed tasks.
//!
//! Every timer in a session is an entry in one [`TaskSchedule`], keyed by
//! [`TaskKind`]. A task is either periodic or one-shot; scheduling a kind
//! that already exists replaces it. The runner sleeps until
//! [`TaskSchedule::next_due`] and then drains [`TaskSchedule::take_due`].
//!
//! Late ticks are coalesced: a periodic task that missed several periods
//! runs once and resumes on its next future boundary.

use std::collections::BTreeMap;

/// The timers a session owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// Advances the time-on-site statistic.
    SessionClock,
    /// Decides whether to emit a revelation popup.
    EscalationTick,
    /// Removes the earliest popup once its lifetime has elapsed.
    RevelationExpiry,
    /// Removes popups older than the safety ceiling.
    RevelationSweep,
    /// Purges aged entries from the collector's event log.
    EventLogSweep,
    /// Rolls for a reality glitch.
    GlitchCheck,
    /// Ends the glitch burst on screen.
    GlitchEnd,
}

impl TaskKind {
    /// Stable name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SessionClock => "session_clock",
            Self::EscalationTick => "escalation_tick",
            Self::RevelationExpiry => "revelation_expiry",
            Self::RevelationSweep => "revelation_sweep",
            Self::EventLogSweep => "event_log_sweep",
            Self::GlitchCheck => "glitch_check",
            Self::GlitchEnd => "glitch_end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Task {
    due_ms: u64,
    period_ms: Option<u64>,
}

/// The set of live timers.
#[derive(Debug, Clone, Default)]
pub struct TaskSchedule {
    tasks: BTreeMap<TaskKind, Task>,
}

impl TaskSchedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `kind` every `period_ms`, first at `now_ms + period_ms`.
    /// A zero period is treated as one millisecond.
    pub fn schedule_every(&mut self, kind: TaskKind, now_ms: u64, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.tasks.insert(
            kind,
            Task {
                due_ms: now_ms.saturating_add(period_ms),
                period_ms: Some(period_ms),
            },
        );
    }

    /// Run `kind` once at `due_ms`.
    pub fn schedule_once(&mut self, kind: TaskKind, due_ms: u64) {
        self.tasks.insert(
            kind,
            Task {
                due_ms,
                period_ms: None,
            },
        );
    }

    /// Cancel `kind`. Returns whether it was scheduled.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        self.tasks.remove(&kind).is_some()
    }

    /// Cancel every task. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// Whether `kind` is scheduled.
    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.contains_key(&kind)
    }

    /// When `kind` next runs.
    pub fn due_at(&self, kind: TaskKind) -> Option<u64> {
        self.tasks.get(&kind).map(|task| task.due_ms)
    }

    /// The earliest due time of any task.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.values().map(|task| task.due_ms).min()
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is live.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove and return every task due at `now_ms`, ordered by due time
    /// and then by kind. Periodic tasks are rescheduled to their next
    /// boundary after `now_ms`; one-shot tasks are dropped.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TaskKind> {
        let mut due: Vec<(u64, TaskKind)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_ms <= now_ms)
            .map(|(kind, task)| (task.due_ms, *kind))
            .collect();
        due.sort_unstable();

        for (_, kind) in &due {
            let Some(task) = self.tasks.get_mut(kind) else {
                continue;
            };
            match task.period_ms {
                Some(period) => {
                    let behind = now_ms.saturating_sub(task.due_ms);
                    let skipped = behind.checked_div(period).unwrap_or(0);
                    let advance = period.saturating_mul(skipped.saturating_add(1));
                    task.due_ms = task.due_ms.saturating_add(advance);
                }
                None => {
                    self.tasks.remove(kind);
                }
            }
        }

        due.into_iter().map(|(_, kind)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_task_fires_on_each_boundary() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_every(TaskKind::SessionClock, 0, 1_000);
        assert!(schedule.take_due(999).is_empty());
        assert_eq!(schedule.take_due(1_000), vec![TaskKind::SessionClock]);
        assert_eq!(schedule.due_at(TaskKind::SessionClock), Some(2_000));
    }

    #[test]
    fn missed_periods_coalesce() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_every(TaskKind::EscalationTick, 0, 1_000);
        assert_eq!(schedule.take_due(4_500), vec![TaskKind::EscalationTick]);
        assert_eq!(schedule.due_at(TaskKind::EscalationTick), Some(5_000));
    }

    #[test]
    fn one_shot_runs_once() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_once(TaskKind::GlitchEnd, 500);
        assert_eq!(schedule.take_due(600), vec![TaskKind::GlitchEnd]);
        assert!(!schedule.is_scheduled(TaskKind::GlitchEnd));
        assert!(schedule.take_due(700).is_empty());
    }

    #[test]
    fn due_tasks_ordered_by_time_then_kind() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_once(TaskKind::GlitchEnd, 100);
        schedule.schedule_once(TaskKind::RevelationExpiry, 200);
        schedule.schedule_once(TaskKind::GlitchCheck, 100);
        assert_eq!(
            schedule.take_due(200),
            vec![
                TaskKind::GlitchCheck,
                TaskKind::GlitchEnd,
                TaskKind::RevelationExpiry
            ]
        );
    }

    #[test]
    fn rescheduling_replaces() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_once(TaskKind::RevelationExpiry, 4_000);
        schedule.schedule_once(TaskKind::RevelationExpiry, 2_000);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.next_due(), Some(2_000));
    }

    #[test]
    fn cancel_is_independent() {
        let mut schedule = TaskSchedule::new();
        schedule.schedule_every(TaskKind::SessionClock, 0, 1_000);
        schedule.schedule_every(TaskKind::EventLogSweep, 0, 1_000);
        assert!(schedule.cancel(TaskKind::SessionClock));
        assert!(!schedule.cancel(TaskKind::SessionClock));
        assert_eq!(schedule.take_due(1_000), vec![TaskKind::EventLogSweep]);
        assert_eq!(schedule.cancel_all(), 1);
        assert!(schedule.is_empty());
        assert_eq!(schedule.next_due(), None);
    }
}
