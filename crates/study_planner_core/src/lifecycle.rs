//! crates/study_planner_core/src/lifecycle.rs
//!
//! Task lifecycle: listing a day's tasks, deriving late tasks from earlier days,
//! toggling completion at a task's true storage key, and pulling late work
//! forward into today.
//!
//! A task only ever moves between `pending` and `completed`. "Late" is computed
//! when tasks are listed and never written back.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DateId, LateTask, NewTask, ScheduleTask, TaskRef, TaskSource, TaskStatus, TaskView, UserId,
};
use crate::planner::StudyPlanner;
use crate::ports::{PortError, PortResult};

/// Today's tasks merged with late ones, split by status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBoard {
    pub date_id: DateId,
    pub pending: Vec<TaskView>,
    pub completed: Vec<TaskView>,
}

impl DayBoard {
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Pending first, then completed.
    pub fn all(&self) -> impl Iterator<Item = &TaskView> {
        self.pending.iter().chain(self.completed.iter())
    }
}

fn view(task: ScheduleTask, today: DateId) -> TaskView {
    TaskView {
        reference: task.reference(),
        late: task.is_late(today),
        task,
    }
}

impl StudyPlanner {
    pub async fn list_tasks_for_day(
        &self,
        user_id: UserId,
        date_id: DateId,
    ) -> PortResult<Vec<ScheduleTask>> {
        self.store.list_tasks(user_id, date_id).await
    }

    /// Unfinished tasks stored under any entry day before `today`.
    ///
    /// Read-only: nothing is moved or rewritten. Each view carries the
    /// reference of the stored task it was derived from.
    pub async fn list_late_tasks(
        &self,
        user_id: UserId,
        today: DateId,
    ) -> PortResult<Vec<TaskView>> {
        let mut late = Vec::new();
        for entry in self.store.list_entries(user_id).await? {
            if entry.date_id >= today {
                continue;
            }
            let tasks = self.store.list_tasks(user_id, entry.date_id).await?;
            late.extend(
                tasks
                    .into_iter()
                    .filter(|t| t.status != TaskStatus::Completed)
                    .map(|t| view(t, today)),
            );
        }
        Ok(late)
    }

    /// Today's tasks plus every late task, as the schedule page shows them.
    pub async fn day_board(&self, user_id: UserId) -> PortResult<DayBoard> {
        let today = self.calendar.today_id();
        let mut views: Vec<TaskView> = self
            .store
            .list_tasks(user_id, today)
            .await?
            .into_iter()
            .map(|t| view(t, today))
            .collect();
        views.extend(self.list_late_tasks(user_id, today).await?);

        let (completed, pending): (Vec<TaskView>, Vec<TaskView>) =
            views.into_iter().partition(|v| v.task.is_completed());
        Ok(DayBoard {
            date_id: today,
            pending,
            completed,
        })
    }

    /// Marks a task completed or pending where it is stored.
    ///
    /// Completed pages are only kept while the task is completed; marking it
    /// pending again clears them.
    pub async fn set_completed(
        &self,
        user_id: UserId,
        task: TaskRef,
        completed: bool,
        completed_pages: Option<u32>,
    ) -> PortResult<ScheduleTask> {
        let mut stored = self.store.get_task(user_id, task).await?;
        let (status, pages) = if completed {
            (TaskStatus::Completed, completed_pages)
        } else {
            (TaskStatus::Pending, None)
        };
        self.store
            .update_task_status(user_id, task, status, pages)
            .await?;
        stored.status = status;
        stored.completed_pages = pages;
        info!(%user_id, day = %task.day, task = %task.id, status = %status, "Task status updated");
        Ok(stored)
    }

    /// Records a parked late task for every late task that does not have one yet.
    /// Returns the records created by this call.
    pub async fn park_late_tasks(&self, user_id: UserId) -> PortResult<Vec<LateTask>> {
        let today = self.calendar.today_id();
        let parked: HashSet<TaskRef> = self
            .store
            .list_late_tasks(user_id)
            .await?
            .into_iter()
            .map(|l| l.origin)
            .collect();

        let mut created = Vec::new();
        for late_view in self.list_late_tasks(user_id, today).await? {
            if parked.contains(&late_view.reference) {
                continue;
            }
            let task = late_view.task;
            let record = LateTask {
                id: Uuid::new_v4(),
                origin: late_view.reference,
                subject_id: task.subject_id,
                subject_name: task.subject_name,
                pages: task.pages,
                minutes: task.minutes,
                source: task.source,
                created_at: Some(self.calendar.now()),
            };
            self.store.insert_late_task(user_id, &record).await?;
            created.push(record);
        }
        Ok(created)
    }

    /// Copies an unfinished task from an earlier day into today as a new
    /// pending task with source `late`, then drops any parked record of it.
    ///
    /// The original task is left as it was.
    pub async fn pull_to_today(&self, user_id: UserId, origin: TaskRef) -> PortResult<ScheduleTask> {
        let today = self.calendar.today_id();
        if origin.day >= today {
            return Err(PortError::Invalid(format!(
                "task {} is not from an earlier day",
                origin.id
            )));
        }
        let source = self.store.get_task(user_id, origin).await?;
        if source.is_completed() {
            return Err(PortError::Invalid(format!(
                "task {} is already completed",
                origin.id
            )));
        }

        let todays = self.store.list_tasks(user_id, today).await?;
        if todays
            .iter()
            .any(|t| t.pulled_from == Some(origin) && t.status == TaskStatus::Pending)
        {
            return Err(PortError::Invalid(format!(
                "task {} was already pulled into {}",
                origin.id, today
            )));
        }

        let copy = ScheduleTask::from_new(
            NewTask {
                subject_id: source.subject_id,
                subject_name: source.subject_name,
                pages: source.pages,
                minutes: source.minutes,
                priority: source.priority,
                source: TaskSource::Late,
                note: source.note,
                pulled_from: Some(origin),
            },
            today,
            self.calendar.now(),
        );
        self.store.insert_task(user_id, &copy).await?;
        info!(%user_id, from = %origin.day, task = %origin.id, copy = %copy.id, "Pulled late task into today");

        match self.store.list_late_tasks(user_id).await {
            Ok(parked) => {
                for record in parked.into_iter().filter(|l| l.origin == origin) {
                    if let Err(e) = self.store.remove_late_task(user_id, record.id).await {
                        warn!(%user_id, late_task = %record.id, "Failed to drop parked late task: {}", e);
                    }
                }
            }
            Err(e) => warn!(%user_id, "Failed to list parked late tasks: {}", e),
        }

        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudyInput;
    use crate::entries::EntryDraft;
    use crate::planner::testing::{day, Fixture};
    use crate::ports::StudyStore;

    fn draft(subjects: usize) -> EntryDraft {
        EntryDraft {
            studied: (0..subjects)
                .map(|i| StudyInput {
                    subject_id: Uuid::new_v4(),
                    pages: 5 + i as u32,
                    focus: 3,
                    difficulty: None,
                    note: None,
                })
                .collect(),
            available_hours: 1.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn completion_round_trip_restores_pending_and_clears_pages() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, tasks) = fx.planner.submit_entry(fx.user, draft(1)).await.unwrap();
        let reference = tasks[0].reference();

        let done = fx.planner.set_completed(fx.user, reference, true, Some(3)).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completed_pages, Some(3));

        fx.planner.set_completed(fx.user, reference, false, Some(9)).await.unwrap();
        let stored = fx.store.get_task(fx.user, reference).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert_eq!(stored.completed_pages, None);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let fx = Fixture::at(2024, 6, 3);
        let err = fx
            .planner
            .set_completed(fx.user, TaskRef::new(fx.today(), Uuid::new_v4()), true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn late_tasks_come_from_earlier_entry_days_only() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, monday) = fx.planner.submit_entry(fx.user, draft(2)).await.unwrap();
        fx.planner
            .set_completed(fx.user, monday[0].reference(), true, None)
            .await
            .unwrap();
        fx.next_day();
        fx.planner.submit_entry(fx.user, draft(1)).await.unwrap();

        let today = fx.today();
        let late = fx.planner.list_late_tasks(fx.user, today).await.unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].reference, TaskRef::new(day(2024, 6, 3), monday[1].id));
        assert_eq!(late[0].task.original_date_id, day(2024, 6, 3));
        assert!(late[0].late);

        // Viewed from the entry's own day nothing is late.
        assert!(fx
            .planner
            .list_late_tasks(fx.user, day(2024, 6, 3))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn completing_a_late_task_writes_at_its_original_day() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, monday) = fx.planner.submit_entry(fx.user, draft(1)).await.unwrap();
        fx.next_day();

        let board = fx.planner.day_board(fx.user).await.unwrap();
        assert_eq!(board.pending_count(), 1);
        let late = &board.pending[0];
        assert!(late.late);

        fx.planner.set_completed(fx.user, late.reference, true, Some(5)).await.unwrap();

        let original = fx.store.get_task(fx.user, monday[0].reference()).await.unwrap();
        assert!(original.is_completed());
        assert!(fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap().is_empty());
        let board = fx.planner.day_board(fx.user).await.unwrap();
        assert_eq!(board.pending_count(), 0);
        // Completed late tasks drop off the board: only unfinished days are scanned.
        assert_eq!(board.completed_count(), 0);
    }

    #[tokio::test]
    async fn pull_copies_into_today_and_leaves_the_original_pending() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, monday) = fx.planner.submit_entry(fx.user, draft(1)).await.unwrap();
        let origin = monday[0].reference();
        fx.next_day();

        let copy = fx.planner.pull_to_today(fx.user, origin).await.unwrap();

        assert_eq!(copy.source, TaskSource::Late);
        assert_eq!(copy.date_id, fx.today());
        assert_eq!(copy.original_date_id, fx.today());
        assert_eq!(copy.pulled_from, Some(origin));
        assert_eq!((copy.pages, copy.minutes), (monday[0].pages, monday[0].minutes));
        assert_eq!(copy.status, TaskStatus::Pending);

        let original = fx.store.get_task(fx.user, origin).await.unwrap();
        assert_eq!(original, monday[0]);

        let board = fx.planner.day_board(fx.user).await.unwrap();
        assert_eq!(board.pending_count(), 2);
        assert!(board.pending.iter().any(|v| v.task.id == copy.id && !v.late));
        assert!(board.pending.iter().any(|v| v.reference == origin && v.late));
    }

    #[tokio::test]
    async fn pulling_twice_is_rejected_while_the_copy_is_pending() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, monday) = fx.planner.submit_entry(fx.user, draft(1)).await.unwrap();
        fx.next_day();
        let origin = monday[0].reference();

        fx.planner.pull_to_today(fx.user, origin).await.unwrap();
        let err = fx.planner.pull_to_today(fx.user, origin).await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
    }

    #[tokio::test]
    async fn todays_and_completed_tasks_cannot_be_pulled() {
        let fx = Fixture::at(2024, 6, 3);
        let (_, tasks) = fx.planner.submit_entry(fx.user, draft(2)).await.unwrap();
        let err = fx.planner.pull_to_today(fx.user, tasks[0].reference()).await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));

        fx.planner
            .set_completed(fx.user, tasks[1].reference(), true, None)
            .await
            .unwrap();
        fx.next_day();
        let err = fx.planner.pull_to_today(fx.user, tasks[1].reference()).await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
    }

    #[tokio::test]
    async fn parking_is_idempotent_and_pull_drops_the_matching_record_only() {
        let fx = Fixture::at(2024, 6, 3);
        // Same pages on purpose: records are matched by origin, not by content.
        let mut same_pages = draft(2);
        same_pages.studied[1].pages = same_pages.studied[0].pages;
        same_pages.studied[1].subject_id = same_pages.studied[0].subject_id;
        let (_, monday) = fx.planner.submit_entry(fx.user, same_pages).await.unwrap();
        fx.next_day();

        let parked = fx.planner.park_late_tasks(fx.user).await.unwrap();
        assert_eq!(parked.len(), 2);
        assert!(fx.planner.park_late_tasks(fx.user).await.unwrap().is_empty());

        fx.planner.pull_to_today(fx.user, monday[0].reference()).await.unwrap();

        let remaining = fx.store.list_late_tasks(fx.user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].origin, monday[1].reference());
    }
}
