//! crates/study_planner_core/src/entries.rs
//!
//! Daily entry submission, schedule generation for the current day, and the
//! exam rows embedded in saved entries.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::domain::{
    DailyEntry, DateId, ExamInput, NotificationSettings, Preferences, ScheduleTask, StudyInput,
    TaskStatus, UserId,
};
use crate::planner::{RegenerationPolicy, StudyPlanner};
use crate::ports::{PortError, PortResult};
use crate::schedule::plan_schedule;
use crate::time::days_until;

/// Exams further out than this are not listed as upcoming.
pub const UPCOMING_EXAM_DAYS: i64 = 14;

/// What the user submits for today. The day key and timestamp are assigned on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub studied: Vec<StudyInput>,
    pub available_hours: f64,
    pub exam_tasks: Vec<ExamInput>,
    pub preferences: Preferences,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Today,
    Tomorrow,
    Soon,
    ThisWeek,
    Later,
}

impl Urgency {
    pub fn from_days_left(days_left: i64) -> Self {
        match days_left {
            i64::MIN..=0 => Urgency::Today,
            1 => Urgency::Tomorrow,
            2..=3 => Urgency::Soon,
            4..=7 => Urgency::ThisWeek,
            _ => Urgency::Later,
        }
    }
}

/// An exam row found in some saved entry, located by its entry day and index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingExam {
    pub entry_day: DateId,
    pub index: usize,
    pub exam: ExamInput,
    pub days_left: i64,
    pub urgency: Urgency,
}

fn validate_exam(exam: &mut ExamInput) -> PortResult<()> {
    exam.subject_name = exam.subject_name.trim().to_string();
    if exam.subject_name.is_empty() {
        return Err(PortError::Invalid("exam subject name is empty".to_string()));
    }
    if !exam.required_hours.is_finite() || exam.required_hours < 0.0 {
        return Err(PortError::Invalid(format!(
            "required hours for '{}' must be zero or more",
            exam.subject_name
        )));
    }
    Ok(())
}

/// Checks a draft before anything reaches the store. Exam rows without a
/// subject name are dropped, as an unfinished form row would be.
pub fn validate_draft(draft: &mut EntryDraft) -> PortResult<()> {
    if !draft.available_hours.is_finite() || draft.available_hours < 0.0 {
        return Err(PortError::Invalid(
            "available hours must be zero or more".to_string(),
        ));
    }
    for input in &draft.studied {
        if !(1..=5).contains(&input.focus) {
            return Err(PortError::Invalid(format!(
                "focus for subject {} must be between 1 and 5, got {}",
                input.subject_id, input.focus
            )));
        }
    }
    draft
        .exam_tasks
        .retain(|exam| !exam.subject_name.trim().is_empty());
    for exam in &mut draft.exam_tasks {
        validate_exam(exam)?;
    }
    Ok(())
}

impl StudyPlanner {
    /// Saves the draft as today's entry and generates today's schedule from it.
    pub async fn submit_entry(
        &self,
        user_id: UserId,
        mut draft: EntryDraft,
    ) -> PortResult<(DailyEntry, Vec<ScheduleTask>)> {
        validate_draft(&mut draft)?;

        let entry = DailyEntry {
            date_id: self.calendar.today_id(),
            studied: draft.studied,
            available_hours: draft.available_hours,
            exam_tasks: draft.exam_tasks,
            preferences: draft.preferences,
            notifications: draft.notifications,
            updated_at: Some(self.calendar.now()),
        };
        self.store.save_entry(user_id, &entry).await?;
        info!(%user_id, day = %entry.date_id, "Saved daily entry");

        let tasks = self.generate_schedule(user_id, &entry).await?;
        Ok((entry, tasks))
    }

    pub async fn get_entry(&self, user_id: UserId, date_id: DateId) -> PortResult<DailyEntry> {
        self.store
            .get_entry(user_id, date_id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", date_id)))
    }

    /// Writes the tasks planned from `entry` under the entry's own day, even
    /// if the clock has moved past midnight since it was saved.
    ///
    /// Writes are sequential and not rolled back: if one fails, the tasks
    /// written before it stay and the error is returned.
    pub async fn generate_schedule(
        &self,
        user_id: UserId,
        entry: &DailyEntry,
    ) -> PortResult<Vec<ScheduleTask>> {
        let date_id = entry.date_id;

        if self.regeneration == RegenerationPolicy::Replace {
            let stale: Vec<_> = self
                .store
                .list_tasks(user_id, date_id)
                .await?
                .into_iter()
                .filter(|t| t.status == TaskStatus::Pending && t.source.is_generated())
                .collect();
            for task in &stale {
                self.store.remove_task(user_id, task.reference()).await?;
            }
            if !stale.is_empty() {
                debug!(%user_id, day = %date_id, removed = stale.len(), "Dropped previously generated tasks");
            }
        }

        let planned = plan_schedule(
            date_id.date(),
            &entry.studied,
            &entry.exam_tasks,
            entry.available_hours,
        );
        let total = planned.len();
        let mut written = Vec::with_capacity(total);
        for new_task in planned {
            let task = ScheduleTask::from_new(new_task, date_id, self.calendar.now());
            if let Err(e) = self.store.insert_task(user_id, &task).await {
                error!(
                    %user_id,
                    day = %date_id,
                    "Schedule generation stopped after {} of {} tasks: {}",
                    written.len(),
                    total,
                    e
                );
                return Err(e);
            }
            written.push(task);
        }

        info!(%user_id, day = %date_id, tasks = total, "Generated schedule");
        Ok(written)
    }

    /// Exams due between today and two weeks out, across all saved entries,
    /// soonest first.
    pub async fn upcoming_exams(&self, user_id: UserId) -> PortResult<Vec<UpcomingExam>> {
        let today = self.calendar.today();
        let mut upcoming: Vec<UpcomingExam> = self
            .store
            .list_entries(user_id)
            .await?
            .into_iter()
            .flat_map(|entry| {
                let entry_day = entry.date_id;
                entry
                    .exam_tasks
                    .into_iter()
                    .enumerate()
                    .map(move |(index, exam)| (entry_day, index, exam))
            })
            .filter_map(|(entry_day, index, exam)| {
                let days_left = days_until(today, exam.due_date);
                (0..=UPCOMING_EXAM_DAYS).contains(&days_left).then(|| UpcomingExam {
                    entry_day,
                    index,
                    exam,
                    days_left,
                    urgency: Urgency::from_days_left(days_left),
                })
            })
            .collect();
        upcoming.sort_by_key(|u| u.exam.due_date);
        Ok(upcoming)
    }

    /// Replaces one exam row of a saved entry.
    pub async fn update_exam(
        &self,
        user_id: UserId,
        entry_day: DateId,
        index: usize,
        mut exam: ExamInput,
    ) -> PortResult<DailyEntry> {
        validate_exam(&mut exam)?;
        let mut entry = self.get_entry(user_id, entry_day).await?;
        let slot = entry.exam_tasks.get_mut(index).ok_or_else(|| {
            PortError::NotFound(format!("Exam {} of entry {} not found", index, entry_day))
        })?;
        *slot = exam;
        entry.updated_at = Some(self.calendar.now());
        self.store.save_entry(user_id, &entry).await?;
        Ok(entry)
    }

    /// Deletes one exam row of a saved entry.
    pub async fn remove_exam(
        &self,
        user_id: UserId,
        entry_day: DateId,
        index: usize,
    ) -> PortResult<DailyEntry> {
        let mut entry = self.get_entry(user_id, entry_day).await?;
        if index >= entry.exam_tasks.len() {
            return Err(PortError::NotFound(format!(
                "Exam {} of entry {} not found",
                index, entry_day
            )));
        }
        entry.exam_tasks.remove(index);
        entry.updated_at = Some(self.calendar.now());
        self.store.save_entry(user_id, &entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskSource};
    use crate::planner::testing::{day, Fixture};
    use crate::ports::StudyStore;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn studied(focus: u8) -> StudyInput {
        StudyInput {
            subject_id: Uuid::new_v4(),
            pages: 10,
            focus,
            difficulty: None,
            note: Some("chapter 3".into()),
        }
    }

    fn exam(name: &str, due: NaiveDate, hours: f64) -> ExamInput {
        ExamInput {
            subject_name: name.into(),
            due_date: due,
            required_hours: hours,
            pages: 20,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn submit_saves_entry_and_writes_pending_tasks_under_today() {
        let fx = Fixture::at(2024, 4, 10);
        let draft = EntryDraft {
            studied: vec![studied(2), studied(4)],
            available_hours: 2.0,
            exam_tasks: vec![exam("Biology", ymd(2024, 4, 13), 1.0)],
            ..Default::default()
        };

        let (entry, tasks) = fx.planner.submit_entry(fx.user, draft).await.unwrap();

        assert_eq!(entry.date_id, day(2024, 4, 10));
        assert!(entry.updated_at.is_some());
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].source, TaskSource::Exam);
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(
            tasks.iter().map(|t| t.minutes).collect::<Vec<_>>(),
            vec![60, 80, 40]
        );
        for task in &tasks {
            assert_eq!(task.status, TaskStatus::Pending);
            assert_eq!(task.date_id, entry.date_id);
            assert_eq!(task.original_date_id, entry.date_id);
        }

        let stored = fx.planner.list_tasks_for_day(fx.user, entry.date_id).await.unwrap();
        assert_eq!(stored, tasks);
        assert_eq!(fx.planner.get_entry(fx.user, entry.date_id).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn invalid_focus_is_rejected_before_anything_is_saved() {
        let fx = Fixture::at(2024, 4, 10);
        let draft = EntryDraft {
            studied: vec![studied(0)],
            available_hours: 1.0,
            ..Default::default()
        };

        let err = fx.planner.submit_entry(fx.user, draft).await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
        assert!(fx.store.get_entry(fx.user, fx.today()).await.unwrap().is_none());
    }

    #[test]
    fn unnamed_exam_rows_are_dropped_and_names_trimmed() {
        let mut draft = EntryDraft {
            exam_tasks: vec![
                exam("   ", ymd(2024, 4, 12), 1.0),
                exam("  History ", ymd(2024, 4, 12), 1.0),
            ],
            ..Default::default()
        };
        validate_draft(&mut draft).unwrap();
        assert_eq!(draft.exam_tasks.len(), 1);
        assert_eq!(draft.exam_tasks[0].subject_name, "History");
    }

    #[tokio::test]
    async fn replace_policy_drops_pending_generated_tasks_only() {
        let fx = Fixture::at(2024, 4, 10);
        let draft = EntryDraft {
            studied: vec![studied(3), studied(3)],
            available_hours: 1.0,
            ..Default::default()
        };
        let (_, first) = fx.planner.submit_entry(fx.user, draft.clone()).await.unwrap();
        fx.planner
            .set_completed(fx.user, first[0].reference(), true, Some(4))
            .await
            .unwrap();

        let (_, second) = fx.planner.submit_entry(fx.user, draft).await.unwrap();

        let stored = fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().any(|t| t.id == first[0].id && t.is_completed()));
        assert!(!stored.iter().any(|t| t.id == first[1].id));
        assert!(second.iter().all(|t| stored.contains(t)));
    }

    #[tokio::test]
    async fn replace_policy_keeps_tasks_pulled_into_the_day() {
        let fx = Fixture::at(2024, 4, 10);
        let draft = EntryDraft {
            studied: vec![studied(3)],
            available_hours: 1.0,
            ..Default::default()
        };
        let (_, yesterday) = fx.planner.submit_entry(fx.user, draft.clone()).await.unwrap();
        fx.next_day();
        fx.planner.submit_entry(fx.user, draft.clone()).await.unwrap();
        let copy = fx
            .planner
            .pull_to_today(fx.user, yesterday[0].reference())
            .await
            .unwrap();

        fx.planner.submit_entry(fx.user, draft).await.unwrap();

        let stored = fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap();
        assert_eq!(stored.len(), 2);
        let kept = stored.iter().find(|t| t.id == copy.id).unwrap();
        assert_eq!(kept.source, TaskSource::Late);
        assert_eq!(kept.pulled_from, Some(yesterday[0].reference()));
    }

    #[tokio::test]
    async fn generation_uses_the_entry_day_after_midnight() {
        let fx = Fixture::at(2024, 4, 10);
        let entry_day = fx.today();
        let entry = DailyEntry {
            date_id: entry_day,
            studied: vec![studied(3)],
            available_hours: 1.0,
            // Four days out from the entry, three from the next day.
            exam_tasks: vec![exam("Physics", ymd(2024, 4, 14), 1.0)],
            preferences: Default::default(),
            notifications: Default::default(),
            updated_at: None,
        };
        fx.store.save_entry(fx.user, &entry).await.unwrap();
        fx.next_day();

        let tasks = fx.planner.generate_schedule(fx.user, &entry).await.unwrap();

        assert!(tasks.iter().all(|t| t.date_id == entry_day));
        assert_eq!(tasks[0].priority, Priority::Med);
        let stored = fx.planner.list_tasks_for_day(fx.user, entry_day).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(fx
            .planner
            .list_tasks_for_day(fx.user, fx.today())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn append_policy_keeps_earlier_runs() {
        let mut fx = Fixture::at(2024, 4, 10);
        fx.planner = fx.planner.clone().with_regeneration(RegenerationPolicy::Append);
        let draft = EntryDraft {
            studied: vec![studied(3)],
            available_hours: 1.0,
            ..Default::default()
        };
        fx.planner.submit_entry(fx.user, draft.clone()).await.unwrap();
        fx.planner.submit_entry(fx.user, draft).await.unwrap();

        let stored = fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn failed_write_leaves_earlier_tasks_in_place() {
        let fx = Fixture::at(2024, 4, 10);
        fx.store.fail_task_inserts_after(2);
        let draft = EntryDraft {
            studied: vec![studied(3), studied(3), studied(3)],
            available_hours: 3.0,
            ..Default::default()
        };

        let err = fx.planner.submit_entry(fx.user, draft).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));

        let stored = fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap();
        assert_eq!(stored.len(), 2);
        // The entry itself was saved before generation started.
        assert!(fx.planner.get_entry(fx.user, fx.today()).await.is_ok());
    }

    #[tokio::test]
    async fn upcoming_exams_span_all_entries_sorted_by_due_date() {
        let fx = Fixture::at(2024, 4, 10);
        let first = EntryDraft {
            exam_tasks: vec![
                exam("Far", ymd(2024, 4, 30), 1.0),
                exam("Soon", ymd(2024, 4, 16), 1.0),
            ],
            ..Default::default()
        };
        fx.planner.submit_entry(fx.user, first).await.unwrap();
        fx.next_day();
        let second = EntryDraft {
            exam_tasks: vec![
                exam("Tomorrow", ymd(2024, 4, 12), 1.0),
                exam("Past", ymd(2024, 4, 9), 1.0),
            ],
            ..Default::default()
        };
        fx.planner.submit_entry(fx.user, second).await.unwrap();

        let upcoming = fx.planner.upcoming_exams(fx.user).await.unwrap();
        let names: Vec<_> = upcoming.iter().map(|u| u.exam.subject_name.as_str()).collect();
        assert_eq!(names, vec!["Tomorrow", "Soon"]);
        assert_eq!(upcoming[0].urgency, Urgency::Tomorrow);
        assert_eq!(upcoming[0].entry_day, day(2024, 4, 11));
        assert_eq!(upcoming[0].index, 0);
        assert_eq!(upcoming[1].days_left, 5);
        assert_eq!(upcoming[1].urgency, Urgency::ThisWeek);
        assert_eq!(upcoming[1].entry_day, day(2024, 4, 10));
        assert_eq!(upcoming[1].index, 1);
    }

    #[tokio::test]
    async fn exam_rows_can_be_edited_and_removed_in_place() {
        let fx = Fixture::at(2024, 4, 10);
        let draft = EntryDraft {
            exam_tasks: vec![
                exam("Math", ymd(2024, 4, 12), 1.0),
                exam("Art", ymd(2024, 4, 20), 2.0),
            ],
            ..Default::default()
        };
        fx.planner.submit_entry(fx.user, draft).await.unwrap();
        let today = fx.today();

        let updated = fx
            .planner
            .update_exam(fx.user, today, 1, exam(" Art history ", ymd(2024, 4, 21), 3.0))
            .await
            .unwrap();
        assert_eq!(updated.exam_tasks[1].subject_name, "Art history");

        let trimmed = fx.planner.remove_exam(fx.user, today, 0).await.unwrap();
        assert_eq!(trimmed.exam_tasks.len(), 1);

        let missing = fx.planner.remove_exam(fx.user, today, 5).await.unwrap_err();
        assert!(matches!(missing, PortError::NotFound(_)));
        let blank = fx
            .planner
            .update_exam(fx.user, today, 0, exam("", ymd(2024, 4, 21), 1.0))
            .await
            .unwrap_err();
        assert!(matches!(blank, PortError::Invalid(_)));
    }

    #[test]
    fn urgency_bands() {
        assert_eq!(Urgency::from_days_left(0), Urgency::Today);
        assert_eq!(Urgency::from_days_left(3), Urgency::Soon);
        assert_eq!(Urgency::from_days_left(7), Urgency::ThisWeek);
        assert_eq!(Urgency::from_days_left(8), Urgency::Later);
    }
}
