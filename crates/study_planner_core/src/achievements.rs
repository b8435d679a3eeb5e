//! crates/study_planner_core/src/achievements.rs
//!
//! Read-only rollups of stored tasks over day, week and month windows.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::{ScheduleTask, UserId};
use crate::planner::StudyPlanner;
use crate::ports::PortResult;
use crate::time::{date_id, days_between, month_window, week_window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    Day,
    /// Sunday through Saturday.
    Week,
    /// The calendar month.
    Month,
}

impl ReportRange {
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            ReportRange::Day => (today, today),
            ReportRange::Week => week_window(today),
            ReportRange::Month => month_window(today),
        }
    }
}

impl FromStr for ReportRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "daily" => Ok(ReportRange::Day),
            "week" | "weekly" => Ok(ReportRange::Week),
            "month" | "monthly" => Ok(ReportRange::Month),
            other => Err(format!("unknown report range '{}'", other)),
        }
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportRange::Day => "day",
            ReportRange::Week => "week",
            ReportRange::Month => "month",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementReport {
    pub range: ReportRange,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub items: Vec<ScheduleTask>,
    pub completed: usize,
    pub pending: usize,
    /// Pages of completed tasks; a task without recorded pages counts in full.
    pub completed_pages: u64,
}

impl AchievementReport {
    fn new(range: ReportRange, start: NaiveDate, end: NaiveDate, items: Vec<ScheduleTask>) -> Self {
        let completed: Vec<_> = items.iter().filter(|t| t.is_completed()).collect();
        let completed_pages = completed
            .iter()
            .map(|t| u64::from(t.completed_pages.unwrap_or(t.pages)))
            .sum();
        Self {
            range,
            start,
            end,
            completed: completed.len(),
            pending: items.len() - completed.len(),
            completed_pages,
            items,
        }
    }
}

impl StudyPlanner {
    /// Every task stored under each day of `start..=end`, day by day, in storage order.
    pub async fn gather(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<ScheduleTask>> {
        let mut all = Vec::new();
        for day in days_between(start, end) {
            all.extend(self.store.list_tasks(user_id, date_id(day)).await?);
        }
        Ok(all)
    }

    pub async fn report(&self, user_id: UserId, range: ReportRange) -> PortResult<AchievementReport> {
        let (start, end) = range.window(self.calendar.today());
        let items = self.gather(user_id, start, end).await?;
        Ok(AchievementReport::new(range, start, end, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudyInput;
    use crate::entries::EntryDraft;
    use crate::planner::testing::Fixture;
    use uuid::Uuid;

    fn one_subject(pages: u32) -> EntryDraft {
        EntryDraft {
            studied: vec![StudyInput {
                subject_id: Uuid::new_v4(),
                pages,
                focus: 3,
                difficulty: None,
                note: None,
            }],
            available_hours: 1.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn gather_over_one_day_equals_that_days_tasks() {
        let fx = Fixture::at(2024, 5, 15);
        fx.planner.submit_entry(fx.user, one_subject(4)).await.unwrap();
        let today = fx.planner.calendar().today();

        let gathered = fx.planner.gather(fx.user, today, today).await.unwrap();
        let listed = fx.planner.list_tasks_for_day(fx.user, fx.today()).await.unwrap();
        assert_eq!(gathered, listed);
        assert_eq!(gathered.len(), 1);
    }

    #[tokio::test]
    async fn weekly_report_spans_sunday_to_saturday() {
        // 2024-05-11 is a Saturday, 2024-05-12 a Sunday.
        let fx = Fixture::at(2024, 5, 11);
        fx.planner.submit_entry(fx.user, one_subject(2)).await.unwrap();
        fx.next_day();
        let (_, sunday) = fx.planner.submit_entry(fx.user, one_subject(6)).await.unwrap();
        fx.next_day();
        fx.planner.submit_entry(fx.user, one_subject(8)).await.unwrap();
        fx.planner
            .set_completed(fx.user, sunday[0].reference(), true, Some(5))
            .await
            .unwrap();

        let week = fx.planner.report(fx.user, ReportRange::Week).await.unwrap();
        assert_eq!(week.start.to_string(), "2024-05-12");
        assert_eq!(week.end.to_string(), "2024-05-18");
        assert_eq!(week.items.len(), 2);
        assert_eq!(week.items[0].id, sunday[0].id);
        assert_eq!((week.completed, week.pending), (1, 1));
        assert_eq!(week.completed_pages, 5);

        let month = fx.planner.report(fx.user, ReportRange::Month).await.unwrap();
        assert_eq!(month.items.len(), 3);

        let day = fx.planner.report(fx.user, ReportRange::Day).await.unwrap();
        assert_eq!(day.items.len(), 1);
    }

    #[tokio::test]
    async fn completed_pages_total_exceeds_u32() {
        let fx = Fixture::at(2024, 5, 15);
        let mut draft = one_subject(3_000_000_000);
        draft.studied.push(draft.studied[0].clone());
        draft.studied[1].subject_id = Uuid::new_v4();
        let (_, tasks) = fx.planner.submit_entry(fx.user, draft).await.unwrap();
        for task in &tasks {
            fx.planner
                .set_completed(fx.user, task.reference(), true, None)
                .await
                .unwrap();
        }

        let report = fx.planner.report(fx.user, ReportRange::Day).await.unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(report.completed_pages, 6_000_000_000);
    }

    #[test]
    fn range_names_parse() {
        assert_eq!("weekly".parse::<ReportRange>(), Ok(ReportRange::Week));
        assert_eq!("month".parse::<ReportRange>(), Ok(ReportRange::Month));
        assert!("year".parse::<ReportRange>().is_err());
    }
}
