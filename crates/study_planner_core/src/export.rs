//! crates/study_planner_core/src/export.rs
//!
//! Plain-text tables for copying a schedule or an achievement log to the clipboard.
//! Rows keep the order they are given in.

use std::collections::HashMap;

use crate::achievements::ReportRange;
use crate::domain::{ScheduleTask, SubjectId, TaskStatus, TaskView, UserId};
use crate::planner::StudyPlanner;
use crate::ports::PortResult;

const RULE: &str = "------------------------------------";

/// Stored name, then the registry name, then the raw id.
pub fn display_name(task: &ScheduleTask, names: &HashMap<SubjectId, String>) -> String {
    if let Some(name) = task.subject_name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match task.subject_id {
        Some(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
        None => "(unnamed)".to_string(),
    }
}

fn status_label(view: &TaskView) -> &'static str {
    match view.task.status {
        TaskStatus::Completed => "completed",
        TaskStatus::Pending if view.late => "late",
        TaskStatus::Pending => "pending",
    }
}

/// `subject | minutes | pages | status`
pub fn schedule_to_text(tasks: &[TaskView], names: &HashMap<SubjectId, String>) -> String {
    let mut lines = vec![
        "Review schedule:".to_string(),
        "Subject | Time (min) | Pages | Status".to_string(),
        RULE.to_string(),
    ];
    lines.extend(tasks.iter().map(|v| {
        format!(
            "{} | {} | {} | {}",
            display_name(&v.task, names),
            v.task.minutes,
            v.task.pages,
            status_label(v)
        )
    }));
    lines.join("\n")
}

/// `subject | date | pages | status`
pub fn achievements_to_text(items: &[ScheduleTask], names: &HashMap<SubjectId, String>) -> String {
    let mut lines = vec![
        "Achievement log:".to_string(),
        "Subject | Date | Pages | Status".to_string(),
        RULE.to_string(),
    ];
    lines.extend(items.iter().map(|t| {
        format!(
            "{} | {} | {} | {}",
            display_name(t, names),
            t.date_id,
            t.pages,
            t.status
        )
    }));
    lines.join("\n")
}

impl StudyPlanner {
    /// Today's board as text, pending rows first.
    pub async fn export_schedule(&self, user_id: UserId) -> PortResult<String> {
        let board = self.day_board(user_id).await?;
        let names = self.subject_names(user_id).await?;
        let rows: Vec<TaskView> = board.all().cloned().collect();
        Ok(schedule_to_text(&rows, &names))
    }

    pub async fn export_achievements(&self, user_id: UserId, range: ReportRange) -> PortResult<String> {
        let report = self.report(user_id, range).await?;
        let names = self.subject_names(user_id).await?;
        Ok(achievements_to_text(&report.items, &names))
    }
}
