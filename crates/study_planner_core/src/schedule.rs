//! crates/study_planner_core/src/schedule.rs
//!
//! The schedule generator: turns a day's studied subjects, exam deadlines and
//! available time into prioritized task creation requests. Pure; persisting the
//! requests is the caller's job (see `StudyPlanner::generate_schedule`).

use chrono::NaiveDate;

use crate::domain::{ExamInput, NewTask, Priority, StudyInput, TaskSource};
use crate::time::days_until;

/// Floor for an exam task's allocation.
pub const EXAM_MIN_MINUTES: u32 = 30;
/// Floor for the whole study budget.
pub const BUDGET_MIN_MINUTES: u32 = 30;
/// Floor for a single studied subject's share.
pub const SHARE_MIN_MINUTES: u32 = 15;
/// Exams due within this many days are high priority.
pub const URGENT_EXAM_DAYS: i64 = 3;

fn hours_to_minutes(hours: f64) -> u32 {
    let minutes = (hours * 60.0).round();
    if minutes.is_finite() && minutes > 0.0 {
        minutes.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

pub fn exam_priority(days_left: i64) -> Priority {
    if days_left <= URGENT_EXAM_DAYS {
        Priority::High
    } else {
        Priority::Med
    }
}

/// One exam task; emitted whatever the day's budget is.
pub fn plan_exam(today: NaiveDate, exam: &ExamInput) -> NewTask {
    let days_left = days_until(today, exam.due_date);
    NewTask {
        subject_id: None,
        subject_name: Some(exam.subject_name.clone()),
        pages: exam.pages,
        minutes: hours_to_minutes(exam.required_hours).max(EXAM_MIN_MINUTES),
        priority: exam_priority(days_left),
        source: TaskSource::Exam,
        note: None,
        pulled_from: None,
    }
}

pub fn total_budget(available_hours: f64) -> u32 {
    hours_to_minutes(available_hours).max(BUDGET_MIN_MINUTES)
}

/// Low focus and reported difficulty each add one share of time.
pub fn study_weight(input: &StudyInput) -> u32 {
    1 + u32::from(input.focus < 3) + u32::from(input.has_difficulty())
}

/// Splits the day's budget across studied subjects in proportion to weight.
pub fn plan_studied(studied: &[StudyInput], available_hours: f64) -> Vec<NewTask> {
    let budget = f64::from(total_budget(available_hours));
    let weights: Vec<u32> = studied.iter().map(study_weight).collect();
    let weight_sum: u32 = weights.iter().sum();
    if weight_sum == 0 {
        return Vec::new();
    }

    studied
        .iter()
        .zip(weights)
        .map(|(input, weight)| {
            let share = (budget * f64::from(weight) / f64::from(weight_sum)).round() as u32;
            NewTask {
                subject_id: Some(input.subject_id),
                subject_name: None,
                pages: input.pages,
                minutes: share.max(SHARE_MIN_MINUTES),
                priority: if input.needs_attention() {
                    Priority::High
                } else {
                    Priority::Low
                },
                source: TaskSource::Entry,
                note: input.note.clone(),
                pulled_from: None,
            }
        })
        .collect()
}

/// Exam tasks first, in input order, then the studied subjects in input order.
pub fn plan_schedule(
    today: NaiveDate,
    studied: &[StudyInput],
    exams: &[ExamInput],
    available_hours: f64,
) -> Vec<NewTask> {
    let mut tasks: Vec<NewTask> = exams.iter().map(|exam| plan_exam(today, exam)).collect();
    tasks.extend(plan_studied(studied, available_hours));
    tasks
}
