//! crates/study_planner_core/src/subjects.rs
//!
//! The subject registry and the background repair pass over a user's records.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Subject, SubjectId, UserId};
use crate::planner::StudyPlanner;
use crate::ports::{PortError, PortResult};

/// Counts of what a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub removed_blank_subjects: usize,
    pub removed_duplicate_subjects: usize,
    pub backfilled_subjects: usize,
    pub backfilled_entries: usize,
    pub backfilled_late_tasks: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

fn clean_name(name: &str) -> PortResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortError::Invalid("subject name is empty".to_string()));
    }
    Ok(name.to_string())
}

fn ensure_unique(subjects: &[Subject], name: &str, except: Option<SubjectId>) -> PortResult<()> {
    let taken = subjects
        .iter()
        .any(|s| Some(s.id) != except && s.name.trim() == name);
    if taken {
        return Err(PortError::Invalid(format!(
            "a subject named '{}' already exists",
            name
        )));
    }
    Ok(())
}

impl StudyPlanner {
    pub async fn list_subjects(&self, user_id: UserId) -> PortResult<Vec<Subject>> {
        self.store.list_subjects(user_id).await
    }

    /// Subject id to display name, for resolving task rows.
    pub async fn subject_names(&self, user_id: UserId) -> PortResult<HashMap<SubjectId, String>> {
        Ok(self
            .store
            .list_subjects(user_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect())
    }

    pub async fn add_subject(&self, user_id: UserId, name: &str) -> PortResult<Subject> {
        let name = clean_name(name)?;
        let existing = self.store.list_subjects(user_id).await?;
        ensure_unique(&existing, &name, None)?;

        let subject = Subject {
            id: Uuid::new_v4(),
            name,
            active: true,
            created_at: Some(self.calendar.now()),
        };
        self.store.save_subject(user_id, &subject).await?;
        info!(%user_id, subject = %subject.id, "Added subject");
        Ok(subject)
    }

    pub async fn rename_subject(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        name: &str,
    ) -> PortResult<Subject> {
        let name = clean_name(name)?;
        let existing = self.store.list_subjects(user_id).await?;
        ensure_unique(&existing, &name, Some(subject_id))?;

        let mut subject = self.store.get_subject(user_id, subject_id).await?;
        subject.name = name;
        self.store.save_subject(user_id, &subject).await?;
        Ok(subject)
    }

    pub async fn set_subject_active(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        active: bool,
    ) -> PortResult<Subject> {
        let mut subject = self.store.get_subject(user_id, subject_id).await?;
        subject.active = active;
        self.store.save_subject(user_id, &subject).await?;
        Ok(subject)
    }

    /// Tasks that name this subject keep their id and fall back to it for display.
    pub async fn remove_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<()> {
        self.store.get_subject(user_id, subject_id).await?;
        self.store.remove_subject(user_id, subject_id).await?;
        info!(%user_id, subject = %subject_id, "Removed subject");
        Ok(())
    }

    /// Reconciles a user's records: subjects with blank names go, later
    /// duplicates by name go (the oldest is kept), and missing `active` /
    /// timestamp fields are backfilled.
    pub async fn repair_user_data(&self, user_id: UserId) -> PortResult<RepairReport> {
        let now = self.calendar.now();
        let mut report = RepairReport::default();

        let mut subjects = self.store.list_subjects(user_id).await?;
        // Unset timestamps sort first, as they predate the field.
        subjects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut seen = HashSet::new();
        for mut subject in subjects {
            let name = subject.name.trim().to_string();
            if name.is_empty() {
                self.store.remove_subject(user_id, subject.id).await?;
                report.removed_blank_subjects += 1;
                continue;
            }
            if !seen.insert(name.clone()) {
                self.store.remove_subject(user_id, subject.id).await?;
                report.removed_duplicate_subjects += 1;
                continue;
            }
            if subject.created_at.is_none() || subject.name != name {
                subject.created_at.get_or_insert(now);
                subject.name = name;
                self.store.save_subject(user_id, &subject).await?;
                report.backfilled_subjects += 1;
            }
        }

        for entry in self.store.list_entries(user_id).await? {
            if entry.updated_at.is_none() {
                self.store.touch_entry(user_id, entry.date_id, now).await?;
                report.backfilled_entries += 1;
            }
        }

        for late in self.store.list_late_tasks(user_id).await? {
            if late.created_at.is_none() {
                self.store.touch_late_task(user_id, late.id, now).await?;
                report.backfilled_late_tasks += 1;
            }
        }

        if !report.is_clean() {
            info!(%user_id, ?report, "Repaired user data");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailyEntry, LateTask, TaskRef, TaskSource};
    use crate::planner::testing::{day, Fixture};
    use crate::ports::StudyStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn add_subject_trims_and_rejects_blank_or_duplicate_names() {
        let fx = Fixture::at(2024, 1, 15);
        let math = fx.planner.add_subject(fx.user, "  Math ").await.unwrap();
        assert_eq!(math.name, "Math");
        assert!(math.active);
        assert!(math.created_at.is_some());

        let blank = fx.planner.add_subject(fx.user, "   ").await.unwrap_err();
        assert!(matches!(blank, PortError::Invalid(_)));
        let dup = fx.planner.add_subject(fx.user, "Math").await.unwrap_err();
        assert!(matches!(dup, PortError::Invalid(_)));

        assert_eq!(fx.planner.list_subjects(fx.user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rename_allows_keeping_the_same_name_but_not_taking_another() {
        let fx = Fixture::at(2024, 1, 15);
        let math = fx.planner.add_subject(fx.user, "Math").await.unwrap();
        fx.planner.add_subject(fx.user, "Physics").await.unwrap();

        assert!(fx.planner.rename_subject(fx.user, math.id, "Math").await.is_ok());
        let err = fx.planner.rename_subject(fx.user, math.id, "Physics").await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));

        let renamed = fx.planner.rename_subject(fx.user, math.id, "Algebra").await.unwrap();
        let names = fx.planner.subject_names(fx.user).await.unwrap();
        assert_eq!(names.get(&renamed.id).map(String::as_str), Some("Algebra"));
    }

    #[tokio::test]
    async fn deactivate_and_remove() {
        let fx = Fixture::at(2024, 1, 15);
        let art = fx.planner.add_subject(fx.user, "Art").await.unwrap();
        let inactive = fx.planner.set_subject_active(fx.user, art.id, false).await.unwrap();
        assert!(!inactive.active);

        fx.planner.remove_subject(fx.user, art.id).await.unwrap();
        let err = fx.planner.remove_subject(fx.user, art.id).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn repair_keeps_first_seen_duplicates_and_backfills_timestamps() {
        let fx = Fixture::at(2024, 1, 15);
        let older = Utc::now() - Duration::days(30);
        let keep = Subject {
            id: Uuid::new_v4(),
            name: "Math".into(),
            active: true,
            created_at: Some(older),
        };
        let dup = Subject {
            id: Uuid::new_v4(),
            name: " Math ".into(),
            active: true,
            created_at: Some(older + Duration::days(1)),
        };
        let blank = Subject {
            id: Uuid::new_v4(),
            name: "  ".into(),
            active: true,
            created_at: None,
        };
        let legacy = Subject {
            id: Uuid::new_v4(),
            name: "History".into(),
            active: false,
            created_at: None,
        };
        for s in [&dup, &keep, &blank, &legacy] {
            fx.store.save_subject(fx.user, s).await.unwrap();
        }
        fx.store
            .save_entry(
                fx.user,
                &DailyEntry {
                    date_id: day(2024, 1, 10),
                    studied: vec![],
                    available_hours: 1.0,
                    exam_tasks: vec![],
                    preferences: Default::default(),
                    notifications: Default::default(),
                    updated_at: None,
                },
            )
            .await
            .unwrap();
        fx.store
            .insert_late_task(
                fx.user,
                &LateTask {
                    id: Uuid::new_v4(),
                    origin: TaskRef::new(day(2024, 1, 10), Uuid::new_v4()),
                    subject_id: None,
                    subject_name: Some("Math".into()),
                    pages: 3,
                    minutes: 30,
                    source: TaskSource::Entry,
                    created_at: None,
                },
            )
            .await
            .unwrap();

        let report = fx.planner.repair_user_data(fx.user).await.unwrap();
        assert_eq!(
            report,
            RepairReport {
                removed_blank_subjects: 1,
                removed_duplicate_subjects: 1,
                backfilled_subjects: 1,
                backfilled_entries: 1,
                backfilled_late_tasks: 1,
            }
        );

        let subjects = fx.planner.list_subjects(fx.user).await.unwrap();
        let ids: HashSet<_> = subjects.iter().map(|s| s.id).collect();
        assert_eq!(ids, HashSet::from([keep.id, legacy.id]));
        assert!(subjects.iter().all(|s| s.created_at.is_some()));
        // Explicit inactive flags survive the pass.
        assert!(subjects.iter().any(|s| s.id == legacy.id && !s.active));

        assert!(fx.planner.repair_user_data(fx.user).await.unwrap().is_clean());
    }
}
