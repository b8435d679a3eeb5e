//! crates/study_planner_core/src/planner.rs
//!
//! The planner context: one value owning the store handle, the calendar and the
//! regeneration policy. Operations live in `entries`, `lifecycle`, `subjects`,
//! `achievements` and `export` as further `impl StudyPlanner` blocks.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::ports::StudyStore;
use crate::time::StudyCalendar;

/// What generating a schedule does to tasks already generated for the same day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegenerationPolicy {
    /// Pending generated tasks of the day are dropped first. Completed and
    /// pulled-forward tasks are kept.
    #[default]
    Replace,
    /// New tasks are added next to whatever is already there.
    Append,
}

impl FromStr for RegenerationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(format!("'{}' is not one of: replace, append", other)),
        }
    }
}

impl fmt::Display for RegenerationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Append => f.write_str("append"),
        }
    }
}

#[derive(Clone)]
pub struct StudyPlanner {
    pub(crate) store: Arc<dyn StudyStore>,
    pub(crate) calendar: StudyCalendar,
    pub(crate) regeneration: RegenerationPolicy,
}

impl StudyPlanner {
    pub fn new(store: Arc<dyn StudyStore>, calendar: StudyCalendar) -> Self {
        Self {
            store,
            calendar,
            regeneration: RegenerationPolicy::default(),
        }
    }

    pub fn with_regeneration(mut self, policy: RegenerationPolicy) -> Self {
        self.regeneration = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn StudyStore> {
        &self.store
    }

    pub fn calendar(&self) -> &StudyCalendar {
        &self.calendar
    }

    pub fn regeneration(&self) -> RegenerationPolicy {
        self.regeneration
    }
}

impl fmt::Debug for StudyPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyPlanner")
            .field("calendar", &self.calendar)
            .field("regeneration", &self.regeneration)
            .finish()
    }
}
