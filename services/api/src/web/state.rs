//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::collections::HashSet;
use std::sync::Arc;
use study_planner_core::ports::StudyStore;
use study_planner_core::{StudyCalendar, StudyPlanner, UserId};
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn StudyStore>,
    pub config: Arc<Config>,
    pub planner: StudyPlanner,
    /// Users whose records were already repaired by this process.
    pub repaired_users: Mutex<HashSet<UserId>>,
}

impl AppState {
    pub fn new(db: Arc<dyn StudyStore>, config: Arc<Config>, calendar: StudyCalendar) -> Self {
        let planner = StudyPlanner::new(db.clone(), calendar).with_regeneration(config.regeneration);
        Self {
            db,
            config,
            planner,
            repaired_users: Mutex::new(HashSet::new()),
        }
    }
}
