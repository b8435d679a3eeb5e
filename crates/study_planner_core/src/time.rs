//! crates/study_planner_core/src/time.rs
//!
//! Resolves "today" in the planner's fixed timezone and enumerates calendar days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, RwLock};

use crate::domain::DateId;

/// The zone that defines day boundaries unless configured otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Muscat;

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and demos.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Calendar bound to a timezone and a clock.
#[derive(Clone)]
pub struct StudyCalendar {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl StudyCalendar {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's date in the calendar's zone, whatever the host zone is.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.tz).date_naive()
    }

    pub fn today_id(&self) -> DateId {
        date_id(self.today())
    }
}

impl std::fmt::Debug for StudyCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyCalendar").field("tz", &self.tz).finish()
    }
}

pub fn date_id(date: NaiveDate) -> DateId {
    DateId::new(date)
}

/// Inclusive, ordered run of days from `start` to `end`. Empty when `end < start`.
/// The iterator is `Clone`, so a range can be walked again from the start.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> + Clone {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Whole days from `today` until `due`; negative once the due date has passed.
pub fn days_until(today: NaiveDate, due: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Sunday through Saturday of the week containing `today`.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let sunday = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    (sunday, sunday + Duration::days(6))
}

/// First through last day of the calendar month containing `today`.
pub fn month_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    (first, last)
}
