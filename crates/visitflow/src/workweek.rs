//! Work-week window calculator.
//!
//! Computes the "current" and "next" scheduling window from the configured
//! start/end weekday and close-of-business cutoff hour. Pure date
//! arithmetic: the caller supplies the reference instant, nothing here
//! reads a clock.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::config::WorkWeekConfig;
use crate::error::WorkWeekError;

/// Derived window boundaries. Recomputed per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWeekWindow {
    pub current_week_start: NaiveDateTime,
    pub current_week_end: NaiveDateTime,
    pub next_week_start: NaiveDateTime,
    pub next_week_end: NaiveDateTime,
}

/// Computes the work-week window around `reference`.
///
/// Weekday numbering follows JS `getDay`: 0 = Sunday. A reference instant
/// past the cutoff hour on the last work day counts as "weekend mode" and
/// rolls the current window forward to the upcoming week. A
/// `week_end_day` numerically below `week_start_day` denotes a week that
/// wraps past the natural week boundary.
pub fn compute_window(
    config: &WorkWeekConfig,
    reference: NaiveDateTime,
) -> Result<WorkWeekWindow, WorkWeekError> {
    if config.week_start_day > 6 {
        return Err(WorkWeekError::DayOutOfRange(config.week_start_day));
    }
    if config.week_end_day > 6 {
        return Err(WorkWeekError::DayOutOfRange(config.week_end_day));
    }
    let end_of_day = NaiveTime::from_hms_opt(u32::from(config.cutoff_hour), 0, 0)
        .ok_or(WorkWeekError::CutoffOutOfRange(config.cutoff_hour))?;

    let start = i64::from(config.week_start_day);
    let end = i64::from(config.week_end_day);
    let dow = i64::from(reference.weekday().num_days_from_sunday());

    // The work week is over once the cutoff hour on the last work day has
    // passed; the cutoff instant itself already counts.
    let weekend_mode = dow > end
        || dow < start
        || (dow == end && reference.hour() >= u32::from(config.cutoff_hour));

    let start_date = if weekend_mode {
        let mut forward = (start - dow).rem_euclid(7);
        if forward == 0 {
            // Reference is the start day but flagged weekend via the
            // cutoff rule; jump a full week, never zero.
            forward = 7;
        }
        reference.date() + Duration::days(forward)
    } else {
        let backward = (dow - start).rem_euclid(7);
        reference.date() - Duration::days(backward)
    };

    let days_to_add = if end < start {
        7 - start + end
    } else {
        end - start
    };

    let current_week_start = start_date.and_time(NaiveTime::MIN);
    let current_week_end = (start_date + Duration::days(days_to_add)).and_time(end_of_day);

    Ok(WorkWeekWindow {
        current_week_start,
        current_week_end,
        next_week_start: current_week_start + Duration::days(7),
        next_week_end: current_week_end + Duration::days(7),
    })
}
