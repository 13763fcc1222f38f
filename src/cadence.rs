use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::data::{BuilderState, Cadence};

/// When in the week or month a schedule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Weekly(Weekday),
    Monthly(u32),
}

impl Recurrence {
    pub fn from_state(state: &BuilderState) -> Self {
        match state.cadence {
            Cadence::Weekly => Recurrence::Weekly(state.weekly_day_of_week),
            Cadence::Monthly => Recurrence::Monthly(state.monthly_day_of_month),
        }
    }
}

/// Next occurrence strictly after `now`, in the schedule's wall-clock time.
///
/// Weekly schedules never fire on the current day: when today is the target
/// weekday the run rolls over to next week, whatever the time of day.
/// Returns `None` for an out-of-range hour or minute.
pub fn next_run(recurrence: Recurrence, hour: u32, minute: u32, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date();

    match recurrence {
        Recurrence::Weekly(target) => {
            let current = today.weekday().num_days_from_sunday();
            let days_until = match (target.num_days_from_sunday() + 7 - current) % 7 {
                0 => 7,
                n => n,
            };
            let date = today + Duration::days(i64::from(days_until));
            date.and_hms_opt(hour, minute, 0)
        }
        Recurrence::Monthly(day) => {
            let candidate = month_day(today.year(), today.month(), day)?.and_hms_opt(hour, minute, 0)?;
            if candidate > now {
                return Some(candidate);
            }
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            month_day(year, month, day)?.and_hms_opt(hour, minute, 0)
        }
    }
}

pub fn next_run_for(state: &BuilderState, now: NaiveDateTime) -> Option<NaiveDateTime> {
    next_run(Recurrence::from_state(state), state.send_hour, state.send_minute, now)
}

/// Day `day` of the month, clamped to the month's length
fn month_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// 12-hour clock, e.g. `9:05 AM`
pub fn format_time(hour: u32, minute: u32) -> String {
    let period = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

pub fn format_run(at: NaiveDateTime) -> String {
    format!(
        "{} at {}",
        at.format("%a, %b %-d, %Y"),
        format_time(at.hour(), at.minute())
    )
}

/// Collapsed summary for the cadence section
pub fn describe(state: &BuilderState, now: NaiveDateTime) -> String {
    let when = match Recurrence::from_state(state) {
        Recurrence::Weekly(day) => format!("Every {}", weekday_name(day)),
        Recurrence::Monthly(day) => format!("Monthly on the {}", ordinal(day)),
    };
    let base = format!(
        "{} at {} ({})",
        when,
        format_time(state.send_hour, state.send_minute),
        state.timezone
    );

    match next_run_for(state, now) {
        Some(at) => format!("{} · Next: {}", base, format_run(at)),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_weekly_same_day_rolls_a_full_week() {
        // 2026-10-20 is a Tuesday
        let now = at(2026, 10, 20, 6, 0);
        let next = next_run(Recurrence::Weekly(Weekday::Tue), 9, 0, now).unwrap();
        assert_eq!(next, at(2026, 10, 27, 9, 0));
    }

    #[test]
    fn test_weekly_later_in_week() {
        let now = at(2026, 10, 20, 18, 30);
        let next = next_run(Recurrence::Weekly(Weekday::Fri), 7, 15, now).unwrap();
        assert_eq!(next, at(2026, 10, 23, 7, 15));
    }

    #[test]
    fn test_weekly_wraps_to_next_week() {
        let now = at(2026, 10, 20, 8, 0);
        let next = next_run(Recurrence::Weekly(Weekday::Mon), 9, 0, now).unwrap();
        assert_eq!(next, at(2026, 10, 26, 9, 0));
    }

    #[test]
    fn test_monthly_later_this_month() {
        let now = at(2026, 10, 5, 12, 0);
        let next = next_run(Recurrence::Monthly(15), 9, 0, now).unwrap();
        assert_eq!(next, at(2026, 10, 15, 9, 0));
    }

    #[test]
    fn test_monthly_same_moment_is_not_future() {
        let now = at(2026, 10, 15, 9, 0);
        let next = next_run(Recurrence::Monthly(15), 9, 0, now).unwrap();
        assert_eq!(next, at(2026, 11, 15, 9, 0));
    }

    #[test]
    fn test_monthly_same_day_later_hour_stays_today() {
        let now = at(2026, 10, 15, 8, 0);
        let next = next_run(Recurrence::Monthly(15), 9, 0, now).unwrap();
        assert_eq!(next, at(2026, 10, 15, 9, 0));
    }

    #[test]
    fn test_monthly_december_rolls_into_january() {
        let now = at(2026, 12, 20, 9, 0);
        let next = next_run(Recurrence::Monthly(1), 9, 0, now).unwrap();
        assert_eq!(next, at(2027, 1, 1, 9, 0));
    }

    #[test]
    fn test_monthly_day_clamped_to_short_month() {
        let now = at(2027, 2, 1, 9, 0);
        let next = next_run(Recurrence::Monthly(31), 9, 0, now).unwrap();
        assert_eq!(next, at(2027, 2, 28, 9, 0));
    }

    #[test]
    fn test_invalid_time_yields_none() {
        let now = at(2026, 10, 20, 8, 0);
        assert!(next_run(Recurrence::Weekly(Weekday::Mon), 24, 0, now).is_none());
    }

    #[test]
    fn test_format_time_twelve_hour() {
        assert_eq!(format_time(0, 0), "12:00 AM");
        assert_eq!(format_time(9, 5), "9:05 AM");
        assert_eq!(format_time(12, 30), "12:30 PM");
        assert_eq!(format_time(17, 0), "5:00 PM");
    }

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_describe_weekly() {
        let mut state = BuilderState::default();
        state.weekly_day_of_week = Weekday::Tue;
        state.timezone = "America/Chicago".into();

        let summary = describe(&state, at(2026, 10, 20, 6, 0));
        assert_eq!(
            summary,
            "Every Tuesday at 9:00 AM (America/Chicago) · Next: Tue, Oct 27, 2026 at 9:00 AM"
        );
    }

    #[test]
    fn test_describe_monthly() {
        let mut state = BuilderState::default();
        state.cadence = Cadence::Monthly;
        state.monthly_day_of_month = 3;
        state.send_hour = 14;

        let summary = describe(&state, at(2026, 10, 20, 6, 0));
        assert!(summary.starts_with("Monthly on the 3rd at 2:00 PM"));
        assert!(summary.ends_with("Next: Tue, Nov 3, 2026 at 2:00 PM"));
    }
}
