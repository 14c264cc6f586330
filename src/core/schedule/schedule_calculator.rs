use crate::model::core::backup::job::Schedule;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub struct ScheduleCalculator;

impl ScheduleCalculator {
    /// Next instant strictly after `now` at which `schedule` fires.
    ///
    /// `None` means the job must not be scheduled: manual jobs, zero-length
    /// intervals and days of month outside `1..=31`.
    pub fn next_run(schedule: &Schedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match *schedule {
            Schedule::Manual => None,
            Schedule::EveryMinutes(minutes) => {
                (minutes > 0).then(|| now + Duration::minutes(minutes as i64))
            }
            Schedule::EveryHours(hours) => (hours > 0).then(|| now + Duration::hours(hours as i64)),
            Schedule::Daily(time) => Some(Self::next_daily(time, now)),
            Schedule::Weekly(weekday, time) => Some(Self::next_weekly(weekday, time, now)),
            Schedule::Monthly(day, time) => Self::next_monthly(day, time, now),
        }
    }

    fn next_daily(time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(time);
        if today <= now {
            today + Duration::days(1)
        } else {
            today
        }
    }

    fn next_weekly(weekday: Weekday, time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
        let target = weekday.num_days_from_monday() as i64;
        let current = now.weekday().num_days_from_monday() as i64;
        let days_ahead = (target - current).rem_euclid(7);
        let candidate = (now.date() + Duration::days(days_ahead)).and_time(time);
        if candidate <= now {
            candidate + Duration::days(7)
        } else {
            candidate
        }
    }

    fn next_monthly(day: u32, time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !(1..=31).contains(&day) {
            return None;
        }
        let candidate = Self::clamped_date(now.year(), now.month(), day)?.and_time(time);
        if candidate > now {
            return Some(candidate);
        }
        let (year, month) = if now.month() == 12 {
            (now.year() + 1, 1)
        } else {
            (now.year(), now.month() + 1)
        };
        Some(Self::clamped_date(year, month, day)?.and_time(time))
    }

    // `day` of the given month, or its last day when the month is shorter.
    fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        let last_day = Self::days_in_month(year, month)?;
        NaiveDate::from_ymd_opt(year, month, day.min(last_day))
    }

    fn days_in_month(year: i32, month: u32) -> Option<u32> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(next_first.signed_duration_since(first).num_days() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn manual_never_runs() {
        assert_eq!(
            ScheduleCalculator::next_run(&Schedule::Manual, at(2026, 3, 1, 8, 0)),
            None
        );
    }

    #[test]
    fn intervals_are_relative_to_now() {
        let now = at(2026, 3, 1, 23, 50);
        assert_eq!(
            ScheduleCalculator::next_run(&Schedule::EveryMinutes(15), now),
            Some(at(2026, 3, 2, 0, 5))
        );
        assert_eq!(
            ScheduleCalculator::next_run(&Schedule::EveryHours(2), now),
            Some(at(2026, 3, 2, 1, 50))
        );
        assert_eq!(ScheduleCalculator::next_run(&Schedule::EveryMinutes(0), now), None);
        assert_eq!(ScheduleCalculator::next_run(&Schedule::EveryHours(0), now), None);
    }

    #[test]
    fn daily_before_time_runs_today() {
        let schedule = Schedule::Daily(time(9, 0));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 3, 10, 8, 59)),
            Some(at(2026, 3, 10, 9, 0))
        );
    }

    #[test]
    fn daily_at_or_after_time_runs_tomorrow() {
        let schedule = Schedule::Daily(time(9, 0));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 3, 10, 9, 0)),
            Some(at(2026, 3, 11, 9, 0))
        );
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 12, 31, 22, 0)),
            Some(at(2027, 1, 1, 9, 0))
        );
    }

    #[test]
    fn weekly_same_day_after_time_skips_a_week() {
        // 2026-03-11 is a Wednesday
        let schedule = Schedule::Weekly(Weekday::Wed, time(9, 0));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 3, 11, 10, 0)),
            Some(at(2026, 3, 18, 9, 0))
        );
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 3, 11, 8, 0)),
            Some(at(2026, 3, 11, 9, 0))
        );
    }

    #[test]
    fn weekly_finds_the_next_matching_weekday() {
        let schedule = Schedule::Weekly(Weekday::Mon, time(6, 30));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 3, 11, 10, 0)),
            Some(at(2026, 3, 16, 6, 30))
        );
    }

    #[test]
    fn monthly_clamps_to_last_day_of_short_month() {
        let schedule = Schedule::Monthly(31, time(2, 0));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 4, 10, 12, 0)),
            Some(at(2026, 4, 30, 2, 0))
        );
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 1, 31, 3, 0)),
            Some(at(2026, 2, 28, 2, 0))
        );
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2028, 1, 31, 3, 0)),
            Some(at(2028, 2, 29, 2, 0))
        );
    }

    #[test]
    fn monthly_rolls_over_december() {
        let schedule = Schedule::Monthly(5, time(2, 0));
        assert_eq!(
            ScheduleCalculator::next_run(&schedule, at(2026, 12, 5, 2, 0)),
            Some(at(2027, 1, 5, 2, 0))
        );
    }

    #[test]
    fn monthly_rejects_days_outside_the_month_range() {
        let now = at(2026, 3, 1, 0, 0);
        assert_eq!(
            ScheduleCalculator::next_run(&Schedule::Monthly(0, time(1, 0)), now),
            None
        );
        assert_eq!(
            ScheduleCalculator::next_run(&Schedule::Monthly(32, time(1, 0)), now),
            None
        );
    }

    #[test]
    fn next_run_is_always_after_now() {
        let now = at(2026, 6, 30, 23, 59);
        let schedules = [
            Schedule::EveryMinutes(1),
            Schedule::EveryHours(1),
            Schedule::Daily(time(23, 59)),
            Schedule::Weekly(now.weekday(), time(23, 59)),
            Schedule::Monthly(30, time(23, 59)),
        ];
        for schedule in schedules {
            let next = ScheduleCalculator::next_run(&schedule, now).unwrap();
            assert!(next > now, "{schedule:?} produced {next}");
        }
    }
}
