use crate::types::WeekRange;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

/// The Monday-Sunday week holding `day`
pub fn week_containing(day: NaiveDate) -> WeekRange {
    let start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    let end = start + Duration::days(6);
    WeekRange {
        start,
        end,
        label: format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y")),
    }
}

/// Current week first, then each earlier week
pub fn past_weeks(today: NaiveDate, count: usize) -> Vec<WeekRange> {
    (0..count)
        .map(|i| week_containing(today - Duration::weeks(i as i64)))
        .collect()
}

pub fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

impl WeekRange {
    /// Inclusive on both ends: Monday 00:00 through Sunday 23:59:59.999 local time
    pub fn contains(&self, at: DateTime<Utc>, offset: FixedOffset) -> bool {
        let day = local_day(at, offset);
        self.start <= day && day <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weeks_start_on_monday() {
        let week = week_containing(day(2024, 1, 3));
        assert_eq!(week.start, day(2024, 1, 1));
        assert_eq!(week.end, day(2024, 1, 7));
        assert_eq!(week.label, "Jan 1 - Jan 7, 2024");

        assert_eq!(week_containing(day(2024, 1, 7)).start, day(2024, 1, 1));
        assert_eq!(week_containing(day(2024, 1, 8)).start, day(2024, 1, 8));
    }

    #[test]
    fn label_spans_year_end() {
        assert_eq!(week_containing(day(2024, 12, 31)).label, "Dec 30 - Jan 5, 2025");
    }

    #[test]
    fn rolling_list_is_newest_first() {
        let weeks = past_weeks(day(2024, 3, 14), 12);
        assert_eq!(weeks.len(), 12);
        assert_eq!(weeks[0].start, day(2024, 3, 11));
        assert_eq!(weeks[1].start, day(2024, 3, 4));
        assert_eq!(weeks[11].start, day(2023, 12, 25));
    }

    #[test]
    fn bounds_are_inclusive() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let week = week_containing(day(2024, 1, 1));
        assert!(week.contains(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), utc));
        assert!(week.contains(Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap(), utc));
        assert!(!week.contains(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(), utc));
        assert!(!week.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap(), utc));
    }

    #[test]
    fn days_are_cut_in_local_time() {
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let week = week_containing(day(2024, 1, 1));
        // Monday 02:00 UTC is still Sunday evening in UTC-5
        let late_sunday = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert!(!week.contains(late_sunday, eastern));
        assert_eq!(local_day(late_sunday, eastern), day(2023, 12, 31));
    }
}
