use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// `HH:MM:SS`; hours keep growing past 99, negative spans read as zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Human duration for summaries: "2 hours 30 minutes", "1 hour", "45 seconds".
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    if hours == 0 && minutes == 0 {
        return plural(secs, "second");
    }

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    parts.join(" ")
}

/// Start instant for a shift: the caregiver's local date and time when both
/// are given, otherwise `now`.
pub fn resolve_start_time(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match (date, time) {
        (Some(date), Some(time)) => offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(now),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_zero_padded() {
        assert_eq!(format_elapsed(Duration::seconds(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::seconds(3 * 3600 + 7 * 60 + 9)), "03:07:09");
        assert_eq!(format_elapsed(Duration::hours(123)), "123:00:00");
        assert_eq!(format_elapsed(Duration::seconds(-40)), "00:00:00");
    }

    #[test]
    fn elapsed_never_goes_backwards() {
        let mut last = String::new();
        for s in (0..20_000).step_by(37) {
            let now = format_elapsed(Duration::seconds(s));
            assert_eq!(now.len(), 8);
            assert!(now >= last, "{} < {}", now, last);
            last = now;
        }
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(Duration::minutes(150)), "2 hours 30 minutes");
        assert_eq!(format_duration(Duration::hours(1)), "1 hour");
        assert_eq!(format_duration(Duration::minutes(45)), "45 minutes");
        assert_eq!(format_duration(Duration::minutes(61)), "1 hour 1 minute");
        assert_eq!(format_duration(Duration::seconds(30)), "30 seconds");
    }

    #[test]
    fn explicit_start_uses_local_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let time = NaiveTime::from_hms_opt(9, 0, 0);

        let start = resolve_start_time(date, time, offset, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap());
        assert_eq!(resolve_start_time(date, None, offset, now), now);
    }
}
