use time::OffsetDateTime;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

const UNITS: [(i64, &str); 6] = [
    (YEAR, "year"),
    (MONTH, "month"),
    (WEEK, "week"),
    (DAY, "day"),
    (HOUR, "hour"),
    (MINUTE, "minute"),
];

/// Describes how far `timestamp` lies from `now`, e.g. "5 minutes ago" or
/// "2 days from now". Anything under a minute is "moments".
pub fn format_relative_age(timestamp: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = (now - timestamp).whole_seconds();
    let suffix = if delta >= 0 { "ago" } else { "from now" };
    let seconds = delta.unsigned_abs() as i64;

    for (unit_seconds, unit) in UNITS {
        let count = seconds / unit_seconds;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {unit}{plural} {suffix}");
        }
    }
    format!("moments {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-06-15 12:00 UTC);

    #[test]
    fn under_a_minute_is_moments() {
        assert_eq!(format_relative_age(NOW, NOW), "moments ago");
        assert_eq!(
            format_relative_age(NOW - Duration::seconds(59), NOW),
            "moments ago"
        );
        assert_eq!(
            format_relative_age(NOW + Duration::seconds(30), NOW),
            "moments from now"
        );
    }

    #[test]
    fn picks_largest_whole_unit() {
        let cases = [
            (Duration::minutes(1), "1 minute ago"),
            (Duration::minutes(10), "10 minutes ago"),
            (Duration::hours(3), "3 hours ago"),
            (Duration::days(1), "1 day ago"),
            (Duration::days(14), "2 weeks ago"),
            (Duration::days(65), "2 months ago"),
            (Duration::days(800), "2 years ago"),
        ];
        for (offset, expected) in cases {
            assert_eq!(format_relative_age(NOW - offset, NOW), expected);
        }
    }

    #[test]
    fn future_timestamps_read_from_now() {
        assert_eq!(
            format_relative_age(NOW + Duration::days(3), NOW),
            "3 days from now"
        );
    }
}
