use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Offset, TimeZone};

/// This is the standard way of showing a duration in stint. Hours are not wrapped at 24.
pub fn format_time(seconds: u64) -> String {
    let hh = seconds / 3600;
    let mm = (seconds % 3600) / 60;
    let ss = seconds % 60;
    format!("{hh:02}:{mm:02}:{ss:02}")
}

/// Returns Monday 00:00 of the week `date` belongs to. Weeks always start on Monday.
///
/// The step back is done on the local calendar date, so a DST change during the week doesn't
/// shift the result. If midnight is skipped by a transition, the instant that would have been
/// midnight at the offset of `date` is used.
pub fn week_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    let days_since_monday = date.weekday().num_days_from_monday() as u64;
    let tz = date.timezone();
    let midnight = (date.date_naive() - Days::new(days_since_monday)).and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight).earliest().unwrap_or_else(|| {
        let offset = Duration::seconds(date.offset().fix().local_minus_utc() as i64);
        tz.from_utc_datetime(&(midnight - offset))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{
        Datelike, FixedOffset, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
        Weekday,
    };

    use super::{format_time, week_start};

    /// Central European time around the end of summer time 2025. Clocks go from 03:00 CEST back
    /// to 02:00 CET on 2025-10-26 at 01:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct Berlin2025;

    impl Berlin2025 {
        fn summer() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn switch_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2025, 10, 26)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        }
    }

    impl TimeZone for Berlin2025 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Berlin2025
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> MappedLocalTime<FixedOffset> {
            let repeated_from = Self::switch_utc() + Self::winter();
            let repeated_until = Self::switch_utc() + Self::summer();
            if *local < repeated_from {
                MappedLocalTime::Single(Self::summer())
            } else if *local < repeated_until {
                MappedLocalTime::Ambiguous(Self::summer(), Self::winter())
            } else {
                MappedLocalTime::Single(Self::winter())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_utc() {
                Self::summer()
            } else {
                Self::winter()
            }
        }
    }

    #[test]
    fn format_time_pads_fields() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(59), "00:00:59");
        assert_eq!(format_time(3661), "01:01:01");
    }

    #[test]
    fn format_time_does_not_wrap_hours() {
        assert_eq!(format_time(90000), "25:00:00");
        assert_eq!(format_time(360000), "100:00:00");
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-16 is a Sunday
        let sunday = Utc.with_ymd_and_hms(2025, 3, 16, 18, 30, 0).unwrap();
        assert_eq!(
            week_start(sunday),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
        );

        let monday = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn week_start_survives_end_of_summer_time() {
        // Sunday evening, the week started on Monday 2025-10-20 under summer time
        let sunday = Berlin2025
            .with_ymd_and_hms(2025, 10, 26, 23, 30, 0)
            .unwrap();
        let start = week_start(sunday);

        assert_eq!(start.weekday(), Weekday::Mon);
        assert_eq!(
            start.naive_local(),
            NaiveDate::from_ymd_opt(2025, 10, 20)
                .unwrap()
                .and_time(NaiveTime::MIN)
        );
        assert_eq!(start.offset().local_minus_utc(), 2 * 3600);
    }
}
