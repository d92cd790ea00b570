use crate::error::SchedulerError;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};

/// The tutor's civil time zone, injected at construction.
///
/// All parsing and display happens in this fixed offset; storage and
/// comparison stay in UTC. The offset is never attached per record.
#[derive(Debug, Clone, Copy)]
pub struct TimeSettings {
    offset: FixedOffset,
}

fn invalid(msg: &str) -> SchedulerError {
    SchedulerError::InvalidDateTime(msg.to_string())
}

fn two_digits(field: &str) -> Option<u32> {
    if field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().ok()
    } else {
        None
    }
}

fn four_digit_year(field: &str) -> Option<i32> {
    if field.len() == 4 && field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().ok()
    } else {
        None
    }
}

impl TimeSettings {
    /// Builds settings from a whole-hour offset east of UTC.
    pub fn from_hours(hours: i32) -> Result<Self, SchedulerError> {
        let offset = FixedOffset::east_opt(hours * 3600)
            .ok_or_else(|| invalid("UTC offset out of range"))?;
        Ok(Self { offset })
    }

    /// Converts civil date/time fields in the fixed offset to a UTC instant.
    pub fn civil_to_utc(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Result<DateTime<Utc>, SchedulerError> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return Err(invalid("Use DD.MM or DD.MM.YYYY."));
        }
        if hour > 23 || minute > 59 {
            return Err(invalid("Use HH:MM with a valid hour."));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| invalid("That day does not exist."))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| invalid("Use HH:MM with a valid hour."))?;
        let local = self
            .offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .ok_or_else(|| invalid("That time does not exist."))?;
        Ok(local.with_timezone(&Utc))
    }

    /// Parses `DD.MM` or `DD.MM.YYYY`; the year defaults to the current year
    /// in the fixed offset.
    pub fn parse_date(
        &self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<(u32, u32, i32), SchedulerError> {
        let parts: Vec<&str> = input.split('.').collect();
        let (day_str, month_str, year_str) = match parts.as_slice() {
            [d, m] => (*d, *m, None),
            [d, m, y] => (*d, *m, Some(*y)),
            _ => return Err(invalid("Use DD.MM or DD.MM.YYYY.")),
        };
        let day = two_digits(day_str).ok_or_else(|| invalid("Use DD.MM or DD.MM.YYYY."))?;
        let month = two_digits(month_str).ok_or_else(|| invalid("Use DD.MM or DD.MM.YYYY."))?;
        let year = match year_str {
            Some(y) => four_digit_year(y).ok_or_else(|| invalid("Use DD.MM or DD.MM.YYYY."))?,
            None => now.with_timezone(&self.offset).year(),
        };
        Ok((day, month, year))
    }

    /// Parses `HH:MM` into hour and minute. Both fields must be exactly two
    /// digits.
    pub fn parse_time(&self, input: &str) -> Result<(u32, u32), SchedulerError> {
        let (hour_str, minute_str) = input
            .split_once(':')
            .ok_or_else(|| invalid("Use HH:MM."))?;
        let hour = two_digits(hour_str).ok_or_else(|| invalid("Use HH:MM."))?;
        let minute = two_digits(minute_str).ok_or_else(|| invalid("Use HH:MM."))?;
        if hour > 23 || minute > 59 {
            return Err(invalid("Use HH:MM with a valid hour."));
        }
        Ok((hour, minute))
    }

    /// Normalizes separate form fields (`YYYY-MM-DD` + `HH:MM`) to a UTC
    /// instant, truncating minutes to the whole hour.
    pub fn from_form_fields(&self, date: &str, time: &str) -> Result<DateTime<Utc>, SchedulerError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| invalid("Use YYYY-MM-DD for the date."))?;
        let (hour, _minute) = self.parse_time(time.trim())?;
        self.civil_to_utc(date.year(), date.month(), date.day(), hour, 0)
    }

    /// Normalizes a combined `YYYY-MM-DDTHH:MM` field (as posted by a
    /// `datetime-local` input), truncating minutes to the whole hour.
    pub fn from_combined(&self, input: &str) -> Result<DateTime<Utc>, SchedulerError> {
        let naive = NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%dT%H:%M")
            .map_err(|_| invalid("Use YYYY-MM-DDTHH:MM."))?;
        self.civil_to_utc(
            naive.year(),
            naive.month(),
            naive.day(),
            naive.hour(),
            0,
        )
    }

    /// Renders `DD.MM.YYYY` in the fixed offset.
    pub fn format_date(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%d.%m.%Y")
            .to_string()
    }

    /// Renders `HH:MM` in the fixed offset.
    pub fn format_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%H:%M")
            .to_string()
    }

    /// The half-open `[midnight, midnight+24h)` of the current civil day in
    /// the fixed offset, as UTC instants.
    pub fn day_bounds(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedulerError> {
        let today = now.with_timezone(&self.offset).date_naive();
        let midnight = self
            .offset
            .from_local_datetime(&NaiveDateTime::new(today, NaiveTime::MIN))
            .single()
            .ok_or_else(|| invalid("could not resolve local midnight"))?;
        let start = midnight.with_timezone(&Utc);
        Ok((start, start + Duration::hours(24)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moscow() -> TimeSettings {
        TimeSettings::from_hours(3).unwrap()
    }

    #[test]
    fn civil_to_utc_applies_offset() {
        let time = moscow();
        let instant = time.civil_to_utc(2025, 2, 15, 14, 0).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 2, 15, 11, 0, 0).unwrap());
    }

    #[test]
    fn civil_to_utc_rejects_out_of_range_fields() {
        let time = moscow();
        assert!(time.civil_to_utc(2025, 13, 1, 10, 0).is_err());
        assert!(time.civil_to_utc(2025, 2, 32, 10, 0).is_err());
        assert!(time.civil_to_utc(2025, 2, 15, 24, 0).is_err());
        // 31.02 passes the range pre-check but is not a real day
        assert!(time.civil_to_utc(2025, 2, 31, 10, 0).is_err());
    }

    #[test]
    fn parse_date_defaults_to_current_year() {
        let time = moscow();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(time.parse_date("15.02", now).unwrap(), (15, 2, 2025));
        assert_eq!(time.parse_date("01.09.2026", now).unwrap(), (1, 9, 2026));
        assert!(time.parse_date("15", now).is_err());
        assert!(time.parse_date("aa.bb", now).is_err());
        assert!(time.parse_date("15.02.26.1", now).is_err());
    }

    #[test]
    fn parse_date_requires_two_digit_fields() {
        let time = moscow();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(time.parse_date("015.02", now).is_err());
        assert!(time.parse_date("15.2", now).is_err());
        assert!(time.parse_date("1.02", now).is_err());
        assert!(time.parse_date("15.02.26", now).is_err());
        assert!(time.parse_date("+5.02", now).is_err());
    }

    #[test]
    fn parse_time_requires_hh_mm() {
        let time = moscow();
        assert_eq!(time.parse_time("14:00").unwrap(), (14, 0));
        assert_eq!(time.parse_time("09:30").unwrap(), (9, 30));
        assert!(time.parse_time("14").is_err());
        assert!(time.parse_time("25:00").is_err());
        assert!(time.parse_time("14:60").is_err());
        assert!(time.parse_time("now").is_err());
    }

    #[test]
    fn parse_time_requires_two_digit_fields() {
        let time = moscow();
        assert!(time.parse_time("14:0").is_err());
        assert!(time.parse_time("4:00").is_err());
        assert!(time.parse_time("014:00").is_err());
        assert!(time.parse_time("+4:00").is_err());
    }

    #[test]
    fn combined_form_value_truncates_to_whole_hour() {
        let time = moscow();
        let instant = time.from_combined("2025-02-15T18:37").unwrap();
        assert_eq!(time.format_date(instant), "15.02.2025");
        assert_eq!(time.format_time(instant), "18:00");
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 2, 15, 15, 0, 0).unwrap());
    }

    #[test]
    fn form_fields_truncate_to_whole_hour() {
        let time = moscow();
        let instant = time.from_form_fields("2025-02-15", "14:45").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 2, 15, 11, 0, 0).unwrap());
        assert!(time.from_form_fields("15.02.2025", "14:00").is_err());
    }

    #[test]
    fn day_bounds_are_half_open_in_the_fixed_offset() {
        let time = moscow();
        // 23:30 Moscow on 15.02 is 20:30 UTC
        let now = Utc.with_ymd_and_hms(2025, 2, 15, 20, 30, 0).unwrap();
        let (start, end) = time.day_bounds(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 14, 21, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 15, 21, 0, 0).unwrap());
    }
}
