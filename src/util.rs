//! Extra utilities for use elsewhere in the API.

use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::error::{CrescendoError, CrescendoResult};

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn parse_date(raw: &str) -> CrescendoResult<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| CrescendoError::Validation(format!("Invalid date {raw:?}, expected YYYY-MM-DD")))
}

pub fn parse_time(raw: &str) -> CrescendoResult<Time> {
    let raw_trimmed = raw.trim();
    Time::parse(raw_trimmed, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(raw_trimmed, format_description!("[hour]:[minute]:[second]")))
        .map_err(|_| CrescendoError::Validation(format!("Invalid time {raw:?}, expected HH:MM")))
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_time(time: Time) -> String {
    time.format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| time.to_string())
}

/// Serializes a [Date] as `YYYY-MM-DD`.
pub mod date_format {
    use serde::Serializer;
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }
}

/// Serializes a [Time] as `HH:MM`.
pub mod time_format {
    use serde::Serializer;
    use time::Time;

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }
}
