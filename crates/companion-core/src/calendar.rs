use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate an IANA timezone name.
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidInput(format!("Invalid timezone: {}", timezone)))
}

/// The current calendar day in the service timezone. "Today" is always
/// evaluated here, never in UTC, so day boundaries match the people the
/// schedule is for.
pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

/// Parse a `YYYY-MM-DD` date. Anything else is rejected rather than
/// guessed at.
pub fn parse_date(input: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {}", input)))
}

/// Parse a clock time, accepting `HH:MM` or `HH:MM:SS`.
pub fn parse_time(input: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map_err(|_| CoreError::InvalidInput(format!("Invalid time (expected HH:MM or HH:MM:SS): {}", input)))
}

/// Canonical timestamp for a completion on the given day. Completions are
/// per-day facts; pinning them to noon keeps the stored instant inside the
/// day in every reasonable timezone rendering.
pub fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap()
}

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Every calendar day of the given month, in order.
pub fn month_dates(year: i32, month: u32) -> Result<Vec<NaiveDate>, CoreError> {
    let days = days_in_month(year, month)
        .ok_or_else(|| CoreError::InvalidInput(format!("Invalid month: {}-{}", year, month)))?;
    let mut dates = Vec::with_capacity(days as usize);
    for day in 1..=days {
        // Every day index below days_in_month names a real date.
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            dates.push(date);
        }
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Asia/Singapore").is_ok());
        assert!(validate_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-10-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 10, 3).unwrap()
        );
        assert!(parse_date("03/10/2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("today").is_err());
    }

    #[test]
    fn test_parse_time_accepts_both_precisions() {
        assert_eq!(
            parse_time("08:30").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("08:30:15").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 15).unwrap()
        );
        assert!(parse_time("8am").is_err());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn test_month_dates_cover_whole_month() {
        let dates = month_dates(2024, 2).unwrap();
        assert_eq!(dates.len(), 29);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(dates[28], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(month_dates(2024, 0).is_err());
    }

    #[test]
    fn test_noon_is_midday() {
        let at = noon(NaiveDate::from_ymd_opt(2024, 10, 3).unwrap());
        assert_eq!(at.format("%H:%M:%S").to_string(), "12:00:00");
    }
}
