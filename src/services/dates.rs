//! Date formatting helpers for test data.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};

use crate::errors::AppError;

/// Used when no format, or one too short to be meaningful, is given.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Formats shorter than this fall back to [`DEFAULT_DATE_FORMAT`].
const MIN_FORMAT_LEN: usize = 8;

fn effective_format(format: Option<&str>) -> &str {
    match format {
        Some(f) if f.chars().count() >= MIN_FORMAT_LEN => f,
        _ => DEFAULT_DATE_FORMAT,
    }
}

/// Format `date` with a strftime pattern.
pub fn format_date(date: &NaiveDateTime, format: Option<&str>) -> Result<String, AppError> {
    let pattern = effective_format(format);
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(AppError::Validation(format!(
            "Invalid date format '{pattern}'"
        )));
    }
    Ok(date.format_with_items(items.into_iter()).to_string())
}

/// Format `base` shifted by `days_offset` days.
pub fn date_offset_from<Tz: TimeZone>(
    base: DateTime<Tz>,
    days_offset: i64,
    format: Option<&str>,
) -> Result<String, AppError> {
    let shifted = base + Duration::days(days_offset);
    format_date(&shifted.naive_local(), format)
}

/// Format today's local date shifted by `days_offset` days.
pub fn date_offset(days_offset: i64, format: Option<&str>) -> Result<String, AppError> {
    date_offset_from(Local::now(), days_offset, format)
}

pub fn add_minutes(date: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    date + Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 28)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
    }

    #[test]
    fn defaults_to_month_day_year() {
        assert_eq!(format_date(&sample(), None).unwrap(), "02/28/2024");
        // Too short to be a full date pattern.
        assert_eq!(format_date(&sample(), Some("%Y")).unwrap(), "02/28/2024");
    }

    #[test]
    fn honours_long_formats() {
        assert_eq!(
            format_date(&sample(), Some("%Y-%m-%d %H:%M")).unwrap(),
            "2024-02-28 23:30"
        );
    }

    #[test]
    fn short_non_ascii_format_falls_back() {
        // Six characters, eight bytes.
        assert_eq!(format_date(&sample(), Some("%d··%m")).unwrap(), "02/28/2024");
    }

    #[test]
    fn rejects_invalid_specifiers() {
        let err = format_date(&sample(), Some("%Y-%m-%Q!")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn offsets_across_leap_day() {
        let base = Utc.from_utc_datetime(&sample());
        assert_eq!(date_offset_from(base, 2, None).unwrap(), "03/01/2024");
        assert_eq!(date_offset_from(base, -28, None).unwrap(), "01/31/2024");
    }

    #[test]
    fn offset_from_today_uses_default_format() {
        let formatted = date_offset(0, None).unwrap();
        assert_eq!(formatted.len(), 10);
        assert_eq!(&formatted[2..3], "/");
    }

    #[test]
    fn adds_minutes_across_midnight() {
        let later = add_minutes(sample(), 45);
        assert_eq!(format_date(&later, Some("%Y-%m-%d %H:%M")).unwrap(), "2024-02-29 00:15");
        assert_eq!(add_minutes(later, -45), sample());
    }
}
