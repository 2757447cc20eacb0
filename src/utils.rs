//! Shared helpers for reading the portal's spreadsheet export

use chrono::{NaiveDate, TimeDelta};

/// Serials at or above this value are shifted by the 1900 leap-year bug
/// (serial 60 is the non-existent 1900-02-29)
const LEAP_BUG_SERIAL: i64 = 60;

/// Replace the first comma with a period so French-formatted numbers parse
///
/// # Examples
///
/// ```
/// use veolia_consumption::utils::normalize_decimal_comma;
///
/// assert_eq!(normalize_decimal_comma("44197,5"), "44197.5");
/// assert_eq!(normalize_decimal_comma("44197"), "44197");
/// ```
pub fn normalize_decimal_comma(value: &str) -> String {
    value.replacen(',', ".", 1)
}

/// Convert a spreadsheet date serial (1900 date system) to a calendar day
///
/// The integer part counts days since the spreadsheet epoch. The fractional
/// part is a time of day and is dropped. Returns `None` for negative,
/// non-finite or out-of-range serials.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use veolia_consumption::utils::excel_serial_to_date;
///
/// assert_eq!(excel_serial_to_date(44197.0), NaiveDate::from_ymd_opt(2021, 1, 1));
/// assert_eq!(excel_serial_to_date(44197.5), NaiveDate::from_ymd_opt(2021, 1, 1));
/// assert_eq!(excel_serial_to_date(-1.0), None);
/// ```
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let days = serial.trunc() as i64;
    let epoch = if days >= LEAP_BUG_SERIAL {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };

    epoch.checked_add_signed(TimeDelta::try_days(days)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_normalize_decimal_comma_only_first() {
        assert_eq!(normalize_decimal_comma("1,5,2"), "1.5,2");
    }

    #[test]
    fn test_normalize_decimal_comma_empty() {
        assert_eq!(normalize_decimal_comma(""), "");
    }

    #[test]
    fn test_serial_2021_new_year() {
        assert_eq!(excel_serial_to_date(44197.0), ymd(2021, 1, 1));
    }

    #[test]
    fn test_serial_fraction_ignored() {
        assert_eq!(excel_serial_to_date(44197.999), ymd(2021, 1, 1));
        assert_eq!(excel_serial_to_date(44198.0), ymd(2021, 1, 2));
    }

    #[test]
    fn test_serial_first_day_of_epoch() {
        assert_eq!(excel_serial_to_date(1.0), ymd(1900, 1, 1));
    }

    #[test]
    fn test_serial_around_leap_year_bug() {
        assert_eq!(excel_serial_to_date(59.0), ymd(1900, 2, 28));
        // 1900-02-29 does not exist
        assert_eq!(excel_serial_to_date(60.0), ymd(1900, 2, 28));
        assert_eq!(excel_serial_to_date(61.0), ymd(1900, 3, 1));
    }

    #[test]
    fn test_serial_invalid() {
        assert_eq!(excel_serial_to_date(-0.5), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);
        assert_eq!(excel_serial_to_date(1e300), None);
    }
}
