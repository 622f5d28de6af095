//! Calendar helpers for the packed DATE representation (`y*10000 + m*100 + d`).

use crate::config::{MAX_YEAR, MIN_YEAR};
use crate::error::ExecError;
use eyre::{bail, Result};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: i32) -> i32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn check_date(year: i32, month: i32, day: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
        && (1..=12).contains(&month)
        && day >= 1
        && day <= days_in_month(year, month)
}

pub fn pack(year: i32, month: i32, day: i32) -> i32 {
    year * 10000 + month * 100 + day
}

pub fn unpack(date: i32) -> (i32, i32, i32) {
    (date / 10000, date / 100 % 100, date % 100)
}

/// Parses `Y-M-D`; each part is a decimal number and the result must be a real
/// calendar day.
pub fn parse_date(text: &str) -> Result<i32> {
    let parts: Vec<&str> = text.trim().split('-').collect();
    if parts.len() != 3 {
        bail!(ExecError::InvalidDate(text.to_string()));
    }

    let mut fields = [0i32; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            bail!(ExecError::InvalidDate(text.to_string()));
        }
        *slot = part
            .parse::<i32>()
            .map_err(|_| ExecError::InvalidDate(text.to_string()))?;
    }

    let [year, month, day] = fields;
    if !check_date(year, month, day) {
        bail!(ExecError::InvalidDate(text.to_string()));
    }
    Ok(pack(year, month, day))
}

pub fn format_date(date: i32) -> String {
    let (year, month, day) = unpack(date);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

pub fn month_name(month: i32) -> &'static str {
    usize::try_from(month - 1)
        .ok()
        .and_then(|idx| MONTH_NAMES.get(idx))
        .copied()
        .unwrap_or("")
}

/// English ordinal suffix; 11th, 12th and 13th are irregular.
pub fn ordinal_suffix(day: i32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn parse_date_packs_components() {
        assert_eq!(parse_date("2024-2-29").unwrap(), 20240229);
        assert_eq!(parse_date("1999-12-01").unwrap(), 19991201);
    }

    #[test]
    fn parse_date_rejects_impossible_days() {
        assert!(parse_date("2023-2-29").is_err());
        assert!(parse_date("2023-13-01").is_err());
        assert!(parse_date("0-01-01").is_err());
        assert!(parse_date("2023-01").is_err());
        assert!(parse_date("2023-aa-01").is_err());
    }

    #[test]
    fn format_round_trips_through_parse() {
        let packed = parse_date("2021-7-4").unwrap();
        assert_eq!(format_date(packed), "2021-07-04");
        assert_eq!(parse_date(&format_date(packed)).unwrap(), packed);
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "");
    }
}
