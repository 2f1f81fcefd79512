//! Date helpers
//!
//! Cycle boundaries are plain calendar dates (no business timezone here -
//! periods are whole Gregorian months). Repositories store ISO date strings;
//! parsing happens at this seam.

use chrono::NaiveDate;

use super::{AppError, AppResult};

/// Parse an ISO date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// First and last day of a Gregorian (year, month).
///
/// Returns `None` for an out-of-range month or a year chrono cannot
/// represent.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;
    Some((first, last))
}

/// Today's date (UTC) as an ISO string
pub fn today_iso() -> String {
    chrono::Utc::now().date_naive().to_string()
}
