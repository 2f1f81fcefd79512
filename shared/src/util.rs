//! Small shared utilities

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Offset between the Buddhist calendar year and the Gregorian year.
///
/// Billing periods are keyed by Buddhist year throughout the system;
/// Gregorian dates are derived at the edges (cycle boundary computation).
pub const BUDDHIST_YEAR_OFFSET: i32 = 543;

/// Convert a Buddhist calendar year to Gregorian
pub fn to_gregorian_year(buddhist_year: i32) -> i32 {
    buddhist_year - BUDDHIST_YEAR_OFFSET
}

/// Convert a Gregorian year to the Buddhist calendar
pub fn to_buddhist_year(gregorian_year: i32) -> i32 {
    gregorian_year + BUDDHIST_YEAR_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buddhist_gregorian_round_trip() {
        assert_eq!(to_gregorian_year(2567), 2024);
        assert_eq!(to_buddhist_year(2024), 2567);
        assert_eq!(to_buddhist_year(to_gregorian_year(2568)), 2568);
    }
}
