//! Input parsing and validation for the watch command.
//!
//! Converts the loose formats the CLI accepts (dates with or without
//! dashes, times with or without colons) into `chrono` values, and
//! assembles a validated [`TrainQuery`] from the pieces.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::constants::MAX_FUTURE_DAYS;
use crate::models::query::{QueryValidationError, SeatClass, TrainClass, TrainQuery};
use crate::stations;

/// Parse a departure date in `YYYY-MM-DD` or `YYYYMMDD` form.
/// Used as a clap value parser.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let digits: String = s.trim().chars().filter(|c| *c != '-').collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid date '{s}' (expected YYYY-MM-DD)"));
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").map_err(|_| format!("invalid date '{s}'"))
}

/// Parse a time in `HH:MM` or `HHMM` form. A bare hour like `8` or
/// `08` is accepted and padded to the full hour.
/// Used as a clap value parser.
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let digits: String = s.trim().chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid time '{s}' (expected HH:MM)"));
    }
    // One or two digits are an hour; three are H:MM
    let padded = match digits.len() {
        1 => format!("0{digits}00"),
        2 => format!("{digits}00"),
        3 => format!("0{digits}"),
        _ => digits,
    };
    NaiveTime::parse_from_str(&padded, "%H%M").map_err(|_| format!("invalid time '{s}'"))
}

/// Reject dates in the past or more than [`MAX_FUTURE_DAYS`] ahead of
/// `today`.
pub fn validate_departure_date(
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), QueryValidationError> {
    if date < today {
        return Err(QueryValidationError::PastDate);
    }
    if date > today + Duration::days(MAX_FUTURE_DAYS) {
        return Err(QueryValidationError::TooFarAhead);
    }
    Ok(())
}

/// Normalize the station names and build the immutable query for the
/// session. `today` is injected so the date rule stays testable.
#[allow(clippy::too_many_arguments)]
pub fn build_query(
    departure: &str,
    arrival: &str,
    date: NaiveDate,
    window_start: NaiveTime,
    window_end: NaiveTime,
    train_class: TrainClass,
    seat_class: SeatClass,
    passengers: u8,
    today: NaiveDate,
) -> Result<TrainQuery, QueryValidationError> {
    let departure = stations::normalize(departure)?;
    let arrival = stations::normalize(arrival)?;
    validate_departure_date(date, today)?;

    TrainQuery::new(
        departure,
        arrival,
        date,
        window_start,
        window_end,
        train_class,
        seat_class,
        passengers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-02-14").unwrap(), d(2026, 2, 14));
        assert_eq!(parse_date("20260214").unwrap(), d(2026, 2, 14));
        assert!(parse_date("2026/02/14").is_err());
        assert!(parse_date("2026-2-14").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn test_parse_time_formats() {
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert_eq!(parse_time("08:00").unwrap(), eight);
        assert_eq!(parse_time("0800").unwrap(), eight);
        assert_eq!(parse_time("8").unwrap(), eight);
        assert_eq!(
            parse_time("830").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn test_date_window() {
        let today = d(2026, 2, 1);
        assert!(validate_departure_date(d(2026, 2, 1), today).is_ok());
        assert!(validate_departure_date(d(2026, 4, 30), today).is_ok());
        assert_eq!(
            validate_departure_date(d(2026, 1, 31), today),
            Err(QueryValidationError::PastDate)
        );
        assert_eq!(
            validate_departure_date(d(2026, 5, 3), today),
            Err(QueryValidationError::TooFarAhead)
        );
    }

    #[test]
    fn test_build_query_normalizes_aliases() {
        let query = build_query(
            "서울역",
            "광주",
            d(2026, 2, 14),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            TrainClass::Ktx,
            SeatClass::General,
            2,
            d(2026, 2, 1),
        )
        .unwrap();
        assert_eq!(query.departure, "서울");
        assert_eq!(query.arrival, "광주송정");
    }

    #[test]
    fn test_build_query_rejects_alias_collision() {
        // "서울역" and "서울" normalize to the same station
        let err = build_query(
            "서울역",
            "서울",
            d(2026, 2, 14),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            TrainClass::Ktx,
            SeatClass::General,
            1,
            d(2026, 2, 1),
        )
        .unwrap_err();
        assert_eq!(err, QueryValidationError::SameStation);
    }
}
