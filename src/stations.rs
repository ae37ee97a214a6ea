//! Korail station table: supported stations, their upstream codes,
//! and the alias normalization applied to user input.

use crate::models::query::QueryValidationError;

/// Stations the monitor supports, paired with their Korail station
/// codes. The schedule API itself is addressed by station *name*; the
/// codes are kept for reference and for future endpoints that need
/// them.
pub const STATIONS: &[(&str, &str)] = &[
    ("서울", "0001"),
    ("용산", "0015"),
    ("영등포", "0020"),
    ("광명", "0502"),
    ("수원", "0055"),
    ("천안아산", "0297"),
    ("오송", "0298"),
    ("대전", "0010"),
    ("김천구미", "0507"),
    ("동대구", "0508"),
    ("경주", "0519"),
    ("포항", "0515"),
    ("울산(통도사)", "0930"),
    ("부산", "0032"),
    ("광주송정", "0036"),
    ("목포", "0041"),
    ("전주", "0045"),
    ("익산", "0030"),
    ("여수엑스포", "0049"),
    ("강릉", "0115"),
    ("평창", "0112"),
    ("진주", "0056"),
];

/// Common user-facing aliases mapped to canonical station names
/// ("서울역" -> "서울", "광주" -> "광주송정", ...).
pub const ALIASES: &[(&str, &str)] = &[
    ("서울역", "서울"),
    ("용산역", "용산"),
    ("부산역", "부산"),
    ("대전역", "대전"),
    ("동대구역", "동대구"),
    ("울산", "울산(통도사)"),
    ("울산역", "울산(통도사)"),
    ("통도사", "울산(통도사)"),
    ("광주", "광주송정"),
    ("여수", "여수엑스포"),
    ("김천", "김천구미"),
    ("구미", "김천구미"),
    ("천안", "천안아산"),
    ("아산", "천안아산"),
];

/// Normalize a user-supplied station name: strip whitespace, resolve
/// aliases, and verify the result is a supported station.
pub fn normalize(name: &str) -> Result<String, QueryValidationError> {
    let stripped: String = name.split_whitespace().collect();

    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == stripped)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(stripped.as_str());

    if STATIONS.iter().any(|(station, _)| *station == canonical) {
        Ok(canonical.to_string())
    } else {
        Err(QueryValidationError::UnknownStation(name.trim().to_string()))
    }
}

/// Station code for a canonical station name, if supported.
pub fn code_for(name: &str) -> Option<&'static str> {
    STATIONS
        .iter()
        .find(|(station, _)| *station == name)
        .map(|(_, code)| *code)
}
