//! Blocking client for the Korail mobile schedule endpoint.
//!
//! Talks to the same backend as the official mobile app
//! (`smart.letskorail.com`), which allows anonymous schedule queries.
//! Responses are paginated; `h_next_pg_flg == "Y"` signals a further
//! page.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use serde::Deserialize;

use crate::models::config::HttpConfig;
use crate::models::constants::{http, SEAT_COUNT_UNKNOWN};
use crate::models::query::{CheckResult, TrainInfo, TrainQuery};

use super::{QueryError, SeatSource};

const BASE_URL: &str =
    "https://smart.letskorail.com:443/classes/com.korail.mobile.seatMovie.ScheduleView";

/// User-Agent of the official Android app; the endpoint rejects
/// generic clients.
const MOBILE_USER_AGENT: &str =
    "Dalvik/2.1.0 (Linux; U; Android 5.1.1; Nexus 4 Build/LMY48T)";

/// Reservation codes that mean a seat can be booked. Everything else
/// ("00" sold out, waiting list codes) counts as unavailable.
const RSV_CODES_AVAILABLE: &[&str] = &["11", "13"];

/// Schedule response envelope. Fields the parser does not consume are
/// left out; serde ignores them.
#[derive(Debug, Deserialize)]
struct SchedulePage {
    #[serde(rename = "strResult", default)]
    result: String,
    #[serde(rename = "h_msg_cd", default)]
    msg_cd: String,
    #[serde(rename = "h_msg_txt", default)]
    msg_txt: String,
    #[serde(rename = "h_next_pg_flg", default)]
    next_page_flag: String,
    #[serde(rename = "h_qry_st_no_next", default)]
    query_start_no_next: String,
    #[serde(rename = "h_trn_no_next", default)]
    train_no_next: String,
    #[serde(default)]
    trn_infos: Option<TrainRows>,
}

#[derive(Debug, Deserialize, Default)]
struct TrainRows {
    #[serde(rename = "trn_info", default)]
    rows: Vec<TrainRow>,
}

#[derive(Debug, Deserialize, Default)]
struct TrainRow {
    #[serde(rename = "h_trn_no", default)]
    train_no: String,
    #[serde(rename = "h_trn_clsf_nm", default)]
    class_name: String,
    #[serde(rename = "h_dpt_tm", default)]
    departure_time: String,
    #[serde(rename = "h_arv_tm", default)]
    arrival_time: String,
    #[serde(rename = "h_gen_rsv_cd", default)]
    general_rsv_code: String,
    #[serde(rename = "h_spe_rsv_cd", default)]
    first_rsv_code: String,
    #[serde(rename = "h_gen_rsv_nm", default)]
    general_rsv_name: String,
    #[serde(rename = "h_spe_rsv_nm", default)]
    first_rsv_name: String,
}

/// [`SeatSource`] implementation backed by the Korail mobile API.
pub struct KorailClient {
    http: reqwest::blocking::Client,
}

impl KorailClient {
    /// Build a client with a connection pool and the configured
    /// timeouts. The pool lives for the whole session and is torn
    /// down by [`SeatSource::close`] / drop.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(MOBILE_USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http })
    }

    fn base_params(query: &TrainQuery) -> Vec<(&'static str, String)> {
        let train_code = query.train_class.upstream_code();
        vec![
            // Mobile app identification
            ("Device", "AD".to_string()),
            ("Version", "190617001".to_string()),
            // Schedule query
            ("txtGoStart", query.departure.clone()),
            ("txtGoEnd", query.arrival.clone()),
            ("txtGoAbrdDt", query.date.format("%Y%m%d").to_string()),
            ("txtGoHour", query.window_start.format("%H%M%S").to_string()),
            ("selGoTrain", train_code.to_string()),
            ("txtTrnGpCd", train_code.to_string()),
            ("txtSeatAttCd", query.seat_class.upstream_code().to_string()),
            // Passenger counts (adults only; other categories zeroed)
            ("txtPsgFlg_1", query.passengers.to_string()),
            ("txtPsgFlg_2", "0".to_string()),
            ("txtPsgFlg_3", "0".to_string()),
            ("txtPsgFlg_4", "0".to_string()),
            ("txtPsgFlg_5", "0".to_string()),
            ("txtCardPsgCnt", "0".to_string()),
            ("txtTotPsgCnt", query.passengers.to_string()),
            // Fixed required parameters
            ("txtSeatAttCd_2", "000".to_string()),
            ("txtSeatAttCd_3", "000".to_string()),
            ("txtSeatAttCd_4", "015".to_string()),
            ("radJobId", "1".to_string()),
            ("txtMenuId", "11".to_string()),
            ("txtGdNo", String::new()),
            ("txtJobDv", String::new()),
        ]
    }

    fn fetch_page(&self, params: &[(&'static str, String)]) -> Result<(SchedulePage, usize), QueryError> {
        let response = self
            .http
            .get(BASE_URL)
            .query(params)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        let page: SchedulePage = serde_json::from_slice(&bytes)?;

        if page.result == "FAIL" {
            return Err(QueryError::Api {
                code: page.msg_cd.clone(),
                message: page.msg_txt.clone(),
            });
        }
        Ok((page, bytes.len()))
    }
}

impl SeatSource for KorailClient {
    fn check(&mut self, query: &TrainQuery) -> Result<CheckResult, QueryError> {
        let checked_at = Utc::now();
        let base = Self::base_params(query);
        let mut cursor: Option<(String, String)> = None;
        let mut trains = Vec::new();
        let mut response_bytes = 0;

        for _ in 0..http::MAX_SCHEDULE_PAGES {
            let mut params = base.clone();
            if let Some((start_no, train_no)) = &cursor {
                params.push(("h_qry_st_no_next", start_no.clone()));
                params.push(("h_trn_no_next", train_no.clone()));
            }

            let (page, size) = self.fetch_page(&params)?;
            response_bytes += size;
            trains.extend(parse_trains(&page, query));

            if page.next_page_flag != "Y" {
                break;
            }
            cursor = Some((page.query_start_no_next.clone(), page.train_no_next.clone()));
        }

        tracing::debug!(
            trains = trains.len(),
            response_bytes,
            "schedule query complete"
        );

        Ok(CheckResult {
            checked_at,
            trains,
            response_bytes,
        })
    }

    fn close(&mut self) {
        // The pooled connections tear down when the client drops at the
        // end of the draining step; nothing needs flushing before that.
        tracing::debug!("seat source closed");
    }
}

/// Extract the train rows inside the query's departure window.
fn parse_trains(page: &SchedulePage, query: &TrainQuery) -> Vec<TrainInfo> {
    let Some(rows) = &page.trn_infos else {
        return Vec::new();
    };

    rows.rows
        .iter()
        .filter_map(|row| {
            let departure = parse_compact_time(&row.departure_time)?;
            let arrival = parse_compact_time(&row.arrival_time)?;

            if departure < query.window_start || departure > query.window_end {
                return None;
            }

            Some(TrainInfo {
                train_no: row.train_no.clone(),
                train_class_name: row.class_name.clone(),
                departure_time: departure,
                arrival_time: arrival,
                general_seats: seat_count(&row.general_rsv_code, &row.general_rsv_name),
                first_class_seats: seat_count(&row.first_rsv_code, &row.first_rsv_name),
                duration_minutes: duration_minutes(departure, arrival),
            })
        })
        .collect()
}

/// Derive a seat count from a reservation code plus its display text.
///
/// The endpoint encodes availability in the code and sometimes a count
/// in the text ("잔여석 3석"). Text that only says seats are plentiful
/// maps to the [`SEAT_COUNT_UNKNOWN`] sentinel; available with no
/// usable text maps to 1.
fn seat_count(code: &str, name: &str) -> u32 {
    if !RSV_CODES_AVAILABLE.contains(&code) {
        return 0;
    }
    if ["많음", "충분", "가능"].iter().any(|kw| name.contains(kw)) {
        return SEAT_COUNT_UNKNOWN;
    }
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(1)
}

/// Parse an upstream `HHMMSS` (or truncated `HHMM`) time string.
fn parse_compact_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.len() < 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = s[0..2].parse().ok()?;
    let minute: u32 = s[2..4].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Trip duration in minutes, wrapping across midnight.
fn duration_minutes(departure: NaiveTime, arrival: NaiveTime) -> u32 {
    use chrono::Timelike;
    let dep = departure.hour() * 60 + departure.minute();
    let arr = arrival.hour() * 60 + arrival.minute();
    if arr > dep {
        arr - dep
    } else {
        arr + 1440 - dep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::{SeatClass, TrainClass};
    use chrono::NaiveDate;

    fn query() -> TrainQuery {
        TrainQuery::new(
            "서울".to_string(),
            "부산".to_string(),
            NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            TrainClass::Ktx,
            SeatClass::General,
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_seat_count_from_codes() {
        // Sold out regardless of text
        assert_eq!(seat_count("00", "매진"), 0);
        // Available with an explicit count in the text
        assert_eq!(seat_count("11", "잔여석 3석"), 3);
        assert_eq!(seat_count("13", "5"), 5);
        // Available, count unspecified -> sentinel
        assert_eq!(seat_count("11", "좌석많음"), SEAT_COUNT_UNKNOWN);
        assert_eq!(seat_count("11", "예약가능"), SEAT_COUNT_UNKNOWN);
        // Available, no usable text
        assert_eq!(seat_count("11", ""), 1);
    }

    #[test]
    fn test_parse_compact_time() {
        assert_eq!(
            parse_compact_time("083000"),
            NaiveTime::from_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_compact_time("0830"),
            NaiveTime::from_hms_opt(8, 30, 0)
        );
        assert_eq!(parse_compact_time("8"), None);
        assert_eq!(parse_compact_time("abcd"), None);
    }

    #[test]
    fn test_duration_wraps_midnight() {
        let dep = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let arr = NaiveTime::from_hms_opt(1, 10, 0).unwrap();
        assert_eq!(duration_minutes(dep, arr), 100);

        let dep = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let arr = NaiveTime::from_hms_opt(11, 40, 0).unwrap();
        assert_eq!(duration_minutes(dep, arr), 160);
    }

    #[test]
    fn test_parse_trains_applies_window_filter() {
        let raw = serde_json::json!({
            "strResult": "SUCC",
            "h_next_pg_flg": "N",
            "trn_infos": {
                "trn_info": [
                    {
                        "h_trn_no": "101",
                        "h_trn_clsf_nm": "KTX",
                        "h_dpt_tm": "073000",
                        "h_arv_tm": "101000",
                        "h_gen_rsv_cd": "11",
                        "h_gen_rsv_nm": "좌석많음"
                    },
                    {
                        "h_trn_no": "105",
                        "h_trn_clsf_nm": "KTX",
                        "h_dpt_tm": "090000",
                        "h_arv_tm": "114000",
                        "h_gen_rsv_cd": "00",
                        "h_gen_rsv_nm": "매진",
                        "h_spe_rsv_cd": "11",
                        "h_spe_rsv_nm": "잔여석 2석"
                    }
                ]
            }
        });
        let page: SchedulePage = serde_json::from_value(raw).unwrap();
        let trains = parse_trains(&page, &query());

        // The 07:30 departure falls outside the 08:00~12:00 window
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].train_no, "105");
        assert_eq!(trains[0].general_seats, 0);
        assert_eq!(trains[0].first_class_seats, 2);
        assert_eq!(trains[0].duration_minutes, 160);
        assert!(trains[0].has_seats());
    }

    #[test]
    fn test_fail_envelope_is_api_error() {
        let raw = serde_json::json!({
            "strResult": "FAIL",
            "h_msg_cd": "WRG000000",
            "h_msg_txt": "조회 결과가 없습니다"
        });
        let page: SchedulePage = serde_json::from_value(raw).unwrap();
        assert_eq!(page.result, "FAIL");
        assert_eq!(page.msg_cd, "WRG000000");
    }
}
