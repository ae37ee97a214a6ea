use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::MAX_FUTURE_DAYS;

/// Why a query could not be constructed from user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryValidationError {
    #[error("unknown station: '{0}'")]
    UnknownStation(String),

    #[error("departure and arrival stations are the same")]
    SameStation,

    #[error("departure date is in the past")]
    PastDate,

    #[error("departure date is more than {MAX_FUTURE_DAYS} days ahead")]
    TooFarAhead,

    #[error("time window end must be after its start")]
    EmptyTimeWindow,

    #[error("passenger count must be between 1 and 9, got {0}")]
    PassengerCount(u8),
}

/// Train category filter, mapped to the codes the Korail mobile API
/// expects in `selGoTrain` / `txtTrnGpCd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrainClass {
    Ktx,
    KtxSancheon,
    KtxEum,
    ItxSaemaeul,
    ItxCheongchun,
    Mugunghwa,
    All,
}

impl TrainClass {
    /// Upstream group code for this train class.
    pub fn upstream_code(&self) -> &'static str {
        match self {
            Self::Ktx | Self::KtxSancheon | Self::KtxEum => "100",
            Self::ItxSaemaeul => "101",
            Self::ItxCheongchun => "109",
            Self::Mugunghwa => "102",
            Self::All => "109",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ktx => "KTX",
            Self::KtxSancheon => "KTX-Sancheon",
            Self::KtxEum => "KTX-Eum",
            Self::ItxSaemaeul => "ITX-Saemaeul",
            Self::ItxCheongchun => "ITX-Cheongchun",
            Self::Mugunghwa => "Mugunghwa",
            Self::All => "all trains",
        }
    }
}

/// Seat category filter, mapped to the `txtSeatAttCd` attribute code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    /// Standard car (일반실).
    General,
    /// First class car (특실).
    First,
}

impl SeatClass {
    pub fn upstream_code(&self) -> &'static str {
        match self {
            Self::General => "015",
            Self::First => "011",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::First => "first-class",
        }
    }
}

/// Immutable description of what the session is watching for.
///
/// Constructed once through [`TrainQuery::new`], which enforces the
/// field invariants; never mutated afterwards. Station names are
/// expected in their normalized form (see [`crate::stations`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainQuery {
    pub departure: String,
    pub arrival: String,
    pub date: NaiveDate,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub train_class: TrainClass,
    pub seat_class: SeatClass,
    pub passengers: u8,
}

impl TrainQuery {
    /// Build a query from normalized parts, enforcing the invariants
    /// that hold for the whole session: distinct stations, a non-empty
    /// time window, and a passenger count in 1..=9.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        departure: String,
        arrival: String,
        date: NaiveDate,
        window_start: NaiveTime,
        window_end: NaiveTime,
        train_class: TrainClass,
        seat_class: SeatClass,
        passengers: u8,
    ) -> Result<Self, QueryValidationError> {
        if departure == arrival {
            return Err(QueryValidationError::SameStation);
        }
        if window_end <= window_start {
            return Err(QueryValidationError::EmptyTimeWindow);
        }
        if passengers < 1 || passengers > 9 {
            return Err(QueryValidationError::PassengerCount(passengers));
        }

        Ok(Self {
            departure,
            arrival,
            date,
            window_start,
            window_end,
            train_class,
            seat_class,
            passengers,
        })
    }

    /// One-line description used in logs and the session banner.
    pub fn summary(&self) -> String {
        format!(
            "{} -> {} on {} {}~{} {} {} x{}",
            self.departure,
            self.arrival,
            self.date.format("%Y-%m-%d"),
            self.window_start.format("%H:%M"),
            self.window_end.format("%H:%M"),
            self.train_class.label(),
            self.seat_class.label(),
            self.passengers,
        )
    }
}

/// One train row from the schedule response, after the time-window
/// filter has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainInfo {
    pub train_no: String,
    /// Class name as reported upstream (e.g. "KTX", "무궁화호").
    pub train_class_name: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    /// Remaining standard-car seats; 0 means sold out, and
    /// [`super::constants::SEAT_COUNT_UNKNOWN`] means available with
    /// an unspecified count.
    pub general_seats: u32,
    /// Remaining first-class seats, same encoding.
    pub first_class_seats: u32,
    pub duration_minutes: u32,
}

impl TrainInfo {
    pub fn has_seats(&self) -> bool {
        self.general_seats > 0 || self.first_class_seats > 0
    }

    /// Human-readable row for notifications and logs.
    pub fn display(&self) -> String {
        let mut line = format!(
            "{} {} {}->{}",
            self.train_class_name,
            self.train_no,
            self.departure_time.format("%H:%M"),
            self.arrival_time.format("%H:%M"),
        );
        let mut seats = Vec::new();
        if self.general_seats > 0 {
            seats.push(format!("general {}", self.general_seats));
        }
        if self.first_class_seats > 0 {
            seats.push(format!("first {}", self.first_class_seats));
        }
        if !seats.is_empty() {
            line.push_str(&format!(" ({})", seats.join(" / ")));
        }
        line
    }
}

/// Outcome of one successful availability check.
///
/// Produced by the [`crate::korail::SeatSource`] collaborator, consumed
/// by the session loop within the same tick, and not retained beyond
/// the bounded event log's window.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub checked_at: chrono::DateTime<chrono::Utc>,
    pub trains: Vec<TrainInfo>,
    /// Total size of the upstream payload(s), for diagnostics.
    pub response_bytes: usize,
}

impl CheckResult {
    pub fn seats_available(&self) -> bool {
        self.trains.iter().any(TrainInfo::has_seats)
    }

    pub fn available_trains(&self) -> Vec<&TrainInfo> {
        self.trains.iter().filter(|t| t.has_seats()).collect()
    }
}
