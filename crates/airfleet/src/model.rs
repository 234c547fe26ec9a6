//! Core fleet record types.
//!
//! Aircraft and flights are plain records keyed by store-assigned ids. A
//! flight refers to its aircraft only by id; joining in aircraft details is
//! an explicit lookup that produces a [`FlightView`].

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Store-assigned aircraft identifier.
pub type AircraftId = i64;

/// Store-assigned flight identifier.
pub type FlightId = i64;

/// Fixed-width timestamp layout used for persistence.
///
/// Every stored value has the same width, so lexical order in SQL equals
/// chronological order. Nanoseconds are kept so a stored value reads back
/// exactly as it was validated.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// An aircraft in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aircraft {
    /// Unique identifier assigned by the store.
    pub id: AircraftId,
    /// Globally unique manufacturer serial number.
    pub serial_number: String,
    /// Manufacturer (and usually model) name.
    pub manufacturer: String,
}

/// Fields required to register a new aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAircraft {
    /// Serial number; must not collide with an existing aircraft.
    pub serial_number: String,
    /// Manufacturer name.
    pub manufacturer: String,
}

impl NewAircraft {
    /// Create a new aircraft request.
    #[must_use]
    pub fn new(serial_number: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            manufacturer: manufacturer.into(),
        }
    }
}

/// A partial aircraft update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AircraftPatch {
    /// Replacement serial number.
    pub serial_number: Option<String>,
    /// Replacement manufacturer.
    pub manufacturer: Option<String>,
}

impl AircraftPatch {
    /// Merge this patch onto the current record, producing the candidate.
    #[must_use]
    pub fn apply(&self, current: &Aircraft) -> Aircraft {
        Aircraft {
            id: current.id,
            serial_number: self
                .serial_number
                .clone()
                .unwrap_or_else(|| current.serial_number.clone()),
            manufacturer: self
                .manufacturer
                .clone()
                .unwrap_or_else(|| current.manufacturer.clone()),
        }
    }

    /// Check whether the patch touches any field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serial_number.is_none() && self.manufacturer.is_none()
    }
}

/// A scheduled flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique identifier assigned by the store.
    pub id: FlightId,
    /// ICAO code of the departure airport.
    pub departure_airport: String,
    /// ICAO code of the arrival airport.
    pub arrival_airport: String,
    /// Scheduled departure.
    pub departure_time: NaiveDateTime,
    /// Scheduled arrival.
    pub arrival_time: NaiveDateTime,
    /// Aircraft operating the flight, if assigned.
    pub aircraft_id: Option<AircraftId>,
}

impl Flight {
    /// Time between departure and arrival.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.arrival_time - self.departure_time
    }

    /// Duration in minutes, fractional part retained.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        minutes(self.duration())
    }
}

/// Fields required to schedule a new flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlight {
    /// ICAO code of the departure airport.
    pub departure_airport: String,
    /// ICAO code of the arrival airport.
    pub arrival_airport: String,
    /// Scheduled departure.
    pub departure_time: NaiveDateTime,
    /// Scheduled arrival.
    pub arrival_time: NaiveDateTime,
    /// Optional initial assignment.
    #[serde(default)]
    pub aircraft_id: Option<AircraftId>,
}

/// A partial flight update. `None` leaves the field unchanged.
///
/// `aircraft_id` is doubly optional: `Some(None)` clears the assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPatch {
    /// Replacement departure airport.
    pub departure_airport: Option<String>,
    /// Replacement arrival airport.
    pub arrival_airport: Option<String>,
    /// Replacement departure time.
    pub departure_time: Option<NaiveDateTime>,
    /// Replacement arrival time.
    pub arrival_time: Option<NaiveDateTime>,
    /// Replacement assignment.
    pub aircraft_id: Option<Option<AircraftId>>,
}

impl FlightPatch {
    /// Merge this patch onto the current record, producing the candidate.
    #[must_use]
    pub fn apply(&self, current: &Flight) -> Flight {
        Flight {
            id: current.id,
            departure_airport: self
                .departure_airport
                .clone()
                .unwrap_or_else(|| current.departure_airport.clone()),
            arrival_airport: self
                .arrival_airport
                .clone()
                .unwrap_or_else(|| current.arrival_airport.clone()),
            departure_time: self.departure_time.unwrap_or(current.departure_time),
            arrival_time: self.arrival_time.unwrap_or(current.arrival_time),
            aircraft_id: self.aircraft_id.unwrap_or(current.aircraft_id),
        }
    }

    /// Check whether the patch touches any field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.departure_airport.is_none()
            && self.arrival_airport.is_none()
            && self.departure_time.is_none()
            && self.arrival_time.is_none()
            && self.aircraft_id.is_none()
    }
}

/// A flight joined with the serial number of its assigned aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightView {
    /// The flight record.
    #[serde(flatten)]
    pub flight: Flight,
    /// Serial number of the assigned aircraft, looked up at read time.
    pub aircraft_serial_number: Option<String>,
}

/// Attribute filter for flight listings. Unset fields match everything.
///
/// Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    /// Only flights departing from this airport.
    pub departure_airport: Option<String>,
    /// Only flights arriving at this airport.
    pub arrival_airport: Option<String>,
    /// Only flights departing at or after this time.
    pub departure_after: Option<NaiveDateTime>,
    /// Only flights departing at or before this time.
    pub departure_before: Option<NaiveDateTime>,
    /// Only flights assigned to this aircraft.
    pub aircraft_id: Option<AircraftId>,
}

impl FlightFilter {
    /// Filter selecting flights that depart within `[start, end]`.
    #[must_use]
    pub fn departing_between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            departure_after: Some(start),
            departure_before: Some(end),
            ..Self::default()
        }
    }
}

/// Convert a duration to minutes without truncating.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn minutes(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 60_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Format a timestamp for storage.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp from user input.
///
/// Accepts RFC 3339 (converted to UTC and stripped of its offset) or a naive
/// ISO 8601 date-time with optional seconds and fraction.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if no format matches.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::InvalidTimestamp {
            value: value.to_string(),
        })
}
