//! Flight-time statistics per departure airport.
//!
//! A report covers every flight whose departure falls inside an inclusive
//! window. Flights are grouped by departure airport, and within each airport
//! the assigned flights are further grouped by aircraft. Output ordering is
//! fixed: airports ascending by code, aircraft ascending by id.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::assignment::require_aircraft;
use crate::error::{Error, Result};
use crate::model::{AircraftId, Flight, FlightFilter};
use crate::storage::EntityStore;

/// Flight minutes accumulated by one aircraft from one airport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftFlightTime {
    /// The aircraft.
    pub aircraft_id: AircraftId,
    /// Its serial number at report time.
    pub serial_number: String,
    /// Sum of flight durations in minutes, unrounded.
    pub in_flight_minutes: f64,
}

/// Statistics for one departure airport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportStats {
    /// ICAO code of the departure airport.
    pub departure_airport: String,
    /// All flights departing here in the window, assigned or not.
    pub flight_count: usize,
    /// Per-aircraft totals for assigned flights.
    pub aircraft_flight_times: Vec<AircraftFlightTime>,
    /// Mean duration in minutes over all flights, rounded to 2 decimals.
    pub average_flight_time: f64,
}

/// A complete flight statistics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightReport {
    /// Inclusive window start.
    pub start_time: NaiveDateTime,
    /// Inclusive window end.
    pub end_time: NaiveDateTime,
    /// Number of airports with at least one departure in the window.
    pub total_airports: usize,
    /// Number of flights departing in the window.
    pub total_flights: usize,
    /// Per-airport statistics.
    pub airports: Vec<AirportStats>,
}

impl FlightReport {
    /// Look up the statistics for one airport.
    #[must_use]
    pub fn airport(&self, code: &str) -> Option<&AirportStats> {
        self.airports.iter().find(|a| a.departure_airport == code)
    }

    /// Check whether no flight departed in the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

/// Reject a window that starts after it ends. Equal bounds are allowed.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`].
pub fn validate_window(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if start > end {
        return Err(Error::InvalidRange { start, end });
    }
    Ok(())
}

/// Round half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
struct AirportAccumulator {
    flight_count: usize,
    total_minutes: f64,
    per_aircraft: BTreeMap<AircraftId, f64>,
}

/// Build a report from already retrieved flights.
///
/// Flights departing outside `[start, end]` are ignored. `serial_of` is
/// called once per distinct aircraft.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] for an inverted window, or whatever
/// `serial_of` returns.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<F>(
    start: NaiveDateTime,
    end: NaiveDateTime,
    flights: &[Flight],
    mut serial_of: F,
) -> Result<FlightReport>
where
    F: FnMut(AircraftId) -> Result<String>,
{
    validate_window(start, end)?;

    let mut groups: BTreeMap<&str, AirportAccumulator> = BTreeMap::new();
    for flight in flights
        .iter()
        .filter(|f| f.departure_time >= start && f.departure_time <= end)
    {
        let minutes = flight.duration_minutes();
        let group = groups.entry(flight.departure_airport.as_str()).or_default();
        group.flight_count += 1;
        group.total_minutes += minutes;
        if let Some(aircraft_id) = flight.aircraft_id {
            *group.per_aircraft.entry(aircraft_id).or_insert(0.0) += minutes;
        }
    }

    let mut serials: BTreeMap<AircraftId, String> = BTreeMap::new();
    let mut airports = Vec::with_capacity(groups.len());
    for (code, group) in groups {
        let mut aircraft_flight_times = Vec::with_capacity(group.per_aircraft.len());
        for (aircraft_id, in_flight_minutes) in group.per_aircraft {
            let serial_number = match serials.get(&aircraft_id) {
                Some(serial) => serial.clone(),
                None => {
                    let serial = serial_of(aircraft_id)?;
                    serials.insert(aircraft_id, serial.clone());
                    serial
                }
            };
            aircraft_flight_times.push(AircraftFlightTime {
                aircraft_id,
                serial_number,
                in_flight_minutes,
            });
        }

        airports.push(AirportStats {
            departure_airport: code.to_string(),
            flight_count: group.flight_count,
            aircraft_flight_times,
            average_flight_time: round2(group.total_minutes / group.flight_count as f64),
        });
    }

    Ok(FlightReport {
        start_time: start,
        end_time: end,
        total_airports: airports.len(),
        total_flights: airports.iter().map(|a| a.flight_count).sum(),
        airports,
    })
}

/// Query the store and build the report for `[start, end]`.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] for an inverted window, or a store error.
pub fn generate(
    store: &impl EntityStore,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<FlightReport> {
    validate_window(start, end)?;

    let flights = store.list_flights(&FlightFilter::departing_between(start, end))?;
    debug!(
        "Aggregating {} flight(s) departing between {} and {}",
        flights.len(),
        start,
        end
    );

    aggregate(start, end, &flights, |aircraft_id| {
        require_aircraft(store, aircraft_id).map(|a| a.serial_number)
    })
}
