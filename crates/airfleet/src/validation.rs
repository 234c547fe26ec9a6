//! Domain invariants for aircraft and flight records.
//!
//! Everything here is pure: callers pass in the reference time and whatever
//! existing state a rule needs, and get back either `Ok` or the specific
//! [`Error`] kind describing the violation. Partial updates are always merged
//! onto the persisted record first (see [`FlightPatch::apply`]) so that
//! cross-field rules see the candidate state rather than the patch alone.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Aircraft, AircraftPatch, Flight, FlightPatch, NewAircraft, NewFlight};

static ICAO_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}$").expect("Invalid regex pattern"));

/// Check that `code` is exactly four uppercase ASCII letters.
///
/// Lowercase input is rejected rather than normalised.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] naming `field` on mismatch.
pub fn validate_icao(field: &'static str, code: &str) -> Result<()> {
    if ICAO_CODE.is_match(code) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            field,
            value: code.to_string(),
        })
    }
}

/// Check that a required text field is not blank.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] naming `field` if `value` is empty or
/// only whitespace.
pub fn validate_required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Check that a departure lies strictly after `now`.
///
/// # Errors
///
/// Returns [`Error::PastDeparture`] if `departure <= now`.
pub fn validate_departure(departure: NaiveDateTime, now: NaiveDateTime) -> Result<()> {
    if departure <= now {
        return Err(Error::PastDeparture { departure, now });
    }
    Ok(())
}

/// Check that arrival lies strictly after departure.
///
/// # Errors
///
/// Returns [`Error::InvalidOrdering`] if `arrival <= departure`.
pub fn validate_ordering(departure: NaiveDateTime, arrival: NaiveDateTime) -> Result<()> {
    if arrival <= departure {
        return Err(Error::InvalidOrdering { departure, arrival });
    }
    Ok(())
}

/// Check both temporal invariants of a new flight.
///
/// # Errors
///
/// [`Error::PastDeparture`] takes precedence over [`Error::InvalidOrdering`].
pub fn validate_flight_times(
    departure: NaiveDateTime,
    arrival: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<()> {
    validate_departure(departure, now)?;
    validate_ordering(departure, arrival)
}

/// Check that `serial_number` is not among `existing_serials`.
///
/// # Errors
///
/// Returns [`Error::DuplicateSerial`] on collision.
pub fn validate_aircraft_uniqueness<'a, I>(serial_number: &str, existing_serials: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    if existing_serials.into_iter().any(|s| s == serial_number) {
        return Err(Error::duplicate_serial(serial_number));
    }
    Ok(())
}

/// Validate an aircraft about to be created.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] for a blank field or
/// [`Error::DuplicateSerial`] on collision.
pub fn validate_new_aircraft<'a, I>(aircraft: &NewAircraft, existing_serials: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    validate_required("serial_number", &aircraft.serial_number)?;
    validate_required("manufacturer", &aircraft.manufacturer)?;
    validate_aircraft_uniqueness(&aircraft.serial_number, existing_serials)
}

/// Validate every field of a flight about to be created.
///
/// Does not check that the referenced aircraft exists; that needs the store.
///
/// # Errors
///
/// Returns the first violated invariant: airports, then times.
pub fn validate_new_flight(flight: &NewFlight, now: NaiveDateTime) -> Result<()> {
    validate_icao("departure_airport", &flight.departure_airport)?;
    validate_icao("arrival_airport", &flight.arrival_airport)?;
    validate_flight_times(flight.departure_time, flight.arrival_time, now)
}

/// Merge `patch` onto `current` and validate the touched invariants.
///
/// A new departure must be in the future and precede the merged arrival. A
/// new arrival alone is only checked against the merged departure, so a
/// flight that has already departed can still have its arrival corrected.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_flight_update(
    current: &Flight,
    patch: &FlightPatch,
    now: NaiveDateTime,
) -> Result<Flight> {
    let candidate = patch.apply(current);

    if patch.departure_airport.is_some() {
        validate_icao("departure_airport", &candidate.departure_airport)?;
    }
    if patch.arrival_airport.is_some() {
        validate_icao("arrival_airport", &candidate.arrival_airport)?;
    }
    if patch.departure_time.is_some() {
        validate_departure(candidate.departure_time, now)?;
    }
    if patch.departure_time.is_some() || patch.arrival_time.is_some() {
        validate_ordering(candidate.departure_time, candidate.arrival_time)?;
    }

    Ok(candidate)
}

/// Merge `patch` onto `current` and check the new serial number, if any,
/// against the serials of other aircraft.
///
/// `current`'s own serial is ignored so that re-submitting an unchanged
/// serial is accepted.
///
/// # Errors
///
/// Returns [`Error::DuplicateSerial`] on collision.
pub fn validate_aircraft_update<'a, I>(
    current: &Aircraft,
    patch: &AircraftPatch,
    existing_serials: I,
) -> Result<Aircraft>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidate = patch.apply(current);
    if patch.manufacturer.is_some() {
        validate_required("manufacturer", &candidate.manufacturer)?;
    }
    if patch.serial_number.is_some() {
        validate_required("serial_number", &candidate.serial_number)?;
        let others = existing_serials
            .into_iter()
            .filter(|serial| *serial != current.serial_number);
        validate_aircraft_uniqueness(&candidate.serial_number, others)?;
    }
    Ok(candidate)
}
