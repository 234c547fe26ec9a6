//! Aircraft-to-flight assignment and the aircraft deletion guard.
//!
//! These functions take any [`EntityStore`]; callers are expected to run them
//! inside a single [`Storage::write`](crate::storage::Storage::write) scope
//! together with the mutation they authorize, so no other writer can slip in
//! between the check and the act.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Aircraft, AircraftId, Flight, FlightId, FlightView};
use crate::storage::EntityStore;

/// Look up an aircraft that must exist.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if it does not.
pub fn require_aircraft(store: &impl EntityStore, aircraft_id: AircraftId) -> Result<Aircraft> {
    store
        .get_aircraft(aircraft_id)?
        .ok_or_else(|| Error::aircraft_not_found(aircraft_id))
}

/// Look up a flight that must exist.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if it does not.
pub fn require_flight(store: &impl EntityStore, flight_id: FlightId) -> Result<Flight> {
    store
        .get_flight(flight_id)?
        .ok_or_else(|| Error::flight_not_found(flight_id))
}

/// Join a flight with its aircraft's serial number.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the flight references a missing aircraft.
pub fn view(store: &impl EntityStore, flight: Flight) -> Result<FlightView> {
    let aircraft_serial_number = match flight.aircraft_id {
        Some(id) => Some(require_aircraft(store, id)?.serial_number),
        None => None,
    };
    Ok(FlightView {
        flight,
        aircraft_serial_number,
    })
}

/// Assign an aircraft to a flight.
///
/// Assigning the aircraft a flight already has is a no-op that returns the
/// same view.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if either entity is missing; the flight is
/// left untouched in that case.
pub fn assign(
    store: &impl EntityStore,
    flight_id: FlightId,
    aircraft_id: AircraftId,
) -> Result<FlightView> {
    let mut flight = require_flight(store, flight_id)?;
    let aircraft = require_aircraft(store, aircraft_id)?;

    if flight.aircraft_id != Some(aircraft.id) {
        flight.aircraft_id = Some(aircraft.id);
        store.update_flight(&flight)?;
        debug!(
            "Assigned aircraft {} ({}) to flight {}",
            aircraft.id, aircraft.serial_number, flight.id
        );
    }

    Ok(FlightView {
        flight,
        aircraft_serial_number: Some(aircraft.serial_number),
    })
}

/// Remove any aircraft assignment from a flight. Idempotent.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the flight is missing.
pub fn unassign(store: &impl EntityStore, flight_id: FlightId) -> Result<FlightView> {
    let mut flight = require_flight(store, flight_id)?;

    if let Some(previous) = flight.aircraft_id.take() {
        store.update_flight(&flight)?;
        debug!("Unassigned aircraft {} from flight {}", previous, flight.id);
    }

    Ok(FlightView {
        flight,
        aircraft_serial_number: None,
    })
}

/// Authorize deletion of an aircraft.
///
/// Does not delete anything itself.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the aircraft is missing, or
/// [`Error::AircraftInUse`] if any flight still references it.
pub fn guard_delete_aircraft(store: &impl EntityStore, aircraft_id: AircraftId) -> Result<()> {
    require_aircraft(store, aircraft_id)?;

    let flight_count = store.count_flights_for_aircraft(aircraft_id)?;
    if flight_count > 0 {
        warn!(
            "Refusing to delete aircraft {}: referenced by {} flight(s)",
            aircraft_id, flight_count
        );
        return Err(Error::AircraftInUse {
            aircraft_id,
            flight_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EntityKind, ErrorKind};
    use crate::model::{NewAircraft, NewFlight};
    use crate::storage::Storage;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    struct Fixture {
        storage: Storage,
        aircraft_a: Aircraft,
        aircraft_b: Aircraft,
        flight: Flight,
    }

    fn fixture() -> Fixture {
        let storage = Storage::open_in_memory().unwrap();
        let (aircraft_a, aircraft_b, flight) = storage
            .write(|conn| {
                let a = conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing"))?;
                let b = conn.create_aircraft(&NewAircraft::new("XYZ789", "Airbus"))?;
                let flight = conn.create_flight(&NewFlight {
                    departure_airport: "KJFK".into(),
                    arrival_airport: "EGLL".into(),
                    departure_time: ts(2, 10),
                    arrival_time: ts(2, 14),
                    aircraft_id: None,
                })?;
                Ok((a, b, flight))
            })
            .unwrap();
        Fixture {
            storage,
            aircraft_a,
            aircraft_b,
            flight,
        }
    }

    #[test]
    fn test_assign_sets_aircraft_and_joins_serial() {
        let f = fixture();
        let view = f
            .storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();

        assert_eq!(view.flight.aircraft_id, Some(f.aircraft_a.id));
        assert_eq!(view.aircraft_serial_number.as_deref(), Some("ABC123"));

        let stored = f
            .storage
            .read(|conn| require_flight(conn, f.flight.id))
            .unwrap();
        assert_eq!(stored.aircraft_id, Some(f.aircraft_a.id));
    }

    #[test]
    fn test_assign_is_idempotent() {
        let f = fixture();
        let first = f
            .storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();
        let second = f
            .storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reassign_to_other_aircraft() {
        let f = fixture();
        f.storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();
        let view = f
            .storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_b.id))
            .unwrap();
        assert_eq!(view.flight.aircraft_id, Some(f.aircraft_b.id));
        assert_eq!(view.aircraft_serial_number.as_deref(), Some("XYZ789"));
    }

    #[test]
    fn test_assign_missing_aircraft_keeps_prior_assignment() {
        let f = fixture();
        f.storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();

        let err = f
            .storage
            .write(|conn| assign(conn, f.flight.id, 999))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: EntityKind::Aircraft,
                id: 999
            }
        ));

        let stored = f
            .storage
            .read(|conn| require_flight(conn, f.flight.id))
            .unwrap();
        assert_eq!(stored.aircraft_id, Some(f.aircraft_a.id));
    }

    #[test]
    fn test_assign_missing_flight() {
        let f = fixture();
        let err = f
            .storage
            .write(|conn| assign(conn, 999, f.aircraft_a.id))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: EntityKind::Flight,
                ..
            }
        ));
    }

    #[test]
    fn test_unassign_is_idempotent() {
        let f = fixture();
        f.storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();

        let first = f.storage.write(|conn| unassign(conn, f.flight.id)).unwrap();
        let second = f.storage.write(|conn| unassign(conn, f.flight.id)).unwrap();

        assert_eq!(first.flight.aircraft_id, None);
        assert!(first.aircraft_serial_number.is_none());
        assert_eq!(first, second);
    }

    #[test]
    fn test_guard_delete_blocks_referenced_aircraft() {
        let f = fixture();
        f.storage
            .write(|conn| assign(conn, f.flight.id, f.aircraft_a.id))
            .unwrap();

        let err = f
            .storage
            .read(|conn| guard_delete_aircraft(conn, f.aircraft_a.id))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AircraftInUse);

        assert!(f
            .storage
            .read(|conn| guard_delete_aircraft(conn, f.aircraft_b.id))
            .is_ok());
    }

    #[test]
    fn test_guard_delete_missing_aircraft() {
        let f = fixture();
        let err = f
            .storage
            .read(|conn| guard_delete_aircraft(conn, 4242))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_view_without_assignment() {
        let f = fixture();
        let view = f
            .storage
            .read(|conn| view(conn, f.flight.clone()))
            .unwrap();
        assert!(view.aircraft_serial_number.is_none());
    }
}
