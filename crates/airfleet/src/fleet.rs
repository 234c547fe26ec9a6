//! The request-facing fleet service.
//!
//! [`Fleet`] wires validation, assignment and reporting onto a [`Storage`].
//! Every mutation runs its checks and its write inside one immediate
//! transaction, so concurrent callers cannot interleave between a check and
//! the write it authorizes.

use chrono::{NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::assignment::{self, require_aircraft, require_flight};
use crate::error::Result;
use crate::model::{
    Aircraft, AircraftId, AircraftPatch, FlightFilter, FlightId, FlightPatch, FlightView,
    NewAircraft, NewFlight,
};
use crate::report::{self, FlightReport};
use crate::storage::{EntityStore, Storage, StorageStats};
use crate::validation::{
    validate_aircraft_update, validate_flight_update, validate_icao, validate_new_aircraft,
    validate_new_flight,
};

/// Source of the reference time for "departure in the future" checks.
pub trait Clock: Send + Sync {
    /// The current time as a naive UTC timestamp.
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Fleet operations over a storage backend.
#[derive(Debug)]
pub struct Fleet<C = SystemClock> {
    storage: Storage,
    clock: C,
}

impl Fleet<SystemClock> {
    /// Create a fleet service using the system clock.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<C: Clock> Fleet<C> {
    /// Create a fleet service with an explicit clock.
    #[must_use]
    pub fn with_clock(storage: Storage, clock: C) -> Self {
        Self { storage, clock }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The current reference time.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    // ---- aircraft ----

    /// List every aircraft ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn list_aircraft(&self) -> Result<Vec<Aircraft>> {
        self.storage.read(|conn| conn.list_aircraft())
    }

    /// Get one aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if it does not exist.
    pub fn get_aircraft(&self, aircraft_id: AircraftId) -> Result<Aircraft> {
        self.storage
            .read(|conn| require_aircraft(conn, aircraft_id))
    }

    /// Register a new aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSerial`](crate::Error::DuplicateSerial) if
    /// the serial number is taken, or
    /// [`Error::InvalidFormat`](crate::Error::InvalidFormat) for a blank field.
    pub fn create_aircraft(&self, new: &NewAircraft) -> Result<Aircraft> {
        self.storage.write(|conn| {
            let existing = conn.find_aircraft_by_serial(&new.serial_number)?;
            validate_new_aircraft(new, existing.iter().map(|a| a.serial_number.as_str()))
                .inspect_err(|err| warn!("Rejected aircraft {}: {}", new.serial_number, err))?;

            let aircraft = conn.create_aircraft(new)?;
            info!(
                "Created aircraft {} ({}, {})",
                aircraft.id, aircraft.serial_number, aircraft.manufacturer
            );
            Ok(aircraft)
        })
    }

    /// Apply a partial update to an aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound),
    /// [`Error::DuplicateSerial`](crate::Error::DuplicateSerial) or
    /// [`Error::InvalidFormat`](crate::Error::InvalidFormat).
    pub fn update_aircraft(
        &self,
        aircraft_id: AircraftId,
        patch: &AircraftPatch,
    ) -> Result<Aircraft> {
        self.storage.write(|conn| {
            let current = require_aircraft(conn, aircraft_id)?;
            if patch.is_empty() {
                return Ok(current);
            }

            let existing = match &patch.serial_number {
                Some(serial) => conn.find_aircraft_by_serial(serial)?,
                None => None,
            };
            let candidate = validate_aircraft_update(
                &current,
                patch,
                existing.iter().map(|a| a.serial_number.as_str()),
            )
            .inspect_err(|err| warn!("Rejected update of aircraft {}: {}", aircraft_id, err))?;

            if candidate != current {
                conn.update_aircraft(&candidate)?;
                info!("Updated aircraft {}", aircraft_id);
            }
            Ok(candidate)
        })
    }

    /// Delete an aircraft that no flight references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) or
    /// [`Error::AircraftInUse`](crate::Error::AircraftInUse).
    pub fn delete_aircraft(&self, aircraft_id: AircraftId) -> Result<()> {
        self.storage.write(|conn| {
            assignment::guard_delete_aircraft(conn, aircraft_id)?;
            conn.delete_aircraft(aircraft_id)?;
            info!("Deleted aircraft {}", aircraft_id);
            Ok(())
        })
    }

    // ---- flights ----

    /// List flights matching `filter`, ordered by departure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`](crate::Error::InvalidFormat) for a
    /// malformed airport filter, or a store error.
    pub fn list_flights(&self, filter: &FlightFilter) -> Result<Vec<FlightView>> {
        if let Some(code) = &filter.departure_airport {
            validate_icao("departure_airport", code)?;
        }
        if let Some(code) = &filter.arrival_airport {
            validate_icao("arrival_airport", code)?;
        }

        self.storage.read(|conn| {
            conn.list_flights(filter)?
                .into_iter()
                .map(|flight| assignment::view(conn, flight))
                .collect()
        })
    }

    /// Get one flight with its aircraft's serial number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if it does not exist.
    pub fn get_flight(&self, flight_id: FlightId) -> Result<FlightView> {
        self.storage.read(|conn| {
            let flight = require_flight(conn, flight_id)?;
            assignment::view(conn, flight)
        })
    }

    /// Schedule a new flight, optionally with an aircraft.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant, or
    /// [`Error::NotFound`](crate::Error::NotFound) for a missing aircraft.
    pub fn create_flight(&self, new: &NewFlight) -> Result<FlightView> {
        let now = self.clock.now();
        validate_new_flight(new, now).inspect_err(|err| warn!("Rejected flight: {}", err))?;

        self.storage.write(|conn| {
            if let Some(aircraft_id) = new.aircraft_id {
                require_aircraft(conn, aircraft_id)?;
            }
            let flight = conn.create_flight(new)?;
            info!(
                "Created flight {} {} -> {} departing {}",
                flight.id, flight.departure_airport, flight.arrival_airport, flight.departure_time
            );
            assignment::view(conn, flight)
        })
    }

    /// Apply a partial update to a flight.
    ///
    /// Only the touched fields and the cross-field rules they affect are
    /// re-validated.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant, or
    /// [`Error::NotFound`](crate::Error::NotFound) for a missing flight or
    /// aircraft.
    pub fn update_flight(&self, flight_id: FlightId, patch: &FlightPatch) -> Result<FlightView> {
        let now = self.clock.now();
        self.storage.write(|conn| {
            let current = require_flight(conn, flight_id)?;
            let candidate = validate_flight_update(&current, patch, now)
                .inspect_err(|err| warn!("Rejected update of flight {}: {}", flight_id, err))?;
            if let Some(Some(aircraft_id)) = patch.aircraft_id {
                require_aircraft(conn, aircraft_id)?;
            }

            if candidate != current {
                conn.update_flight(&candidate)?;
                info!("Updated flight {}", flight_id);
            }
            assignment::view(conn, candidate)
        })
    }

    /// Delete a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if it does not exist.
    pub fn delete_flight(&self, flight_id: FlightId) -> Result<()> {
        self.storage.write(|conn| {
            conn.delete_flight(flight_id)?;
            info!("Deleted flight {}", flight_id);
            Ok(())
        })
    }

    /// Assign an aircraft to a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if either is
    /// missing.
    pub fn assign(&self, flight_id: FlightId, aircraft_id: AircraftId) -> Result<FlightView> {
        self.storage
            .write(|conn| assignment::assign(conn, flight_id, aircraft_id))
    }

    /// Clear a flight's aircraft assignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the flight is
    /// missing.
    pub fn unassign(&self, flight_id: FlightId) -> Result<FlightView> {
        self.storage
            .write(|conn| assignment::unassign(conn, flight_id))
    }

    // ---- reporting ----

    /// Build the flight statistics report for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`](crate::Error::InvalidRange) if
    /// `start > end`, or a store error.
    pub fn report(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<FlightReport> {
        self.storage
            .read(|conn| report::generate(conn, start, end))
    }

    /// Storage statistics.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    /// Delete every flight and aircraft.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn clear(&self) -> Result<(usize, usize)> {
        self.storage.clear()
    }
}
