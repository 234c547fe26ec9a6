//! Storage layer for airfleet.
//!
//! [`EntityStore`] is the narrow interface the domain core consumes. It is
//! implemented for [`rusqlite::Connection`], so the same code runs against a
//! plain connection or inside a transaction (which derefs to one).
//! [`Storage`] owns the connection and hands out transactional scopes.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};
use rusqlite::{
    ffi, params, params_from_iter, Connection, OptionalExtension, TransactionBehavior,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    format_timestamp, Aircraft, AircraftId, Flight, FlightFilter, FlightId, NewAircraft,
    NewFlight, TIMESTAMP_FORMAT,
};

/// Busy timeout used when none is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const AIRCRAFT_COLUMNS: &str = "id, serial_number, manufacturer";
const FLIGHT_COLUMNS: &str =
    "id, departure_airport, arrival_airport, departure_time, arrival_time, aircraft_id";

/// Record-level access to aircraft and flights.
///
/// Lookups return `Ok(None)` for missing rows; mutations of missing rows fail
/// with [`Error::NotFound`]. Any other failure is a store error.
pub trait EntityStore {
    /// Get an aircraft by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_aircraft(&self, id: AircraftId) -> Result<Option<Aircraft>>;

    /// List all aircraft ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_aircraft(&self) -> Result<Vec<Aircraft>>;

    /// Find the aircraft carrying `serial_number`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_aircraft_by_serial(&self, serial_number: &str) -> Result<Option<Aircraft>>;

    /// Insert a new aircraft and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSerial`] if the unique constraint fires.
    fn create_aircraft(&self, new: &NewAircraft) -> Result<Aircraft>;

    /// Overwrite an existing aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::DuplicateSerial`].
    fn update_aircraft(&self, aircraft: &Aircraft) -> Result<()>;

    /// Delete an aircraft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], or [`Error::AircraftInUse`] if the
    /// foreign key still has referencing flights.
    fn delete_aircraft(&self, id: AircraftId) -> Result<()>;

    /// Get a flight by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_flight(&self, id: FlightId) -> Result<Option<Flight>>;

    /// List flights matching `filter`, ordered by departure time then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_flights(&self, filter: &FlightFilter) -> Result<Vec<Flight>>;

    /// Count flights referencing an aircraft.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn count_flights_for_aircraft(&self, aircraft_id: AircraftId) -> Result<i64>;

    /// Insert a new flight and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the referenced aircraft is missing.
    fn create_flight(&self, new: &NewFlight) -> Result<Flight>;

    /// Overwrite an existing flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing flight or aircraft.
    fn update_flight(&self, flight: &Flight) -> Result<()>;

    /// Delete a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such flight exists.
    fn delete_flight(&self, id: FlightId) -> Result<()>;
}

impl EntityStore for Connection {
    fn get_aircraft(&self, id: AircraftId) -> Result<Option<Aircraft>> {
        let aircraft = self
            .query_row(
                &format!("SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE id = ?1"),
                [id],
                row_to_aircraft,
            )
            .optional()?;
        Ok(aircraft)
    }

    fn list_aircraft(&self) -> Result<Vec<Aircraft>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {AIRCRAFT_COLUMNS} FROM aircraft ORDER BY id"
        ))?;
        let aircraft = stmt
            .query_map([], row_to_aircraft)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(aircraft)
    }

    fn find_aircraft_by_serial(&self, serial_number: &str) -> Result<Option<Aircraft>> {
        let aircraft = self
            .query_row(
                &format!("SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE serial_number = ?1"),
                [serial_number],
                row_to_aircraft,
            )
            .optional()?;
        Ok(aircraft)
    }

    fn create_aircraft(&self, new: &NewAircraft) -> Result<Aircraft> {
        self.execute(
            "INSERT INTO aircraft (serial_number, manufacturer) VALUES (?1, ?2)",
            params![new.serial_number, new.manufacturer],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::duplicate_serial(&new.serial_number)
            } else {
                err.into()
            }
        })?;

        let id = self.last_insert_rowid();
        debug!("Inserted aircraft with id {}", id);
        Ok(Aircraft {
            id,
            serial_number: new.serial_number.clone(),
            manufacturer: new.manufacturer.clone(),
        })
    }

    fn update_aircraft(&self, aircraft: &Aircraft) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE aircraft SET serial_number = ?1, manufacturer = ?2 WHERE id = ?3",
                params![aircraft.serial_number, aircraft.manufacturer, aircraft.id],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    Error::duplicate_serial(&aircraft.serial_number)
                } else {
                    err.into()
                }
            })?;
        if affected == 0 {
            return Err(Error::aircraft_not_found(aircraft.id));
        }
        Ok(())
    }

    fn delete_aircraft(&self, id: AircraftId) -> Result<()> {
        let affected = match self.execute("DELETE FROM aircraft WHERE id = ?1", [id]) {
            Ok(affected) => affected,
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(Error::AircraftInUse {
                    aircraft_id: id,
                    flight_count: self.count_flights_for_aircraft(id)?,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if affected == 0 {
            return Err(Error::aircraft_not_found(id));
        }
        debug!("Deleted aircraft {}", id);
        Ok(())
    }

    fn get_flight(&self, id: FlightId) -> Result<Option<Flight>> {
        let flight = self
            .query_row(
                &format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?1"),
                [id],
                row_to_flight,
            )
            .optional()?;
        Ok(flight)
    }

    fn list_flights(&self, filter: &FlightFilter) -> Result<Vec<Flight>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(airport) = &filter.departure_airport {
            values.push(Value::Text(airport.clone()));
            clauses.push(format!("departure_airport = ?{}", values.len()));
        }
        if let Some(airport) = &filter.arrival_airport {
            values.push(Value::Text(airport.clone()));
            clauses.push(format!("arrival_airport = ?{}", values.len()));
        }
        if let Some(after) = filter.departure_after {
            values.push(Value::Text(format_timestamp(after)));
            clauses.push(format!("departure_time >= ?{}", values.len()));
        }
        if let Some(before) = filter.departure_before {
            values.push(Value::Text(format_timestamp(before)));
            clauses.push(format!("departure_time <= ?{}", values.len()));
        }
        if let Some(aircraft_id) = filter.aircraft_id {
            values.push(Value::Integer(aircraft_id));
            clauses.push(format!("aircraft_id = ?{}", values.len()));
        }

        let mut sql = format!("SELECT {FLIGHT_COLUMNS} FROM flights");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY departure_time, id");

        let mut stmt = self.prepare(&sql)?;
        let flights = stmt
            .query_map(params_from_iter(values.iter()), row_to_flight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(flights)
    }

    fn count_flights_for_aircraft(&self, aircraft_id: AircraftId) -> Result<i64> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM flights WHERE aircraft_id = ?1",
            [aircraft_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn create_flight(&self, new: &NewFlight) -> Result<Flight> {
        self.execute(
            r"
            INSERT INTO flights
                (departure_airport, arrival_airport, departure_time, arrival_time, aircraft_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                new.departure_airport,
                new.arrival_airport,
                format_timestamp(new.departure_time),
                format_timestamp(new.arrival_time),
                new.aircraft_id,
            ],
        )
        .map_err(|err| missing_aircraft_or(err, new.aircraft_id))?;

        let id = self.last_insert_rowid();
        debug!("Inserted flight with id {}", id);
        Ok(Flight {
            id,
            departure_airport: new.departure_airport.clone(),
            arrival_airport: new.arrival_airport.clone(),
            departure_time: new.departure_time,
            arrival_time: new.arrival_time,
            aircraft_id: new.aircraft_id,
        })
    }

    fn update_flight(&self, flight: &Flight) -> Result<()> {
        let affected = self
            .execute(
                r"
                UPDATE flights SET
                    departure_airport = ?1,
                    arrival_airport = ?2,
                    departure_time = ?3,
                    arrival_time = ?4,
                    aircraft_id = ?5
                WHERE id = ?6
                ",
                params![
                    flight.departure_airport,
                    flight.arrival_airport,
                    format_timestamp(flight.departure_time),
                    format_timestamp(flight.arrival_time),
                    flight.aircraft_id,
                    flight.id,
                ],
            )
            .map_err(|err| missing_aircraft_or(err, flight.aircraft_id))?;
        if affected == 0 {
            return Err(Error::flight_not_found(flight.id));
        }
        Ok(())
    }

    fn delete_flight(&self, id: FlightId) -> Result<()> {
        let affected = self.execute("DELETE FROM flights WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::flight_not_found(id));
        }
        debug!("Deleted flight {}", id);
        Ok(())
    }
}

fn violates(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended_code
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    violates(err, ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// SQLite reports `ON DELETE RESTRICT` through the trigger code, and
/// deferred or immediate checks through the foreign-key code.
fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    violates(err, ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
        || violates(err, ffi::SQLITE_CONSTRAINT_TRIGGER)
}

/// Map a foreign-key failure on a flight write to a missing aircraft.
fn missing_aircraft_or(err: rusqlite::Error, aircraft_id: Option<AircraftId>) -> Error {
    match aircraft_id {
        Some(id) if is_foreign_key_violation(&err) => Error::aircraft_not_found(id),
        _ => err.into(),
    }
}

fn row_to_aircraft(row: &rusqlite::Row) -> rusqlite::Result<Aircraft> {
    Ok(Aircraft {
        id: row.get(0)?,
        serial_number: row.get(1)?,
        manufacturer: row.get(2)?,
    })
}

fn row_to_flight(row: &rusqlite::Row) -> rusqlite::Result<Flight> {
    Ok(Flight {
        id: row.get(0)?,
        departure_airport: row.get(1)?,
        arrival_airport: row.get(2)?,
        departure_time: timestamp_column(row, 3)?,
        arrival_time: timestamp_column(row, 4)?,
        aircraft_id: row.get(5)?,
    })
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Owner of the database connection.
///
/// All access goes through [`Storage::read`] or [`Storage::write`], each of
/// which runs the closure inside a transaction while holding the connection
/// lock. Writes use `BEGIN IMMEDIATE`, so the database write lock is held
/// from the first read of a check-then-act sequence until commit, which
/// also serializes writers in other processes using the same file.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(busy_timeout)?;
        // WAL lets report readers proceed while a writer holds the lock
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::prepare_connection(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::prepare_connection(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    fn prepare_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::initialize_schema(conn)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Run `f` inside a read transaction.
    ///
    /// Every row `f` sees comes from one consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a store error.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside an immediate write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; otherwise every
    /// change `f` made is rolled back.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a store error.
    pub fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Delete every flight and then every aircraft.
    ///
    /// Returns `(flights_deleted, aircraft_deleted)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<(usize, usize)> {
        self.write(|conn| {
            let flights = conn.execute("DELETE FROM flights", [])?;
            let aircraft = conn.execute("DELETE FROM aircraft", [])?;
            info!("Cleared {} flights and {} aircraft", flights, aircraft);
            Ok((flights, aircraft))
        })
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (aircraft_count, flight_count, assigned_flight_count, earliest, latest) =
            self.read(|conn| {
                let counts = conn.query_row(
                    r"
                    SELECT
                        (SELECT COUNT(*) FROM aircraft),
                        (SELECT COUNT(*) FROM flights),
                        (SELECT COUNT(*) FROM flights WHERE aircraft_id IS NOT NULL),
                        (SELECT MIN(departure_time) FROM flights),
                        (SELECT MAX(departure_time) FROM flights)
                    ",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )?;
                Ok(counts)
            })?;

        let parse = |raw: Option<String>| {
            raw.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok())
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            aircraft_count,
            flight_count,
            assigned_flight_count,
            earliest_departure: parse(earliest),
            latest_departure: parse(latest),
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of aircraft stored.
    pub aircraft_count: i64,
    /// Number of flights stored.
    pub flight_count: i64,
    /// Number of flights with an aircraft assigned.
    pub assigned_flight_count: i64,
    /// Earliest scheduled departure.
    pub earliest_departure: Option<NaiveDateTime>,
    /// Latest scheduled departure.
    pub latest_departure: Option<NaiveDateTime>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EntityKind, ErrorKind};
    use chrono::NaiveDate;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn new_flight(from: &str, day: u32, aircraft_id: Option<AircraftId>) -> NewFlight {
        NewFlight {
            departure_airport: from.to_string(),
            arrival_airport: "EGLL".to_string(),
            departure_time: ts(day, 10),
            arrival_time: ts(day, 14),
            aircraft_id,
        }
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_create_and_get_aircraft() {
        let storage = create_test_storage();
        let created = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();

        let fetched = storage.read(|conn| conn.get_aircraft(created.id)).unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[test]
    fn test_unique_serial_constraint() {
        let storage = create_test_storage();
        storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();

        let err = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Airbus")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSerial);
    }

    #[test]
    fn test_find_aircraft_by_serial() {
        let storage = create_test_storage();
        storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();

        let found = storage
            .read(|conn| conn.find_aircraft_by_serial("ABC123"))
            .unwrap();
        assert_eq!(found.map(|a| a.manufacturer), Some("Boeing".to_string()));
        assert!(storage
            .read(|conn| conn.find_aircraft_by_serial("NOPE"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_missing_aircraft() {
        let storage = create_test_storage();
        let ghost = Aircraft {
            id: 42,
            serial_number: "X".into(),
            manufacturer: "Y".into(),
        };
        let err = storage.write(|conn| conn.update_aircraft(&ghost)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_referenced_aircraft_is_restricted() {
        let storage = create_test_storage();
        let aircraft = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();
        storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, Some(aircraft.id))))
            .unwrap();

        let err = storage
            .write(|conn| conn.delete_aircraft(aircraft.id))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AircraftInUse {
                flight_count: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_restrict_violation_is_recognised() {
        let storage = create_test_storage();
        let aircraft = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();
        storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, Some(aircraft.id))))
            .unwrap();

        let conn = storage.lock().unwrap();
        let err = conn
            .execute("DELETE FROM aircraft WHERE id = ?1", [aircraft.id])
            .unwrap_err();
        assert!(is_foreign_key_violation(&err));
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn test_corrupt_timestamp_is_store_error() {
        let storage = create_test_storage();
        let flight = storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, None)))
            .unwrap();
        storage
            .write(|conn| {
                conn.execute(
                    "UPDATE flights SET departure_time = 'not a time' WHERE id = ?1",
                    [flight.id],
                )?;
                Ok(())
            })
            .unwrap();

        let err = storage.read(|conn| conn.get_flight(flight.id)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn test_delete_missing_rows() {
        let storage = create_test_storage();
        assert!(storage
            .write(|conn| conn.delete_aircraft(99))
            .unwrap_err()
            .is_not_found());
        assert!(storage
            .write(|conn| conn.delete_flight(99))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_flight_with_missing_aircraft_fails() {
        let storage = create_test_storage();
        let err = storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, Some(77))))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: EntityKind::Aircraft,
                id: 77
            }
        ));
    }

    #[test]
    fn test_create_and_get_flight_round_trips_times() {
        let storage = create_test_storage();
        let flight = storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, None)))
            .unwrap();

        let fetched = storage
            .read(|conn| conn.get_flight(flight.id))
            .unwrap()
            .unwrap();
        assert_eq!(fetched, flight);
        assert_eq!(fetched.departure_time, ts(2, 10));
    }

    #[test]
    fn test_list_flights_filters() {
        let storage = create_test_storage();
        let aircraft = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();
        storage
            .write(|conn| {
                conn.create_flight(&new_flight("KJFK", 2, Some(aircraft.id)))?;
                conn.create_flight(&new_flight("KLAX", 3, None))?;
                conn.create_flight(&new_flight("KJFK", 5, None))
            })
            .unwrap();

        let all = storage
            .read(|conn| conn.list_flights(&FlightFilter::default()))
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].departure_time <= w[1].departure_time));

        let jfk = FlightFilter {
            departure_airport: Some("KJFK".into()),
            ..FlightFilter::default()
        };
        assert_eq!(storage.read(|conn| conn.list_flights(&jfk)).unwrap().len(), 2);

        let window = FlightFilter::departing_between(ts(2, 10), ts(3, 10));
        assert_eq!(
            storage.read(|conn| conn.list_flights(&window)).unwrap().len(),
            2
        );

        let by_aircraft = FlightFilter {
            aircraft_id: Some(aircraft.id),
            ..FlightFilter::default()
        };
        assert_eq!(
            storage
                .read(|conn| conn.list_flights(&by_aircraft))
                .unwrap()
                .len(),
            1
        );

        let arriving = FlightFilter {
            arrival_airport: Some("LFPG".into()),
            ..FlightFilter::default()
        };
        assert!(storage
            .read(|conn| conn.list_flights(&arriving))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let storage = create_test_storage();
        let result: Result<()> = storage.write(|conn| {
            conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing"))?;
            Err(Error::duplicate_serial("forced"))
        });
        assert!(result.is_err());

        let all = storage.read(|conn| conn.list_aircraft()).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_clear() {
        let storage = create_test_storage();
        let aircraft = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();
        storage
            .write(|conn| conn.create_flight(&new_flight("KJFK", 2, Some(aircraft.id))))
            .unwrap();

        assert_eq!(storage.clear().unwrap(), (1, 1));
        assert_eq!(storage.stats().unwrap().aircraft_count, 0);
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let empty = storage.stats().unwrap();
        assert_eq!(empty.flight_count, 0);
        assert!(empty.earliest_departure.is_none());

        let aircraft = storage
            .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
            .unwrap();
        storage
            .write(|conn| {
                conn.create_flight(&new_flight("KJFK", 2, Some(aircraft.id)))?;
                conn.create_flight(&new_flight("KLAX", 4, None))
            })
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.aircraft_count, 1);
        assert_eq!(stats.flight_count, 2);
        assert_eq!(stats.assigned_flight_count, 1);
        assert_eq!(stats.earliest_departure, Some(ts(2, 10)));
        assert_eq!(stats.latest_departure, Some(ts(4, 10)));
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/fleet.db");

        let storage = Storage::open(&nested, DEFAULT_BUSY_TIMEOUT).unwrap();
        assert!(nested.exists());
        assert_eq!(storage.path(), nested);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.db");

        {
            let storage = Storage::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
            storage
                .write(|conn| conn.create_aircraft(&NewAircraft::new("ABC123", "Boeing")))
                .unwrap();
        }

        let storage = Storage::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let all = storage.read(|conn| conn.list_aircraft()).unwrap();
        assert_eq!(all.len(), 1);
    }
}
