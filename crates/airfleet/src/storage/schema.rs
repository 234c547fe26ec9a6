//! `SQLite` schema definitions for airfleet.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the aircraft table.
pub const CREATE_AIRCRAFT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS aircraft (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial_number TEXT NOT NULL UNIQUE,
    manufacturer TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the flights table.
///
/// Deleting an aircraft that is still referenced fails at the storage level
/// as well as in the assignment guard.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    departure_airport TEXT NOT NULL CHECK (length(departure_airport) = 4),
    arrival_airport TEXT NOT NULL CHECK (length(arrival_airport) = 4),
    departure_time TEXT NOT NULL,
    arrival_time TEXT NOT NULL,
    aircraft_id INTEGER REFERENCES aircraft(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on `departure_time` for window queries.
pub const CREATE_DEPARTURE_TIME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_departure_time ON flights(departure_time)
";

/// SQL statement to create an index on `departure_airport` for filtering.
pub const CREATE_DEPARTURE_AIRPORT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_departure_airport ON flights(departure_airport)
";

/// SQL statement to create an index on `aircraft_id` for the deletion guard.
pub const CREATE_AIRCRAFT_ID_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_aircraft_id ON flights(aircraft_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_AIRCRAFT_TABLE,
    CREATE_FLIGHTS_TABLE,
    CREATE_DEPARTURE_TIME_INDEX,
    CREATE_DEPARTURE_AIRPORT_INDEX,
    CREATE_AIRCRAFT_ID_INDEX,
    CREATE_METADATA_TABLE,
];
