//! Error types for airfleet.
//!
//! Every failure the domain core can produce maps onto one [`ErrorKind`].
//! The request layer (the CLI in this crate) relies on that mapping being
//! stable and lossless, so new variants must be given a kind explicitly.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An aircraft record.
    Aircraft,
    /// A flight record.
    Flight,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aircraft => write!(f, "aircraft"),
            Self::Flight => write!(f, "flight"),
        }
    }
}

/// The main error type for airfleet operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A field value is malformed: an airport code that is not a 4-letter
    /// uppercase ICAO code, or a blank required text field.
    #[error("invalid {field}: '{value}'")]
    InvalidFormat {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A departure time is not strictly in the future.
    #[error("departure time {departure} must be in the future (now: {now})")]
    PastDeparture {
        /// The rejected departure time.
        departure: NaiveDateTime,
        /// The reference time used for the check.
        now: NaiveDateTime,
    },

    /// An arrival time is not strictly after the departure time.
    #[error("arrival time {arrival} must be after departure time {departure}")]
    InvalidOrdering {
        /// Departure time of the candidate flight.
        departure: NaiveDateTime,
        /// Arrival time of the candidate flight.
        arrival: NaiveDateTime,
    },

    /// Another aircraft already uses this serial number.
    #[error("aircraft with serial number '{serial_number}' already exists")]
    DuplicateSerial {
        /// The colliding serial number.
        serial_number: String,
    },

    // === Reference Errors ===
    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Which kind of entity was looked up.
        entity: EntityKind,
        /// The identifier that was looked up.
        id: i64,
    },

    /// An aircraft cannot be deleted while flights reference it.
    #[error("aircraft {aircraft_id} is assigned to {flight_count} flight(s) and cannot be deleted")]
    AircraftInUse {
        /// The aircraft whose deletion was refused.
        aircraft_id: i64,
        /// Number of flights still referencing it.
        flight_count: i64,
    },

    // === Reporting Errors ===
    /// A report window starts after it ends.
    #[error("report window start {start} is after end {end}")]
    InvalidRange {
        /// Requested window start.
        start: NaiveDateTime,
        /// Requested window end.
        end: NaiveDateTime,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The storage connection lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    LockPoisoned,

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// A timestamp argument could not be parsed.
    #[error("invalid timestamp '{value}': expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS[.fff]]")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for airfleet operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// Stable classification of an [`Error`].
///
/// The first eight kinds are produced by the domain core; the rest only
/// come from the surrounding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed ICAO code.
    InvalidFormat,
    /// Departure not in the future.
    PastDeparture,
    /// Arrival not after departure.
    InvalidOrdering,
    /// Serial number collision.
    DuplicateSerial,
    /// Referenced entity missing.
    NotFound,
    /// Aircraft deletion blocked by flight references.
    AircraftInUse,
    /// Report window with start after end.
    InvalidRange,
    /// Underlying persistence failure.
    StoreError,
    /// Configuration could not be loaded or is invalid.
    Config,
    /// Request input could not be parsed.
    InvalidInput,
    /// Output could not be produced.
    Output,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::PastDeparture => "past_departure",
            Self::InvalidOrdering => "invalid_ordering",
            Self::DuplicateSerial => "duplicate_serial",
            Self::NotFound => "not_found",
            Self::AircraftInUse => "aircraft_in_use",
            Self::InvalidRange => "invalid_range",
            Self::StoreError => "store_error",
            Self::Config => "config",
            Self::InvalidInput => "invalid_input",
            Self::Output => "output",
        }
    }

    /// Process exit code used by the CLI. Each kind gets its own code.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::InvalidFormat => 10,
            Self::PastDeparture => 11,
            Self::InvalidOrdering => 12,
            Self::DuplicateSerial => 13,
            Self::NotFound => 14,
            Self::AircraftInUse => 15,
            Self::InvalidRange => 16,
            Self::StoreError => 20,
            Self::Config => 21,
            Self::InvalidInput => 22,
            Self::Output => 23,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::PastDeparture { .. } => ErrorKind::PastDeparture,
            Self::InvalidOrdering { .. } => ErrorKind::InvalidOrdering,
            Self::DuplicateSerial { .. } => ErrorKind::DuplicateSerial,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AircraftInUse { .. } => ErrorKind::AircraftInUse,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::DirectoryCreate { .. }
            | Self::LockPoisoned => ErrorKind::StoreError,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Config,
            Self::InvalidTimestamp { .. } => ErrorKind::InvalidInput,
            Self::Json(_) => ErrorKind::Output,
        }
    }

    /// Create a not-found error for an aircraft.
    #[must_use]
    pub fn aircraft_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: EntityKind::Aircraft,
            id,
        }
    }

    /// Create a not-found error for a flight.
    #[must_use]
    pub fn flight_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: EntityKind::Flight,
            id,
        }
    }

    /// Create a duplicate serial number error.
    #[must_use]
    pub fn duplicate_serial(serial_number: impl Into<String>) -> Self {
        Self::DuplicateSerial {
            serial_number: serial_number.into(),
        }
    }

    /// Check if this error is a domain validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidFormat
                | ErrorKind::PastDeparture
                | ErrorKind::InvalidOrdering
                | ErrorKind::DuplicateSerial
                | ErrorKind::InvalidRange
        )
    }

    /// Check if this error indicates a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
