//! CLI command definitions.
//!
//! Timestamps are taken as strings and parsed here rather than by clap, so a
//! malformed value surfaces as
//! [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp) with its own
//! exit code.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Subcommand};

use crate::error::Result;
use crate::model::{
    parse_timestamp, AircraftId, AircraftPatch, FlightFilter, FlightId, FlightPatch, NewFlight,
};

fn parse_optional(value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    value.map(parse_timestamp).transpose()
}

/// Aircraft management commands.
#[derive(Debug, Subcommand)]
pub enum AircraftCommand {
    /// List all aircraft
    List,

    /// Show one aircraft
    Show {
        /// Aircraft id
        id: AircraftId,
    },

    /// Register a new aircraft
    Add {
        /// Unique serial number
        #[arg(short, long)]
        serial: String,

        /// Manufacturer name
        #[arg(short, long)]
        manufacturer: String,
    },

    /// Change an aircraft's serial number or manufacturer
    Update {
        /// Aircraft id
        id: AircraftId,

        /// New serial number
        #[arg(short, long)]
        serial: Option<String>,

        /// New manufacturer name
        #[arg(short, long)]
        manufacturer: Option<String>,
    },

    /// Delete an aircraft that no flight references
    Delete {
        /// Aircraft id
        id: AircraftId,
    },
}

impl AircraftCommand {
    /// Build the patch for `update`.
    #[must_use]
    pub fn patch(serial: Option<String>, manufacturer: Option<String>) -> AircraftPatch {
        AircraftPatch {
            serial_number: serial,
            manufacturer,
        }
    }
}

/// Flight management commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// List flights, optionally filtered
    List(FlightListArgs),

    /// Show one flight
    Show {
        /// Flight id
        id: FlightId,
    },

    /// Schedule a new flight
    Add(FlightAddArgs),

    /// Change fields of a flight
    Update(FlightUpdateArgs),

    /// Delete a flight
    Delete {
        /// Flight id
        id: FlightId,
    },

    /// Assign an aircraft to a flight
    Assign {
        /// Flight id
        flight_id: FlightId,

        /// Aircraft id
        aircraft_id: AircraftId,
    },

    /// Remove a flight's aircraft assignment
    Unassign {
        /// Flight id
        flight_id: FlightId,
    },
}

/// Filters for `flight list`.
#[derive(Debug, Default, Args)]
pub struct FlightListArgs {
    /// Departure airport (ICAO)
    #[arg(long = "from", value_name = "ICAO")]
    pub departure_airport: Option<String>,

    /// Arrival airport (ICAO)
    #[arg(long = "to", value_name = "ICAO")]
    pub arrival_airport: Option<String>,

    /// Only flights departing at or after this time
    #[arg(long, value_name = "TIME")]
    pub after: Option<String>,

    /// Only flights departing at or before this time
    #[arg(long, value_name = "TIME")]
    pub before: Option<String>,

    /// Only flights assigned to this aircraft
    #[arg(long, value_name = "ID")]
    pub aircraft: Option<AircraftId>,
}

impl FlightListArgs {
    /// Convert into a store filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp) for an unparseable time.
    pub fn to_filter(&self) -> Result<FlightFilter> {
        Ok(FlightFilter {
            departure_airport: self.departure_airport.clone(),
            arrival_airport: self.arrival_airport.clone(),
            departure_after: parse_optional(self.after.as_deref())?,
            departure_before: parse_optional(self.before.as_deref())?,
            aircraft_id: self.aircraft,
        })
    }
}

/// Arguments for `flight add`.
#[derive(Debug, Args)]
pub struct FlightAddArgs {
    /// Departure airport (ICAO)
    #[arg(long = "from", value_name = "ICAO")]
    pub departure_airport: String,

    /// Arrival airport (ICAO)
    #[arg(long = "to", value_name = "ICAO")]
    pub arrival_airport: String,

    /// Departure time (RFC 3339 or YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, value_name = "TIME")]
    pub departure: String,

    /// Arrival time (RFC 3339 or YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, value_name = "TIME")]
    pub arrival: String,

    /// Aircraft to assign
    #[arg(long, value_name = "ID")]
    pub aircraft: Option<AircraftId>,
}

impl FlightAddArgs {
    /// Convert into the flight to create.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp) for an unparseable time.
    pub fn to_new_flight(&self) -> Result<NewFlight> {
        Ok(NewFlight {
            departure_airport: self.departure_airport.clone(),
            arrival_airport: self.arrival_airport.clone(),
            departure_time: parse_timestamp(&self.departure)?,
            arrival_time: parse_timestamp(&self.arrival)?,
            aircraft_id: self.aircraft,
        })
    }
}

/// Arguments for `flight update`.
#[derive(Debug, Args)]
pub struct FlightUpdateArgs {
    /// Flight id
    pub id: FlightId,

    /// New departure airport (ICAO)
    #[arg(long = "from", value_name = "ICAO")]
    pub departure_airport: Option<String>,

    /// New arrival airport (ICAO)
    #[arg(long = "to", value_name = "ICAO")]
    pub arrival_airport: Option<String>,

    /// New departure time
    #[arg(long, value_name = "TIME")]
    pub departure: Option<String>,

    /// New arrival time
    #[arg(long, value_name = "TIME")]
    pub arrival: Option<String>,

    /// Assign this aircraft
    #[arg(long, value_name = "ID", conflicts_with = "unassign")]
    pub aircraft: Option<AircraftId>,

    /// Clear the aircraft assignment
    #[arg(long)]
    pub unassign: bool,
}

impl FlightUpdateArgs {
    /// Convert into a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp) for an unparseable time.
    pub fn to_patch(&self) -> Result<FlightPatch> {
        let aircraft_id = if self.unassign {
            Some(None)
        } else {
            self.aircraft.map(Some)
        };

        Ok(FlightPatch {
            departure_airport: self.departure_airport.clone(),
            arrival_airport: self.arrival_airport.clone(),
            departure_time: parse_optional(self.departure.as_deref())?,
            arrival_time: parse_optional(self.arrival.as_deref())?,
            aircraft_id,
        })
    }
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Window start, inclusive
    #[arg(long, value_name = "TIME")]
    pub start: String,

    /// Window end, inclusive; defaults to start plus the configured window
    #[arg(long, value_name = "TIME")]
    pub end: Option<String>,
}

impl ReportCommand {
    /// Resolve the report window, filling a missing end from `default_window`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp) for an unparseable time.
    pub fn window(
        &self,
        default_window: chrono::TimeDelta,
    ) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let start = parse_timestamp(&self.start)?;
        let end = match &self.end {
            Some(end) => parse_timestamp(end)?,
            None => start + default_window,
        };
        Ok((start, end))
    }
}

/// Seed command arguments.
#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Number of aircraft to create (overrides config)
    #[arg(long)]
    pub aircraft: Option<usize>,

    /// Number of flights to create (overrides config)
    #[arg(long)]
    pub flights: Option<usize>,

    /// Delete all flights and aircraft first
    #[arg(long)]
    pub clear: bool,

    /// RNG seed for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
