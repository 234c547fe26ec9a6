//! `airfleet` - Aircraft fleet and flight schedule management
//!
//! This library keeps aircraft and flight records consistent (unique serial
//! numbers, ICAO airport codes, future departures, arrivals after departures,
//! no deletion of aircraft still assigned to flights) and computes flight-time
//! statistics per departure airport and aircraft over a time window.
//!
//! [`Fleet`] is the entry point; it runs every mutation's checks and writes
//! inside one store transaction.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod assignment;
pub mod cli;
pub mod config;
pub mod error;
pub mod fleet;
pub mod logging;
pub mod model;
pub mod report;
pub mod seed;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{EntityKind, Error, ErrorKind, Result};
pub use fleet::{Clock, FixedClock, Fleet, SystemClock};
pub use logging::init_logging;
pub use model::{
    Aircraft, AircraftId, AircraftPatch, Flight, FlightFilter, FlightId, FlightPatch, FlightView,
    NewAircraft, NewFlight,
};
pub use report::{AircraftFlightTime, AirportStats, FlightReport};
pub use storage::{EntityStore, Storage, StorageStats};
