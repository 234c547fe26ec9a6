//! Command-line interface for airfleet.
//!
//! This module provides the CLI structure for the `airfleet` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AircraftCommand, ConfigCommand, FlightAddArgs, FlightCommand, FlightListArgs,
    FlightUpdateArgs, ReportCommand, SeedCommand,
};

use crate::logging::Verbosity;

/// airfleet - Aircraft fleet and flight schedule manager
///
/// Keeps aircraft and flight records consistent and reports flight time per
/// departure airport and aircraft.
#[derive(Debug, Parser)]
#[command(name = "airfleet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage aircraft
    #[command(subcommand)]
    Aircraft(AircraftCommand),

    /// Manage flights and assignments
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Flight time statistics per departure airport
    Report(ReportCommand),

    /// Populate the database with sample data
    Seed(SeedCommand),

    /// Show database status
    Status,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "airfleet");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["airfleet", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["airfleet", "-v", "status"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["airfleet", "-vv", "status"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["airfleet", "-q", "status"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_with_config_and_json() {
        let cli = parse(&["airfleet", "-c", "/custom/config.toml", "status", "--json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(cli.json);
    }

    #[test]
    fn test_parse_aircraft_add() {
        let cli = parse(&[
            "airfleet", "aircraft", "add", "--serial", "ABC123", "--manufacturer", "Boeing",
        ]);
        match cli.command {
            Command::Aircraft(AircraftCommand::Add {
                serial,
                manufacturer,
            }) => {
                assert_eq!(serial, "ABC123");
                assert_eq!(manufacturer, "Boeing");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_aircraft_update_partial() {
        let cli = parse(&["airfleet", "aircraft", "update", "3", "-m", "Airbus"]);
        assert!(matches!(
            cli.command,
            Command::Aircraft(AircraftCommand::Update {
                id: 3,
                serial: None,
                manufacturer: Some(_),
            })
        ));
    }

    #[test]
    fn test_parse_flight_add() {
        let cli = parse(&[
            "airfleet",
            "flight",
            "add",
            "--from",
            "KJFK",
            "--to",
            "EGLL",
            "--departure",
            "2025-05-10T08:00",
            "--arrival",
            "2025-05-10T12:00",
            "--aircraft",
            "1",
        ]);
        match cli.command {
            Command::Flight(FlightCommand::Add(args)) => {
                assert_eq!(args.departure_airport, "KJFK");
                assert_eq!(args.arrival_airport, "EGLL");
                assert_eq!(args.aircraft, Some(1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_flight_update_rejects_assign_and_unassign() {
        let result = Cli::try_parse_from([
            "airfleet",
            "flight",
            "update",
            "1",
            "--aircraft",
            "2",
            "--unassign",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_flight_assign() {
        let cli = parse(&["airfleet", "flight", "assign", "5", "2"]);
        assert!(matches!(
            cli.command,
            Command::Flight(FlightCommand::Assign {
                flight_id: 5,
                aircraft_id: 2
            })
        ));
    }

    #[test]
    fn test_parse_flight_list_filters() {
        let cli = parse(&["airfleet", "flight", "list", "--from", "KJFK", "--aircraft", "4"]);
        match cli.command {
            Command::Flight(FlightCommand::List(args)) => {
                assert_eq!(args.departure_airport.as_deref(), Some("KJFK"));
                assert_eq!(args.aircraft, Some(4));
                assert!(args.after.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_report() {
        let cli = parse(&["airfleet", "report", "--start", "2025-05-01T00:00"]);
        match cli.command {
            Command::Report(cmd) => {
                assert_eq!(cmd.start, "2025-05-01T00:00");
                assert!(cmd.end.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_report_requires_start() {
        assert!(Cli::try_parse_from(["airfleet", "report"]).is_err());
    }

    #[test]
    fn test_parse_seed() {
        let cli = parse(&["airfleet", "seed", "--clear", "--flights", "10", "--seed", "7"]);
        match cli.command {
            Command::Seed(cmd) => {
                assert!(cmd.clear);
                assert_eq!(cmd.flights, Some(10));
                assert_eq!(cmd.aircraft, None);
                assert_eq!(cmd.seed, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["airfleet", "config", "validate", "--file", "/tmp/x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
