//! `airfleet` - CLI for the aircraft fleet manager
//!
//! Every failure is classified by [`airfleet::ErrorKind`] and mapped to a
//! distinct process exit code.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use airfleet::cli::{AircraftCommand, Cli, Command, ConfigCommand, FlightCommand, SeedCommand};
use airfleet::model::{Aircraft, FlightView};
use airfleet::report::FlightReport;
use airfleet::{init_logging, seed, Config, Error, Fleet, NewAircraft, Storage};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err, json),
    }
}

fn report_error(err: &anyhow::Error, json: bool) -> ExitCode {
    let kind = err.downcast_ref::<Error>().map(Error::kind);
    let code = kind.map_or(1, |k| k.exit_code());

    if json {
        let body = serde_json::json!({
            "status": "error",
            "kind": kind.map_or("internal", |k| k.as_str()),
            "message": format!("{err:#}"),
        });
        println!("{body}");
    } else {
        eprintln!("error: {err:#}");
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config: config_path,
        json,
        command,
        ..
    } = cli;

    let command = match command {
        Command::Config(cmd) => return handle_config(cmd, config_path, json),
        other => other,
    };

    let config = Config::load_from(config_path)?;
    let fleet = open_fleet(&config)?;

    match command {
        Command::Aircraft(cmd) => handle_aircraft(&fleet, cmd, json),
        Command::Flight(cmd) => handle_flight(&fleet, cmd, json),
        Command::Report(cmd) => {
            let (start, end) = cmd.window(config.default_report_window())?;
            let report = fleet.report(start, end)?;
            emit(json, &report, print_report)
        }
        Command::Seed(cmd) => handle_seed(&fleet, &config, &cmd, json),
        Command::Status => handle_status(&fleet, json),
        Command::Config(_) => unreachable!("config commands run before the store is opened"),
    }
}

fn open_fleet(config: &Config) -> airfleet::Result<Fleet> {
    let storage = Storage::open(config.database_path(), config.busy_timeout())?;
    Ok(Fleet::new(storage))
}

/// Print `value` as JSON, or hand it to `human` for plain output.
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).map_err(Error::from)?
        );
    } else {
        human(value);
    }
    Ok(())
}

fn emit_deleted(json: bool, entity: &str, id: i64) -> anyhow::Result<()> {
    let body = serde_json::json!({ "status": "ok", "deleted": entity, "id": id });
    emit(json, &body, |_| println!("Deleted {entity} {id}"))
}

fn handle_aircraft(fleet: &Fleet, cmd: AircraftCommand, json: bool) -> anyhow::Result<()> {
    match cmd {
        AircraftCommand::List => emit(json, &fleet.list_aircraft()?, |list| {
            if list.is_empty() {
                println!("No aircraft.");
            }
            for aircraft in list {
                print_aircraft(aircraft);
            }
        }),
        AircraftCommand::Show { id } => emit(json, &fleet.get_aircraft(id)?, print_aircraft),
        AircraftCommand::Add {
            serial,
            manufacturer,
        } => {
            let aircraft = fleet.create_aircraft(&NewAircraft::new(serial, manufacturer))?;
            emit(json, &aircraft, print_aircraft)
        }
        AircraftCommand::Update {
            id,
            serial,
            manufacturer,
        } => {
            let patch = AircraftCommand::patch(serial, manufacturer);
            emit(json, &fleet.update_aircraft(id, &patch)?, print_aircraft)
        }
        AircraftCommand::Delete { id } => {
            fleet.delete_aircraft(id)?;
            emit_deleted(json, "aircraft", id)
        }
    }
}

fn handle_flight(fleet: &Fleet, cmd: FlightCommand, json: bool) -> anyhow::Result<()> {
    match cmd {
        FlightCommand::List(args) => {
            let flights = fleet.list_flights(&args.to_filter()?)?;
            emit(json, &flights, |list| {
                if list.is_empty() {
                    println!("No flights.");
                }
                for view in list {
                    print_flight(view);
                }
            })
        }
        FlightCommand::Show { id } => emit(json, &fleet.get_flight(id)?, print_flight),
        FlightCommand::Add(args) => {
            let view = fleet.create_flight(&args.to_new_flight()?)?;
            emit(json, &view, print_flight)
        }
        FlightCommand::Update(args) => {
            let view = fleet.update_flight(args.id, &args.to_patch()?)?;
            emit(json, &view, print_flight)
        }
        FlightCommand::Delete { id } => {
            fleet.delete_flight(id)?;
            emit_deleted(json, "flight", id)
        }
        FlightCommand::Assign {
            flight_id,
            aircraft_id,
        } => emit(json, &fleet.assign(flight_id, aircraft_id)?, print_flight),
        FlightCommand::Unassign { flight_id } => {
            emit(json, &fleet.unassign(flight_id)?, print_flight)
        }
    }
}

fn handle_seed(
    fleet: &Fleet,
    config: &Config,
    cmd: &SeedCommand,
    json: bool,
) -> anyhow::Result<()> {
    let mut seed_config = config.seed.clone();
    if let Some(count) = cmd.aircraft {
        seed_config.aircraft_count = count;
    }
    if let Some(count) = cmd.flights {
        seed_config.flight_count = count;
    }

    let mut rng = match cmd.seed {
        Some(value) => StdRng::seed_from_u64(value),
        None => StdRng::from_os_rng(),
    };

    let summary = seed::seed(fleet, &seed_config, cmd.clear, &mut rng)?;
    emit(json, &summary, |s| {
        if cmd.clear {
            println!(
                "Cleared {} flights and {} aircraft.",
                s.flights_cleared, s.aircraft_cleared
            );
        }
        println!("Created {} aircraft.", s.aircraft_created);
        println!(
            "Created {} flights ({} with an aircraft).",
            s.flights_created, s.flights_assigned
        );
    })
}

fn handle_status(fleet: &Fleet, json: bool) -> anyhow::Result<()> {
    let stats = fleet.stats()?;
    let status = serde_json::json!({
        "database_path": fleet.storage().path(),
        "stats": stats,
    });

    emit(json, &status, |_| {
        println!("airfleet status");
        println!("---------------");
        println!("Database:        {}", fleet.storage().path().display());
        println!("Size:            {} bytes", stats.db_size_bytes);
        println!("Aircraft:        {}", stats.aircraft_count);
        println!(
            "Flights:         {} ({} assigned)",
            stats.flight_count, stats.assigned_flight_count
        );
        match (stats.earliest_departure, stats.latest_departure) {
            (Some(earliest), Some(latest)) => {
                println!("Departures:      {earliest} to {latest}");
            }
            _ => println!("Departures:      none"),
        }
    })
}

fn handle_config(cmd: ConfigCommand, path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let config = Config::load_from(path)?;
            emit(json, &config, |config| {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!("  Busy timeout (ms):   {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Report]");
                println!("  Default window days: {}", config.report.default_window_days);
                println!();
                println!("[Seed]");
                println!("  Aircraft count:      {}", config.seed.aircraft_count);
                println!("  Flight count:        {}", config.seed.flight_count);
                println!("  Assigned ratio:      {}", config.seed.assigned_ratio);
            })
        }
        ConfigCommand::Path => {
            let path = path.unwrap_or_else(Config::default_config_path);
            let body = serde_json::json!({ "path": path });
            emit(json, &body, |_| println!("{}", path.display()))
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(path)
                .unwrap_or_else(Config::default_config_path);
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("validating {}", path.display()))?;
            let body = serde_json::json!({ "status": "ok", "path": path });
            emit(json, &body, |_| {
                println!("Configuration is valid: {}", path.display());
            })
        }
    }
}

fn print_aircraft(aircraft: &Aircraft) {
    println!(
        "{:>5}  {:<14} {}",
        aircraft.id, aircraft.serial_number, aircraft.manufacturer
    );
}

fn print_flight(view: &FlightView) {
    let flight = &view.flight;
    println!(
        "{:>5}  {} -> {}  {} - {}  {:>7.1} min  {}",
        flight.id,
        flight.departure_airport,
        flight.arrival_airport,
        flight.departure_time.format("%Y-%m-%d %H:%M"),
        flight.arrival_time.format("%Y-%m-%d %H:%M"),
        flight.duration_minutes(),
        view.aircraft_serial_number.as_deref().unwrap_or("-"),
    );
}

fn print_report(report: &FlightReport) {
    println!(
        "Flights departing {} to {}",
        report.start_time, report.end_time
    );
    println!(
        "{} airport(s), {} flight(s)",
        report.total_airports, report.total_flights
    );

    for airport in &report.airports {
        println!();
        println!(
            "{}  flights: {}  average: {:.2} min",
            airport.departure_airport, airport.flight_count, airport.average_flight_time
        );
        for time in &airport.aircraft_flight_times {
            println!(
                "    {:>5}  {:<14} {:.2} min",
                time.aircraft_id, time.serial_number, time.in_flight_minutes
            );
        }
    }
}
