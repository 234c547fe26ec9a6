//! Sample data generation.
//!
//! Everything is created through [`Fleet`], so generated records pass the
//! same validation as user input.

use chrono::TimeDelta;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SeedConfig;
use crate::error::{Error, Result};
use crate::fleet::{Clock, Fleet};
use crate::model::{Aircraft, NewAircraft, NewFlight};

/// Manufacturers and the models generated for each.
pub const AIRCRAFT_DATA: &[(&str, &[&str])] = &[
    ("Airbus", &["A320", "A330", "A350", "A380"]),
    ("Boeing", &["737", "747", "777", "787"]),
    ("Bombardier", &["CRJ700", "CRJ900", "Global 6000"]),
    ("Embraer", &["E170", "E190", "E195"]),
    (
        "Cessna",
        &["Citation X", "Citation Latitude", "Citation Longitude"],
    ),
];

/// Major airports used for generated flights.
pub const AIRPORTS: &[&str] = &[
    "KJFK", "KLAX", "KORD", "KATL", "EGLL", "LFPG", "EDDF", "LEMD", "LIRF", "EHAM", "VHHH",
    "RJTT", "YSSY", "OMDB", "ZBAA",
];

/// Serial regeneration attempts before giving up on one aircraft.
const MAX_SERIAL_ATTEMPTS: usize = 100;

/// What a seeding run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// Flights removed by `--clear`.
    pub flights_cleared: usize,
    /// Aircraft removed by `--clear`.
    pub aircraft_cleared: usize,
    /// Aircraft created.
    pub aircraft_created: usize,
    /// Flights created.
    pub flights_created: usize,
    /// Created flights that have an aircraft.
    pub flights_assigned: usize,
}

/// Generate a serial number such as `BA32-1234`.
///
/// The prefix is the manufacturer's initial followed by the first three
/// characters of the model, spaces removed and uppercased.
pub fn generate_serial_number<R: Rng>(manufacturer: &str, model: &str, rng: &mut R) -> String {
    let initial: String = manufacturer.chars().take(1).collect();
    let model_part: String = model
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect();
    let number: u16 = rng.random_range(1000..=9999);
    format!(
        "{}{}-{}",
        initial.to_uppercase(),
        model_part.to_uppercase(),
        number
    )
}

/// Create `count` aircraft with random manufacturers and unique serials.
///
/// # Errors
///
/// Returns a store error, or [`Error::DuplicateSerial`] if no free serial
/// was found after repeated attempts.
pub fn seed_aircraft<C: Clock, R: Rng>(
    fleet: &Fleet<C>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Aircraft>> {
    let mut created = Vec::with_capacity(count);

    for _ in 0..count {
        let (manufacturer, models) = AIRCRAFT_DATA[rng.random_range(0..AIRCRAFT_DATA.len())];
        let model = models[rng.random_range(0..models.len())];
        let full_name = format!("{manufacturer} {model}");

        let mut attempts = 0;
        let aircraft = loop {
            let serial = generate_serial_number(manufacturer, model, rng);
            match fleet.create_aircraft(&NewAircraft::new(serial, full_name.clone())) {
                Ok(aircraft) => break aircraft,
                Err(Error::DuplicateSerial { serial_number })
                    if attempts + 1 < MAX_SERIAL_ATTEMPTS =>
                {
                    debug!("Serial {} taken, regenerating", serial_number);
                    attempts += 1;
                }
                Err(err) => return Err(err),
            }
        };
        created.push(aircraft);
    }

    info!("Seeded {} aircraft", created.len());
    Ok(created)
}

/// Create `count` future flights between distinct airports.
///
/// Each flight departs 1 to 30 days (plus a random hour and minute) after the
/// fleet's current time and lasts between 1 and 10 hours. With probability
/// `assigned_ratio` it is given a random aircraft from `aircraft`.
///
/// Returns the number of flights created and how many were assigned.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] for a ratio outside `0..=1`, or any
/// error from flight creation.
pub fn seed_flights<C: Clock, R: Rng>(
    fleet: &Fleet<C>,
    aircraft: &[Aircraft],
    count: usize,
    assigned_ratio: f64,
    rng: &mut R,
) -> Result<(usize, usize)> {
    if !(0.0..=1.0).contains(&assigned_ratio) {
        return Err(Error::ConfigValidation {
            message: format!("assigned_ratio ({assigned_ratio}) must be between 0 and 1"),
        });
    }

    let now = fleet.now();
    let mut assigned = 0;

    for _ in 0..count {
        let departure_index = rng.random_range(0..AIRPORTS.len());
        let mut arrival_index = rng.random_range(0..AIRPORTS.len() - 1);
        if arrival_index >= departure_index {
            arrival_index += 1;
        }

        let aircraft_id = if !aircraft.is_empty() && rng.random_bool(assigned_ratio) {
            Some(aircraft[rng.random_range(0..aircraft.len())].id)
        } else {
            None
        };

        let departure_time = now
            + TimeDelta::days(rng.random_range(1..=30))
            + TimeDelta::hours(rng.random_range(0..=23))
            + TimeDelta::minutes(rng.random_range(0..=59));
        let arrival_time = departure_time + TimeDelta::seconds(rng.random_range(3_600..=36_000));

        fleet.create_flight(&NewFlight {
            departure_airport: AIRPORTS[departure_index].to_string(),
            arrival_airport: AIRPORTS[arrival_index].to_string(),
            departure_time,
            arrival_time,
            aircraft_id,
        })?;
        if aircraft_id.is_some() {
            assigned += 1;
        }
    }

    info!("Seeded {} flights ({} assigned)", count, assigned);
    Ok((count, assigned))
}

/// Seed the fleet according to `config`, optionally clearing it first.
///
/// # Errors
///
/// Returns the first error from clearing or creation.
pub fn seed<C: Clock, R: Rng>(
    fleet: &Fleet<C>,
    config: &SeedConfig,
    clear: bool,
    rng: &mut R,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    if clear {
        let (flights, aircraft) = fleet.clear()?;
        summary.flights_cleared = flights;
        summary.aircraft_cleared = aircraft;
    }

    let aircraft = seed_aircraft(fleet, config.aircraft_count, rng)?;
    summary.aircraft_created = aircraft.len();

    let (created, assigned) = seed_flights(
        fleet,
        &aircraft,
        config.flight_count,
        config.assigned_ratio,
        rng,
    )?;
    summary.flights_created = created;
    summary.flights_assigned = assigned;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fleet::FixedClock;
    use crate::model::FlightFilter;
    use crate::storage::Storage;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;
    use std::collections::HashSet;

    fn test_fleet() -> Fleet<FixedClock> {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Fleet::with_clock(Storage::open_in_memory().unwrap(), FixedClock(now))
    }

    fn small_config() -> SeedConfig {
        SeedConfig {
            aircraft_count: 6,
            flight_count: 25,
            assigned_ratio: 0.9,
        }
    }

    #[test]
    fn test_generate_serial_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let pattern = Regex::new(r"^[A-Z][A-Z0-9]{3}-\d{4}$").unwrap();

        for (manufacturer, models) in AIRCRAFT_DATA {
            for model in *models {
                let serial = generate_serial_number(manufacturer, model, &mut rng);
                assert!(pattern.is_match(&serial), "bad serial {serial}");
            }
        }
    }

    #[test]
    fn test_generate_serial_number_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_serial_number("Boeing", "737", &mut rng).starts_with("B737-"));
        assert!(generate_serial_number("Cessna", "Citation X", &mut rng).starts_with("CCIT-"));
        assert!(generate_serial_number("Airbus", "A320", &mut rng).starts_with("AA32-"));
    }

    #[test]
    fn test_airports_are_valid_and_distinct() {
        let unique: HashSet<_> = AIRPORTS.iter().collect();
        assert_eq!(unique.len(), 15);
        for code in AIRPORTS {
            assert!(crate::validation::validate_icao("airport", code).is_ok());
        }
    }

    #[test]
    fn test_seed_creates_configured_counts() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(42);

        let summary = seed(&fleet, &small_config(), false, &mut rng).unwrap();

        assert_eq!(summary.aircraft_created, 6);
        assert_eq!(summary.flights_created, 25);
        assert!(summary.flights_assigned <= 25);

        let stats = fleet.stats().unwrap();
        assert_eq!(stats.aircraft_count, 6);
        assert_eq!(stats.flight_count, 25);
        assert_eq!(
            stats.assigned_flight_count,
            i64::try_from(summary.flights_assigned).unwrap()
        );
    }

    #[test]
    fn test_seeded_flights_hold_invariants() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(3);
        seed(&fleet, &small_config(), false, &mut rng).unwrap();

        let now = fleet.now();
        for view in fleet.list_flights(&FlightFilter::default()).unwrap() {
            let flight = view.flight;
            assert_ne!(flight.departure_airport, flight.arrival_airport);
            assert!(AIRPORTS.contains(&flight.departure_airport.as_str()));
            assert!(AIRPORTS.contains(&flight.arrival_airport.as_str()));
            assert!(flight.departure_time >= now + TimeDelta::days(1));
            assert!(flight.departure_time < now + TimeDelta::days(31));
            assert!(flight.duration() >= TimeDelta::hours(1));
            assert!(flight.duration() <= TimeDelta::hours(10));
        }
    }

    #[test]
    fn test_seed_assigned_ratio_extremes() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(9);
        let aircraft = seed_aircraft(&fleet, 3, &mut rng).unwrap();

        let (created, assigned) = seed_flights(&fleet, &aircraft, 10, 1.0, &mut rng).unwrap();
        assert_eq!((created, assigned), (10, 10));

        let (created, assigned) = seed_flights(&fleet, &aircraft, 10, 0.0, &mut rng).unwrap();
        assert_eq!((created, assigned), (10, 0));
    }

    #[test]
    fn test_seed_flights_without_aircraft() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(11);
        let (_, assigned) = seed_flights(&fleet, &[], 5, 1.0, &mut rng).unwrap();
        assert_eq!(assigned, 0);
    }

    #[test]
    fn test_seed_flights_rejects_bad_ratio() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(11);
        let err = seed_flights(&fleet, &[], 5, 1.5, &mut rng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_seed_aircraft_serials_unique() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(5);
        let aircraft = seed_aircraft(&fleet, 120, &mut rng).unwrap();

        let serials: HashSet<_> = aircraft.iter().map(|a| a.serial_number.as_str()).collect();
        assert_eq!(serials.len(), 120);
    }

    #[test]
    fn test_seed_with_clear() {
        let fleet = test_fleet();
        let mut rng = StdRng::seed_from_u64(21);
        seed(&fleet, &small_config(), false, &mut rng).unwrap();

        let summary = seed(&fleet, &small_config(), true, &mut rng).unwrap();
        assert_eq!(summary.flights_cleared, 25);
        assert_eq!(summary.aircraft_cleared, 6);

        let stats = fleet.stats().unwrap();
        assert_eq!(stats.aircraft_count, 6);
        assert_eq!(stats.flight_count, 25);
    }

    #[test]
    fn test_seed_is_deterministic_for_a_seed() {
        let first = test_fleet();
        let second = test_fleet();
        seed(&first, &small_config(), false, &mut StdRng::seed_from_u64(99)).unwrap();
        seed(&second, &small_config(), false, &mut StdRng::seed_from_u64(99)).unwrap();

        assert_eq!(
            first.list_aircraft().unwrap(),
            second.list_aircraft().unwrap()
        );
        assert_eq!(
            first.list_flights(&FlightFilter::default()).unwrap(),
            second.list_flights(&FlightFilter::default()).unwrap()
        );
    }
}
