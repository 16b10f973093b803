use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use rust_decimal::prelude::*;

use crate::error::Error;
use crate::record::Dataset;

pub const ELM_AVENUE: &str = "Elm Avenue/Rabbit Road";
pub const HANLEY_HIGHWAY: &str = "Hanley Highway/Westway";

const TWO_WHEELED: [&str; 3] = ["Bike", "Motorbike", "Scooter"];

/// Vehicle counts per hour of day. Hours keep the order they were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyCounts {
    buckets: Vec<(u32, usize)>,
}

impl HourlyCounts {
    pub fn add(&mut self, hour: u32) {
        match self.buckets.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, count)) => *count += 1,
            None => self.buckets.push((hour, 1)),
        }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, count)| count).sum()
    }

    /// Average vehicles per hour over the hours that saw any, rounded half to even.
    pub fn mean(&self) -> usize {
        rounded_ratio(Decimal::from(self.total()), self.buckets.len())
    }

    pub fn peak(&self) -> usize {
        self.buckets.iter().map(|(_, count)| *count).max().unwrap_or(0)
    }

    /// Every hour whose count equals the peak.
    pub fn peak_hours(&self) -> Vec<u32> {
        let peak = self.peak();
        self.buckets
            .iter()
            .filter(|(_, count)| *count == peak)
            .map(|(hour, _)| *hour)
            .collect()
    }
}

/// A single rendered value of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    Count(usize),
    Hours(Vec<String>),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count(count) => write!(f, "{}", count),
            Metric::Hours(hours) => {
                write!(f, "[")?;
                for (i, hour) in hours.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}'", hour)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_vehicles: usize,
    pub total_trucks: usize,
    pub total_electric_vehicles: usize,
    pub two_wheeled: usize,
    pub buses_north: usize,
    pub no_turn_vehicles: usize,
    pub truck_percentage: usize,
    pub average_bicycles_per_hour: usize,
    pub over_speed_vehicles: usize,
    pub elm_avenue_vehicles: usize,
    pub hanley_highway_vehicles: usize,
    pub scooter_percentage: usize,
    pub peak_hour_traffic: usize,
    pub peak_hours: Vec<String>,
    pub total_hours_of_rain: usize,
}

impl Statistics {
    /// Runs every metric over the dataset. Any unparsable numeric field fails
    /// the whole computation.
    pub fn compute(dataset: &Dataset) -> Result<Self, Error> {
        let mut stats = Statistics {
            total_vehicles: dataset.len(),
            ..Statistics::default()
        };
        let mut elm_scooters = 0;
        let mut bicycles = HourlyCounts::default();
        let mut hanley = HourlyCounts::default();
        let mut rainy_hours = BTreeSet::new();

        for record in dataset.records() {
            let vehicle = record.vehicle_type.as_str();
            let at_elm = record.junction_name == ELM_AVENUE;
            let at_hanley = record.junction_name == HANLEY_HIGHWAY;

            stats.total_trucks += usize::from(vehicle == "Truck");
            stats.total_electric_vehicles += usize::from(record.is_electric());
            stats.two_wheeled += usize::from(TWO_WHEELED.contains(&vehicle));
            // "Buss" is how the survey files spell it
            stats.buses_north +=
                usize::from(at_elm && vehicle == "Buss" && record.direction_out == "N");
            stats.no_turn_vehicles += usize::from(record.direction_in == record.direction_out);
            stats.over_speed_vehicles += usize::from(record.is_speeding()?);
            stats.elm_avenue_vehicles += usize::from(at_elm);
            stats.hanley_highway_vehicles += usize::from(at_hanley);
            elm_scooters += usize::from(at_elm && vehicle == "Scooter");

            if vehicle == "Bicycle" {
                bicycles.add(record.hour()?);
            }
            if at_hanley {
                hanley.add(record.hour()?);
            }
            if record.weather == "Rain" {
                rainy_hours.insert(record.hour()?);
            }
        }

        stats.truck_percentage = percentage(stats.total_trucks, stats.total_vehicles);
        stats.average_bicycles_per_hour = bicycles.mean();
        stats.scooter_percentage = percentage(elm_scooters, stats.elm_avenue_vehicles);
        stats.peak_hour_traffic = hanley.peak();
        stats.peak_hours = hanley.peak_hours().into_iter().map(hour_label).collect();
        stats.total_hours_of_rain = rainy_hours.len();

        debug!("{} bicycles over {:?}", bicycles.total(), bicycles);
        debug!("{} hanley highway vehicles over {:?}", hanley.total(), hanley);
        Ok(stats)
    }

    /// Labelled metrics in report order.
    pub fn entries(&self) -> Vec<(&'static str, Metric)> {
        vec![
            ("Total vehicles", Metric::Count(self.total_vehicles)),
            ("Total trucks", Metric::Count(self.total_trucks)),
            ("Total electric vehicles", Metric::Count(self.total_electric_vehicles)),
            ("Two-wheeled vehicles", Metric::Count(self.two_wheeled)),
            (
                "Buses heading north (Elm Avenue/Rabbit Road)",
                Metric::Count(self.buses_north),
            ),
            ("Vehicles going straight", Metric::Count(self.no_turn_vehicles)),
            ("Percentage of trucks", Metric::Count(self.truck_percentage)),
            ("Average bicycles per hour", Metric::Count(self.average_bicycles_per_hour)),
            ("Vehicles over speed limit", Metric::Count(self.over_speed_vehicles)),
            ("Vehicles at Elm Avenue/Rabbit Road", Metric::Count(self.elm_avenue_vehicles)),
            (
                "Vehicles at Hanley Highway/Westway",
                Metric::Count(self.hanley_highway_vehicles),
            ),
            (
                "Percentage of scooters at Elm Avenue/Rabbit Road",
                Metric::Count(self.scooter_percentage),
            ),
            (
                "Peak hour traffic at Hanley Highway/Westway",
                Metric::Count(self.peak_hour_traffic),
            ),
            (
                "Peak hour(s) at Hanley Highway/Westway",
                Metric::Hours(self.peak_hours.clone()),
            ),
            ("Total hours of rain", Metric::Count(self.total_hours_of_rain)),
        ]
    }
}

fn hour_label(hour: u32) -> String {
    format!("Between {}:00 and {}:00", hour, hour + 1)
}

fn percentage(part: usize, whole: usize) -> usize {
    rounded_ratio(Decimal::from(part) * Decimal::ONE_HUNDRED, whole)
}

/// `numerator / denominator` rounded half to even, 0 for an empty denominator.
/// Exact, so 23 of 40 is 58% where float arithmetic would land on 57.
fn rounded_ratio(numerator: Decimal, denominator: usize) -> usize {
    if denominator == 0 {
        return 0;
    }
    round_half_even(numerator / Decimal::from(denominator))
}

fn round_half_even(value: Decimal) -> usize {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_usize()
        .unwrap_or_default()
}

#[cfg(test)]
use crate::record::Record;
#[cfg(test)]
use rust_decimal_macros::dec;

#[cfg(test)]
fn vehicle(junction: &str, time: &str, vehicle_type: &str) -> Record {
    Record {
        junction_name: junction.to_string(),
        time_of_day: time.to_string(),
        vehicle_type: vehicle_type.to_string(),
        direction_in: "N".to_string(),
        direction_out: "S".to_string(),
        weather: "Clear".to_string(),
        speed_limit: "30".to_string(),
        vehicle_speed: "25".to_string(),
        electric_hybrid: "False".to_string(),
        ..Record::default()
    }
}

#[test]
fn midpoints_round_to_even() {
    assert_eq!(round_half_even(dec!(2.5)), 2);
    assert_eq!(round_half_even(dec!(3.5)), 4);
    assert_eq!(round_half_even(dec!(12.49)), 12);
    assert_eq!(percentage(1, 8), 12);
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 67);
}

#[test]
fn empty_dataset_has_no_division_by_zero() {
    let stats = Statistics::compute(&Dataset::default()).unwrap();
    assert_eq!(stats, Statistics::default());
    assert_eq!(stats.truck_percentage, 0);
    assert_eq!(stats.scooter_percentage, 0);
    assert_eq!(stats.average_bicycles_per_hour, 0);
    assert!(stats.peak_hours.is_empty());
}

#[test]
fn counts_vehicle_categories() {
    let mut bus = vehicle(ELM_AVENUE, "10:00", "Buss");
    bus.direction_out = "N".to_string();
    let mut straight = vehicle(ELM_AVENUE, "10:30", "Scooter");
    straight.direction_out = "N".to_string();
    let mut electric = vehicle(HANLEY_HIGHWAY, "11:00", "Truck");
    electric.electric_hybrid = "TRUE".to_string();
    let mut speeding = vehicle(HANLEY_HIGHWAY, "11:10", "Motorbike");
    speeding.vehicle_speed = "31".to_string();
    let dataset = Dataset::new(vec![
        bus,
        straight,
        electric,
        speeding,
        vehicle(ELM_AVENUE, "12:00", "Truck"),
        vehicle(ELM_AVENUE, "12:00", "truck"),
        vehicle(ELM_AVENUE, "12:00", "Bike"),
        vehicle("Other Junction", "12:00", "Buss"),
    ]);

    let stats = Statistics::compute(&dataset).unwrap();
    assert_eq!(stats.total_vehicles, 8);
    assert_eq!(stats.total_trucks, 2);
    assert_eq!(stats.total_electric_vehicles, 1);
    assert_eq!(stats.two_wheeled, 3);
    assert_eq!(stats.buses_north, 1);
    assert_eq!(stats.no_turn_vehicles, 2);
    assert_eq!(stats.truck_percentage, 25);
    assert_eq!(stats.over_speed_vehicles, 1);
    assert_eq!(stats.elm_avenue_vehicles, 5);
    assert_eq!(stats.hanley_highway_vehicles, 2);
    assert_eq!(stats.scooter_percentage, 20);
}

#[test]
fn single_peak_hour() {
    let mut records: Vec<Record> = (0..5)
        .map(|i| vehicle(HANLEY_HIGHWAY, &format!("08:{:02}", i * 10), "Car"))
        .collect();
    records.push(vehicle(HANLEY_HIGHWAY, "09:15", "Car"));
    records.push(vehicle(ELM_AVENUE, "10:15", "Car"));

    let stats = Statistics::compute(&Dataset::new(records)).unwrap();
    assert_eq!(stats.peak_hour_traffic, 5);
    assert_eq!(stats.peak_hours, vec!["Between 8:00 and 9:00"]);
}

#[test]
fn tied_peak_hours_keep_first_seen_order() {
    let records = vec![
        vehicle(HANLEY_HIGHWAY, "17:05", "Car"),
        vehicle(HANLEY_HIGHWAY, "07:05", "Car"),
        vehicle(HANLEY_HIGHWAY, "12:05", "Car"),
        vehicle(HANLEY_HIGHWAY, "07:45", "Car"),
        vehicle(HANLEY_HIGHWAY, "17:45", "Car"),
    ];

    let stats = Statistics::compute(&Dataset::new(records)).unwrap();
    assert_eq!(stats.peak_hour_traffic, 2);
    assert_eq!(
        stats.peak_hours,
        vec!["Between 17:00 and 18:00", "Between 7:00 and 8:00"]
    );
}

#[test]
fn rain_counts_distinct_hours() {
    let records: Vec<Record> = (0..10)
        .map(|i| {
            let mut record = vehicle(ELM_AVENUE, &format!("14:{:02}", i), "Car");
            record.weather = "Rain".to_string();
            record
        })
        .collect();

    let stats = Statistics::compute(&Dataset::new(records)).unwrap();
    assert_eq!(stats.total_hours_of_rain, 1);
}

#[test]
fn hour_out_of_range_fails_every_grouping() {
    let mut rainy = vehicle(ELM_AVENUE, "99:00", "Car");
    rainy.weather = "Rain".to_string();
    let cases = [
        vehicle(HANLEY_HIGHWAY, "4294967295:00", "Car"),
        vehicle(HANLEY_HIGHWAY, "25:10", "Car"),
        vehicle(ELM_AVENUE, "24:00", "Bicycle"),
        rainy,
    ];

    for bad in cases {
        let time = bad.time_of_day.clone();
        let dataset = Dataset::new(vec![vehicle(HANLEY_HIGHWAY, "08:00", "Car"), bad]);
        match Statistics::compute(&dataset) {
            Err(Error::FieldParse { field, value, .. }) => {
                assert_eq!(field, "timeOfDay");
                assert_eq!(value, time);
            }
            other => panic!("expected parse error for {}, got {:?}", time, other),
        }
    }
}

#[test]
fn percentages_round_exactly() {
    assert_eq!(percentage(23, 40), 58);
    assert_eq!(percentage(1, 40), 2);
    assert_eq!(percentage(3, 40), 8);
}

#[test]
fn bicycles_average_over_hours_seen() {
    let records = vec![
        vehicle(ELM_AVENUE, "06:00", "Bicycle"),
        vehicle(ELM_AVENUE, "06:30", "Bicycle"),
        vehicle(ELM_AVENUE, "06:45", "Bicycle"),
        vehicle(HANLEY_HIGHWAY, "09:00", "Bicycle"),
        vehicle(HANLEY_HIGHWAY, "09:00", "Car"),
    ];

    // 4 bicycles over 2 hours
    let stats = Statistics::compute(&Dataset::new(records)).unwrap();
    assert_eq!(stats.average_bicycles_per_hour, 2);
}

#[test]
fn bad_speed_fails_the_whole_dataset() {
    let mut broken = vehicle(ELM_AVENUE, "06:00", "Car");
    broken.line = 3;
    broken.speed_limit = "thirty".to_string();
    let dataset = Dataset::new(vec![vehicle(ELM_AVENUE, "05:00", "Car"), broken]);

    match Statistics::compute(&dataset) {
        Err(Error::FieldParse { line, field, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(field, "JunctionSpeedLimit");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn computing_twice_gives_the_same_report() {
    let records = vec![
        vehicle(HANLEY_HIGHWAY, "08:00", "Truck"),
        vehicle(ELM_AVENUE, "09:00", "Scooter"),
    ];
    let dataset = Dataset::new(records);
    assert_eq!(
        Statistics::compute(&dataset).unwrap(),
        Statistics::compute(&dataset).unwrap()
    );
}

#[test]
fn metrics_render_in_report_order() {
    let stats = Statistics {
        peak_hours: vec![
            "Between 8:00 and 9:00".to_string(),
            "Between 17:00 and 18:00".to_string(),
        ],
        ..Statistics::default()
    };
    let entries = stats.entries();

    assert_eq!(entries.len(), 15);
    assert_eq!(entries[0].0, "Total vehicles");
    assert_eq!(entries[14].0, "Total hours of rain");
    assert_eq!(
        entries[13].1.to_string(),
        "['Between 8:00 and 9:00', 'Between 17:00 and 18:00']"
    );
    assert_eq!(Metric::Hours(Vec::new()).to_string(), "[]");
}
