use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Error;

/// Column names every survey file must carry. The spellings are part of the
/// file format and must not be corrected.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "JunctionName",
    "Date",
    "timeOfDay",
    "travel_Direction_in",
    "travel_Direction_out",
    "Weather_Conditions",
    "JunctionSpeedLimit",
    "VehicleSpeed",
    "VehicleType",
    "elctricHybrid",
];

/// One observed vehicle. All fields stay text until the aggregator reads them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Record {
    /// Line of the source file this record came from, header being line 1.
    #[serde(skip)]
    pub line: u64,
    #[serde(rename = "JunctionName")]
    pub junction_name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "timeOfDay")]
    pub time_of_day: String,
    #[serde(rename = "travel_Direction_in")]
    pub direction_in: String,
    #[serde(rename = "travel_Direction_out")]
    pub direction_out: String,
    #[serde(rename = "Weather_Conditions")]
    pub weather: String,
    #[serde(rename = "JunctionSpeedLimit")]
    pub speed_limit: String,
    #[serde(rename = "VehicleSpeed")]
    pub vehicle_speed: String,
    #[serde(rename = "VehicleType")]
    pub vehicle_type: String,
    #[serde(rename = "elctricHybrid")]
    pub electric_hybrid: String,
}

impl Record {
    /// Hour of day (0 to 23), taken from the text before the colon of `timeOfDay`.
    pub fn hour(&self) -> Result<u32, Error> {
        let hour = self.time_of_day.split(':').next().unwrap_or_default();
        match hour.trim().parse::<u32>() {
            Ok(hour) if hour <= 23 => Ok(hour),
            _ => Err(self.parse_error("timeOfDay", &self.time_of_day)),
        }
    }

    pub fn is_electric(&self) -> bool {
        self.electric_hybrid.eq_ignore_ascii_case("true")
    }

    pub fn is_speeding(&self) -> Result<bool, Error> {
        let speed = self.decimal("VehicleSpeed", &self.vehicle_speed)?;
        let limit = self.decimal("JunctionSpeedLimit", &self.speed_limit)?;
        Ok(speed > limit)
    }

    fn decimal(&self, field: &'static str, value: &str) -> Result<Decimal, Error> {
        Decimal::from_str(value).map_err(|_| self.parse_error(field, value))
    }

    fn parse_error(&self, field: &'static str, value: &str) -> Error {
        Error::FieldParse {
            line: self.line,
            field,
            value: value.to_string(),
        }
    }
}

/// All records of one survey file, in file order.
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        })?;
        let dataset = Self::from_reader(file)?;
        info!("loaded {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn from_reader(source: impl io::Read) -> Result<Self, Error> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .delimiter(b',')
            .from_reader(source);

        let headers = reader.headers()?.clone();
        check_headers(&headers)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(row_error)?;
            let line = row.position().map_or(0, |pos| pos.line());
            let mut record: Record = row.deserialize(Some(&headers))?;
            record.line = line;
            records.push(record);
        }
        Ok(Dataset { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_headers(headers: &StringRecord) -> Result<(), Error> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        debug!("header row {:?} is missing {:?}", headers, missing);
        Err(Error::SchemaMismatch { missing })
    }
}

fn row_error(err: csv::Error) -> Error {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return Error::RowShape {
            line: pos.as_ref().map_or(0, |pos| pos.line()),
            expected: *expected_len,
            found: *len,
        };
    }
    Error::Csv(err)
}

#[cfg(test)]
const HEADER: &str = "JunctionName,Date,timeOfDay,travel_Direction_in,travel_Direction_out,\
Weather_Conditions,JunctionSpeedLimit,VehicleSpeed,VehicleType,elctricHybrid";

#[test]
fn reads_rows_by_header_name() {
    let data = format!(
        "{}\nHanley Highway/Westway,15/06/2024,08:15:00,N,S,Rain,30,35,Car,False\n",
        HEADER
    );
    let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

    assert_eq!(dataset.len(), 1);
    let record = &dataset.records()[0];
    assert_eq!(record.line, 2);
    assert_eq!(record.junction_name, "Hanley Highway/Westway");
    assert_eq!(record.vehicle_type, "Car");
    assert_eq!(record.hour().unwrap(), 8);
    assert!(record.is_speeding().unwrap());
    assert!(!record.is_electric());
}

#[test]
fn column_order_and_extra_columns_do_not_matter() {
    let data = "Extra,elctricHybrid,VehicleType,VehicleSpeed,JunctionSpeedLimit,Weather_Conditions,\
travel_Direction_out,travel_Direction_in,timeOfDay,Date,JunctionName\n\
x,TRUE,Bicycle,12,20,Fog,E,W,23:59,15/06/2024,Elm Avenue/Rabbit Road\n";
    let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

    let record = &dataset.records()[0];
    assert_eq!(record.junction_name, "Elm Avenue/Rabbit Road");
    assert_eq!(record.direction_in, "W");
    assert_eq!(record.hour().unwrap(), 23);
    assert!(record.is_electric());
}

#[test]
fn header_without_rows_is_an_empty_dataset() {
    let dataset = Dataset::from_reader(HEADER.as_bytes()).unwrap();
    assert!(dataset.is_empty());
}

#[test]
fn missing_columns_are_all_reported() {
    let data = "JunctionName,Date,timeOfDay,travel_Direction_in,travel_Direction_out,\
Weather_Conditions,JunctionSpeedLimit,VehicleType\n";
    match Dataset::from_reader(data.as_bytes()) {
        Err(Error::SchemaMismatch { missing }) => {
            assert_eq!(missing, vec!["VehicleSpeed", "elctricHybrid"])
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn short_row_is_rejected() {
    let data = format!(
        "{}\nElm Avenue/Rabbit Road,15/06/2024,08:15:00,N,S,Rain,30,35,Car,False\n\
Elm Avenue/Rabbit Road,15/06/2024,09:00:00,N,S\n",
        HEADER
    );
    match Dataset::from_reader(data.as_bytes()) {
        Err(Error::RowShape {
            line,
            expected,
            found,
        }) => {
            assert_eq!(line, 3);
            assert_eq!(expected, 10);
            assert_eq!(found, 5);
        }
        other => panic!("expected row shape error, got {:?}", other),
    }
}

#[test]
fn unparsable_fields_name_the_line() {
    let record = Record {
        line: 7,
        time_of_day: "noon".to_string(),
        vehicle_speed: "fast".to_string(),
        speed_limit: "30".to_string(),
        ..Record::default()
    };

    match record.hour() {
        Err(Error::FieldParse { line, field, value }) => {
            assert_eq!((line, field, value.as_str()), (7, "timeOfDay", "noon"))
        }
        other => panic!("expected parse error, got {:?}", other),
    }
    match record.is_speeding() {
        Err(Error::FieldParse { field, .. }) => assert_eq!(field, "VehicleSpeed"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn hours_outside_the_day_are_rejected() {
    let at = |time: &str| Record {
        time_of_day: time.to_string(),
        ..Record::default()
    };

    assert_eq!(at("00:00").hour().unwrap(), 0);
    assert_eq!(at("23:59:59").hour().unwrap(), 23);
    for time in ["24:00", "25:10", "99:00", "4294967295:00", "-1:00"] {
        match at(time).hour() {
            Err(Error::FieldParse { field, value, .. }) => {
                assert_eq!(field, "timeOfDay");
                assert_eq!(value, time);
            }
            other => panic!("expected parse error for {}, got {:?}", time, other),
        }
    }
}

#[test]
fn padded_fields_are_trimmed() {
    let data = format!(
        "{}\n  Elm Avenue/Rabbit Road , 15/06/2024 , 07:05 , N , N , Rain , 30 , 31 , Buss , true \n",
        HEADER
    );
    let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

    let record = &dataset.records()[0];
    assert_eq!(record.junction_name, "Elm Avenue/Rabbit Road");
    assert_eq!(record.vehicle_type, "Buss");
    assert_eq!(record.direction_out, "N");
    assert_eq!(record.hour().unwrap(), 7);
    assert!(record.is_speeding().unwrap());
    assert!(record.is_electric());
}

#[test]
fn decimal_speeds_are_compared_numerically() {
    let record = Record {
        vehicle_speed: "30.5".to_string(),
        speed_limit: "30".to_string(),
        ..Record::default()
    };
    assert!(record.is_speeding().unwrap());
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traffic_data01012024.csv");
    match Dataset::load(&path) {
        Err(Error::FileNotFound { path: reported }) => assert_eq!(reported, path),
        other => panic!("expected file not found, got {:?}", other),
    }
}
