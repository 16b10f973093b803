use std::fs;
use std::path::Path;

use survey::{Dataset, Error, Session, Statistics};

const HEADER: &str = "JunctionName,Date,timeOfDay,travel_Direction_in,travel_Direction_out,\
Weather_Conditions,JunctionSpeedLimit,VehicleSpeed,VehicleType,elctricHybrid";

const ROWS: &str = "\
Elm Avenue/Rabbit Road,15/06/2024,00:00:01,N,N,Rain,20,22,Buss,False
Elm Avenue/Rabbit Road,15/06/2024,00:14:12,W,E,Rain,20,18,Scooter,False
Hanley Highway/Westway,15/06/2024,08:02:44,S,N,Fog,30,31,Truck,True
Hanley Highway/Westway,15/06/2024,08:40:10,S,S,Fog,30,28,Car,true
Hanley Highway/Westway,15/06/2024,17:20:00,E,W,Rain,30,35,Bicycle,False
Hanley Highway/Westway,15/06/2024,17:59:59,N,S,Rain,30,29,Car,False
Elm Avenue/Rabbit Road,15/06/2024,17:30:00,N,S,Clear,20,15,Bicycle,False
";

fn write_survey(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), format!("{}\n{}", HEADER, body)).unwrap();
}

fn run_session(dir: &Path, input: &str) -> String {
    let mut output = Vec::new();
    Session::new(input.as_bytes(), &mut output, dir, dir.join("results.txt"))
        .run()
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn sanity() {
    let dir = tempfile::tempdir().unwrap();
    write_survey(dir.path(), "traffic_data15062024.csv", ROWS);

    let dataset = Dataset::load(dir.path().join("traffic_data15062024.csv")).unwrap();
    let stats = Statistics::compute(&dataset).unwrap();

    assert_eq!(stats.total_vehicles, 7);
    assert_eq!(stats.total_trucks, 1);
    assert_eq!(stats.total_electric_vehicles, 2);
    assert_eq!(stats.two_wheeled, 1);
    assert_eq!(stats.buses_north, 1);
    assert_eq!(stats.no_turn_vehicles, 2);
    assert_eq!(stats.truck_percentage, 14);
    assert_eq!(stats.average_bicycles_per_hour, 2);
    assert_eq!(stats.over_speed_vehicles, 3);
    assert_eq!(stats.elm_avenue_vehicles, 3);
    assert_eq!(stats.hanley_highway_vehicles, 4);
    assert_eq!(stats.scooter_percentage, 33);
    assert_eq!(stats.peak_hour_traffic, 2);
    assert_eq!(
        stats.peak_hours,
        vec!["Between 8:00 and 9:00", "Between 17:00 and 18:00"]
    );
    assert_eq!(stats.total_hours_of_rain, 2);
}

#[test]
fn session_appends_one_block_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write_survey(dir.path(), "traffic_data15062024.csv", ROWS);
    write_survey(dir.path(), "traffic_data01012000.csv", "");

    let output = run_session(dir.path(), "15\n6\n2024\nmaybe\ny\n1\n1\n2000\nN\n");

    assert!(output.contains("Invalid input. Please enter 'Y' or 'N'."));
    assert_eq!(output.matches("Processed Outcomes:").count(), 2);
    assert!(output.ends_with("Exiting the program.\n"));

    let results = fs::read_to_string(dir.path().join("results.txt")).unwrap();
    let blocks: Vec<&str> = results.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].contains("Total vehicles: 7\n"));
    assert!(blocks[0].contains(
        "Peak hour(s) at Hanley Highway/Westway: ['Between 8:00 and 9:00', 'Between 17:00 and 18:00']\n"
    ));
    assert!(blocks[1].contains("Total vehicles: 0\n"));
    assert!(blocks[1].contains("Percentage of trucks: 0\n"));
    assert!(blocks[1].contains("Peak hour(s) at Hanley Highway/Westway: []\n"));
}

#[test]
fn results_survive_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    write_survey(dir.path(), "traffic_data15062024.csv", ROWS);

    run_session(dir.path(), "15\n6\n2024\nn\n");
    run_session(dir.path(), "15\n6\n2024\nn\n");

    let results = fs::read_to_string(dir.path().join("results.txt")).unwrap();
    assert_eq!(results.matches("Processed Outcomes:").count(), 2);
    assert!(results.ends_with("Total hours of rain: 2\n\n"));
}

#[test]
fn failed_files_do_not_end_the_session() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("traffic_data01022024.csv"),
        "JunctionName,Date,timeOfDay\nElm Avenue/Rabbit Road,01/02/2024,10:00\n",
    )
    .unwrap();
    write_survey(
        dir.path(),
        "traffic_data02022024.csv",
        "Elm Avenue/Rabbit Road,02/02/2024,10:00:00,N,S,Clear,twenty,25,Car,False\n",
    );

    let output = run_session(dir.path(), "1\n2\n2024\ny\n2\n2\n2024\ny\n3\n2\n2024\nn\n");

    assert!(output.contains("CSV file does not have the required format"));
    assert!(output.contains("line 2: could not parse JunctionSpeedLimit value 'twenty'"));
    assert!(output.contains("traffic_data03022024.csv does not exist."));
    assert_eq!(output.matches("Processed Outcomes:").count(), 0);
    assert!(output.ends_with("Exiting the program.\n"));
    assert!(!dir.path().join("results.txt").exists());
}

#[test]
fn missing_file_and_schema_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Dataset::load(dir.path().join("traffic_data01012024.csv")),
        Err(Error::FileNotFound { .. })
    ));

    let without_weather = HEADER.replace("Weather_Conditions,", "");
    fs::write(dir.path().join("partial.csv"), without_weather).unwrap();
    match Dataset::load(dir.path().join("partial.csv")) {
        Err(Error::SchemaMismatch { missing }) => assert_eq!(missing, vec!["Weather_Conditions"]),
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}
