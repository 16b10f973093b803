use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::stats::Statistics;

pub const HEADER: &str = "Processed Outcomes:";
pub const DEFAULT_RESULTS_FILE: &str = "results.txt";

/// Writes one report block: header, one `label: value` line per metric and a
/// trailing blank line.
pub fn write_report<T: Write>(mut target: T, stats: &Statistics) -> io::Result<()> {
    writeln!(target, "{}", HEADER)?;
    for (label, value) in stats.entries() {
        writeln!(target, "{}: {}", label, value)?;
    }
    writeln!(target)?;
    target.flush()
}

/// Appends a report block to the cumulative results file, creating it if needed.
pub fn append_report(path: impl AsRef<Path>, stats: &Statistics) -> io::Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    write_report(BufWriter::new(file), stats)?;
    info!("appended report to {}", path.display());
    Ok(())
}

#[test]
fn block_layout() {
    let stats = Statistics {
        total_vehicles: 3,
        peak_hour_traffic: 2,
        peak_hours: vec!["Between 8:00 and 9:00".to_string()],
        ..Statistics::default()
    };
    let mut output = Vec::new();
    write_report(&mut output, &stats).unwrap();
    let text = String::from_utf8(output).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 17);
    assert_eq!(lines[0], "Processed Outcomes:");
    assert_eq!(lines[1], "Total vehicles: 3");
    assert_eq!(lines[13], "Peak hour traffic at Hanley Highway/Westway: 2");
    assert_eq!(
        lines[14],
        "Peak hour(s) at Hanley Highway/Westway: ['Between 8:00 and 9:00']"
    );
    assert_eq!(lines[15], "Total hours of rain: 0");
    assert!(text.ends_with("Total hours of rain: 0\n\n"));
}

#[test]
fn appends_blocks_in_call_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_RESULTS_FILE);
    let first = Statistics {
        total_vehicles: 1,
        ..Statistics::default()
    };
    let second = Statistics {
        total_vehicles: 2,
        ..Statistics::default()
    };

    append_report(&path, &first).unwrap();
    append_report(&path, &second).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let blocks: Vec<&str> = text.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].starts_with("Processed Outcomes:\nTotal vehicles: 1\n"));
    assert!(blocks[1].starts_with("Processed Outcomes:\nTotal vehicles: 2\n"));
}
