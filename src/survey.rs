//! Daily traffic survey summaries.
//!
//! A survey file is a CSV export with one row per observed vehicle. The
//! [`Dataset`] loader checks the header and reads the rows, [`Statistics`]
//! summarises them, and [`report`] appends the summary to a cumulative
//! results file. [`Session`] ties these together behind console prompts.

pub mod error;
pub mod record;
pub mod report;
pub mod session;
pub mod stats;

pub use error::{Error, InputError};
pub use record::{Dataset, Record, REQUIRED_COLUMNS};
pub use report::{append_report, write_report, DEFAULT_RESULTS_FILE};
pub use session::{Choice, Session, SurveyDate};
pub use stats::{HourlyCounts, Metric, Statistics};
