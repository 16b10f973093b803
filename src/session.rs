use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use log::{debug, error, warn};

use crate::error::InputError;
use crate::record::Dataset;
use crate::report::{append_report, write_report};
use crate::stats::Statistics;

type Check = fn(u32) -> Result<u32, InputError>;

const DATE_FIELDS: [(&str, Check); 3] = [
    ("Enter the day (DD): ", check_day),
    ("Enter the month (MM): ", check_month),
    ("Enter the year (YYYY): ", check_year),
];
const CONTINUE_PROMPT: &str = "\nDo you want to load another dataset? (Y/N): ";

/// Survey day as entered on the console. Each part is range checked on its
/// own, so 30/02 is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyDate {
    day: u32,
    month: u32,
    year: u32,
}

impl SurveyDate {
    pub fn new(day: u32, month: u32, year: u32) -> Result<Self, InputError> {
        Ok(SurveyDate {
            day: check_day(day)?,
            month: check_month(month)?,
            year: check_year(year)?,
        })
    }

    /// Name of the survey file recorded on this day.
    pub fn file_name(&self) -> String {
        format!("traffic_data{:02}{:02}{}.csv", self.day, self.month, self.year)
    }
}

impl fmt::Display for SurveyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.day, self.month, self.year)
    }
}

fn check_day(day: u32) -> Result<u32, InputError> {
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(InputError::Day)
    }
}

fn check_month(month: u32) -> Result<u32, InputError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(InputError::Month)
    }
}

fn check_year(year: u32) -> Result<u32, InputError> {
    if (2000..=2024).contains(&year) {
        Ok(year)
    } else {
        Err(InputError::Year)
    }
}

pub fn parse_number(answer: &str) -> Result<u32, InputError> {
    let answer = answer.trim();
    answer
        .parse()
        .map_err(|_| InputError::NotANumber(answer.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Continue,
    Exit,
}

impl Choice {
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_uppercase().as_str() {
            "Y" => Some(Choice::Continue),
            "N" => Some(Choice::Exit),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum State {
    AwaitingDate,
    Processing(SurveyDate),
    AwaitingContinue,
    Terminated,
}

/// Interactive loop: ask for a date, report on that day's survey file, and
/// offer to go again.
pub struct Session<R, W> {
    input: R,
    output: W,
    data_dir: PathBuf,
    results: PathBuf,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(
        input: R,
        output: W,
        data_dir: impl Into<PathBuf>,
        results: impl Into<PathBuf>,
    ) -> Self {
        Session {
            input,
            output,
            data_dir: data_dir.into(),
            results: results.into(),
        }
    }

    /// Runs until the user answers N or the console is closed.
    pub fn run(&mut self) -> io::Result<()> {
        let mut state = State::AwaitingDate;
        loop {
            debug!("session state {:?}", state);
            state = match state {
                State::AwaitingDate => match self.read_date()? {
                    Some(date) => State::Processing(date),
                    None => State::Terminated,
                },
                State::Processing(date) => {
                    self.process(&date)?;
                    State::AwaitingContinue
                }
                State::AwaitingContinue => match self.read_choice()? {
                    Some(Choice::Continue) => State::AwaitingDate,
                    Some(Choice::Exit) => {
                        writeln!(self.output, "Exiting the program.")?;
                        State::Terminated
                    }
                    None => State::Terminated,
                },
                State::Terminated => return Ok(()),
            };
        }
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            debug!("console input closed");
            return Ok(None);
        }
        Ok(Some(answer))
    }

    /// Asks for day, month and year, starting over from the day on any
    /// rejected answer.
    fn read_date(&mut self) -> io::Result<Option<SurveyDate>> {
        let mut fields = Vec::with_capacity(DATE_FIELDS.len());
        while fields.len() < DATE_FIELDS.len() {
            let (text, check) = DATE_FIELDS[fields.len()];
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            match parse_number(&answer).and_then(check) {
                Ok(value) => fields.push(value),
                Err(err) => {
                    warn!("rejected date input: {}", err);
                    writeln!(self.output, "Invalid input: {}", err)?;
                    fields.clear();
                }
            }
        }
        Ok(Some(SurveyDate {
            day: fields[0],
            month: fields[1],
            year: fields[2],
        }))
    }

    fn read_choice(&mut self) -> io::Result<Option<Choice>> {
        loop {
            let Some(answer) = self.prompt(CONTINUE_PROMPT)? else {
                return Ok(None);
            };
            match Choice::parse(&answer) {
                Some(choice) => return Ok(Some(choice)),
                None => writeln!(self.output, "Invalid input. Please enter 'Y' or 'N'.")?,
            }
        }
    }

    /// Loads and summarises one survey file. File level failures are reported
    /// on the console and do not end the session.
    fn process(&mut self, date: &SurveyDate) -> io::Result<()> {
        let path = self.data_dir.join(date.file_name());
        debug!("survey for {} is read from {}", date, path.display());

        let outcome = Dataset::load(&path).and_then(|dataset| Statistics::compute(&dataset));
        let stats = match outcome {
            Ok(stats) => stats,
            Err(err) => {
                error!("could not process {}: {}", path.display(), err);
                writeln!(self.output, "{}", err)?;
                return Ok(());
            }
        };

        writeln!(self.output)?;
        write_report(&mut self.output, &stats)?;
        if let Err(err) = append_report(&self.results, &stats) {
            error!("could not save results to {}: {}", self.results.display(), err);
            writeln!(
                self.output,
                "Could not save results to {}: {}",
                self.results.display(),
                err
            )?;
        }
        Ok(())
    }
}

#[test]
fn file_name_is_zero_padded() {
    let date = SurveyDate::new(5, 6, 2024).unwrap();
    assert_eq!(date.file_name(), "traffic_data05062024.csv");
    assert_eq!(date.to_string(), "05/06/2024");
    assert_eq!(
        SurveyDate::new(31, 12, 2000).unwrap().file_name(),
        "traffic_data31122000.csv"
    );
}

#[test]
fn out_of_range_parts_are_rejected() {
    assert_eq!(SurveyDate::new(0, 6, 2024), Err(InputError::Day));
    assert_eq!(SurveyDate::new(32, 6, 2024), Err(InputError::Day));
    assert_eq!(SurveyDate::new(1, 0, 2024), Err(InputError::Month));
    assert_eq!(SurveyDate::new(1, 13, 2024), Err(InputError::Month));
    assert_eq!(SurveyDate::new(1, 6, 1999), Err(InputError::Year));
    assert_eq!(SurveyDate::new(1, 6, 2025), Err(InputError::Year));
    assert!(SurveyDate::new(30, 2, 2023).is_ok());
}

#[test]
fn answers_are_trimmed() {
    assert_eq!(parse_number(" 07\n"), Ok(7));
    assert_eq!(
        parse_number("seven\n"),
        Err(InputError::NotANumber("seven".to_string()))
    );
    assert_eq!(Choice::parse(" y \n"), Some(Choice::Continue));
    assert_eq!(Choice::parse("N\n"), Some(Choice::Exit));
    assert_eq!(Choice::parse("yes\n"), None);
}

#[test]
fn bad_date_answers_prompt_again() {
    let dir = tempfile::tempdir().unwrap();
    let input = "0\n32\n5\n13\n5\n6\n1999\n5\n6\n2025\n5\n6\n2024\nn\n";
    let mut output = Vec::new();

    Session::new(input.as_bytes(), &mut output, dir.path(), dir.path().join("results.txt"))
        .run()
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.matches("Invalid input: Day must be between 1 and 31.").count(), 2);
    assert_eq!(text.matches("Invalid input: Month must be between 1 and 12.").count(), 1);
    assert_eq!(text.matches("Invalid input: Year must be between 2000 and 2024.").count(), 2);
    assert_eq!(text.matches("Enter the day (DD): ").count(), 6);
    assert!(text.contains("traffic_data05062024.csv does not exist."));
    assert!(text.ends_with("Exiting the program.\n"));
}

#[test]
fn closed_console_ends_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut output = Vec::new();

    Session::new("12\n".as_bytes(), &mut output, dir.path(), dir.path().join("results.txt"))
        .run()
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.ends_with("Enter the month (MM): "));
}
