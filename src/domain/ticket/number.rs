//! Human-facing ticket numbers: `TKT-<year>-<5-digit sequence>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

const PREFIX: &str = "TKT";

/// Per-year sequential ticket number.
///
/// The sequence restarts at 1 each calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketNumber {
    year: i32,
    sequence: u32,
}

impl TicketNumber {
    /// Creates a ticket number, rejecting a zero sequence.
    pub fn new(year: i32, sequence: u32) -> Result<Self, ValidationError> {
        if sequence == 0 {
            return Err(ValidationError::invalid_format(
                "ticket_number",
                "sequence starts at 1",
            ));
        }
        Ok(Self { year, sequence })
    }

    /// Next number for `year` given the highest sequence already used that year.
    pub fn next(year: i32, max_sequence: Option<u32>) -> Self {
        Self {
            year,
            sequence: max_sequence.map(|s| s.saturating_add(1)).unwrap_or(1),
        }
    }

    /// Returns the calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the sequence within the year.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:05}", PREFIX, self.year, self.sequence)
    }
}

impl FromStr for TicketNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ValidationError::invalid_format(
                "ticket_number",
                format!("expected TKT-YYYY-NNNNN, got '{}'", s),
            )
        };

        let mut parts = s.trim().splitn(3, '-');
        if parts.next() != Some(PREFIX) {
            return Err(invalid());
        }
        let year = parts
            .next()
            .filter(|y| y.len() == 4)
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let sequence = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(invalid)?;

        Self::new(year, sequence)
    }
}

impl TryFrom<String> for TicketNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketNumber> for String {
    fn from(number: TicketNumber) -> Self {
        number.to_string()
    }
}
