use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the provider physically read the meter or interpolated the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    Measured,
    Estimated,
}

impl StatementType {
    /// Map the export's single-character code. Case-sensitive.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(StatementType::Measured),
            'E' => Some(StatementType::Estimated),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            StatementType::Measured => 'M',
            StatementType::Estimated => 'E',
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One meter reading for one calendar day, as listed in the portal export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConsumption {
    pub day: NaiveDate,
    /// Cumulative meter index
    pub index: i64,
    /// Delta against the previous day
    pub consumption: i64,
    pub statement_type: StatementType,
}
