// src/period.rs

use anyhow::{Context, Result};
use std::fmt;
use url::Url;

/// Month that closes a crosswalk release quarter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuarterMonth {
    March,
    June,
    September,
    December,
}

impl QuarterMonth {
    pub const ALL: [QuarterMonth; 4] = [
        QuarterMonth::March,
        QuarterMonth::June,
        QuarterMonth::September,
        QuarterMonth::December,
    ];

    /// Two-digit month code used in source and extract file names.
    pub fn code(&self) -> &'static str {
        match self {
            QuarterMonth::March => "03",
            QuarterMonth::June => "06",
            QuarterMonth::September => "09",
            QuarterMonth::December => "12",
        }
    }
}

/// One quarterly data release: `(year, quarter-ending month)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: QuarterMonth,
}

impl Period {
    pub fn new(year: i32, month: QuarterMonth) -> Self {
        Self { year, month }
    }

    /// `ZIP_COUNTY_<MM><YYYY>.xlsx`
    pub fn crosswalk_file_name(&self) -> String {
        format!("ZIP_COUNTY_{}{:04}.xlsx", self.month.code(), self.year)
    }

    /// `zip_county_state_<YYYY>_<MM>.csv`
    pub fn extract_file_name(&self) -> String {
        format!("zip_county_state_{:04}_{}.csv", self.year, self.month.code())
    }

    /// Source spreadsheet URL for this period under `base`.
    pub fn crosswalk_url(&self, base: &str) -> Result<Url> {
        let base = Url::parse(base).with_context(|| format!("parsing crosswalk base URL {}", base))?;
        base.join(&self.crosswalk_file_name())
            .with_context(|| format!("joining {} onto {}", self.crosswalk_file_name(), base))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{}", self.year, self.month.code())
    }
}
