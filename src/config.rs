// src/config.rs

use crate::period::QuarterMonth;
use std::path::PathBuf;
use std::time::Duration;

/// First year to request. HUD publishes back to 2010.
pub const START_YEAR: i32 = 2021;

/// HUD releases are quarterly.
pub const QUARTER_MONTHS: [QuarterMonth; 4] = QuarterMonth::ALL;

/// Leave the downloaded spreadsheets and reference cache on disk after a run.
pub const KEEP_DOWNLOADS: bool = true;

/// Pause after every crosswalk request so the HUD host is not hammered.
pub const REQUEST_DELAY: Duration = Duration::from_secs(1);

pub const CENSUS_FIPS_URL: &str =
    "https://www2.census.gov/geo/docs/reference/codes/files/national_county.txt";

pub const HUD_CROSSWALK_BASE_URL: &str = "https://www.huduser.gov/portal/datasets/usps/";

pub const DATA_DIR: &str = "data";

/// Run options. These are fixed at build time; `Default` is the production
/// configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub start_year: i32,
    pub months: Vec<QuarterMonth>,
    pub keep_downloads: bool,
    pub request_delay: Duration,
    pub reference_url: String,
    pub crosswalk_base_url: String,
    /// Extracts land here; downloads go under `<data_dir>/downloads`.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_year: START_YEAR,
            months: QUARTER_MONTHS.to_vec(),
            keep_downloads: KEEP_DOWNLOADS,
            request_delay: REQUEST_DELAY,
            reference_url: CENSUS_FIPS_URL.to_string(),
            crosswalk_base_url: HUD_CROSSWALK_BASE_URL.to_string(),
            data_dir: PathBuf::from(DATA_DIR),
        }
    }
}
