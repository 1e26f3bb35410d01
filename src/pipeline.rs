// src/pipeline.rs

use crate::config::Config;
use crate::crosswalk::{self, Release};
use crate::extract::JoinedExtract;
use crate::fetch::Fetch;
use crate::layout::Layout;
use crate::period::Period;
use crate::reference::{self, CountyReference};
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use std::{path::PathBuf, thread};
use tracing::{info, instrument, warn};
use url::Url;

/// What one run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub extracts: Vec<PathBuf>,
    /// Periods whose crosswalk was not published; each one ended its year.
    pub unavailable: Vec<Period>,
}

enum PeriodOutcome {
    Written(PathBuf),
    Unavailable,
}

pub struct Pipeline<F> {
    config: Config,
    layout: Layout,
    fetcher: F,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        let layout = Layout::new(config.data_dir.clone());
        Self {
            config,
            layout,
            fetcher,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Process every period from the start year through the current year.
    pub fn run(&self) -> Result<RunReport> {
        self.run_through(Local::now().year())
    }

    /// Process every period from the start year through `last_year`.
    ///
    /// An unpublished quarter ends that year's quarter loop only; later years
    /// are still requested.
    pub fn run_through(&self, last_year: i32) -> Result<RunReport> {
        self.layout.ensure_dirs()?;
        let reference = self.load_reference()?;

        let mut report = RunReport::default();
        for year in self.config.start_year..=last_year {
            for &month in &self.config.months {
                let period = Period::new(year, month);
                let outcome = self.process_period(&reference, &period)?;
                thread::sleep(self.config.request_delay);

                match outcome {
                    PeriodOutcome::Written(path) => report.extracts.push(path),
                    PeriodOutcome::Unavailable => {
                        report.unavailable.push(period);
                        break;
                    }
                }
            }
        }

        if !self.config.keep_downloads {
            info!(path = %self.layout.downloads_dir().display(), "removing downloaded files");
            self.layout.remove_downloads()?;
        }

        info!(
            extracts = report.extracts.len(),
            unavailable = report.unavailable.len(),
            "run finished"
        );
        Ok(report)
    }

    fn load_reference(&self) -> Result<CountyReference> {
        let url = Url::parse(&self.config.reference_url)
            .with_context(|| format!("parsing reference URL {}", self.config.reference_url))?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("national_county.txt");
        let dest = self.layout.reference_cache(file_name);
        reference::load(&self.fetcher, &url, &dest)
    }

    #[instrument(level = "info", skip(self, reference, period), fields(period = %period))]
    fn process_period(&self, reference: &CountyReference, period: &Period) -> Result<PeriodOutcome> {
        let url = period.crosswalk_url(&self.config.crosswalk_base_url)?;
        let dest = self.layout.crosswalk_source(period);

        let crosswalk = match crosswalk::fetch(&self.fetcher, &url, &dest)? {
            Release::Published(crosswalk) => crosswalk,
            Release::Unpublished { url, reason } => {
                warn!(%url, %reason, "no data for {}", period);
                return Ok(PeriodOutcome::Unavailable);
            }
        };

        let extract = JoinedExtract::join(&crosswalk, reference);
        let out = self.layout.extract_path(period);
        extract.write_csv(&out)?;
        info!(rows = extract.len(), "Completed {}", out.display());
        Ok(PeriodOutcome::Written(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::QuarterMonth;
    use crate::testing::{init_logging, xlsx, Cell, StaticFetcher, CENSUS_SAMPLE};
    use std::{fs, path::Path, time::Duration};
    use tempfile::tempdir;
    use Cell::Text;

    const REFERENCE_URL: &str = "https://census.test/geo/national_county.txt";
    const HUD_BASE: &str = "https://hud.test/usps/";

    fn test_config(data_dir: &Path) -> Config {
        Config {
            start_year: 2021,
            months: QuarterMonth::ALL.to_vec(),
            keep_downloads: true,
            request_delay: Duration::ZERO,
            reference_url: REFERENCE_URL.to_string(),
            crosswalk_base_url: HUD_BASE.to_string(),
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn hud_url(period: &Period) -> String {
        period.crosswalk_url(HUD_BASE).unwrap().to_string()
    }

    fn sample_sheet() -> Vec<u8> {
        xlsx(&[
            vec![Text("ZIP"), Text("COUNTY")],
            vec![Text("94601"), Text("06001")],
            vec![Text("36067"), Text("01001")],
            vec![Text("12345"), Text("99999")],
        ])
    }

    fn extract_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn unavailable_second_period_yields_one_extract() {
        init_logging();
        let tmp = tempdir().unwrap();
        let march = Period::new(2021, QuarterMonth::March);
        let fetcher = StaticFetcher::default()
            .with(REFERENCE_URL, CENSUS_SAMPLE)
            .with(&hud_url(&march), sample_sheet());

        let pipeline = Pipeline::new(test_config(tmp.path()), &fetcher);
        let report = pipeline.run_through(2021).unwrap();

        assert_eq!(report.extracts, vec![tmp.path().join("zip_county_state_2021_03.csv")]);
        assert_eq!(report.unavailable, vec![Period::new(2021, QuarterMonth::June)]);
        assert_eq!(extract_files(tmp.path()), vec!["zip_county_state_2021_03.csv"]);

        let text = fs::read_to_string(&report.extracts[0]).unwrap();
        assert_eq!(
            text,
            "ZIP,COUNTYNAME,STATE,STCOUNTYFP\n\
             36067,Autauga County,AL,01001\n\
             94601,Alameda County,CA,06001\n"
        );

        // June was the last request for 2021
        assert_eq!(
            fetcher.requested(),
            vec![
                REFERENCE_URL.to_string(),
                hud_url(&march),
                hud_url(&Period::new(2021, QuarterMonth::June)),
            ]
        );
    }

    #[test]
    fn missing_quarter_only_ends_its_year() {
        let tmp = tempdir().unwrap();
        let mar_2021 = Period::new(2021, QuarterMonth::March);
        let mar_2022 = Period::new(2022, QuarterMonth::March);
        let fetcher = StaticFetcher::default()
            .with(REFERENCE_URL, CENSUS_SAMPLE)
            .with(&hud_url(&mar_2021), sample_sheet())
            .with(&hud_url(&mar_2022), sample_sheet());

        let report = Pipeline::new(test_config(tmp.path()), &fetcher)
            .run_through(2022)
            .unwrap();

        assert_eq!(report.extracts.len(), 2);
        assert_eq!(
            report.unavailable,
            vec![
                Period::new(2021, QuarterMonth::June),
                Period::new(2022, QuarterMonth::June),
            ]
        );
    }

    #[test]
    fn missing_reference_aborts_the_run() {
        let tmp = tempdir().unwrap();
        let fetcher = StaticFetcher::default();
        let err = Pipeline::new(test_config(tmp.path()), &fetcher)
            .run_through(2021)
            .unwrap_err();

        assert!(format!("{:#}", err).contains("county reference"));
        // no crosswalk was requested
        assert_eq!(fetcher.requested(), vec![REFERENCE_URL.to_string()]);
    }

    #[test]
    fn downloads_are_removed_when_not_kept() {
        let tmp = tempdir().unwrap();
        let march = Period::new(2021, QuarterMonth::March);
        let fetcher = StaticFetcher::default()
            .with(REFERENCE_URL, CENSUS_SAMPLE)
            .with(&hud_url(&march), sample_sheet());
        let mut config = test_config(tmp.path());
        config.keep_downloads = false;

        let pipeline = Pipeline::new(config, &fetcher);
        let report = pipeline.run_through(2021).unwrap();

        assert!(!pipeline.layout().downloads_dir().exists());
        assert!(report.extracts[0].is_file());
    }

    #[test]
    fn downloads_are_cached_when_kept() {
        let tmp = tempdir().unwrap();
        let march = Period::new(2021, QuarterMonth::March);
        let fetcher = StaticFetcher::default()
            .with(REFERENCE_URL, CENSUS_SAMPLE)
            .with(&hud_url(&march), sample_sheet());

        let pipeline = Pipeline::new(test_config(tmp.path()), &fetcher);
        pipeline.run_through(2021).unwrap();

        let layout = pipeline.layout();
        assert!(layout.reference_cache("national_county.txt").is_file());
        assert!(layout.crosswalk_source(&march).is_file());
    }

    #[test]
    fn start_after_last_year_does_nothing() {
        let tmp = tempdir().unwrap();
        let fetcher = StaticFetcher::default().with(REFERENCE_URL, CENSUS_SAMPLE);
        let report = Pipeline::new(test_config(tmp.path()), &fetcher)
            .run_through(2020)
            .unwrap();
        assert!(report.extracts.is_empty());
        assert!(report.unavailable.is_empty());
    }
}
