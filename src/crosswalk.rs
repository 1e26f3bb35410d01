// src/crosswalk.rs

//! HUD/USPS ZIP → county crosswalk spreadsheets.

use crate::codes::{FixedCode, StCountyFips, Zip};
use crate::fetch::{Fetch, FetchError};
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::{
    fs::{self, File},
    path::Path,
};
use tracing::{debug, info};
use url::Url;
use zip::ZipArchive;

pub const ZIP_COLUMN: &str = "ZIP";
/// Source name of the county column; renamed to [`FIPS_COLUMN`] on read.
pub const COUNTY_COLUMN: &str = "COUNTY";
pub const FIPS_COLUMN: &str = "STCOUNTYFP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswalkRow {
    pub zip: Zip,
    pub fips: StCountyFips,
}

/// One quarter's `(ZIP, STCOUNTYFP)` pairs, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipCountyCrosswalk {
    rows: Vec<CrosswalkRow>,
}

/// Result of asking the host for one period.
#[derive(Debug)]
pub enum Release {
    Published(ZipCountyCrosswalk),
    /// Nothing usable was served for this period.
    Unpublished { url: String, reason: String },
}

impl ZipCountyCrosswalk {
    pub fn from_rows(rows: Vec<CrosswalkRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CrosswalkRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read the first worksheet of an `.xlsx` file.
    pub fn read(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).with_context(|| format!("opening {}", path.display()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("{} has no worksheets", path.display()))?
            .with_context(|| format!("reading first worksheet of {}", path.display()))?;
        Self::from_range(&range).with_context(|| format!("normalizing {}", path.display()))
    }

    /// Normalize a sheet: first row is the header. Header case varies between
    /// releases, so names are upper-cased before `ZIP`/`COUNTY` are looked up.
    pub fn from_range(range: &Range<Data>) -> Result<Self> {
        let mut sheet_rows = range.rows();
        let header = sheet_rows
            .next()
            .ok_or_else(|| anyhow!("crosswalk sheet is empty"))?;
        let headers: Vec<String> = header.iter().map(normalize_header).collect();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("crosswalk has no {} column (found {:?})", name, headers))
        };
        let zip_idx = column(ZIP_COLUMN)?;
        let fips_idx = column(FIPS_COLUMN)?;

        let mut rows = Vec::with_capacity(range.height().saturating_sub(1));
        let mut skipped = 0usize;
        for (n, row) in sheet_rows.enumerate() {
            let zip_cell = row.get(zip_idx).unwrap_or(&Data::Empty);
            let fips_cell = row.get(fips_idx).unwrap_or(&Data::Empty);
            if is_blank(zip_cell) || is_blank(fips_cell) {
                skipped += 1;
                continue;
            }
            // +2: one for the header, one for 1-based sheet rows
            let line = n + 2;
            rows.push(CrosswalkRow {
                zip: code_from_cell(zip_cell).with_context(|| format!("row {}", line))?,
                fips: code_from_cell(fips_cell).with_context(|| format!("row {}", line))?,
            });
        }
        debug!(rows = rows.len(), skipped, "normalized crosswalk");
        Ok(Self { rows })
    }
}

fn normalize_header(cell: &Data) -> String {
    let name = cell.to_string().trim().to_uppercase();
    if name == COUNTY_COLUMN {
        FIPS_COLUMN.to_string()
    } else {
        name
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text cells keep their digits; numeric cells get their zeros back.
fn code_from_cell<C: FixedCode>(cell: &Data) -> Result<C> {
    let code = match cell {
        Data::String(s) => C::parse_code(s)?,
        Data::Int(i) if *i >= 0 => C::from_code_number(*i as u64)?,
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => C::from_code_number(*f as u64)?,
        other => return Err(anyhow!("{} cell {:?} is not a code", C::KIND, other)),
    };
    Ok(code)
}

/// Download and normalize one period's crosswalk.
///
/// A non-success status, or a body that is not an `.xlsx` package, means the
/// period has not been published. Everything else that goes wrong is an error.
pub fn fetch(fetcher: &impl Fetch, url: &Url, dest: &Path) -> Result<Release> {
    let path = match fetcher.fetch(url, dest) {
        Ok(path) => path,
        Err(FetchError::Unavailable { url, status }) => {
            return Ok(Release::Unpublished {
                url,
                reason: format!("HTTP {}", status),
            })
        }
        Err(e) => return Err(e).with_context(|| format!("downloading crosswalk {}", url)),
    };

    if !is_spreadsheet(&path)? {
        // a placeholder page must not be mistaken for a cached spreadsheet
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        return Ok(Release::Unpublished {
            url: url.to_string(),
            reason: "response is not a spreadsheet".to_string(),
        });
    }

    let crosswalk = ZipCountyCrosswalk::read(&path)?;
    info!(%url, rows = crosswalk.len(), "crosswalk loaded");
    Ok(Release::Published(crosswalk))
}

/// `.xlsx` is a ZIP package with a workbook part.
fn is_spreadsheet(path: &Path) -> Result<bool> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "not a ZIP package");
            return Ok(false);
        }
    };
    let found = archive.by_name("xl/workbook.xml").is_ok();
    Ok(found)
}
