// src/reference.rs

//! Census county FIPS reference (`national_county.txt`).

use crate::codes::{CountyFips, StCountyFips, StateFips};
use crate::fetch::Fetch;
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, StringArray},
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{collections::HashMap, fs, io::Cursor, path::Path, sync::Arc};
use tracing::{debug, info, warn};
use url::Url;

/// The feed has no header row; this is its column order.
pub const CENSUS_COLUMNS: [&str; 5] = ["STATE", "STATEFP", "COUNTYFP", "COUNTYNAME", "CLASSFP"];

const STATE: usize = 0;
const STATEFP: usize = 1;
const COUNTYFP: usize = 2;
const COUNTYNAME: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct County {
    pub fips: StCountyFips,
    pub state: String,
    pub name: String,
}

/// Counties in feed order, indexed by combined FIPS code. Built once,
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct CountyReference {
    counties: Vec<County>,
    by_fips: HashMap<StCountyFips, usize>,
}

impl CountyReference {
    pub fn from_counties(counties: impl IntoIterator<Item = County>) -> Self {
        let mut reference = Self::default();
        for county in counties {
            if reference.by_fips.contains_key(&county.fips) {
                warn!(fips = %county.fips, "duplicate county in reference, keeping first");
                continue;
            }
            reference
                .by_fips
                .insert(county.fips.clone(), reference.counties.len());
            reference.counties.push(county);
        }
        reference
    }

    /// Parse the headerless five-column feed. Every field is read as text.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<Field> = CENSUS_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let reader = ReaderBuilder::new(schema)
            .with_header(false)
            .with_batch_size(8_192)
            .build(Cursor::new(text.as_bytes()))
            .context("creating census CSV reader")?;

        let mut counties = Vec::new();
        for batch in reader {
            let batch = batch.context("reading census county rows")?;
            counties.extend(counties_from_batch(&batch)?);
        }
        debug!(rows = counties.len(), "parsed census reference");
        Ok(Self::from_counties(counties))
    }

    pub fn get(&self, fips: &StCountyFips) -> Option<&County> {
        self.position(fips).map(|idx| &self.counties[idx])
    }

    /// Zero-based position of the county in the feed.
    pub fn position(&self, fips: &StCountyFips) -> Option<usize> {
        self.by_fips.get(fips).copied()
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}

fn counties_from_batch(batch: &RecordBatch) -> Result<Vec<County>> {
    let col = |idx: usize| {
        batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| anyhow!("census column {} is not text", CENSUS_COLUMNS[idx]))
    };
    let state_col = col(STATE)?;
    let state_fp_col = col(STATEFP)?;
    let county_fp_col = col(COUNTYFP)?;
    let name_col = col(COUNTYNAME)?;

    (0..batch.num_rows())
        .map(|row| -> Result<County> {
            let state_fp = StateFips::parse(text_at(state_fp_col, row))?;
            let county_fp = CountyFips::parse(text_at(county_fp_col, row))?;
            Ok(County {
                fips: StCountyFips::from_parts(&state_fp, &county_fp),
                state: text_at(state_col, row).trim().to_string(),
                name: text_at(name_col, row).trim().to_string(),
            })
        })
        .collect()
}

fn text_at(arr: &StringArray, row: usize) -> &str {
    if arr.is_null(row) {
        ""
    } else {
        arr.value(row)
    }
}

/// Decode the feed as UTF-8, falling back to Latin-1 for legacy bytes.
pub fn decode_feed(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Download the reference to `dest` and parse it. Any failure is fatal to the run.
pub fn load(fetcher: &impl Fetch, url: &Url, dest: &Path) -> Result<CountyReference> {
    info!(%url, "fetching county reference");
    let path = fetcher
        .fetch(url, dest)
        .with_context(|| format!("downloading county reference {}", url))?;
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let reference = CountyReference::parse(&decode_feed(bytes))
        .with_context(|| format!("parsing county reference {}", path.display()))?;
    info!(counties = reference.len(), "county reference loaded");
    Ok(reference)
}
