// src/extract.rs

use crate::codes::{StCountyFips, Zip};
use crate::crosswalk::ZipCountyCrosswalk;
use crate::reference::CountyReference;
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    csv::WriterBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};
use tracing::debug;

/// Output header, in order.
pub const EXTRACT_COLUMNS: [&str; 4] = ["ZIP", "COUNTYNAME", "STATE", "STCOUNTYFP"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRow {
    pub zip: Zip,
    pub county_name: String,
    pub state: String,
    pub fips: StCountyFips,
}

/// Crosswalk rows that matched a reference county, ordered by the county's
/// position in the reference feed, then by crosswalk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinedExtract {
    rows: Vec<ExtractRow>,
}

impl JoinedExtract {
    /// Inner join on `STCOUNTYFP`; unmatched crosswalk rows are dropped.
    pub fn join(crosswalk: &ZipCountyCrosswalk, reference: &CountyReference) -> Self {
        let mut keyed: Vec<(usize, ExtractRow)> = crosswalk
            .rows()
            .iter()
            .filter_map(|row| {
                let pos = reference.position(&row.fips)?;
                let county = reference.get(&row.fips)?;
                Some((
                    pos,
                    ExtractRow {
                        zip: row.zip.clone(),
                        county_name: county.name.clone(),
                        state: county.state.clone(),
                        fips: row.fips.clone(),
                    },
                ))
            })
            .collect();
        // stable: crosswalk order survives within a county
        keyed.sort_by_key(|(pos, _)| *pos);
        let rows: Vec<ExtractRow> = keyed.into_iter().map(|(_, row)| row).collect();
        debug!(
            matched = rows.len(),
            dropped = crosswalk.len() - rows.len(),
            "joined crosswalk with reference"
        );
        Self { rows }
    }

    pub fn rows(&self) -> &[ExtractRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema() -> Schema {
        Schema::new(
            EXTRACT_COLUMNS
                .iter()
                .map(|name| Field::new(*name, DataType::Utf8, false))
                .collect::<Vec<_>>(),
        )
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let rows = &self.rows;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.zip.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.county_name.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.fips.as_str()))),
        ];
        RecordBatch::try_new(Arc::new(Self::schema()), columns).context("building extract batch")
    }

    /// Write as UTF-8 CSV with a header row. The file appears atomically;
    /// on failure no partial file is left behind.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let batch = self.to_record_batch()?;
        let tmp_path = path.with_extension("csv.tmp");

        let res = write_batch(&batch, &tmp_path).and_then(|()| {
            fs::rename(&tmp_path, path).with_context(|| {
                format!("renaming {} to {}", tmp_path.display(), path.display())
            })
        });
        if res.is_err() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                debug!(path = %tmp_path.display(), error = %e, "no temporary file to remove");
            }
        }
        res
    }
}

fn write_batch(batch: &RecordBatch, tmp_path: &Path) -> Result<()> {
    let file =
        File::create(tmp_path).with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer
        .write(batch)
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    writer
        .into_inner()
        .flush()
        .with_context(|| format!("flushing {}", tmp_path.display()))?;
    Ok(())
}
