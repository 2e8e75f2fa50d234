use crate::core::config::InputLayout;
use crate::core::error::FundError;
use crate::core::ledger::{Ledger, LedgerSink, LedgerSource};
use crate::core::price::{PriceSource, RawPrice, parse_optional_number};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads price segments and the ledger from one directory and writes the
/// refund ledger back into it.
pub struct CsvDirectory {
    root: PathBuf,
    layout: InputLayout,
}

impl CsvDirectory {
    pub fn new<P: AsRef<Path>>(root: P, layout: InputLayout) -> Self {
        CsvDirectory {
            root: root.as_ref().to_path_buf(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.layout.output_file)
    }

    fn open(&self, name: &str, file_name: &str) -> Result<csv::Reader<File>> {
        let path = self.root.join(file_name);
        if !path.is_file() {
            return Err(FundError::InputMissing {
                name: name.to_string(),
                path,
            }
            .into());
        }
        ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))
    }

    fn read_segment(&self, symbol: &str, segment: u32) -> Result<Vec<RawPrice>> {
        let file_name = self.layout.segment_file(symbol, segment);
        let mut reader = self.open(symbol, &file_name)?;
        let close_header = reader
            .headers()
            .with_context(|| format!("Failed to read header of {file_name}"))?
            .get(self.layout.close_column)
            .map(str::to_string)
            .unwrap_or_else(|| format!("column {}", self.layout.close_column));

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let row = i + 1;
            let record =
                record.with_context(|| format!("Failed to read row {row} of {file_name}"))?;
            let timestamp = cell(&record, self.layout.timestamp_column, row)?;
            let close = parse_optional_number(
                cell(&record, self.layout.close_column, row)?,
                &close_header,
                row,
            )
            .with_context(|| format!("Invalid close in {file_name}"))?;
            rows.push(RawPrice::new(timestamp, close));
        }
        debug!("Read {} rows from {file_name}", rows.len());
        Ok(rows)
    }
}

fn cell(record: &StringRecord, index: usize, row: usize) -> Result<&str, FundError> {
    record.get(index).ok_or(FundError::ShortRow {
        row,
        expected: index + 1,
        found: record.len(),
    })
}

impl PriceSource for CsvDirectory {
    /// Concatenates the segments newest file first, `<SYMBOL>_<n>.csv` down
    /// to `<SYMBOL>_1.csv`.
    fn load_prices(&self, symbol: &str) -> Result<Vec<RawPrice>> {
        let mut rows = Vec::new();
        for segment in (1..=self.layout.segments).rev() {
            rows.extend(self.read_segment(symbol, segment)?);
        }
        Ok(rows)
    }
}

impl LedgerSource for CsvDirectory {
    fn load_ledger(&self) -> Result<Ledger> {
        let file_name = &self.layout.ledger_file;
        let mut reader = self.open("ledger", file_name)?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read header of {file_name}"))?
            .iter()
            .map(str::to_string)
            .collect();

        let rows = reader
            .records()
            .map(|r| r.map(|record| record.iter().map(str::to_string).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, csv::Error>>()
            .with_context(|| format!("Failed to read {file_name}"))?;

        let ledger = Ledger::from_table(headers, rows)
            .with_context(|| format!("Invalid ledger {file_name}"))?;
        debug!("Read {} investors from {file_name}", ledger.len());
        Ok(ledger)
    }
}

impl LedgerSink for CsvDirectory {
    fn write_ledger(&self, ledger: &Ledger) -> Result<()> {
        let path = self.output_path();
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writer.write_record(ledger.output_headers())?;
        for record in &ledger.records {
            writer.write_record(ledger.output_row(record))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {} rows to {}", ledger.len(), path.display());
        Ok(())
    }
}
