//! Price series abstractions and timestamp normalization

use super::error::FundError;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

static UTC_OFFSET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]\d{2}:\d{2}$").unwrap());

/// A price row as read from a source, before its timestamp is normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrice {
    pub timestamp: String,
    pub close: Option<f64>,
}

impl RawPrice {
    pub fn new(timestamp: &str, close: Option<f64>) -> Self {
        RawPrice {
            timestamp: timestamp.to_string(),
            close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDateTime,
    /// `None` when the source had no close for this row.
    pub close: Option<f64>,
}

/// Chronologically ordered closes for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub records: Vec<PriceRecord>,
}

impl SymbolSeries {
    /// Normalizes raw rows into an ascending series.
    ///
    /// Rows may arrive in any segment order. Rows sharing an exact timestamp
    /// keep the first occurrence.
    pub fn from_raw(symbol: &str, rows: &[RawPrice]) -> Result<Self, FundError> {
        let mut records = rows
            .iter()
            .map(|row| {
                Ok(PriceRecord {
                    date: parse_timestamp(&row.timestamp)?,
                    close: row.close,
                })
            })
            .collect::<Result<Vec<_>, FundError>>()?;

        records.sort_by_key(|r| r.date);
        let before = records.len();
        records.dedup_by_key(|r| r.date);
        if records.len() < before {
            warn!(
                "Dropped {} duplicate rows for {symbol}; check for overlapping segments",
                before - records.len()
            );
        }

        Ok(SymbolSeries {
            symbol: symbol.to_string(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Strips a trailing `+HH:MM`/`-HH:MM` offset and parses the local date-time.
///
/// The offset is discarded, not applied: `2021-03-01 00:00:00-05:00` becomes
/// `2021-03-01 00:00:00`.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, FundError> {
    let trimmed = value.trim();
    let local = UTC_OFFSET_SUFFIX.replace(trimmed, "");
    NaiveDateTime::parse_from_str(&local, TIMESTAMP_FORMAT).map_err(|_| {
        FundError::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Parses a ledger date, which may be a full timestamp or a bare date
/// meaning midnight.
pub fn parse_ledger_date(value: &str) -> Option<NaiveDateTime> {
    parse_timestamp(value).ok().or_else(|| {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Parses a numeric cell. Blank and `NaN` cells are unknown values.
pub fn parse_optional_number(
    value: &str,
    column: &str,
    row: usize,
) -> Result<Option<f64>, FundError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(|v| Some(v).filter(|v| !v.is_nan()))
        .map_err(|_| FundError::InvalidNumber {
            column: column.to_string(),
            row,
            value: value.to_string(),
        })
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Supplies the raw rows of every segment for a symbol.
pub trait PriceSource {
    fn load_prices(&self, symbol: &str) -> Result<Vec<RawPrice>>;
}
