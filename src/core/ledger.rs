//! Investor ledger rows and the columns the refund calculation reads.

use super::error::FundError;
use super::price::{format_date, parse_ledger_date, parse_optional_number};
use anyhow::Result;
use chrono::NaiveDateTime;

pub const OPEN_DATE_COLUMN: &str = "investment_open_date";
pub const CLOSE_DATE_COLUMN: &str = "investment_close_date";
pub const AMOUNT_INVESTED_COLUMN: &str = "amount_invested";
pub const AMOUNT_REFUND_COLUMN: &str = "amount_refund";

/// A ledger date cell, kept verbatim alongside its parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDate {
    pub raw: String,
    pub value: Option<NaiveDateTime>,
}

impl LedgerDate {
    pub fn parse(raw: &str) -> Self {
        LedgerDate {
            raw: raw.to_string(),
            value: parse_ledger_date(raw),
        }
    }

    /// `YYYY-MM-DD` when parsed, otherwise the original text.
    pub fn display(&self) -> String {
        self.value
            .as_ref()
            .map_or_else(|| self.raw.clone(), format_date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestorRecord {
    /// 1-based data row, excluding the header.
    pub row: usize,
    /// Every cell of the input row, in header order.
    pub fields: Vec<String>,
    pub open_date: LedgerDate,
    pub close_date: LedgerDate,
    pub amount_invested: Option<f64>,
    pub amount_refund: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LedgerColumns {
    open_date: usize,
    close_date: usize,
    amount_invested: usize,
    amount_refund: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    headers: Vec<String>,
    columns: LedgerColumns,
    pub records: Vec<InvestorRecord>,
}

impl Ledger {
    /// Builds a ledger from a header row and raw data rows.
    ///
    /// Fails when a required column is absent, a row is shorter than the
    /// header, or an amount is not numeric. Unparseable dates are kept and
    /// surface later as lookup misses.
    pub fn from_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, FundError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| FundError::MissingColumn(name.to_string()))
        };

        let columns = LedgerColumns {
            open_date: required(OPEN_DATE_COLUMN)?,
            close_date: required(CLOSE_DATE_COLUMN)?,
            amount_invested: required(AMOUNT_INVESTED_COLUMN)?,
            amount_refund: position(AMOUNT_REFUND_COLUMN),
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, fields)| {
                let row = i + 1;
                if fields.len() < headers.len() {
                    return Err(FundError::ShortRow {
                        row,
                        expected: headers.len(),
                        found: fields.len(),
                    });
                }
                Ok(InvestorRecord {
                    row,
                    open_date: LedgerDate::parse(&fields[columns.open_date]),
                    close_date: LedgerDate::parse(&fields[columns.close_date]),
                    amount_invested: parse_optional_number(
                        &fields[columns.amount_invested],
                        AMOUNT_INVESTED_COLUMN,
                        row,
                    )?,
                    amount_refund: None,
                    fields,
                })
            })
            .collect::<Result<Vec<_>, FundError>>()?;

        Ok(Ledger {
            headers,
            columns,
            records,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Input headers plus `amount_refund`, unless the input already had one.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        if self.columns.amount_refund.is_none() {
            headers.push(AMOUNT_REFUND_COLUMN.to_string());
        }
        headers
    }

    /// The record's cells as written out: dates as `YYYY-MM-DD`, the refund
    /// last (or in place of an existing refund column), blank when unknown.
    pub fn output_row(&self, record: &InvestorRecord) -> Vec<String> {
        let mut fields = record.fields.clone();
        fields[self.columns.open_date] = record.open_date.display();
        fields[self.columns.close_date] = record.close_date.display();

        let refund = record.amount_refund.map(format_amount).unwrap_or_default();
        match self.columns.amount_refund {
            Some(index) => fields[index] = refund,
            None => {
                fields.truncate(self.headers.len());
                fields.push(refund);
            }
        }
        fields
    }
}

/// Plain decimal notation that round-trips; whole values keep a `.0` suffix.
pub fn format_amount(value: f64) -> String {
    let text = format!("{value}");
    if value.is_finite() && value.fract() == 0.0 {
        format!("{text}.0")
    } else {
        text
    }
}

/// Supplies the investor ledger.
pub trait LedgerSource {
    fn load_ledger(&self) -> Result<Ledger>;
}

/// Consumes the ledger once refunds have been applied.
pub trait LedgerSink {
    fn write_ledger(&self, ledger: &Ledger) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_ledger() -> Ledger {
        Ledger::from_table(
            strings(&[
                "investor",
                "investment_open_date",
                "investment_close_date",
                "amount_invested",
            ]),
            vec![
                strings(&["alice", "2021-03-01", "2021-03-05", "1000"]),
                strings(&["bob", "2021-03-02 00:00:00-05:00", "someday", ""]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_required_columns() {
        let ledger = sample_ledger();
        assert_eq!(ledger.len(), 2);

        let alice = &ledger.records[0];
        assert_eq!(alice.row, 1);
        assert!(alice.open_date.value.is_some());
        assert_eq!(alice.amount_invested, Some(1000.0));

        let bob = &ledger.records[1];
        assert!(bob.open_date.value.is_some());
        assert_eq!(bob.close_date.value, None);
        assert_eq!(bob.amount_invested, None);
    }

    #[test]
    fn output_appends_refund_and_normalizes_dates() {
        let mut ledger = sample_ledger();
        ledger.records[0].amount_refund = Some(1100.0);

        assert_eq!(
            ledger.output_headers(),
            strings(&[
                "investor",
                "investment_open_date",
                "investment_close_date",
                "amount_invested",
                "amount_refund",
            ])
        );
        assert_eq!(
            ledger.output_row(&ledger.records[0]),
            strings(&["alice", "2021-03-01", "2021-03-05", "1000", "1100.0"])
        );
        assert_eq!(
            ledger.output_row(&ledger.records[1]),
            strings(&["bob", "2021-03-02", "someday", "", ""])
        );
    }

    #[test]
    fn existing_refund_column_is_overwritten() {
        let mut ledger = Ledger::from_table(
            strings(&[
                "amount_refund",
                "investment_open_date",
                "investment_close_date",
                "amount_invested",
            ]),
            vec![strings(&["stale", "2021-03-01", "2021-03-02", "10.5"])],
        )
        .unwrap();
        ledger.records[0].amount_refund = Some(11.0);

        assert_eq!(ledger.output_headers().len(), 4);
        assert_eq!(ledger.output_row(&ledger.records[0])[0], "11.0");
    }

    #[test]
    fn missing_column_is_reported() {
        let result = Ledger::from_table(
            strings(&["investment_open_date", "amount_invested"]),
            vec![],
        );
        assert!(matches!(
            result,
            Err(FundError::MissingColumn(c)) if c == CLOSE_DATE_COLUMN
        ));
    }

    #[test]
    fn bad_amount_names_the_row() {
        let result = Ledger::from_table(
            strings(&[
                "investment_open_date",
                "investment_close_date",
                "amount_invested",
            ]),
            vec![
                strings(&["2021-03-01", "2021-03-02", "10"]),
                strings(&["2021-03-01", "2021-03-02", "ten"]),
            ],
        );
        assert!(matches!(
            result,
            Err(FundError::InvalidNumber { row: 2, .. })
        ));
    }

    #[test]
    fn short_rows_are_rejected() {
        let result = Ledger::from_table(
            strings(&[
                "investment_open_date",
                "investment_close_date",
                "amount_invested",
            ]),
            vec![strings(&["2021-03-01", "2021-03-02"])],
        );
        assert!(matches!(result, Err(FundError::ShortRow { row: 1, .. })));
    }

    #[test]
    fn amounts_keep_a_decimal_point() {
        assert_eq!(format_amount(1100.0), "1100.0");
        assert_eq!(format_amount(1234.5678), "1234.5678");
    }

    #[test]
    fn amounts_never_use_exponent_notation() {
        assert_eq!(format_amount(2.5e16), "25000000000000000.0");
        assert_eq!(format_amount(0.00005), "0.00005");
        assert_eq!(format_amount(-3.0), "-3.0");
    }
}
