//! Aggregates per-symbol closes into the fund's daily and cumulative returns.
use super::composition::FundComposition;
use super::error::FundError;
use super::price::{PriceSource, SymbolSeries};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One symbol's weighted percent move on a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub date: NaiveDateTime,
    pub symbol: String,
    /// `None` when there is no usable previous close, such as on a symbol's first day.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyFundReturn {
    pub date: NaiveDateTime,
    /// Weighted sum of the known contributions on this date.
    pub percent_return: Option<f64>,
    /// Running total of `percent_return` up to and including this date.
    pub cumulative_return: f64,
}

/// Daily fund returns in ascending date order, one entry per date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FundReturnSeries {
    days: Vec<DailyFundReturn>,
}

impl FundReturnSeries {
    pub fn days(&self) -> &[DailyFundReturn] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Cumulative return at exactly `date`, including its time of day.
    pub fn cumulative_at(&self, date: &NaiveDateTime) -> Option<f64> {
        self.days
            .binary_search_by_key(date, |d| d.date)
            .ok()
            .map(|i| self.days[i].cumulative_return)
    }
}

/// Simple percent return between two closes, scaled by the holding weight.
pub fn contribution(close: Option<f64>, last_close: Option<f64>, weight: f64) -> Option<f64> {
    match (close, last_close) {
        (Some(close), Some(last)) => {
            Some((close - last) / last * 100.0 * weight).filter(|v| v.is_finite())
        }
        _ => None,
    }
}

pub struct FundAggregator {
    composition: FundComposition,
}

impl FundAggregator {
    pub fn new(composition: FundComposition) -> Self {
        FundAggregator { composition }
    }

    pub fn composition(&self) -> &FundComposition {
        &self.composition
    }

    /// Loads every holding from `source` and aggregates the fund series.
    ///
    /// `update_callback` is invoked once per loaded symbol.
    pub fn load_and_aggregate(
        &self,
        source: &dyn PriceSource,
        update_callback: &dyn Fn(&str),
    ) -> Result<FundReturnSeries> {
        let mut series = Vec::with_capacity(self.composition.len());
        for holding in self.composition.holdings() {
            let rows = source
                .load_prices(&holding.symbol)
                .with_context(|| format!("Failed to load prices for {}", holding.symbol))?;
            let symbol_series = SymbolSeries::from_raw(&holding.symbol, &rows)
                .with_context(|| format!("Failed to parse prices for {}", holding.symbol))?;
            debug!(
                "Loaded {} closes for {}",
                symbol_series.len(),
                holding.symbol
            );
            series.push(symbol_series);
            update_callback(&holding.symbol);
        }

        let fund = self.aggregate(&series)?;
        info!(
            "Aggregated {} fund days across {} holdings",
            fund.len(),
            self.composition.len()
        );
        Ok(fund)
    }

    /// Computes each record's weighted contribution, one per record.
    ///
    /// Every holding must have a series; series for symbols outside the
    /// composition are ignored.
    pub fn contributions(&self, series: &[SymbolSeries]) -> Result<Vec<Contribution>, FundError> {
        let mut contributions = Vec::new();
        for holding in self.composition.holdings() {
            let symbol_series = series
                .iter()
                .find(|s| s.symbol == holding.symbol)
                .ok_or_else(|| FundError::MissingSeries(holding.symbol.clone()))?;

            let mut last_close = None;
            for record in &symbol_series.records {
                contributions.push(Contribution {
                    date: record.date,
                    symbol: holding.symbol.clone(),
                    value: contribution(record.close, last_close, holding.weight),
                });
                last_close = record.close;
            }
        }
        Ok(contributions)
    }

    /// Groups contributions by date and folds them into a cumulative series.
    pub fn aggregate(&self, series: &[SymbolSeries]) -> Result<FundReturnSeries, FundError> {
        let contributions = self.contributions(series)?;

        let mut by_date: BTreeMap<NaiveDateTime, Option<f64>> = BTreeMap::new();
        for c in &contributions {
            let day = by_date.entry(c.date).or_insert(None);
            if let Some(value) = c.value {
                *day = Some(day.unwrap_or(0.0) + value);
            }
        }

        let days = by_date
            .into_iter()
            .scan(0.0, |cumulative, (date, percent_return)| {
                *cumulative += percent_return.unwrap_or(0.0);
                Some(DailyFundReturn {
                    date,
                    percent_return,
                    cumulative_return: *cumulative,
                })
            })
            .collect();

        Ok(FundReturnSeries { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::composition::Holding;
    use crate::core::price::{PriceRecord, RawPrice};
    use anyhow::anyhow;
    use chrono::{Duration, NaiveDate};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(n)
    }

    fn series(symbol: &str, closes: &[f64]) -> SymbolSeries {
        SymbolSeries {
            symbol: symbol.to_string(),
            records: closes
                .iter()
                .enumerate()
                .map(|(i, c)| PriceRecord {
                    date: day(i as i64),
                    close: Some(*c),
                })
                .collect(),
        }
    }

    fn aggregator(holdings: &[(&str, f64)]) -> FundAggregator {
        let holdings = holdings.iter().map(|(s, w)| Holding::new(s, *w)).collect();
        FundAggregator::new(FundComposition::new(holdings).unwrap())
    }

    #[test]
    fn first_record_of_each_symbol_has_no_contribution() {
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);
        let input = vec![series("A", &[10.0, 11.0, 12.0]), series("B", &[5.0, 5.5])];
        let contributions = agg.contributions(&input).unwrap();

        let for_symbol = |s: &str| -> Vec<Option<f64>> {
            contributions
                .iter()
                .filter(|c| c.symbol == s)
                .map(|c| c.value)
                .collect()
        };
        let a = for_symbol("A");
        let b = for_symbol("B");
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
        assert_eq!(a[0], None);
        assert_eq!(b[0], None);
        assert!(a[1..].iter().all(|v| v.is_some()));
        assert!(b[1..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn weighted_sum_on_shared_date() {
        // A +2%, B +4%, both weighted 0.5 => 3.0
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);
        let input = vec![series("A", &[100.0, 102.0]), series("B", &[50.0, 52.0])];
        let fund = agg.aggregate(&input).unwrap();

        assert_eq!(fund.len(), 2);
        assert_eq!(fund.days()[0].percent_return, None);
        let pct = fund.days()[1].percent_return.unwrap();
        assert!((pct - 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_holding_end_to_end() {
        let agg = aggregator(&[("X", 1.0)]);
        let fund = agg.aggregate(&[series("X", &[100.0, 110.0])]).unwrap();

        assert_eq!(fund.cumulative_at(&day(0)), Some(0.0));
        let day2 = fund.cumulative_at(&day(1)).unwrap();
        assert!((day2 - 10.0).abs() < 1e-12);
        assert_eq!(fund.cumulative_at(&day(5)), None);
    }

    #[test]
    fn cumulative_is_prefix_sum_of_daily_returns() {
        let agg = aggregator(&[("A", 0.6), ("B", 0.4)]);
        let input = vec![
            series("A", &[10.0, 10.5, 10.2, 10.9, 11.3]),
            series("B", &[20.0, 19.0, 19.5, 21.0, 20.1]),
        ];
        let fund = agg.aggregate(&input).unwrap();

        let mut expected = 0.0;
        for d in fund.days() {
            expected += d.percent_return.unwrap_or(0.0);
            assert!((d.cumulative_return - expected).abs() < 1e-12);
        }
        assert!(fund.days().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn out_of_order_symbols_produce_sorted_dates() {
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);
        let mut late = series("B", &[20.0, 21.0, 22.0]);
        for r in &mut late.records {
            r.date += Duration::days(2);
        }
        // B listed first but its dates are later than A's.
        let input = vec![late, series("A", &[10.0, 11.0, 12.0])];
        let fund = agg.aggregate(&input).unwrap();

        let dates: Vec<_> = fund.days().iter().map(|d| d.date).collect();
        assert_eq!(dates, (0..5).map(day).collect::<Vec<_>>());
        // Day 2 holds A's weighted move and B's first (unknown) record.
        let pct = fund.days()[2].percent_return.unwrap();
        assert!((pct - (12.0 - 11.0) / 11.0 * 100.0 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_dates_keep_partial_sum() {
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);
        let input = vec![series("A", &[100.0, 110.0, 121.0]), series("B", &[50.0, 55.0])];
        let fund = agg.aggregate(&input).unwrap();

        // Only A trades on the last date; no rescaling for the missing B.
        let last = fund.days()[2].percent_return.unwrap();
        assert!((last - 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_close_is_unknown_not_zero() {
        let agg = aggregator(&[("A", 1.0)]);
        let mut input = series("A", &[100.0, 0.0, 120.0, 132.0]);
        input.records[1].close = None;
        let fund = agg.aggregate(&[input]).unwrap();

        assert_eq!(fund.days()[1].percent_return, None);
        // The close after a gap has no previous close either.
        assert_eq!(fund.days()[2].percent_return, None);
        let pct = fund.days()[3].percent_return.unwrap();
        assert!((pct - 10.0).abs() < 1e-12);
        assert!((fund.days()[3].cumulative_return - 10.0).abs() < 1e-12);
    }

    #[test]
    fn zero_previous_close_yields_unknown() {
        assert_eq!(contribution(Some(10.0), Some(0.0), 1.0), None);
        assert_eq!(contribution(Some(10.0), None, 1.0), None);
        assert_eq!(contribution(None, Some(10.0), 1.0), None);
        let half = contribution(Some(11.0), Some(10.0), 0.5).unwrap();
        assert!((half - 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_holding_series_is_an_error() {
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);
        let result = agg.aggregate(&[series("A", &[1.0, 2.0])]);
        assert!(matches!(result, Err(FundError::MissingSeries(_))));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let agg = aggregator(&[("A", 0.3), ("B", 0.7)]);
        let input = vec![
            series("A", &[10.0, 10.5, 10.2]),
            series("B", &[20.0, 19.0, 19.5]),
        ];
        assert_eq!(agg.aggregate(&input).unwrap(), agg.aggregate(&input).unwrap());
    }

    struct MockPriceSource {
        rows: HashMap<String, Vec<RawPrice>>,
    }

    impl PriceSource for MockPriceSource {
        fn load_prices(&self, symbol: &str) -> Result<Vec<RawPrice>> {
            self.rows
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow!("No prices for {symbol}"))
        }
    }

    #[test]
    fn loads_every_holding_from_source() {
        let mut rows = HashMap::new();
        rows.insert(
            "A".to_string(),
            vec![
                RawPrice::new("2021-03-02 00:00:00-05:00", Some(110.0)),
                RawPrice::new("2021-03-01 00:00:00-05:00", Some(100.0)),
            ],
        );
        rows.insert(
            "B".to_string(),
            vec![
                RawPrice::new("2021-03-01 00:00:00-05:00", Some(10.0)),
                RawPrice::new("2021-03-02 00:00:00-05:00", Some(10.0)),
            ],
        );
        let source = MockPriceSource { rows };
        let loaded = RefCell::new(Vec::new());
        let agg = aggregator(&[("A", 0.5), ("B", 0.5)]);

        let fund = agg
            .load_and_aggregate(&source, &|s| loaded.borrow_mut().push(s.to_string()))
            .unwrap();

        assert_eq!(*loaded.borrow(), vec!["A".to_string(), "B".to_string()]);
        let dates: Vec<_> = fund.days().iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(0), day(1)]);
        assert!((fund.days()[1].cumulative_return - 5.0).abs() < 1e-12);
    }

    #[test]
    fn source_errors_name_the_symbol() {
        let source = MockPriceSource {
            rows: HashMap::new(),
        };
        let agg = aggregator(&[("A", 1.0)]);
        let err = agg.load_and_aggregate(&source, &|_| ()).unwrap_err();
        assert!(err.to_string().contains("Failed to load prices for A"));
    }
}
