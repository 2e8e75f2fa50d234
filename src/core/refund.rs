//! Derives each investor's refund from the fund's cumulative return.
use super::error::FundError;
use super::fund::FundReturnSeries;
use super::ledger::{CLOSE_DATE_COLUMN, InvestorRecord, Ledger, LedgerDate, OPEN_DATE_COLUMN};
use tracing::{debug, info, warn};

/// What to do when a ledger date has no matching fund return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Leave the row's refund unknown and carry on.
    #[default]
    Permissive,
    /// Fail the run on the first miss.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefundSummary {
    pub rows: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Principal over rows with a known amount.
    pub total_invested: f64,
    /// Refunds over resolved rows.
    pub total_refund: f64,
}

/// `amount_invested * (1 + close/100 - open/100)`, unknown if any input is.
pub fn refund_amount(
    amount_invested: Option<f64>,
    cumulative_open: Option<f64>,
    cumulative_close: Option<f64>,
) -> Option<f64> {
    Some(amount_invested? * (1.0 + cumulative_close? / 100.0 - cumulative_open? / 100.0))
}

pub struct RefundCalculator<'a> {
    fund: &'a FundReturnSeries,
    policy: LookupPolicy,
}

impl<'a> RefundCalculator<'a> {
    pub fn new(fund: &'a FundReturnSeries, policy: LookupPolicy) -> Self {
        RefundCalculator { fund, policy }
    }

    fn lookup(
        &self,
        row: usize,
        column: &'static str,
        date: &LedgerDate,
    ) -> Result<Option<f64>, FundError> {
        let cumulative = date.value.and_then(|d| self.fund.cumulative_at(&d));
        if cumulative.is_none() {
            if self.policy == LookupPolicy::Strict {
                return Err(FundError::LookupMiss {
                    row,
                    column,
                    value: date.raw.clone(),
                });
            }
            warn!("Row {row}: no fund return for {column} '{}'", date.raw);
        }
        Ok(cumulative)
    }

    pub fn refund_for(&self, record: &InvestorRecord) -> Result<Option<f64>, FundError> {
        let open = self.lookup(record.row, OPEN_DATE_COLUMN, &record.open_date)?;
        let close = self.lookup(record.row, CLOSE_DATE_COLUMN, &record.close_date)?;
        let refund = refund_amount(record.amount_invested, open, close);
        debug!(
            "Row {}: invested {:?}, cumulative {:?} -> {:?}, refund {:?}",
            record.row, record.amount_invested, open, close, refund
        );
        Ok(refund)
    }

    /// Fills `amount_refund` on every record of the ledger.
    pub fn apply(&self, ledger: &mut Ledger) -> Result<RefundSummary, FundError> {
        let mut summary = RefundSummary {
            rows: ledger.len(),
            ..Default::default()
        };

        for record in &mut ledger.records {
            record.amount_refund = self.refund_for(record)?;
            summary.total_invested += record.amount_invested.unwrap_or(0.0);
            match record.amount_refund {
                Some(refund) => {
                    summary.resolved += 1;
                    summary.total_refund += refund;
                }
                None => summary.unresolved += 1,
            }
        }

        info!(
            "Computed refunds for {} of {} investors",
            summary.resolved, summary.rows
        );
        Ok(summary)
    }
}
