//! Core business logic abstractions

pub mod composition;
pub mod config;
pub mod error;
pub mod fund;
pub mod ledger;
pub mod log;
pub mod price;
pub mod refund;

// Re-export main types for cleaner imports
pub use composition::{FundComposition, Holding};
pub use error::FundError;
pub use fund::{DailyFundReturn, FundAggregator, FundReturnSeries};
pub use ledger::{InvestorRecord, Ledger, LedgerSink, LedgerSource};
pub use price::{PriceSource, RawPrice, SymbolSeries};
pub use refund::{LookupPolicy, RefundCalculator, RefundSummary};
