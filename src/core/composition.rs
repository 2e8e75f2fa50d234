//! Fixed-weight fund composition.

use super::error::FundError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub weight: f64,
}

impl Holding {
    pub fn new(symbol: &str, weight: f64) -> Self {
        Holding {
            symbol: symbol.to_string(),
            weight,
        }
    }
}

/// An immutable symbol to weight table, kept in the order it was declared.
///
/// Weights are not required to sum to 1.0; a fund holding cash or a
/// leveraged basket are both representable.
#[derive(Debug, Clone, PartialEq)]
pub struct FundComposition {
    holdings: Vec<Holding>,
}

impl FundComposition {
    pub fn new(holdings: Vec<Holding>) -> Result<Self, FundError> {
        if holdings.is_empty() {
            return Err(FundError::InvalidComposition(
                "at least one holding is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for holding in &holdings {
            if holding.symbol.trim().is_empty() {
                return Err(FundError::InvalidComposition(
                    "holding symbol cannot be empty".to_string(),
                ));
            }
            if !holding.weight.is_finite() {
                return Err(FundError::InvalidComposition(format!(
                    "weight for {} is not a finite number",
                    holding.symbol
                )));
            }
            if !seen.insert(holding.symbol.as_str()) {
                return Err(FundError::InvalidComposition(format!(
                    "duplicate holding {}",
                    holding.symbol
                )));
            }
        }

        let composition = FundComposition { holdings };
        let total = composition.total_weight();
        if (total - 1.0).abs() > 1e-9 {
            debug!("Fund weights sum to {total}, not 1.0");
        }
        Ok(composition)
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// The six-stock basket the refund ledger was originally priced against.
pub(crate) fn default_holdings() -> Vec<Holding> {
    vec![
        Holding::new("META", 0.15),
        Holding::new("NFLX", 0.10),
        Holding::new("AAPL", 0.25),
        Holding::new("TSLA", 0.15),
        Holding::new("GOOGL", 0.20),
        Holding::new("AMZN", 0.15),
    ]
}
