use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub long: i64,
    pub short: i64,
    pub long_cost_basis: f64,
    pub short_cost_basis: f64,
    pub short_margin_used: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealizedGains {
    pub long: f64,
    pub short: f64,
}

/// Starting cash and (empty) position state handed to the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub margin_requirement: u8,
    pub margin_used: f64,
    pub positions: BTreeMap<String, Position>,
    pub realized_gains: BTreeMap<String, RealizedGains>,
}

impl PortfolioSnapshot {
    pub fn new(cash: f64, margin_requirement: u8, tickers: &[String]) -> Self {
        Self {
            cash,
            margin_requirement,
            margin_used: 0.0,
            positions: tickers
                .iter()
                .map(|t| (t.clone(), Position::default()))
                .collect(),
            realized_gains: tickers
                .iter()
                .map(|t| (t.clone(), RealizedGains::default()))
                .collect(),
        }
    }
}
