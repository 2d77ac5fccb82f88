//! Pairwise recombination rates between linked loci.
//!
//! Rates are symmetric and defined only for pairs known to be linked. A pair
//! with no entry assorts independently ([`INDEPENDENT_ASSORTMENT`]).

use std::collections::HashMap;
use std::path::Path;

use plumage_core::{PlumageError, Result};
use serde::{Deserialize, Serialize};

/// Recombination fraction of unlinked loci.
pub const INDEPENDENT_ASSORTMENT: f64 = 0.5;

/// One row of a JSON recombination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub a: String,
    pub b: String,
    pub rate: f64,
}

/// Symmetric map from locus pair to recombination fraction in `[0, 0.5]`.
#[derive(Debug, Clone, Default)]
pub struct RecombinationMap {
    rates: HashMap<(String, String), f64>,
}

const BUILTIN_RATES: &str = include_str!("../data/recombination.json");

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl RecombinationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the rate between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is outside `[0, 0.5]` or `a == b`.
    pub fn insert(&mut self, a: &str, b: &str, rate: f64) -> Result<()> {
        if a == b {
            return Err(PlumageError::InvalidInput(format!(
                "recombination rate between '{a}' and itself"
            )));
        }
        if !(0.0..=INDEPENDENT_ASSORTMENT).contains(&rate) {
            return Err(PlumageError::InvalidInput(format!(
                "recombination rate for {a}-{b} must be in [0, 0.5], got {rate}"
            )));
        }
        self.rates.insert(pair_key(a, b), rate);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_rate(mut self, a: &str, b: &str, rate: f64) -> Result<Self> {
        self.insert(a, b, rate)?;
        Ok(self)
    }

    /// Rate between two loci, 0.5 when no linkage is recorded.
    pub fn rate(&self, a: &str, b: &str) -> f64 {
        self.rates
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or(INDEPENDENT_ASSORTMENT)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Parse a JSON array of `{a, b, rate}` rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<RateEntry> = serde_json::from_str(json)
            .map_err(|e| PlumageError::Parse(format!("recombination table: {e}")))?;
        let mut map = Self::new();
        for row in rows {
            map.insert(&row.a, &row.b, row.rate)?;
        }
        Ok(map)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The embedded default rates matching [`LocusRegistry::builtin`](crate::LocusRegistry::builtin).
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RATES)
    }
}
