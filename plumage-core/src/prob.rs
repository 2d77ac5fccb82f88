//! Insertion-ordered discrete probability distributions.
//!
//! [`ProbabilityMap`] accumulates probability mass per distinct value while
//! remembering the order in which values were first seen. Every enumeration
//! step of the cross engine (Punnett squares, gamete sets, joint offspring
//! outcomes) builds one of these, so merging identical results and stable
//! ordering come for free.

use std::collections::HashMap;
use std::hash::Hash;

/// Tolerance used when checking that a distribution sums to one.
pub const PROB_TOLERANCE: f64 = 1e-9;

/// Whether two probabilities are equal within `tol`.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// A finite distribution over values of `T` with first-seen ordering.
#[derive(Debug, Clone)]
pub struct ProbabilityMap<T> {
    entries: Vec<(T, f64)>,
    index: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> ProbabilityMap<T> {
    /// Create an empty distribution.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A distribution that puts all mass on a single value.
    pub fn certain(value: T) -> Self {
        let mut map = Self::new();
        map.add(value, 1.0);
        map
    }

    /// Add `probability` to `value`, merging with an existing entry.
    pub fn add(&mut self, value: T, probability: f64) {
        match self.index.get(&value) {
            Some(&i) => self.entries[i].1 += probability,
            None => {
                self.index.insert(value.clone(), self.entries.len());
                self.entries.push((value, probability));
            }
        }
    }

    /// Probability assigned to `value`, if present.
    pub fn get(&self, value: &T) -> Option<f64> {
        self.index.get(value).map(|&i| self.entries[i].1)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no value carries mass.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(value, probability)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.entries.iter().map(|(v, p)| (v, *p))
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Rescale so the probabilities sum to exactly one.
    ///
    /// A distribution with zero total mass is left unchanged.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total > 0.0 {
            for (_, p) in &mut self.entries {
                *p /= total;
            }
        }
    }

    /// Drop entries whose probability is below `threshold`.
    ///
    /// Returns the discarded mass. Order of the kept entries is preserved.
    pub fn prune(&mut self, threshold: f64) -> f64 {
        let before = self.total();
        self.entries.retain(|(_, p)| *p >= threshold);
        self.reindex();
        before - self.total()
    }

    /// Stable sort by descending probability.
    pub fn sort_descending(&mut self) {
        self.entries
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(core::cmp::Ordering::Equal));
        self.reindex();
    }

    /// Consume into `(value, probability)` pairs in current order.
    pub fn into_vec(self) -> Vec<(T, f64)> {
        self.entries
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, (v, _)) in self.entries.iter().enumerate() {
            self.index.insert(v.clone(), i);
        }
    }
}

impl<T: Eq + Hash + Clone> Default for ProbabilityMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<(T, f64)> for ProbabilityMap<T> {
    fn from_iter<I: IntoIterator<Item = (T, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (v, p) in iter {
            map.add(v, p);
        }
        map
    }
}

impl<T: Eq + Hash + Clone> IntoIterator for ProbabilityMap<T> {
    type Item = (T, f64);
    type IntoIter = std::vec::IntoIter<(T, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
