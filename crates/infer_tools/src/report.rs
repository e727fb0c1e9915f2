//! Resource usage reports exchanged between backends and the comparison logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Sub};

/// Counts of device primitives keyed by resource kind.
///
/// The vocabulary of kinds is defined by each backend (e.g. `"RAM_HALF"`,
/// `"CPE LT"`). Kinds that were never set read as zero, so reports from the
/// same backend can be combined even when one of them lacks a kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceReport {
    counts: BTreeMap<String, f64>,
}

impl ResourceReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report with every listed kind present at zero.
    pub fn zeroed<'a>(kinds: impl IntoIterator<Item = &'a str>) -> Self {
        kinds.into_iter().map(|k| (k.to_string(), 0.0)).collect()
    }

    /// Returns this report with `kind` set to `count`.
    pub fn with(mut self, kind: impl Into<String>, count: f64) -> Self {
        self.counts.insert(kind.into(), count);
        self
    }

    /// Sets the count of `kind`, replacing any previous value.
    pub fn set(&mut self, kind: impl Into<String>, count: f64) {
        self.counts.insert(kind.into(), count);
    }

    /// Returns the count of `kind`, or zero if the kind is not present.
    pub fn get(&self, kind: &str) -> f64 {
        self.counts.get(kind).copied().unwrap_or(0.0)
    }

    /// Returns true if `kind` is present in the report.
    pub fn contains(&self, kind: &str) -> bool {
        self.counts.contains_key(kind)
    }

    /// Iterates over `(kind, count)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterates over the kinds present in the report.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Number of kinds present.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no kind is present.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Applies `op` to every kind present in either report.
    fn combine(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        let mut counts = self.counts.clone();
        for kind in other.counts.keys() {
            counts.entry(kind.clone()).or_insert(0.0);
        }
        for (kind, value) in counts.iter_mut() {
            *value = op(*value, other.get(kind));
        }
        Self { counts }
    }
}

impl Add for ResourceReport {
    type Output = ResourceReport;

    fn add(self, rhs: ResourceReport) -> ResourceReport {
        self.combine(&rhs, |a, b| a + b)
    }
}

impl Sub for ResourceReport {
    type Output = ResourceReport;

    fn sub(self, rhs: ResourceReport) -> ResourceReport {
        self.combine(&rhs, |a, b| a - b)
    }
}

impl<'a> Add<&'a ResourceReport> for &'a ResourceReport {
    type Output = ResourceReport;

    fn add(self, rhs: &'a ResourceReport) -> ResourceReport {
        self.combine(rhs, |a, b| a + b)
    }
}

impl<'a> Sub<&'a ResourceReport> for &'a ResourceReport {
    type Output = ResourceReport;

    fn sub(self, rhs: &'a ResourceReport) -> ResourceReport {
        self.combine(rhs, |a, b| a - b)
    }
}

impl std::iter::Sum for ResourceReport {
    fn sum<I: Iterator<Item = ResourceReport>>(iter: I) -> Self {
        iter.fold(ResourceReport::new(), |acc, r| acc + r)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ResourceReport {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for ResourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, count) in &self.counts {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{kind}={count}")?;
        }
        Ok(())
    }
}
