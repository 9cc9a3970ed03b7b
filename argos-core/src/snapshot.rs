use std::time::Duration;

use crate::spec::Tags;

/// The current value of a counter or gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSnapshot {
    pub name: String,
    pub tags: Tags,
    pub value: i64,
}

/// The observations recorded by a histogram, flattened: each bucket's upper
/// bound appears once per observation in that bucket, and observations past
/// the last bound appear as `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSnapshot {
    pub name: String,
    pub tags: Tags,
    pub unit: Duration,
    pub values: Vec<i64>,
}

/// A point-in-time view of every registered metric, sorted by name and then
/// tags. Intended for tests; production code should export through
/// [`Root::gather`](crate::Root::gather) or a push target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub counters: Vec<SimpleSnapshot>,
    pub gauges: Vec<SimpleSnapshot>,
    pub histograms: Vec<HistogramSnapshot>,
}

impl Snapshot {
    pub(crate) fn sort(&mut self) {
        self.counters
            .sort_by(|a, b| (&a.name, &a.tags).cmp(&(&b.name, &b.tags)));
        self.gauges
            .sort_by(|a, b| (&a.name, &a.tags).cmp(&(&b.name, &b.tags)));
        self.histograms
            .sort_by(|a, b| (&a.name, &a.tags).cmp(&(&b.name, &b.tags)));
    }

    /// The counter with exactly this name and tags, if any.
    pub fn counter(&self, name: &str, tags: &Tags) -> Option<&SimpleSnapshot> {
        self.counters
            .iter()
            .find(|s| s.name == name && &s.tags == tags)
    }

    pub fn gauge(&self, name: &str, tags: &Tags) -> Option<&SimpleSnapshot> {
        self.gauges.iter().find(|s| s.name == name && &s.tags == tags)
    }

    pub fn histogram(&self, name: &str, tags: &Tags) -> Option<&HistogramSnapshot> {
        self.histograms
            .iter()
            .find(|s| s.name == name && &s.tags == tags)
    }
}
