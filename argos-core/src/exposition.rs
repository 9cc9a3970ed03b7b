use std::collections::BTreeMap;

use prometheus::proto::{self, MetricType};
use tracing::warn;

use crate::histogram::HistogramCore;
use crate::metadata::TagPairs;
use crate::registry::{Core, Metric};
use crate::value::Value;

struct Family {
    help: String,
    kind: MetricType,
    samples: Vec<(TagPairs, proto::Metric)>,
}

impl Family {
    fn into_proto(mut self, name: String) -> proto::MetricFamily {
        self.samples.sort_by(|a, b| a.0.cmp(&b.0));
        let mut family = proto::MetricFamily::default();
        family.set_name(name);
        family.set_help(self.help);
        family.set_field_type(self.kind);
        for (_, metric) in self.samples {
            family.mut_metric().push(metric);
        }
        family
    }
}

fn kind_of(metric: &Metric) -> MetricType {
    match metric {
        Metric::Counter(_) | Metric::CounterVector(_) => MetricType::COUNTER,
        Metric::Gauge(_) | Metric::GaugeVector(_) => MetricType::GAUGE,
        Metric::Histogram(_) | Metric::HistogramVector(_) => MetricType::HISTOGRAM,
    }
}

fn labels(tags: &TagPairs) -> proto::Metric {
    let mut metric = proto::Metric::default();
    for (name, value) in tags {
        let mut pair = proto::LabelPair::default();
        pair.set_name(name.clone());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }
    metric
}

fn counter(value: &Value) -> (TagPairs, proto::Metric) {
    let mut metric = labels(value.tags());
    let mut counter = proto::Counter::default();
    counter.set_value(value.load() as f64);
    metric.set_counter(counter);
    (value.tags().clone(), metric)
}

fn gauge(value: &Value) -> (TagPairs, proto::Metric) {
    let mut metric = labels(value.tags());
    let mut gauge = proto::Gauge::default();
    gauge.set_value(value.load() as f64);
    metric.set_gauge(gauge);
    (value.tags().clone(), metric)
}

fn histogram(core: &HistogramCore) -> (TagPairs, proto::Metric) {
    let view = core.cumulative();
    let mut metric = labels(core.tags());
    let mut histogram = proto::Histogram::default();
    histogram.set_sample_count(view.count);
    histogram.set_sample_sum(view.sum as f64);
    for (bound, count) in view.buckets {
        let mut bucket = proto::Bucket::default();
        bucket.set_upper_bound(bound as f64);
        bucket.set_cumulative_count(count);
        histogram.mut_bucket().push(bucket);
    }
    metric.set_histogram(histogram);
    (core.tags().clone(), metric)
}

fn samples(metric: &Metric) -> Vec<(TagPairs, proto::Metric)> {
    match metric {
        Metric::Counter(v) => vec![counter(v)],
        Metric::Gauge(v) => vec![gauge(v)],
        Metric::Histogram(h) => vec![histogram(h)],
        Metric::CounterVector(vec) => vec.entries().iter().map(|v| counter(v)).collect(),
        Metric::GaugeVector(vec) => vec.entries().iter().map(|v| gauge(v)).collect(),
        Metric::HistogramVector(vec) => vec.entries().iter().map(|h| histogram(h)).collect(),
    }
}

impl Core {
    /// Converts every registered metric into Prometheus metric families,
    /// one per name, sorted by name with samples sorted by labels.
    pub(crate) fn gather(&self) -> Vec<proto::MetricFamily> {
        let mut families: BTreeMap<String, Family> = BTreeMap::new();
        for metric in self.metrics() {
            let meta = metric.meta();
            let kind = kind_of(&metric);
            let entries = samples(&metric);
            if entries.is_empty() {
                continue;
            }
            let family = families
                .entry(meta.name().to_string())
                .or_insert_with(|| Family {
                    help: meta.help().to_string(),
                    kind,
                    samples: Vec::new(),
                });
            if family.kind != kind {
                warn!(
                    metric = meta.name(),
                    "dropping metric whose type conflicts with an earlier metric of the same name"
                );
                continue;
            }
            family.samples.extend(entries);
        }
        families
            .into_iter()
            .map(|(name, family)| family.into_proto(name))
            .collect()
    }
}
