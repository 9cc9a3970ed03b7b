use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::digest::Digester;
use crate::error::{Error, Result};
use crate::histogram::HistogramCore;
use crate::metadata::Metadata;
use crate::push::Target;
use crate::snapshot::Snapshot;
use crate::value::Value;
use crate::vector::{DEFAULT_COLLECTION_SIZE, Vector};

/// Every kind of metric the registry tracks.
#[derive(Clone)]
pub(crate) enum Metric {
    Counter(Arc<Value>),
    Gauge(Arc<Value>),
    Histogram(Arc<HistogramCore>),
    CounterVector(Arc<Vector<Arc<Value>>>),
    GaugeVector(Arc<Vector<Arc<Value>>>),
    HistogramVector(Arc<Vector<Arc<HistogramCore>>>),
}

impl Metric {
    pub(crate) fn meta(&self) -> &Metadata {
        match self {
            Metric::Counter(v) | Metric::Gauge(v) => v.meta(),
            Metric::Histogram(h) => h.meta(),
            Metric::CounterVector(vec) | Metric::GaugeVector(vec) => vec.meta(),
            Metric::HistogramVector(vec) => vec.meta(),
        }
    }

    fn snapshot_into(&self, snap: &mut Snapshot) {
        match self {
            Metric::Counter(v) => snap.counters.push(v.snapshot()),
            Metric::Gauge(v) => snap.gauges.push(v.snapshot()),
            Metric::Histogram(h) => snap.histograms.push(h.snapshot()),
            Metric::CounterVector(vec) => {
                snap.counters.extend(vec.entries().iter().map(|v| v.snapshot()))
            }
            Metric::GaugeVector(vec) => {
                snap.gauges.extend(vec.entries().iter().map(|v| v.snapshot()))
            }
            Metric::HistogramVector(vec) => {
                snap.histograms.extend(vec.entries().iter().map(|h| h.snapshot()))
            }
        }
    }

    pub(crate) fn push(&self, target: &dyn Target) {
        if self.meta().disable_push() {
            return;
        }
        match self {
            Metric::Counter(v) | Metric::Gauge(v) => v.push(target),
            Metric::Histogram(h) => h.push(target),
            Metric::CounterVector(vec) | Metric::GaugeVector(vec) => {
                for v in vec.entries() {
                    v.push(target);
                }
            }
            Metric::HistogramVector(vec) => {
                for h in vec.entries() {
                    h.push(target);
                }
            }
        }
    }
}

#[derive(Default)]
struct State {
    dims_by_name: HashMap<String, Vec<u8>>,
    ids: HashSet<Vec<u8>>,
    metrics: Vec<Metric>,
}

/// The set of metrics registered under one [`Root`](crate::Root).
#[derive(Default)]
pub(crate) struct Core {
    state: RwLock<State>,
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("metrics", &self.state.read().metrics.len())
            .finish_non_exhaustive()
    }
}

impl Core {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(State {
                dims_by_name: HashMap::with_capacity(DEFAULT_COLLECTION_SIZE),
                ids: HashSet::with_capacity(DEFAULT_COLLECTION_SIZE),
                metrics: Vec::with_capacity(DEFAULT_COLLECTION_SIZE),
            }),
        }
    }

    pub(crate) fn register(&self, metric: Metric) -> Result<()> {
        let meta = metric.meta();
        let mut digester = Digester::new();
        meta.write_id(&mut digester);
        let id = digester.digest();

        let mut state = self.state.write();
        if let Some(dims) = state.dims_by_name.get(meta.name()) {
            if dims.as_slice() != meta.dims() {
                return Err(Error::InconsistentDimensions {
                    name: meta.name().to_string(),
                });
            }
        }
        if state.ids.contains(id) {
            return Err(Error::DuplicateIdentity {
                name: meta.name().to_string(),
            });
        }
        state
            .dims_by_name
            .insert(meta.name().to_string(), meta.dims().to_vec());
        state.ids.insert(id.to_vec());
        state.metrics.push(metric);
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::default();
        for metric in &self.state.read().metrics {
            metric.snapshot_into(&mut snap);
        }
        snap.sort();
        snap
    }

    /// Clones out the registered metrics, in registration order.
    pub(crate) fn metrics(&self) -> Vec<Metric> {
        self.state.read().metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use crate::value::ValueKind;

    fn counter(spec: &Spec) -> Metric {
        let meta = Arc::new(Metadata::new(spec).unwrap());
        Metric::Counter(Arc::new(Value::scalar(meta, ValueKind::Counter)))
    }

    fn vector(spec: &Spec) -> Metric {
        let meta = Arc::new(Metadata::new(spec).unwrap());
        let factory_meta = Arc::clone(&meta);
        Metric::CounterVector(Arc::new(Vector::new(meta, move |tags| {
            Arc::new(Value::new(Arc::clone(&factory_meta), tags, ValueKind::Counter))
        })))
    }

    #[test]
    fn test_duplicate_identity() {
        let core = Core::new();
        let spec = Spec::new("foo", "help").const_tag("a", "1");
        core.register(counter(&spec)).unwrap();
        assert!(matches!(
            core.register(counter(&spec.clone().const_tag("a", "1"))),
            Err(Error::DuplicateIdentity { .. })
        ));
        core.register(counter(&Spec::new("foo", "help").const_tag("a", "2")))
            .unwrap();
    }

    #[test]
    fn test_inconsistent_dimensions() {
        let core = Core::new();
        core.register(counter(&Spec::new("foo", "help").const_tag("a", "1")))
            .unwrap();
        assert!(matches!(
            core.register(counter(&Spec::new("foo", "help").const_tag("b", "1"))),
            Err(Error::InconsistentDimensions { .. })
        ));
        assert!(matches!(
            core.register(vector(&Spec::new("foo", "help").var_tags(["a"]))),
            Err(Error::InconsistentDimensions { .. })
        ));
        assert_eq!(core.metrics().len(), 1);
    }

    #[test]
    fn test_snapshot_is_sorted_and_stable() {
        let core = Core::new();
        let vec = vector(&Spec::new("requests", "help").var_tags(["path"]));
        core.register(counter(&Spec::new("zeta", "help"))).unwrap();
        core.register(vec.clone()).unwrap();
        if let Metric::CounterVector(vec) = &vec {
            vec.get_or_create(&[("path", "/b")]).unwrap().add(2);
            vec.get_or_create(&[("path", "/a")]).unwrap().add(1);
        }

        let snap = core.snapshot();
        let names: Vec<_> = snap
            .counters
            .iter()
            .map(|s| (s.name.as_str(), s.value))
            .collect();
        assert_eq!(names, vec![("requests", 1), ("requests", 2), ("zeta", 0)]);
        assert_eq!(snap, core.snapshot());
    }
}
