use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::metadata::{Metadata, TagPairs};
use crate::push::{HistogramHandle, HistogramKind, HistogramPushSpec, PushSpec, Target};
use crate::snapshot::HistogramSnapshot;
use crate::spec::TagValues;
use crate::vector::{Vector, with_tag_pairs};

/// Bucket layout shared by every histogram in a vector.
#[derive(Debug)]
pub(crate) struct Layout {
    unit: Duration,
    kind: HistogramKind,
    /// Declared upper bounds followed by the `i64::MAX` catch-all.
    bounds: Box<[i64]>,
}

impl Layout {
    pub(crate) fn new(unit: Duration, kind: HistogramKind, declared: &[i64]) -> Self {
        let mut bounds = declared.to_vec();
        if bounds.last() != Some(&i64::MAX) {
            bounds.push(i64::MAX);
        }
        Self {
            unit,
            kind,
            bounds: bounds.into_boxed_slice(),
        }
    }

    /// Index of the first bucket whose bound is at least `n`. The catch-all
    /// bound guarantees one exists.
    fn locate(&self, n: i64) -> usize {
        self.bounds.partition_point(|&bound| bound < n)
    }

    fn scale(&self, d: Duration) -> i64 {
        let scaled = d.as_nanos() / self.unit.as_nanos();
        i64::try_from(scaled).unwrap_or(i64::MAX)
    }

    /// Bucket bounds as reported to push targets.
    fn push_bounds(&self) -> Vec<i64> {
        match self.kind {
            HistogramKind::Value => self.bounds.to_vec(),
            HistogramKind::Duration => {
                let nanos = i64::try_from(self.unit.as_nanos()).unwrap_or(i64::MAX);
                self.bounds
                    .iter()
                    .map(|&b| if b == i64::MAX { b } else { b.saturating_mul(nanos) })
                    .collect()
            }
        }
    }
}

/// Cumulative, Prometheus-shaped read of a histogram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CumulativeView {
    /// `(upper bound, observations at or below it)` for declared buckets.
    pub(crate) buckets: Vec<(i64, u64)>,
    pub(crate) count: u64,
    pub(crate) sum: i64,
}

pub(crate) struct HistogramCore {
    meta: Arc<Metadata>,
    tags: TagPairs,
    layout: Arc<Layout>,
    // Not cumulative: each slot counts only its own bucket.
    counts: Box<[AtomicU64]>,
    sum: AtomicI64,
    handle: Mutex<Option<(Box<dyn HistogramHandle>, Vec<i64>)>>,
}

impl fmt::Debug for HistogramCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramCore")
            .field("name", &self.meta.name())
            .field("tags", &self.tags)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl HistogramCore {
    pub(crate) fn new(meta: Arc<Metadata>, tags: TagPairs, layout: Arc<Layout>) -> Self {
        let counts = layout.bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            meta,
            tags,
            layout,
            counts,
            sum: AtomicI64::new(0),
            handle: Mutex::new(None),
        }
    }

    pub(crate) fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub(crate) fn tags(&self) -> &TagPairs {
        &self.tags
    }

    pub(crate) fn observe_int(&self, n: i64) {
        let idx = self.layout.locate(n);
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(n, Ordering::Relaxed);
    }

    fn inc_bucket(&self, bound: i64) -> bool {
        let Ok(idx) = self.layout.bounds.binary_search(&bound) else {
            return false;
        };
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        // The catch-all has no meaningful value to add to the sum.
        if bound != i64::MAX {
            self.sum.fetch_add(bound, Ordering::Relaxed);
        }
        true
    }

    fn load_counts(&self) -> Vec<u64> {
        self.counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    pub(crate) fn cumulative(&self) -> CumulativeView {
        let counts = self.load_counts();
        let declared = self.layout.bounds.len() - 1;
        let mut total = 0;
        let mut buckets = Vec::with_capacity(declared);
        for (i, (&bound, &count)) in self.layout.bounds.iter().zip(&counts).enumerate() {
            total += count;
            if i < declared {
                buckets.push((bound, total));
            }
        }
        CumulativeView {
            buckets,
            count: total,
            sum: self.sum.load(Ordering::Relaxed),
        }
    }

    /// Each bucket's bound, repeated once per observation in that bucket.
    pub(crate) fn observations(&self) -> Vec<i64> {
        let counts = self.load_counts();
        let mut values = Vec::new();
        for (&bound, &count) in self.layout.bounds.iter().zip(&counts) {
            values.extend(std::iter::repeat_n(bound, count as usize));
        }
        values
    }

    pub(crate) fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            name: self.meta.name().to_string(),
            tags: self.tags.iter().cloned().collect(),
            unit: self.layout.unit,
            values: self.observations(),
        }
    }

    pub(crate) fn push(&self, target: &dyn Target) {
        let mut handle = self.handle.lock();
        let (handle, bounds) = handle.get_or_insert_with(|| {
            let bounds = self.layout.push_bounds();
            let spec = HistogramPushSpec {
                spec: PushSpec {
                    name: self.meta.name().to_string(),
                    tags: self.tags.iter().cloned().collect(),
                },
                buckets: bounds.clone(),
                kind: self.layout.kind,
            };
            (target.new_histogram(spec), bounds)
        });
        for (&bound, count) in bounds.iter().zip(self.load_counts()) {
            handle.set(bound, i64::try_from(count).unwrap_or(i64::MAX));
        }
    }
}

/// Approximates a distribution of values with fixed buckets. All its
/// methods are safe to use concurrently.
///
/// Histograms handed out by a no-op [`Scope`](crate::Scope) drop every
/// observation.
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    core: Option<Arc<HistogramCore>>,
}

impl Histogram {
    pub(crate) fn new(meta: Arc<Metadata>, layout: Layout) -> (Self, Arc<HistogramCore>) {
        let tags = meta.const_pairs().clone();
        let core = Arc::new(HistogramCore::new(meta, tags, Arc::new(layout)));
        (Self::from_core(Arc::clone(&core)), core)
    }

    fn from_core(core: Arc<HistogramCore>) -> Self {
        Self { core: Some(core) }
    }

    pub fn nop() -> Self {
        Self::default()
    }

    /// Converts the duration to the histogram's unit, then records it.
    pub fn observe(&self, d: Duration) {
        if let Some(core) = &self.core {
            core.observe_int(core.layout.scale(d));
        }
    }

    /// Records a value that's already expressed in the histogram's unit.
    pub fn observe_int(&self, n: i64) {
        if let Some(core) = &self.core {
            core.observe_int(n);
        }
    }

    /// Counts one observation in the bucket whose upper bound is exactly
    /// `bound`, for callers that have already picked a bucket. Returns false,
    /// recording nothing, if no bucket has that bound.
    pub fn inc_bucket(&self, bound: i64) -> bool {
        self.core.as_ref().is_some_and(|core| core.inc_bucket(bound))
    }
}

/// A collection of [`Histogram`]s sharing a name, constant tags, and bucket
/// layout, told apart by a fixed, ordered set of variable tags.
#[derive(Clone, Debug, Default)]
pub struct HistogramVector {
    vector: Option<Arc<Vector<Arc<HistogramCore>>>>,
}

impl HistogramVector {
    pub(crate) fn new(
        meta: Arc<Metadata>,
        layout: Layout,
    ) -> (Self, Arc<Vector<Arc<HistogramCore>>>) {
        let layout = Arc::new(layout);
        let factory_meta = Arc::clone(&meta);
        let vector = Arc::new(Vector::new(meta, move |tags| {
            Arc::new(HistogramCore::new(
                Arc::clone(&factory_meta),
                tags,
                Arc::clone(&layout),
            ))
        }));
        (
            Self {
                vector: Some(Arc::clone(&vector)),
            },
            vector,
        )
    }

    pub fn nop() -> Self {
        Self::default()
    }

    /// Retrieves the histogram for the supplied `(tag name, tag value)`
    /// pairs, creating it if necessary. Pairs must follow the declared order.
    pub fn get(&self, pairs: &[(&str, &str)]) -> Result<Histogram> {
        match &self.vector {
            None => Ok(Histogram::nop()),
            Some(vec) => vec.get_or_create(pairs).map(Histogram::from_core),
        }
    }

    /// Like [`get`](Self::get), but panics on a wrong tag count or order.
    pub fn must_get(&self, pairs: &[(&str, &str)]) -> Histogram {
        match self.get(pairs) {
            Ok(h) => h,
            Err(err) => panic!("failed to get histogram: {err}"),
        }
    }

    pub fn get_tagged<T: TagValues>(&self, tags: &T) -> Result<Histogram> {
        with_tag_pairs(tags, |pairs| self.get(pairs))
    }

    pub fn must_get_tagged<T: TagValues>(&self, tags: &T) -> Histogram {
        with_tag_pairs(tags, |pairs| self.must_get(pairs))
    }
}
