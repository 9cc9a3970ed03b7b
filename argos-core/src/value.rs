use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

use crate::metadata::{Metadata, TagPairs};
use crate::push::{CounterHandle, GaugeHandle, PushSpec, Target};
use crate::snapshot::SimpleSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Counter,
    Gauge,
}

enum Handle {
    Counter(Box<dyn CounterHandle>),
    Gauge(Box<dyn GaugeHandle>),
}

impl Handle {
    fn set(&mut self, value: i64) {
        match self {
            Handle::Counter(h) => h.set(value),
            Handle::Gauge(h) => h.set(value),
        }
    }
}

/// An atomic cell with its rendered tags. Backs both counters and gauges.
///
/// All atomics are `Relaxed`: each cell is independent, and snapshots make
/// no promise about ordering across cells.
pub(crate) struct Value {
    cell: AtomicI64,
    meta: Arc<Metadata>,
    tags: TagPairs,
    kind: ValueKind,
    // Only the push thread touches this.
    handle: Mutex<Option<Handle>>,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("name", &self.meta.name())
            .field("tags", &self.tags)
            .field("value", &self.load())
            .finish()
    }
}

impl Value {
    pub(crate) fn new(meta: Arc<Metadata>, tags: TagPairs, kind: ValueKind) -> Self {
        Self {
            cell: AtomicI64::new(0),
            meta,
            tags,
            kind,
            handle: Mutex::new(None),
        }
    }

    pub(crate) fn scalar(meta: Arc<Metadata>, kind: ValueKind) -> Self {
        let tags = meta.const_pairs().clone();
        Self::new(meta, tags, kind)
    }

    pub(crate) fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub(crate) fn tags(&self) -> &TagPairs {
        &self.tags
    }

    pub(crate) fn load(&self) -> i64 {
        self.cell.load(Ordering::Relaxed)
    }

    pub(crate) fn add(&self, n: i64) -> i64 {
        self.cell.fetch_add(n, Ordering::Relaxed).wrapping_add(n)
    }

    pub(crate) fn store(&self, n: i64) {
        self.cell.store(n, Ordering::Relaxed)
    }

    pub(crate) fn swap(&self, n: i64) -> i64 {
        self.cell.swap(n, Ordering::Relaxed)
    }

    pub(crate) fn compare_and_swap(&self, old: i64, new: i64) -> bool {
        self.cell
            .compare_exchange(old, new, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn snapshot(&self) -> SimpleSnapshot {
        SimpleSnapshot {
            name: self.meta.name().to_string(),
            tags: self.tags.iter().cloned().collect(),
            value: self.load(),
        }
    }

    /// Sends the current total to the target, creating the target-side
    /// handle on first use.
    pub(crate) fn push(&self, target: &dyn Target) {
        let mut handle = self.handle.lock();
        let handle = handle.get_or_insert_with(|| {
            let spec = PushSpec {
                name: self.meta.name().to_string(),
                tags: self.tags.iter().cloned().collect(),
            };
            match self.kind {
                ValueKind::Counter => Handle::Counter(target.new_counter(spec)),
                ValueKind::Gauge => Handle::Gauge(target.new_gauge(spec)),
            }
        });
        handle.set(self.load());
    }
}
