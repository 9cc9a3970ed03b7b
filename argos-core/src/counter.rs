use std::sync::Arc;

use crate::error::Result;
use crate::metadata::Metadata;
use crate::spec::TagValues;
use crate::value::{Value, ValueKind};
use crate::vector::{Vector, with_tag_pairs};

/// A monotonically increasing value, like a car's odometer. All its methods
/// are safe to use concurrently.
///
/// Counters handed out by a no-op [`Scope`](crate::Scope) ignore every
/// update and always read zero.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    value: Option<Arc<Value>>,
}

impl Counter {
    pub(crate) fn new(meta: Arc<Metadata>) -> (Self, Arc<Value>) {
        let value = Arc::new(Value::scalar(meta, ValueKind::Counter));
        (Self::from_value(Arc::clone(&value)), value)
    }

    fn from_value(value: Arc<Value>) -> Self {
        Self { value: Some(value) }
    }

    /// A counter that discards all updates.
    pub fn nop() -> Self {
        Self::default()
    }

    /// Increases the counter and returns the new value. Counters never go
    /// down, so a non-positive `n` just returns the current value.
    pub fn add(&self, n: i64) -> i64 {
        match &self.value {
            None => 0,
            Some(v) if n <= 0 => v.load(),
            Some(v) => v.add(n),
        }
    }

    pub fn inc(&self) -> i64 {
        self.add(1)
    }

    pub fn load(&self) -> i64 {
        self.value.as_ref().map_or(0, |v| v.load())
    }
}

/// A collection of [`Counter`]s sharing a name and constant tags, told apart
/// by a fixed, ordered set of variable tags.
///
/// A no-op vector hands out no-op counters.
#[derive(Clone, Debug, Default)]
pub struct CounterVector {
    vector: Option<Arc<Vector<Arc<Value>>>>,
}

impl CounterVector {
    pub(crate) fn new(meta: Arc<Metadata>) -> (Self, Arc<Vector<Arc<Value>>>) {
        let factory_meta = Arc::clone(&meta);
        let vector = Arc::new(Vector::new(meta, move |tags| {
            Arc::new(Value::new(
                Arc::clone(&factory_meta),
                tags,
                ValueKind::Counter,
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

    /// Retrieves the counter for the supplied `(tag name, tag value)` pairs,
    /// creating it if necessary. Pairs must follow the order used when the
    /// vector was declared.
    pub fn get(&self, pairs: &[(&str, &str)]) -> Result<Counter> {
        match &self.vector {
            None => Ok(Counter::nop()),
            Some(vec) => vec.get_or_create(pairs).map(Counter::from_value),
        }
    }

    /// Like [`get`](Self::get), but panics on a wrong tag count or order.
    /// Only use it where the tag names are fixed and covered by tests.
    pub fn must_get(&self, pairs: &[(&str, &str)]) -> Counter {
        match self.get(pairs) {
            Ok(c) => c,
            Err(err) => panic!("failed to get counter: {err}"),
        }
    }

    pub fn get_tagged<T: TagValues>(&self, tags: &T) -> Result<Counter> {
        with_tag_pairs(tags, |pairs| self.get(pairs))
    }

    pub fn must_get_tagged<T: TagValues>(&self, tags: &T) -> Counter {
        with_tag_pairs(tags, |pairs| self.must_get(pairs))
    }
}
