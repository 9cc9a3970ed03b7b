use std::sync::Arc;

use crate::error::Result;
use crate::metadata::Metadata;
use crate::spec::TagValues;
use crate::value::{Value, ValueKind};
use crate::vector::{Vector, with_tag_pairs};

/// A point-in-time measurement, like a car's speedometer. All its methods
/// are safe to use concurrently.
///
/// Gauges handed out by a no-op [`Scope`](crate::Scope) ignore every update,
/// read zero, and never win a compare-and-swap.
#[derive(Clone, Debug, Default)]
pub struct Gauge {
    value: Option<Arc<Value>>,
}

impl Gauge {
    pub(crate) fn new(meta: Arc<Metadata>) -> (Self, Arc<Value>) {
        let value = Arc::new(Value::scalar(meta, ValueKind::Gauge));
        (Self::from_value(Arc::clone(&value)), value)
    }

    fn from_value(value: Arc<Value>) -> Self {
        Self { value: Some(value) }
    }

    pub fn nop() -> Self {
        Self::default()
    }

    /// Adds `n` (which may be negative) and returns the new value.
    pub fn add(&self, n: i64) -> i64 {
        self.value.as_ref().map_or(0, |v| v.add(n))
    }

    /// Subtracts `n` and returns the new value.
    pub fn sub(&self, n: i64) -> i64 {
        self.add(n.wrapping_neg())
    }

    pub fn inc(&self) -> i64 {
        self.add(1)
    }

    pub fn dec(&self) -> i64 {
        self.sub(1)
    }

    /// Replaces the current value and returns the previous one.
    pub fn swap(&self, n: i64) -> i64 {
        self.value.as_ref().map_or(0, |v| v.swap(n))
    }

    /// Stores `new` if the current value equals `old`, reporting whether it
    /// did.
    pub fn compare_and_swap(&self, old: i64, new: i64) -> bool {
        self.value
            .as_ref()
            .is_some_and(|v| v.compare_and_swap(old, new))
    }

    pub fn store(&self, n: i64) {
        if let Some(v) = &self.value {
            v.store(n);
        }
    }

    pub fn load(&self) -> i64 {
        self.value.as_ref().map_or(0, |v| v.load())
    }
}

/// A collection of [`Gauge`]s sharing a name and constant tags, told apart
/// by a fixed, ordered set of variable tags.
#[derive(Clone, Debug, Default)]
pub struct GaugeVector {
    vector: Option<Arc<Vector<Arc<Value>>>>,
}

impl GaugeVector {
    pub(crate) fn new(meta: Arc<Metadata>) -> (Self, Arc<Vector<Arc<Value>>>) {
        let factory_meta = Arc::clone(&meta);
        let vector = Arc::new(Vector::new(meta, move |tags| {
            Arc::new(Value::new(Arc::clone(&factory_meta), tags, ValueKind::Gauge))
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

    /// Retrieves the gauge for the supplied `(tag name, tag value)` pairs,
    /// creating it if necessary. Pairs must follow the declared order.
    pub fn get(&self, pairs: &[(&str, &str)]) -> Result<Gauge> {
        match &self.vector {
            None => Ok(Gauge::nop()),
            Some(vec) => vec.get_or_create(pairs).map(Gauge::from_value),
        }
    }

    /// Like [`get`](Self::get), but panics on a wrong tag count or order.
    pub fn must_get(&self, pairs: &[(&str, &str)]) -> Gauge {
        match self.get(pairs) {
            Ok(g) => g,
            Err(err) => panic!("failed to get gauge: {err}"),
        }
    }

    pub fn get_tagged<T: TagValues>(&self, tags: &T) -> Result<Gauge> {
        with_tag_pairs(tags, |pairs| self.get(pairs))
    }

    pub fn must_get_tagged<T: TagValues>(&self, tags: &T) -> Gauge {
        with_tag_pairs(tags, |pairs| self.must_get(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;

    fn gauge() -> Gauge {
        let meta = Metadata::new(&Spec::new("test_gauge", "Some help.")).unwrap();
        Gauge::new(Arc::new(meta)).0
    }

    #[test]
    fn test_gauge_operations() {
        let g = gauge();
        assert_eq!(g.add(5), 5);
        assert_eq!(g.sub(7), -2);
        assert_eq!(g.inc(), -1);
        assert_eq!(g.dec(), -2);
        assert_eq!(g.swap(10), -2);
        assert!(g.compare_and_swap(10, 3));
        assert!(!g.compare_and_swap(10, 4));
        g.store(42);
        assert_eq!(g.load(), 42);
    }

    #[test]
    fn test_nop_gauge() {
        let g = Gauge::nop();
        g.store(42);
        assert_eq!(g.add(42), 0);
        assert_eq!(g.sub(1), 0);
        assert_eq!(g.inc(), 0);
        assert_eq!(g.dec(), 0);
        assert_eq!(g.load(), 0);
        assert_eq!(g.swap(42), 0);
        assert!(!g.compare_and_swap(42, 10));
    }

    #[test]
    fn test_nop_gauge_vector() {
        let vec = GaugeVector::nop();
        let g = vec.get(&[("foo", "bar")]).unwrap();
        g.store(1);
        assert_eq!(vec.must_get(&[("foo", "bar")]).load(), 0);
    }

    #[test]
    #[should_panic(expected = "failed to get gauge")]
    fn test_must_get_panics_on_wrong_order() {
        let meta = Metadata::new(&Spec::new("test_gauge", "help").var_tags(["a", "b"])).unwrap();
        let (vec, _) = GaugeVector::new(Arc::new(meta));
        vec.must_get(&[("b", "1"), ("a", "2")]);
    }
}
