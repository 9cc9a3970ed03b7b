use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::digest::{Digester, scrub};
use crate::error::Result;
use crate::metadata::{Metadata, TagPairs};
use crate::spec::TagValues;

pub(crate) const DEFAULT_COLLECTION_SIZE: usize = 128;

type Factory<M> = Box<dyn Fn(TagPairs) -> M + Send + Sync>;

/// A lazily-populated collection of metrics that share metadata, keyed by
/// their variable tag values.
///
/// Entries are never removed.
pub(crate) struct Vector<M> {
    meta: Arc<Metadata>,
    factory: Factory<M>,
    metrics: RwLock<HashMap<Vec<u8>, M>>,
}

impl<M> fmt::Debug for Vector<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("name", &self.meta.name())
            .field("len", &self.metrics.read().len())
            .finish_non_exhaustive()
    }
}

impl<M: Clone> Vector<M> {
    pub(crate) fn new(
        meta: Arc<Metadata>,
        factory: impl Fn(TagPairs) -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            meta,
            factory: Box::new(factory),
            metrics: RwLock::new(HashMap::with_capacity(DEFAULT_COLLECTION_SIZE)),
        }
    }

    pub(crate) fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub(crate) fn get_or_create(&self, pairs: &[(&str, &str)]) -> Result<M> {
        self.meta.validate_var_tags(pairs)?;

        let mut digester = Digester::new();
        for (_, value) in pairs {
            digester.add("", &scrub(value));
        }
        let key = digester.digest();

        if let Some(m) = self.metrics.read().get(key) {
            return Ok(m.clone());
        }

        // Another thread may have won the race between the two locks.
        let mut metrics = self.metrics.write();
        if let Some(m) = metrics.get(key) {
            return Ok(m.clone());
        }
        let m = (self.factory)(self.meta.merge_tags(pairs));
        metrics.insert(key.to_vec(), m.clone());
        Ok(m)
    }

    /// Clones out every entry so callers don't hold the vector's lock.
    pub(crate) fn entries(&self) -> Vec<M> {
        self.metrics.read().values().cloned().collect()
    }
}

/// Pairs a [`TagValues`] type's names with its values for a vector lookup.
pub(crate) fn with_tag_pairs<T, R>(tags: &T, f: impl FnOnce(&[(&str, &str)]) -> R) -> R
where
    T: TagValues,
{
    let values = tags.values();
    let pairs: Vec<(&str, &str)> = T::NAMES
        .iter()
        .zip(&values)
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    f(&pairs)
}
