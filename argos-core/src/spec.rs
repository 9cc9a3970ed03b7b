use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ValidationError;
use crate::push::HistogramKind;

/// Tag names mapped to tag values.
pub type Tags = BTreeMap<String, String>;

/// A type whose fields name a vector's variable tags.
///
/// Usually derived with `#[derive(Tags)]`: each named field becomes a tag,
/// in declaration order, and its `Display` output becomes the tag value.
pub trait TagValues {
    const NAMES: &'static [&'static str];

    /// Tag values, in the same order as `NAMES`.
    fn values(&self) -> Vec<String>;
}

/// Declares a counter, gauge, or vector of either.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spec {
    pub name: String,
    pub help: String,
    pub const_tags: Tags,
    /// Only meaningful for vectors. Lookups must supply these in order.
    pub var_tags: Vec<String>,
    /// Keeps the metric out of push exports. It's still snapshotted and
    /// exposed to Prometheus.
    pub disable_push: bool,
}

impl Spec {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn const_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_tags.insert(name.into(), value.into());
        self
    }

    pub fn const_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.const_tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn var_tags<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.var_tags = names.into_iter().map(Into::into).collect();
        self
    }

    /// Uses the field names of `T` as the variable tags.
    pub fn var_tags_of<T: TagValues>(self) -> Self {
        self.var_tags(T::NAMES.iter().copied())
    }

    pub fn disable_push(mut self) -> Self {
        self.disable_push = true;
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.help.is_empty() {
            return Err(ValidationError::MissingHelp);
        }
        Ok(())
    }

    pub(crate) fn validate_scalar(&self) -> Result<(), ValidationError> {
        self.validate()?;
        if !self.var_tags.is_empty() {
            return Err(ValidationError::UnexpectedVariableTags);
        }
        Ok(())
    }

    pub(crate) fn validate_vector(&self) -> Result<(), ValidationError> {
        self.validate()?;
        if self.var_tags.is_empty() {
            return Err(ValidationError::MissingVariableTags);
        }
        Ok(())
    }
}

/// Declares a histogram or histogram vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistogramSpec {
    pub spec: Spec,
    /// Granularity of duration observations. An observation of one second
    /// with a unit of one millisecond is recorded as 1000, so the unit
    /// usually belongs in the metric name too (`latency_ms`).
    pub unit: Duration,
    /// Inclusive upper bounds, strictly increasing. A catch-all bucket for
    /// larger observations is added automatically.
    pub buckets: Vec<i64>,
    pub push_kind: HistogramKind,
}

impl HistogramSpec {
    pub fn new(spec: Spec, unit: Duration, buckets: impl Into<Vec<i64>>) -> Self {
        Self {
            spec,
            unit,
            buckets: buckets.into(),
            push_kind: HistogramKind::Value,
        }
    }

    pub fn push_kind(mut self, kind: HistogramKind) -> Self {
        self.push_kind = kind;
        self
    }

    pub(crate) fn validate_scalar(&self) -> Result<(), ValidationError> {
        self.validate_buckets()?;
        self.spec.validate_scalar()
    }

    pub(crate) fn validate_vector(&self) -> Result<(), ValidationError> {
        self.validate_buckets()?;
        self.spec.validate_vector()
    }

    fn validate_buckets(&self) -> Result<(), ValidationError> {
        if self.unit.is_zero() {
            return Err(ValidationError::NonPositiveUnit);
        }
        if self.buckets.is_empty() {
            return Err(ValidationError::EmptyBuckets);
        }
        if self.buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ValidationError::UnsortedBuckets);
        }
        Ok(())
    }
}
