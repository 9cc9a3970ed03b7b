use std::sync::Arc;

use crate::counter::{Counter, CounterVector};
use crate::digest::scrub;
use crate::error::Result;
use crate::gauge::{Gauge, GaugeVector};
use crate::histogram::{Histogram, HistogramVector, Layout};
use crate::metadata::Metadata;
use crate::registry::{Core, Metric};
use crate::spec::{HistogramSpec, Spec, Tags};

/// A handle for declaring metrics, carrying constant tags that are applied
/// to every metric declared through it.
///
/// Scopes are cheap to clone. A scope that isn't attached to a
/// [`Root`](crate::Root), such as [`Scope::nop`], hands out metrics that
/// discard their updates and never returns an error.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    core: Option<Arc<Core>>,
    tags: Tags,
}

impl Scope {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core: Some(core),
            tags: Tags::new(),
        }
    }

    pub fn nop() -> Self {
        Self::default()
    }

    /// Returns a scope with `tags` added to this scope's constant tags,
    /// replacing any that share a name. Names and values are scrubbed.
    pub fn tagged<K, V>(&self, tags: impl IntoIterator<Item = (K, V)>) -> Scope
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut merged = self.tags.clone();
        for (k, v) in tags {
            merged.insert(
                scrub(k.as_ref()).into_owned(),
                scrub(v.as_ref()).into_owned(),
            );
        }
        Scope {
            core: self.core.clone(),
            tags: merged,
        }
    }

    /// Adds the scope's tags underneath the `Spec`'s own constant tags.
    fn apply_tags(&self, mut spec: Spec) -> Spec {
        for (k, v) in &self.tags {
            if !spec.const_tags.contains_key(k) {
                spec.const_tags.insert(k.clone(), v.clone());
            }
        }
        spec
    }

    pub fn counter(&self, spec: Spec) -> Result<Counter> {
        let Some(core) = &self.core else {
            return Ok(Counter::nop());
        };
        let spec = self.apply_tags(spec);
        spec.validate_scalar()?;
        let (counter, value) = Counter::new(Arc::new(Metadata::new(&spec)?));
        core.register(Metric::Counter(value))?;
        Ok(counter)
    }

    pub fn gauge(&self, spec: Spec) -> Result<Gauge> {
        let Some(core) = &self.core else {
            return Ok(Gauge::nop());
        };
        let spec = self.apply_tags(spec);
        spec.validate_scalar()?;
        let (gauge, value) = Gauge::new(Arc::new(Metadata::new(&spec)?));
        core.register(Metric::Gauge(value))?;
        Ok(gauge)
    }

    pub fn histogram(&self, mut spec: HistogramSpec) -> Result<Histogram> {
        let Some(core) = &self.core else {
            return Ok(Histogram::nop());
        };
        spec.spec = self.apply_tags(spec.spec);
        spec.validate_scalar()?;
        let meta = Arc::new(Metadata::new(&spec.spec)?);
        let (histogram, inner) = Histogram::new(meta, layout(&spec));
        core.register(Metric::Histogram(inner))?;
        Ok(histogram)
    }

    pub fn counter_vector(&self, spec: Spec) -> Result<CounterVector> {
        let Some(core) = &self.core else {
            return Ok(CounterVector::nop());
        };
        let spec = self.apply_tags(spec);
        spec.validate_vector()?;
        let (vector, inner) = CounterVector::new(Arc::new(Metadata::new(&spec)?));
        core.register(Metric::CounterVector(inner))?;
        Ok(vector)
    }

    pub fn gauge_vector(&self, spec: Spec) -> Result<GaugeVector> {
        let Some(core) = &self.core else {
            return Ok(GaugeVector::nop());
        };
        let spec = self.apply_tags(spec);
        spec.validate_vector()?;
        let (vector, inner) = GaugeVector::new(Arc::new(Metadata::new(&spec)?));
        core.register(Metric::GaugeVector(inner))?;
        Ok(vector)
    }

    pub fn histogram_vector(&self, mut spec: HistogramSpec) -> Result<HistogramVector> {
        let Some(core) = &self.core else {
            return Ok(HistogramVector::nop());
        };
        spec.spec = self.apply_tags(spec.spec);
        spec.validate_vector()?;
        let meta = Arc::new(Metadata::new(&spec.spec)?);
        let (vector, inner) = HistogramVector::new(meta, layout(&spec));
        core.register(Metric::HistogramVector(inner))?;
        Ok(vector)
    }
}

fn layout(spec: &HistogramSpec) -> Layout {
    Layout::new(spec.unit, spec.push_kind, &spec.buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};
    use std::time::Duration;

    fn scope() -> (Arc<Core>, Scope) {
        let core = Arc::new(Core::new());
        (Arc::clone(&core), Scope::new(core))
    }

    #[test]
    fn test_tagged_scrubs_and_overrides() {
        let (_, scope) = scope();
        let scope = scope
            .tagged([("host name", "a.b"), ("dc", "x")])
            .tagged([("dc", "y")]);
        assert_eq!(
            scope.tags,
            Tags::from([
                ("dc".to_string(), "y".to_string()),
                ("host_name".to_string(), "a_b".to_string()),
            ])
        );
    }

    #[test]
    fn test_declared_tags_win_over_scope_tags() {
        let (core, scope) = scope();
        let scope = scope.tagged([("service", "scope"), ("region", "east")]);
        scope
            .counter(Spec::new("requests", "help").const_tag("service", "spec"))
            .unwrap()
            .inc();

        let snap = core.snapshot();
        assert_eq!(
            snap.counters[0].tags,
            Tags::from([
                ("region".to_string(), "east".to_string()),
                ("service".to_string(), "spec".to_string()),
            ])
        );
    }

    #[test]
    fn test_scalar_and_vector_specs_checked() {
        let (_, scope) = scope();
        assert!(matches!(
            scope.counter(Spec::new("c", "help").var_tags(["x"])),
            Err(Error::Validation(ValidationError::UnexpectedVariableTags))
        ));
        assert!(matches!(
            scope.gauge_vector(Spec::new("g", "help")),
            Err(Error::Validation(ValidationError::MissingVariableTags))
        ));
        assert!(matches!(
            scope.histogram(HistogramSpec::new(
                Spec::new("h", "help"),
                Duration::from_millis(1),
                [5, 1]
            )),
            Err(Error::Validation(ValidationError::UnsortedBuckets))
        ));
    }

    #[test]
    fn test_nop_scope_never_errors() {
        let scope = Scope::nop().tagged([("a", "b")]);
        scope.counter(Spec::default()).unwrap().inc();
        scope.gauge(Spec::default()).unwrap().inc();
        scope.counter(Spec::default()).unwrap();
        scope
            .histogram(HistogramSpec::new(Spec::default(), Duration::ZERO, Vec::new()))
            .unwrap()
            .observe_int(1);
        scope.counter_vector(Spec::default()).unwrap();
        scope.gauge_vector(Spec::default()).unwrap();
        scope
            .histogram_vector(HistogramSpec::new(Spec::default(), Duration::ZERO, Vec::new()))
            .unwrap();
    }
}
