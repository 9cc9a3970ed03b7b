use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

use crate::error::{Error, Result, ValidationError};
use crate::push::{self, PushHandle, Target};
use crate::registry::Core;
use crate::scope::Scope;
use crate::snapshot::Snapshot;

static NEXT_ROOT_ID: AtomicU64 = AtomicU64::new(0);

/// A collection of tagged metrics that can be inspected with in-memory
/// snapshots, gathered for a Prometheus endpoint, or pushed to a
/// [`Target`].
pub struct Root {
    core: Arc<Core>,
    scope: Scope,
    // Never reset: a second pusher would re-send every total since startup.
    pushing: AtomicBool,
    // Distinguishes roots registered in the same `prometheus::Registry`.
    desc: Option<Desc>,
}

impl Root {
    pub fn new() -> Self {
        let core = Arc::new(Core::new());
        Self {
            scope: Scope::new(Arc::clone(&core)),
            core,
            pushing: AtomicBool::new(false),
            desc: root_desc(NEXT_ROOT_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// The top-level scope. Tagged sub-scopes and individual metrics are
    /// created from here.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// A point-in-time view of every registered metric. Safe to use
    /// concurrently, but relatively expensive; meant for tests.
    pub fn snapshot(&self) -> Snapshot {
        self.core.snapshot()
    }

    /// Every registered metric as Prometheus metric families.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.core.gather()
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|err| Error::Exposition(prometheus::Error::Msg(err.to_string())))
    }

    /// Starts a background thread that sends every metric's current total to
    /// `target` once per `tick`, and once more when stopped.
    ///
    /// A root pushes to at most one target over its lifetime; to feed
    /// several backends, write a target that fans out. Later calls fail with
    /// [`Error::AlreadyPushing`], even after the first pusher is stopped.
    pub fn push(&self, target: impl Target + 'static, tick: Duration) -> Result<PushHandle> {
        if tick.is_zero() {
            return Err(ValidationError::NonPositiveTick.into());
        }
        self.claim_push(|| push::spawn(Arc::clone(&self.core), Box::new(target), tick))
    }

    /// Runs `start` only if no pusher has been claimed yet. The claim is
    /// released if `start` fails, so a root whose thread never came up may
    /// try again.
    fn claim_push(&self, start: impl FnOnce() -> Result<PushHandle>) -> Result<PushHandle> {
        if self.pushing.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyPushing);
        }
        start().inspect_err(|_| self.pushing.store(false, Ordering::Release))
    }
}

fn root_desc(id: u64) -> Option<Desc> {
    Desc::new(
        "argos_root".to_string(),
        "Metrics registered under one argos root.".to_string(),
        Vec::new(),
        HashMap::from([("argos_root_id".to_string(), id.to_string())]),
    )
    .ok()
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("core", &self.core)
            .field("pushing", &self.pushing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for Root {
    fn desc(&self) -> Vec<&Desc> {
        self.desc.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gather()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{CounterHandle, GaugeHandle, HistogramHandle, HistogramPushSpec, PushSpec};
    use crate::spec::Spec;

    struct Discard;

    struct Sink;

    impl CounterHandle for Sink {
        fn set(&mut self, _: i64) {}
    }

    impl GaugeHandle for Sink {
        fn set(&mut self, _: i64) {}
    }

    impl HistogramHandle for Sink {
        fn set(&mut self, _: i64, _: i64) {}
    }

    impl Target for Discard {
        fn new_counter(&self, _: PushSpec) -> Box<dyn CounterHandle> {
            Box::new(Sink)
        }

        fn new_gauge(&self, _: PushSpec) -> Box<dyn GaugeHandle> {
            Box::new(Sink)
        }

        fn new_histogram(&self, _: HistogramPushSpec) -> Box<dyn HistogramHandle> {
            Box::new(Sink)
        }
    }

    #[test]
    fn test_push_only_once() {
        let root = Root::new();
        let mut handle = root.push(Discard, Duration::from_millis(10)).unwrap();
        assert!(matches!(
            root.push(Discard, Duration::from_millis(10)),
            Err(Error::AlreadyPushing)
        ));
        handle.stop();
        handle.stop();
        assert!(matches!(
            root.push(Discard, Duration::from_millis(10)),
            Err(Error::AlreadyPushing)
        ));
    }

    #[test]
    fn test_zero_tick_rejected_without_claiming_push() {
        let root = Root::new();
        assert!(matches!(
            root.push(Discard, Duration::ZERO),
            Err(Error::Validation(ValidationError::NonPositiveTick))
        ));
        root.push(Discard, Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn test_failed_start_releases_push_claim() {
        let root = Root::new();
        let err = root
            .claim_push(|| Err(Error::Spawn(std::io::Error::other("no threads left"))))
            .unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
        assert!(!root.pushing.load(Ordering::Acquire));

        let mut handle = root.push(Discard, Duration::from_millis(10)).unwrap();
        assert!(matches!(
            root.claim_push(|| unreachable!()),
            Err(Error::AlreadyPushing)
        ));
        handle.stop();
    }

    #[test]
    fn test_roots_have_distinct_descs() {
        let (a, b) = (Root::new(), Root::new());
        let (a, b) = (a.desc(), b.desc());
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_ne!(a[0].id, b[0].id);
    }

    #[test]
    fn test_debug_shows_metric_count() {
        let root = Root::new();
        root.scope()
            .counter(Spec::new("requests_total", "Requests served."))
            .unwrap();
        let debug = format!("{root:?}");
        assert!(debug.contains("metrics: 1"), "{debug}");
        assert!(debug.contains("pushing: false"), "{debug}");
    }

    #[test]
    fn test_render_text_format() {
        let root = Root::new();
        root.scope()
            .counter(Spec::new("requests_total", "Requests served."))
            .unwrap()
            .add(3);
        let text = root.render().unwrap();
        assert!(text.contains("# HELP requests_total Requests served."));
        assert!(text.contains("# TYPE requests_total counter"));
        assert!(text.contains("requests_total 3"));
    }
}
