//! # Argos
//!
//! Tagged counters, gauges, and histograms for instrumenting a process. Every
//! metric is registered once, checked for uniqueness, and exported by
//! gathering Prometheus metric families or by pushing totals to a backend
//! on an interval.
//!
//! ## Quick Start
//!
//! ```
//! use argos::{Root, Spec};
//!
//! let root = Root::new();
//! let scope = root.scope().tagged([("service", "users")]);
//!
//! // Scalar metric, no variable tags
//! let requests = scope
//!     .counter(Spec::new("requests_total", "Total requests"))
//!     .unwrap();
//! requests.inc();
//!
//! // Vector, one counter per combination of variable tag values
//! let responses = scope
//!     .counter_vector(
//!         Spec::new("responses_total", "Responses by method and status")
//!             .var_tags(["method", "status"]),
//!     )
//!     .unwrap();
//! responses.must_get(&[("method", "GET"), ("status", "200")]).add(150);
//! responses.must_get(&[("method", "POST"), ("status", "404")]).add(3);
//!
//! println!("{}", root.render().unwrap());
//! ```
//!
//! This outputs:
//! ```text
//! # HELP requests_total Total requests
//! # TYPE requests_total counter
//! requests_total{service="users"} 1
//! # HELP responses_total Responses by method and status
//! # TYPE responses_total counter
//! responses_total{method="GET",service="users",status="200"} 150
//! responses_total{method="POST",service="users",status="404"} 3
//! ```
//!
//! ## Uniqueness
//!
//! Metrics sharing a name must share tag names, and no two metrics may have
//! the same name and constant tags:
//!
//! ```
//! use argos::{Root, Spec};
//!
//! let root = Root::new();
//! let spec = Spec::new("requests_total", "Total requests").const_tag("dc", "east");
//! root.scope().counter(spec.clone()).unwrap();
//!
//! let err = root.scope().counter(spec).unwrap_err();
//! assert!(err.is_identity_conflict());
//! ```
//!
//! ## Tag Types
//!
//! `#[derive(Tags)]` lets a struct declare a vector's variable tags and look
//! up its entries:
//!
//! ```
//! use argos::{Root, Spec, Tags};
//!
//! #[derive(Tags)]
//! struct Request<'a> {
//!     method: &'a str,
//!     status: u16,
//! }
//!
//! let root = Root::new();
//! let responses = root
//!     .scope()
//!     .gauge_vector(Spec::new("in_flight", "Requests in flight").var_tags_of::<Request>())
//!     .unwrap();
//! responses.must_get_tagged(&Request { method: "GET", status: 200 }).inc();
//! ```
//!
//! ## Histograms
//!
//! Histograms count observations in fixed buckets. Durations are divided by
//! the histogram's unit before bucketing, and observations past the last
//! bound land in an implicit catch-all bucket:
//!
//! ```
//! use argos::{HistogramSpec, Root, Spec, buckets};
//! use std::time::Duration;
//!
//! let root = Root::new();
//! let latency = root
//!     .scope()
//!     .histogram(HistogramSpec::new(
//!         Spec::new("latency_ms", "Request latency"),
//!         Duration::from_millis(1),
//!         buckets![10, 50, 100],
//!     ))
//!     .unwrap();
//! latency.observe(Duration::from_millis(42));
//! latency.observe_int(500);
//!
//! let snapshot = root.snapshot();
//! assert_eq!(snapshot.histograms[0].values, vec![50, i64::MAX]);
//! ```
//!
//! If you don't want to manually specify buckets, the [`bucket`] module
//! generates them:
//!
//! ```
//! use argos::bucket;
//!
//! assert_eq!(bucket::linear(10, 10, 4), vec![10, 20, 30, 40]);
//! assert_eq!(bucket::exponential(1, 2, 4), vec![1, 2, 4, 8]);
//! ```
//!
//! ## Pushing
//!
//! [`Root::push`] starts a background thread that hands every metric's
//! running total to a [`Target`] on each tick. Only one pusher may ever run
//! per root.

#[doc(hidden)]
pub use argos_macro::Tags;

#[doc(hidden)]
pub use argos_core as core;

pub use argos_core::buckets as bucket;
pub use argos_core::{
    Counter, CounterHandle, CounterVector, Error, Gauge, GaugeHandle, GaugeVector, Histogram,
    HistogramHandle, HistogramKind, HistogramPushSpec, HistogramSnapshot, HistogramSpec,
    HistogramVector, PushHandle, PushSpec, Result, Root, Scope, SimpleSnapshot, Snapshot, Spec,
    TagValues, Tags, Target, ValidationError, scrub,
};

/// Builds a list of histogram bucket bounds, checked at compile time.
///
/// Bounds must be constant, non-empty, and strictly increasing.
///
/// # Examples
///
/// ```
/// use argos::buckets;
///
/// assert_eq!(buckets![1, 5, 10], vec![1, 5, 10]);
/// ```
///
/// Invalid bucket ordering fails at compile time:
/// ```compile_fail
/// use argos::buckets;
///
/// // This will fail because buckets are not in ascending order
/// let _ = buckets![10, 5, 20];
/// ```
#[macro_export]
macro_rules! buckets {
    ($($bound:expr),+ $(,)?) => {{
        const BUCKETS: &[i64] = &[$($bound),+];
        const _: () = $crate::core::buckets::validate_buckets(BUCKETS);
        BUCKETS.to_vec()
    }};
}
