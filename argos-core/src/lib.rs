//! Runtime for `argos`: tagged counters, gauges, and histograms with a
//! uniqueness-checked registry, Prometheus exposition, and a background
//! pusher. Most users should depend on the `argos` crate instead.

pub mod buckets;
mod counter;
mod digest;
mod error;
mod exposition;
mod gauge;
mod histogram;
mod metadata;
mod push;
mod registry;
mod root;
mod scope;
mod snapshot;
mod spec;
mod value;
mod vector;

pub use counter::{Counter, CounterVector};
pub use digest::scrub;
pub use error::{Error, Result, ValidationError};
pub use gauge::{Gauge, GaugeVector};
pub use histogram::{Histogram, HistogramVector};
pub use push::{
    CounterHandle, GaugeHandle, HistogramHandle, HistogramKind, HistogramPushSpec, PushHandle,
    PushSpec, Target,
};
pub use root::Root;
pub use scope::Scope;
pub use snapshot::{HistogramSnapshot, SimpleSnapshot, Snapshot};
pub use spec::{HistogramSpec, Spec, TagValues, Tags};
