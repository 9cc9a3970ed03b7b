use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select, tick};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::registry::Core;
use crate::spec::Tags;

/// Describes a counter or gauge to a push target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSpec {
    pub name: String,
    pub tags: Tags,
}

/// How a histogram's bucket bounds should be interpreted by a push target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HistogramKind {
    /// Bounds are plain integers in the histogram's unit.
    #[default]
    Value,
    /// Bounds are durations, reported in nanoseconds.
    Duration,
}

/// Describes a histogram to a push target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramPushSpec {
    pub spec: PushSpec,
    /// Upper bounds, including the trailing `i64::MAX` catch-all.
    pub buckets: Vec<i64>,
    pub kind: HistogramKind,
}

/// A backend that receives the cumulative totals of registered metrics.
///
/// Handles are requested once per metric (or per vector entry) the first
/// time it's pushed, then fed the metric's current total on every tick.
/// Targets that need deltas must compute them from successive totals.
pub trait Target: Send {
    fn new_counter(&self, spec: PushSpec) -> Box<dyn CounterHandle>;
    fn new_gauge(&self, spec: PushSpec) -> Box<dyn GaugeHandle>;
    fn new_histogram(&self, spec: HistogramPushSpec) -> Box<dyn HistogramHandle>;
}

pub trait CounterHandle: Send {
    fn set(&mut self, total: i64);
}

pub trait GaugeHandle: Send {
    fn set(&mut self, value: i64);
}

pub trait HistogramHandle: Send {
    /// Sets the (non-cumulative) number of observations in the bucket with
    /// this upper bound.
    fn set(&mut self, bucket: i64, total: i64);
}

/// Controls a running push loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct PushHandle {
    stop: Option<Sender<()>>,
    done: Option<JoinHandle<()>>,
}

impl PushHandle {
    /// Stops the loop, waiting for its final push to finish. Safe to call
    /// more than once.
    pub fn stop(&mut self) {
        // Disconnecting the channel is the stop signal.
        drop(self.stop.take());
        if let Some(done) = self.done.take() {
            if done.join().is_err() {
                warn!("metrics push thread panicked");
            }
        }
    }
}

impl Drop for PushHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn spawn(core: Arc<Core>, target: Box<dyn Target>, interval: Duration) -> Result<PushHandle> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
    let done = thread::Builder::new()
        .name("argos-push".to_string())
        .spawn(move || run(&core, target.as_ref(), interval, stop_rx))?;
    Ok(PushHandle {
        stop: Some(stop_tx),
        done: Some(done),
    })
}

fn run(core: &Core, target: &dyn Target, interval: Duration, stop: Receiver<()>) {
    debug!(?interval, "metrics push loop started");
    let ticker = tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => push_all(core, target),
            recv(stop) -> _ => break,
        }
    }
    push_all(core, target);
    debug!("metrics push loop stopped");
}

fn push_all(core: &Core, target: &dyn Target) {
    let metrics = core.metrics();
    trace!(metrics = metrics.len(), "pushing metrics");
    for metric in &metrics {
        metric.push(target);
    }
}
