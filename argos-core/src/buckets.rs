//! Helpers for building histogram bucket layouts.
//!
//! The constructors return an empty list when their parameters can't produce
//! a valid layout, which [`HistogramSpec`](crate::HistogramSpec) validation
//! then rejects.

use crate::error::ValidationError;

/// `count` buckets starting at `start`, each `width` apart.
///
/// Stops early rather than overflowing `i64`.
pub fn linear(start: i64, width: i64, count: usize) -> Vec<i64> {
    if count == 0 || width <= 0 {
        return Vec::new();
    }
    let mut buckets = Vec::with_capacity(count);
    let mut current = Some(start);
    while let Some(bound) = current {
        if buckets.len() == count {
            break;
        }
        buckets.push(bound);
        current = bound.checked_add(width);
    }
    buckets
}

/// `count` buckets starting at `start`, each `factor` times the last.
///
/// Stops early rather than overflowing `i64`.
pub fn exponential(start: i64, factor: i64, count: usize) -> Vec<i64> {
    if count == 0 || start <= 0 || factor < 2 {
        return Vec::new();
    }
    let mut buckets = Vec::with_capacity(count);
    let mut current = Some(start);
    while let Some(bound) = current {
        if buckets.len() == count {
            break;
        }
        buckets.push(bound);
        current = bound.checked_mul(factor);
    }
    buckets
}

/// Concatenates several layouts. Each must be strictly increasing, and each
/// must start above the end of the one before it.
pub fn flatten(layouts: &[&[i64]]) -> Result<Vec<i64>, ValidationError> {
    let mut buckets: Vec<i64> = Vec::with_capacity(layouts.iter().map(|l| l.len()).sum());
    for layout in layouts {
        for &bound in *layout {
            if buckets.last().is_some_and(|&last| last >= bound) {
                return Err(ValidationError::UnsortedBuckets);
            }
            buckets.push(bound);
        }
    }
    Ok(buckets)
}

/// A layout for RPC latencies in milliseconds, from 1ms to one minute.
pub fn rpc_latency() -> Vec<i64> {
    let layouts = [
        linear(1, 1, 10),
        linear(20, 10, 9),
        linear(200, 100, 9),
        linear(2_000, 1_000, 9),
        linear(20_000, 10_000, 5),
    ];
    let runs: Vec<&[i64]> = layouts.iter().map(Vec::as_slice).collect();
    // The runs above are disjoint and ascending.
    flatten(&runs).unwrap_or_default()
}

/// Checks that bucket bounds are non-empty and strictly increasing.
///
/// Being a `const fn`, it fails compilation when evaluated in a const
/// context with bad buckets. The `argos::buckets!` macro calls it.
///
/// ```
/// use argos_core::buckets::validate_buckets;
///
/// const _: () = validate_buckets(&[1, 5, 10]);
/// ```
///
/// ```compile_fail
/// use argos_core::buckets::validate_buckets;
///
/// const _: () = validate_buckets(&[5, 1, 10]);
/// ```
pub const fn validate_buckets(buckets: &[i64]) {
    if buckets.is_empty() {
        panic!("histogram buckets must not be empty");
    }
    let mut i = 1;
    while i < buckets.len() {
        if buckets[i - 1] >= buckets[i] {
            panic!("histogram buckets must be in strictly ascending order");
        }
        i += 1;
    }
}
