//! Synthesis of dense arbitrary-waveform tables from sparse breakpoints.

use crate::{Error, Result};

/// Linearly interpolate `breakpoints` onto `total_points` evenly spaced
/// samples.
///
/// Each segment contributes `round(total_points * dx / x_last)` samples with
/// the right endpoint excluded, so consecutive segments tile without
/// duplicated boundary values. Per-segment rounding is independent, so the
/// concatenation can land a few samples short of `total_points`; the final
/// sample is then repeated until the length is exact. Callers must not
/// assume that segment boundaries map to exact table indices.
pub fn densify(breakpoints: &[(f64, f64)], total_points: usize) -> Result<Vec<f64>> {
    if breakpoints.len() < 2 {
        return Err(Error::InvalidBreakpoints("need at least two breakpoints"));
    }
    if total_points < breakpoints.len() {
        return Err(Error::InvalidBreakpoints("fewer samples requested than breakpoints"));
    }
    if !(breakpoints[0].0 >= 0.0) {
        return Err(Error::InvalidBreakpoints("breakpoint times must be non-negative"));
    }
    for pair in breakpoints.windows(2) {
        if !(pair[1].0 > pair[0].0) {
            return Err(Error::InvalidBreakpoints("breakpoint times must be strictly increasing"));
        }
    }

    let x_last = breakpoints[breakpoints.len() - 1].0;
    let mut dense = Vec::with_capacity(total_points);
    for pair in breakpoints.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let count = (total_points as f64 * (x1 - x0) / x_last).round() as usize;
        for i in 0..count {
            dense.push(y0 + (y1 - y0) * i as f64 / count as f64);
        }
    }
    // rounding can land on either side of the target length
    dense.truncate(total_points);
    while dense.len() < total_points {
        let last = *dense.last()
            .ok_or(Error::InvalidBreakpoints("no segment produced any samples"))?;
        dense.push(last);
    }
    Ok(dense)
}

/// Normalize `samples` to `[-1, 1]` by the range they actually span, then
/// scale to `full_scale` device codes. The observed minimum maps to
/// `-full_scale` and the observed maximum to `full_scale`; a nominal range
/// is never consulted. Constant waveforms have no span to normalize by and
/// must be special-cased by the caller.
pub fn scale_to_device_codes(samples: &[f64], full_scale: f64) -> Result<Vec<f64>> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in samples {
        min = min.min(value);
        max = max.max(value);
    }
    if !(max > min) {
        return Err(Error::DegenerateRange);
    }
    Ok(samples.iter()
        .map(|&value| (2.0 * (value - min) / (max - min) - 1.0) * full_scale)
        .collect())
}
