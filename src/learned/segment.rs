//! Piecewise-linear segment fitting
//!
//! Fits monotone linear segments over a sorted key sample so that every
//! sample key's predicted rank stays within `epsilon` of its true rank.
//! The fitter runs one pass with a shrinking slope cone: each new point
//! narrows the admissible slope interval, and when the interval empties the
//! current segment is closed and a new one starts at that point.

/// One linear segment of a trained model
///
/// Predicts `rank ≈ slope * (key - first_key) + intercept` for keys at or
/// above `key`, up to the next segment's first key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// First key covered by this segment
    pub key: u64,
    /// Slope of the fitted line (ranks per key unit)
    pub slope: f64,
    /// Rank of `key` in the training sample
    pub intercept: f64,
}

impl Segment {
    /// Predicted rank of `key`; meaningful for keys within this segment's span
    #[inline]
    pub fn predict(&self, key: u64) -> f64 {
        self.slope * (key.wrapping_sub(self.key)) as f64 + self.intercept
    }
}

/// Fit segments over `(key, rank)` points with the given error bound
///
/// `points` must be strictly increasing in key. Every produced segment
/// satisfies `|segment.predict(key) - rank| <= epsilon` for each of its
/// points. `epsilon == 0` degenerates to one segment per non-collinear run.
pub fn fit_segments(points: &[(u64, u64)], epsilon: u64) -> Vec<Segment> {
    let mut segments = Vec::new();
    if points.is_empty() {
        return segments;
    }

    let eps = epsilon as f64;
    let (mut first_key, mut first_rank) = points[0];
    // admissible slope cone for the open segment
    let mut slope_lo = 0.0_f64;
    let mut slope_hi = f64::INFINITY;

    for &(key, rank) in &points[1..] {
        let dx = (key - first_key) as f64;
        let dy = rank as f64 - first_rank as f64;
        let lo = ((dy - eps) / dx).max(0.0);
        let hi = (dy + eps) / dx;

        if lo > slope_hi || hi < slope_lo {
            // cone emptied: close the segment and restart at this point
            segments.push(close_segment(first_key, first_rank, slope_lo, slope_hi));
            first_key = key;
            first_rank = rank;
            slope_lo = 0.0;
            slope_hi = f64::INFINITY;
        } else {
            slope_lo = slope_lo.max(lo);
            slope_hi = slope_hi.min(hi);
        }
    }
    segments.push(close_segment(first_key, first_rank, slope_lo, slope_hi));
    segments
}

fn close_segment(first_key: u64, first_rank: u64, slope_lo: f64, slope_hi: f64) -> Segment {
    // single-point segments keep an unbounded cone; any non-negative slope
    // predicts the point exactly, so pick zero
    let slope = if slope_hi.is_finite() {
        (slope_lo + slope_hi) / 2.0
    } else {
        slope_lo
    };
    Segment {
        key: first_key,
        slope,
        intercept: first_rank as f64,
    }
}

/// Index of the segment covering `key`: the last one with `seg.key <= key`
///
/// Callers clamp `key` to the trained range first, so the search never runs
/// off either end of a non-empty slice.
#[inline]
pub fn locate(segments: &[Segment], key: u64) -> usize {
    let idx = segments.partition_point(|seg| seg.key <= key);
    idx.saturating_sub(1)
}
