//! Learned hash adapter over a piecewise-linear segment index
//!
//! [`SegmentModel`] wraps segments fitted on a sorted key sample and serves
//! as a hash function with a bounded output range: a query locates the
//! covering segment, evaluates its line to estimate the key's rank in the
//! sample, and rescales the rank into `[0, N)`. With a recursive level
//! configured, segment lookup walks a small index-of-indexes instead of
//! binary-searching the full leaf array.
//!
//! Pair the model with a [`ClampReducer`](crate::reduction::ClampReducer)
//! when using it as a table hash: float evaluation may land a rescaled rank
//! a hair past the range.

use crate::error::{HashLabError, Result};
use crate::hash::KeyHasher;
use crate::key::TableKey;
use crate::learned::segment::{fit_segments, locate, Segment};

/// Build-time parameters for a [`SegmentModel`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentModelConfig {
    /// Error bound for leaf segments (ranks)
    pub epsilon: u64,
    /// Error bound for recursive index levels; zero disables recursion
    pub epsilon_recursive: u64,
    /// Reject builds that need more leaf segments than this
    pub max_segments: Option<usize>,
}

impl Default for SegmentModelConfig {
    fn default() -> Self {
        Self {
            epsilon: 64,
            epsilon_recursive: 4,
            max_segments: None,
        }
    }
}

/// Piecewise-linear rank model over a sorted key sample, rescaled to `[0, N)`
///
/// Immutable after build; queries are read-only.
#[derive(Debug, Clone)]
pub struct SegmentModel {
    /// `levels[0]` are the leaf segments over the sample; each following
    /// level indexes the first keys of the level below it
    levels: Vec<Vec<Segment>>,
    epsilon_recursive: u64,
    sample_len: usize,
    output_range: u64,
    /// Largest key seen during training; larger queries clamp to it
    max_key: u64,
}

impl SegmentModel {
    /// Train a model on a sorted, deduplicated sample with default parameters
    pub fn build<K: TableKey>(sample: &[K], output_range: u64) -> Result<Self> {
        Self::build_with_config(sample, output_range, &SegmentModelConfig::default())
    }

    /// Train a model with explicit fitting parameters
    pub fn build_with_config<K: TableKey>(
        sample: &[K],
        output_range: u64,
        config: &SegmentModelConfig,
    ) -> Result<Self> {
        if sample.is_empty() {
            return Err(HashLabError::configuration("sample must be non-empty"));
        }
        if output_range == 0 {
            return Err(HashLabError::configuration(
                "model output range must be non-zero",
            ));
        }
        let mut points = Vec::with_capacity(sample.len());
        let mut prev: Option<u64> = None;
        for (rank, &key) in sample.iter().enumerate() {
            if !key.is_valid() {
                return Err(HashLabError::InvalidKey);
            }
            let key = key.as_u64();
            if let Some(p) = prev {
                if key <= p {
                    return Err(HashLabError::configuration(
                        "sample must be sorted and deduplicated",
                    ));
                }
            }
            prev = Some(key);
            points.push((key, rank as u64));
        }

        let leaf = fit_segments(&points, config.epsilon);
        if let Some(max) = config.max_segments {
            if leaf.len() > max {
                return Err(HashLabError::model_overflow(leaf.len(), max));
            }
        }

        let max_key = points[points.len() - 1].0;
        let mut levels = vec![leaf];
        if config.epsilon_recursive > 0 {
            // index the level below until it fits in one segment or stops
            // shrinking
            loop {
                let below = levels.last().unwrap();
                if below.len() <= 1 {
                    break;
                }
                let index_points: Vec<(u64, u64)> = below
                    .iter()
                    .enumerate()
                    .map(|(i, seg)| (seg.key, i as u64))
                    .collect();
                let level = fit_segments(&index_points, config.epsilon_recursive);
                if level.len() >= below.len() {
                    break;
                }
                levels.push(level);
            }
        }

        Ok(Self {
            levels,
            epsilon_recursive: config.epsilon_recursive,
            sample_len: sample.len(),
            output_range,
            max_key,
        })
    }

    /// Number of leaf segments in the trained model
    pub fn segment_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels, including the leaf level
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// The configured output range `N`
    pub fn output_range(&self) -> u64 {
        self.output_range
    }

    /// Map a key into `[0, N)`; the u64 sentinel maps to `N` directly
    ///
    /// Keys above the trained range clamp to the largest trained key before
    /// segment lookup.
    pub fn index(&self, key: u64) -> u64 {
        if key == u64::MAX {
            return self.output_range;
        }
        let key = key.min(self.max_key);
        let (idx, seg) = self.leaf_segment(key);
        // clamp the prediction between this segment's first rank and the
        // next segment's first rank: keeps the model globally non-decreasing
        // and stops extrapolation between sparse keys from overshooting
        let upper = match self.levels[0].get(idx + 1) {
            Some(next) => next.intercept,
            None => (self.sample_len - 1) as f64,
        };
        let rank = seg.predict(key).clamp(seg.intercept, upper);
        let scaled = rank * self.output_range as f64 / self.sample_len as f64;
        (scaled as u64).min(self.output_range)
    }

    /// Locate the leaf segment covering `key` via the recursive levels
    fn leaf_segment(&self, key: u64) -> (usize, &Segment) {
        let top = self.levels.len() - 1;
        // the top level is small enough for a plain binary search
        let mut idx = locate(&self.levels[top], key);
        for depth in (0..top).rev() {
            let level = &self.levels[depth];
            let predicted = self.levels[depth + 1][idx].predict(key).max(0.0) as usize;
            let predicted = predicted.min(level.len() - 1);
            let margin = self.epsilon_recursive as usize + 2;
            let lo = predicted.saturating_sub(margin);
            let hi = (predicted + margin + 1).min(level.len());
            let within = level[lo..hi].partition_point(|seg| seg.key <= key);
            idx = if within == 0 || (within == hi - lo && hi < level.len()) {
                // prediction window missed; fall back to a full search
                locate(level, key)
            } else {
                lo + within - 1
            };
        }
        (idx, &self.levels[0][idx])
    }
}

impl<K: TableKey> KeyHasher<K> for SegmentModel {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        if !key.is_valid() {
            return self.output_range;
        }
        self.index(key.as_u64())
    }
}
