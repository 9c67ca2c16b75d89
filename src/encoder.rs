//! Composite discrete state: scan position × distance bucket.
//!
//! ```text
//! found:      state = position_index * D + distance_bucket     ∈ [0, P*D)
//! not found:  state = P * D                                    (single reserved value)
//! ```
//!
//! Distance buckets stand in for a depth measurement: a bigger blob is a
//! closer target. Thresholds are listed in descending order; bucket 0 is the
//! nearest. With the default thresholds `[30, 20]` there are three buckets:
//! near (≥30), medium (≥20), far (<20).
//!
//! The state space therefore has `P * D + 1` values. Only one value is
//! reserved for "not visible"; the `D` slots a naive `(P + 1) * D` layout
//! would reserve are never produced.

use core::fmt;

use heapless::Vec as HVec;

use crate::error::EnvError;
use crate::scan::ScanResult;

/// Maximum number of distance buckets.
pub const MAX_DISTANCE_BUCKETS: usize = 8;

/// Maximum number of thresholds, one fewer than the bucket limit.
pub const MAX_DISTANCE_THRESHOLDS: usize = MAX_DISTANCE_BUCKETS - 1;

// ─── DistanceBuckets ────────────────────────────────────────────────────────

/// Descending blob-size thresholds separating the distance buckets.
///
/// `thresholds.len() + 1` buckets: a size at or above `thresholds[i]` (and
/// below every earlier threshold) falls in bucket `i`; anything below the last
/// threshold is the farthest bucket.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceBuckets {
    /// Strictly descending, positive size thresholds.
    pub thresholds: HVec<f32, MAX_DISTANCE_THRESHOLDS>,
}

impl DistanceBuckets {
    /// Buckets from an explicit threshold list.
    pub fn with_thresholds(thresholds: &[f32]) -> Result<Self, EnvError> {
        let thresholds = HVec::from_slice(thresholds).map_err(|_| {
            EnvError::invalid_config(format!(
                "at most {} distance thresholds supported, got {}",
                MAX_DISTANCE_THRESHOLDS,
                thresholds.len()
            ))
        })?;
        let buckets = Self { thresholds };
        buckets.validate()?;
        Ok(buckets)
    }

    /// Number of buckets `D`.
    pub fn count(&self) -> usize {
        self.thresholds.len() + 1
    }

    /// Bucket for a blob of `size`; 0 is nearest.
    pub fn bucket(&self, size: f32) -> usize {
        self.thresholds
            .iter()
            .position(|&t| size >= t)
            .unwrap_or(self.thresholds.len())
    }

    /// Human-readable bucket name.
    pub fn label(&self, bucket: usize) -> &'static str {
        match (self.count(), bucket) {
            (1, _) => "any",
            (2, 0) => "near",
            (2, _) => "far",
            (3, 0) => "near",
            (3, 1) => "medium",
            (3, _) => "far",
            (_, 0) => "nearest",
            (n, b) if b + 1 >= n => "farthest",
            _ => "intermediate",
        }
    }

    /// Thresholds must be finite, positive and strictly descending.
    pub fn validate(&self) -> Result<(), EnvError> {
        let mut prev = f32::INFINITY;
        for &t in &self.thresholds {
            if !t.is_finite() || t <= 0.0 {
                return Err(EnvError::invalid_config(format!(
                    "distance threshold {t} must be finite and positive"
                )));
            }
            if t >= prev {
                return Err(EnvError::invalid_config(
                    "distance thresholds must be strictly descending",
                ));
            }
            prev = t;
        }
        Ok(())
    }
}

impl Default for DistanceBuckets {
    fn default() -> Self {
        Self {
            thresholds: HVec::from_slice(&[30.0, 20.0]).unwrap_or_default(),
        }
    }
}

// ─── DiscreteState ──────────────────────────────────────────────────────────

/// Composite discrete state index handed to a tabular learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscreteState(pub u32);

impl DiscreteState {
    /// Raw index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DiscreteState> for u32 {
    fn from(s: DiscreteState) -> u32 {
        s.0
    }
}

// ─── StateEncoder ───────────────────────────────────────────────────────────

/// Maps scan results into [`DiscreteState`]s.
#[derive(Clone, Debug)]
pub struct StateEncoder {
    positions: usize,
    buckets: DistanceBuckets,
}

impl StateEncoder {
    /// Encoder for `positions` scan angles and the given buckets.
    pub fn new(positions: usize, buckets: DistanceBuckets) -> Self {
        Self { positions, buckets }
    }

    /// Number of scan positions `P`.
    pub fn positions(&self) -> usize {
        self.positions
    }

    /// The distance buckets.
    pub fn buckets(&self) -> &DistanceBuckets {
        &self.buckets
    }

    /// Size of the state space, `P * D + 1`.
    pub fn state_count(&self) -> usize {
        self.positions * self.buckets.count() + 1
    }

    /// The reserved "target not visible" state, `P * D`.
    pub fn not_visible(&self) -> DiscreteState {
        DiscreteState((self.positions * self.buckets.count()) as u32)
    }

    /// Encode one scan.
    pub fn encode(&self, scan: &ScanResult) -> DiscreteState {
        if !scan.found || scan.position_index >= self.positions {
            return self.not_visible();
        }
        let bucket = self.buckets.bucket(scan.blob.size);
        DiscreteState((scan.position_index * self.buckets.count() + bucket) as u32)
    }

    /// `(position_index, distance_bucket)` of a visible state; `None` for the
    /// reserved state or anything out of range.
    pub fn decompose(&self, state: DiscreteState) -> Option<(usize, usize)> {
        let d = self.buckets.count();
        let s = state.0 as usize;
        if s >= self.positions * d {
            None
        } else {
            Some((s / d, s % d))
        }
    }

    /// Whether `state` encodes a visible target.
    pub fn is_visible(&self, state: DiscreteState) -> bool {
        self.decompose(state).is_some()
    }
}
