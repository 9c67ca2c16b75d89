//! Environment configuration: one validated structure for every threshold,
//! table and timing the control core uses.
//!
//! Each component owns its own section type ([`ScanConfig`], [`DistanceBuckets`],
//! [`ArbiterConfig`], [`ActionTable`], [`AvoidanceManeuver`], [`RewardConfig`]);
//! [`EnvConfig`] aggregates them and checks their cross-constraints in
//! [`EnvConfig::validate`].
//!
//! Two presets cover the deployed variants:
//!
//! | Preset | Observation | Scan angles | Reward regime | Max steps |
//! |---|---|---|---|---|
//! | [`EnvConfig::tabular`] (default) | discrete state | 13 (0°…±90°) | tabular | 50 |
//! | [`EnvConfig::continuous`] | `[blob_x, blob_size, ir_c, ir_l, ir_r]` | 1 (forward) | continuous shaping | 200 |
//!
//! With the `serde` feature every section derives `Serialize`/`Deserialize`,
//! so a caller can keep configurations in JSON or TOML files.

use core::time::Duration;

use crate::action::ActionTable;
use crate::arbiter::{ArbiterConfig, AvoidanceManeuver};
use crate::encoder::DistanceBuckets;
use crate::error::EnvError;
use crate::reward::{ContinuousReward, RewardConfig, RewardRegime};
use crate::robot::BlobColor;
use crate::scan::ScanConfig;

// ─── Small shared types ─────────────────────────────────────────────────────

/// Closed interval `[min, max]` on the camera's horizontal axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl Band {
    /// Construct a band.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `min <= x <= max`.
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// `min < x < max`.
    pub fn strictly_contains(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

/// What the environment hands to the learner on each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObservationMode {
    /// The composite discrete state index.
    Discrete,
    /// The raw five-element sensor vector.
    Continuous,
}

/// Camera head posture applied at every reset.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadConfig {
    /// Tilt angle in degrees.
    pub tilt_angle: i16,
    /// Tilt speed.
    pub tilt_speed: u8,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            tilt_angle: 200,
            tilt_speed: 50,
        }
    }
}

/// Goal-reached predicate thresholds.
///
/// The goal fires when `blob_size > min_blob_size`, the blob is inside
/// `center_band` (if `require_centering`), and the front-centre IR reading
/// exceeds `min_front_ir`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GoalConfig {
    /// Blob size the target must exceed.
    pub min_blob_size: f32,
    /// Front-centre IR reading the robot must exceed.
    pub min_front_ir: f32,
    /// Horizontal band counted as centred.
    pub center_band: Band,
    /// Whether centring is part of the predicate.
    pub require_centering: bool,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            min_blob_size: 35.0,
            min_front_ir: 100.0,
            center_band: Band::new(45.0, 55.0),
            require_centering: true,
        }
    }
}

// ─── EnvConfig ──────────────────────────────────────────────────────────────

/// Complete configuration of one seek environment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvConfig {
    /// Steps after which an episode is truncated.
    pub max_steps: u32,
    /// Colour of the target blob.
    pub target_color: BlobColor,
    /// Observation handed to the learner.
    pub observation: ObservationMode,
    /// Head posture at reset.
    pub head: HeadConfig,
    /// Pan sweep angles and speed.
    pub scan: ScanConfig,
    /// Blob-size distance buckets.
    pub buckets: DistanceBuckets,
    /// Obstacle arbitration thresholds and policy.
    pub arbiter: ArbiterConfig,
    /// Goal-reached predicate.
    pub goal: GoalConfig,
    /// Action id → wheel command table.
    pub actions: ActionTable,
    /// Fixed avoidance maneuver.
    pub maneuver: AvoidanceManeuver,
    /// Reward regime and penalties.
    pub reward: RewardConfig,
    /// Settle time after a simulation reset.
    pub reset_settle: Duration,
}

impl EnvConfig {
    /// Discrete-state preset: 13-angle sweep × 3 distance buckets, tabular reward.
    pub fn tabular() -> Self {
        Self {
            max_steps: 50,
            target_color: BlobColor::Red,
            observation: ObservationMode::Discrete,
            head: HeadConfig::default(),
            scan: ScanConfig::default(),
            buckets: DistanceBuckets::default(),
            arbiter: ArbiterConfig::default(),
            goal: GoalConfig::default(),
            actions: ActionTable::default(),
            maneuver: AvoidanceManeuver::default(),
            reward: RewardConfig::default(),
            reset_settle: Duration::from_secs(1),
        }
    }

    /// Continuous-observation preset: forward camera only, continuous shaping,
    /// larger terminal bonus and a penalty for running out of time.
    pub fn continuous() -> Self {
        Self {
            max_steps: 200,
            observation: ObservationMode::Continuous,
            scan: ScanConfig::forward_only(),
            goal: GoalConfig {
                min_blob_size: 15.0,
                min_front_ir: 50.0,
                center_band: Band::new(45.0, 55.0),
                require_centering: false,
            },
            actions: ActionTable::fine_grained(),
            reward: RewardConfig {
                regime: RewardRegime::Continuous(ContinuousReward::default()),
                terminal_bonus: 500.0,
                truncation_penalty: 50.0,
                ..RewardConfig::default()
            },
            ..Self::tabular()
        }
    }

    /// Number of scan positions `P`.
    pub fn position_count(&self) -> usize {
        self.scan.angles.len()
    }

    /// Number of distance buckets `D`.
    pub fn bucket_count(&self) -> usize {
        self.buckets.count()
    }

    /// Size of the discrete state space, `P * D + 1`.
    pub fn state_count(&self) -> usize {
        self.position_count() * self.bucket_count() + 1
    }

    /// Check every section and the constraints between them.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.max_steps == 0 {
            return Err(EnvError::invalid_config("max_steps must be positive"));
        }
        if self.reset_settle.is_zero() {
            return Err(EnvError::invalid_config("reset_settle must be positive"));
        }
        self.scan.validate()?;
        self.buckets.validate()?;
        self.arbiter.validate()?;
        self.actions.validate()?;
        self.maneuver.validate()?;

        check_band("goal.center_band", &self.goal.center_band)?;
        if !(self.goal.min_blob_size >= 0.0) || !(self.goal.min_front_ir >= 0.0) {
            return Err(EnvError::invalid_config("goal thresholds must be non-negative"));
        }

        self.reward
            .validate(self.position_count(), self.bucket_count())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::tabular()
    }
}

pub(crate) fn check_band(name: &str, band: &Band) -> Result<(), EnvError> {
    if band.is_valid() {
        Ok(())
    } else {
        Err(EnvError::invalid_config(format!(
            "{name} must satisfy min < max, got [{}, {}]",
            band.min, band.max
        )))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_is_tabular_and_valid() {
        let cfg = EnvConfig::default();
        assert_eq!(cfg, EnvConfig::tabular());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.position_count(), 13);
        assert_eq!(cfg.bucket_count(), 3);
        assert_eq!(cfg.state_count(), 40);
    }

    #[test]
    fn test_continuous_preset_is_valid() {
        let cfg = EnvConfig::continuous();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.observation, ObservationMode::Continuous);
        assert_eq!(cfg.position_count(), 1);
        assert_eq!(cfg.max_steps, 200);
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        let cfg = EnvConfig { max_steps: 0, ..EnvConfig::tabular() };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_inverted_goal_band_rejected() {
        let mut cfg = EnvConfig::tabular();
        cfg.goal.center_band = Band::new(55.0, 45.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_position_weight_table_must_match_scan() {
        let mut cfg = EnvConfig::tabular();
        cfg.scan = ScanConfig::with_angles(&[0, 20, -20, 90, -90]).unwrap();
        // default tabular weights are sized for 13 angles
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_band_edges() {
        let b = Band::new(45.0, 55.0);
        assert!(b.contains(45.0));
        assert!(b.contains(55.0));
        assert!(!b.strictly_contains(45.0));
        assert!(b.strictly_contains(50.0));
        assert!(!b.contains(56.0));
    }
}
