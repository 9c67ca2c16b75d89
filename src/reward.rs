//! Reward shaping.
//!
//! Two regimes share one risk penalty:
//!
//! ```text
//! tabular:     r = position_weight[p] * distance_multiplier[d]        (visible)
//!              r = not_visible_reward                                 (not visible)
//! continuous:  r = detection + size + centring − offset − obstacle − step
//!              r = −not_visible_penalty − obstacle − step             (not visible)
//! both:        r −= risk_penalty(risk)
//! ```
//!
//! Tabular weights fall off with angle from straight ahead, and multipliers
//! fall off with distance bucket, so for a fixed position a nearer target
//! never earns less than a farther one. The terminal bonus and truncation
//! penalty are configured here but applied by the episode controller, which
//! knows when the goal fires.

use heapless::Vec as HVec;

use crate::arbiter::RiskLevel;
use crate::encoder::{DiscreteState, MAX_DISTANCE_BUCKETS};
use crate::error::EnvError;
use crate::scan::MAX_SCAN_ANGLES;
use crate::sensors::SensorFrame;

/// Default per-position weights for the 13-angle sweep.
pub const DEFAULT_POSITION_WEIGHTS: [f32; 13] =
    [3.0, 1.5, 1.0, 0.6, 0.4, 0.2, 0.1, 1.5, 1.0, 0.6, 0.4, 0.2, 0.1];

/// Default near / medium / far multipliers.
pub const DEFAULT_DISTANCE_MULTIPLIERS: [f32; 3] = [3.0, 1.5, 0.5];

// ─── Config ─────────────────────────────────────────────────────────────────

/// Lookup-table reward over the discrete state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabularReward {
    /// One weight per scan position.
    pub position_weights: HVec<f32, MAX_SCAN_ANGLES>,
    /// One multiplier per distance bucket, nearest first.
    pub distance_multipliers: HVec<f32, MAX_DISTANCE_BUCKETS>,
    /// Reward for the reserved not-visible state.
    pub not_visible_reward: f32,
}

impl Default for TabularReward {
    fn default() -> Self {
        Self {
            position_weights: HVec::from_slice(&DEFAULT_POSITION_WEIGHTS).unwrap_or_default(),
            distance_multipliers: HVec::from_slice(&DEFAULT_DISTANCE_MULTIPLIERS)
                .unwrap_or_default(),
            not_visible_reward: -5.0,
        }
    }
}

/// Dense shaping over the raw sensor frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuousReward {
    /// Blob size above which the target counts as detected.
    pub min_visible_size: f32,
    /// Flat bonus for a detection.
    pub detection_bonus: f32,
    /// Size term is `min(size / size_divisor, size_cap)`.
    pub size_divisor: f32,
    /// Cap on the size term.
    pub size_cap: f32,
    /// Centring bonuses as `(max offset from 50, bonus)`, tightest first.
    pub centering_tiers: [(f32, f32); 3],
    /// Offset penalty is `|x - 50| / centering_divisor`.
    pub centering_divisor: f32,
    /// Penalty when the target is not detected.
    pub not_visible_penalty: f32,
    /// Front-centre IR above which the reading is treated as an obstacle.
    pub obstacle_ir: f32,
    /// Blob size below which a close IR reading is not the target.
    pub target_size: f32,
    /// Penalty for an obstacle that is not the target.
    pub obstacle_penalty: f32,
    /// Per-step time penalty.
    pub step_penalty: f32,
}

impl Default for ContinuousReward {
    fn default() -> Self {
        Self {
            min_visible_size: 2.0,
            detection_bonus: 1.0,
            size_divisor: 20.0,
            size_cap: 5.0,
            centering_tiers: [(10.0, 3.0), (20.0, 1.5), (30.0, 0.5)],
            centering_divisor: 50.0,
            not_visible_penalty: 2.0,
            obstacle_ir: 30.0,
            target_size: 15.0,
            obstacle_penalty: 5.0,
            step_penalty: 0.1,
        }
    }
}

/// Which base reward applies.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RewardRegime {
    /// Table lookup on the discrete state.
    Tabular(TabularReward),
    /// Shaping on the raw frame.
    Continuous(ContinuousReward),
}

impl Default for RewardRegime {
    fn default() -> Self {
        RewardRegime::Tabular(TabularReward::default())
    }
}

/// Penalty per risk level. `Safe` costs nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskPenalty {
    /// Penalty at `Caution`.
    pub caution: f32,
    /// Penalty at `Danger`.
    pub danger: f32,
}

impl RiskPenalty {
    /// Penalty for `risk`.
    pub fn for_risk(&self, risk: RiskLevel) -> f32 {
        match risk {
            RiskLevel::Safe => 0.0,
            RiskLevel::Caution => self.caution,
            RiskLevel::Danger => self.danger,
        }
    }
}

impl Default for RiskPenalty {
    fn default() -> Self {
        Self {
            caution: 5.0,
            danger: 15.0,
        }
    }
}

/// Complete reward configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardConfig {
    /// Base reward regime.
    pub regime: RewardRegime,
    /// Risk penalties.
    pub risk_penalty: RiskPenalty,
    /// Bonus paid once when the goal fires.
    pub terminal_bonus: f32,
    /// Penalty on the step that truncates the episode.
    pub truncation_penalty: f32,
}

impl RewardConfig {
    /// Check the regime tables against `positions` × `buckets` and the
    /// penalty ordering.
    pub fn validate(&self, positions: usize, buckets: usize) -> Result<(), EnvError> {
        let p = self.risk_penalty;
        if !(p.caution > 0.0 && p.danger > p.caution) {
            return Err(EnvError::invalid_config(format!(
                "risk penalties must satisfy danger > caution > 0, got {} / {}",
                p.danger, p.caution
            )));
        }
        if !self.terminal_bonus.is_finite() || self.terminal_bonus < 0.0 {
            return Err(EnvError::invalid_config("terminal_bonus must be non-negative"));
        }
        if !self.truncation_penalty.is_finite() || self.truncation_penalty < 0.0 {
            return Err(EnvError::invalid_config("truncation_penalty must be non-negative"));
        }

        match &self.regime {
            RewardRegime::Tabular(t) => {
                if t.position_weights.len() != positions {
                    return Err(EnvError::invalid_config(format!(
                        "reward.position_weights has {} entries, scan has {positions} angles",
                        t.position_weights.len()
                    )));
                }
                if t.distance_multipliers.len() != buckets {
                    return Err(EnvError::invalid_config(format!(
                        "reward.distance_multipliers has {} entries, expected {buckets} buckets",
                        t.distance_multipliers.len()
                    )));
                }
                if t.position_weights.iter().any(|w| !(*w > 0.0)) {
                    return Err(EnvError::invalid_config("position weights must be positive"));
                }
                if t.distance_multipliers.iter().any(|m| !(*m > 0.0))
                    || t.distance_multipliers.windows(2).any(|w| w[1] >= w[0])
                {
                    return Err(EnvError::invalid_config(
                        "distance multipliers must be positive and strictly decreasing",
                    ));
                }
            }
            RewardRegime::Continuous(c) => {
                if !(c.size_divisor > 0.0) || !(c.centering_divisor > 0.0) {
                    return Err(EnvError::invalid_config(
                        "continuous reward divisors must be positive",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            regime: RewardRegime::default(),
            risk_penalty: RiskPenalty::default(),
            terminal_bonus: 200.0,
            truncation_penalty: 0.0,
        }
    }
}

// ─── RewardComponents ───────────────────────────────────────────────────────

/// Per-step reward broken into its parts. Penalties are stored as
/// non-negative magnitudes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardComponents {
    /// Regime reward.
    pub base: f32,
    /// Risk penalty subtracted.
    pub risk_penalty: f32,
    /// Terminal bonus added.
    pub terminal_bonus: f32,
    /// Truncation penalty subtracted.
    pub truncation_penalty: f32,
}

impl RewardComponents {
    /// Net scalar reward.
    pub fn total(&self) -> f32 {
        self.base - self.risk_penalty + self.terminal_bonus - self.truncation_penalty
    }
}

// ─── RewardShaper ───────────────────────────────────────────────────────────

/// Computes [`RewardComponents`] from state, frame and risk.
#[derive(Clone, Debug)]
pub struct RewardShaper {
    config: RewardConfig,
    buckets: usize,
}

impl RewardShaper {
    /// Shaper for a state space with `buckets` distance buckets.
    pub fn new(config: RewardConfig, buckets: usize) -> Self {
        Self { config, buckets }
    }

    /// The configuration in use.
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Reward for one step, before any terminal bonus or truncation penalty.
    pub fn shape(&self, state: DiscreteState, frame: &SensorFrame, risk: RiskLevel) -> RewardComponents {
        let base = match &self.config.regime {
            RewardRegime::Tabular(t) => self.tabular(t, state),
            RewardRegime::Continuous(c) => continuous(c, frame),
        };
        RewardComponents {
            base,
            risk_penalty: self.risk_penalty(risk),
            ..RewardComponents::default()
        }
    }

    /// Risk penalty magnitude alone, used when a step could not act.
    pub fn risk_penalty(&self, risk: RiskLevel) -> f32 {
        self.config.risk_penalty.for_risk(risk)
    }

    fn tabular(&self, t: &TabularReward, state: DiscreteState) -> f32 {
        let s = state.index() as usize;
        let d = self.buckets.max(1);
        match (t.position_weights.get(s / d), t.distance_multipliers.get(s % d)) {
            (Some(w), Some(m)) => w * m,
            _ => t.not_visible_reward,
        }
    }
}

fn continuous(c: &ContinuousReward, frame: &SensorFrame) -> f32 {
    let mut reward = 0.0;
    if frame.blob_present && frame.blob_size > c.min_visible_size {
        reward += c.detection_bonus;
        reward += (frame.blob_size / c.size_divisor).min(c.size_cap);
        let error = (frame.blob_x - 50.0).abs();
        if let Some(&(_, bonus)) = c.centering_tiers.iter().find(|(limit, _)| error < *limit) {
            reward += bonus;
        }
        reward -= error / c.centering_divisor;
    } else {
        reward -= c.not_visible_penalty;
    }

    if frame.ir_front_center > c.obstacle_ir && frame.blob_size < c.target_size {
        reward -= c.obstacle_penalty;
    }
    reward - c.step_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{DistanceBuckets, StateEncoder};
    use crate::robot::Blob;
    use crate::scan::ScanResult;

    fn tabular_shaper() -> RewardShaper {
        RewardShaper::new(RewardConfig::default(), 3)
    }

    fn clear() -> SensorFrame {
        SensorFrame::default()
    }

    #[test]
    fn test_tabular_lookup() {
        let s = tabular_shaper();
        // position 0, near
        let r = s.shape(DiscreteState(0), &clear(), RiskLevel::Safe);
        assert!((r.total() - 9.0).abs() < 1e-6);
        // position 7 (-15°), far
        let r = s.shape(DiscreteState(7 * 3 + 2), &clear(), RiskLevel::Safe);
        assert!((r.total() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_not_visible_is_flat() {
        let s = tabular_shaper();
        let r = s.shape(DiscreteState(39), &clear(), RiskLevel::Safe);
        assert_eq!(r.base, -5.0);
        assert_eq!(r.total(), -5.0);
    }

    #[test]
    fn test_nearer_never_worse_than_farther() {
        let s = tabular_shaper();
        let enc = StateEncoder::new(13, DistanceBuckets::default());
        for p in 0..13 {
            let mut prev = f32::INFINITY;
            for size in [45.0f32, 25.0, 5.0] {
                let state = enc.encode(&ScanResult::found_at(p, Blob::new(size, 50.0)));
                let r = s.shape(state, &clear(), RiskLevel::Safe).total();
                assert!(r <= prev, "position {p}: {r} > {prev}");
                prev = r;
            }
        }
    }

    #[test]
    fn test_risk_penalty_subtracted() {
        let s = tabular_shaper();
        let safe = s.shape(DiscreteState(0), &clear(), RiskLevel::Safe).total();
        let caution = s.shape(DiscreteState(0), &clear(), RiskLevel::Caution).total();
        let danger = s.shape(DiscreteState(0), &clear(), RiskLevel::Danger).total();
        assert!((safe - caution - 5.0).abs() < 1e-6);
        assert!((safe - danger - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_continuous_centred_target() {
        let cfg = RewardConfig {
            regime: RewardRegime::Continuous(ContinuousReward::default()),
            ..RewardConfig::default()
        };
        let s = RewardShaper::new(cfg, 3);
        let frame = SensorFrame::from_parts([0.0; 3], Blob::new(40.0, 55.0), false);
        // 1.0 + min(2.0, 5.0) + 3.0 - 5/50 - 0.1
        let r = s.shape(DiscreteState(0), &frame, RiskLevel::Safe).total();
        assert!((r - 5.8).abs() < 1e-5, "r={r}");
    }

    #[test]
    fn test_continuous_obstacle_without_target() {
        let cfg = RewardConfig {
            regime: RewardRegime::Continuous(ContinuousReward::default()),
            ..RewardConfig::default()
        };
        let s = RewardShaper::new(cfg, 1);
        let frame = SensorFrame::from_parts([60.0, 0.0, 0.0], Blob::NONE, false);
        // -2.0 - 5.0 - 0.1, then danger
        let r = s.shape(DiscreteState(1), &frame, RiskLevel::Danger);
        assert!((r.base + 7.1).abs() < 1e-5);
        assert!((r.total() + 22.1).abs() < 1e-5);
    }

    #[test]
    fn test_components_total() {
        let c = RewardComponents {
            base: 9.0,
            risk_penalty: 5.0,
            terminal_bonus: 200.0,
            truncation_penalty: 1.0,
        };
        assert_eq!(c.total(), 203.0);
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let cfg = RewardConfig::default();
        assert!(cfg.validate(13, 3).is_ok());
        assert!(cfg.validate(12, 3).is_err());
        assert!(cfg.validate(13, 2).is_err());

        let mut inverted = RewardConfig::default();
        inverted.risk_penalty = RiskPenalty { caution: 15.0, danger: 5.0 };
        assert!(inverted.validate(13, 3).is_err());

        let mut rising = TabularReward::default();
        rising.distance_multipliers = HVec::from_slice(&[0.5, 1.5, 3.0]).unwrap();
        let cfg = RewardConfig {
            regime: RewardRegime::Tabular(rising),
            ..RewardConfig::default()
        };
        assert!(cfg.validate(13, 3).is_err());
    }
}
