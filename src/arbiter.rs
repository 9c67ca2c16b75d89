//! Obstacle arbitration: decide, from one sensor frame, whether the learner's
//! requested action may run or must be replaced by a fixed avoidance maneuver.
//!
//! Rules are evaluated in priority order:
//!
//! | # | Condition | Risk | Override |
//! |---|---|---|---|
//! | 1 | frame degraded | `Safe` | no |
//! | 2 | approaching the target (ahead, close and roughly centred) | `Safe` | no |
//! | 3 | `max_ir > danger_ir` | `Danger` | unless suppressed |
//! | 4 | `max_ir > caution_ir` | `Caution` | unless suppressed |
//! | 5 | otherwise | `Safe` | no |
//!
//! Rule 2 keeps the robot from "avoiding" the very target it is driving
//! into. It only applies while the blob was read with the head facing
//! forward: a target seen off to the side says nothing about what the front
//! IR sensors are reporting. Suppression (see [`VisibilitySuppression`]) lets
//! a visible target veto the override while still reporting the risk level
//! to the reward.

use core::fmt;
use core::time::Duration;

use tracing::debug;

use crate::action::WheelCommand;
use crate::config::{check_band, Band};
use crate::error::EnvError;
use crate::robot::{Actuation, RobotError};
use crate::sensors::SensorFrame;

// ─── RiskLevel ──────────────────────────────────────────────────────────────

/// Collision risk derived from the front IR sensors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskLevel {
    /// Nothing close.
    #[default]
    Safe,
    /// Obstacle nearby.
    Caution,
    /// Obstacle very close.
    Danger,
}

impl RiskLevel {
    /// Upper-case name for rendering.
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Caution => "CAUTION",
            RiskLevel::Danger => "DANGER",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a visible target vetoes an avoidance override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisibilitySuppression {
    /// Any visible target blob suppresses the override.
    AnyVisible,
    /// Only a target straight ahead and inside the centre band suppresses
    /// the override.
    #[default]
    CenteredOnly,
    /// Visibility never suppresses; risk alone decides.
    Never,
}

// ─── ArbiterConfig ──────────────────────────────────────────────────────────

/// Arbitration thresholds and suppression policy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbiterConfig {
    /// Blob size at or above which the robot counts as close to the target.
    pub close_size: f32,
    /// Exclusive horizontal band for the approach predicate.
    pub approach_band: Band,
    /// Inclusive band for [`VisibilitySuppression::CenteredOnly`].
    pub center_band: Band,
    /// IR reading above which risk is `Caution`.
    pub caution_ir: f32,
    /// IR reading above which risk is `Danger`.
    pub danger_ir: f32,
    /// Visibility suppression policy.
    pub suppression: VisibilitySuppression,
}

impl ArbiterConfig {
    /// Bands must be well formed and `danger_ir > caution_ir > 0`.
    pub fn validate(&self) -> Result<(), EnvError> {
        check_band("arbiter.approach_band", &self.approach_band)?;
        check_band("arbiter.center_band", &self.center_band)?;
        if !(self.caution_ir > 0.0 && self.danger_ir > self.caution_ir) {
            return Err(EnvError::invalid_config(format!(
                "arbiter thresholds must satisfy danger_ir > caution_ir > 0, got {} / {}",
                self.danger_ir, self.caution_ir
            )));
        }
        if !(self.close_size >= 0.0) {
            return Err(EnvError::invalid_config("arbiter.close_size must be non-negative"));
        }
        Ok(())
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            close_size: 20.0,
            approach_band: Band::new(20.0, 80.0),
            center_band: Band::new(45.0, 55.0),
            caution_ir: 30.0,
            danger_ir: 50.0,
            suppression: VisibilitySuppression::CenteredOnly,
        }
    }
}

// ─── ArbiterDecision ────────────────────────────────────────────────────────

/// Result of arbitrating one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbiterDecision {
    /// Replace the requested action with the avoidance maneuver.
    pub override_action: bool,
    /// Risk level of the frame.
    pub risk: RiskLevel,
    /// The approach predicate held, so IR was ignored.
    pub approaching_target: bool,
}

// ─── ObstacleArbiter ────────────────────────────────────────────────────────

/// Stateless risk classifier and override decision.
#[derive(Clone, Debug)]
pub struct ObstacleArbiter {
    config: ArbiterConfig,
}

impl ObstacleArbiter {
    /// Arbiter with the given thresholds.
    pub fn new(config: ArbiterConfig) -> Self {
        Self { config }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Whether the frame shows the robot closing in on the target ahead.
    pub fn is_approaching(&self, frame: &SensorFrame) -> bool {
        frame.target_ahead()
            && frame.blob_size >= self.config.close_size
            && self.config.approach_band.strictly_contains(frame.blob_x)
    }

    /// Risk level from the IR readings alone.
    pub fn ir_risk(&self, frame: &SensorFrame) -> RiskLevel {
        let max_ir = frame.max_ir();
        if max_ir > self.config.danger_ir {
            RiskLevel::Danger
        } else if max_ir > self.config.caution_ir {
            RiskLevel::Caution
        } else {
            RiskLevel::Safe
        }
    }

    /// Arbitrate one frame.
    pub fn decide(&self, frame: &SensorFrame) -> ArbiterDecision {
        if frame.degraded {
            debug!("degraded frame, arbitration fails open");
            return ArbiterDecision::default();
        }
        if self.is_approaching(frame) {
            return ArbiterDecision {
                approaching_target: true,
                ..ArbiterDecision::default()
            };
        }

        let risk = self.ir_risk(frame);
        ArbiterDecision {
            override_action: risk != RiskLevel::Safe && !self.suppressed(frame),
            risk,
            approaching_target: false,
        }
    }

    fn suppressed(&self, frame: &SensorFrame) -> bool {
        match self.config.suppression {
            VisibilitySuppression::AnyVisible => frame.blob_present,
            VisibilitySuppression::CenteredOnly => {
                frame.target_ahead() && self.config.center_band.contains(frame.blob_x)
            }
            VisibilitySuppression::Never => false,
        }
    }
}

// ─── AvoidanceManeuver ──────────────────────────────────────────────────────

/// Fixed, non-learned escape sequence: back off, pivot, settle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvoidanceManeuver {
    /// Reverse leg.
    pub reverse: WheelCommand,
    /// Pivot leg.
    pub pivot: WheelCommand,
    /// Pause after the pivot.
    pub settle: Duration,
}

impl AvoidanceManeuver {
    /// Both legs must run for a non-zero time.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.reverse.duration.is_zero() || self.pivot.duration.is_zero() {
            return Err(EnvError::invalid_config(
                "avoidance maneuver legs must have non-zero durations",
            ));
        }
        Ok(())
    }

    /// Run the sequence. Stops at the first rejected command.
    pub fn execute<A: Actuation + ?Sized>(&self, robot: &mut A) -> Result<(), RobotError> {
        self.reverse.run(robot)?;
        self.pivot.run(robot)?;
        robot.settle(self.settle)
    }
}

impl Default for AvoidanceManeuver {
    fn default() -> Self {
        Self {
            reverse: WheelCommand::secs(-20, -20, 1),
            pivot: WheelCommand::secs(30, -30, 1),
            settle: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Command, ScriptedRobot};
    use crate::robot::Blob;

    fn arbiter() -> ObstacleArbiter {
        ObstacleArbiter::new(ArbiterConfig::default())
    }

    fn frame(ir: [f32; 3], blob: Blob) -> SensorFrame {
        SensorFrame::from_parts(ir, blob, false)
    }

    #[test]
    fn test_clear_path_is_safe() {
        let d = arbiter().decide(&frame([5.0, 10.0, 0.0], Blob::NONE));
        assert_eq!(d, ArbiterDecision::default());
    }

    #[test]
    fn test_side_obstacle_without_target_overrides() {
        let d = arbiter().decide(&frame([0.0, 350.0, 0.0], Blob::NONE));
        assert!(d.override_action);
        assert_eq!(d.risk, RiskLevel::Danger);
        assert!(!d.approaching_target);
    }

    #[test]
    fn test_caution_band() {
        let a = arbiter();
        assert_eq!(a.decide(&frame([40.0, 0.0, 0.0], Blob::NONE)).risk, RiskLevel::Caution);
        // thresholds are strict
        assert_eq!(a.decide(&frame([30.0, 0.0, 0.0], Blob::NONE)).risk, RiskLevel::Safe);
        assert_eq!(a.decide(&frame([50.0, 0.0, 0.0], Blob::NONE)).risk, RiskLevel::Caution);
    }

    #[test]
    fn test_approach_beats_any_ir_reading() {
        let d = arbiter().decide(&frame([500.0, 500.0, 500.0], Blob::new(25.0, 70.0)));
        assert!(!d.override_action);
        assert_eq!(d.risk, RiskLevel::Safe);
        assert!(d.approaching_target);
    }

    #[test]
    fn test_approach_band_is_exclusive() {
        let a = arbiter();
        assert!(!a.is_approaching(&frame([0.0; 3], Blob::new(25.0, 80.0))));
        assert!(!a.is_approaching(&frame([0.0; 3], Blob::new(19.9, 50.0))));
        assert!(a.is_approaching(&frame([0.0; 3], Blob::new(20.0, 79.0))));
    }

    #[test]
    fn test_target_to_the_side_does_not_mask_obstacle() {
        let a = arbiter();
        let side = frame([150.0, 0.0, 0.0], Blob::new(40.0, 50.0)).facing(false);
        assert!(!a.is_approaching(&side));

        let d = a.decide(&side);
        assert!(!d.approaching_target);
        assert!(d.override_action);
        assert_eq!(d.risk, RiskLevel::Danger);

        // any visible target still vetoes under AnyVisible
        let any = ObstacleArbiter::new(ArbiterConfig {
            suppression: VisibilitySuppression::AnyVisible,
            ..ArbiterConfig::default()
        });
        assert!(!any.decide(&side).override_action);
    }

    #[test]
    fn test_degraded_frame_fails_open() {
        let f = SensorFrame::from_parts([300.0, 300.0, 300.0], Blob::NONE, true);
        let d = arbiter().decide(&f);
        assert!(!d.override_action);
        assert_eq!(d.risk, RiskLevel::Safe);
    }

    #[test]
    fn test_suppression_policies() {
        // small, off-centre target with a close obstacle
        let off_centre = frame([60.0, 0.0, 0.0], Blob::new(5.0, 30.0));
        let centred = frame([60.0, 0.0, 0.0], Blob::new(5.0, 50.0));

        let mk = |suppression| {
            ObstacleArbiter::new(ArbiterConfig {
                suppression,
                ..ArbiterConfig::default()
            })
        };

        let any = mk(VisibilitySuppression::AnyVisible);
        assert!(!any.decide(&off_centre).override_action);
        assert!(!any.decide(&centred).override_action);

        let centred_only = mk(VisibilitySuppression::CenteredOnly);
        assert!(centred_only.decide(&off_centre).override_action);
        assert!(!centred_only.decide(&centred).override_action);
        // risk is still reported when suppressed
        assert_eq!(centred_only.decide(&centred).risk, RiskLevel::Danger);

        let never = mk(VisibilitySuppression::Never);
        assert!(never.decide(&off_centre).override_action);
        assert!(never.decide(&centred).override_action);
    }

    #[test]
    fn test_thresholds_validated() {
        let cfg = ArbiterConfig {
            caution_ir: 60.0,
            ..ArbiterConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(ArbiterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_maneuver_sequence() {
        let mut robot = ScriptedRobot::new();
        AvoidanceManeuver::default().execute(&mut robot).unwrap();
        assert_eq!(
            robot.drives(),
            vec![WheelCommand::secs(-20, -20, 1), WheelCommand::secs(30, -30, 1)]
        );
        assert!(matches!(
            robot.commands().last(),
            Some(Command::Settle { duration }) if *duration == Duration::from_millis(500)
        ));
    }

    #[test]
    fn test_maneuver_stops_on_rejection() {
        let mut robot = ScriptedRobot::new().failing_drive(RobotError::rejected("stalled"));
        let err = AvoidanceManeuver::default().execute(&mut robot).unwrap_err();
        assert_eq!(err, RobotError::rejected("stalled"));
        assert!(robot.drives().is_empty());
    }
}
