//! Episode controller: the gym-shaped `reset` / `step` / `render` / `close`
//! surface a training loop drives.
//!
//! One [`SeekEnv`] owns one robot handle. Every call takes `&mut self`, so a
//! robot can only be driven by one call chain at a time.
//!
//! # Step pipeline
//!
//! ```text
//! guard ─► validate action ─► read frame ─► arbitrate ─┬─► action      ─┐
//!                                                      └─► maneuver    ─┤
//!                                                                       ▼
//!        outcome ◄─ bonus/truncation ◄─ goal ◄─ reward ◄─ risk ◄─ rescan + IR
//! ```
//!
//! The arbiter sees the frame at the head's current position before the
//! robot moves. The reward sees the risk of the frame captured after the
//! move, so it scores where the robot ended up.
//!
//! A blob only counts as being in front of the robot (for the approach rule,
//! centred suppression and the goal) when it was read with the head at
//! [`ScanConfig::center_angle`]. A target found at 90° while a wall sits
//! straight ahead neither masks the wall nor ends the episode.
//!
//! [`ScanConfig::center_angle`]: crate::scan::ScanConfig::center_angle
//!
//! # Lifecycle
//!
//! `Idle ─reset─► Running ─step─► Running | Terminated | Truncated`.
//! Stepping a finished episode fails with [`EnvError::EpisodeOver`]; `reset`
//! is always allowed.

use core::fmt::Write as _;

use tracing::{debug, info, warn};

use crate::action::{Action, ActionExecutor};
use crate::arbiter::{ArbiterDecision, ObstacleArbiter, RiskLevel};
use crate::config::{EnvConfig, ObservationMode};
use crate::encoder::{DiscreteState, StateEncoder};
use crate::error::EnvError;
use crate::reward::{RewardComponents, RewardShaper};
use crate::robot::Robot;
use crate::scan::{PanScanner, ScanResult};
use crate::sensors::{SensorFrame, SensorReader};
use crate::trace::EpisodeTrace;

/// Length of a continuous observation vector.
pub const CONTINUOUS_OBSERVATION_LEN: usize = 5;

// ─── Episode types ──────────────────────────────────────────────────────────

/// What the learner sees after `reset` and each `step`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Observation {
    /// Composite discrete state.
    Discrete(DiscreteState),
    /// `[blob_x, blob_size, ir_center, ir_left, ir_right]`.
    Continuous([f32; CONTINUOUS_OBSERVATION_LEN]),
}

impl Observation {
    /// The discrete state, if this is a discrete observation.
    pub fn discrete(&self) -> Option<DiscreteState> {
        match self {
            Observation::Discrete(s) => Some(*s),
            Observation::Continuous(_) => None,
        }
    }

    /// The sensor vector, if this is a continuous observation.
    pub fn continuous(&self) -> Option<[f32; CONTINUOUS_OBSERVATION_LEN]> {
        match self {
            Observation::Discrete(_) => None,
            Observation::Continuous(v) => Some(*v),
        }
    }
}

/// Where the episode is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EpisodeStatus {
    /// No episode started since construction or `close`.
    #[default]
    Idle,
    /// Accepting steps.
    Running,
    /// The goal was reached.
    Terminated,
    /// The step limit ran out, or an actuation failure ended the episode.
    Truncated,
}

/// Episode bookkeeping, owned and mutated only by [`SeekEnv`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeState {
    /// Steps taken this episode.
    pub step_count: u32,
    /// Step limit.
    pub max_steps: u32,
    /// Lifecycle status.
    pub status: EpisodeStatus,
    /// Whether the terminal bonus has been paid this episode.
    pub terminal_bonus_paid: bool,
}

impl EpisodeState {
    /// `Terminated` or `Truncated`.
    pub fn is_done(&self) -> bool {
        matches!(self.status, EpisodeStatus::Terminated | EpisodeStatus::Truncated)
    }

    /// Goal reached.
    pub fn terminated(&self) -> bool {
        self.status == EpisodeStatus::Terminated
    }

    /// Cut short.
    pub fn truncated(&self) -> bool {
        self.status == EpisodeStatus::Truncated
    }
}

/// Extra information returned by `reset`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResetInfo {
    /// Seed passed in, recorded only.
    pub seed: Option<u64>,
    /// Initial discrete state.
    pub state: DiscreteState,
    /// Initial sweep.
    pub scan: ScanResult,
    /// Initial frame.
    pub frame: SensorFrame,
    /// Sensor faults substituted during the initial observation.
    pub faults: Vec<EnvError>,
}

/// Extra information returned by `step`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepInfo {
    /// Step number, starting at 1.
    pub step: u32,
    /// Action the learner asked for.
    pub requested: Action,
    /// Action actually executed; `None` when the maneuver replaced it.
    pub action_taken: Option<Action>,
    /// The avoidance maneuver ran.
    pub overridden: bool,
    /// Arbitration of the pre-action frame.
    pub decision: ArbiterDecision,
    /// Risk of the post-action frame, used for the reward.
    pub risk: RiskLevel,
    /// Discrete state after the step.
    pub state: DiscreteState,
    /// `(position_index, distance_bucket)` when the target is visible.
    pub position: Option<(usize, usize)>,
    /// Pan angle at which the target was found.
    pub scan_angle: Option<i16>,
    /// Post-action frame.
    pub frame: SensorFrame,
    /// Reward breakdown.
    pub reward: RewardComponents,
    /// The goal predicate held.
    pub goal_reached: bool,
    /// Substituted sensor reads and actuation failures during the step.
    pub faults: Vec<EnvError>,
}

/// Result of one `step`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: Observation,
    /// Scalar reward.
    pub reward: f32,
    /// The goal was reached.
    pub terminated: bool,
    /// The episode was cut short.
    pub truncated: bool,
    /// Diagnostics.
    pub info: StepInfo,
}

// ─── SeekEnv ────────────────────────────────────────────────────────────────

/// Target-seeking environment over a robot handle.
pub struct SeekEnv<R: Robot> {
    robot: R,
    config: EnvConfig,
    reader: SensorReader,
    scanner: PanScanner,
    encoder: StateEncoder,
    arbiter: ObstacleArbiter,
    executor: ActionExecutor,
    shaper: RewardShaper,
    episode: EpisodeState,
    connected: bool,
    /// Last pan angle the head was commanded to, `None` before the first reset.
    head_angle: Option<i16>,
    state: DiscreteState,
    observation: Option<Observation>,
    last_step: Option<StepInfo>,
    trace: EpisodeTrace,
}

impl<R: Robot> SeekEnv<R> {
    /// Build an environment, validating `config`. Nothing is sent to the
    /// robot until the first `reset`.
    pub fn new(robot: R, config: EnvConfig) -> Result<Self, EnvError> {
        config.validate()?;
        let encoder = StateEncoder::new(config.position_count(), config.buckets.clone());
        Ok(Self {
            reader: SensorReader::new(config.target_color),
            scanner: PanScanner::new(config.scan.clone(), config.target_color),
            state: encoder.not_visible(),
            encoder,
            arbiter: ObstacleArbiter::new(config.arbiter.clone()),
            executor: ActionExecutor::new(config.actions.clone()),
            shaper: RewardShaper::new(config.reward.clone(), config.bucket_count()),
            episode: EpisodeState {
                max_steps: config.max_steps,
                ..EpisodeState::default()
            },
            connected: false,
            head_angle: None,
            observation: None,
            last_step: None,
            trace: EpisodeTrace::default(),
            robot,
            config,
        })
    }

    // ── Accessors ──

    /// Configuration in use.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Episode bookkeeping.
    pub fn episode(&self) -> &EpisodeState {
        &self.episode
    }

    /// Trace of the current (or last) episode.
    pub fn trace(&self) -> &EpisodeTrace {
        &self.trace
    }

    /// The robot handle.
    pub fn robot(&self) -> &R {
        &self.robot
    }

    /// Mutable robot handle, for test scripting between steps.
    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// Give the robot back.
    pub fn into_robot(self) -> R {
        self.robot
    }

    /// Latest discrete state.
    pub fn state(&self) -> DiscreteState {
        self.state
    }

    /// Discrete state count, or the continuous vector length.
    pub fn observation_size(&self) -> usize {
        match self.config.observation {
            ObservationMode::Discrete => self.encoder.state_count(),
            ObservationMode::Continuous => CONTINUOUS_OBSERVATION_LEN,
        }
    }

    /// Size of the action space.
    pub fn num_actions(&self) -> usize {
        Action::COUNT
    }

    // ── Gym surface ──

    /// Start a new episode and return the initial observation.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo), EnvError> {
        let result = self.reset_inner(seed);
        self.note_connectivity(&result);
        result
    }

    /// Apply one action.
    pub fn step(&mut self, action_id: usize) -> Result<StepOutcome, EnvError> {
        let result = self.step_inner(action_id);
        self.note_connectivity(&result);
        result
    }

    /// One-line status summary.
    pub fn render(&self) -> String {
        if self.episode.status == EpisodeStatus::Idle {
            return String::from("[idle] call reset() to start an episode");
        }

        let mut out = String::new();
        let _ = write!(
            out,
            "[{}] step {}/{} | state {} ({})",
            status_name(self.episode.status),
            self.episode.step_count,
            self.episode.max_steps,
            self.state,
            self.describe_state(self.state),
        );
        if let Some(last) = &self.last_step {
            let action = match last.action_taken {
                Some(a) => a.name(),
                None => "avoid",
            };
            let _ = write!(
                out,
                " | action {} | risk {} | reward {:.2}",
                action,
                last.risk,
                last.reward.total()
            );
        }
        let _ = write!(out, " | total {:.2}", self.trace.total_reward);
        out
    }

    /// Release the session. A later `reset` reconnects.
    pub fn close(&mut self) -> Result<(), EnvError> {
        self.episode.status = EpisodeStatus::Idle;
        if self.connected {
            self.connected = false;
            self.robot.disconnect()?;
            info!("session closed");
        }
        Ok(())
    }

    // ── Internals ──

    fn reset_inner(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo), EnvError> {
        // a failed reset must not leave the previous episode steppable
        self.episode.status = EpisodeStatus::Idle;
        self.last_step = None;

        if !self.connected {
            self.robot.connect()?;
            self.connected = true;
            info!("session connected");
        }

        self.robot.reset_simulation()?;
        self.robot.settle(self.config.reset_settle)?;
        self.robot
            .move_head_tilt(self.config.head.tilt_angle, self.config.head.tilt_speed)?;
        self.robot
            .set_active_blob_detectors(&[self.config.target_color])?;
        self.scanner.recenter(&mut self.robot)?;
        self.head_angle = Some(self.config.scan.center_angle);

        let mut faults = Vec::new();
        let (scan, frame) = self.observe(&mut faults)?;
        let state = self.encoder.encode(&scan);
        let observation = self.observation_for(state, &frame);

        self.episode = EpisodeState {
            step_count: 0,
            max_steps: self.config.max_steps,
            status: EpisodeStatus::Running,
            terminal_bonus_paid: false,
        };
        self.state = state;
        self.observation = Some(observation);
        self.trace = EpisodeTrace::new(seed);
        self.trace.visit(state);
        if let Some(pose) = self.robot.pose() {
            self.trace.poses.push(pose);
        }

        info!(?seed, state = state.index(), found = scan.found, "episode reset");
        Ok((
            observation,
            ResetInfo {
                seed,
                state,
                scan,
                frame,
                faults,
            },
        ))
    }

    fn step_inner(&mut self, action_id: usize) -> Result<StepOutcome, EnvError> {
        match self.episode.status {
            EpisodeStatus::Idle => return Err(EnvError::NotReset),
            EpisodeStatus::Terminated | EpisodeStatus::Truncated => {
                return Err(EnvError::EpisodeOver {
                    steps: self.episode.step_count,
                })
            }
            EpisodeStatus::Running => {}
        }
        let requested = Action::try_from(action_id)?;

        self.episode.step_count += 1;
        let step = self.episode.step_count;
        let mut faults = Vec::new();

        let before = self
            .reader
            .read_frame(&mut self.robot, &mut faults)?
            .facing(self.facing_forward());
        let decision = self.arbiter.decide(&before);
        let overridden = decision.override_action;

        let actuation = if overridden {
            info!(step, risk = %decision.risk, requested = %requested, "avoidance override");
            self.config.maneuver.execute(&mut self.robot)
        } else {
            self.executor.execute(&mut self.robot, requested).map(|_| ())
        };

        if let Err(err) = actuation {
            if err.is_connectivity() {
                return Err(EnvError::from(err));
            }
            warn!(step, error = %err, "actuation failed, truncating episode");
            faults.push(EnvError::from(err));
            return Ok(self.finish_failed_step(requested, decision, before, faults));
        }

        let (scan, frame) = self.observe(&mut faults)?;
        let state = self.encoder.encode(&scan);
        let risk = self.arbiter.decide(&frame).risk;
        let mut reward = self.shaper.shape(state, &frame, risk);

        let goal_reached = self.goal_reached(&frame);
        let terminated = goal_reached;
        if terminated && !self.episode.terminal_bonus_paid {
            reward.terminal_bonus = self.config.reward.terminal_bonus;
            self.episode.terminal_bonus_paid = true;
        }
        let truncated = !terminated && step >= self.episode.max_steps;
        if truncated {
            reward.truncation_penalty = self.config.reward.truncation_penalty;
        }

        self.episode.status = if terminated {
            EpisodeStatus::Terminated
        } else if truncated {
            EpisodeStatus::Truncated
        } else {
            EpisodeStatus::Running
        };

        let total = reward.total();
        let pose = self.robot.pose();
        self.trace.record_step(state, total, overridden, pose);
        self.state = state;
        let observation = self.observation_for(state, &frame);
        self.observation = Some(observation);

        debug!(
            step,
            action = %requested,
            overridden,
            state = state.index(),
            risk = %risk,
            reward = total,
            "step"
        );
        if terminated {
            info!(step, total_reward = self.trace.total_reward, "goal reached");
        } else if truncated {
            info!(step, total_reward = self.trace.total_reward, "episode truncated at step limit");
        }

        let info = StepInfo {
            step,
            requested,
            action_taken: if overridden { None } else { Some(requested) },
            overridden,
            decision,
            risk,
            state,
            position: self.encoder.decompose(state),
            scan_angle: if scan.found {
                self.config.scan.angle(scan.position_index)
            } else {
                None
            },
            frame,
            reward,
            goal_reached,
            faults,
        };
        self.last_step = Some(info.clone());

        Ok(StepOutcome {
            observation,
            reward: total,
            terminated,
            truncated,
            info,
        })
    }

    /// A rejected drive or maneuver: keep the previous state, charge only the
    /// pre-action risk, and end the episode as truncated.
    fn finish_failed_step(
        &mut self,
        requested: Action,
        decision: ArbiterDecision,
        frame: SensorFrame,
        faults: Vec<EnvError>,
    ) -> StepOutcome {
        let step = self.episode.step_count;
        let reward = RewardComponents {
            risk_penalty: self.shaper.risk_penalty(decision.risk),
            ..RewardComponents::default()
        };
        let total = reward.total();
        self.episode.status = EpisodeStatus::Truncated;
        let pose = self.robot.pose();
        self.trace
            .record_step(self.state, total, decision.override_action, pose);

        let state = self.state;
        let observation = self
            .observation
            .unwrap_or_else(|| self.observation_for(state, &frame));
        let info = StepInfo {
            step,
            requested,
            action_taken: None,
            overridden: decision.override_action,
            decision,
            risk: decision.risk,
            state,
            position: self.encoder.decompose(state),
            scan_angle: None,
            frame,
            reward,
            goal_reached: false,
            faults,
        };
        self.last_step = Some(info.clone());

        StepOutcome {
            observation,
            reward: total,
            terminated: false,
            truncated: true,
            info,
        }
    }

    /// Sweep for the target, then read the front IR sensors. The frame is
    /// marked degraded if anything in the capture was substituted, and only
    /// counts as facing forward if the sweep stopped at the centre angle.
    fn observe(&mut self, faults: &mut Vec<EnvError>) -> Result<(ScanResult, SensorFrame), EnvError> {
        let before = faults.len();
        let scan = self.scanner.scan(&mut self.robot, faults)?;
        if scan.head_angle.is_some() {
            self.head_angle = scan.head_angle;
        }
        let (ir, _) = self.reader.read_ir(&mut self.robot, faults)?;
        let degraded = faults.len() > before;
        let frame = SensorFrame::from_parts(ir, scan.blob, degraded).facing(self.facing_forward());
        Ok((scan, frame))
    }

    fn facing_forward(&self) -> bool {
        self.head_angle == Some(self.config.scan.center_angle)
    }

    fn observation_for(&self, state: DiscreteState, frame: &SensorFrame) -> Observation {
        match self.config.observation {
            ObservationMode::Discrete => Observation::Discrete(state),
            ObservationMode::Continuous => Observation::Continuous(frame.observation_vector()),
        }
    }

    /// Target ahead, large enough, centred when required, and close on the
    /// front-centre IR sensor.
    fn goal_reached(&self, frame: &SensorFrame) -> bool {
        let goal = &self.config.goal;
        frame.target_ahead()
            && frame.blob_size > goal.min_blob_size
            && (!goal.require_centering || goal.center_band.contains(frame.blob_x))
            && frame.ir_front_center > goal.min_front_ir
    }

    fn describe_state(&self, state: DiscreteState) -> String {
        match self.encoder.decompose(state) {
            Some((p, d)) => {
                let angle = self.config.scan.angle(p).unwrap_or_default();
                format!("{angle}°, {}", self.encoder.buckets().label(d))
            }
            None => String::from("not visible"),
        }
    }

    fn note_connectivity<T>(&mut self, result: &Result<T, EnvError>) {
        if let Err(EnvError::Connectivity(reason)) = result {
            warn!(%reason, "session lost");
            self.connected = false;
        }
    }
}

fn status_name(status: EpisodeStatus) -> &'static str {
    match status {
        EpisodeStatus::Idle => "idle",
        EpisodeStatus::Running => "running",
        EpisodeStatus::Terminated => "terminated",
        EpisodeStatus::Truncated => "truncated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{Command, ScriptedRobot};
    use crate::robot::{Blob, BlobColor, RobotError};
    use core::time::Duration;

    fn env(robot: ScriptedRobot) -> SeekEnv<ScriptedRobot> {
        SeekEnv::new(robot, EnvConfig::tabular()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let cfg = EnvConfig {
            max_steps: 0,
            ..EnvConfig::tabular()
        };
        assert!(SeekEnv::new(ScriptedRobot::new(), cfg).is_err());
    }

    #[test]
    fn test_step_before_reset() {
        let mut e = env(ScriptedRobot::new());
        assert_eq!(e.step(0).unwrap_err(), EnvError::NotReset);
        assert!(e.robot().commands().is_empty());
    }

    #[test]
    fn test_reset_prepares_robot() {
        let mut e = env(ScriptedRobot::new().with_blob_at(0, Blob::new(10.0, 50.0)));
        let (obs, info) = e.reset(Some(3)).unwrap();

        assert_eq!(obs, Observation::Discrete(DiscreteState(2)));
        assert_eq!(info.seed, Some(3));
        assert!(info.scan.found);
        assert!(info.faults.is_empty());
        assert_eq!(e.episode().status, EpisodeStatus::Running);
        assert_eq!(e.episode().step_count, 0);

        let log = e.robot().commands();
        assert_eq!(log[0], Command::Connect);
        assert_eq!(log[1], Command::ResetSimulation);
        assert_eq!(log[2], Command::Settle { duration: Duration::from_secs(1) });
        assert_eq!(log[3], Command::Tilt { angle: 200, speed: 50 });
        assert_eq!(log[4], Command::ActiveBlobs(vec![BlobColor::Red]));
        assert_eq!(log[5], Command::Pan { angle: 0, speed: 100 });
    }

    #[test]
    fn test_connects_only_once() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        e.reset(None).unwrap();
        let connects = e
            .robot()
            .commands()
            .iter()
            .filter(|c| **c == Command::Connect)
            .count();
        assert_eq!(connects, 1);
    }

    #[test]
    fn test_failed_connect_propagates() {
        let mut e = env(ScriptedRobot::new().failing_connect(RobotError::disconnected("no sim")));
        let err = e.reset(None).unwrap_err();
        assert_eq!(err, EnvError::Connectivity("no sim".into()));
        assert_eq!(e.episode().status, EpisodeStatus::Idle);
    }

    #[test]
    fn test_failed_simulation_reset_propagates() {
        let mut e = env(ScriptedRobot::new().failing_reset(RobotError::rejected("sim busy")));
        let err = e.reset(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Actuation);
        // the session itself is fine, so the next reset does not reconnect
        assert!(e.robot().is_connected());
        assert_eq!(e.episode().status, EpisodeStatus::Idle);
        assert_eq!(e.step(0).unwrap_err(), EnvError::NotReset);
    }

    #[test]
    fn test_failed_reset_ends_previous_episode() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        e.step(1).unwrap();
        assert_eq!(e.episode().status, EpisodeStatus::Running);

        e.robot_mut().break_reset(RobotError::rejected("sim busy"));
        assert!(e.reset(None).is_err());
        assert_eq!(e.episode().status, EpisodeStatus::Idle);
        assert_eq!(e.step(1).unwrap_err(), EnvError::NotReset);
        assert!(e.render().starts_with("[idle]"));

        e.robot_mut().clear_failures();
        e.reset(None).unwrap();
        assert_eq!(e.episode().step_count, 0);
        assert!(e.step(1).is_ok());
    }

    #[test]
    fn test_rejected_pan_degrades_reset_frame() {
        let mut e = env(ScriptedRobot::new()
            .with_blob_at(45, Blob::new(10.0, 50.0))
            .failing_pan_at(30, RobotError::rejected("cable snag")));
        let (obs, info) = e.reset(None).unwrap();

        assert_eq!(info.faults.len(), 1);
        assert_eq!(info.faults[0].kind(), ErrorKind::Actuation);
        assert!(info.frame.degraded);
        // the sweep carries on past the bad angle
        assert_eq!(info.scan.position_index, 3);
        assert_eq!(obs, Observation::Discrete(DiscreteState(3 * 3 + 2)));
    }

    #[test]
    fn test_into_robot_returns_handle() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        e.close().unwrap();
        let robot = e.into_robot();
        assert!(!robot.is_connected());
        assert_eq!(robot.commands().last(), Some(&Command::Disconnect));
    }

    #[test]
    fn test_invalid_action_has_no_side_effects() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        let before = e.robot().commands().len();
        let err = e.step(6).unwrap_err();
        assert_eq!(err, EnvError::invalid_action(6, 6));
        assert_eq!(e.robot().commands().len(), before);
        assert_eq!(e.episode().step_count, 0);
    }

    #[test]
    fn test_observation_size() {
        let e = env(ScriptedRobot::new());
        assert_eq!(e.observation_size(), 40);
        assert_eq!(e.num_actions(), 6);
        let c = SeekEnv::new(ScriptedRobot::new(), EnvConfig::continuous()).unwrap();
        assert_eq!(c.observation_size(), 5);
    }

    #[test]
    fn test_render_reports_progress() {
        let mut e = env(ScriptedRobot::new().with_blob_at(15, Blob::new(22.0, 50.0)));
        assert!(e.render().starts_with("[idle]"));
        e.reset(None).unwrap();
        e.step(0).unwrap();
        let text = e.render();
        assert!(text.contains("step 1/50"), "{text}");
        assert!(text.contains("15°, medium"), "{text}");
        assert!(text.contains("action forward"), "{text}");
    }

    #[test]
    fn test_close_disconnects_and_idles() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        e.close().unwrap();
        assert!(!e.robot().is_connected());
        assert_eq!(e.step(0).unwrap_err(), EnvError::NotReset);
        e.reset(None).unwrap();
        assert!(e.robot().is_connected());
    }

    #[test]
    fn test_step_count_and_trace() {
        let mut e = env(ScriptedRobot::new());
        e.reset(None).unwrap();
        for _ in 0..3 {
            e.step(1).unwrap();
        }
        assert_eq!(e.episode().step_count, 3);
        assert_eq!(e.trace().steps, 3);
        // initial observation plus three steps, all not visible
        assert_eq!(e.trace().visits_of(DiscreteState(39)), 4);
        assert!((e.trace().total_reward + 15.0).abs() < 1e-5);
    }
}
