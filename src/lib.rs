//! # seekbot-core
//!
//! Perception-to-decision core for a target-seeking mobile robot, wrapped in
//! a gym-style reset/step environment for reinforcement-learning loops.
//!
//! ---
//!
//! ## What one step does
//!
//! A small wheeled robot with a pan/tilt camera head and three front infrared
//! sensors has to find a coloured target and drive up to it without hitting
//! anything else. Each step:
//!
//! 1. reads the IR sensors and blob detector where the head is pointing,
//! 2. lets the obstacle arbiter veto the learner's action with a fixed
//!    escape maneuver when something that is *not* the target is too close,
//! 3. runs the chosen wheel command,
//! 4. sweeps the head through a fixed angle list until the target shows up,
//! 5. encodes the sweep into a small discrete state (or a raw sensor vector),
//! 6. scores the result and checks whether the goal was reached.
//!
//! ## The pipeline
//!
//! ```text
//! Robot ─► SensorFrame ─► ObstacleArbiter ─► ActionExecutor | AvoidanceManeuver
//!                                                   │
//!   Observation ◄─ StateEncoder ◄─ PanScanner ◄─────┘
//!        │
//!        └─► RewardShaper ─► StepOutcome
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`robot`] | [`Actuation`], [`Sensing`], [`Session`], [`Robot`] | Capability traits a robot or simulator implements |
//! | [`sensors`] | [`SensorFrame`], [`SensorReader`] | Fused IR + blob snapshot with fail-open reads |
//! | [`scan`] | [`PanScanner`], [`ScanConfig`], [`ScanResult`] | Pan sweep; first angle with a blob wins |
//! | [`encoder`] | [`StateEncoder`], [`DistanceBuckets`], [`DiscreteState`] | `position × distance` state index, one reserved "not visible" value |
//! | [`arbiter`] | [`ObstacleArbiter`], [`RiskLevel`], [`AvoidanceManeuver`] | Risk classification and override decision |
//! | [`action`] | [`Action`], [`ActionTable`], [`ActionExecutor`] | Action id → wheel command lookup |
//! | [`reward`] | [`RewardShaper`], [`RewardConfig`], [`RewardComponents`] | Tabular or continuous reward with risk penalties |
//! | [`env`] | [`SeekEnv`], [`StepOutcome`], [`Observation`] | Episode controller: `reset` / `step` / `render` / `close` |
//! | [`trace`] | [`EpisodeTrace`] | Poses, state visits and reward per episode |
//! | [`config`] | [`EnvConfig`] | Every threshold and table, validated, with two presets |
//! | [`error`] | [`EnvError`], [`ErrorKind`] | Error taxonomy |
//! | [`mock`] | [`mock::ScriptedRobot`] | Deterministic in-process robot for tests and demos |
//!
//! ## Quick start
//!
//! ```rust
//! use seekbot_core::{EnvConfig, SeekEnv};
//! use seekbot_core::mock::ScriptedRobot;
//! use seekbot_core::robot::Blob;
//!
//! let robot = ScriptedRobot::new()
//!     .with_blob_at(0, Blob::new(40.0, 50.0))
//!     .with_proximity(150.0, 0.0, 0.0);
//! let mut env = SeekEnv::new(robot, EnvConfig::tabular()).unwrap();
//!
//! let (_obs, _info) = env.reset(Some(0)).unwrap();
//! let out = env.step(0).unwrap();
//! assert!(out.terminated);
//! ```
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `serde` | `Serialize`/`Deserialize` on configuration, observations and traces |
//! | `python-ffi` | PyO3 bindings in [`ffi`] (build with `maturin`) |
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber. Steps
//! log at `debug`, resets, goals, truncations and overrides at `info`, and
//! substituted sensor reads or rejected commands at `warn`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod action;
pub mod arbiter;
pub mod config;
pub mod encoder;
pub mod env;
pub mod error;
pub mod mock;
pub mod reward;
pub mod robot;
pub mod scan;
pub mod sensors;
pub mod trace;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use action::{Action, ActionExecutor, ActionTable, WheelCommand};
pub use arbiter::{
    ArbiterConfig, ArbiterDecision, AvoidanceManeuver, ObstacleArbiter, RiskLevel,
    VisibilitySuppression,
};
pub use config::{Band, EnvConfig, GoalConfig, HeadConfig, ObservationMode};
pub use encoder::{DiscreteState, DistanceBuckets, StateEncoder};
pub use env::{EpisodeState, EpisodeStatus, Observation, ResetInfo, SeekEnv, StepInfo, StepOutcome};
pub use error::{EnvError, ErrorKind, SensorId};
pub use reward::{
    ContinuousReward, RewardComponents, RewardConfig, RewardRegime, RewardShaper, RiskPenalty,
    TabularReward,
};
pub use robot::{Actuation, Blob, BlobColor, IrSensor, Pose, Robot, RobotError, Sensing, Session};
pub use scan::{PanScanner, ScanConfig, ScanResult};
pub use sensors::{SensorFrame, SensorReader};
pub use trace::EpisodeTrace;
