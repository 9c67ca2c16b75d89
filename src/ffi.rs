//! Python FFI bindings via PyO3.
//!
//! Exposes [`SeekEnv`] to a Python training loop. The robot stays on the
//! Python side: any object with the methods below can drive the environment.
//!
//! | Method | Arguments | Returns |
//! |---|---|---|
//! | `drive_wheels` | `left, right, seconds` | |
//! | `move_head_pan` | `angle, speed, blocking` | |
//! | `move_head_tilt` | `angle, speed` | |
//! | `read_proximity` | `"FrontC" \| "FrontL" \| "FrontR"` | number |
//! | `read_color_blob` | `"red" \| "green" \| "blue" \| "custom"` | object with `size`, `posx`, or `None` |
//! | `set_active_blob_detectors` | list of colour names | |
//! | `connect`, `disconnect`, `reset_simulation` | | |
//! | `wait` (optional) | `seconds` | |
//! | `get_pose` (optional) | | `(x, y)` |
//!
//! Exceptions raised by the robot map onto [`RobotError`]: `ConnectionError`
//! is a disconnect, `TimeoutError` a timeout, anything else a rejection.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from seekbot_core import SeekEnv
//!
//! env = SeekEnv(robot, preset="tabular")
//! state, info = env.reset(seed=0)
//! for _ in range(50):
//!     state, reward, terminated, truncated, info = env.step(agent.act(state))
//!     if terminated or truncated:
//!         break
//! print(env.render())
//! env.close()
//! ```

use std::time::Duration;

use pyo3::exceptions::{PyConnectionError, PyRuntimeError, PyTimeoutError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::action::Action;
use crate::arbiter::VisibilitySuppression;
use crate::config::EnvConfig;
use crate::env::{Observation, SeekEnv, StepInfo};
use crate::error::{EnvError, ErrorKind};
use crate::robot::{Actuation, Blob, BlobColor, IrSensor, Pose, RobotError, Sensing, Session};

// ── Robot bridge ─────────────────────────────────────────────────────────────

/// Adapts a duck-typed Python robot object to the capability traits.
struct PyRobot {
    obj: Py<PyAny>,
}

impl PyRobot {
    fn call(&self, method: &str, args: impl IntoPy<Py<pyo3::types::PyTuple>>) -> Result<PyObject, RobotError> {
        Python::with_gil(|py| {
            self.obj
                .call_method1(py, method, args)
                .map_err(|err| robot_error(py, method, err))
        })
    }

    fn has(&self, method: &str) -> bool {
        Python::with_gil(|py| self.obj.bind(py).hasattr(method).unwrap_or(false))
    }
}

fn robot_error(py: Python<'_>, method: &str, err: PyErr) -> RobotError {
    let reason = format!("{method}: {err}");
    if err.is_instance_of::<PyConnectionError>(py) {
        RobotError::Disconnected(reason)
    } else if err.is_instance_of::<PyTimeoutError>(py) {
        RobotError::Timeout(reason)
    } else {
        RobotError::Rejected(reason)
    }
}

impl Actuation for PyRobot {
    fn drive_wheels(&mut self, left: i16, right: i16, duration: Duration) -> Result<(), RobotError> {
        self.call("drive_wheels", (left, right, duration.as_secs_f64()))
            .map(drop)
    }

    fn move_head_pan(&mut self, angle_deg: i16, speed: u8, blocking: bool) -> Result<(), RobotError> {
        self.call("move_head_pan", (angle_deg, speed, blocking)).map(drop)
    }

    fn move_head_tilt(&mut self, angle_deg: i16, speed: u8) -> Result<(), RobotError> {
        self.call("move_head_tilt", (angle_deg, speed)).map(drop)
    }

    fn settle(&mut self, duration: Duration) -> Result<(), RobotError> {
        if self.has("wait") {
            return self.call("wait", (duration.as_secs_f64(),)).map(drop);
        }
        Python::with_gil(|py| py.allow_threads(|| std::thread::sleep(duration)));
        Ok(())
    }
}

impl Sensing for PyRobot {
    fn read_proximity(&mut self, sensor: IrSensor) -> Result<f32, RobotError> {
        let value = self.call("read_proximity", (sensor.label(),))?;
        Python::with_gil(|py| {
            value
                .extract::<f32>(py)
                .map_err(|err| robot_error(py, "read_proximity", err))
        })
    }

    fn read_color_blob(&mut self, color: BlobColor) -> Result<Blob, RobotError> {
        let value = self.call("read_color_blob", (color.name(),))?;
        Python::with_gil(|py| {
            let blob = value.bind(py);
            if blob.is_none() {
                return Ok(Blob::NONE);
            }
            let read = || -> PyResult<Blob> {
                Ok(Blob::new(
                    blob.getattr("size")?.extract()?,
                    blob.getattr("posx")?.extract()?,
                ))
            };
            read().map_err(|err| robot_error(py, "read_color_blob", err))
        })
    }

    fn set_active_blob_detectors(&mut self, colors: &[BlobColor]) -> Result<(), RobotError> {
        let names: Vec<&str> = colors.iter().map(BlobColor::name).collect();
        self.call("set_active_blob_detectors", (names,)).map(drop)
    }
}

impl Session for PyRobot {
    fn connect(&mut self) -> Result<(), RobotError> {
        self.call("connect", ()).map(drop)
    }

    fn disconnect(&mut self) -> Result<(), RobotError> {
        self.call("disconnect", ()).map(drop)
    }

    fn reset_simulation(&mut self) -> Result<(), RobotError> {
        self.call("reset_simulation", ()).map(drop)
    }

    fn pose(&mut self) -> Option<Pose> {
        if !self.has("get_pose") {
            return None;
        }
        let value = self.call("get_pose", ()).ok()?;
        Python::with_gil(|py| {
            value
                .extract::<(f32, f32)>(py)
                .ok()
                .map(|(x, y)| Pose { x, y })
        })
    }
}

// ── Conversions ──────────────────────────────────────────────────────────────

fn env_error(err: EnvError) -> PyErr {
    let msg = err.to_string();
    match err.kind() {
        ErrorKind::InvalidAction | ErrorKind::Config => PyValueError::new_err(msg),
        ErrorKind::Connectivity => PyConnectionError::new_err(msg),
        _ => PyRuntimeError::new_err(msg),
    }
}

fn parse_color(name: &str) -> PyResult<BlobColor> {
    match name.to_ascii_lowercase().as_str() {
        "red" => Ok(BlobColor::Red),
        "green" => Ok(BlobColor::Green),
        "blue" => Ok(BlobColor::Blue),
        "custom" => Ok(BlobColor::Custom),
        other => Err(PyValueError::new_err(format!("unknown target colour {other:?}"))),
    }
}

fn parse_suppression(name: &str) -> PyResult<VisibilitySuppression> {
    match name {
        "any" => Ok(VisibilitySuppression::AnyVisible),
        "centered" => Ok(VisibilitySuppression::CenteredOnly),
        "never" => Ok(VisibilitySuppression::Never),
        other => Err(PyValueError::new_err(format!(
            "suppression must be 'any', 'centered' or 'never', got {other:?}"
        ))),
    }
}

fn observation_to_py(py: Python<'_>, obs: &Observation) -> PyObject {
    match obs {
        Observation::Discrete(s) => s.index().into_py(py),
        Observation::Continuous(v) => v.to_vec().into_py(py),
    }
}

fn step_info_to_py(py: Python<'_>, info: &StepInfo) -> PyResult<PyObject> {
    let d = PyDict::new_bound(py);
    d.set_item("step", info.step)?;
    d.set_item("requested", info.requested.id())?;
    d.set_item("action_taken", info.action_taken.map(|a| a.id()))?;
    d.set_item("overridden", info.overridden)?;
    d.set_item("pre_action_risk", info.decision.risk.name())?;
    d.set_item("approaching_target", info.decision.approaching_target)?;
    d.set_item("risk", info.risk.name())?;
    d.set_item("state", info.state.index())?;
    d.set_item("scan_angle", info.scan_angle)?;
    d.set_item("blob_size", info.frame.blob_size)?;
    d.set_item("blob_x", info.frame.blob_x)?;
    d.set_item("target_ahead", info.frame.target_ahead())?;
    d.set_item("degraded", info.frame.degraded)?;
    d.set_item(
        "ir",
        vec![info.frame.ir_front_center, info.frame.ir_front_left, info.frame.ir_front_right],
    )?;
    d.set_item("reward_base", info.reward.base)?;
    d.set_item("terminal_bonus", info.reward.terminal_bonus)?;
    d.set_item("goal_reached", info.goal_reached)?;
    let faults: Vec<String> = info.faults.iter().map(ToString::to_string).collect();
    d.set_item("faults", faults)?;
    Ok(d.into_any().unbind())
}

// ── SeekEnv ──────────────────────────────────────────────────────────────────

/// Target-seeking environment over a Python robot object.
///
/// Args:
///     robot:       object implementing the robot protocol (see module docs)
///     preset:      "tabular" (discrete state, default) or "continuous"
///     max_steps:   override the preset's step limit
///     target:      target blob colour (default "red")
///     suppression: "any", "centered" (default) or "never"
#[pyclass(name = "SeekEnv")]
pub struct PySeekEnv {
    inner: SeekEnv<PyRobot>,
}

#[pymethods]
impl PySeekEnv {
    /// Create an environment. Nothing is sent to the robot until `reset`.
    #[new]
    #[pyo3(signature = (robot, preset="tabular", max_steps=None, target="red", suppression="centered"))]
    pub fn new(
        robot: Py<PyAny>,
        preset: &str,
        max_steps: Option<u32>,
        target: &str,
        suppression: &str,
    ) -> PyResult<Self> {
        let mut config = match preset {
            "tabular" => EnvConfig::tabular(),
            "continuous" => EnvConfig::continuous(),
            other => {
                return Err(PyValueError::new_err(format!(
                    "preset must be 'tabular' or 'continuous', got {other:?}"
                )))
            }
        };
        if let Some(n) = max_steps {
            config.max_steps = n;
        }
        config.target_color = parse_color(target)?;
        config.arbiter.suppression = parse_suppression(suppression)?;

        let inner = SeekEnv::new(PyRobot { obj: robot }, config).map_err(env_error)?;
        Ok(Self { inner })
    }

    /// Start an episode. Returns `(observation, info)`.
    #[pyo3(signature = (seed=None))]
    pub fn reset(&mut self, py: Python<'_>, seed: Option<u64>) -> PyResult<(PyObject, PyObject)> {
        let (obs, info) = self.inner.reset(seed).map_err(env_error)?;
        let d = PyDict::new_bound(py);
        d.set_item("seed", info.seed)?;
        d.set_item("state", info.state.index())?;
        d.set_item("found", info.scan.found)?;
        let faults: Vec<String> = info.faults.iter().map(ToString::to_string).collect();
        d.set_item("faults", faults)?;
        Ok((observation_to_py(py, &obs), d.into_any().unbind()))
    }

    /// Apply an action. Returns `(observation, reward, terminated, truncated, info)`.
    pub fn step(
        &mut self,
        py: Python<'_>,
        action: usize,
    ) -> PyResult<(PyObject, f32, bool, bool, PyObject)> {
        let out = self.inner.step(action).map_err(env_error)?;
        Ok((
            observation_to_py(py, &out.observation),
            out.reward,
            out.terminated,
            out.truncated,
            step_info_to_py(py, &out.info)?,
        ))
    }

    /// One-line status summary.
    pub fn render(&self) -> String {
        self.inner.render()
    }

    /// Disconnect from the robot.
    pub fn close(&mut self) -> PyResult<()> {
        self.inner.close().map_err(env_error)
    }

    /// Number of discrete states, or the continuous vector length.
    #[getter]
    pub fn observation_size(&self) -> usize {
        self.inner.observation_size()
    }

    /// Number of actions.
    #[getter]
    pub fn num_actions(&self) -> usize {
        self.inner.num_actions()
    }

    /// Steps taken in the current episode.
    #[getter]
    pub fn step_count(&self) -> u32 {
        self.inner.episode().step_count
    }

    /// Sum of rewards in the current episode.
    #[getter]
    pub fn total_reward(&self) -> f32 {
        self.inner.trace().total_reward
    }

    /// Poses recorded this episode as `[(x, y), ...]`.
    pub fn trajectory(&self) -> Vec<(f32, f32)> {
        self.inner.trace().poses.iter().map(|p| (p.x, p.y)).collect()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "SeekEnv(observation_size={}, num_actions={}, max_steps={})",
            self.inner.observation_size(),
            self.inner.num_actions(),
            self.inner.config().max_steps,
        )
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// seekbot-core Python bindings: a gym-style target-seeking environment.
#[pymodule]
pub fn seekbot_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySeekEnv>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("NUM_ACTIONS", Action::COUNT)?;
    m.add("ACTION_NAMES", Action::ALL.iter().map(Action::name).collect::<Vec<_>>())?;
    Ok(())
}
