//! Error types for the control core.
//!
//! Four failure kinds matter to a training loop and are kept distinct:
//!
//! | Kind | Raised by | Handling inside the core |
//! |---|---|---|
//! | [`ErrorKind::Connectivity`] | session gone at `reset`/`step` | propagated; episode cannot proceed |
//! | [`ErrorKind::SensorRead`] | a single proximity or blob read | substituted with a safe default, reported in step info |
//! | [`ErrorKind::InvalidAction`] | action id out of range | step fails immediately, nothing executed |
//! | [`ErrorKind::Actuation`] | drive or maneuver rejected | step completes penalty-only and truncated, reported in step info |
//!
//! Configuration and episode-lifecycle misuse have their own variants.

use thiserror::Error;

use crate::robot::{IrSensor, RobotError};

/// Coarse classification of an [`EnvError`], for retry/skip/abort decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Session or simulator unreachable.
    Connectivity,
    /// A sensor read failed.
    SensorRead,
    /// Action id outside the declared range.
    InvalidAction,
    /// Drive command or maneuver rejected.
    Actuation,
    /// Configuration failed validation.
    Config,
    /// The episode controller was used out of order.
    Lifecycle,
}

/// Which sensor a failed read targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorId {
    /// An infrared proximity sensor.
    Proximity(IrSensor),
    /// The colour-blob detector.
    Blob,
}

impl core::fmt::Display for SensorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensorId::Proximity(ir) => write!(f, "ir {ir}"),
            SensorId::Blob => f.write_str("blob detector"),
        }
    }
}

/// Errors surfaced by the environment.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EnvError {
    /// Robot or simulator unreachable.
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// A single sensor read failed and was replaced with a safe default.
    #[error("sensor read failure on {sensor}: {reason}")]
    SensorRead {
        /// Sensor that failed.
        sensor: SensorId,
        /// Backend message.
        reason: String,
    },

    /// Action id outside `[0, num_actions)`.
    #[error("invalid action {action}: expected 0..{num_actions}")]
    InvalidAction {
        /// Offending action id.
        action: usize,
        /// Size of the action space.
        num_actions: usize,
    },

    /// A drive command or avoidance maneuver was rejected.
    #[error("actuation failure: {0}")]
    Actuation(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `step` called before the first `reset`.
    #[error("episode not started: call reset() first")]
    NotReset,

    /// `step` called after the episode terminated or truncated.
    #[error("episode already finished after {steps} steps: call reset() first")]
    EpisodeOver {
        /// Steps taken in the finished episode.
        steps: u32,
    },
}

impl EnvError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid action error.
    #[must_use]
    pub const fn invalid_action(action: usize, num_actions: usize) -> Self {
        Self::InvalidAction { action, num_actions }
    }

    /// Creates a sensor read error from a backend failure.
    #[must_use]
    pub fn sensor_read(sensor: SensorId, err: &RobotError) -> Self {
        Self::SensorRead {
            sensor,
            reason: err.to_string(),
        }
    }

    /// Classification for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnvError::Connectivity(_) => ErrorKind::Connectivity,
            EnvError::SensorRead { .. } => ErrorKind::SensorRead,
            EnvError::InvalidAction { .. } => ErrorKind::InvalidAction,
            EnvError::Actuation(_) => ErrorKind::Actuation,
            EnvError::InvalidConfig(_) => ErrorKind::Config,
            EnvError::NotReset | EnvError::EpisodeOver { .. } => ErrorKind::Lifecycle,
        }
    }
}

/// Backend failures on motor or session commands: disconnects become
/// connectivity failures, everything else an actuation failure.
impl From<RobotError> for EnvError {
    fn from(err: RobotError) -> Self {
        match err {
            RobotError::Disconnected(reason) => Self::Connectivity(reason),
            other => Self::Actuation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EnvError::invalid_action(9, 6);
        let msg = format!("{err}");
        assert!(msg.contains('9'));
        assert!(msg.contains("0..6"));
    }

    #[test]
    fn test_disconnect_maps_to_connectivity() {
        let err = EnvError::from(RobotError::disconnected("socket closed"));
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(format!("{err}").contains("socket closed"));
    }

    #[test]
    fn test_rejection_maps_to_actuation() {
        let err = EnvError::from(RobotError::rejected("wheel stalled"));
        assert_eq!(err.kind(), ErrorKind::Actuation);
        let err: EnvError = RobotError::timeout("no ack").into();
        assert_eq!(err.kind(), ErrorKind::Actuation);
    }

    #[test]
    fn test_sensor_read_names_the_sensor() {
        let err = EnvError::sensor_read(
            SensorId::Proximity(IrSensor::FrontLeft),
            &RobotError::timeout("stale"),
        );
        assert_eq!(err.kind(), ErrorKind::SensorRead);
        let msg = format!("{err}");
        assert!(msg.contains("FrontL"), "msg={msg}");
        assert!(msg.contains("stale"), "msg={msg}");
    }

    #[test]
    fn test_lifecycle_kinds() {
        assert_eq!(EnvError::NotReset.kind(), ErrorKind::Lifecycle);
        assert_eq!(EnvError::EpisodeOver { steps: 3 }.kind(), ErrorKind::Lifecycle);
    }
}
