//! Robot capability interfaces: the platform-independent seam between the
//! control core and a physical robot or simulator.
//!
//! The core never talks to a concrete robot handle. It is generic over three
//! capability sets:
//!
//! | Trait | Covers |
//! |---|---|
//! | [`Actuation`] | wheel drive, head pan/tilt, settle delays |
//! | [`Sensing`] | infrared proximity, colour-blob detection |
//! | [`Session`] | connect/disconnect, simulation reset, optional pose |
//!
//! Anything implementing all three is a [`Robot`] (blanket impl). The
//! in-process [`crate::mock::ScriptedRobot`] is the reference implementation
//! used by the test suite; the `python-ffi` feature bridges a Python robot
//! object onto the same traits.
//!
//! # Implementing for a new platform
//!
//! ```rust,ignore
//! use seekbot_core::robot::*;
//!
//! struct SerialBot { /* port handle */ }
//!
//! impl Actuation for SerialBot {
//!     fn drive_wheels(&mut self, left: i16, right: i16, duration: Duration) -> Result<(), RobotError> {
//!         // write the motor frame, block for `duration`
//!         Ok(())
//!     }
//!     // ...
//! }
//! ```

use core::fmt;
use core::time::Duration;

use thiserror::Error;

// ─── Identifiers ────────────────────────────────────────────────────────────

/// Front-facing infrared proximity sensors consulted by the core.
///
/// Readings grow as an object gets closer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrSensor {
    /// Front centre sensor.
    FrontCenter,
    /// Front left sensor.
    FrontLeft,
    /// Front right sensor.
    FrontRight,
}

impl IrSensor {
    /// All front sensors, in the order they are read into a frame.
    pub const FRONT: [IrSensor; 3] = [IrSensor::FrontCenter, IrSensor::FrontLeft, IrSensor::FrontRight];

    /// Short label used in logs and in the Python bridge.
    pub fn label(&self) -> &'static str {
        match self {
            IrSensor::FrontCenter => "FrontC",
            IrSensor::FrontLeft => "FrontL",
            IrSensor::FrontRight => "FrontR",
        }
    }
}

impl fmt::Display for IrSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Colours the on-board blob detector can track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlobColor {
    /// Red blobs (the default target colour).
    Red,
    /// Green blobs.
    Green,
    /// Blue blobs.
    Blue,
    /// User-trained custom colour.
    Custom,
}

impl BlobColor {
    /// Lower-case name used by the Python bridge.
    pub fn name(&self) -> &'static str {
        match self {
            BlobColor::Red => "red",
            BlobColor::Green => "green",
            BlobColor::Blue => "blue",
            BlobColor::Custom => "custom",
        }
    }
}

// ─── Readings ───────────────────────────────────────────────────────────────

/// One colour-blob detector reading.
///
/// `size` is the image coverage of the blob (0 when nothing is detected),
/// `pos_x` its horizontal centroid in camera coordinates `[0, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blob {
    /// Blob coverage; `0.0` means not detected.
    pub size: f32,
    /// Horizontal centroid in `[0, 100]`; meaningless when `size == 0`.
    pub pos_x: f32,
}

impl Blob {
    /// A reading with nothing detected.
    pub const NONE: Blob = Blob { size: 0.0, pos_x: 0.0 };

    /// Construct a reading.
    pub fn new(size: f32, pos_x: f32) -> Self {
        Self { size, pos_x }
    }

    /// Whether the detector reported a blob at all.
    pub fn present(&self) -> bool {
        self.size > 0.0
    }
}

/// Planar robot pose reported by a simulator, used for trajectory traces only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// X position in simulator units.
    pub x: f32,
    /// Y position in simulator units.
    pub y: f32,
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Failure reported by a robot or simulator backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RobotError {
    /// The session is not connected or the link dropped.
    #[error("robot disconnected: {0}")]
    Disconnected(String),
    /// A call did not answer in time.
    #[error("robot call timed out: {0}")]
    Timeout(String),
    /// The backend refused the command or returned garbage.
    #[error("robot rejected command: {0}")]
    Rejected(String),
}

impl RobotError {
    /// Creates a disconnection error.
    #[must_use]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected(reason.into())
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(reason: impl Into<String>) -> Self {
        Self::Timeout(reason.into())
    }

    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Whether this failure means the session itself is gone.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RobotError::Disconnected(_))
    }
}

// ─── Capability traits ──────────────────────────────────────────────────────

/// Motor-side capabilities.
pub trait Actuation {
    /// Drive both wheels at the given power levels for `duration`, blocking.
    fn drive_wheels(&mut self, left: i16, right: i16, duration: Duration) -> Result<(), RobotError>;

    /// Rotate the head pan to `angle_deg` at `speed`. When `blocking`, returns
    /// once the head has arrived.
    fn move_head_pan(&mut self, angle_deg: i16, speed: u8, blocking: bool) -> Result<(), RobotError>;

    /// Tilt the head to `angle_deg` at `speed`, blocking.
    fn move_head_tilt(&mut self, angle_deg: i16, speed: u8) -> Result<(), RobotError>;

    /// Hold still for `duration`. The default blocks the calling thread.
    fn settle(&mut self, duration: Duration) -> Result<(), RobotError> {
        std::thread::sleep(duration);
        Ok(())
    }
}

/// Sensor-side capabilities.
pub trait Sensing {
    /// Read one infrared proximity sensor.
    fn read_proximity(&mut self, sensor: IrSensor) -> Result<f32, RobotError>;

    /// Read the blob detector for `color` at the current head position.
    fn read_color_blob(&mut self, color: BlobColor) -> Result<Blob, RobotError>;

    /// Enable exactly the listed blob detectors.
    fn set_active_blob_detectors(&mut self, colors: &[BlobColor]) -> Result<(), RobotError>;
}

/// Session and simulation control.
pub trait Session {
    /// Open the link to the robot or simulator.
    fn connect(&mut self) -> Result<(), RobotError>;

    /// Close the link.
    fn disconnect(&mut self) -> Result<(), RobotError>;

    /// Restore the simulated world to its initial configuration.
    fn reset_simulation(&mut self) -> Result<(), RobotError>;

    /// Current robot pose, when the backend can report one.
    fn pose(&mut self) -> Option<Pose> {
        None
    }
}

/// A full robot handle: everything the episode controller needs.
pub trait Robot: Actuation + Sensing + Session {}

impl<T: Actuation + Sensing + Session + ?Sized> Robot for T {}

// Lending impls: `SeekEnv<&mut R>` leaves the caller owning the robot.

impl<T: Actuation + ?Sized> Actuation for &mut T {
    fn drive_wheels(&mut self, left: i16, right: i16, duration: Duration) -> Result<(), RobotError> {
        (**self).drive_wheels(left, right, duration)
    }

    fn move_head_pan(&mut self, angle_deg: i16, speed: u8, blocking: bool) -> Result<(), RobotError> {
        (**self).move_head_pan(angle_deg, speed, blocking)
    }

    fn move_head_tilt(&mut self, angle_deg: i16, speed: u8) -> Result<(), RobotError> {
        (**self).move_head_tilt(angle_deg, speed)
    }

    fn settle(&mut self, duration: Duration) -> Result<(), RobotError> {
        (**self).settle(duration)
    }
}

impl<T: Sensing + ?Sized> Sensing for &mut T {
    fn read_proximity(&mut self, sensor: IrSensor) -> Result<f32, RobotError> {
        (**self).read_proximity(sensor)
    }

    fn read_color_blob(&mut self, color: BlobColor) -> Result<Blob, RobotError> {
        (**self).read_color_blob(color)
    }

    fn set_active_blob_detectors(&mut self, colors: &[BlobColor]) -> Result<(), RobotError> {
        (**self).set_active_blob_detectors(colors)
    }
}

impl<T: Session + ?Sized> Session for &mut T {
    fn connect(&mut self) -> Result<(), RobotError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), RobotError> {
        (**self).disconnect()
    }

    fn reset_simulation(&mut self) -> Result<(), RobotError> {
        (**self).reset_simulation()
    }

    fn pose(&mut self) -> Option<Pose> {
        (**self).pose()
    }
}
