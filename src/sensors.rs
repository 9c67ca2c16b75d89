//! Sensor frames: one fused snapshot of the three front IR sensors and the
//! target blob detector.
//!
//! Frames are captured fresh on every read and never cached across steps.
//!
//! # Fail-open reads
//!
//! A single failed proximity or blob read does not abort the step. The reader
//! substitutes a safe default (IR `0.0`, blob not visible), marks the frame
//! `degraded`, and records an [`EnvError::SensorRead`] in the caller's fault
//! list. Only a lost session ([`RobotError::Disconnected`]) propagates, as
//! [`EnvError::Connectivity`].
//!
//! [`RobotError::Disconnected`]: crate::robot::RobotError::Disconnected

use tracing::warn;

use crate::error::{EnvError, SensorId};
use crate::robot::{Blob, BlobColor, IrSensor, RobotError, Sensing};

/// Blob x-coordinate reported in observation vectors when nothing is visible.
pub const BLOB_X_UNSEEN: f32 = 50.0;

/// Upper bound on blob size in observation vectors.
pub const BLOB_SIZE_CAP: f32 = 100.0;

/// Fused reading of the front IR sensors and the target blob detector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorFrame {
    /// Front-centre proximity.
    pub ir_front_center: f32,
    /// Front-left proximity.
    pub ir_front_left: f32,
    /// Front-right proximity.
    pub ir_front_right: f32,
    /// Whether the target blob is visible.
    pub blob_present: bool,
    /// Blob horizontal position in `[0, 100]`.
    pub blob_x: f32,
    /// Blob size, `0.0` when not visible.
    pub blob_size: f32,
    /// At least one read in this frame failed and was substituted.
    pub degraded: bool,
    /// The blob was read with the head at its centre angle, so a visible
    /// blob lies in the robot's direction of travel.
    pub facing_forward: bool,
}

impl SensorFrame {
    /// Assemble a frame from IR readings `[center, left, right]` and a blob
    /// read with the head facing forward.
    pub fn from_parts(ir: [f32; 3], blob: Blob, degraded: bool) -> Self {
        Self {
            ir_front_center: ir[0],
            ir_front_left: ir[1],
            ir_front_right: ir[2],
            blob_present: blob.present(),
            blob_x: blob.pos_x,
            blob_size: blob.size.max(0.0),
            degraded,
            facing_forward: true,
        }
    }

    /// Same frame, with the head's heading during the blob read.
    pub fn facing(self, forward: bool) -> Self {
        Self {
            facing_forward: forward,
            ..self
        }
    }

    /// A blob is visible straight ahead.
    pub fn target_ahead(&self) -> bool {
        self.blob_present && self.facing_forward
    }

    /// The blob part of the frame.
    pub fn blob(&self) -> Blob {
        if self.blob_present {
            Blob::new(self.blob_size, self.blob_x)
        } else {
            Blob::NONE
        }
    }

    /// Largest of the three front IR readings.
    pub fn max_ir(&self) -> f32 {
        self.ir_front_center
            .max(self.ir_front_left)
            .max(self.ir_front_right)
    }

    /// `[blob_x, blob_size, ir_center, ir_left, ir_right]`, with `blob_x`
    /// pinned to the image centre when no blob is visible and `blob_size`
    /// capped at [`BLOB_SIZE_CAP`].
    pub fn observation_vector(&self) -> [f32; 5] {
        let blob_x = if self.blob_present { self.blob_x } else { BLOB_X_UNSEEN };
        [
            blob_x,
            self.blob_size.min(BLOB_SIZE_CAP),
            self.ir_front_center,
            self.ir_front_left,
            self.ir_front_right,
        ]
    }
}

/// Reads [`SensorFrame`]s for one target colour.
#[derive(Clone, Copy, Debug)]
pub struct SensorReader {
    color: BlobColor,
}

impl SensorReader {
    /// Reader tracking blobs of `color`.
    pub fn new(color: BlobColor) -> Self {
        Self { color }
    }

    /// Target colour.
    pub fn color(&self) -> BlobColor {
        self.color
    }

    /// Read all three front IR sensors and the blob detector at the current
    /// head position.
    pub fn read_frame<S: Sensing + ?Sized>(
        &self,
        robot: &mut S,
        faults: &mut Vec<EnvError>,
    ) -> Result<SensorFrame, EnvError> {
        let (ir, ir_degraded) = self.read_ir(robot, faults)?;
        let (blob, blob_degraded) = self.read_blob(robot, faults)?;
        Ok(SensorFrame::from_parts(ir, blob, ir_degraded || blob_degraded))
    }

    /// Read the front IR sensors as `[center, left, right]`. The flag is set
    /// when any reading was substituted.
    pub fn read_ir<S: Sensing + ?Sized>(
        &self,
        robot: &mut S,
        faults: &mut Vec<EnvError>,
    ) -> Result<([f32; 3], bool), EnvError> {
        let mut out = [0.0f32; 3];
        let mut degraded = false;
        for (slot, sensor) in out.iter_mut().zip(IrSensor::FRONT) {
            match robot.read_proximity(sensor) {
                Ok(v) if v.is_finite() => *slot = v.max(0.0),
                Ok(v) => {
                    warn!(%sensor, value = v, "non-finite proximity reading, treating as clear");
                    faults.push(EnvError::sensor_read(
                        SensorId::Proximity(sensor),
                        &RobotError::rejected("non-finite reading"),
                    ));
                    degraded = true;
                }
                Err(err) => {
                    fail_open(SensorId::Proximity(sensor), err, faults)?;
                    degraded = true;
                }
            }
        }
        Ok((out, degraded))
    }

    /// Read the target blob at the current head position.
    pub fn read_blob<S: Sensing + ?Sized>(
        &self,
        robot: &mut S,
        faults: &mut Vec<EnvError>,
    ) -> Result<(Blob, bool), EnvError> {
        match robot.read_color_blob(self.color) {
            Ok(blob) if blob.size.is_finite() && blob.pos_x.is_finite() => Ok((blob, false)),
            Ok(_) => {
                warn!("non-finite blob reading, treating target as not visible");
                faults.push(EnvError::sensor_read(
                    SensorId::Blob,
                    &RobotError::rejected("non-finite reading"),
                ));
                Ok((Blob::NONE, true))
            }
            Err(err) => {
                fail_open(SensorId::Blob, err, faults)?;
                Ok((Blob::NONE, true))
            }
        }
    }
}

/// Record a failed read, or propagate it if the session is gone.
pub(crate) fn fail_open(
    sensor: SensorId,
    err: RobotError,
    faults: &mut Vec<EnvError>,
) -> Result<(), EnvError> {
    if err.is_connectivity() {
        return Err(EnvError::from(err));
    }
    warn!(%sensor, error = %err, "sensor read failed, substituting safe default");
    faults.push(EnvError::sensor_read(sensor, &err));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::ScriptedRobot;

    #[test]
    fn test_frame_reads_all_sensors() {
        let mut robot = ScriptedRobot::new()
            .with_proximity(12.0, 40.0, 7.0)
            .with_blob_at(0, Blob::new(25.0, 48.0));
        let reader = SensorReader::new(BlobColor::Red);
        let mut faults = Vec::new();
        let frame = reader.read_frame(&mut robot, &mut faults).unwrap();

        assert!(faults.is_empty());
        assert!(!frame.degraded);
        assert_eq!(frame.ir_front_center, 12.0);
        assert_eq!(frame.ir_front_left, 40.0);
        assert_eq!(frame.ir_front_right, 7.0);
        assert!(frame.blob_present);
        assert_eq!(frame.blob_size, 25.0);
        assert_eq!(frame.max_ir(), 40.0);
    }

    #[test]
    fn test_failed_proximity_read_fails_open() {
        let mut robot = ScriptedRobot::new()
            .with_proximity(300.0, 300.0, 300.0)
            .failing_proximity(RobotError::timeout("no answer"));
        let reader = SensorReader::new(BlobColor::Red);
        let mut faults = Vec::new();
        let frame = reader.read_frame(&mut robot, &mut faults).unwrap();

        assert!(frame.degraded);
        assert_eq!(frame.max_ir(), 0.0);
        assert_eq!(faults.len(), 3);
        assert!(faults.iter().all(|f| f.kind() == ErrorKind::SensorRead));
    }

    #[test]
    fn test_failed_blob_read_means_not_visible() {
        let mut robot = ScriptedRobot::new()
            .with_blob_at(0, Blob::new(40.0, 50.0))
            .failing_blob(RobotError::rejected("camera busy"));
        let reader = SensorReader::new(BlobColor::Red);
        let mut faults = Vec::new();
        let frame = reader.read_frame(&mut robot, &mut faults).unwrap();

        assert!(!frame.blob_present);
        assert!(frame.degraded);
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn test_disconnect_propagates() {
        let mut robot = ScriptedRobot::new().failing_proximity(RobotError::disconnected("gone"));
        let reader = SensorReader::new(BlobColor::Red);
        let mut faults = Vec::new();
        let err = reader.read_frame(&mut robot, &mut faults).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn test_non_finite_blob_fails_open() {
        let mut robot = ScriptedRobot::new().with_blob_at(0, Blob::new(10.0, f32::NAN));
        let reader = SensorReader::new(BlobColor::Red);
        let mut faults = Vec::new();
        let frame = reader.read_frame(&mut robot, &mut faults).unwrap();

        assert_eq!(frame.blob(), Blob::NONE);
        assert!(frame.degraded);
        assert_eq!(faults[0].kind(), ErrorKind::SensorRead);
        assert!(frame.observation_vector().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_side_blob_is_not_ahead() {
        let frame = SensorFrame::from_parts([0.0; 3], Blob::new(20.0, 50.0), false);
        assert!(frame.target_ahead());
        assert_eq!(frame.blob(), Blob::new(20.0, 50.0));

        let side = frame.facing(false);
        assert!(!side.target_ahead());
        // the reading itself is kept for the observation
        assert_eq!(side.blob(), frame.blob());
    }

    #[test]
    fn test_observation_vector_pins_unseen_blob() {
        let frame = SensorFrame::from_parts([1.0, 2.0, 3.0], Blob::NONE, false);
        assert_eq!(frame.observation_vector(), [BLOB_X_UNSEEN, 0.0, 1.0, 2.0, 3.0]);

        let frame = SensorFrame::from_parts([0.0; 3], Blob::new(250.0, 30.0), false);
        let obs = frame.observation_vector();
        assert_eq!(obs[0], 30.0);
        assert_eq!(obs[1], BLOB_SIZE_CAP);
    }
}
