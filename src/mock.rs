//! In-process scripted robot.
//!
//! [`ScriptedRobot`] implements every capability trait without hardware or a
//! simulator. The world is a lookup table: a target blob per pan angle and a
//! fixed set of IR readings. Every accepted command is appended to a log so a
//! test can assert exactly what the core asked the robot to do. `settle` does
//! not sleep.
//!
//! ```rust
//! use seekbot_core::mock::ScriptedRobot;
//! use seekbot_core::robot::{Blob, BlobColor, Sensing, Actuation};
//!
//! let mut robot = ScriptedRobot::new().with_blob_at(30, Blob::new(12.0, 40.0));
//! robot.move_head_pan(30, 100, true).unwrap();
//! assert_eq!(robot.read_color_blob(BlobColor::Red).unwrap().size, 12.0);
//! ```

use core::time::Duration;

use hashbrown::HashMap;

use crate::action::WheelCommand;
use crate::robot::{Actuation, Blob, BlobColor, IrSensor, Pose, RobotError, Sensing, Session};

/// One accepted command, in the order it was received.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `drive_wheels`.
    Drive {
        /// Left power.
        left: i16,
        /// Right power.
        right: i16,
        /// Duration.
        duration: Duration,
    },
    /// `move_head_pan`.
    Pan {
        /// Target angle.
        angle: i16,
        /// Speed.
        speed: u8,
    },
    /// `move_head_tilt`.
    Tilt {
        /// Target angle.
        angle: i16,
        /// Speed.
        speed: u8,
    },
    /// `settle`.
    Settle {
        /// Requested pause.
        duration: Duration,
    },
    /// `set_active_blob_detectors`.
    ActiveBlobs(Vec<BlobColor>),
    /// `connect`.
    Connect,
    /// `disconnect`.
    Disconnect,
    /// `reset_simulation`.
    ResetSimulation,
}

/// Per-capability failure injection. `None` means the call succeeds.
#[derive(Clone, Debug, Default)]
struct Faults {
    drive: Option<RobotError>,
    pan: Option<RobotError>,
    pan_at: HashMap<i16, RobotError>,
    proximity: Option<RobotError>,
    blob: Option<RobotError>,
    connect: Option<RobotError>,
    reset: Option<RobotError>,
}

/// Deterministic robot double.
#[derive(Clone, Debug)]
pub struct ScriptedRobot {
    blob_color: BlobColor,
    blobs: HashMap<i16, Blob>,
    proximity: [f32; 3],
    pan: i16,
    tilt: i16,
    active: Option<Vec<BlobColor>>,
    connected: bool,
    pose: Option<Pose>,
    size_gain: f32,
    ir_gain: f32,
    faults: Faults,
    log: Vec<Command>,
}

impl Default for ScriptedRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRobot {
    /// Empty world: no target anywhere, all IR readings zero, head at 0°.
    pub fn new() -> Self {
        Self {
            blob_color: BlobColor::Red,
            blobs: HashMap::new(),
            proximity: [0.0; 3],
            pan: 0,
            tilt: 0,
            active: None,
            connected: false,
            pose: None,
            size_gain: 0.0,
            ir_gain: 0.0,
            faults: Faults::default(),
            log: Vec::new(),
        }
    }

    // ── Builders ──

    /// Place the target so it is seen with `blob` when the head is at `angle`.
    pub fn with_blob_at(mut self, angle: i16, blob: Blob) -> Self {
        self.blobs.insert(angle, blob);
        self
    }

    /// Colour of the scripted target (red by default).
    pub fn with_blob_color(mut self, color: BlobColor) -> Self {
        self.blob_color = color;
        self
    }

    /// Front IR readings `(center, left, right)`.
    pub fn with_proximity(mut self, center: f32, left: f32, right: f32) -> Self {
        self.proximity = [center, left, right];
        self
    }

    /// Report poses, starting at `start`.
    pub fn with_pose(mut self, start: Pose) -> Self {
        self.pose = Some(start);
        self
    }

    /// Each forward drive grows every blob by `size_gain` and the front-centre
    /// IR reading by `ir_gain`, as if the robot had closed in on the target.
    pub fn with_approach(mut self, size_gain: f32, ir_gain: f32) -> Self {
        self.size_gain = size_gain;
        self.ir_gain = ir_gain;
        self
    }

    /// Every `drive_wheels` call fails with `err`.
    pub fn failing_drive(mut self, err: RobotError) -> Self {
        self.faults.drive = Some(err);
        self
    }

    /// Every `move_head_pan` call fails with `err`.
    pub fn failing_pan(mut self, err: RobotError) -> Self {
        self.faults.pan = Some(err);
        self
    }

    /// `move_head_pan` to `angle` fails with `err`; other angles succeed.
    pub fn failing_pan_at(mut self, angle: i16, err: RobotError) -> Self {
        self.faults.pan_at.insert(angle, err);
        self
    }

    /// Every `read_proximity` call fails with `err`.
    pub fn failing_proximity(mut self, err: RobotError) -> Self {
        self.faults.proximity = Some(err);
        self
    }

    /// Every `read_color_blob` call fails with `err`.
    pub fn failing_blob(mut self, err: RobotError) -> Self {
        self.faults.blob = Some(err);
        self
    }

    /// Every `connect` call fails with `err`.
    pub fn failing_connect(mut self, err: RobotError) -> Self {
        self.faults.connect = Some(err);
        self
    }

    /// Every `reset_simulation` call fails with `err`.
    pub fn failing_reset(mut self, err: RobotError) -> Self {
        self.faults.reset = Some(err);
        self
    }

    // ── Mid-test mutation ──

    /// Replace the IR readings.
    pub fn set_proximity(&mut self, center: f32, left: f32, right: f32) {
        self.proximity = [center, left, right];
    }

    /// Remove the target from every angle.
    pub fn clear_blobs(&mut self) {
        self.blobs.clear();
    }

    /// Make every later `reset_simulation` call fail with `err`.
    pub fn break_reset(&mut self, err: RobotError) {
        self.faults.reset = Some(err);
    }

    /// Stop injecting failures.
    pub fn clear_failures(&mut self) {
        self.faults = Faults::default();
    }

    // ── Inspection ──

    /// Current head pan angle.
    pub fn pan_angle(&self) -> i16 {
        self.pan
    }

    /// Current head tilt angle.
    pub fn tilt_angle(&self) -> i16 {
        self.tilt
    }

    /// Whether `connect` has succeeded without a later `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Every accepted command, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.log
    }

    /// Accepted drive commands, oldest first.
    pub fn drives(&self) -> Vec<WheelCommand> {
        self.log
            .iter()
            .filter_map(|c| match *c {
                Command::Drive {
                    left,
                    right,
                    duration,
                } => Some(WheelCommand {
                    left,
                    right,
                    duration,
                }),
                _ => None,
            })
            .collect()
    }

    /// Forget the command log.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn check(fault: &Option<RobotError>) -> Result<(), RobotError> {
        match fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Actuation for ScriptedRobot {
    fn drive_wheels(&mut self, left: i16, right: i16, duration: Duration) -> Result<(), RobotError> {
        Self::check(&self.faults.drive)?;
        if left > 0 && right > 0 {
            for blob in self.blobs.values_mut() {
                blob.size += self.size_gain;
            }
            self.proximity[0] += self.ir_gain;
        }
        if let Some(pose) = self.pose.as_mut() {
            pose.y += (f32::from(left) + f32::from(right)) * 0.5 * duration.as_secs_f32();
        }
        self.log.push(Command::Drive {
            left,
            right,
            duration,
        });
        Ok(())
    }

    fn move_head_pan(&mut self, angle_deg: i16, speed: u8, _blocking: bool) -> Result<(), RobotError> {
        Self::check(&self.faults.pan)?;
        if let Some(err) = self.faults.pan_at.get(&angle_deg) {
            return Err(err.clone());
        }
        self.pan = angle_deg;
        self.log.push(Command::Pan {
            angle: angle_deg,
            speed,
        });
        Ok(())
    }

    fn move_head_tilt(&mut self, angle_deg: i16, speed: u8) -> Result<(), RobotError> {
        self.tilt = angle_deg;
        self.log.push(Command::Tilt {
            angle: angle_deg,
            speed,
        });
        Ok(())
    }

    fn settle(&mut self, duration: Duration) -> Result<(), RobotError> {
        self.log.push(Command::Settle { duration });
        Ok(())
    }
}

impl Sensing for ScriptedRobot {
    fn read_proximity(&mut self, sensor: IrSensor) -> Result<f32, RobotError> {
        Self::check(&self.faults.proximity)?;
        Ok(match sensor {
            IrSensor::FrontCenter => self.proximity[0],
            IrSensor::FrontLeft => self.proximity[1],
            IrSensor::FrontRight => self.proximity[2],
        })
    }

    fn read_color_blob(&mut self, color: BlobColor) -> Result<Blob, RobotError> {
        Self::check(&self.faults.blob)?;
        let enabled = self.active.as_ref().map_or(true, |a| a.contains(&color));
        if color != self.blob_color || !enabled {
            return Ok(Blob::NONE);
        }
        Ok(self.blobs.get(&self.pan).copied().unwrap_or(Blob::NONE))
    }

    fn set_active_blob_detectors(&mut self, colors: &[BlobColor]) -> Result<(), RobotError> {
        self.active = Some(colors.to_vec());
        self.log.push(Command::ActiveBlobs(colors.to_vec()));
        Ok(())
    }
}

impl Session for ScriptedRobot {
    fn connect(&mut self) -> Result<(), RobotError> {
        Self::check(&self.faults.connect)?;
        self.connected = true;
        self.log.push(Command::Connect);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), RobotError> {
        self.connected = false;
        self.log.push(Command::Disconnect);
        Ok(())
    }

    fn reset_simulation(&mut self) -> Result<(), RobotError> {
        Self::check(&self.faults.reset)?;
        self.log.push(Command::ResetSimulation);
        Ok(())
    }

    fn pose(&mut self) -> Option<Pose> {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_follows_pan_angle() {
        let mut r = ScriptedRobot::new().with_blob_at(45, Blob::new(10.0, 50.0));
        assert_eq!(r.read_color_blob(BlobColor::Red).unwrap(), Blob::NONE);
        r.move_head_pan(45, 100, true).unwrap();
        assert_eq!(r.read_color_blob(BlobColor::Red).unwrap().size, 10.0);
        assert_eq!(r.read_color_blob(BlobColor::Blue).unwrap(), Blob::NONE);
    }

    #[test]
    fn test_target_colour_is_configurable() {
        let mut r = ScriptedRobot::new()
            .with_blob_color(BlobColor::Green)
            .with_blob_at(0, Blob::new(10.0, 50.0));
        assert_eq!(r.read_color_blob(BlobColor::Red).unwrap(), Blob::NONE);
        assert_eq!(r.read_color_blob(BlobColor::Green).unwrap().size, 10.0);
    }

    #[test]
    fn test_pan_fails_only_at_scripted_angle() {
        let mut r = ScriptedRobot::new().failing_pan_at(30, RobotError::rejected("limit"));
        r.move_head_pan(15, 100, true).unwrap();
        assert!(r.move_head_pan(30, 100, true).is_err());
        assert_eq!(r.pan_angle(), 15);
        r.move_head_pan(45, 100, true).unwrap();
        assert_eq!(r.pan_angle(), 45);
    }

    #[test]
    fn test_inactive_detector_sees_nothing() {
        let mut r = ScriptedRobot::new().with_blob_at(0, Blob::new(10.0, 50.0));
        r.set_active_blob_detectors(&[BlobColor::Green]).unwrap();
        assert_eq!(r.read_color_blob(BlobColor::Red).unwrap(), Blob::NONE);
    }

    #[test]
    fn test_approach_grows_target() {
        let mut r = ScriptedRobot::new()
            .with_blob_at(0, Blob::new(10.0, 50.0))
            .with_approach(5.0, 20.0);
        r.drive_wheels(5, 5, Duration::from_secs(1)).unwrap();
        r.drive_wheels(0, 5, Duration::from_secs(1)).unwrap();
        assert_eq!(r.read_color_blob(BlobColor::Red).unwrap().size, 15.0);
        assert_eq!(r.read_proximity(IrSensor::FrontCenter).unwrap(), 20.0);
    }

    #[test]
    fn test_failed_commands_are_not_logged() {
        let mut r = ScriptedRobot::new().failing_pan(RobotError::timeout("servo"));
        assert!(r.move_head_pan(30, 100, true).is_err());
        assert_eq!(r.pan_angle(), 0);
        assert!(r.commands().is_empty());
        r.clear_failures();
        r.move_head_pan(30, 100, true).unwrap();
        assert_eq!(r.commands(), &[Command::Pan { angle: 30, speed: 100 }]);
    }

    #[test]
    fn test_pose_advances_on_forward_drive() {
        let mut r = ScriptedRobot::new().with_pose(Pose::default());
        r.drive_wheels(10, 10, Duration::from_secs(2)).unwrap();
        assert_eq!(r.pose(), Some(Pose { x: 0.0, y: 20.0 }));
    }
}
