//! Pan-sweep target search.
//!
//! The camera head is swept through a fixed, ordered list of pan angles. At
//! each angle the blob detector is queried; the **first** angle with a
//! non-zero blob wins. Scan order is therefore the tie-break: listing angles
//! outward from zero gives a centre-first bias.
//!
//! A scan is blocking and costs one actuation round-trip per angle visited.
//! It leaves the head where it stopped (the matching angle, or the last
//! angle when nothing was found); use [`PanScanner::recenter`] if the camera
//! must face forward afterwards.

use heapless::Vec as HVec;
use tracing::{debug, warn};

use crate::error::EnvError;
use crate::robot::{Actuation, Blob, BlobColor, Sensing};
use crate::sensors::SensorReader;

/// Maximum number of pan angles in a sweep.
pub const MAX_SCAN_ANGLES: usize = 32;

/// Default sweep: forward, then right side outward, then left side outward.
pub const DEFAULT_SCAN_ANGLES: [i16; 13] = [0, 15, 30, 45, 60, 75, 90, -15, -30, -45, -60, -75, -90];

// ─── ScanConfig ─────────────────────────────────────────────────────────────

/// Pan sweep configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanConfig {
    /// Ordered pan angles in degrees. Index in this list is the position index.
    pub angles: HVec<i16, MAX_SCAN_ANGLES>,
    /// Pan speed passed to the actuator.
    pub pan_speed: u8,
    /// Angle the head returns to on [`PanScanner::recenter`].
    pub center_angle: i16,
}

impl ScanConfig {
    /// Sweep over an explicit angle list.
    pub fn with_angles(angles: &[i16]) -> Result<Self, EnvError> {
        let angles = HVec::from_slice(angles).map_err(|_| {
            EnvError::invalid_config(format!(
                "scan supports at most {MAX_SCAN_ANGLES} angles, got {}",
                angles.len()
            ))
        })?;
        Ok(Self {
            angles,
            ..Self::default()
        })
    }

    /// A single forward-facing position: the camera never sweeps.
    pub fn forward_only() -> Self {
        let mut angles = HVec::new();
        // capacity is MAX_SCAN_ANGLES, one element always fits
        let _ = angles.push(0);
        Self {
            angles,
            ..Self::default()
        }
    }

    /// Number of positions `P`.
    pub fn position_count(&self) -> usize {
        self.angles.len()
    }

    /// Pan angle of position `index`.
    pub fn angle(&self, index: usize) -> Option<i16> {
        self.angles.get(index).copied()
    }

    /// Angle list must be non-empty, in range and free of duplicates.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.angles.is_empty() {
            return Err(EnvError::invalid_config("scan.angles must not be empty"));
        }
        for (i, a) in self.angles.iter().enumerate() {
            if !(-180..=180).contains(a) {
                return Err(EnvError::invalid_config(format!(
                    "scan angle {a} out of range [-180, 180]"
                )));
            }
            if self.angles[..i].contains(a) {
                return Err(EnvError::invalid_config(format!("duplicate scan angle {a}")));
            }
        }
        if self.pan_speed == 0 {
            return Err(EnvError::invalid_config("scan.pan_speed must be positive"));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            angles: HVec::from_slice(&DEFAULT_SCAN_ANGLES).unwrap_or_default(),
            pan_speed: 100,
            center_angle: 0,
        }
    }
}

// ─── ScanResult ─────────────────────────────────────────────────────────────

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    /// Whether any angle saw the target.
    pub found: bool,
    /// Index of the matching angle, or `P` when not found.
    pub position_index: usize,
    /// Blob reading at the matching angle ([`Blob::NONE`] when not found).
    pub blob: Blob,
    /// Angle the head was left at, `None` when every pan command failed.
    pub head_angle: Option<i16>,
}

impl ScanResult {
    /// "Not found" for a sweep over `positions` angles.
    pub fn not_found(positions: usize) -> Self {
        Self {
            found: false,
            position_index: positions,
            blob: Blob::NONE,
            head_angle: None,
        }
    }

    /// Target seen at `position_index`.
    pub fn found_at(position_index: usize, blob: Blob) -> Self {
        Self {
            found: true,
            position_index,
            blob,
            head_angle: None,
        }
    }

    /// Same result, with the head left at `angle`.
    pub fn with_head_angle(self, angle: Option<i16>) -> Self {
        Self {
            head_angle: angle,
            ..self
        }
    }

    /// Whether the head was left at `center_angle`, so the blob reading (if
    /// any) lies straight ahead of the robot.
    pub fn facing(&self, center_angle: i16) -> bool {
        self.head_angle == Some(center_angle)
    }
}

// ─── PanScanner ─────────────────────────────────────────────────────────────

/// Sweeps the head and queries the blob detector at each angle.
#[derive(Clone, Debug)]
pub struct PanScanner {
    config: ScanConfig,
    color: BlobColor,
}

impl PanScanner {
    /// Scanner for `color` over the configured angles.
    pub fn new(config: ScanConfig, color: BlobColor) -> Self {
        Self { config, color }
    }

    /// The sweep configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Sweep until the first detection.
    ///
    /// A rejected pan, a failed blob read or a non-finite blob reading counts
    /// as "nothing seen at this angle" and is recorded in `faults`. Only a
    /// disconnect aborts the sweep.
    pub fn scan<R: Actuation + Sensing + ?Sized>(
        &self,
        robot: &mut R,
        faults: &mut Vec<EnvError>,
    ) -> Result<ScanResult, EnvError> {
        let reader = SensorReader::new(self.color);
        let mut head_angle = None;
        for (index, &angle) in self.config.angles.iter().enumerate() {
            if let Err(err) = robot.move_head_pan(angle, self.config.pan_speed, true) {
                if err.is_connectivity() {
                    return Err(EnvError::from(err));
                }
                warn!(angle, error = %err, "pan command rejected, skipping angle");
                faults.push(EnvError::Actuation(format!("pan to {angle}: {err}")));
                continue;
            }
            head_angle = Some(angle);

            let (blob, _) = reader.read_blob(robot, faults)?;
            if blob.present() {
                debug!(index, angle, size = blob.size, pos_x = blob.pos_x, "target found");
                return Ok(ScanResult::found_at(index, blob).with_head_angle(head_angle));
            }
        }

        debug!("target not visible at any scan angle");
        Ok(ScanResult::not_found(self.config.position_count()).with_head_angle(head_angle))
    }

    /// Point the head back at the centre angle.
    pub fn recenter<A: Actuation + ?Sized>(&self, robot: &mut A) -> Result<(), EnvError> {
        robot
            .move_head_pan(self.config.center_angle, self.config.pan_speed, true)
            .map_err(EnvError::from)
    }
}
