//! Discrete movement primitives and the wheel commands they map to.
//!
//! The mapping is a static lookup table, not computed: each [`Action`] is one
//! fixed `(left power, right power, duration)` triple in the [`ActionTable`].
//! Action ids outside `[0, Action::COUNT)` are rejected, never clamped.

use core::fmt;
use core::time::Duration;

use crate::error::EnvError;
use crate::robot::{Actuation, RobotError};

// ─── WheelCommand ───────────────────────────────────────────────────────────

/// One timed differential-drive command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelCommand {
    /// Left wheel power (negative reverses).
    pub left: i16,
    /// Right wheel power (negative reverses).
    pub right: i16,
    /// How long the command runs.
    pub duration: Duration,
}

impl WheelCommand {
    /// Construct a command running for `secs` seconds.
    pub const fn secs(left: i16, right: i16, secs: u64) -> Self {
        Self {
            left,
            right,
            duration: Duration::from_secs(secs),
        }
    }

    /// Construct a command running for `millis` milliseconds.
    pub const fn millis(left: i16, right: i16, millis: u64) -> Self {
        Self {
            left,
            right,
            duration: Duration::from_millis(millis),
        }
    }

    /// Send the command and block until it completes.
    pub fn run<A: Actuation + ?Sized>(&self, robot: &mut A) -> Result<(), RobotError> {
        robot.drive_wheels(self.left, self.right, self.duration)
    }
}

// ─── Action ─────────────────────────────────────────────────────────────────

/// Movement primitives available to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Drive straight ahead.
    Forward,
    /// Gentle left turn.
    TurnLeftSoft,
    /// Gentle right turn.
    TurnRightSoft,
    /// Sharp left turn.
    TurnLeftHard,
    /// Sharp right turn.
    TurnRightHard,
    /// Turn around in place.
    Spin180,
}

impl Action {
    /// Size of the action space.
    pub const COUNT: usize = 6;

    /// Every action, ordered by id.
    pub const ALL: [Action; Action::COUNT] = [
        Action::Forward,
        Action::TurnLeftSoft,
        Action::TurnRightSoft,
        Action::TurnLeftHard,
        Action::TurnRightHard,
        Action::Spin180,
    ];

    /// Integer id used by the learner.
    pub fn id(&self) -> usize {
        *self as usize
    }

    /// Short name for logs and rendering.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Forward => "forward",
            Action::TurnLeftSoft => "left-soft",
            Action::TurnRightSoft => "right-soft",
            Action::TurnLeftHard => "left-hard",
            Action::TurnRightHard => "right-hard",
            Action::Spin180 => "spin-180",
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = EnvError;

    fn try_from(id: usize) -> Result<Self, Self::Error> {
        Action::ALL
            .get(id)
            .copied()
            .ok_or(EnvError::invalid_action(id, Action::COUNT))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── ActionTable ────────────────────────────────────────────────────────────

/// Action → wheel command lookup table, indexed by [`Action::id`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionTable {
    /// One command per action, in id order.
    pub commands: [WheelCommand; Action::COUNT],
}

impl ActionTable {
    /// Short, fast motions with proportional turns, for the continuous preset.
    pub fn fine_grained() -> Self {
        Self {
            commands: [
                WheelCommand::secs(10, 10, 1),
                WheelCommand::secs(5, 10, 1),
                WheelCommand::secs(10, 5, 1),
                WheelCommand::secs(0, 10, 1),
                WheelCommand::secs(10, 0, 1),
                WheelCommand::secs(10, -10, 2),
            ],
        }
    }

    /// Command for `action`.
    pub fn command(&self, action: Action) -> WheelCommand {
        self.commands[action.id()]
    }

    /// Every command must run for a non-zero time.
    pub fn validate(&self) -> Result<(), EnvError> {
        for action in Action::ALL {
            if self.command(action).duration.is_zero() {
                return Err(EnvError::invalid_config(format!(
                    "action {action} has a zero duration"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            commands: [
                WheelCommand::secs(5, 5, 2),
                WheelCommand::secs(0, 5, 2),
                WheelCommand::secs(5, 0, 2),
                WheelCommand::secs(0, 5, 4),
                WheelCommand::secs(5, 0, 4),
                WheelCommand::secs(10, -10, 3),
            ],
        }
    }
}

// ─── ActionExecutor ─────────────────────────────────────────────────────────

/// Dispatches agent actions to the wheels.
#[derive(Clone, Debug)]
pub struct ActionExecutor {
    table: ActionTable,
}

impl ActionExecutor {
    /// Executor over `table`.
    pub fn new(table: ActionTable) -> Self {
        Self { table }
    }

    /// The lookup table.
    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Run the wheel command for `action`, returning what was sent.
    pub fn execute<A: Actuation + ?Sized>(
        &self,
        robot: &mut A,
        action: Action,
    ) -> Result<WheelCommand, RobotError> {
        let cmd = self.table.command(action);
        cmd.run(robot)?;
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::ScriptedRobot;

    #[test]
    fn test_ids_round_trip() {
        for (i, a) in Action::ALL.iter().enumerate() {
            assert_eq!(a.id(), i);
            assert_eq!(Action::try_from(i).unwrap(), *a);
        }
    }

    #[test]
    fn test_out_of_range_id_is_rejected() {
        let err = Action::try_from(6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAction);
        assert_eq!(err, EnvError::invalid_action(6, 6));
        assert!(Action::try_from(usize::MAX).is_err());
    }

    #[test]
    fn test_default_table() {
        let t = ActionTable::default();
        assert_eq!(t.command(Action::Forward), WheelCommand::secs(5, 5, 2));
        assert_eq!(t.command(Action::TurnLeftHard), WheelCommand::secs(0, 5, 4));
        assert_eq!(t.command(Action::Spin180), WheelCommand::secs(10, -10, 3));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut t = ActionTable::default();
        t.commands[2] = WheelCommand::millis(5, 0, 0);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_execute_drives_wheels() {
        let mut robot = ScriptedRobot::new();
        let exec = ActionExecutor::new(ActionTable::default());
        let sent = exec.execute(&mut robot, Action::TurnRightSoft).unwrap();
        assert_eq!(sent, WheelCommand::secs(5, 0, 2));
        assert_eq!(robot.drives(), vec![WheelCommand::secs(5, 0, 2)]);
    }
}
