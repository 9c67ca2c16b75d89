//! Per-episode trajectory record.
//!
//! The controller appends to an [`EpisodeTrace`] on every step and clears it
//! on reset. A training script can pull it after an episode to plot the path
//! the robot took or to check how evenly the state space was explored.

use hashbrown::HashMap;

use crate::encoder::DiscreteState;
use crate::robot::Pose;

/// What happened during one episode.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeTrace {
    /// Seed passed to `reset`, if any.
    pub seed: Option<u64>,
    /// Robot poses, one per step, when the session reports them.
    pub poses: Vec<Pose>,
    /// Visit count per discrete state.
    pub visits: HashMap<u32, u32>,
    /// Sum of step rewards.
    pub total_reward: f32,
    /// Steps on which the avoidance maneuver replaced the requested action.
    pub overrides: u32,
    /// Steps recorded.
    pub steps: u32,
}

impl EpisodeTrace {
    /// Fresh trace for an episode started with `seed`.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Count one visit to `state`.
    pub fn visit(&mut self, state: DiscreteState) {
        *self.visits.entry(state.index()).or_insert(0) += 1;
    }

    /// Record one completed step.
    pub fn record_step(&mut self, state: DiscreteState, reward: f32, overridden: bool, pose: Option<Pose>) {
        self.visit(state);
        self.total_reward += reward;
        self.steps += 1;
        if overridden {
            self.overrides += 1;
        }
        if let Some(p) = pose {
            self.poses.push(p);
        }
    }

    /// Visits recorded for `state`.
    pub fn visits_of(&self, state: DiscreteState) -> u32 {
        self.visits.get(&state.index()).copied().unwrap_or(0)
    }

    /// Number of distinct states seen.
    pub fn distinct_states(&self) -> usize {
        self.visits.len()
    }

    /// Most visited state, ties broken by lowest index.
    pub fn most_visited(&self) -> Option<(DiscreteState, u32)> {
        self.visits
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&s, &n)| (DiscreteState(s), n))
    }
}
