//! # Seek episodes against a scripted robot
//!
//! Runs a hand-written steering policy through three scripted worlds and
//! prints the environment's render line after every step:
//!
//! 1. target straight ahead, closing in on each forward drive,
//! 2. target off to the side, never reached before the step limit,
//! 3. wall on the left with no target in view, so the arbiter takes over.
//!
//! No hardware or simulator required.
//!
//! ## Running this example
//!
//! ```
//! cargo run --example seek_episode
//! ```

use seekbot_core::mock::ScriptedRobot;
use seekbot_core::robot::Blob;
use seekbot_core::{Action, EnvConfig, Observation, SeekEnv};

/// Steer toward the angle the target was last seen at.
fn policy(env: &SeekEnv<ScriptedRobot>, obs: &Observation) -> Action {
    let Some(state) = obs.discrete() else {
        return Action::Forward;
    };
    let buckets = env.config().bucket_count();
    let position = state.index() as usize / buckets;
    match env.config().scan.angle(position) {
        None => Action::Spin180,
        Some(0) => Action::Forward,
        Some(a) if a > 45 => Action::TurnRightHard,
        Some(a) if a > 0 => Action::TurnRightSoft,
        Some(a) if a < -45 => Action::TurnLeftHard,
        Some(_) => Action::TurnLeftSoft,
    }
}

fn run(name: &str, robot: ScriptedRobot, max_steps: u32) {
    println!("── {name} ──");
    let config = EnvConfig {
        max_steps,
        ..EnvConfig::tabular()
    };
    let mut env = match SeekEnv::new(robot, config) {
        Ok(env) => env,
        Err(err) => {
            println!("  config rejected: {err}");
            return;
        }
    };

    let (mut obs, _) = match env.reset(Some(0)) {
        Ok(r) => r,
        Err(err) => {
            println!("  reset failed: {err}");
            return;
        }
    };
    println!("  {}", env.render());

    loop {
        let action = policy(&env, &obs);
        let out = match env.step(action.id()) {
            Ok(out) => out,
            Err(err) => {
                println!("  step failed: {err}");
                break;
            }
        };
        println!("  {}", env.render());
        obs = out.observation;
        if out.terminated || out.truncated {
            break;
        }
    }

    let trace = env.trace();
    println!(
        "  done: {} steps, {} overrides, {} distinct states, total reward {:.2}\n",
        trace.steps,
        trace.overrides,
        trace.distinct_states(),
        trace.total_reward
    );
}

fn main() {
    run(
        "target ahead",
        ScriptedRobot::new()
            .with_blob_at(0, Blob::new(8.0, 50.0))
            .with_approach(7.0, 35.0),
        20,
    );

    run(
        "target to the side",
        ScriptedRobot::new().with_blob_at(60, Blob::new(6.0, 40.0)),
        5,
    );

    run(
        "wall on the left",
        ScriptedRobot::new().with_proximity(10.0, 350.0, 0.0),
        3,
    );
}
