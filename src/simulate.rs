use crate::error::SimError;
use crate::map::Problem;
use crate::planner::{Grid, Policy};
use crate::trajectory::RobotState;
use log::*;
use nalgebra::Point2;
use std::fmt;
use std::time::Instant;

/// The robot is on the target when both coordinates are this close.
const CATCH_DISTANCE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub caught: bool,
    pub time: usize,
    pub moves: i64,
    pub path_cost: i64,
    pub trajectory: Vec<RobotState>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target caught = {}, time taken (s) = {}, moves made = {}, path cost = {}",
            self.caught, self.time, self.moves, self.path_cost
        )
    }
}

fn state(t: usize, p: Point2<i64>) -> RobotState {
    RobotState {
        t: t as i64,
        x: p.x,
        y: p.y,
    }
}

fn validate(grid: &Grid, threshold: i64, from: Point2<i64>, to: Point2<i64>) -> Result<(), SimError> {
    let cost = match grid.cost(to) {
        Some(cost) => cost,
        None => return Err(SimError::OutOfMap { x: to.x, y: to.y }),
    };
    if cost >= threshold {
        return Err(SimError::Collision {
            x: to.x,
            y: to.y,
            cost,
        });
    }
    if (to.x - from.x).abs() > 1 || (to.y - from.y).abs() > 1 {
        return Err(SimError::InvalidMove {
            from: (from.x, from.y),
            to: (to.x, to.y),
        });
    }
    Ok(())
}

/// Runs `policy` against the target until the target is caught or its
/// trajectory runs out. Each step advances time by the wall-clock seconds the
/// policy took to answer, at least one.
pub fn simulate<P: Policy>(problem: &Problem, policy: &mut P) -> Result<Outcome, SimError> {
    let target = &problem.target_trajectory;
    if target.is_empty() {
        return Err(SimError::EmptyTarget);
    }
    let grid = Grid::new(problem);
    let threshold = problem.collision_threshold;

    let mut robot = problem.robot_start;
    let mut curr_time = 0;
    let mut moves = 0i64;
    let mut path_cost = 0i64;
    let mut caught = false;
    let mut trajectory = vec![state(curr_time, robot)];

    loop {
        let t = target[curr_time];
        let started = Instant::now();
        let next = policy.next_move(robot, Point2::new(t.x as i64, t.y as i64), curr_time);
        let move_time = (started.elapsed().as_secs() as usize).max(1);

        validate(&grid, threshold, robot, next)?;
        if next == robot {
            moves -= 1;
        }
        if curr_time + move_time >= target.len() {
            break;
        }

        curr_time += move_time;
        moves += 1;
        path_cost += move_time as i64 * grid.cost(robot).unwrap_or(0);
        robot = next;
        trajectory.push(state(curr_time, robot));

        let t = target[curr_time];
        debug!("t={}: robot at {}, target at {}", curr_time, robot, t);
        if (robot.x as f64 - t.x).abs() <= CATCH_DISTANCE
            && (robot.y as f64 - t.y).abs() <= CATCH_DISTANCE
        {
            caught = true;
            break;
        }
    }

    let outcome = Outcome {
        caught,
        time: curr_time,
        moves,
        path_cost,
        trajectory,
    };
    info!("{}", outcome);
    Ok(outcome)
}
