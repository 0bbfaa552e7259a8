use crate::map::Problem;
use log::*;
use nalgebra::Point2;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

// Eight neighbours. Waiting is not a search move, it only pads a plan.
const DIRECTIONS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// The cost map seen with 1-based cell coordinates, `x` in `1..=width`.
pub struct Grid<'a> {
    problem: &'a Problem,
    width: i64,
    height: i64,
}

impl<'a> Grid<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        Grid {
            problem,
            width: problem.dimensions.width as i64,
            height: problem.dimensions.height as i64,
        }
    }

    pub fn in_bounds(&self, p: Point2<i64>) -> bool {
        p.x >= 1 && p.x <= self.width && p.y >= 1 && p.y <= self.height
    }

    /// Integer cost of an in-bounds cell. Fractional costs are truncated.
    pub fn cost(&self, p: Point2<i64>) -> Option<i64> {
        if !self.in_bounds(p) {
            return None;
        }
        self.problem
            .costmap
            .cost((p.x - 1) as usize, (p.y - 1) as usize)
            .map(|c| c as i64)
    }

    pub fn traversable(&self, p: Point2<i64>) -> bool {
        match self.cost(p) {
            Some(c) => c >= 0 && c < self.problem.collision_threshold,
            None => false,
        }
    }

    fn len(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn index(&self, p: Point2<i64>) -> usize {
        ((p.y - 1) * self.width + (p.x - 1)) as usize
    }

    fn point(&self, idx: usize) -> Point2<i64> {
        let idx = idx as i64;
        Point2::new(idx % self.width + 1, idx / self.width + 1)
    }

    fn neighbours(&self, p: Point2<i64>) -> impl Iterator<Item = Point2<i64>> + '_ {
        DIRECTIONS
            .iter()
            .map(move |&(dx, dy)| Point2::new(p.x + dx, p.y + dy))
            .filter(move |&n| self.traversable(n))
    }
}

/// Decides where the robot goes next, one step per call.
pub trait Policy {
    fn next_move(
        &mut self,
        robot: Point2<i64>,
        target: Point2<i64>,
        curr_time: usize,
    ) -> Point2<i64>;
}

/// Interception planner: finds the cell where the robot can meet the target
/// in the fewest steps, breaking ties on move cost plus the cost of waiting
/// there, then replays that plan one step per call.
pub struct Planner<'a> {
    grid: Grid<'a>,
    target: Vec<Point2<i64>>,
    plan: Vec<Point2<i64>>,
    plan_pos: usize,
    // Timestep the next cached step is valid for.
    plan_time: Option<usize>,
}

struct Interception {
    goal: usize,
    // Timestep offset at which the target stands on the goal.
    k: usize,
    score: i64,
}

impl<'a> Planner<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        let target = problem
            .target_trajectory
            .iter()
            .map(|p| Point2::new(p.x as i64, p.y as i64))
            .collect();
        Planner {
            grid: Grid::new(problem),
            target,
            plan: Vec::new(),
            plan_pos: 0,
            plan_time: None,
        }
    }

    fn reset(&mut self, plan_time: Option<usize>) {
        self.plan.clear();
        self.plan_pos = 0;
        self.plan_time = plan_time;
    }

    fn cached_step(&mut self, robot: Point2<i64>, curr_time: usize) -> Option<Point2<i64>> {
        if self.plan_time != Some(curr_time) || self.plan_pos >= self.plan.len() {
            return None;
        }
        let next = self.plan[self.plan_pos];
        let adjacent = (next.x - robot.x).abs() <= 1 && (next.y - robot.y).abs() <= 1;
        if adjacent && self.grid.traversable(next) {
            self.plan_pos += 1;
            self.plan_time = Some(curr_time + 1);
            return Some(next);
        }
        debug!("Cached plan no longer valid at t={}", curr_time);
        self.reset(None);
        None
    }

    /// Earliest offset `k` at which the target stands on each cell, within
    /// `remaining` steps of `curr_time`.
    fn target_arrivals(&self, curr_time: usize, remaining: usize) -> Vec<Option<usize>> {
        let mut arrivals = vec![None; self.grid.len()];
        for (k, &p) in self.target.iter().skip(curr_time).enumerate() {
            if k > remaining {
                break;
            }
            if !self.grid.traversable(p) {
                continue;
            }
            let slot = &mut arrivals[self.grid.index(p)];
            if slot.map_or(true, |earliest| k < earliest) {
                *slot = Some(k);
            }
        }
        arrivals
    }

    // Greedy step towards the target when no plan exists.
    fn closest_neighbour(&self, robot: Point2<i64>, target: Point2<i64>) -> Point2<i64> {
        let dist = |p: Point2<i64>| (p.x - target.x).pow(2) + (p.y - target.y).pow(2);
        let mut best = robot;
        let mut best_d = dist(robot);
        let mut best_c = self.grid.cost(robot).unwrap_or(i64::MAX);
        for n in self.grid.neighbours(robot) {
            let (d, c) = (dist(n), self.grid.cost(n).unwrap_or(i64::MAX));
            if d < best_d || (d == best_d && c < best_c) {
                best = n;
                best_d = d;
                best_c = c;
            }
        }
        best
    }
}

impl<'a> Policy for Planner<'a> {
    fn next_move(
        &mut self,
        robot: Point2<i64>,
        target: Point2<i64>,
        curr_time: usize,
    ) -> Point2<i64> {
        if robot == target || !self.grid.traversable(robot) {
            self.reset(None);
            return robot;
        }
        if let Some(step) = self.cached_step(robot, curr_time) {
            return step;
        }

        let remaining = (self.target.len() as i64 - 1) - curr_time as i64;
        if remaining <= 0 {
            self.reset(None);
            return robot;
        }
        let remaining = remaining as usize;
        let arrivals = self.target_arrivals(curr_time, remaining);

        let start = self.grid.index(robot);
        let mut best_steps = vec![usize::MAX; self.grid.len()];
        let mut best_cost = vec![i64::MAX; self.grid.len()];
        let mut parent: Vec<Option<usize>> = vec![None; self.grid.len()];
        let mut heap = BinaryHeap::new();
        best_steps[start] = 0;
        best_cost[start] = 0;
        heap.push(Reverse((0usize, 0i64, start)));

        let mut found: Option<Interception> = None;
        while let Some(Reverse((steps, cost, idx))) = heap.pop() {
            if steps != best_steps[idx] || cost != best_cost[idx] || steps > remaining {
                continue;
            }
            if found.as_ref().map_or(false, |f| cost >= f.score) {
                continue;
            }
            if let Some(k) = arrivals[idx] {
                if steps <= k {
                    let here = self.grid.cost(self.grid.point(idx)).unwrap_or(0);
                    let score = cost + (k - steps) as i64 * here;
                    let better = match &found {
                        None => true,
                        Some(f) => score < f.score || (score == f.score && k < f.k),
                    };
                    if better {
                        found = Some(Interception { goal: idx, k, score });
                    }
                }
            }

            if steps + 1 > remaining {
                continue;
            }
            for n in self.grid.neighbours(self.grid.point(idx)) {
                let nidx = self.grid.index(n);
                let (ns, nc) = (steps + 1, cost + self.grid.cost(n).unwrap_or(0));
                if ns < best_steps[nidx] || (ns == best_steps[nidx] && nc < best_cost[nidx]) {
                    best_steps[nidx] = ns;
                    best_cost[nidx] = nc;
                    parent[nidx] = Some(idx);
                    heap.push(Reverse((ns, nc, nidx)));
                }
            }
        }

        // Otherwise head for the target's current cell if it can be reached.
        if found.is_none() && self.grid.traversable(target) {
            let goal = self.grid.index(target);
            if best_steps[goal] != usize::MAX {
                found = Some(Interception {
                    goal,
                    k: best_steps[goal],
                    score: best_cost[goal],
                });
            }
        }

        let found = match found {
            Some(found) => found,
            None => {
                self.reset(Some(curr_time + 1));
                let step = self.closest_neighbour(robot, target);
                debug!("No interception from {}, stepping to {}", robot, step);
                return step;
            }
        };

        let mut path = Vec::new();
        let mut cur = found.goal;
        while cur != start {
            path.push(self.grid.point(cur));
            match parent[cur] {
                Some(p) => cur = p,
                None => {
                    self.reset(None);
                    return robot;
                }
            }
        }
        path.reverse();
        let arrival = path.len();
        if arrival <= found.k {
            let goal = self.grid.point(found.goal);
            path.extend(std::iter::repeat(goal).take(found.k - arrival));
        }
        info!(
            "t={}: intercepting at {} in {} steps (score {})",
            curr_time,
            self.grid.point(found.goal),
            found.k,
            found.score
        );

        self.plan = path;
        self.plan_pos = 0;
        self.plan_time = Some(curr_time + 1);
        match self.plan.first() {
            Some(&step) => {
                self.plan_pos = 1;
                step
            }
            None => robot,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::map;
    use std::io::Cursor;

    /// Builds a problem from a cost function over 1-based cells.
    pub fn problem<F: Fn(i64, i64) -> u32>(
        width: i64,
        height: i64,
        threshold: u32,
        start: (i64, i64),
        target: &[(i64, i64)],
        cost: F,
    ) -> Problem {
        let mut text = format!(
            "N\n{},{}\nC\n{}\nR\n{},{}\nT\n",
            width, height, threshold, start.0, start.1
        );
        for (x, y) in target {
            text += &format!("{},{}\n", x, y);
        }
        text += "M\n";
        for x in 1..=width {
            let row: Vec<String> = (1..=height).map(|y| cost(x, y).to_string()).collect();
            text += &row.join(",");
            text += "\n";
        }
        map::parse(Cursor::new(text)).unwrap()
    }

    #[test]
    fn grid_uses_one_based_cells() {
        let p = problem(3, 2, 10, (1, 1), &[(1, 1)], |x, y| (x * 10 + y) as u32);
        let grid = Grid::new(&p);
        assert_eq!(grid.cost(Point2::new(1, 1)), Some(11));
        assert_eq!(grid.cost(Point2::new(3, 2)), Some(32));
        assert_eq!(grid.cost(Point2::new(0, 1)), None);
        assert_eq!(grid.cost(Point2::new(3, 3)), None);
        assert!(!grid.traversable(Point2::new(1, 1)));
        let grid_index = grid.index(Point2::new(2, 2));
        assert_eq!(grid.point(grid_index), Point2::new(2, 2));
    }

    #[test]
    fn heads_straight_for_a_stationary_target() {
        let p = problem(5, 5, 100, (1, 1), &[(4, 4); 10], |_, _| 1);
        let mut planner = Planner::new(&p);
        let target = Point2::new(4, 4);
        assert_eq!(planner.next_move(Point2::new(1, 1), target, 0), Point2::new(2, 2));
        assert_eq!(planner.next_move(Point2::new(2, 2), target, 1), Point2::new(3, 3));
        assert_eq!(planner.next_move(Point2::new(3, 3), target, 2), Point2::new(4, 4));
    }

    #[test]
    fn waits_where_the_target_will_arrive() {
        let mut target = vec![(5, 5); 6];
        target.extend(vec![(2, 2); 4]);
        let p = problem(5, 5, 100, (1, 1), &target, |_, _| 1);
        let mut planner = Planner::new(&p);
        let far = Point2::new(5, 5);
        assert_eq!(planner.next_move(Point2::new(1, 1), far, 0), Point2::new(2, 2));
        for t in 1..6 {
            assert_eq!(planner.next_move(Point2::new(2, 2), far, t), Point2::new(2, 2));
        }
    }

    #[test]
    fn routes_around_impassable_cells() {
        // Column x = 2 is blocked except at y = 3.
        let p = problem(3, 3, 100, (1, 1), &[(3, 1); 10], |x, y| {
            if x == 2 && y < 3 {
                200
            } else {
                1
            }
        });
        let grid = Grid::new(&p);
        let mut planner = Planner::new(&p);
        let target = Point2::new(3, 1);
        let mut robot = Point2::new(1, 1);
        for t in 0..4 {
            robot = planner.next_move(robot, target, t);
            assert!(grid.traversable(robot), "stepped onto {}", robot);
        }
        assert_eq!(robot, target);
    }

    #[test]
    fn unreachable_target_falls_back_to_closest_neighbour() {
        // The target sits in a walled-off corner.
        let p = problem(5, 5, 100, (1, 1), &[(5, 5); 10], |x, y| {
            if x >= 4 && y >= 4 && !(x == 5 && y == 5) {
                200
            } else {
                1
            }
        });
        let mut planner = Planner::new(&p);
        assert_eq!(
            planner.next_move(Point2::new(1, 1), Point2::new(5, 5), 0),
            Point2::new(2, 2)
        );
    }

    #[test]
    fn stays_put_past_the_horizon() {
        let p = problem(3, 3, 100, (1, 1), &[(3, 3); 3], |_, _| 1);
        let mut planner = Planner::new(&p);
        assert_eq!(
            planner.next_move(Point2::new(1, 1), Point2::new(3, 3), 2),
            Point2::new(1, 1)
        );
    }
}
