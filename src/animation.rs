use crate::error::FrameError;
use crate::trajectory::RobotState;
use log::*;
use nalgebra::Point2;

/// What a single animation frame shows.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<'a> {
    pub index: usize,
    pub robot: &'a [RobotState],
    pub target: &'a [Point2<f64>],
    /// Set on the last frame of the plan, the one kept as a still image.
    pub is_final: bool,
}

/// Subsampled frame indices over a robot trajectory: `0, S, 2S, ...` while
/// the index stays below `len - 1`, since every frame peeks at the record
/// after its own.
#[derive(Clone, Debug)]
pub struct FramePlan {
    len: usize,
    speedup: usize,
}

impl FramePlan {
    pub fn new(len: usize, speedup: usize) -> Result<Self, FrameError> {
        if speedup == 0 {
            return Err(FrameError::ZeroSpeedup);
        }
        Ok(FramePlan { len, speedup })
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (0..self.len.saturating_sub(1)).step_by(self.speedup)
    }

    pub fn is_empty(&self) -> bool {
        self.len < 2
    }

    pub fn frames<'a>(
        &self,
        robot: &'a [RobotState],
        target: &'a [Point2<f64>],
    ) -> impl Iterator<Item = Result<Frame<'a>, FrameError>> + 'a {
        let plan = self.clone();
        self.indices()
            .map(move |index| plan.frame(robot, target, index))
    }

    /// Robot path up to and including `index`, target path up to the
    /// timestep the robot reports in the following record.
    pub fn frame<'a>(
        &self,
        robot: &'a [RobotState],
        target: &'a [Point2<f64>],
        index: usize,
    ) -> Result<Frame<'a>, FrameError> {
        let next = robot.get(index + 1).ok_or(FrameError::IndexOutOfRange {
            index,
            len: robot.len(),
        })?;
        if next.t < 0 || next.t as usize > target.len() {
            return Err(FrameError::TimestepOutOfRange {
                timestep: next.t,
                target_len: target.len(),
            });
        }
        // No later index of the plan stays below len - 1.
        let is_final = index + self.speedup >= robot.len() - 1;
        debug!("Frame {} at timestep {}", index, next.t);
        Ok(Frame {
            index,
            robot: &robot[..=index],
            target: &target[..next.t as usize],
            is_final,
        })
    }
}
