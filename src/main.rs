mod animation;
mod consts;
mod error;
mod map;
mod planner;
mod reader;
mod renderer;
mod simulate;
mod trajectory;
mod viewer;

use std::path::PathBuf;

use animation::{Frame, FramePlan};
use anyhow::{Context, Result};
use clap::Parser;
use consts::*;
use error::RenderError;
use log::*;
use planner::Planner;
use renderer::Backdrop;
use viewer::Viewer;

/// Replays a robot chasing a target over a cost map and saves the result as
/// a still image and an animated GIF.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Problem file: map size, collision threshold, robot pose, target
    /// trajectory and cost matrix
    map: PathBuf,

    /// Robot trajectory log, one `t,x,y` line per step
    #[arg(long, default_value = TRAJECTORY_FILE)]
    trajectory: PathBuf,

    /// Only every Nth robot step becomes a frame
    #[arg(long, default_value_t = SPEEDUP)]
    speedup: usize,

    /// Delay between GIF frames, in milliseconds
    #[arg(long, default_value_t = FRAME_DELAY_MS)]
    frame_delay: u32,

    /// Also replay the frames in a window
    #[arg(long)]
    show: bool,

    /// Chase the target with the interception planner first and write the
    /// robot's moves to the trajectory log
    #[arg(long)]
    plan: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let problem = map::load(&args.map)
        .with_context(|| format!("failed to parse map file {}", args.map.display()))?;
    let robot = if args.plan {
        let outcome = simulate::simulate(&problem, &mut Planner::new(&problem))
            .context("planner made an illegal move")?;
        trajectory::save(&args.trajectory, &outcome.trajectory).with_context(|| {
            format!(
                "failed to write robot trajectory {}",
                args.trajectory.display()
            )
        })?;
        outcome.trajectory
    } else {
        trajectory::load(&args.trajectory).with_context(|| {
            format!(
                "failed to parse robot trajectory {}",
                args.trajectory.display()
            )
        })?
    };

    let plan = FramePlan::new(robot.len(), args.speedup)?;
    if plan.is_empty() {
        return Err(RenderError::NoFrames(robot.len()).into());
    }
    let frames = plan
        .frames(&robot, &problem.target_trajectory)
        .collect::<Result<Vec<Frame>, _>>()
        .context("robot and target trajectories do not line up")?;
    info!(
        "{} map, robot starting at {},{}: {} frames from {} robot steps, speedup {}",
        problem.dimensions,
        problem.robot_start.x,
        problem.robot_start.y,
        frames.len(),
        robot.len(),
        args.speedup
    );

    {
        let span = tracing::info_span!("render", frames = frames.len());
        let _enter = span.enter();
        let backdrop = Backdrop::new(&problem.costmap);
        renderer::render_gif(ANIMATION_FILE, &backdrop, &frames, args.frame_delay)
            .context("failed to write the animation")?;
        match frames.iter().find(|f| f.is_final) {
            Some(last) => renderer::render_png(FINAL_FRAME_FILE, &backdrop, last)
                .context("failed to write the final frame")?,
            None => warn!("No final frame, {} not written", FINAL_FRAME_FILE),
        }
    }

    if args.show {
        Viewer::new(&problem).run(&frames);
    }
    Ok(())
}
