use crate::animation::Frame;
use crate::consts::*;
use crate::map::Problem;
use crate::renderer::cost_color;
use kiss3d::event::{Action, Key, WindowEvent};
use kiss3d::window::Window;
use log::*;
use nalgebra::{Point2, Point3, Translation2};

enum Cell {
    Uncrossable,
    Crossable(f64),
}

/// Replay state driven by the keyboard.
struct Playback {
    with_target: bool,
    paused: bool,
    current: usize,
}

impl Playback {
    fn new() -> Self {
        Playback {
            with_target: true,
            paused: false,
            current: 0,
        }
    }

    /// Returns false for keys without a binding.
    fn press(&mut self, key: Key) -> bool {
        match key {
            Key::T => self.with_target = !self.with_target,
            Key::Space => self.paused = !self.paused,
            Key::R => self.current = 0,
            _ => return false,
        }
        true
    }

    /// Frame to draw this tick. Steps forward afterwards unless paused or
    /// already on the last frame.
    fn tick(&mut self, len: usize) -> Option<usize> {
        if self.current >= len {
            return None;
        }
        let shown = self.current;
        if !self.paused && self.current + 1 < len {
            self.current += 1;
        }
        Some(shown)
    }
}

/// Interactive replay of the animation frames over the cost map.
///
/// Large maps are shown in blocks of `block x block` cells; a block takes the
/// highest cost it contains so obstacles stay visible.
pub struct Viewer {
    window: Window,
    block: usize,
    cell_size: f32,
    half_width: f32,
    half_height: f32,
    playback: Playback,
}

impl Viewer {
    pub fn new(problem: &Problem) -> Self {
        let costmap = &problem.costmap;
        let (width, height) = (costmap.width(), costmap.height());
        let block = ((width.max(height) + VIEWER_MAX_CELLS - 1) / VIEWER_MAX_CELLS).max(1);
        let cols = (width + block - 1) / block;
        let rows = (height + block - 1) / block;
        let cell_size = VIEWER_SIZE / cols.max(rows) as f32;
        let half_width = cols as f32 * cell_size / 2.0;
        let half_height = rows as f32 * cell_size / 2.0;
        let (lo, hi) = costmap.range();
        info!("Viewer showing {}x{} blocks of {} cells", cols, rows, block);

        let mut window = Window::new("costmap replay");
        for row in 0..rows {
            for col in 0..cols {
                let mut rect = window.add_rectangle(cell_size, cell_size);
                match block_cell(problem, col, row, block) {
                    Cell::Uncrossable => {
                        let (r, g, b) = UNCROSSABLE_COLOR;
                        rect.set_color(r, g, b)
                    }
                    Cell::Crossable(cost) => {
                        let (r, g, b) = cost_color(cost, lo, hi);
                        rect.set_color(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                    }
                }
                rect.append_translation(&Translation2::new(
                    (col as f32 + 0.5) * cell_size - half_width,
                    half_height - (row as f32 + 0.5) * cell_size,
                ));
            }
        }

        Viewer {
            window,
            block,
            cell_size,
            half_width,
            half_height,
            playback: Playback::new(),
        }
    }

    // Same convention as `Backdrop::to_pixel`: a position is a 0-based
    // cell index, so 1-based planner cells land one cell right and down.
    fn to_screen(&self, x: f64, y: f64) -> Point2<f32> {
        let scale = self.cell_size / self.block as f32;
        Point2::new(
            (x as f32 + 0.5) * scale - self.half_width,
            self.half_height - (y as f32 + 0.5) * scale,
        )
    }

    fn draw_path(&mut self, points: &[Point2<f32>], color: (u8, u8, u8)) {
        let color = Point3::new(
            color.0 as f32 / 255.0,
            color.1 as f32 / 255.0,
            color.2 as f32 / 255.0,
        );
        for pair in points.windows(2) {
            self.window.draw_planar_line(&pair[0], &pair[1], &color);
        }
        let r = MARKER_RADIUS as f32;
        for p in points {
            self.window
                .draw_planar_line(&Point2::new(p.x - r, p.y), &Point2::new(p.x + r, p.y), &color);
            self.window
                .draw_planar_line(&Point2::new(p.x, p.y - r), &Point2::new(p.x, p.y + r), &color);
        }
    }

    fn draw_frame(&mut self, frame: &Frame) {
        let robot: Vec<_> = frame
            .robot
            .iter()
            .map(|s| self.to_screen(s.x as f64, s.y as f64))
            .collect();
        self.draw_path(&robot, ROBOT_COLOR);
        if self.playback.with_target {
            let target: Vec<_> = frame
                .target
                .iter()
                .map(|p| self.to_screen(p.x, p.y))
                .collect();
            self.draw_path(&target, TARGET_COLOR);
        }
    }

    /// Plays `frames` one per render tick, then keeps showing the last one
    /// until the window is closed. T toggles the target path, space pauses,
    /// R restarts.
    pub fn run(mut self, frames: &[Frame]) {
        loop {
            for mut event in self.window.events().iter() {
                if let WindowEvent::Key(key, Action::Press, _) = event.value {
                    if self.playback.press(key) {
                        debug!("Key {:?} pressed", key);
                        event.inhibited = true;
                    }
                }
            }
            if let Some(frame) = self.playback.tick(frames.len()).and_then(|k| frames.get(k)) {
                self.draw_frame(frame);
            }
            if !self.window.render() {
                break;
            }
        }
    }
}

fn block_cell(problem: &Problem, col: usize, row: usize, block: usize) -> Cell {
    let costmap = &problem.costmap;
    let mut highest = f64::NEG_INFINITY;
    for y in row * block..((row + 1) * block).min(costmap.height()) {
        for x in col * block..((col + 1) * block).min(costmap.width()) {
            if let Some(cost) = costmap.cost(x, y) {
                highest = highest.max(cost);
            }
        }
    }
    if problem.is_uncrossable(highest) {
        Cell::Uncrossable
    } else {
        Cell::Crossable(highest)
    }
}
