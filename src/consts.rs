pub const SPEEDUP: usize = 2;
pub const FRAME_DELAY_MS: u32 = 100;

pub const TRAJECTORY_FILE: &str = "robot_trajectory.txt";
pub const FINAL_FRAME_FILE: &str = "final_timestep.png";
pub const ANIMATION_FILE: &str = "myGIF.gif";

// Rendered images never exceed this many pixels on their longest side.
pub const MAX_IMAGE_SIDE: f64 = 600.0;
pub const MAX_CELL_PX: f64 = 20.0;
pub const MARKER_RADIUS: i32 = 3;
pub const LINE_WIDTH: u32 = 2;
pub const LEGEND_SWATCH: i32 = 10;

pub const ROBOT_COLOR: (u8, u8, u8) = (0, 128, 0);
pub const TARGET_COLOR: (u8, u8, u8) = (255, 255, 0);

pub const VIEWER_MAX_CELLS: usize = 150;
pub const VIEWER_SIZE: f32 = 600.0;
pub const UNCROSSABLE_COLOR: (f32, f32, f32) = (0.686, 0.2, 0.0);
