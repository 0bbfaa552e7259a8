use std::io;
use thiserror::Error;

/// Errors raised while reading the problem file or the robot log.
///
/// Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected marker '{expected}', found '{found}'")]
    UnexpectedMarker {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: input ended, expected {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },

    #[error("line {line}: expected {expected} comma-separated fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{token}' is not a valid {kind}")]
    Number {
        line: usize,
        token: String,
        kind: &'static str,
    },

    #[error("map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("cost matrix has {rows} rows of up to {columns} values, expected {width} rows of {height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        rows: usize,
        columns: usize,
    },
}

/// Errors raised while slicing trajectories into animation frames.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("speedup must be at least 1")]
    ZeroSpeedup,

    #[error("frame index {index} needs a following record, robot trajectory has {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("robot timestep {timestep} is outside the target trajectory (length {target_len})")]
    TimestepOutOfRange { timestep: i64, target_len: usize },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("nothing to render: robot trajectory needs at least 2 records, got {0}")]
    NoFrames(usize),
}

/// Moves the simulation refuses, plus inputs it cannot run on.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("problem has no target trajectory to chase")]
    EmptyTarget,

    #[error("out-of-map robot position commanded: {x},{y}")]
    OutOfMap { x: i64, y: i64 },

    #[error("planned action leads to collision at {x},{y} (cost {cost})")]
    Collision { x: i64, y: i64, cost: i64 },

    #[error("invalid action {from:?} -> {to:?}, robot must move on the 8-connected grid")]
    InvalidMove { from: (i64, i64), to: (i64, i64) },
}
