use crate::animation::Frame;
use crate::consts::*;
use crate::error::RenderError;
use crate::map::CostMap;
use log::*;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::BitMapElement;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

/// Continuous colormap lookup, normalized over the map's cost range.
pub fn cost_color(cost: f64, lo: f64, hi: f64) -> (u8, u8, u8) {
    let t = if hi > lo { (cost - lo) / (hi - lo) } else { 0.5 };
    let t = if t.is_finite() { t.max(0.0).min(1.0) } else { 0.0 };
    let c = colorous::TURBO.eval_continuous(t);
    (c.r, c.g, c.b)
}

/// The cost map rasterized once, drawn under every frame.
pub struct Backdrop {
    width: u32,
    height: u32,
    scale: f64,
    // Packed RGB rows.
    pixels: Vec<u8>,
}

impl Backdrop {
    pub fn new(costmap: &CostMap) -> Self {
        let (cols, rows) = (costmap.width(), costmap.height());
        let scale = (MAX_IMAGE_SIDE / cols.max(rows) as f64).min(MAX_CELL_PX);
        let width = ((cols as f64 * scale).ceil() as u32).max(1);
        let height = ((rows as f64 * scale).ceil() as u32).max(1);
        let (lo, hi) = costmap.range();

        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for py in 0..height {
            let y = ((py as f64 / scale) as usize).min(rows - 1);
            for px in 0..width {
                let x = ((px as f64 / scale) as usize).min(cols - 1);
                let cost = costmap.cost(x, y).unwrap_or(lo);
                let (r, g, b) = cost_color(cost, lo, hi);
                pixels.extend_from_slice(&[r, g, b]);
            }
        }
        debug!("Backdrop {}x{} px, {} px per cell", width, height, scale);

        Backdrop {
            width,
            height,
            scale,
            pixels,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel for map coordinates. Coordinates are 0-based cell indices: cell
    /// `(x, y)` is centered on coordinate `(x, y)`, rows going down. The
    /// 1-based cells the simulator logs are drawn with the same rule.
    pub fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        (
            ((x + 0.5) * self.scale).floor() as i32,
            ((y + 0.5) * self.scale).floor() as i32,
        )
    }
}

fn draw_error<E: Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn draw_path<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    points: &[(i32, i32)],
    color: RGBColor,
) -> Result<(), RenderError> {
    if points.len() > 1 {
        area.draw(&PathElement::new(
            points.to_vec(),
            color.stroke_width(LINE_WIDTH),
        ))
        .map_err(draw_error)?;
    }
    for &p in points {
        area.draw(&Circle::new(p, MARKER_RADIUS, color.filled()))
            .map_err(draw_error)?;
    }
    Ok(())
}

// One swatch per path in the top right corner.
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    backdrop: &Backdrop,
) -> Result<(), RenderError> {
    let right = backdrop.width as i32 - 4;
    let left = right - 3 * LEGEND_SWATCH;
    area.draw(&Rectangle::new(
        [(left - 4, 4), (right + 2, 4 + LEGEND_SWATCH + 6)],
        WHITE.filled(),
    ))
    .map_err(draw_error)?;
    for (k, color) in [ROBOT_COLOR, TARGET_COLOR].iter().enumerate() {
        let x0 = left + k as i32 * 2 * LEGEND_SWATCH;
        area.draw(&Rectangle::new(
            [(x0, 7), (x0 + LEGEND_SWATCH, 7 + LEGEND_SWATCH)],
            RGBColor(color.0, color.1, color.2).filled(),
        ))
        .map_err(draw_error)?;
    }
    Ok(())
}

/// Draws one frame: the cost map, then the robot path, then the target path.
pub fn draw_frame(
    area: &DrawingArea<BitMapBackend, Shift>,
    backdrop: &Backdrop,
    frame: &Frame,
) -> Result<(), RenderError> {
    let raster = BitMapElement::with_ref((0, 0), backdrop.size(), &backdrop.pixels)
        .ok_or_else(|| RenderError::Draw("backdrop buffer does not match its size".to_owned()))?;
    area.draw(&raster).map_err(draw_error)?;

    let robot: Vec<_> = frame
        .robot
        .iter()
        .map(|s| backdrop.to_pixel(s.x as f64, s.y as f64))
        .collect();
    let target: Vec<_> = frame
        .target
        .iter()
        .map(|p| backdrop.to_pixel(p.x, p.y))
        .collect();
    let (r, g, b) = ROBOT_COLOR;
    draw_path(area, &robot, RGBColor(r, g, b))?;
    let (r, g, b) = TARGET_COLOR;
    draw_path(area, &target, RGBColor(r, g, b))?;
    draw_legend(area, backdrop)
}

/// Writes every frame into an animated GIF, replacing `path`.
pub fn render_gif<P: AsRef<Path>>(
    path: P,
    backdrop: &Backdrop,
    frames: &[Frame],
    frame_delay_ms: u32,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    info!("Writing {} frames to {}", frames.len(), path.display());
    let root = BitMapBackend::gif(path, backdrop.size(), frame_delay_ms)
        .map_err(|e| RenderError::Draw(e.to_string()))?
        .into_drawing_area();
    for frame in frames {
        draw_frame(&root, backdrop, frame)?;
        root.present().map_err(draw_error)?;
    }
    Ok(())
}

/// Writes a single frame as a still image, replacing `path`.
pub fn render_png<P: AsRef<Path>>(
    path: P,
    backdrop: &Backdrop,
    frame: &Frame,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    info!("Writing frame {} to {}", frame.index, path.display());
    let root = BitMapBackend::new(path, backdrop.size()).into_drawing_area();
    draw_frame(&root, backdrop, frame)?;
    root.present().map_err(draw_error)
}
