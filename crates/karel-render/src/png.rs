use image::{ImageFormat, Rgba, RgbaImage};
use karel_core::{Direction, Position, SnapshotRenderer, SnapshotView};
use std::io::Cursor;
use tracing::error;

/// Edge length of one grid cell in pixels.
pub const DEFAULT_CELL_PX: u32 = 40;
/// Accepted cell sizes; anything outside is clamped.
pub const MIN_CELL_PX: u32 = 8;
pub const MAX_CELL_PX: u32 = 256;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRID_LINE: Rgba<u8> = Rgba([210, 210, 210, 255]);
const WALL: Rgba<u8> = Rgba([128, 128, 128, 255]);
const BEEPER: Rgba<u8> = Rgba([220, 40, 40, 255]);
const AGENT: Rgba<u8> = Rgba([30, 80, 200, 255]);

/// Offscreen PNG renderer. Artifacts are encoded PNG bytes.
#[derive(Debug, Clone, Copy)]
pub struct PngRenderer {
    cell_px: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_PX)
    }
}

impl PngRenderer {
    /// Clamps `cell_px` into `MIN_CELL_PX..=MAX_CELL_PX`.
    #[must_use]
    pub fn new(cell_px: u32) -> Self {
        Self {
            cell_px: cell_px.clamp(MIN_CELL_PX, MAX_CELL_PX),
        }
    }

    #[must_use]
    pub const fn cell_px(&self) -> u32 {
        self.cell_px
    }
}

impl SnapshotRenderer for PngRenderer {
    type Artifact = Vec<u8>;

    fn render(&mut self, view: &SnapshotView<'_>) -> Vec<u8> {
        let image = render_png(view, self.cell_px);
        let mut bytes = Vec::new();
        if let Err(err) = image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png) {
            error!(?err, step = view.step.0, "failed to encode PNG snapshot");
        }
        bytes
    }
}

/// Rasterises one snapshot. Row 0 of the world is drawn at the bottom.
#[must_use]
pub fn render_png(view: &SnapshotView<'_>, cell_px: u32) -> RgbaImage {
    let cell_px = cell_px.clamp(MIN_CELL_PX, MAX_CELL_PX);
    let world = view.world;
    let mut image = RgbaImage::from_pixel(
        world.width() * cell_px,
        world.height() * cell_px,
        BACKGROUND,
    );

    for y in 0..world.height() {
        for x in 0..world.width() {
            let position = Position::new(x, y);
            let (left, top) = cell_origin(world.height(), position, cell_px);
            let wall = world.is_blocked(position).unwrap_or(true);
            for dy in 0..cell_px {
                for dx in 0..cell_px {
                    let edge = dx == 0 || dy == 0 || dx == cell_px - 1 || dy == cell_px - 1;
                    let color = if wall {
                        WALL
                    } else if edge {
                        GRID_LINE
                    } else {
                        continue;
                    };
                    image.put_pixel(left + dx, top + dy, color);
                }
            }
        }
    }

    for (&position, &count) in view.beepers {
        draw_beepers(&mut image, world.height(), position, count, cell_px);
    }
    draw_agent(&mut image, world.height(), view.position, view.direction, cell_px);
    image
}

fn cell_origin(height: u32, position: Position, cell_px: u32) -> (u32, u32) {
    (
        position.x * cell_px,
        (height - 1 - position.y) * cell_px,
    )
}

/// Up to nine dots laid out on a 3x3 lattice; the pile size is the dot count.
fn draw_beepers(image: &mut RgbaImage, height: u32, position: Position, count: u32, cell_px: u32) {
    let (left, top) = cell_origin(height, position, cell_px);
    let pitch = cell_px as f32 / 4.0;
    let radius = (cell_px as f32 / 12.0).max(1.0);
    for slot in 0..count.min(9) {
        let cx = left as f32 + pitch * (1 + slot % 3) as f32;
        let cy = top as f32 + pitch * (1 + slot / 3) as f32;
        fill_disc(image, cx, cy, radius, BEEPER);
    }
}

fn fill_disc(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let r = radius.ceil() as i64;
    for dy in -r..=r {
        for dx in -r..=r {
            if ((dx * dx + dy * dy) as f32).sqrt() > radius {
                continue;
            }
            let px = cx.round() as i64 + dx;
            let py = cy.round() as i64 + dy;
            if px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height() {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Triangle pointing along `direction`, drawn in cell-local coordinates with `v` up.
fn draw_agent(
    image: &mut RgbaImage,
    height: u32,
    position: Position,
    direction: Direction,
    cell_px: u32,
) {
    let (left, top) = cell_origin(height, position, cell_px);
    let half = cell_px as f32 / 2.0;
    for dy in 0..cell_px {
        for dx in 0..cell_px {
            let u = (dx as f32 + 0.5 - half) / half;
            let v = (half - dy as f32 - 0.5) / half;
            // Rotate back into the east-facing frame.
            let (mut x, mut y) = (u, v);
            for _ in 0..direction.index() {
                (x, y) = (y, -x);
            }
            let inside = (-0.5..=0.7).contains(&x) && y.abs() <= (0.7 - x) / 1.2 * 0.6;
            if inside {
                image.put_pixel(left + dx, top + dy, AGENT);
            }
        }
    }
}
