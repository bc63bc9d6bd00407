use log::debug;

use crate::{
    error::RenderError,
    types::{ColorId, Vec2},
};

/// Character-cell drawing surface the simulation renders into.
///
/// Coordinates are `(column, line)` with the origin in the top-left corner.
/// Plotting outside `[0, width) x [0, height)` fails with
/// [`RenderError::OutOfBounds`] and leaves the surface untouched.
pub trait Renderer {
    fn plot(&mut self, x: i32, y: i32, symbol: char) -> Result<(), RenderError>;

    /// Like [`Renderer::plot`], with a foreground color for this cell only.
    fn plot_colored(
        &mut self,
        x: i32,
        y: i32,
        symbol: char,
        color: ColorId,
    ) -> Result<(), RenderError>;

    fn erase(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        self.plot(x, y, ' ')
    }

    /// Writes `text` left to right starting at `(x, y)`.
    fn text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        color: Option<ColorId>,
    ) -> Result<(), RenderError> {
        for (i, ch) in text.chars().enumerate() {
            let cx = x + i as i32;
            match color {
                Some(color) => self.plot_colored(cx, y, ch, color)?,
                None => self.plot(cx, y, ch)?,
            }
        }
        Ok(())
    }

    fn clear_screen(&mut self);

    fn present(&mut self) -> Result<(), RenderError>;

    fn sleep(&mut self, seconds: f64);

    fn width(&self) -> i32;

    fn height(&self) -> i32;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCell {
    pub ch: char,
    pub color: Option<ColorId>,
}

impl RenderCell {
    const BLANK: RenderCell = RenderCell {
        ch: ' ',
        color: None,
    };
}

/// In-memory renderer. Backs the terminal front-end and headless runs.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
    frames: u64,
    slept: f64,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
            frames: 0,
            slept: 0.0,
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, RenderCell::BLANK);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(RenderCell::BLANK);
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    /// One line of the buffer, left to right.
    pub fn row(&self, y: u16) -> &[RenderCell] {
        let start = (y as usize) * (self.width as usize);
        &self.cells[start..start + self.width as usize]
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total pacing delay requested so far, in seconds.
    pub fn slept(&self) -> f64 {
        self.slept
    }

    pub fn non_blank(&self) -> usize {
        self.cells.iter().filter(|cell| cell.ch != ' ').count()
    }

    fn set(&mut self, x: i32, y: i32, ch: char, color: Option<ColorId>) -> Result<(), RenderError> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Err(RenderError::OutOfBounds { x, y });
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx] = RenderCell { ch, color };
        Ok(())
    }
}

impl Renderer for FrameBuffer {
    fn plot(&mut self, x: i32, y: i32, symbol: char) -> Result<(), RenderError> {
        self.set(x, y, symbol, None)
    }

    fn plot_colored(
        &mut self,
        x: i32,
        y: i32,
        symbol: char,
        color: ColorId,
    ) -> Result<(), RenderError> {
        self.set(x, y, symbol, Some(color))
    }

    fn clear_screen(&mut self) {
        self.clear();
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }

    fn sleep(&mut self, seconds: f64) {
        self.slept += seconds.max(0.0);
    }

    fn width(&self) -> i32 {
        self.width as i32
    }

    fn height(&self) -> i32 {
        self.height as i32
    }
}

/// Plots a ring of `glyph` around `center`. Points off screen are skipped.
pub fn draw_circle<R: Renderer>(
    renderer: &mut R,
    center: Vec2<f64>,
    radius: f64,
    glyph: char,
    color: ColorId,
) {
    let mut theta = 0.0_f64;
    while theta < std::f64::consts::TAU {
        let x = (center.x + radius * theta.cos()) as i32;
        let y = (center.y + radius * theta.sin()) as i32;
        if let Err(err) = renderer.plot_colored(x, y, glyph, color) {
            debug!("circle point skipped: {err}");
        }
        theta += 0.1;
    }
}

/// Plots `glyph` along the segment from `start` towards `end`, one cell per unit length.
pub fn draw_line<R: Renderer>(
    renderer: &mut R,
    start: Vec2<f64>,
    end: Vec2<f64>,
    glyph: char,
    color: ColorId,
) {
    let path = end - start;
    let distance = path.length();
    let dir = path.normalize();
    let mut step = 0.0;
    while step < distance {
        let p = start + dir * step;
        if let Err(err) = renderer.plot_colored(p.x as i32, p.y as i32, glyph, color) {
            debug!("line point skipped: {err}");
        }
        step += 1.0;
    }
}
