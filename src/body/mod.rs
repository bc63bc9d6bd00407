use rand::Rng;

use crate::{
    error::RenderError,
    field::{self, ForceField, Probe},
    render::Renderer,
    types::{ColorId, Vec2},
};

/// Drawable extent a body is confined to, plus the bounce response.
#[derive(Clone, Copy, Debug)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
    pub restitution: f64,
}

impl Bounds {
    fn max_x(&self) -> f64 {
        (self.width - 1).max(0) as f64
    }

    fn max_y(&self) -> f64 {
        (self.height - 1).max(0) as f64
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub position: Vec2<f64>,
    pub previous_position: Vec2<f64>,
    pub velocity: Vec2<f64>,
    pub mass: f64,
    pub glyph: char,
    pub color: ColorId,
}

impl Body {
    pub fn new(position: Vec2<f64>, mass: f64, glyph: char, color: ColorId) -> Self {
        assert!(mass.is_finite() && mass > 0.0, "mass must be positive and finite");
        Self {
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            mass,
            glyph,
            color,
        }
    }

    /// A body somewhere inside `[0, width) x [0, height)` with a random
    /// capital-letter glyph and palette color.
    pub fn random<R: Rng>(rng: &mut R, width: i32, height: i32, mass: f64) -> Self {
        let x = random_between(rng, 0, width);
        let y = random_between(rng, 0, height);
        let glyph = random_glyph(rng);
        let color = random_color(rng);
        Self::new(Vec2::new(x as f64, y as f64), mass, glyph, color)
    }

    pub fn with_velocity(mut self, velocity: Vec2<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn cell(&self) -> (i32, i32) {
        self.position.cell()
    }

    fn probe(&self) -> Probe {
        Probe {
            position: self.position,
            velocity: self.velocity,
            mass: self.mass,
        }
    }

    /// Advance one tick with semi-implicit Euler, bouncing off the bounds.
    ///
    /// Returns the cell the body left when its rendered cell changed, so the
    /// caller erases it exactly once no matter how many axes moved.
    pub fn update(&mut self, dt: f64, fields: &[ForceField], bounds: Bounds) -> Option<(i32, i32)> {
        let acc = field::accumulate(fields, &self.probe());
        self.velocity += acc * dt;

        let mut next = self.position + self.velocity * dt;

        if next.x < 0.0 || next.x > bounds.max_x() {
            self.velocity.x = -self.velocity.x * bounds.restitution;
            next.x = next.x.clamp(0.0, bounds.max_x());
        }
        if next.y < 0.0 || next.y > bounds.max_y() {
            self.velocity.y = -self.velocity.y * bounds.restitution;
            next.y = next.y.clamp(0.0, bounds.max_y());
        }

        let old_cell = self.cell();
        self.previous_position = self.position;
        self.position = next;

        (self.cell() != old_cell).then_some(old_cell)
    }

    pub fn draw<R: Renderer>(&self, renderer: &mut R) -> Result<(), RenderError> {
        let (x, y) = self.cell();
        renderer.plot_colored(x, y, self.glyph, self.color)
    }
}

/// Uniform integer in `[min, max)`. Callers must pass `0 <= min < max`.
pub fn random_between<R: Rng>(rng: &mut R, min: i32, max: i32) -> i32 {
    assert!(min >= 0, "random range must start at or above zero");
    assert!(min < max, "random range must not be empty");
    rng.gen_range(min..max)
}

pub fn random_glyph<R: Rng>(rng: &mut R) -> char {
    char::from(random_between(rng, 'A' as i32, 'X' as i32) as u8)
}

pub fn random_color<R: Rng>(rng: &mut R) -> ColorId {
    ColorId::ALL[rng.gen_range(0..ColorId::ALL.len())]
}
