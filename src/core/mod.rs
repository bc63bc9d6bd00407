use std::time::Instant;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    body::{self, Body, Bounds},
    config::{self, Settings},
    error::RenderError,
    field::{FieldSpec, ForceField},
    grid::StackGrid,
    render::{self, Renderer},
    types::{ColorId, Drawable, Item, Vec2},
};

/// Column width of one status field.
const HUD_FIELD: usize = 30;

/// Cell a body left this tick, with the color its trail dot would use.
#[derive(Clone, Copy, Debug)]
struct Stale {
    cell: (i32, i32),
    color: ColorId,
}

/// Owns the bodies, the force fields and the floor grid, and steps them
/// against a [`Renderer`] one tick at a time.
pub struct Simulation {
    pub bodies: Vec<Body>,
    pub world: StackGrid<Item>,
    fields: Vec<FieldSpec>,
    resolved: Vec<ForceField>,
    dt: f64,
    restitution: f64,
    trail: bool,
    decorations: bool,
    hud: bool,
    rng: StdRng,
    seed: u64,
    iteration: u64,
    extent: (i32, i32),
    needs_full_redraw: bool,
    stale: Vec<Stale>,
}

impl Simulation {
    pub fn new(settings: &Settings, width: i32, height: i32) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        info!("seeding simulation with {seed}");

        let mut sim = Self {
            bodies: Vec::with_capacity(settings.placements.len() + settings.bodies),
            world: StackGrid::new(clamp_extent(width), clamp_extent(height)),
            fields: settings.fields.clone(),
            resolved: Vec::with_capacity(settings.fields.len()),
            dt: settings.dt(),
            restitution: settings.restitution,
            trail: settings.trail,
            decorations: settings.decorations,
            hud: settings.hud,
            rng: StdRng::seed_from_u64(seed),
            seed,
            iteration: 0,
            extent: (width, height),
            needs_full_redraw: true,
            stale: Vec::new(),
        };
        sim.spawn(settings, width, height);
        sim
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    fn spawn(&mut self, settings: &Settings, width: i32, height: i32) {
        for placement in &settings.placements {
            let glyph = placement
                .glyph
                .unwrap_or_else(|| body::random_glyph(&mut self.rng));
            let color = placement
                .color
                .unwrap_or_else(|| body::random_color(&mut self.rng));
            let mass = placement.mass.unwrap_or(settings.body_mass);
            let body = Body::new(Vec2::new(placement.x, placement.y), mass, glyph, color)
                .with_velocity(Vec2::new(placement.velocity[0], placement.velocity[1]));
            self.bodies.push(body);
        }

        if width <= 0 || height <= 0 {
            warn!("screen is {width}x{height}; skipping random bodies and items");
            return;
        }

        for _ in 0..settings.bodies {
            let body = Body::random(&mut self.rng, width, height, settings.body_mass);
            self.bodies.push(body);
        }

        let columns = i32::from(self.world.columns());
        let lines = i32::from(self.world.lines());
        for _ in 0..settings.items {
            let x = body::random_between(&mut self.rng, 0, columns);
            let y = body::random_between(&mut self.rng, 0, lines);
            let glyph = config::ITEM_GLYPHS[self.rng.gen_range(0..config::ITEM_GLYPHS.len())];
            let color = body::random_color(&mut self.rng);
            self.world.push(x as u16, y as u16, Item::new(glyph, color));
        }

        info!(
            "spawned {} bodies and {} floor items on a {width}x{height} screen",
            self.bodies.len(),
            settings.items
        );
    }

    /// One full tick: physics, render pass, present, then sleep for whatever
    /// is left of the tick.
    pub fn tick<R: Renderer>(&mut self, renderer: &mut R) -> Result<(), RenderError> {
        let started = Instant::now();
        self.advance(renderer.width(), renderer.height());
        self.render(renderer);
        renderer.present()?;
        let remaining = self.dt - started.elapsed().as_secs_f64();
        renderer.sleep(remaining.max(0.0));
        Ok(())
    }

    /// Ticks until `ticks` have run (if given) or `keep_going` says stop.
    /// Returns the number of ticks run.
    pub fn run<R, F>(
        &mut self,
        renderer: &mut R,
        ticks: Option<u64>,
        mut keep_going: F,
    ) -> Result<u64, RenderError>
    where
        R: Renderer,
        F: FnMut() -> Result<bool, RenderError>,
    {
        let mut done = 0;
        while ticks.map_or(true, |limit| done < limit) && keep_going()? {
            self.tick(renderer)?;
            done += 1;
        }
        Ok(done)
    }

    /// Physics half of a tick.
    pub fn advance(&mut self, width: i32, height: i32) {
        if (width, height) != self.extent {
            debug!(
                "screen resized from {}x{} to {width}x{height}",
                self.extent.0, self.extent.1
            );
            self.extent = (width, height);
            self.world.resize(clamp_extent(width), clamp_extent(height));
            self.needs_full_redraw = true;
        }

        self.resolved.clear();
        self.resolved
            .extend(self.fields.iter().map(|spec| spec.resolve(width, height)));

        let bounds = Bounds {
            width,
            height,
            restitution: self.restitution,
        };
        for body in &mut self.bodies {
            if let Some(cell) = body.update(self.dt, &self.resolved, bounds) {
                self.stale.push(Stale {
                    cell,
                    color: body.color,
                });
            }
        }
        self.iteration += 1;
    }

    /// Drawing half of a tick. A cell that fails to draw is logged and
    /// skipped; the rest of the pass still runs.
    pub fn render<R: Renderer>(&mut self, renderer: &mut R) {
        if self.needs_full_redraw {
            renderer.clear_screen();
            self.world.draw_full(renderer);
            if self.decorations {
                self.draw_decorations(renderer);
                // Floor items stay on top of decorations, as on incremental ticks.
                self.world.draw_occupied(renderer);
            }
            self.needs_full_redraw = false;
        } else {
            for stale in &self.stale {
                self.restore(renderer, *stale);
            }
            self.world.draw_occupied(renderer);
        }
        self.stale.clear();

        let (width, height) = self.extent;
        for spec in &self.fields {
            if let Some((focus, marker)) = spec.marker_at(width, height) {
                let (x, y) = focus.cell();
                skip_failed(renderer.plot_colored(x, y, marker.glyph, marker.color));
            }
        }

        for body in &self.bodies {
            skip_failed(body.draw(renderer));
        }

        if self.hud {
            self.draw_hud(renderer);
        }
    }

    /// Repaints a cell a body just left: the floor item underneath, a trail
    /// dot, or a blank.
    fn restore<R: Renderer>(&self, renderer: &mut R, stale: Stale) {
        let (x, y) = stale.cell;
        let top = if x >= 0 && y >= 0 {
            self.world.peek(x as u16, y as u16)
        } else {
            None
        };
        let result = match top {
            Some(item) => renderer.plot_colored(x, y, item.glyph(), item.color()),
            None if self.trail => renderer.plot_colored(x, y, '.', stale.color),
            None => renderer.erase(x, y),
        };
        skip_failed(result);
    }

    fn draw_decorations<R: Renderer>(&self, renderer: &mut R) {
        let (width, height) = self.extent;
        let focus = Vec2::new(width as f64 * 0.75, height as f64 * 0.75);
        render::draw_circle(renderer, focus, 10.0, '@', ColorId::Yellow);
        render::draw_circle(renderer, focus, 5.0, 'x', ColorId::Blue);
        render::draw_circle(renderer, focus, 1.0, 'X', ColorId::Red);
        render::draw_line(
            renderer,
            Vec2::new(1.0, 1.0),
            Vec2::new(80.0, 10.0),
            'u',
            ColorId::Green,
        );
    }

    /// Status rows are redrawn in place every tick, so each field is padded
    /// to its column width to cover what the previous tick wrote.
    fn draw_hud<R: Renderer>(&self, renderer: &mut R) {
        let (width, height) = self.extent;
        let status = height - 2;
        skip_failed(renderer.text(
            0,
            status,
            &format!("{:<HUD_FIELD$}", format!("Iteration: {}", self.iteration)),
            Some(ColorId::Red),
        ));
        if let Some(last) = self.bodies.last() {
            let pos = format!("Pos: {:.3} {:.3}", last.position.x, last.position.y);
            let vel = format!("Vel: {:.3} {:.3}", last.velocity.x, last.velocity.y);
            skip_failed(renderer.text(HUD_FIELD as i32, status, &format!("{pos:<HUD_FIELD$}"), None));
            skip_failed(renderer.text(2 * HUD_FIELD as i32, status, &format!("{vel:<HUD_FIELD$}"), None));
        }
        let world = format!("World: {width}x{height}");
        skip_failed(renderer.text(0, height - 1, &format!("{world:<HUD_FIELD$}"), None));
    }
}

fn clamp_extent(v: i32) -> u16 {
    v.clamp(0, i32::from(u16::MAX)) as u16
}

fn skip_failed(result: Result<(), RenderError>) {
    if let Err(err) = result {
        debug!("draw skipped: {err}");
    }
}
