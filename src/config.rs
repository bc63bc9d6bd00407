use std::{fs, path::Path, path::PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::{
    error::ConfigError,
    field::{Falloff, FieldKind, FieldSpec, Marker},
    types::ColorId,
};

pub const SIM_HZ: f64 = 60.0;

pub const INIT_BODIES: usize = 50;
pub const BODY_MASS: f64 = 10.0;
pub const RESTITUTION: f64 = 0.5;

pub const SINK_MAGNITUDE: f64 = 300.0;
pub const CORE_SINK_MAGNITUDE: f64 = 500.0;
pub const DRAG_MAX_VELOCITY: f64 = 60.0;
pub const DRAG_LOSS: f64 = 0.5;

pub const INIT_ITEMS: usize = 12;
pub const ITEM_GLYPHS: [char; 4] = ['$', '%', '&', '*'];

pub const HEADLESS_WIDTH: u16 = 80;
pub const HEADLESS_HEIGHT: u16 = 24;
pub const HEADLESS_TICKS: u64 = 600;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Force-field particle toy for the terminal", long_about = None)]
pub struct Cli {
    /// Scene file (TOML) overriding the built-in scene
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for body placement and glyphs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of randomly placed bodies
    #[arg(short, long)]
    pub bodies: Option<usize>,

    /// Ticks per second
    #[arg(long)]
    pub fps: Option<f64>,

    /// Stop after this many ticks
    #[arg(short, long)]
    pub ticks: Option<u64>,

    /// Run against an in-memory screen instead of the terminal
    #[arg(long)]
    pub headless: bool,

    /// Write log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// A body placed at explicit coordinates by the scene file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub velocity: [f64; 2],
    pub mass: Option<f64>,
    pub glyph: Option<char>,
    pub color: Option<ColorId>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub fps: f64,
    pub seed: Option<u64>,
    pub bodies: usize,
    pub body_mass: f64,
    pub restitution: f64,
    /// Leave a dot behind moving bodies instead of blanking their old cell.
    pub trail: bool,
    pub decorations: bool,
    pub hud: bool,
    pub items: usize,
    pub fields: Vec<FieldSpec>,
    pub placements: Vec<Placement>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: SIM_HZ,
            seed: None,
            bodies: INIT_BODIES,
            body_mass: BODY_MASS,
            restitution: RESTITUTION,
            trail: false,
            decorations: true,
            hud: true,
            items: INIT_ITEMS,
            fields: default_fields(),
            placements: Vec::new(),
        }
    }
}

fn sink(anchor: [f64; 2], magnitude: f64, glyph: char) -> FieldSpec {
    FieldSpec {
        anchor,
        kind: FieldKind::Sink {
            magnitude,
            falloff: Falloff::Constant,
        },
        marker: Some(Marker {
            glyph,
            color: ColorId::Red,
        }),
    }
}

pub fn default_fields() -> Vec<FieldSpec> {
    vec![
        sink([0.5, 0.4], SINK_MAGNITUDE, '^'),
        sink([0.4, 0.5], SINK_MAGNITUDE, '<'),
        sink([0.6, 0.5], SINK_MAGNITUDE, '>'),
        sink([0.5, 0.6], SINK_MAGNITUDE, 'v'),
        sink([0.5, 0.5], CORE_SINK_MAGNITUDE, '.'),
        FieldSpec {
            anchor: [0.0, 0.0],
            kind: FieldKind::Drag {
                max_velocity: DRAG_MAX_VELOCITY,
                loss: DRAG_LOSS,
            },
            marker: None,
        },
    ]
}

impl Settings {
    /// Built-in scene, or the scene file at `path` layered over it.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let settings = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(bodies) = cli.bodies {
            self.bodies = bodies;
        }
        if let Some(fps) = cli.fps {
            self.fps = fps;
        }
        self.validate()
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(invalid("fps must be positive"));
        }
        if !(self.body_mass.is_finite() && self.body_mass > 0.0) {
            return Err(invalid("body_mass must be positive"));
        }
        if !(self.restitution > 0.0 && self.restitution < 1.0) {
            return Err(invalid("restitution must be between 0 and 1"));
        }

        for (idx, field) in self.fields.iter().enumerate() {
            if !field.anchor.iter().all(|v| v.is_finite()) {
                return Err(invalid(format!("field {idx}: anchor must be finite")));
            }
            match field.kind {
                FieldKind::Sink { magnitude, .. } if !magnitude.is_finite() => {
                    return Err(invalid(format!("field {idx}: magnitude must be finite")));
                }
                FieldKind::Source { magnitude, cutoff }
                    if !magnitude.is_finite() || !non_negative(cutoff) =>
                {
                    return Err(invalid(format!(
                        "field {idx}: source needs a finite magnitude and a finite, non-negative cutoff"
                    )));
                }
                FieldKind::Drag { max_velocity, loss }
                    if !non_negative(max_velocity) || !non_negative(loss) =>
                {
                    return Err(invalid(format!(
                        "field {idx}: drag threshold and loss must be finite and non-negative"
                    )));
                }
                _ => {}
            }
        }

        for (idx, placement) in self.placements.iter().enumerate() {
            if !(placement.x >= 0.0 && placement.y >= 0.0) {
                return Err(invalid(format!("placement {idx}: coordinates must be non-negative")));
            }
            if let Some(mass) = placement.mass {
                if !(mass.is_finite() && mass > 0.0) {
                    return Err(invalid(format!("placement {idx}: mass must be positive")));
                }
            }
        }

        Ok(())
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}
