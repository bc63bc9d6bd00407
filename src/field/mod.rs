use serde::Deserialize;

use crate::types::{ColorId, Vec2};

/// How a sink's pull scales with distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum Falloff {
    /// Exponent 0: the same pull everywhere, divided by the body's mass.
    Constant,
    /// Exponent 2: pull divided by the squared distance to the focus.
    InverseSquare,
}

impl TryFrom<u8> for Falloff {
    type Error = String;

    fn try_from(exponent: u8) -> Result<Self, Self::Error> {
        match exponent {
            0 => Ok(Falloff::Constant),
            2 => Ok(Falloff::InverseSquare),
            other => Err(format!("falloff exponent must be 0 or 2, got {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Sink { magnitude: f64, falloff: Falloff },
    Source { magnitude: f64, cutoff: f64 },
    Drag { max_velocity: f64, loss: f64 },
}

/// The part of a body's state a field reads.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    pub position: Vec2<f64>,
    pub velocity: Vec2<f64>,
    pub mass: f64,
}

/// A field resolved to absolute screen coordinates for the current tick.
#[derive(Clone, Copy, Debug)]
pub struct ForceField {
    pub focus: Vec2<f64>,
    pub kind: FieldKind,
}

impl ForceField {
    pub fn sink(focus: Vec2<f64>, magnitude: f64, falloff: Falloff) -> Self {
        Self {
            focus,
            kind: FieldKind::Sink { magnitude, falloff },
        }
    }

    pub fn source(focus: Vec2<f64>, magnitude: f64, cutoff: f64) -> Self {
        Self {
            focus,
            kind: FieldKind::Source { magnitude, cutoff },
        }
    }

    pub fn drag(max_velocity: f64, loss: f64) -> Self {
        Self {
            focus: Vec2::ZERO,
            kind: FieldKind::Drag { max_velocity, loss },
        }
    }

    /// Acceleration this field contributes to `probe`. Degenerate geometry
    /// (body on the focus, body at rest under drag) contributes nothing.
    pub fn evaluate(&self, probe: &Probe) -> Vec2<f64> {
        match self.kind {
            FieldKind::Sink { magnitude, falloff } => {
                let delta = self.focus - probe.position;
                let dist_sq = delta.length_sq();
                if dist_sq == 0.0 {
                    return Vec2::ZERO;
                }
                let dir = delta.normalize();
                match falloff {
                    Falloff::Constant => dir * (magnitude / probe.mass),
                    Falloff::InverseSquare => dir * (magnitude / dist_sq),
                }
            }
            FieldKind::Source { magnitude, cutoff } => {
                let delta = probe.position - self.focus;
                let dist = delta.length();
                if dist == 0.0 || dist > cutoff {
                    return Vec2::ZERO;
                }
                delta.normalize() * (magnitude / probe.mass)
            }
            FieldKind::Drag { max_velocity, loss } => {
                let speed = probe.velocity.length();
                if speed == 0.0 || speed <= max_velocity {
                    return Vec2::ZERO;
                }
                (-probe.velocity).normalize() * (speed * loss)
            }
        }
    }
}

/// Sum of every field's contribution.
pub fn accumulate(fields: &[ForceField], probe: &Probe) -> Vec2<f64> {
    fields
        .iter()
        .fold(Vec2::ZERO, |acc, field| acc + field.evaluate(probe))
}

/// Glyph drawn at a field's focus each tick.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Marker {
    pub glyph: char,
    #[serde(default = "default_marker_color")]
    pub color: ColorId,
}

fn default_marker_color() -> ColorId {
    ColorId::Red
}

/// Scene-level field description. The anchor is a fraction of the screen
/// extent, so fields follow the terminal when it is resized.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub anchor: [f64; 2],
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub marker: Option<Marker>,
}

impl FieldSpec {
    pub fn resolve(&self, width: i32, height: i32) -> ForceField {
        let focus = Vec2::new(self.anchor[0] * width as f64, self.anchor[1] * height as f64);
        match self.kind {
            FieldKind::Sink { magnitude, falloff } => ForceField::sink(focus, magnitude, falloff),
            FieldKind::Source { magnitude, cutoff } => ForceField::source(focus, magnitude, cutoff),
            FieldKind::Drag { max_velocity, loss } => ForceField::drag(max_velocity, loss),
        }
    }

    /// Only fields with a focus get a marker.
    pub fn marker_at(&self, width: i32, height: i32) -> Option<(Vec2<f64>, Marker)> {
        match (self.kind, self.marker) {
            (FieldKind::Drag { .. }, _) | (_, None) => None,
            (_, Some(marker)) => Some((self.resolve(width, height).focus, marker)),
        }
    }
}
