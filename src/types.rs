use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::Deserialize;

use crate::error::RenderError;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

impl<T> Vec2<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Vec2<f64> {
    pub const ZERO: Vec2<f64> = Vec2 { x: 0.0, y: 0.0 };

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalize(self) -> Vec2<f64> {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    #[cfg(test)]
    pub fn dot(self, other: Vec2<f64>) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Nearest character cell.
    pub fn cell(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl<T: Neg<Output = T>> Neg for Vec2<T> {
    type Output = Vec2<T>;

    fn neg(self) -> Vec2<T> {
        Vec2::new(-self.x, -self.y)
    }
}

impl<T: Add<Output = T>> Add for Vec2<T> {
    type Output = Vec2<T>;

    fn add(self, rhs: Vec2<T>) -> Vec2<T> {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: AddAssign> AddAssign for Vec2<T> {
    fn add_assign(&mut self, rhs: Vec2<T>) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T: Sub<Output = T>> Sub for Vec2<T> {
    type Output = Vec2<T>;

    fn sub(self, rhs: Vec2<T>) -> Vec2<T> {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: SubAssign> SubAssign for Vec2<T> {
    fn sub_assign(&mut self, rhs: Vec2<T>) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vec2<T> {
    type Output = Vec2<T>;

    fn mul(self, rhs: T) -> Vec2<T> {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2<f64>> for f64 {
    type Output = Vec2<f64>;

    fn mul(self, rhs: Vec2<f64>) -> Vec2<f64> {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

/// Terminal foreground colors. Numeric ids run from [`ColorId::MIN`] to [`ColorId::MAX`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub enum ColorId {
    Red = 1,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Black,
}

impl ColorId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    pub const ALL: [ColorId; 8] = [
        ColorId::Red,
        ColorId::Green,
        ColorId::Yellow,
        ColorId::Blue,
        ColorId::Magenta,
        ColorId::Cyan,
        ColorId::White,
        ColorId::Black,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "red" => Some(ColorId::Red),
            "green" => Some(ColorId::Green),
            "yellow" => Some(ColorId::Yellow),
            "blue" => Some(ColorId::Blue),
            "magenta" => Some(ColorId::Magenta),
            "cyan" => Some(ColorId::Cyan),
            "white" => Some(ColorId::White),
            "black" => Some(ColorId::Black),
            _ => None,
        }
    }
}

impl TryFrom<u8> for ColorId {
    type Error = RenderError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        if !(ColorId::MIN..=ColorId::MAX).contains(&id) {
            return Err(RenderError::InvalidColor(id as i64));
        }
        Ok(ColorId::ALL[(id - ColorId::MIN) as usize])
    }
}

/// Scene files may name a color or give its numeric id.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Id(i64),
    Name(String),
}

impl TryFrom<ColorRepr> for ColorId {
    type Error = RenderError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Id(id) => {
                let id = u8::try_from(id).map_err(|_| RenderError::InvalidColor(id))?;
                ColorId::try_from(id)
            }
            ColorRepr::Name(name) => {
                ColorId::from_name(&name).ok_or(RenderError::UnknownColor(name))
            }
        }
    }
}

/// Anything that can be drawn as a single colored glyph.
pub trait Drawable {
    fn glyph(&self) -> char;
    fn color(&self) -> ColorId;
}

/// A floor item resting on the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    pub glyph: char,
    pub color: ColorId,
}

impl Item {
    pub fn new(glyph: char, color: ColorId) -> Self {
        Self { glyph, color }
    }
}

impl Drawable for Item {
    fn glyph(&self) -> char {
        self.glyph
    }

    fn color(&self) -> ColorId {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod vec2_new {
        use super::*;

        #[test]
        fn creates_vector_with_given_coordinates() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.x, 3.0);
            assert_eq!(v.y, 4.0);
        }

        #[test]
        fn works_for_integer_components() {
            let v = Vec2::new(2_i32, -1) + Vec2::new(1, 1);
            assert_eq!(v, Vec2::new(3, 0));
        }
    }

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length() {
            assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
        }

        #[test]
        fn zero_vector_has_zero_length() {
            assert_eq!(Vec2::ZERO.length(), 0.0);
        }
    }

    mod vec2_normalize {
        use super::*;

        #[test]
        fn normalizes_non_zero_vector() {
            let v = Vec2::new(3.0, 4.0).normalize();
            assert!((v.x - 0.6).abs() < 1e-12);
            assert!((v.y - 0.8).abs() < 1e-12);
        }

        #[test]
        fn zero_vector_normalizes_to_zero() {
            let v = Vec2::ZERO.normalize();
            assert_eq!(v, Vec2::ZERO);
            assert!(v.is_finite());
        }

        proptest! {
            #[test]
            fn unit_length_and_same_direction(x in -1.0e6..1.0e6_f64, y in -1.0e6..1.0e6_f64) {
                let v = Vec2::new(x, y);
                prop_assume!(v.length() > 1e-9);
                let n = v.normalize();
                prop_assert!((n.length() - 1.0).abs() < 1e-9);
                prop_assert!(n.dot(v) > 0.0);
            }
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn negates() {
            assert_eq!(-Vec2::new(1.0, -2.0), Vec2::new(-1.0, 2.0));
        }

        #[test]
        fn adds_and_subtracts() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            assert_eq!(a, Vec2::new(4.0, 6.0));
            a -= Vec2::new(1.0, 1.0);
            assert_eq!(a, Vec2::new(3.0, 5.0));
            assert_eq!(a - Vec2::new(3.0, 5.0), Vec2::ZERO);
        }

        #[test]
        fn scales_both_ways() {
            let v = Vec2::new(2.0, 3.0);
            assert_eq!(v * 2.0, Vec2::new(4.0, 6.0));
            assert_eq!(2.0 * v, Vec2::new(4.0, 6.0));
        }

        #[test]
        fn rounds_to_nearest_cell() {
            assert_eq!(Vec2::new(2.4, 2.6).cell(), (2, 3));
        }
    }

    mod color_id {
        use super::*;

        #[test]
        fn converts_every_valid_id() {
            for id in ColorId::MIN..=ColorId::MAX {
                let color = ColorId::try_from(id).expect("valid id");
                assert_eq!(color as u8, id);
            }
        }

        #[test]
        fn rejects_ids_outside_range() {
            assert!(matches!(ColorId::try_from(0), Err(RenderError::InvalidColor(0))));
            assert!(matches!(ColorId::try_from(9), Err(RenderError::InvalidColor(9))));
        }

        #[test]
        fn resolves_names_case_insensitively() {
            assert_eq!(ColorId::from_name("Cyan"), Some(ColorId::Cyan));
            assert_eq!(ColorId::from_name("purple"), None);
        }
    }

    mod item {
        use super::*;

        #[test]
        fn exposes_glyph_and_color() {
            let item = Item::new('$', ColorId::Yellow);
            assert_eq!(item.glyph(), '$');
            assert_eq!(item.color(), ColorId::Yellow);
        }
    }
}
