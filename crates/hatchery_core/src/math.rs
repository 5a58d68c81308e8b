//! Fixed-point math utilities for deterministic simulation.
//!
//! Eggs tick on both the authoritative and replica side from the same
//! synced inputs, so every positional and interpolated value uses
//! fixed-point arithmetic to keep the two views bit-identical.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (up).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Build a vector from whole-number coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    /// Component-wise multiplication.
    #[must_use]
    pub fn scale(self, factors: Self) -> Self {
        Self {
            x: self.x * factors.x,
            y: self.y * factors.y,
            z: self.z * factors.z,
        }
    }

    /// The block containing this point (floor of each coordinate).
    #[must_use]
    pub fn block_pos(self) -> BlockPos {
        BlockPos::new(
            self.x.floor().to_num(),
            self.y.floor().to_num(),
            self.z.floor().to_num(),
        )
    }
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// Integer block coordinate in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (up).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset this position.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// All positions in the cube of the given radius around this one,
    /// in x-major, then y, then z order.
    pub fn cube(self, radius: i32) -> impl Iterator<Item = BlockPos> {
        let r = radius.max(0);
        (-r..=r).flat_map(move |dx| {
            (-r..=r).flat_map(move |dy| (-r..=r).map(move |dz| self.offset(dx, dy, dz)))
        })
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3Fixed,
    /// Maximum corner.
    pub max: Vec3Fixed,
}

impl Aabb {
    /// Box of the given footprint width and height standing on `feet`.
    #[must_use]
    pub fn standing_at(feet: Vec3Fixed, width: Fixed, height: Fixed) -> Self {
        let half = width / Fixed::from_num(2);
        Self {
            min: Vec3Fixed::new(feet.x - half, feet.y, feet.z - half),
            max: Vec3Fixed::new(feet.x + half, feet.y + height, feet.z + half),
        }
    }

    /// Whether two boxes overlap (touching faces do not count).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pos_floors_negative_coordinates() {
        let v = Vec3Fixed::new(
            Fixed::from_num(-0.5),
            Fixed::from_num(64.9),
            Fixed::from_num(3),
        );
        assert_eq!(v.block_pos(), BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn test_cube_covers_radius() {
        let cube: Vec<_> = BlockPos::new(0, 0, 0).cube(1).collect();
        assert_eq!(cube.len(), 27);
        assert!(cube.contains(&BlockPos::new(-1, 1, -1)));
        assert!(cube.contains(&BlockPos::new(0, 0, 0)));
        assert_eq!(BlockPos::new(5, 5, 5).cube(0).count(), 1);
    }

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::standing_at(Vec3Fixed::ZERO, Fixed::from_num(1), Fixed::from_num(1));
        let b = Aabb::standing_at(
            Vec3Fixed::new(Fixed::from_num(0.5), Fixed::ZERO, Fixed::ZERO),
            Fixed::from_num(1),
            Fixed::from_num(1),
        );
        let c = Aabb::standing_at(
            Vec3Fixed::new(Fixed::from_num(1), Fixed::ZERO, Fixed::ZERO),
            Fixed::from_num(1),
            Fixed::from_num(1),
        );
        assert!(a.intersects(&b));
        // Touching faces only
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_scale_is_componentwise() {
        let v = Vec3Fixed::from_ints(2, 4, 6);
        let f = Vec3Fixed::new(Fixed::from_num(0.5), Fixed::from_num(1), Fixed::ZERO);
        assert_eq!(v.scale(f), Vec3Fixed::from_ints(1, 4, 0));
    }
}
