//! World-space value types shared by agents and the movement planner.

use std::fmt;

/// Point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Vec3 {
    /// Create a point from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// True if no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Block containing this point.
    pub fn floored(&self) -> BlockPos {
        BlockPos { x: self.x.floor() as i64, y: self.y.floor() as i64, z: self.z.floor() as i64 }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vec3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Renders each component rounded to one decimal.
impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}, {:.1}, {:.1}", self.x, self.y, self.z)
    }
}

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i64,
    /// Vertical axis.
    pub y: i64,
    /// North-south axis.
    pub z: i64,
}

impl BlockPos {
    /// Create a block coordinate.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Point an agent stands on when occupying this block.
    pub fn standing_point(&self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Static facts about the world an agent is connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldData {
    /// Protocol version the session negotiated.
    pub version: String,
    /// Lowest buildable height.
    pub min_y: i64,
    /// Highest buildable height.
    pub max_y: i64,
}

/// Movement rules handed to the planner before a goal is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementProfile {
    /// Version of the world data the profile was derived from.
    pub version: String,
    /// Planner may break blocks in the way.
    pub can_dig: bool,
    /// Planner may sprint.
    pub allow_sprinting: bool,
    /// Largest drop the planner accepts without a landing check.
    pub max_drop_down: u32,
    /// Vertical bounds of the world.
    pub height_range: (i64, i64),
}

impl MovementProfile {
    /// Default profile for a world.
    pub fn for_world(world: &WorldData) -> Self {
        Self {
            version: world.version.clone(),
            can_dig: true,
            allow_sprinting: true,
            max_drop_down: 4,
            height_range: (world.min_y, world.max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn display_rounds_to_one_decimal() {
        assert_eq!(Vec3::new(1.04, -2.26, 100.0).to_string(), "1.0, -2.3, 100.0");
    }

    #[test]
    fn floored_handles_negative_coordinates() {
        assert_eq!(Vec3::new(-0.5, 64.9, 3.0).floored(), BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn non_finite_components_are_detected() {
        assert!(Vec3::new(0.0, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn profile_carries_world_bounds() {
        let world = WorldData { version: "1.20.1".into(), min_y: -64, max_y: 320 };
        let profile = MovementProfile::for_world(&world);
        assert_eq!(profile.height_range, (-64, 320));
        assert_eq!(profile.version, "1.20.1");
    }

    proptest! {
        #[test]
        fn floored_block_contains_point(
            x in -30_000_000.0f64..30_000_000.0,
            y in -64.0f64..320.0,
            z in -30_000_000.0f64..30_000_000.0,
        ) {
            let block = Vec3::new(x, y, z).floored();

            prop_assert!(block.x as f64 <= x && x < block.x as f64 + 1.0);
            prop_assert!(block.y as f64 <= y && y < block.y as f64 + 1.0);
            prop_assert!(block.z as f64 <= z && z < block.z as f64 + 1.0);
        }
    }
}
