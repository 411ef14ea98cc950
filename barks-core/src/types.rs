//! Core type definitions shared by every barks subsystem.
//!
//! Identity, space and time are kept deliberately small: the core only ever
//! needs distances, a facing dot product and "how long ago".

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for any entity (companion, NPC, projectile) in the world.
///
/// Entities refer to each other only through this handle, never by pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D position or direction in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Construct a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length.
    #[must_use]
    pub fn length_sqr(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_sqr().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    /// Squared distance to `other`. Range checks compare against squared
    /// thresholds to avoid the square root.
    #[must_use]
    pub fn dist_sqr(self, other: Self) -> f32 {
        self.sub(other).length_sqr()
    }

    /// Distance to `other`.
    #[must_use]
    pub fn dist(self, other: Self) -> f32 {
        self.dist_sqr(other).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Simulation time in seconds since the world started.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct SimTime(pub f32);

impl SimTime {
    /// The start of the simulation. Also used as "never happened".
    pub const ZERO: Self = Self(0.0);

    /// A time that is never reached.
    pub const NEVER: Self = Self(f32::MAX);

    /// Construct from seconds.
    #[must_use]
    pub const fn from_secs(secs: f32) -> Self {
        Self(secs)
    }

    /// Seconds since the simulation started.
    #[must_use]
    pub const fn secs(self) -> f32 {
        self.0
    }

    /// This time shifted forward by `secs`.
    #[must_use]
    pub fn after(self, secs: f32) -> Self {
        Self(self.0 + secs)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is in the future).
    #[must_use]
    pub fn since(self, earlier: Self) -> f32 {
        self.0 - earlier.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

// ---------------------------------------------------------------------------
// Relations & Life
// ---------------------------------------------------------------------------

/// How one entity regards another. Ordered from most to least hostile so
/// that "hostile-or-worse" is a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Attack on sight.
    Hate,
    /// Flee from.
    Fear,
    /// Friendly.
    Like,
    /// Ignore.
    Neutral,
}

impl Disposition {
    /// Hate or fear.
    #[must_use]
    pub fn is_hostile(self) -> bool {
        self <= Self::Fear
    }
}

/// Life state of an entity. Ordered, so "past dying" is a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LifeState {
    /// Alive and well.
    #[default]
    Alive,
    /// Playing the death sequence; still allowed to speak.
    Dying,
    /// Dead.
    Dead,
    /// Dead and waiting to respawn.
    Respawnable,
}

impl LifeState {
    /// Whether the entity can no longer speak at all.
    #[must_use]
    pub fn is_past_dying(self) -> bool {
        self > Self::Dying
    }
}

/// Body region the last damage landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitGroup {
    /// Unknown or whole-body.
    #[default]
    Generic,
    /// Head.
    Head,
    /// Chest.
    Chest,
    /// Stomach.
    Stomach,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
}

impl HitGroup {
    /// Numeric code used in criteria values.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::Head => 1,
            Self::Chest => 2,
            Self::Stomach => 3,
            Self::LeftArm => 4,
            Self::RightArm => 5,
            Self::LeftLeg => 6,
            Self::RightLeg => 7,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
