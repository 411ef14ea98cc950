//! Perceptual and behavioral condition flags.
//!
//! Conditions are raised by sensing and enemy tracking, read by the state
//! machine's transition table, by schedule selection and by schedule
//! interrupts.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Boolean conditions active on an agent this tick.
    ///
    /// Serialized as a `|`-separated list of names, so schedule libraries
    /// can declare interrupts in TOML as `"NEW_ENEMY | SEE_ENEMY"`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Conditions: u32 {
        /// An enemy is currently in sight.
        const SEE_ENEMY           = 1 << 0;
        /// An enemy was seen for the first time.
        const NEW_ENEMY           = 1 << 1;
        /// No enemy has been seen for a while.
        const ENEMY_LOST          = 1 << 2;
        /// Took a small amount of damage.
        const LIGHT_DAMAGE        = 1 << 3;
        /// Took a large amount of damage.
        const HEAVY_DAMAGE        = 1 << 4;
        /// Heard combat noise.
        const HEAR_COMBAT         = 1 << 5;
        /// Heard danger (grenade, explosive).
        const HEAR_DANGER         = 1 << 6;
        /// Heard an incoming physics object.
        const HEAR_PHYSICS_DANGER = 1 << 7;
        /// Heard a bullet hit nearby.
        const HEAR_BULLET_IMPACT  = 1 << 8;
        /// Heard combat noise on the spooky channel.
        const HEAR_SPOOKY         = 1 << 9;
        /// Smelled meat or a carcass.
        const SMELL               = 1 << 10;
        /// Heard world noise.
        const HEAR_WORLD          = 1 << 11;
        /// Heard the player.
        const HEAR_PLAYER         = 1 << 12;
        /// Enough enemies are close to count as mobbed.
        const MOBBED_BY_ENEMIES   = 1 << 13;
        /// Something worth glancing at while idle.
        const IDLE_INTERRUPT      = 1 << 14;
    }
}

impl Conditions {
    /// Any hearing condition.
    pub const HEARING: Self = Self::HEAR_COMBAT
        .union(Self::HEAR_DANGER)
        .union(Self::HEAR_PHYSICS_DANGER)
        .union(Self::HEAR_BULLET_IMPACT)
        .union(Self::HEAR_SPOOKY)
        .union(Self::SMELL)
        .union(Self::HEAR_WORLD)
        .union(Self::HEAR_PLAYER);

    /// Any damage condition.
    pub const DAMAGE: Self = Self::LIGHT_DAMAGE.union(Self::HEAVY_DAMAGE);

    /// Conditions that describe a single moment and are cleared after the
    /// sub-agent's think.
    pub const ONE_SHOT: Self = Self::NEW_ENEMY
        .union(Self::DAMAGE)
        .union(Self::HEARING)
        .union(Self::IDLE_INTERRUPT);
}
