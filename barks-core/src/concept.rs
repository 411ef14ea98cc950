//! Concepts: opaque intent identifiers handed to the concept resolver.
//!
//! The core never interprets a concept beyond equality; the well-known
//! constants below are the ones the decision engine and companion hooks
//! speak.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque intent identifier ("wound", "danger", "idle-chatter", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Concept(Cow<'static, str>);

impl Concept {
    /// Took damage.
    pub const WOUND: Self = Self::from_static("wound");
    /// Died.
    pub const DEATH: Self = Self::from_static("death");
    /// Picked up a weapon.
    pub const NEW_WEAPON: Self = Self::from_static("new-weapon");
    /// Recalled squad members to follow.
    pub const COMMAND_RECALL: Self = Self::from_static("command-recall");
    /// Sent squad members to a point.
    pub const COMMAND_SEND: Self = Self::from_static("command-send");
    /// Killed an enemy.
    pub const ENEMY_DEAD: Self = Self::from_static("enemy-dead");
    /// An ally killed an enemy.
    pub const PLAYER_KILLED_NPC: Self = Self::from_static("player-killed-npc");
    /// An ally was killed.
    pub const ALLY_KILLED: Self = Self::from_static("ally-killed");
    /// Answering a question from a scripting layer.
    pub const ANSWER: Self = Self::from_static("answer");
    /// Spotted danger (grenade, explosive barrel, incoming physics object).
    pub const DANGER: Self = Self::from_static("danger");
    /// Smelled something.
    pub const SMELL: Self = Self::from_static("smell");
    /// Heard something spooky in the dark.
    pub const DARKNESS_HEARD_SOUND: Self = Self::from_static("darkness-heard-sound");
    /// Hurt while idle.
    pub const PLAYER_HURT: Self = Self::from_static("player-hurt");
    /// Surrounded by close enemies.
    pub const MOBBED: Self = Self::from_static("mobbed");
    /// Many enemies in view.
    pub const MANY_ENEMIES: Self = Self::from_static("many-enemies");
    /// Ambient idle chatter.
    pub const IDLE_CHATTER: Self = Self::from_static("idle-chatter");
    /// Ambient combat chatter.
    pub const UNDER_ATTACK_CHATTER: Self = Self::from_static("under-attack-chatter");
    /// First enemy after a quiet period.
    pub const START_COMBAT: Self = Self::from_static("start-combat");

    /// A concept from a static string.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// A concept from an owned name, e.g. loaded from data.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_and_static_compare_equal() {
        assert_eq!(Concept::new("danger"), Concept::DANGER);
        assert_ne!(Concept::MOBBED, Concept::MANY_ENEMIES);
        assert_eq!(Concept::WOUND.to_string(), "wound");
    }
}
