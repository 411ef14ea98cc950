//! Sound sensing buffer.
//!
//! Sounds emitted by the perception system are filtered on arrival (own
//! sounds and uninteresting kinds are dropped), aged out by expiry time, and
//! consumed at most once through [`SensingBuffer::acknowledge`]. The speech
//! pass only reacts to the batch returned by an acknowledgment, so a stimulus
//! can never fire two reactions.

use std::collections::VecDeque;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conditions::Conditions;
use crate::types::{EntityId, SimTime, Vec3};

// ---------------------------------------------------------------------------
// Sound Types
// ---------------------------------------------------------------------------

bitflags! {
    /// Stimulus kinds carried by a sound. A sound may carry several.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SoundKind: u32 {
        /// Gunfire, explosions, fighting.
        const COMBAT         = 1 << 0;
        /// Doors, footsteps, ambient world noise.
        const WORLD          = 1 << 1;
        /// Player-made noise.
        const PLAYER         = 1 << 2;
        /// Grenades and other imminent explosions.
        const DANGER         = 1 << 3;
        /// Bullets hitting nearby surfaces.
        const BULLET_IMPACT  = 1 << 4;
        /// A dead body.
        const CARCASS        = 1 << 5;
        /// Raw meat.
        const MEAT           = 1 << 6;
        /// Rotting garbage.
        const GARBAGE        = 1 << 7;
        /// A thumper pounding.
        const THUMPER        = 1 << 8;
        /// A physics object flying at the listener.
        const PHYSICS_DANGER = 1 << 9;
        /// Something asking the listener to step aside.
        const MOVE_AWAY      = 1 << 10;
    }
}

impl SoundKind {
    /// Scents.
    pub const SCENT: Self = Self::MEAT.union(Self::CARCASS);

    /// What the companion's sensing component listens for.
    pub const COMPANION_INTERESTS: Self = Self::WORLD
        .union(Self::COMBAT)
        .union(Self::PLAYER)
        .union(Self::DANGER)
        .union(Self::PHYSICS_DANGER)
        .union(Self::BULLET_IMPACT)
        .union(Self::SCENT)
        .union(Self::MOVE_AWAY);
}

/// Sub-channel a sound was emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundChannel {
    /// No particular channel.
    #[default]
    Unspecified,
    /// A noise that repeats.
    RepeatingNoise,
    /// Unsettling noise out of the dark.
    SpookyNoise,
    /// Weapon impact.
    WeaponImpact,
}

impl SoundChannel {
    /// Name used in criteria values.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::RepeatingNoise => "repeating_noise",
            Self::SpookyNoise => "spooky_noise",
            Self::WeaponImpact => "weapon_impact",
        }
    }
}

impl fmt::Display for SoundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A perceived sound.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    /// Stimulus kinds.
    pub kind: SoundKind,
    /// Who made the sound, if anyone.
    pub owner: Option<EntityId>,
    /// Where listeners should react towards.
    pub react_origin: Vec3,
    /// Sub-channel.
    pub channel: SoundChannel,
    /// When the sound stops being audible. `None` uses the buffer's default lifetime.
    pub expires_at: Option<SimTime>,
}

impl SoundEvent {
    /// A sound of `kind` at `origin` with no owner on the default channel.
    #[must_use]
    pub fn new(kind: SoundKind, react_origin: Vec3) -> Self {
        Self {
            kind,
            owner: None,
            react_origin,
            channel: SoundChannel::Unspecified,
            expires_at: None,
        }
    }

    /// Builder: set the owner.
    #[must_use]
    pub fn owned_by(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builder: set the channel.
    #[must_use]
    pub fn on_channel(mut self, channel: SoundChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Builder: set the expiry.
    #[must_use]
    pub fn expiring_at(mut self, at: SimTime) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Hearing conditions this sound raises.
    #[must_use]
    pub fn conditions(&self) -> Conditions {
        let mut c = Conditions::empty();
        if self.kind.contains(SoundKind::DANGER) {
            c |= Conditions::HEAR_DANGER;
        }
        if self.kind.contains(SoundKind::PHYSICS_DANGER) {
            c |= Conditions::HEAR_PHYSICS_DANGER;
        }
        if self.kind.contains(SoundKind::COMBAT) {
            c |= Conditions::HEAR_COMBAT;
            if self.channel == SoundChannel::SpookyNoise {
                c |= Conditions::HEAR_SPOOKY;
            }
        }
        if self.kind.contains(SoundKind::BULLET_IMPACT) {
            c |= Conditions::HEAR_BULLET_IMPACT;
        }
        if self.kind.intersects(SoundKind::SCENT) {
            c |= Conditions::SMELL;
        }
        if self.kind.contains(SoundKind::WORLD) {
            c |= Conditions::HEAR_WORLD;
        }
        if self.kind.contains(SoundKind::PLAYER) {
            c |= Conditions::HEAR_PLAYER;
        }
        c
    }
}

// ---------------------------------------------------------------------------
// Sensing Buffer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Heard {
    event: SoundEvent,
    expires_at: SimTime,
    consumed: bool,
}

/// Per-agent queue of recently heard sounds.
#[derive(Debug, Clone)]
pub struct SensingBuffer {
    outer: EntityId,
    interests: SoundKind,
    lifetime: f32,
    capacity: usize,
    heard: VecDeque<Heard>,
}

impl SensingBuffer {
    /// Buffer for an agent whose owning character is `outer`.
    #[must_use]
    pub fn new(outer: EntityId, interests: SoundKind, lifetime: f32, capacity: usize) -> Self {
        Self {
            outer,
            interests,
            lifetime,
            capacity: capacity.max(1),
            heard: VecDeque::new(),
        }
    }

    /// Offer a sound to the buffer. Returns `false` when it was filtered out:
    /// sounds made by the owning character, kinds outside the interest mask,
    /// and sounds that already expired.
    pub fn hear(&mut self, event: SoundEvent, now: SimTime) -> bool {
        if event.owner == Some(self.outer) {
            trace!(owner = %self.outer, "ignoring own sound");
            return false;
        }
        if !self.interests.intersects(event.kind) {
            return false;
        }
        let expires_at = event.expires_at.unwrap_or_else(|| now.after(self.lifetime));
        if expires_at <= now {
            return false;
        }
        if self.heard.len() == self.capacity {
            self.heard.pop_front();
        }
        self.heard.push_back(Heard {
            event,
            expires_at,
            consumed: false,
        });
        true
    }

    /// Drop expired sounds.
    pub fn prune(&mut self, now: SimTime) {
        self.heard.retain(|h| h.expires_at > now);
    }

    /// First sound not yet acknowledged.
    #[must_use]
    pub fn first_unconsumed(&self) -> Option<&SoundEvent> {
        self.unconsumed().next()
    }

    /// Every sound not yet acknowledged, oldest first.
    pub fn unconsumed(&self) -> impl Iterator<Item = &SoundEvent> {
        self.heard.iter().filter(|h| !h.consumed).map(|h| &h.event)
    }

    /// Hearing conditions of every live sound, consumed or not. Used by the
    /// sub-agent's think for interrupts and state transitions.
    #[must_use]
    pub fn live_conditions(&self, now: SimTime) -> Conditions {
        self.heard
            .iter()
            .filter(|h| h.expires_at > now)
            .fold(Conditions::empty(), |acc, h| acc | h.event.conditions())
    }

    /// Consume every unacknowledged live sound exactly once. Returns `None`
    /// when there was nothing new.
    pub fn acknowledge(&mut self, now: SimTime) -> Option<HeardBatch> {
        self.prune(now);
        let mut sounds = Vec::new();
        for h in self.heard.iter_mut().filter(|h| !h.consumed) {
            h.consumed = true;
            sounds.push(h.event.clone());
        }
        if sounds.is_empty() {
            return None;
        }
        trace!(count = sounds.len(), "acknowledged sounds");
        Some(HeardBatch::new(sounds))
    }

    /// Number of buffered sounds, consumed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heard.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heard.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.heard.clear();
    }
}

/// The sounds consumed by one acknowledgment.
#[derive(Debug, Clone)]
pub struct HeardBatch {
    sounds: Vec<SoundEvent>,
    conditions: Conditions,
}

impl HeardBatch {
    fn new(sounds: Vec<SoundEvent>) -> Self {
        let conditions = sounds
            .iter()
            .fold(Conditions::empty(), |acc, s| acc | s.conditions());
        Self { sounds, conditions }
    }

    /// Hearing conditions raised by the batch.
    #[must_use]
    pub fn conditions(&self) -> Conditions {
        self.conditions
    }

    /// The sounds, oldest first.
    #[must_use]
    pub fn sounds(&self) -> &[SoundEvent] {
        &self.sounds
    }

    /// Nearest sound to `listener` carrying any of `kind`, optionally
    /// restricted to one channel.
    #[must_use]
    pub fn best_sound(
        &self,
        kind: SoundKind,
        channel: Option<SoundChannel>,
        listener: Vec3,
    ) -> Option<&SoundEvent> {
        self.sounds
            .iter()
            .filter(|s| s.kind.intersects(kind))
            .filter(|s| channel.is_none_or(|c| s.channel == c))
            .min_by(|a, b| {
                a.react_origin
                    .dist_sqr(listener)
                    .total_cmp(&b.react_origin.dist_sqr(listener))
            })
    }
}
