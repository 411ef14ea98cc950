//! Speech pacing: the per-agent decision cooldown and the ambient chatter roll.
//!
//! The cooldown is advanced once per decision pass, not once per utterance.
//! Ambient chatter has no timer of its own; the roll uses the freshly
//! advanced cooldown as its divisor, so states that think more often roll
//! more often but with a smaller chance each time.

use rand::Rng;

use crate::config::SpeechConfig;
use crate::state::NpcState;
use crate::types::SimTime;

/// Upper bound of both chatter draws.
pub const CHATTER_ROLL_MAX: u32 = 10;

/// When the next decision pass may run.
#[derive(Debug, Clone)]
pub struct SpeechTiming {
    next_allowed: SimTime,
    idle_interval: f32,
    alert_interval: f32,
}

impl SpeechTiming {
    /// Timing that allows a pass immediately.
    #[must_use]
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            next_allowed: SimTime::ZERO,
            idle_interval: config.idle_interval,
            alert_interval: config.alert_interval,
        }
    }

    /// Cooldown for `state`; `None` means the agent has no sensing component.
    #[must_use]
    pub fn cooldown(&self, state: Option<NpcState>) -> f32 {
        match state {
            Some(NpcState::Alert | NpcState::Combat) => self.alert_interval,
            Some(NpcState::Idle) | None => self.idle_interval,
        }
    }

    /// If the cooldown has strictly elapsed, advance it for `state` and
    /// return `true`.
    pub fn poll(&mut self, now: SimTime, state: Option<NpcState>) -> bool {
        if self.next_allowed >= now {
            return false;
        }
        self.next_allowed = now.after(self.cooldown(state));
        true
    }

    /// When the next pass may run.
    #[must_use]
    pub fn next_allowed(&self) -> SimTime {
        self.next_allowed
    }

    /// Seconds until the next pass.
    #[must_use]
    pub fn remaining(&self, now: SimTime) -> f32 {
        self.next_allowed.since(now)
    }

    /// Never run another pass.
    pub fn silence(&mut self) {
        self.next_allowed = SimTime::NEVER;
    }

    /// Allow a pass on the next poll.
    pub fn reset(&mut self) {
        self.next_allowed = SimTime::ZERO;
    }
}

impl Default for SpeechTiming {
    fn default() -> Self {
        Self::new(&SpeechConfig::default())
    }
}

/// `floor(r1 / modifier)`, or `None` when `modifier` is not positive.
///
/// Saturates at `u32::MAX` as `modifier` approaches zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn chatter_chance(r1: f32, modifier: f32) -> Option<u32> {
    if modifier > 0.0 {
        Some((r1 / modifier).floor() as u32)
    } else {
        None
    }
}

/// One ambient chatter roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatterRoll {
    /// Uniform float draw in `[0, 10]`.
    pub r1: f32,
    /// Uniform integer draw in `[0, 10]`.
    pub r2: u32,
    /// `floor(r1 / modifier)`.
    pub chance: u32,
}

impl ChatterRoll {
    /// Evaluate a roll from fixed draws. `None` when `modifier` is not positive.
    #[must_use]
    pub fn from_draws(r1: f32, r2: u32, modifier: f32) -> Option<Self> {
        let chance = chatter_chance(r1, modifier)?;
        Some(Self { r1, r2, chance })
    }

    /// Draw both values from `rng`. `None` when `modifier` is not positive,
    /// in which case nothing is drawn.
    #[allow(clippy::cast_precision_loss)]
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, modifier: f32) -> Option<Self> {
        if modifier <= 0.0 {
            return None;
        }
        let r1 = rng.gen_range(0.0..=CHATTER_ROLL_MAX as f32);
        let r2 = rng.gen_range(0..=CHATTER_ROLL_MAX);
        Self::from_draws(r1, r2, modifier)
    }

    /// Whether the ambient line should be attempted.
    #[must_use]
    pub fn fires(&self) -> bool {
        self.chance >= self.r2
    }
}
