//! Behavior state machine: IDLE, ALERT, COMBAT.
//!
//! Transitions are a static table of (from-states, conditions) → state rows,
//! evaluated in declaration order. Tasks may only *suggest* a state; the
//! suggestion is refused when the table would immediately drive the agent to
//! a more urgent state.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conditions::Conditions;

/// High-level behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcState {
    /// Nothing going on.
    #[default]
    Idle,
    /// Something happened; looking around.
    Alert,
    /// Fighting.
    Combat,
}

impl NpcState {
    /// Urgency rank. Higher is more urgent.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Alert => 1,
            Self::Combat => 2,
        }
    }

    /// Numeric value used for the `npcstate` criterion.
    #[must_use]
    pub fn criteria_value(self) -> u8 {
        self.rank() + 1
    }
}

impl fmt::Display for NpcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Alert => "alert",
            Self::Combat => "combat",
        };
        f.write_str(name)
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    /// States the rule applies in.
    pub from: &'static [NpcState],
    /// Fires when any of these conditions is active...
    pub when_any: Conditions,
    /// ...and none of these is.
    pub unless: Conditions,
    /// Target state.
    pub to: NpcState,
}

impl TransitionRule {
    fn matches(&self, state: NpcState, conditions: Conditions) -> bool {
        self.from.contains(&state)
            && conditions.intersects(self.when_any)
            && !conditions.intersects(self.unless)
    }
}

/// Stock transitions.
pub const DEFAULT_TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: &[NpcState::Idle, NpcState::Alert],
        when_any: Conditions::NEW_ENEMY.union(Conditions::SEE_ENEMY),
        unless: Conditions::empty(),
        to: NpcState::Combat,
    },
    TransitionRule {
        from: &[NpcState::Idle],
        when_any: Conditions::DAMAGE
            .union(Conditions::HEAR_DANGER)
            .union(Conditions::HEAR_PHYSICS_DANGER)
            .union(Conditions::HEAR_COMBAT)
            .union(Conditions::HEAR_BULLET_IMPACT),
        unless: Conditions::empty(),
        to: NpcState::Alert,
    },
    TransitionRule {
        from: &[NpcState::Combat],
        when_any: Conditions::ENEMY_LOST,
        unless: Conditions::SEE_ENEMY,
        to: NpcState::Alert,
    },
];

/// Current state plus the active conditions that drive it.
#[derive(Debug, Clone)]
pub struct BehaviorStateMachine {
    state: NpcState,
    conditions: Conditions,
    rules: &'static [TransitionRule],
}

impl BehaviorStateMachine {
    /// Idle machine with the stock transitions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_TRANSITIONS)
    }

    /// Idle machine with custom transitions.
    #[must_use]
    pub fn with_rules(rules: &'static [TransitionRule]) -> Self {
        Self {
            state: NpcState::Idle,
            conditions: Conditions::empty(),
            rules,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> NpcState {
        self.state
    }

    /// Active conditions.
    #[must_use]
    pub fn conditions(&self) -> Conditions {
        self.conditions
    }

    /// Whether every condition in `c` is active.
    #[must_use]
    pub fn has(&self, c: Conditions) -> bool {
        self.conditions.contains(c)
    }

    /// Raise conditions.
    pub fn raise(&mut self, c: Conditions) {
        self.conditions |= c;
    }

    /// Clear conditions.
    pub fn clear(&mut self, c: Conditions) {
        self.conditions &= !c;
    }

    /// Raise or clear depending on `on`.
    pub fn set(&mut self, c: Conditions, on: bool) {
        self.conditions.set(c, on);
    }

    fn driven_from(&self, state: NpcState) -> Option<NpcState> {
        self.rules
            .iter()
            .find(|r| r.matches(state, self.conditions))
            .map(|r| r.to)
    }

    /// Apply the first matching rule. Returns `(from, to)` when the state changed.
    pub fn evaluate(&mut self) -> Option<(NpcState, NpcState)> {
        let to = self.driven_from(self.state)?;
        if to == self.state {
            return None;
        }
        let from = self.state;
        self.state = to;
        debug!(%from, %to, conditions = ?self.conditions, "state transition");
        Some((from, to))
    }

    /// Request a state change. Refused when the active conditions would drive
    /// the agent from `target` straight to a more urgent state.
    pub fn suggest(&mut self, target: NpcState) -> bool {
        if let Some(driven) = self.driven_from(target)
            && driven.rank() > target.rank()
        {
            debug!(%target, %driven, "state suggestion refused");
            return false;
        }
        if self.state != target {
            debug!(from = %self.state, to = %target, "state suggestion accepted");
        }
        self.state = target;
        true
    }

    /// Set the state unconditionally.
    pub fn force(&mut self, state: NpcState) {
        self.state = state;
    }
}

impl Default for BehaviorStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
