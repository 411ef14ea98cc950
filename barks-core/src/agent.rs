//! The sensing sub-agent: the detached AI component a player-controlled
//! character carries to hear, track enemies and hold a behavior state.
//!
//! The sub-agent refers back to its owning character only by [`EntityId`].
//! The owner holds the sub-agent by value and drops it on its own teardown.

use crate::conditions::Conditions;
use crate::config::BarksConfig;
use crate::enemies::EnemyMemory;
use crate::schedule::ScheduleEngine;
use crate::sensing::{SensingBuffer, SoundEvent, SoundKind};
use crate::state::{BehaviorStateMachine, NpcState};
use crate::types::{EntityId, SimTime};

/// Perception and behavior state of one sub-agent.
#[derive(Debug, Clone)]
pub struct SensingAgent {
    outer: EntityId,
    /// Heard sounds.
    pub senses: SensingBuffer,
    /// Tracked enemies.
    pub enemies: EnemyMemory,
    /// Behavior state and active conditions.
    pub machine: BehaviorStateMachine,
    /// Running schedule.
    pub engine: ScheduleEngine,
    current_enemy: Option<EntityId>,
    last_enemy_time: Option<SimTime>,
}

impl SensingAgent {
    /// Sub-agent for the character `outer`, listening for `interests`.
    #[must_use]
    pub fn new(outer: EntityId, interests: SoundKind, config: &BarksConfig) -> Self {
        Self {
            outer,
            senses: SensingBuffer::new(
                outer,
                interests,
                config.sensing.sound_lifetime,
                config.sensing.capacity,
            ),
            enemies: EnemyMemory::new(),
            machine: BehaviorStateMachine::new(),
            engine: ScheduleEngine::new(config.schedule.max_task_steps),
            current_enemy: None,
            last_enemy_time: None,
        }
    }

    /// The owning character.
    #[must_use]
    pub fn outer(&self) -> EntityId {
        self.outer
    }

    /// Current behavior state.
    #[must_use]
    pub fn state(&self) -> NpcState {
        self.machine.state()
    }

    /// Whether every condition in `c` is active.
    #[must_use]
    pub fn has_condition(&self, c: Conditions) -> bool {
        self.machine.has(c)
    }

    /// Enemy the sub-agent is focused on.
    #[must_use]
    pub fn current_enemy(&self) -> Option<EntityId> {
        self.current_enemy
    }

    /// Change the focused enemy.
    pub fn set_current_enemy(&mut self, enemy: Option<EntityId>) {
        self.current_enemy = enemy;
    }

    /// Last time any enemy was seen, `None` if never.
    #[must_use]
    pub fn last_enemy_time(&self) -> Option<SimTime> {
        self.last_enemy_time
    }

    /// Record that an enemy was seen at `now`.
    pub fn note_enemy_seen(&mut self, now: SimTime) {
        self.last_enemy_time = Some(now);
    }

    /// Offer a sound to the sensing buffer.
    pub fn hear(&mut self, sound: SoundEvent, now: SimTime) -> bool {
        self.senses.hear(sound, now)
    }
}
