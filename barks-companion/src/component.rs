//! The companion's sensing component.
//!
//! A player-controlled character is not an AI agent, so it cannot hear,
//! track enemies or hold a behavior state on its own. This component is the
//! detached sub-agent that does that for it. It refers back to its owner only
//! through the [`EntityId`] inside [`SensingAgent`]; the owning
//! [`crate::player::CompanionPlayer`] creates it at spawn and drops it on
//! death or removal.

use barks_core::agent::SensingAgent;
use barks_core::conditions::Conditions;
use barks_core::config::{BarksConfig, CombatConfig};
use barks_core::metrics::spans;
use barks_core::schedule::{ScheduleLibrary, StepReport, TaskHandler};
use barks_core::sensing::SoundKind;
use barks_core::speaker::Speaker;
use barks_core::state::NpcState;
use barks_core::types::{Disposition, EntityId, SimTime, Vec3};
use barks_core::world::WorldView;
use tracing::{debug, trace};

/// Sensing sub-agent plus the combat perception rules that drive it.
#[derive(Debug, Clone)]
pub struct SensingComponent {
    agent: SensingAgent,
    combat: CombatConfig,
}

impl SensingComponent {
    /// Component for the character `outer`.
    #[must_use]
    pub fn new(outer: EntityId, config: &BarksConfig) -> Self {
        Self {
            agent: SensingAgent::new(outer, SoundKind::COMPANION_INTERESTS, config),
            combat: config.combat.clone(),
        }
    }

    /// The sub-agent.
    #[must_use]
    pub fn agent(&self) -> &SensingAgent {
        &self.agent
    }

    /// The sub-agent, mutably.
    pub fn agent_mut(&mut self) -> &mut SensingAgent {
        &mut self.agent
    }

    /// Record a sighting of `enemy` at `position`. Raises `NEW_ENEMY` the
    /// first time an enemy is seen. Returns whether it was new.
    pub fn perceive_enemy(&mut self, enemy: EntityId, position: Vec3, now: SimTime) -> bool {
        let new = self.agent.enemies.update(enemy, position, now);
        self.agent.note_enemy_seen(now);
        if new {
            debug!(outer = %self.agent.outer(), %enemy, "new enemy");
            self.agent.machine.raise(Conditions::NEW_ENEMY);
        }
        new
    }

    /// Target priority of an enemy at `target` with base priority `base`,
    /// plus one when the speaker is roughly aiming at it and one more when
    /// aiming squarely.
    #[must_use]
    pub fn relation_priority(&self, speaker: &Speaker, target: Vec3, base: i32) -> i32 {
        let to_target = target.sub(speaker.position).normalized();
        let dot = speaker.facing.dot(to_target);
        let mut priority = base;
        if dot > self.combat.aim_bonus_dot {
            priority += 1;
        }
        if dot > self.combat.aim_strong_dot {
            priority += 1;
        }
        priority
    }

    /// One think of the sub-agent: refresh hearing and enemy conditions,
    /// step the schedule engine, then clear one-shot conditions.
    ///
    /// While the owner is flagged `no_target` the sub-agent idles and does
    /// nothing else.
    pub fn run_ai(
        &mut self,
        speaker: &Speaker,
        library: &ScheduleLibrary,
        handler: &mut dyn TaskHandler,
        world: &dyn WorldView,
        now: SimTime,
    ) -> StepReport {
        let _span = tracing::debug_span!(spans::AGENT_THINK, outer = %self.agent.outer()).entered();
        if speaker.no_target {
            trace!(outer = %self.agent.outer(), "no target; idling");
            return StepReport::default();
        }

        let heard = self.agent.senses.live_conditions(now);
        self.agent.machine.raise(heard);
        self.refresh_enemies(speaker, world, now);

        let report = self
            .agent
            .engine
            .step(library, &mut self.agent.machine, handler, now);
        self.agent.machine.clear(Conditions::ONE_SHOT);
        report
    }

    fn refresh_enemies(&mut self, speaker: &Speaker, world: &dyn WorldView, now: SimTime) {
        let outer = self.agent.outer();

        let gone: Vec<EntityId> = self
            .agent
            .enemies
            .iter()
            .filter(|r| world.entity(r.enemy).is_none_or(|info| !info.alive))
            .map(|r| r.enemy)
            .collect();
        for enemy in gone {
            self.agent.enemies.forget(enemy);
            if self.agent.current_enemy() == Some(enemy) {
                self.agent.set_current_enemy(None);
            }
        }

        let visible: Vec<(EntityId, Vec3)> = self
            .agent
            .enemies
            .iter()
            .filter(|r| world.relation(outer, r.enemy).is_hostile() && world.can_see(outer, r.enemy))
            .filter_map(|r| world.entity(r.enemy).map(|info| (r.enemy, info.position)))
            .collect();
        for &(enemy, position) in &visible {
            self.agent.enemies.update(enemy, position, now);
        }
        if !visible.is_empty() {
            self.agent.note_enemy_seen(now);
        }
        self.agent
            .enemies
            .forget_older_than(now, self.combat.enemy_lost_after);

        let sees = !visible.is_empty();
        self.agent.machine.set(Conditions::SEE_ENEMY, sees);
        let lost = !sees
            && self.agent.state() == NpcState::Combat
            && self
                .agent
                .last_enemy_time()
                .is_none_or(|t| now.since(t) >= self.combat.enemy_lost_after);
        if lost {
            debug!(%outer, "enemy lost");
            self.agent.machine.raise(Conditions::ENEMY_LOST);
        }

        let best = self.agent.enemies.select(|record| {
            if !visible.iter().any(|&(id, _)| id == record.enemy) {
                return None;
            }
            let base = match world.relation(outer, record.enemy) {
                Disposition::Hate => 1,
                Disposition::Fear => 0,
                Disposition::Like | Disposition::Neutral => return None,
            };
            Some(self.relation_priority(speaker, record.last_known_position, base))
        });
        if let Some(enemy) = best {
            if self.agent.current_enemy() != Some(enemy) {
                trace!(%outer, %enemy, "enemy changed");
            }
            self.agent.set_current_enemy(Some(enemy));
        }
    }
}
