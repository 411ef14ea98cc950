//! Event hooks the host game calls into.
//!
//! Each hook composes the criteria for one event and attempts a line. They
//! return whether anything was said; a refusal is never an error.

use barks_core::compose::DamageRecord;
use barks_core::conditions::Conditions;
use barks_core::criteria::Decision;
use barks_core::types::{Disposition, EntityId, HitGroup, LifeState, Vec3};
use barks_core::world::{EntityInfo, WorldView};
use barks_core::{Concept, SpeechEnv};
use tracing::{debug, info};

use crate::component::SensingComponent;
use crate::player::CompanionPlayer;

/// Where a squad command sends a member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandGoal {
    /// Recall to (follow) an entity.
    Entity(EntityId),
    /// Send to a point.
    Location(Vec3),
}

fn is_ally(world: &dyn WorldView, me: EntityId, info: &EntityInfo) -> bool {
    info.in_player_squad || world.relation(me, info.id) == Disposition::Like
}

impl CompanionPlayer {
    /// The companion was hurt. `speaker.health` should already reflect the
    /// damage. Raises light or heavy damage on the sensing component.
    pub fn on_take_damage(
        &mut self,
        damage: &DamageRecord,
        hit_group: HitGroup,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        self.speaker.last_hit_group = hit_group;
        if let Some(component) = self.component.as_mut() {
            let condition = if damage.amount >= self.config.combat.heavy_damage_threshold {
                Conditions::HEAVY_DAMAGE
            } else {
                Conditions::LIGHT_DAMAGE
            };
            component.agent_mut().machine.raise(condition);
        }

        let mut decision = Decision::new();
        self.speaker
            .append_damage_criteria(&mut decision, damage, true, env.world);
        let agent = self.component.as_ref().map(SensingComponent::agent);
        self.speaker
            .speak_if_allowed(&Concept::WOUND, decision, agent, env)
    }

    /// The companion died. The death line skips gating; afterwards the
    /// companion never speaks again and its sensing component is dropped.
    pub fn on_killed(&mut self, damage: &DamageRecord, env: &mut SpeechEnv<'_>) -> bool {
        self.speaker.life_state = LifeState::Dying;
        let mut decision = Decision::new();
        self.speaker
            .append_damage_criteria(&mut decision, damage, true, env.world);
        let agent = self.component.as_ref().map(SensingComponent::agent);
        let spoken = self.speaker.speak(&Concept::DEATH, decision, agent, env);

        info!(id = %self.speaker.id, "companion killed; speech silenced");
        self.speaker.life_state = LifeState::Dead;
        self.speaker.timing.silence();
        self.remove_component();
        spoken
    }

    /// The companion killed `victim`.
    pub fn on_killed_other(
        &mut self,
        victim: EntityId,
        damage: &DamageRecord,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        if let Some(component) = self.component.as_mut() {
            component.agent_mut().enemies.forget(victim);
        }

        let mut decision = Decision::new();
        self.speaker
            .append_damage_criteria(&mut decision, damage, false, env.world);
        self.speaker
            .append_enemy_criteria(&mut decision, Some(victim), env.world);
        if env
            .world
            .entity(victim)
            .is_some_and(|info| info.is_npc && info.is_speaking)
        {
            decision.append("enemy_is_speaking", "1");
        }
        let agent = self.component.as_ref().map(SensingComponent::agent);
        self.speaker
            .speak_if_allowed(&Concept::ENEMY_DEAD, decision, agent, env)
    }

    /// Some NPC died. Mourns allies and cheers allies' kills; kills by the
    /// companion itself and deaths out of view are ignored.
    pub fn on_npc_killed(
        &mut self,
        victim: EntityId,
        damage: &DamageRecord,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        let me = self.speaker.id;
        let world = env.world;
        if damage.attacker == Some(me) || !world.in_view(me, victim) {
            return false;
        }
        let Some(victim_info) = world.entity(victim) else {
            return false;
        };

        let mut decision = Decision::new();
        self.speaker
            .append_damage_criteria(&mut decision, damage, false, world);

        let concept = if is_ally(world, me, victim_info) {
            self.speaker
                .append_enemy_criteria(&mut decision, damage.attacker, world);
            self.speaker
                .append_speech_target_criteria(&mut decision, victim, world);
            Concept::ALLY_KILLED
        } else {
            let Some(attacker) = damage
                .attacker
                .and_then(|id| world.entity(id))
                .filter(|info| info.is_npc && is_ally(world, me, info))
                .map(|info| info.id)
            else {
                return false;
            };
            self.speaker
                .append_enemy_criteria(&mut decision, Some(victim), world);
            self.speaker
                .append_speech_target_criteria(&mut decision, attacker, world);
            Concept::PLAYER_KILLED_NPC
        };

        debug!(id = %me, %victim, %concept, "npc killed nearby");
        let agent = self.component.as_ref().map(SensingComponent::agent);
        self.speaker.speak_if_allowed(&concept, decision, agent, env)
    }

    /// The companion picked up `weapon`.
    pub fn on_pickup_weapon(&mut self, weapon: &str, env: &mut SpeechEnv<'_>) -> bool {
        let mut decision = Decision::new();
        self.speaker.append_weapon_criteria(&mut decision, Some(weapon));
        let agent = self.component.as_ref().map(SensingComponent::agent);
        self.speaker
            .speak_if_allowed(&Concept::NEW_WEAPON, decision, agent, env)
    }

    /// The companion commanded squad member `npc` towards `goal`.
    pub fn on_commander_execute(
        &mut self,
        npc: EntityId,
        goal: CommandGoal,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        let world = env.world;
        let agent = self.component.as_ref().map(SensingComponent::agent);
        match goal {
            CommandGoal::Entity(_) => {
                self.speaker
                    .speak_if_allowed(&Concept::COMMAND_RECALL, Decision::new(), agent, env)
            }
            CommandGoal::Location(point) => {
                let Some(member) = world.entity(npc).filter(|info| info.in_player_squad) else {
                    return false;
                };
                let mut decision = Decision::new();
                decision.append(
                    "commandpoint_dist_to_player",
                    format!("{:.0}", point.dist(self.speaker.position)),
                );
                decision.append(
                    "commandpoint_dist_to_npc",
                    format!("{:.0}", point.dist(member.position)),
                );
                self.speaker
                    .speak_if_allowed(&Concept::COMMAND_SEND, decision, agent, env)
            }
        }
    }

    /// The host's sight system spotted `enemy` at `position`. Tracks it on
    /// the sensing component and, when no enemy was seen for the quiet
    /// period, announces the fight.
    pub fn on_enemy_sighted(
        &mut self,
        enemy: EntityId,
        position: Vec3,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        let now = env.now;
        let quiet_period = self.config.speech.start_combat_quiet_period;
        let Some(component) = self.component.as_mut() else {
            return false;
        };
        let quiet = component
            .agent()
            .last_enemy_time()
            .is_none_or(|t| now.since(t) > quiet_period);
        component.perceive_enemy(enemy, position, now);

        let me = self.speaker.id;
        if !quiet || self.speaker.no_target || !env.world.can_see(me, enemy) {
            return false;
        }
        if env.world.entity(enemy).is_some_and(|info| info.target_practice) {
            return false;
        }

        let mut decision = Decision::new();
        self.speaker
            .append_enemy_criteria(&mut decision, Some(enemy), env.world);
        let agent = self.component.as_ref().map(SensingComponent::agent);
        self.speaker
            .speak_if_allowed(&Concept::START_COMBAT, decision, agent, env)
    }
}
