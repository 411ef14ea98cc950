//! Criteria composition.
//!
//! Each routine here contributes one semantic category to a [`Decision`].
//! It marks the category before appending, and secondary contributors (the
//! general pass, damage → enemy) check the mark first so a category is
//! appended at most once per decision.

use crate::agent::SensingAgent;
use crate::collab::SpeechEnv;
use crate::criteria::{Decision, SpeechCategoryFlags};
use crate::sensing::SoundEvent;
use crate::speaker::Speaker;
use crate::state::NpcState;
use crate::types::EntityId;
use crate::world::WorldView;

/// A damage record supplied by the combat subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecord {
    /// Damage dealt.
    pub amount: f32,
    /// Damage type bits.
    pub damage_type: u32,
    /// Who dealt it.
    pub attacker: Option<EntityId>,
    /// What dealt it (projectile, prop, weapon).
    pub inflictor: Option<EntityId>,
}

impl DamageRecord {
    /// Damage of `amount` by `attacker`, inflicted directly.
    #[must_use]
    pub fn new(amount: f32, attacker: Option<EntityId>) -> Self {
        Self {
            amount,
            damage_type: 0,
            attacker,
            inflictor: attacker,
        }
    }
}

fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

impl Speaker {
    /// Damage criteria. When the speaker is the victim this also adds
    /// inflictor and hit-group details and, unless enemy criteria were
    /// already supplied, enemy criteria for the attacker.
    #[allow(clippy::cast_possible_truncation)]
    pub fn append_damage_criteria(
        &self,
        decision: &mut Decision,
        damage: &DamageRecord,
        speaker_is_victim: bool,
        world: &dyn WorldView,
    ) {
        decision.claim(SpeechCategoryFlags::DAMAGE);
        decision.append("damage", (damage.amount as i32).to_string());
        decision.append("damage_type", damage.damage_type.to_string());

        if speaker_is_victim {
            if let Some(inflictor) = damage.inflictor.and_then(|id| world.entity(id)) {
                decision.append("inflictor_is_physics", flag(inflictor.physics_driven));
            }
            decision.append("hitgroup", self.last_hit_group.code().to_string());
            if !decision.has(SpeechCategoryFlags::ENEMY) {
                self.append_enemy_criteria(decision, damage.attacker, world);
            }
        }
    }

    /// Enemy criteria for `enemy`. Without an enemy only
    /// `distancetoenemy=-1` is appended.
    pub fn append_enemy_criteria(
        &self,
        decision: &mut Decision,
        enemy: Option<EntityId>,
        world: &dyn WorldView,
    ) {
        decision.claim(SpeechCategoryFlags::ENEMY);
        match enemy.and_then(|id| world.entity(id)) {
            Some(info) => {
                decision.append("enemy", info.classname.as_str());
                decision.append(
                    "distancetoenemy",
                    format!("{:.6}", self.position.dist(info.position)),
                );
                decision.append("enemy_is_npc", flag(info.is_npc));
                decision.append("enemy_visible", flag(world.can_see(self.id, info.id)));
            }
            None => decision.append("distancetoenemy", "-1"),
        }
    }

    /// Squad size criteria.
    pub fn append_squad_criteria(&self, decision: &mut Decision) {
        decision.claim(SpeechCategoryFlags::SQUAD);
        decision.append("squadmembers", self.squad_size.unwrap_or(0).to_string());
    }

    /// Weapon criteria. Only a weapon other than the active one is
    /// appended; the claim still keeps the general pass from adding the
    /// active weapon.
    pub fn append_weapon_criteria(&self, decision: &mut Decision, weapon: Option<&str>) {
        decision.claim(SpeechCategoryFlags::WEAPON);
        if let Some(weapon) = weapon
            && self.active_weapon.as_deref() != Some(weapon)
        {
            decision.append("weapon", weapon);
        }
    }

    /// Criteria describing who a line is addressed to.
    pub fn append_speech_target_criteria(
        &self,
        decision: &mut Decision,
        target: EntityId,
        world: &dyn WorldView,
    ) {
        decision.claim(SpeechCategoryFlags::SPEECH_TARGET);
        let Some(info) = world.entity(target) else {
            return;
        };
        decision.append("speechtarget", info.classname.as_str());
        decision.append("speechtargetname", info.name.as_deref().unwrap_or(""));
        decision.append("speechtarget_visible", flag(world.can_see(self.id, target)));
        if info.is_npc {
            if let Some(weapon) = &info.active_weapon {
                decision.append("speechtarget_weapon", weapon.as_str());
            }
            decision.append("speechtarget_inplayersquad", flag(info.in_player_squad));
        }
    }

    /// Criteria for a sound reaction. Not a category: each reaction builds
    /// its own.
    pub fn append_sound_criteria(
        &self,
        decision: &mut Decision,
        sound: &SoundEvent,
        world: &dyn WorldView,
    ) {
        decision.append(
            "sound_distance",
            format!("{:.6}", self.position.dist(sound.react_origin)),
        );
        decision.append("sound_type", sound.kind.bits().to_string());
        if let Some(owner) = sound.owner.and_then(|id| world.entity(id)) {
            decision.append("sound_owner", owner.classname.as_str());
        }
        decision.append("sound_channel", sound.channel.as_str());
    }

    /// The general "gather all context" pass run for every line: squad,
    /// behavior state, combat enemy and counts, active weapon, health, and
    /// the speech filter's context. Categories already supplied are skipped.
    ///
    /// [`Speaker::speak`] places these criteria before the event-specific
    /// ones, so event criteria win where keys repeat.
    pub fn append_general_criteria(
        &self,
        decision: &mut Decision,
        agent: Option<&SensingAgent>,
        env: &SpeechEnv<'_>,
    ) {
        if !decision.has(SpeechCategoryFlags::SQUAD) {
            self.append_squad_criteria(decision);
        }

        if let Some(agent) = agent {
            decision.append("npcstate", agent.state().criteria_value().to_string());
            if agent.state() == NpcState::Combat {
                if !decision.has(SpeechCategoryFlags::ENEMY) {
                    self.append_enemy_criteria(decision, agent.current_enemy(), env.world);
                }
                decision.append("num_enemies", self.counts.visible.to_string());
                decision.append("close_enemies", self.counts.close.to_string());
            }
        }

        if !decision.has(SpeechCategoryFlags::WEAPON)
            && let Some(weapon) = &self.active_weapon
        {
            decision.append("weapon", weapon.as_str());
        }

        decision.append("health", format!("{:.0}", self.health));
        decision.append("healthfrac", format!("{:.3}", self.health_fraction()));

        if let Some(filter) = env.filter {
            filter.append_context(&mut decision.criteria);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{OpenExpresser, RecordingResolver, SpeechFilter};
    use crate::config::{BarksConfig, SpeechConfig};
    use crate::criteria::CriteriaSet;
    use crate::sensing::{SoundChannel, SoundKind};
    use crate::types::{SimTime, Vec3};
    use crate::world::{EntityInfo, EntityTable};

    fn speaker() -> Speaker {
        Speaker::new(EntityId::new(), 100.0, &SpeechConfig::default())
    }

    #[test]
    fn damage_supplies_enemy_once() {
        let s = speaker();
        let mut world = EntityTable::new();
        let attacker = world.insert(EntityInfo::npc(EntityId::new(), "npc_metropolice", Vec3::new(30.0, 40.0, 0.0)));
        let mut d = Decision::new();
        s.append_damage_criteria(&mut d, &DamageRecord::new(12.7, Some(attacker)), true, &world);

        assert_eq!(d.criteria.get("damage"), Some("12"));
        assert_eq!(d.criteria.get("enemy"), Some("npc_metropolice"));
        assert_eq!(d.criteria.get("distancetoenemy"), Some("50.000000"));
        assert_eq!(d.criteria.get("inflictor_is_physics"), Some("0"));
        assert_eq!(d.criteria.get("hitgroup"), Some("0"));

        let mut resolver = RecordingResolver::new();
        let mut expresser = OpenExpresser;
        let env = SpeechEnv::new(SimTime::ZERO, &world, &mut resolver, &mut expresser);
        let mut agent = SensingAgent::new(s.id, SoundKind::COMPANION_INTERESTS, &BarksConfig::default());
        agent.machine.force(NpcState::Combat);
        s.append_general_criteria(&mut d, Some(&agent), &env);

        assert_eq!(d.criteria.count_key("enemy"), 1);
        assert_eq!(d.criteria.count_key("distancetoenemy"), 1);
        assert_eq!(d.marks.times_marked(SpeechCategoryFlags::ENEMY), 1);
        assert_eq!(d.criteria.get("npcstate"), Some("3"));
    }

    #[test]
    fn damage_to_others_skips_victim_details() {
        let s = speaker();
        let world = EntityTable::new();
        let mut d = Decision::new();
        s.append_damage_criteria(&mut d, &DamageRecord::new(5.0, None), false, &world);
        assert!(!d.criteria.contains_key("hitgroup"));
        assert!(!d.has(SpeechCategoryFlags::ENEMY));
    }

    #[test]
    fn missing_enemy_is_minus_one() {
        let s = speaker();
        let world = EntityTable::new();
        let mut d = Decision::new();
        s.append_enemy_criteria(&mut d, None, &world);
        assert_eq!(d.criteria.get("distancetoenemy"), Some("-1"));
        assert!(!d.criteria.contains_key("enemy"));
    }

    #[test]
    fn weapon_only_when_not_active() {
        let mut s = speaker();
        s.active_weapon = Some("weapon_pistol".into());
        let mut d = Decision::new();
        s.append_weapon_criteria(&mut d, Some("weapon_pistol"));
        assert!(!d.criteria.contains_key("weapon"));
        assert!(d.has(SpeechCategoryFlags::WEAPON));

        let mut d = Decision::new();
        s.append_weapon_criteria(&mut d, Some("weapon_shotgun"));
        assert_eq!(d.criteria.get("weapon"), Some("weapon_shotgun"));
    }

    #[test]
    fn speech_target_for_npc() {
        let s = speaker();
        let mut world = EntityTable::new();
        let target = world.insert(
            EntityInfo::npc(EntityId::new(), "npc_combine_s", Vec3::ZERO)
                .named("soldier_1")
                .holding("weapon_ar2")
                .in_player_squad(),
        );
        let mut d = Decision::new();
        s.append_speech_target_criteria(&mut d, target, &world);
        assert_eq!(d.criteria.get("speechtarget"), Some("npc_combine_s"));
        assert_eq!(d.criteria.get("speechtargetname"), Some("soldier_1"));
        assert_eq!(d.criteria.get("speechtarget_weapon"), Some("weapon_ar2"));
        assert_eq!(d.criteria.get("speechtarget_inplayersquad"), Some("1"));
        assert_eq!(d.criteria.get("speechtarget_visible"), Some("1"));
    }

    #[test]
    fn sound_criteria() {
        let s = speaker();
        let mut world = EntityTable::new();
        let owner = world.insert(EntityInfo::object(EntityId::new(), "grenade_frag", Vec3::ZERO));
        let sound = SoundEvent::new(SoundKind::DANGER, Vec3::new(0.0, 10.0, 0.0))
            .owned_by(owner)
            .on_channel(SoundChannel::WeaponImpact);
        let mut d = Decision::new();
        s.append_sound_criteria(&mut d, &sound, &world);
        assert_eq!(d.criteria.get("sound_distance"), Some("10.000000"));
        assert_eq!(d.criteria.get("sound_type"), Some(SoundKind::DANGER.bits().to_string().as_str()));
        assert_eq!(d.criteria.get("sound_owner"), Some("grenade_frag"));
        assert_eq!(d.criteria.get("sound_channel"), Some("weapon_impact"));
        assert_eq!(d.marks.flags(), SpeechCategoryFlags::empty());
    }

    struct Tagging;

    impl SpeechFilter for Tagging {
        fn idle_modifier(&self) -> f32 {
            1.0
        }
        fn append_context(&self, criteria: &mut CriteriaSet) {
            criteria.append("filter", "calm");
        }
    }

    #[test]
    fn general_pass_without_component() {
        let mut s = speaker();
        s.health = 50.0;
        s.active_weapon = Some("weapon_pistol".into());
        let world = EntityTable::new();
        let mut resolver = RecordingResolver::new();
        let mut expresser = OpenExpresser;
        let filter = Tagging;
        let env = SpeechEnv::new(SimTime::ZERO, &world, &mut resolver, &mut expresser).with_filter(&filter);
        let mut d = Decision::new();
        s.append_general_criteria(&mut d, None, &env);
        assert_eq!(d.criteria.get("squadmembers"), Some("0"));
        assert!(!d.criteria.contains_key("npcstate"));
        assert_eq!(d.criteria.get("weapon"), Some("weapon_pistol"));
        assert_eq!(d.criteria.get("healthfrac"), Some("0.500"));
        assert_eq!(d.criteria.get("filter"), Some("calm"));
    }

    #[test]
    fn combat_general_pass_adds_counts() {
        let mut s = speaker();
        s.counts.visible = 5;
        s.counts.close = 4;
        let world = EntityTable::new();
        let mut resolver = RecordingResolver::new();
        let mut expresser = OpenExpresser;
        let env = SpeechEnv::new(SimTime::ZERO, &world, &mut resolver, &mut expresser);
        let mut agent = SensingAgent::new(s.id, SoundKind::COMPANION_INTERESTS, &BarksConfig::default());
        agent.machine.force(NpcState::Combat);
        let mut d = Decision::new();
        s.append_general_criteria(&mut d, Some(&agent), &env);
        assert_eq!(d.criteria.get("num_enemies"), Some("5"));
        assert_eq!(d.criteria.get("close_enemies"), Some("4"));
        assert_eq!(d.criteria.get("distancetoenemy"), Some("-1"));
    }
}
