//! Integration tests: end-to-end speech passes over a small world.
//!
//! These drive the full pipeline (sensing, state, mob scan, decision,
//! composition, resolver) the way a host game would once per tick.

use rand::SeedableRng;
use rand::rngs::StdRng;

use barks_core::collab::{ConstantFilter, OpenExpresser, RecordingResolver};
use barks_core::conditions::Conditions;
use barks_core::schedule::{ImmediateTasks, ScheduleLibrary};
use barks_core::sensing::{SoundEvent, SoundKind};
use barks_core::{
    BarksConfig, Concept, Disposition, EntityId, EntityInfo, EntityTable, NpcState, PassOutcome,
    SensingAgent, SimTime, Speaker, SpeechAi, SpeechEnv, Vec3,
};

const SILENT: ConstantFilter = ConstantFilter(0.0);

struct Companion {
    speaker: Speaker,
    agent: SensingAgent,
    ai: SpeechAi,
    rng: StdRng,
}

impl Companion {
    fn spawn(world: &mut EntityTable, config: &BarksConfig) -> Self {
        let id = world.insert(EntityInfo::npc(EntityId::new(), "player", Vec3::ZERO));
        Self {
            speaker: Speaker::new(id, 100.0, &config.speech),
            agent: SensingAgent::new(id, SoundKind::COMPANION_INTERESTS, config),
            ai: SpeechAi::new(config),
            rng: StdRng::seed_from_u64(42),
        }
    }

    fn tick(&mut self, world: &EntityTable, resolver: &mut RecordingResolver, now: f32) -> PassOutcome {
        let mut expresser = OpenExpresser;
        let mut env =
            SpeechEnv::new(SimTime::from_secs(now), world, resolver, &mut expresser).with_filter(&SILENT);
        self.ai
            .think(&mut self.speaker, Some(&mut self.agent), &mut env, &mut self.rng)
    }
}

fn spawn_enemies(world: &mut EntityTable, me: EntityId, distances: &[f32]) -> Vec<EntityId> {
    distances
        .iter()
        .map(|&d| {
            let id = world.insert(EntityInfo::npc(EntityId::new(), "npc_antlion", Vec3::new(d, 0.0, 0.0)));
            world.set_relation(me, id, Disposition::Hate);
            id
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Combat commentary
// ---------------------------------------------------------------------------

#[test]
fn mobbed_companion_reports_counts_and_health() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    let me = companion.speaker.id;
    companion.speaker.health = 50.0;

    let distances = [60.0, 90.0, 120.0, 150.0, 900.0];
    let enemies = spawn_enemies(&mut world, me, &distances);
    for (&enemy, &d) in enemies.iter().zip(&distances) {
        companion.agent.enemies.update(enemy, Vec3::new(d, 0.0, 0.0), SimTime::from_secs(4.9));
    }
    companion.agent.machine.force(NpcState::Combat);
    companion.agent.set_current_enemy(Some(enemies[0]));

    let mut resolver = RecordingResolver::new();
    let outcome = companion.tick(&world, &mut resolver, 5.0);

    assert_eq!(outcome, PassOutcome::Commented(Concept::MOBBED));
    assert!(companion.agent.has_condition(Conditions::MOBBED_BY_ENEMIES));
    let (_, criteria) = resolver.last().expect("mobbed line resolved");
    assert_eq!(criteria.get("num_enemies"), Some("5"));
    assert_eq!(criteria.get("close_enemies"), Some("4"));
    assert_eq!(criteria.get("npcstate"), Some("3"));
    assert_eq!(criteria.get("healthfrac"), Some("0.500"));
    assert_eq!(criteria.get("enemy"), Some("npc_antlion"));
    assert_eq!(criteria.get("distancetoenemy"), Some("60.000000"));
}

#[test]
fn stale_sightings_do_not_count_toward_a_mob() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    let me = companion.speaker.id;

    let enemies = spawn_enemies(&mut world, me, &[50.0, 60.0, 70.0]);
    for &enemy in &enemies {
        companion.agent.enemies.update(enemy, Vec3::ZERO, SimTime::from_secs(1.0));
    }
    companion.agent.machine.force(NpcState::Combat);

    let mut resolver = RecordingResolver::new();
    assert_eq!(companion.tick(&world, &mut resolver, 3.0), PassOutcome::Quiet);
    assert_eq!(companion.speaker.counts.visible, 0);
    assert!(!companion.agent.has_condition(Conditions::MOBBED_BY_ENEMIES));
}

#[test]
fn many_enemies_threshold_comes_from_config() {
    let config = BarksConfig::from_toml(
        r"
        [speech]
        many_enemies_threshold = 1
        ",
    )
    .expect("valid config");
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    let me = companion.speaker.id;
    for enemy in spawn_enemies(&mut world, me, &[1000.0, 2000.0]) {
        companion.agent.enemies.update(enemy, Vec3::ZERO, SimTime::from_secs(1.0));
    }
    companion.agent.machine.force(NpcState::Combat);

    let mut resolver = RecordingResolver::new();
    assert_eq!(
        companion.tick(&world, &mut resolver, 1.0),
        PassOutcome::Commented(Concept::MANY_ENEMIES)
    );
}

// ---------------------------------------------------------------------------
// Sound reactions
// ---------------------------------------------------------------------------

#[test]
fn danger_reaction_preempts_hurt_comment() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    companion.speaker.health = 20.0;
    companion
        .agent
        .hear(SoundEvent::new(SoundKind::DANGER, Vec3::new(40.0, 0.0, 0.0)), SimTime::from_secs(0.5));

    let mut resolver = RecordingResolver::new();
    assert_eq!(
        companion.tick(&world, &mut resolver, 1.0),
        PassOutcome::Reacted(Concept::DANGER)
    );
    assert_eq!(resolver.concepts(), vec![&Concept::DANGER]);

    // The sound was acknowledged; next pass falls back to the hurt comment.
    assert_eq!(
        companion.tick(&world, &mut resolver, 2.0),
        PassOutcome::Commented(Concept::PLAYER_HURT)
    );
}

#[test]
fn companion_does_not_warn_about_its_own_grenade() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    let me = companion.speaker.id;
    let grenade = world.insert(
        EntityInfo::object(EntityId::new(), "npc_grenade_frag", Vec3::new(10.0, 0.0, 0.0)).thrown_by(me),
    );
    companion.agent.hear(
        SoundEvent::new(SoundKind::DANGER, Vec3::new(10.0, 0.0, 0.0)).owned_by(grenade),
        SimTime::from_secs(0.5),
    );

    let mut resolver = RecordingResolver::new();
    assert_eq!(companion.tick(&world, &mut resolver, 1.0), PassOutcome::Quiet);
    assert!(resolver.requests.is_empty());
}

#[test]
fn expired_sounds_are_not_reacted_to() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    companion
        .agent
        .hear(SoundEvent::new(SoundKind::DANGER, Vec3::ZERO), SimTime::from_secs(0.0));

    let mut resolver = RecordingResolver::new();
    assert_eq!(companion.tick(&world, &mut resolver, 10.0), PassOutcome::Quiet);
    assert!(resolver.requests.is_empty());
}

// ---------------------------------------------------------------------------
// Scripted sequences
// ---------------------------------------------------------------------------

#[test]
fn scripted_sequence_mutes_then_restores_commentary() {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    companion.speaker.health = 30.0;
    companion.speaker.scripted = true;

    let mut resolver = RecordingResolver::new();
    assert_eq!(companion.tick(&world, &mut resolver, 1.0), PassOutcome::Suppressed);
    assert!(resolver.requests.is_empty());

    companion.speaker.scripted = false;
    assert_eq!(
        companion.tick(&world, &mut resolver, 2.0),
        PassOutcome::Commented(Concept::PLAYER_HURT)
    );
    let (_, criteria) = resolver.last().expect("hurt line");
    assert!(!criteria.contains_key("gag"));
}

// ---------------------------------------------------------------------------
// State and schedules
// ---------------------------------------------------------------------------

#[test]
fn heard_danger_drives_alert_and_faster_cooldown() {
    let config = BarksConfig::default();
    let library = ScheduleLibrary::from_toml(
        r#"
        [[schedules]]
        name = "idle_stand"
        tasks = [{ task = "stop_moving" }, { task = "wait", arg = 2.0 }]
        interrupts = "NEW_ENEMY | HEAR_DANGER"

        [[schedules]]
        name = "alert_stand"
        tasks = [{ task = "wait", arg = 5.0 }, { task = "suggest_state", arg = "idle" }]
        interrupts = "SEE_ENEMY"

        [[selectors]]
        state = "idle"
        schedule = "idle_stand"

        [[selectors]]
        state = "alert"
        schedule = "alert_stand"
        "#,
    )
    .expect("valid schedules");

    let mut world = EntityTable::new();
    let mut companion = Companion::spawn(&mut world, &config);
    let mut handler = ImmediateTasks;
    let now = SimTime::from_secs(1.0);

    companion.agent.engine.step(&library, &mut companion.agent.machine, &mut handler, now);
    assert_eq!(companion.agent.engine.current_schedule(), Some("idle_stand"));

    companion
        .agent
        .hear(SoundEvent::new(SoundKind::DANGER, Vec3::ZERO), now);
    let heard = companion.agent.senses.live_conditions(now);
    companion.agent.machine.raise(heard);
    let report = companion
        .agent
        .engine
        .step(&library, &mut companion.agent.machine, &mut handler, SimTime::from_secs(1.1));
    assert_eq!(companion.agent.state(), NpcState::Alert);
    assert_eq!(companion.agent.engine.current_schedule(), Some("alert_stand"));
    assert!(report.selected.iter().any(|s| s == "alert_stand"));

    assert!((companion.speaker.timing.cooldown(Some(companion.agent.state())) - 0.25).abs() < f32::EPSILON);
}
