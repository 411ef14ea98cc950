//! Barks Benchmark Suite
//!
//! Per-tick performance targets:
//!   mob_scan_32_enemies ........... < 10μs
//!   decision_pass_combat ........... < 50μs
//!   companion_tick_full ........... < 100μs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;

use barks_companion::{CompanionPlayer, ConceptDelayExpresser};
use barks_core::agent::SensingAgent;
use barks_core::collab::{ConstantFilter, OpenExpresser, RecordingResolver};
use barks_core::enemies::EnemyMemory;
use barks_core::mob::MobDetector;
use barks_core::sensing::{SoundEvent, SoundKind};
use barks_core::{
    BarksConfig, Disposition, EntityId, EntityInfo, EntityTable, NpcState, SimTime, Speaker,
    SpeechAi, SpeechEnv, Vec3,
};

const SILENT: ConstantFilter = ConstantFilter(0.0);

fn ring_of_enemies(world: &mut EntityTable, me: EntityId, count: u16) -> Vec<(EntityId, Vec3)> {
    (0..count)
        .map(|i| {
            let angle = f32::from(i) * 0.7;
            let radius = 40.0 + f32::from(i) * 25.0;
            let at = Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0);
            let id = world.insert(EntityInfo::npc(EntityId::new(), "npc_antlion", at));
            world.set_relation(me, id, Disposition::Hate);
            (id, at)
        })
        .collect()
}

/// Benchmark: mob scan over 32 tracked enemies (target: < 10μs).
fn bench_mob_scan(c: &mut Criterion) {
    let mut world = EntityTable::new();
    let me = world.insert(EntityInfo::object(EntityId::new(), "player", Vec3::ZERO));
    let mut memory = EnemyMemory::new();
    for (id, at) in ring_of_enemies(&mut world, me, 32) {
        memory.update(id, at, SimTime::from_secs(1.0));
    }
    let detector = MobDetector::default();
    let now = SimTime::from_secs(1.5);

    c.bench_function("mob_scan_32_enemies", |b| {
        b.iter(|| {
            let counts = detector.measure(me, Vec3::ZERO, now, &mut memory, &world);
            black_box(counts);
        });
    });
}

/// Benchmark: one combat decision pass with a danger sound queued
/// (target: < 50μs).
fn bench_decision_pass(c: &mut Criterion) {
    let config = BarksConfig::default();
    let mut world = EntityTable::new();
    let me = world.insert(EntityInfo::object(EntityId::new(), "player", Vec3::ZERO));
    let enemies = ring_of_enemies(&mut world, me, 8);
    let ai = SpeechAi::new(&config);
    let mut rng = StdRng::seed_from_u64(7);
    let mut speaker = Speaker::new(me, 100.0, &config.speech);
    let now = SimTime::from_secs(2.0);

    c.bench_function("decision_pass_combat", |b| {
        b.iter(|| {
            let mut agent = SensingAgent::new(me, SoundKind::COMPANION_INTERESTS, &config);
            agent.machine.force(NpcState::Combat);
            for &(id, at) in &enemies {
                agent.enemies.update(id, at, SimTime::from_secs(1.9));
            }
            agent.hear(SoundEvent::new(SoundKind::DANGER, Vec3::new(30.0, 0.0, 0.0)), now);
            speaker.timing.reset();
            let mut resolver = RecordingResolver::new();
            let mut expresser = OpenExpresser;
            let mut env = SpeechEnv::new(now, &world, &mut resolver, &mut expresser).with_filter(&SILENT);
            let outcome = ai.think(&mut speaker, Some(&mut agent), &mut env, &mut rng);
            speaker.drain_utterances();
            black_box(outcome);
        });
    });
}

/// Benchmark: a full companion tick (component think plus speech pass)
/// with enemies in view (target: < 100μs).
fn bench_companion_tick(c: &mut Criterion) {
    let mut world = EntityTable::new();
    let me = world.insert(EntityInfo::object(EntityId::new(), "player", Vec3::ZERO));
    let enemies = ring_of_enemies(&mut world, me, 12);
    let mut player = CompanionPlayer::spawn(me, 100.0, BarksConfig::default()).with_seed(3);
    if let Some(component) = player.component_mut() {
        for &(id, at) in &enemies {
            component.perceive_enemy(id, at, SimTime::from_secs(0.5));
        }
    }
    let mut resolver = RecordingResolver::new();
    let mut expresser = ConceptDelayExpresser::default();
    let mut tick = 1_u16;

    c.bench_function("companion_tick_full", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            let now = SimTime::from_secs(f32::from(tick) * 0.05);
            player.speaker.timing.reset();
            let mut env =
                SpeechEnv::new(now, &world, &mut resolver, &mut expresser).with_filter(&SILENT);
            let result = player.think(&mut env);
            resolver.requests.clear();
            player.speaker.drain_utterances();
            black_box(result);
        });
    });
}

criterion_group!(
    benches,
    bench_mob_scan,
    bench_decision_pass,
    bench_companion_tick,
);
criterion_main!(benches);
