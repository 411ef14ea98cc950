//! The speech decision engine.
//!
//! One call to [`SpeechAi::think`] per tick. When the cooldown has elapsed
//! it runs one decision pass:
//!
//! ```text
//! cooldown ─▶ mob scan (combat) ─▶ acknowledge sounds
//!          ─▶ priority reactions ─▶ state checks ─▶ ambient chatter
//! ```
//!
//! The first stage that speaks claims the tick. Reaction and state-check
//! priorities are the static tables below, evaluated top to bottom.

use rand::Rng;
use tracing::{debug, trace};

use crate::agent::SensingAgent;
use crate::collab::SpeechEnv;
use crate::concept::Concept;
use crate::conditions::Conditions;
use crate::config::BarksConfig;
use crate::criteria::Decision;
use crate::metrics::{PassBudgetMonitor, SpeechCounters, spans};
use crate::mob::MobDetector;
use crate::sensing::{HeardBatch, SoundChannel, SoundKind};
use crate::speaker::Speaker;
use crate::speech::ChatterRoll;
use crate::state::NpcState;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// A reaction to one kind of heard sound.
#[derive(Debug, Clone)]
pub struct SoundReaction {
    /// Condition that makes the reaction eligible.
    pub condition: Conditions,
    /// Kinds the reacted-to sound must carry.
    pub kind: SoundKind,
    /// Channel the sound must be on, if any.
    pub channel: Option<SoundChannel>,
    /// What to say.
    pub concept: Concept,
    /// Suppress the reaction when the sound's originator (the thrower of a
    /// thrown owner) is the speaker or not hostile. Hostile originators add
    /// enemy criteria; sounds with no known originator are announced as is.
    pub hostile_originator_only: bool,
}

/// Reactions checked in every state. Only the first eligible row is tried.
pub static PRIORITY_REACTIONS: [SoundReaction; 2] = [
    SoundReaction {
        condition: Conditions::HEAR_DANGER,
        kind: SoundKind::DANGER,
        channel: None,
        concept: Concept::DANGER,
        hostile_originator_only: true,
    },
    SoundReaction {
        condition: Conditions::HEAR_PHYSICS_DANGER,
        kind: SoundKind::PHYSICS_DANGER,
        channel: None,
        concept: Concept::DANGER,
        hostile_originator_only: true,
    },
];

/// Reactions checked while idle. Only the first eligible row is tried.
pub static IDLE_REACTIONS: [SoundReaction; 2] = [
    SoundReaction {
        condition: Conditions::HEAR_SPOOKY,
        kind: SoundKind::COMBAT,
        channel: Some(SoundChannel::SpookyNoise),
        concept: Concept::DARKNESS_HEARD_SOUND,
        hostile_originator_only: false,
    },
    SoundReaction {
        condition: Conditions::SMELL,
        kind: SoundKind::SCENT,
        channel: None,
        concept: Concept::SMELL,
        hostile_originator_only: false,
    },
];

/// A state-specific speech check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechCheck {
    /// Comment on being below full health.
    Hurt,
    /// Try the idle sound reactions.
    IdleReactions,
    /// Comment on being mobbed.
    Mobbed,
    /// Comment on many visible enemies.
    ManyEnemies,
}

/// One row of the state-check table.
#[derive(Debug, Clone, Copy)]
pub struct StateCheck {
    /// State the check runs in.
    pub state: NpcState,
    /// The check.
    pub check: SpeechCheck,
    /// Skip the row when any of these conditions is active.
    pub unless: Conditions,
}

/// State checks in priority order. A check that speaks claims the tick; a
/// check that fails falls through to the next row.
pub static STATE_CHECKS: [StateCheck; 4] = [
    StateCheck {
        state: NpcState::Idle,
        check: SpeechCheck::Hurt,
        unless: Conditions::empty(),
    },
    StateCheck {
        state: NpcState::Idle,
        check: SpeechCheck::IdleReactions,
        unless: Conditions::empty(),
    },
    StateCheck {
        state: NpcState::Combat,
        check: SpeechCheck::Mobbed,
        unless: Conditions::empty(),
    },
    StateCheck {
        state: NpcState::Combat,
        check: SpeechCheck::ManyEnemies,
        unless: Conditions::MOBBED_BY_ENEMIES,
    },
];

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Which stage of a pass claimed the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Speech decisions are switched off in the configuration.
    Disabled,
    /// The cooldown has not elapsed; nothing ran.
    Cooldown,
    /// A scripted sequence or no-target suppressed the pass.
    Suppressed,
    /// A sound reaction spoke.
    Reacted(Concept),
    /// A state check spoke.
    Commented(Concept),
    /// Ambient chatter spoke.
    Chatted(Concept),
    /// The pass ran and nothing was said.
    Quiet,
}

impl PassOutcome {
    /// The concept spoken this pass, if any.
    #[must_use]
    pub fn spoken(&self) -> Option<&Concept> {
        match self {
            Self::Reacted(c) | Self::Commented(c) | Self::Chatted(c) => Some(c),
            _ => None,
        }
    }
}

/// The decision engine. Stateless apart from thresholds and telemetry; all
/// per-agent state lives in the [`Speaker`] and [`SensingAgent`].
#[derive(Debug)]
pub struct SpeechAi {
    enabled: bool,
    mob: MobDetector,
    many_enemies_threshold: u32,
    monitor: Option<PassBudgetMonitor>,
}

impl SpeechAi {
    /// Engine with the given tuning.
    #[must_use]
    pub fn new(config: &BarksConfig) -> Self {
        Self {
            enabled: config.general.enabled,
            mob: MobDetector::new(&config.mob),
            many_enemies_threshold: config.speech.many_enemies_threshold,
            monitor: config
                .telemetry
                .enabled
                .then(|| PassBudgetMonitor::new(config.telemetry.pass_budget_ms)),
        }
    }

    /// Pass timing telemetry, when enabled.
    #[must_use]
    pub fn monitor(&self) -> Option<&PassBudgetMonitor> {
        self.monitor.as_ref()
    }

    /// Run the speech AI for one tick.
    pub fn think<R: Rng + ?Sized>(
        &self,
        speaker: &mut Speaker,
        mut agent: Option<&mut SensingAgent>,
        env: &mut SpeechEnv<'_>,
        rng: &mut R,
    ) -> PassOutcome {
        if !self.enabled {
            return PassOutcome::Disabled;
        }
        let state = agent.as_deref().map(SensingAgent::state);
        if !speaker.timing.poll(env.now, state) {
            return PassOutcome::Cooldown;
        }
        let _span = tracing::debug_span!(spans::DECISION_PASS, speaker = %speaker.id).entered();
        let guard = self.monitor.as_ref().map(PassBudgetMonitor::begin_pass);

        if state == Some(NpcState::Combat)
            && let Some(agent) = agent.as_deref_mut()
        {
            self.measure_enemies(speaker, agent, env);
        }

        let outcome = self.run_pass(speaker, agent, env, rng);
        drop(guard);
        if let Some(monitor) = &self.monitor
            && monitor.is_over_budget()
        {
            debug!(budget_ms = monitor.budget_ms(), ?outcome, "speech pass over budget");
        }
        outcome
    }

    /// Refresh the cached enemy counts and the mobbed condition.
    pub fn measure_enemies(
        &self,
        speaker: &mut Speaker,
        agent: &mut SensingAgent,
        env: &SpeechEnv<'_>,
    ) {
        let counts = self.mob.measure(
            speaker.id,
            speaker.position,
            env.now,
            &mut agent.enemies,
            env.world,
        );
        if counts.mobbed != agent.has_condition(Conditions::MOBBED_BY_ENEMIES) {
            debug!(speaker = %speaker.id, mobbed = counts.mobbed, close = counts.close, "mob status changed");
        }
        agent.machine.set(Conditions::MOBBED_BY_ENEMIES, counts.mobbed);
        speaker.counts = counts;
    }

    fn run_pass<R: Rng + ?Sized>(
        &self,
        speaker: &mut Speaker,
        agent: Option<&mut SensingAgent>,
        env: &mut SpeechEnv<'_>,
        rng: &mut R,
    ) -> PassOutcome {
        if speaker.scripted || speaker.no_target {
            trace!(speaker = %speaker.id, scripted = speaker.scripted, "speech pass suppressed");
            SpeechCounters::bump(&speaker.counters().suppressed);
            return PassOutcome::Suppressed;
        }
        SpeechCounters::bump(&speaker.counters().passes);

        let Some(agent) = agent else {
            return self.chatter(speaker, None, NpcState::Idle, env, rng);
        };
        let batch = agent.senses.acknowledge(env.now);
        let agent: &SensingAgent = agent;
        let state = agent.state();

        if let Some(batch) = &batch
            && let Some(concept) = self.react(&PRIORITY_REACTIONS, batch, speaker, agent, env)
        {
            return PassOutcome::Reacted(concept);
        }

        for row in STATE_CHECKS.iter().filter(|r| r.state == state) {
            if agent.machine.conditions().intersects(row.unless) {
                continue;
            }
            if let Some(outcome) = self.run_check(row.check, batch.as_ref(), speaker, agent, env) {
                return outcome;
            }
        }

        self.chatter(speaker, Some(agent), state, env, rng)
    }

    /// Run one state check. `None` when it did not speak.
    fn run_check(
        &self,
        check: SpeechCheck,
        batch: Option<&HeardBatch>,
        speaker: &mut Speaker,
        agent: &SensingAgent,
        env: &mut SpeechEnv<'_>,
    ) -> Option<PassOutcome> {
        let concept = match check {
            SpeechCheck::IdleReactions => {
                return self
                    .react(&IDLE_REACTIONS, batch?, speaker, agent, env)
                    .map(PassOutcome::Reacted);
            }
            SpeechCheck::Hurt if speaker.health_fraction() < 1.0 => Concept::PLAYER_HURT,
            SpeechCheck::Mobbed if agent.has_condition(Conditions::MOBBED_BY_ENEMIES) => {
                Concept::MOBBED
            }
            SpeechCheck::ManyEnemies if speaker.counts.visible > self.many_enemies_threshold => {
                Concept::MANY_ENEMIES
            }
            SpeechCheck::Hurt | SpeechCheck::Mobbed | SpeechCheck::ManyEnemies => return None,
        };
        speaker
            .speak_if_allowed(&concept, Decision::new(), Some(agent), env)
            .then_some(PassOutcome::Commented(concept))
    }

    /// Try the first eligible reaction in `table`. Returns the concept if a
    /// line was spoken.
    fn react(
        &self,
        table: &[SoundReaction],
        batch: &HeardBatch,
        speaker: &mut Speaker,
        agent: &SensingAgent,
        env: &mut SpeechEnv<'_>,
    ) -> Option<Concept> {
        let row = table
            .iter()
            .find(|r| batch.conditions().intersects(r.condition))?;
        let sound = batch.best_sound(row.kind, row.channel, speaker.position)?;

        let mut decision = Decision::new();
        speaker.append_sound_criteria(&mut decision, sound, env.world);

        if row.hostile_originator_only
            && let Some(originator) = sound
                .owner
                .and_then(|owner| danger_originator(speaker, owner, env))
        {
            if originator == speaker.id
                || !env.world.relation(speaker.id, originator).is_hostile()
            {
                debug!(speaker = %speaker.id, %originator, concept = %row.concept, "ignoring danger from self or ally");
                return None;
            }
            speaker.append_enemy_criteria(&mut decision, Some(originator), env.world);
        }

        SpeechCounters::bump(&speaker.counters().reactions);
        speaker
            .speak_if_allowed(&row.concept, decision, Some(agent), env)
            .then(|| row.concept.clone())
    }

    fn chatter<R: Rng + ?Sized>(
        &self,
        speaker: &mut Speaker,
        agent: Option<&SensingAgent>,
        state: NpcState,
        env: &mut SpeechEnv<'_>,
        rng: &mut R,
    ) -> PassOutcome {
        let modifier = env.idle_modifier() * speaker.timing.remaining(env.now);
        let Some(roll) = ChatterRoll::draw(rng, modifier) else {
            return PassOutcome::Quiet;
        };
        SpeechCounters::bump(&speaker.counters().chatter_rolls);
        trace!(speaker = %speaker.id, r1 = roll.r1, r2 = roll.r2, chance = roll.chance, "chatter roll");
        if !roll.fires() {
            return PassOutcome::Quiet;
        }
        SpeechCounters::bump(&speaker.counters().chatter_hits);
        let concept = match state {
            NpcState::Combat => Concept::UNDER_ATTACK_CHATTER,
            NpcState::Idle | NpcState::Alert => Concept::IDLE_CHATTER,
        };
        if speaker.speak_if_allowed(&concept, Decision::new(), agent, env) {
            PassOutcome::Chatted(concept)
        } else {
            PassOutcome::Quiet
        }
    }
}

/// Who is responsible for a danger sound made by `owner`.
///
/// A thrown object resolves to its thrower. An owner that is gone from the
/// world, a thrower that is gone, and a non-NPC object with no thrower that
/// the speaker does not regard as hostile (a stray grenade or prop) have no
/// originator; their danger is announced without enemy criteria.
fn danger_originator(speaker: &Speaker, owner: EntityId, env: &SpeechEnv<'_>) -> Option<EntityId> {
    if owner == speaker.id {
        return Some(owner);
    }
    let info = env.world.entity(owner)?;
    if let Some(thrower) = info.thrower {
        return (thrower == speaker.id || env.world.entity(thrower).is_some()).then_some(thrower);
    }
    (info.is_npc || env.world.relation(speaker.id, owner).is_hostile()).then_some(owner)
}

impl Default for SpeechAi {
    fn default() -> Self {
        Self::new(&BarksConfig::default())
    }
}
