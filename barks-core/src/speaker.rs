//! The speaking character: process-lifetime speech state plus gating.
//!
//! Every speech attempt goes through [`Speaker::speak_if_allowed`]:
//!
//! 1. gating (life state, expresser, per-concept expresser rules);
//! 2. the `gag` marker while a scripted sequence runs;
//! 3. general criteria via the composition protocol;
//! 4. the concept resolver.
//!
//! A refusal at any step is a silent miss.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::agent::SensingAgent;
use crate::collab::{Response, SpeechEnv};
use crate::concept::Concept;
use crate::config::SpeechConfig;
use crate::criteria::{CriteriaSet, Decision};
use crate::metrics::SpeechCounters;
use crate::mob::EnemyCounts;
use crate::speech::SpeechTiming;
use crate::types::{EntityId, HitGroup, LifeState, SimTime, Vec3};

/// A line that was actually spoken.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// What was meant.
    pub concept: Concept,
    /// What the resolver chose.
    pub response: Response,
    /// The criteria it was chosen with.
    pub criteria: CriteriaSet,
    /// When.
    pub at: SimTime,
}

/// Speech state of the outer character.
#[derive(Debug, Clone)]
pub struct Speaker {
    /// Handle of the character.
    pub id: EntityId,
    /// Current position.
    pub position: Vec3,
    /// Eye direction (unit vector).
    pub facing: Vec3,
    /// Life state.
    pub life_state: LifeState,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Set while an external scripted sequence runs.
    pub scripted: bool,
    /// Set while enemies ignore the character; suppresses commentary.
    pub no_target: bool,
    /// Commandable squad members, `None` without a squad.
    pub squad_size: Option<u32>,
    /// Class name of the held weapon.
    pub active_weapon: Option<String>,
    /// Where the last damage landed.
    pub last_hit_group: HitGroup,
    /// Enemy counts cached by the last mob scan.
    pub counts: EnemyCounts,
    /// Decision pass cooldown.
    pub timing: SpeechTiming,
    counters: Arc<SpeechCounters>,
    spoken: Vec<Utterance>,
}

impl Speaker {
    /// Speaker for character `id` at full health.
    #[must_use]
    pub fn new(id: EntityId, max_health: f32, config: &SpeechConfig) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            facing: Vec3::new(1.0, 0.0, 0.0),
            life_state: LifeState::Alive,
            health: max_health,
            max_health,
            scripted: false,
            no_target: false,
            squad_size: None,
            active_weapon: None,
            last_hit_group: HitGroup::Generic,
            counts: EnemyCounts::default(),
            timing: SpeechTiming::new(config),
            counters: Arc::new(SpeechCounters::new()),
            spoken: Vec::new(),
        }
    }

    /// Share a counter set with other speakers.
    #[must_use]
    pub fn with_counters(mut self, counters: Arc<SpeechCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// The counters this speaker reports into.
    #[must_use]
    pub fn counters(&self) -> &Arc<SpeechCounters> {
        &self.counters
    }

    /// Fraction of maximum health left.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }

    /// Whether anything, or `concept` in particular, may be said now.
    #[must_use]
    pub fn is_allowed_to_speak(&self, concept: Option<&Concept>, env: &SpeechEnv<'_>) -> bool {
        if self.life_state.is_past_dying() {
            return false;
        }
        if !env.expresser.can_speak(env.now) {
            return false;
        }
        concept.is_none_or(|c| env.expresser.can_speak_concept(c, env.now))
    }

    /// Gate, tag and speak `concept`. Returns whether a line was spoken.
    pub fn speak_if_allowed(
        &mut self,
        concept: &Concept,
        mut decision: Decision,
        agent: Option<&SensingAgent>,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        if !self.is_allowed_to_speak(Some(concept), env) {
            trace!(speaker = %self.id, %concept, "speech gated");
            SpeechCounters::bump(&self.counters.gated);
            return false;
        }
        if self.scripted {
            decision.append("gag", "1");
        }
        self.speak(concept, decision, agent, env)
    }

    /// Speak `concept` without gating. Only death uses this directly.
    pub fn speak(
        &mut self,
        concept: &Concept,
        mut decision: Decision,
        agent: Option<&SensingAgent>,
        env: &mut SpeechEnv<'_>,
    ) -> bool {
        let specific = std::mem::take(&mut decision.criteria);
        self.append_general_criteria(&mut decision, agent, env);
        decision.criteria.extend_from(&specific);
        let Some(response) = env.resolver.resolve(concept, &decision.criteria) else {
            debug!(speaker = %self.id, %concept, criteria = %decision.criteria, "no response");
            SpeechCounters::bump(&self.counters.resolver_misses);
            return false;
        };
        env.expresser.note_spoken(concept, &response, env.now);
        info!(
            speaker = %self.id,
            %concept,
            rule = %response.rule,
            criteria = %decision.criteria,
            "spoke"
        );
        SpeechCounters::bump(&self.counters.utterances);
        self.spoken.push(Utterance {
            concept: concept.clone(),
            response,
            criteria: decision.criteria,
            at: env.now,
        });
        true
    }

    /// Lines spoken since the last drain.
    #[must_use]
    pub fn utterances(&self) -> &[Utterance] {
        &self.spoken
    }

    /// Take the spoken lines, e.g. to hand them to audio/captions.
    pub fn drain_utterances(&mut self) -> Vec<Utterance> {
        std::mem::take(&mut self.spoken)
    }
}
