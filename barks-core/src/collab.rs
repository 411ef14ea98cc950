//! Collaborator contracts the decision core calls into.
//!
//! All collaborators are synchronous and in-process: the whole pipeline runs
//! inside one simulation tick.

use crate::concept::Concept;
use crate::criteria::CriteriaSet;
use crate::types::SimTime;
use crate::world::WorldView;

/// A line chosen by the concept resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Identifier of the matched rule.
    pub rule: String,
    /// What to say (a sound script, caption key or literal text).
    pub text: String,
}

/// Turns a concept plus criteria into a line of dialogue, or nothing.
pub trait ConceptResolver {
    /// Pick a response. `None` is a resolver miss, not an error.
    fn resolve(&mut self, concept: &Concept, criteria: &CriteriaSet) -> Option<Response>;
}

/// Owns the speaking mouth: global and per-concept speech gating.
pub trait Expresser {
    /// Whether anything may be said right now.
    fn can_speak(&self, now: SimTime) -> bool;

    /// Whether this specific concept may be said right now.
    fn can_speak_concept(&self, concept: &Concept, now: SimTime) -> bool;

    /// Called after a response was chosen for `concept`.
    fn note_spoken(&mut self, _concept: &Concept, _response: &Response, _now: SimTime) {}
}

/// Optional per-agent filter that scales idle chatter and adds context.
pub trait SpeechFilter {
    /// Multiplier on the chatter roll divisor. Larger means less chatter.
    fn idle_modifier(&self) -> f32;

    /// Append filter-specific criteria.
    fn append_context(&self, _criteria: &mut CriteriaSet) {}
}

/// Everything a speech routine needs from outside the agent for one tick.
pub struct SpeechEnv<'a> {
    /// Current simulation time.
    pub now: SimTime,
    /// World lookups.
    pub world: &'a dyn WorldView,
    /// Response selection.
    pub resolver: &'a mut dyn ConceptResolver,
    /// Speech gating.
    pub expresser: &'a mut dyn Expresser,
    /// Optional chatter filter.
    pub filter: Option<&'a dyn SpeechFilter>,
}

impl<'a> SpeechEnv<'a> {
    /// Bundle collaborators for one tick, without a speech filter.
    pub fn new(
        now: SimTime,
        world: &'a dyn WorldView,
        resolver: &'a mut dyn ConceptResolver,
        expresser: &'a mut dyn Expresser,
    ) -> Self {
        Self {
            now,
            world,
            resolver,
            expresser,
            filter: None,
        }
    }

    /// Attach a speech filter.
    #[must_use]
    pub fn with_filter(mut self, filter: &'a dyn SpeechFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The filter's idle modifier, or 1.0 without a filter.
    #[must_use]
    pub fn idle_modifier(&self) -> f32 {
        self.filter.map_or(1.0, |f| f.idle_modifier())
    }
}

// ---------------------------------------------------------------------------
// Simple implementations
// ---------------------------------------------------------------------------

/// Expresser that never gates anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenExpresser;

impl Expresser for OpenExpresser {
    fn can_speak(&self, _now: SimTime) -> bool {
        true
    }

    fn can_speak_concept(&self, _concept: &Concept, _now: SimTime) -> bool {
        true
    }
}

/// Fixed idle modifier with no extra context.
#[derive(Debug, Clone, Copy)]
pub struct ConstantFilter(pub f32);

impl SpeechFilter for ConstantFilter {
    fn idle_modifier(&self) -> f32 {
        self.0
    }
}

/// Resolver that answers every request (or only the listed concepts) and
/// records what it was asked.
#[derive(Debug, Clone, Default)]
pub struct RecordingResolver {
    /// Every request, in order.
    pub requests: Vec<(Concept, CriteriaSet)>,
    /// When set, only these concepts get a response.
    pub answers_only: Option<Vec<Concept>>,
}

impl RecordingResolver {
    /// Resolver that answers everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that answers only `concepts` and misses the rest.
    #[must_use]
    pub fn answering(concepts: &[Concept]) -> Self {
        Self {
            requests: Vec::new(),
            answers_only: Some(concepts.to_vec()),
        }
    }

    /// Concepts requested, in order.
    #[must_use]
    pub fn concepts(&self) -> Vec<&Concept> {
        self.requests.iter().map(|(c, _)| c).collect()
    }

    /// The most recent request.
    #[must_use]
    pub fn last(&self) -> Option<&(Concept, CriteriaSet)> {
        self.requests.last()
    }
}

impl ConceptResolver for RecordingResolver {
    fn resolve(&mut self, concept: &Concept, criteria: &CriteriaSet) -> Option<Response> {
        self.requests.push((concept.clone(), criteria.clone()));
        let answers = self
            .answers_only
            .as_ref()
            .is_none_or(|only| only.contains(concept));
        answers.then(|| Response {
            rule: concept.as_str().to_string(),
            text: format!("<{concept}>"),
        })
    }
}
