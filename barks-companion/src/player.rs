//! The companion character: speech state, its sensing component and the
//! per-tick think.

use barks_core::config::BarksConfig;
use barks_core::decision::{PassOutcome, SpeechAi};
use barks_core::schedule::{ImmediateTasks, ScheduleLibrary, StepReport, TaskHandler};
use barks_core::sensing::SoundEvent;
use barks_core::types::{EntityId, SimTime};
use barks_core::{SpeechEnv, Speaker};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::component::SensingComponent;
use crate::schedules::companion_schedules;

/// A player-controlled character that talks on its own.
pub struct CompanionPlayer {
    /// Speech state.
    pub speaker: Speaker,
    pub(crate) component: Option<SensingComponent>,
    pub(crate) config: BarksConfig,
    library: ScheduleLibrary,
    tasks: Box<dyn TaskHandler + Send>,
    ai: SpeechAi,
    rng: StdRng,
}

impl CompanionPlayer {
    /// Spawn a companion with full health, the default schedules and a
    /// fresh sensing component.
    #[must_use]
    pub fn spawn(id: EntityId, max_health: f32, config: BarksConfig) -> Self {
        Self {
            speaker: Speaker::new(id, max_health, &config.speech),
            component: Some(SensingComponent::new(id, &config)),
            library: companion_schedules(),
            tasks: Box::new(ImmediateTasks),
            ai: SpeechAi::new(&config),
            rng: StdRng::from_entropy(),
            config,
        }
    }

    /// Seed the chatter RNG, for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the schedule library.
    #[must_use]
    pub fn with_schedules(mut self, library: ScheduleLibrary) -> Self {
        self.library = library;
        self
    }

    /// Run schedule tasks through the host's handler.
    #[must_use]
    pub fn with_task_handler(mut self, tasks: Box<dyn TaskHandler + Send>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Handle of the character.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.speaker.id
    }

    /// The tuning this companion was spawned with.
    #[must_use]
    pub fn config(&self) -> &BarksConfig {
        &self.config
    }

    /// The sensing component, if the companion has one.
    #[must_use]
    pub fn component(&self) -> Option<&SensingComponent> {
        self.component.as_ref()
    }

    /// The sensing component, mutably.
    pub fn component_mut(&mut self) -> Option<&mut SensingComponent> {
        self.component.as_mut()
    }

    /// Create the sensing component if it does not exist.
    pub fn create_component(&mut self) {
        if self.component.is_none() {
            debug!(id = %self.speaker.id, "sensing component created");
            self.component = Some(SensingComponent::new(self.speaker.id, &self.config));
        }
    }

    /// Drop the sensing component.
    pub fn remove_component(&mut self) {
        if self.component.take().is_some() {
            debug!(id = %self.speaker.id, "sensing component removed");
        }
    }

    /// Offer a sound to the sensing component. Ignored without one.
    pub fn hear(&mut self, sound: SoundEvent, now: SimTime) -> bool {
        self.component
            .as_mut()
            .is_some_and(|c| c.agent_mut().hear(sound, now))
    }

    /// One tick: the sensing component thinks, then the speech AI runs.
    pub fn think(&mut self, env: &mut SpeechEnv<'_>) -> (StepReport, PassOutcome) {
        let report = match self.component.as_mut() {
            Some(component) => component.run_ai(
                &self.speaker,
                &self.library,
                self.tasks.as_mut(),
                env.world,
                env.now,
            ),
            None => StepReport::default(),
        };
        let agent = self.component.as_mut().map(SensingComponent::agent_mut);
        let outcome = self.ai.think(&mut self.speaker, agent, env, &mut self.rng);
        (report, outcome)
    }
}

impl std::fmt::Debug for CompanionPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionPlayer")
            .field("speaker", &self.speaker)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}
