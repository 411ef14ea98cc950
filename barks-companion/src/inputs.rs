//! Inputs other systems (map logic, scripted sequences) send the companion.

use barks_core::criteria::Decision;
use barks_core::{Concept, SpeechEnv};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::SensingComponent;
use crate::player::CompanionPlayer;

/// An external input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", content = "value", rename_all = "snake_case")]
pub enum CompanionInput {
    /// Answer a question about `topic`.
    AnswerQuestion(String),
    /// A scripted sequence took over; ambient speech stops.
    StartScripting,
    /// The scripted sequence ended.
    StopScripting,
}

impl CompanionPlayer {
    /// Apply an input. Returns whether a line was spoken.
    pub fn handle_input(&mut self, input: CompanionInput, env: &mut SpeechEnv<'_>) -> bool {
        match input {
            CompanionInput::AnswerQuestion(topic) => {
                let mut decision = Decision::new();
                decision.append("target_concept", topic);
                let agent = self.component.as_ref().map(SensingComponent::agent);
                self.speaker
                    .speak_if_allowed(&Concept::ANSWER, decision, agent, env)
            }
            CompanionInput::StartScripting => {
                debug!(id = %self.speaker.id, "scripted sequence started");
                self.speaker.scripted = true;
                false
            }
            CompanionInput::StopScripting => {
                debug!(id = %self.speaker.id, "scripted sequence ended");
                self.speaker.scripted = false;
                false
            }
        }
    }
}
