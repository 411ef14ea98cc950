//! Default [`Expresser`] for the companion.
//!
//! Tracks a global "still speaking" window after every line, per-concept
//! minimum re-speak delays, and concepts that may only ever be said once.

use std::collections::{HashMap, HashSet};

use barks_core::collab::{Expresser, Response};
use barks_core::concept::Concept;
use barks_core::error::{BarksError, Result};
use barks_core::types::SimTime;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Delay rules, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptDelays {
    /// Seconds after a line during which nothing else may be said.
    #[serde(default = "default_speaking_window")]
    pub speaking_window: f32,
    /// Minimum seconds between two lines of the same concept.
    #[serde(default)]
    pub min_delay: HashMap<String, f32>,
    /// Concepts said at most once per expresser.
    #[serde(default)]
    pub speak_once: Vec<String>,
}

impl ConceptDelays {
    /// Parse delay rules from TOML.
    ///
    /// # Errors
    /// Returns `BarksError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| BarksError::Config(e.to_string()))
    }
}

impl Default for ConceptDelays {
    fn default() -> Self {
        let min_delay = [
            (Concept::IDLE_CHATTER, 10.0),
            (Concept::UNDER_ATTACK_CHATTER, 8.0),
            (Concept::SMELL, 30.0),
            (Concept::DARKNESS_HEARD_SOUND, 20.0),
            (Concept::PLAYER_HURT, 20.0),
            (Concept::MANY_ENEMIES, 15.0),
            (Concept::MOBBED, 10.0),
            (Concept::WOUND, 3.0),
        ]
        .into_iter()
        .map(|(c, secs)| (c.as_str().to_string(), secs))
        .collect();
        Self {
            speaking_window: default_speaking_window(),
            min_delay,
            speak_once: Vec::new(),
        }
    }
}

/// Expresser that gates on recent speech.
#[derive(Debug, Clone, Default)]
pub struct ConceptDelayExpresser {
    rules: ConceptDelays,
    speaking_until: SimTime,
    last_spoken: HashMap<String, SimTime>,
    spoken_once: HashSet<String>,
}

impl ConceptDelayExpresser {
    /// Expresser with the given rules.
    #[must_use]
    pub fn new(rules: ConceptDelays) -> Self {
        Self {
            rules,
            speaking_until: SimTime::ZERO,
            last_spoken: HashMap::new(),
            spoken_once: HashSet::new(),
        }
    }

    /// Whether a line is still playing at `now`.
    #[must_use]
    pub fn is_speaking(&self, now: SimTime) -> bool {
        now < self.speaking_until
    }

    /// When `concept` was last said.
    #[must_use]
    pub fn last_spoken(&self, concept: &Concept) -> Option<SimTime> {
        self.last_spoken.get(concept.as_str()).copied()
    }

    /// Forget all history, e.g. on level change.
    pub fn reset(&mut self) {
        self.speaking_until = SimTime::ZERO;
        self.last_spoken.clear();
        self.spoken_once.clear();
    }
}

impl Expresser for ConceptDelayExpresser {
    fn can_speak(&self, now: SimTime) -> bool {
        !self.is_speaking(now)
    }

    fn can_speak_concept(&self, concept: &Concept, now: SimTime) -> bool {
        let name = concept.as_str();
        if self.spoken_once.contains(name) {
            return false;
        }
        match (self.rules.min_delay.get(name), self.last_spoken.get(name)) {
            (Some(&delay), Some(&last)) => now.since(last) >= delay,
            _ => true,
        }
    }

    fn note_spoken(&mut self, concept: &Concept, response: &Response, now: SimTime) {
        let name = concept.as_str();
        self.speaking_until = now.after(self.rules.speaking_window);
        self.last_spoken.insert(name.to_string(), now);
        if self.rules.speak_once.iter().any(|c| c == name) {
            self.spoken_once.insert(name.to_string());
        }
        trace!(%concept, rule = %response.rule, until = %self.speaking_until, "expresser busy");
    }
}

fn default_speaking_window() -> f32 { 2.0 }

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f32) -> SimTime {
        SimTime::from_secs(secs)
    }

    fn line() -> Response {
        Response {
            rule: "r".into(),
            text: "t".into(),
        }
    }

    #[test]
    fn speaking_window_blocks_everything() {
        let mut e = ConceptDelayExpresser::default();
        assert!(e.can_speak(t(0.0)));
        e.note_spoken(&Concept::DANGER, &line(), t(1.0));
        assert!(!e.can_speak(t(2.5)));
        assert!(e.can_speak(t(3.0)));
    }

    #[test]
    fn min_delay_is_per_concept() {
        let mut e = ConceptDelayExpresser::new(ConceptDelays::default());
        e.note_spoken(&Concept::SMELL, &line(), t(0.0));
        assert!(!e.can_speak_concept(&Concept::SMELL, t(29.0)));
        assert!(e.can_speak_concept(&Concept::SMELL, t(30.0)));
        assert!(e.can_speak_concept(&Concept::DANGER, t(0.1)));
        assert_eq!(e.last_spoken(&Concept::SMELL), Some(t(0.0)));
    }

    #[test]
    fn speak_once_from_toml() {
        let rules = ConceptDelays::from_toml(
            r#"
            speaking_window = 0.5
            speak_once = ["start-combat"]

            [min_delay]
            answer = 4.0
            "#,
        )
        .expect("rules parse");
        let mut e = ConceptDelayExpresser::new(rules);
        e.note_spoken(&Concept::START_COMBAT, &line(), t(0.0));
        assert!(!e.can_speak_concept(&Concept::START_COMBAT, t(1000.0)));
        assert!(e.can_speak(t(0.5)));
        e.reset();
        assert!(e.can_speak_concept(&Concept::START_COMBAT, t(1000.0)));
    }
}
