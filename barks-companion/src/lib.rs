//! # barks-companion: Companion Integration for Barks
//!
//! Binds the game-agnostic `barks-core` speech engine to a player-controlled
//! companion character: the character owns a sensing component, forwards
//! game events into speech, and ticks both every frame.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                 Host game                 │
//! │  ┌────────────────────────────────────┐  │
//! │  │         barks-companion            │  │
//! │  │  ┌──────────────┐ ┌─────────────┐  │  │
//! │  │  │ Hooks/Inputs │ │  Component  │  │  │
//! │  │  └──────┬───────┘ └──────┬──────┘  │  │
//! │  │         │                │         │  │
//! │  │         ▼                ▼         │  │
//! │  │    ┌──────────────────────────┐    │  │
//! │  │    │        barks-core        │    │  │
//! │  │    └──────────────────────────┘    │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `player`: the companion character and its per-tick think
//! - `component`: the detached sensing sub-agent
//! - `hooks`: damage, death, kill, pickup and squad-command events
//! - `inputs`: scripted-sequence and question inputs
//! - `schedules`: the companion's default schedule library
//! - `expresser`: a concept-delay speech gate
//! - `logging`: tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod component;
pub mod expresser;
pub mod hooks;
pub mod inputs;
pub mod logging;
pub mod player;
pub mod schedules;

pub use component::SensingComponent;
pub use expresser::{ConceptDelayExpresser, ConceptDelays};
pub use hooks::CommandGoal;
pub use inputs::CompanionInput;
pub use player::CompanionPlayer;
pub use schedules::companion_schedules;
