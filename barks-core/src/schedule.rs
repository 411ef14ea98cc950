//! Schedules and the task engine.
//!
//! A [`Schedule`] is static data: an ordered task list plus the conditions
//! that interrupt it. A [`ScheduleLibrary`] maps (state, conditions) to a
//! schedule through an ordered selector list, first match wins, followed by
//! an optional archetype-specific translation. The [`ScheduleEngine`] runs
//! the selected schedule one task at a time and checks interrupts before
//! every task step.
//!
//! The engine understands two tasks itself, `Wait` and `SuggestState`.
//! Everything else goes to the agent's [`TaskHandler`], so a different
//! archetype can bring its own task vocabulary without touching the engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conditions::Conditions;
use crate::error::{BarksError, Result};
use crate::state::{BehaviorStateMachine, NpcState};
use crate::types::SimTime;

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Pose/animation set requested by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Relaxed idle pose.
    Idle,
    /// Weapon-ready idle pose.
    IdleAngry,
    /// Crouched cover pose.
    Cover,
}

/// One step of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", content = "arg", rename_all = "snake_case")]
pub enum Task {
    /// Stop any movement.
    StopMoving,
    /// Turn to face a sensible direction (away from walls, towards open space).
    FaceReasonable,
    /// Switch to a pose.
    SetActivity(Activity),
    /// Wait for the given number of seconds.
    Wait(f32),
    /// Ask the state machine for a state. Non-binding.
    SuggestState(NpcState),
    /// Archetype-specific task handled entirely by the [`TaskHandler`].
    Custom(String),
}

/// An ordered task list and the conditions that abort it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique name.
    pub name: String,
    /// Tasks, run strictly in order.
    pub tasks: Vec<Task>,
    /// Any of these conditions aborts the schedule.
    #[serde(default)]
    pub interrupts: Conditions,
}

/// Maps a state and required conditions to a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// State the selector applies in.
    pub state: NpcState,
    /// Conditions that must all be active.
    #[serde(default)]
    pub requires: Conditions,
    /// Schedule to select.
    pub schedule: String,
}

/// Replaces a generic schedule with an archetype-specific one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Generic schedule name.
    pub from: String,
    /// Replacement.
    pub to: String,
}

/// Static schedule data for one agent archetype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLibrary {
    /// All schedules.
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    /// Selection rules in priority order.
    #[serde(default)]
    pub selectors: Vec<Selector>,
    /// Post-selection replacements.
    #[serde(default)]
    pub translations: Vec<Translation>,
}

impl ScheduleLibrary {
    /// Load and validate a library from TOML.
    ///
    /// # Errors
    /// Returns `BarksError::Config` if the TOML is invalid, or a schedule
    /// error if the library fails [`ScheduleLibrary::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let library: Self =
            toml::from_str(toml_str).map_err(|e| BarksError::Config(e.to_string()))?;
        library.validate()?;
        Ok(library)
    }

    /// Check that every name resolves and every schedule can run.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (i, schedule) in self.schedules.iter().enumerate() {
            if self.schedules[..i].iter().any(|s| s.name == schedule.name) {
                return Err(BarksError::InvalidSchedule {
                    name: schedule.name.clone(),
                    reason: "duplicate name".to_string(),
                });
            }
            if schedule.tasks.is_empty() {
                return Err(BarksError::InvalidSchedule {
                    name: schedule.name.clone(),
                    reason: "no tasks".to_string(),
                });
            }
            if schedule
                .tasks
                .iter()
                .any(|t| matches!(t, Task::Wait(secs) if !secs.is_finite() || *secs < 0.0))
            {
                return Err(BarksError::InvalidSchedule {
                    name: schedule.name.clone(),
                    reason: "wait duration must be finite and non-negative".to_string(),
                });
            }
        }
        let names = self
            .selectors
            .iter()
            .map(|s| &s.schedule)
            .chain(self.translations.iter().flat_map(|t| [&t.from, &t.to]));
        for name in names {
            if self.get(name).is_none() {
                return Err(BarksError::UnknownSchedule(name.clone()));
            }
        }
        Ok(())
    }

    /// Look up a schedule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.name == name)
    }

    /// Apply translations to a schedule name.
    #[must_use]
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.translations
            .iter()
            .find(|t| t.from == name)
            .map_or(name, |t| t.to.as_str())
    }

    /// Pick the schedule for `state` under `conditions`. Pure: the first
    /// declared selector whose state matches and whose required conditions
    /// are all active wins, then translations apply.
    #[must_use]
    pub fn select(&self, state: NpcState, conditions: Conditions) -> Option<&Schedule> {
        let selector = self
            .selectors
            .iter()
            .find(|s| s.state == state && conditions.contains(s.requires))?;
        self.get(self.translate(&selector.schedule))
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Outcome of running a task for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Not finished; resume next tick.
    Running,
    /// Done; move on to the next task.
    Complete,
    /// Could not run; abandon the schedule.
    Failed,
}

/// Runs the tasks the engine does not handle itself.
pub trait TaskHandler {
    /// Run `task`, which started at `started`.
    fn run_task(&mut self, task: &Task, started: SimTime, now: SimTime) -> TaskStatus;
}

/// Handler for agents with no body to move: pose and movement tasks complete
/// immediately, custom tasks fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateTasks;

impl TaskHandler for ImmediateTasks {
    fn run_task(&mut self, task: &Task, _started: SimTime, _now: SimTime) -> TaskStatus {
        match task {
            Task::Custom(_) => TaskStatus::Failed,
            _ => TaskStatus::Complete,
        }
    }
}

#[derive(Debug, Clone)]
struct Running {
    name: String,
    interrupts: Conditions,
    index: usize,
    task_started: Option<SimTime>,
    fresh: bool,
}

/// What happened during one [`ScheduleEngine::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Schedules selected, in order.
    pub selected: Vec<String>,
    /// Schedule aborted by an interrupt, if any.
    pub interrupted: Option<String>,
    /// Schedules that ran their last task.
    pub completed: Vec<String>,
    /// Schedule abandoned because a task failed, if any.
    pub failed: Option<String>,
    /// Task steps taken.
    pub steps: usize,
}

/// Runs schedules for one agent.
#[derive(Debug, Clone)]
pub struct ScheduleEngine {
    current: Option<Running>,
    max_steps: usize,
}

impl ScheduleEngine {
    /// Engine taking at most `max_steps` task steps per tick.
    #[must_use]
    pub fn new(max_steps: usize) -> Self {
        Self {
            current: None,
            max_steps: max_steps.max(1),
        }
    }

    /// Name of the running schedule.
    #[must_use]
    pub fn current_schedule(&self) -> Option<&str> {
        self.current.as_ref().map(|r| r.name.as_str())
    }

    /// Index of the running task within the running schedule.
    #[must_use]
    pub fn current_task_index(&self) -> Option<usize> {
        self.current.as_ref().map(|r| r.index)
    }

    /// Drop the running schedule; the next step reselects.
    pub fn abort(&mut self) {
        self.current = None;
    }

    /// Advance the agent's behavior by one tick.
    ///
    /// Before every task step the state machine is evaluated and the running
    /// schedule's interrupts are checked against the active conditions. A
    /// state change or an interrupt aborts the schedule and forces
    /// reselection. A schedule selected during this call is not interrupted
    /// until the next call, so a condition can abort at most one schedule.
    pub fn step(
        &mut self,
        library: &ScheduleLibrary,
        machine: &mut BehaviorStateMachine,
        handler: &mut dyn TaskHandler,
        now: SimTime,
    ) -> StepReport {
        let _span = tracing::trace_span!(crate::metrics::spans::SCHEDULE_STEP).entered();
        let mut report = StepReport::default();
        if let Some(running) = self.current.as_mut() {
            running.fresh = false;
        }

        while report.steps < self.max_steps {
            if machine.evaluate().is_some() {
                if let Some(running) = self.current.take() {
                    debug!(schedule = %running.name, state = %machine.state(), "state changed, reselecting");
                }
            }

            if let Some(running) = &self.current
                && !running.fresh
                && machine.conditions().intersects(running.interrupts)
            {
                debug!(
                    schedule = %running.name,
                    conditions = ?(machine.conditions() & running.interrupts),
                    "schedule interrupted"
                );
                report.interrupted = Some(running.name.clone());
                self.current = None;
            }

            if self.current.is_none() {
                let Some(schedule) = library.select(machine.state(), machine.conditions()) else {
                    return report;
                };
                debug!(schedule = %schedule.name, state = %machine.state(), "schedule selected");
                report.selected.push(schedule.name.clone());
                self.current = Some(Running {
                    name: schedule.name.clone(),
                    interrupts: schedule.interrupts,
                    index: 0,
                    task_started: None,
                    fresh: true,
                });
            }
            let Some(running) = self.current.as_mut() else {
                return report;
            };

            let Some(schedule) = library.get(&running.name) else {
                warn!(schedule = %running.name, "running schedule vanished from library");
                self.current = None;
                return report;
            };
            let Some(task) = schedule.tasks.get(running.index) else {
                self.current = None;
                continue;
            };

            report.steps += 1;
            let started = *running.task_started.get_or_insert(now);
            let status = match task {
                Task::Wait(secs) => {
                    if now.since(started) >= *secs {
                        TaskStatus::Complete
                    } else {
                        TaskStatus::Running
                    }
                }
                Task::SuggestState(target) => {
                    machine.suggest(*target);
                    TaskStatus::Complete
                }
                other => handler.run_task(other, started, now),
            };

            match status {
                TaskStatus::Running => return report,
                TaskStatus::Complete => {
                    running.index += 1;
                    running.task_started = None;
                    if running.index >= schedule.tasks.len() {
                        debug!(schedule = %running.name, "schedule complete");
                        report.completed.push(running.name.clone());
                        self.current = None;
                    }
                }
                TaskStatus::Failed => {
                    warn!(schedule = %running.name, task = ?task, "task failed");
                    report.failed = Some(running.name.clone());
                    self.current = None;
                }
            }
        }
        report
    }
}

impl Default for ScheduleEngine {
    fn default() -> Self {
        Self::new(crate::config::ScheduleConfig::default().max_task_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f32) -> SimTime {
        SimTime::from_secs(secs)
    }

    fn library() -> ScheduleLibrary {
        ScheduleLibrary {
            schedules: vec![
                Schedule {
                    name: "idle_stand".into(),
                    tasks: vec![Task::StopMoving, Task::Wait(1.0)],
                    interrupts: Conditions::NEW_ENEMY | Conditions::HEAR_DANGER,
                },
                Schedule {
                    name: "alert_stand".into(),
                    tasks: vec![Task::Wait(10.0)],
                    interrupts: Conditions::SEE_ENEMY,
                },
                Schedule {
                    name: "custom_alert_stand".into(),
                    tasks: vec![
                        Task::FaceReasonable,
                        Task::Wait(5.0),
                        Task::SuggestState(NpcState::Idle),
                    ],
                    interrupts: Conditions::SEE_ENEMY | Conditions::HEAR_DANGER,
                },
                Schedule {
                    name: "combat_face".into(),
                    tasks: vec![Task::SetActivity(Activity::IdleAngry), Task::Wait(0.5)],
                    interrupts: Conditions::empty(),
                },
                Schedule {
                    name: "take_cover".into(),
                    tasks: vec![Task::Custom("find_cover".into())],
                    interrupts: Conditions::empty(),
                },
            ],
            selectors: vec![
                Selector {
                    state: NpcState::Idle,
                    requires: Conditions::empty(),
                    schedule: "idle_stand".into(),
                },
                Selector {
                    state: NpcState::Alert,
                    requires: Conditions::empty(),
                    schedule: "alert_stand".into(),
                },
                Selector {
                    state: NpcState::Combat,
                    requires: Conditions::HEAVY_DAMAGE,
                    schedule: "take_cover".into(),
                },
                Selector {
                    state: NpcState::Combat,
                    requires: Conditions::empty(),
                    schedule: "combat_face".into(),
                },
            ],
            translations: vec![Translation {
                from: "alert_stand".into(),
                to: "custom_alert_stand".into(),
            }],
        }
    }

    #[test]
    fn library_validates() {
        library().validate().expect("valid library");
    }

    #[test]
    fn unknown_selector_target_is_rejected() {
        let mut lib = library();
        lib.selectors[0].schedule = "missing".into();
        assert!(matches!(lib.validate(), Err(BarksError::UnknownSchedule(n)) if n == "missing"));
    }

    #[test]
    fn empty_schedule_is_rejected() {
        let mut lib = library();
        lib.schedules[0].tasks.clear();
        assert!(matches!(lib.validate(), Err(BarksError::InvalidSchedule { .. })));
    }

    #[test]
    fn selection_is_first_match_then_translated() {
        let lib = library();
        let s = lib.select(NpcState::Alert, Conditions::empty()).expect("alert schedule");
        assert_eq!(s.name, "custom_alert_stand");
        let s = lib
            .select(NpcState::Combat, Conditions::HEAVY_DAMAGE | Conditions::SEE_ENEMY)
            .expect("combat schedule");
        assert_eq!(s.name, "take_cover");
        let s = lib.select(NpcState::Combat, Conditions::SEE_ENEMY).expect("combat schedule");
        assert_eq!(s.name, "combat_face");
    }

    #[test]
    fn tasks_run_in_order_and_wait() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        let mut engine = ScheduleEngine::new(8);
        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));
        assert_eq!(report.selected, vec!["idle_stand".to_string()]);
        assert_eq!(engine.current_task_index(), Some(1));

        engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.5));
        assert_eq!(engine.current_task_index(), Some(1));

        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(1.0));
        assert_eq!(report.completed, vec!["idle_stand".to_string()]);
        // Reselected right away from the current state.
        assert_eq!(engine.current_schedule(), Some("idle_stand"));
    }

    #[test]
    fn interrupt_aborts_running_schedule() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        let mut engine = ScheduleEngine::new(8);
        engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));

        machine.raise(Conditions::HEAR_DANGER);
        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.1));
        // Danger alerts the agent, which aborts idle_stand; the alert stand
        // selected in its place is not interrupted on the same step.
        assert_eq!(machine.state(), NpcState::Alert);
        assert_eq!(engine.current_schedule(), Some("custom_alert_stand"));
        assert_eq!(report.selected, vec!["custom_alert_stand".to_string()]);
    }

    #[test]
    fn interrupt_without_state_change() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        machine.force(NpcState::Alert);
        let mut engine = ScheduleEngine::new(8);
        engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));
        assert_eq!(engine.current_schedule(), Some("custom_alert_stand"));

        // Danger is an interrupt of the alert stand but no transition from ALERT.
        machine.raise(Conditions::HEAR_DANGER);
        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.1));
        assert_eq!(report.interrupted.as_deref(), Some("custom_alert_stand"));
        assert_eq!(engine.current_task_index(), Some(1));
    }

    #[test]
    fn fresh_schedule_waits_a_step_before_interrupts_apply() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        machine.force(NpcState::Alert);
        machine.raise(Conditions::HEAR_DANGER);
        let mut engine = ScheduleEngine::new(8);

        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));
        assert_eq!(report.selected, vec!["custom_alert_stand".to_string()]);
        assert_eq!(report.interrupted, None);
        assert_eq!(engine.current_task_index(), Some(1));

        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.1));
        assert_eq!(report.interrupted.as_deref(), Some("custom_alert_stand"));
        assert_eq!(report.selected, vec!["custom_alert_stand".to_string()]);
        assert_eq!(engine.current_task_index(), Some(1));
    }

    #[test]
    fn suggest_state_returns_to_idle() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        machine.force(NpcState::Alert);
        let mut engine = ScheduleEngine::new(8);
        engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));
        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(5.0));
        assert_eq!(report.completed, vec!["custom_alert_stand".to_string()]);
        assert_eq!(machine.state(), NpcState::Idle);
        assert_eq!(engine.current_schedule(), Some("idle_stand"));
    }

    #[test]
    fn failed_task_abandons_schedule() {
        let lib = library();
        let mut machine = BehaviorStateMachine::new();
        machine.force(NpcState::Combat);
        machine.raise(Conditions::HEAVY_DAMAGE);
        let mut engine = ScheduleEngine::new(2);
        let report = engine.step(&lib, &mut machine, &mut ImmediateTasks, t(0.0));
        assert_eq!(report.failed.as_deref(), Some("take_cover"));
        assert_eq!(report.steps, 2);
    }

    #[test]
    fn library_loads_from_toml() {
        let lib = ScheduleLibrary::from_toml(
            r#"
            [[schedules]]
            name = "idle_stand"
            interrupts = "NEW_ENEMY | HEAR_DANGER"
            tasks = [
                { task = "stop_moving" },
                { task = "set_activity", arg = "idle" },
                { task = "wait", arg = 2.0 },
            ]

            [[selectors]]
            state = "idle"
            schedule = "idle_stand"
            "#,
        )
        .expect("library parses");
        let s = lib.select(NpcState::Idle, Conditions::empty()).expect("selected");
        assert_eq!(s.tasks[2], Task::Wait(2.0));
        assert!(s.interrupts.contains(Conditions::HEAR_DANGER));
    }

    #[test]
    fn task_json_shape() {
        let json = serde_json::to_string(&Task::SuggestState(NpcState::Idle)).expect("serializes");
        assert_eq!(json, r#"{"task":"suggest_state","arg":"idle"}"#);
    }
}
