//! The companion's default schedule library.
//!
//! Generic schedule names are kept so host games can swap in their own
//! library; the companion-specific alert stand is reached by translation.

use barks_core::conditions::Conditions;
use barks_core::schedule::{Activity, Schedule, ScheduleLibrary, Selector, Task, Translation};
use barks_core::state::NpcState;

/// Idle stand.
pub const IDLE_STAND: &str = "idle_stand";
/// Generic alert stand, translated for the companion.
pub const ALERT_STAND: &str = "alert_stand";
/// The companion's alert stand: look around briefly, then relax.
pub const COMPANION_ALERT_STAND: &str = "companion_alert_stand";
/// Combat facing.
pub const COMBAT_FACE: &str = "combat_face";

/// Anything that should snap a standing companion out of its schedule.
pub const STAND_INTERRUPTS: Conditions = Conditions::NEW_ENEMY
    .union(Conditions::SEE_ENEMY)
    .union(Conditions::LIGHT_DAMAGE)
    .union(Conditions::HEAVY_DAMAGE)
    .union(Conditions::HEAR_COMBAT)
    .union(Conditions::HEAR_DANGER)
    .union(Conditions::HEAR_BULLET_IMPACT)
    .union(Conditions::IDLE_INTERRUPT);

/// Seconds the companion stays alert before suggesting idle.
pub const ALERT_LINGER_SECS: f32 = 5.0;

/// Seconds an idle stand lasts before it is reselected.
pub const IDLE_STAND_SECS: f32 = 3.0;

/// Build the default library.
#[must_use]
pub fn companion_schedules() -> ScheduleLibrary {
    ScheduleLibrary {
        schedules: vec![
            Schedule {
                name: IDLE_STAND.into(),
                tasks: vec![
                    Task::StopMoving,
                    Task::SetActivity(Activity::Idle),
                    Task::Wait(IDLE_STAND_SECS),
                ],
                interrupts: STAND_INTERRUPTS,
            },
            Schedule {
                name: ALERT_STAND.into(),
                tasks: vec![
                    Task::StopMoving,
                    Task::FaceReasonable,
                    Task::SetActivity(Activity::Idle),
                    Task::Wait(20.0),
                ],
                interrupts: STAND_INTERRUPTS,
            },
            Schedule {
                name: COMPANION_ALERT_STAND.into(),
                tasks: vec![
                    Task::StopMoving,
                    Task::FaceReasonable,
                    Task::SetActivity(Activity::Idle),
                    Task::Wait(ALERT_LINGER_SECS),
                    Task::SuggestState(NpcState::Idle),
                ],
                interrupts: STAND_INTERRUPTS,
            },
            Schedule {
                name: COMBAT_FACE.into(),
                tasks: vec![
                    Task::StopMoving,
                    Task::SetActivity(Activity::IdleAngry),
                    Task::FaceReasonable,
                    Task::Wait(1.0),
                ],
                interrupts: Conditions::NEW_ENEMY | Conditions::HEAVY_DAMAGE,
            },
        ],
        selectors: vec![
            Selector {
                state: NpcState::Idle,
                requires: Conditions::empty(),
                schedule: IDLE_STAND.into(),
            },
            Selector {
                state: NpcState::Alert,
                requires: Conditions::empty(),
                schedule: ALERT_STAND.into(),
            },
            Selector {
                state: NpcState::Combat,
                requires: Conditions::empty(),
                schedule: COMBAT_FACE.into(),
            },
        ],
        translations: vec![Translation {
            from: ALERT_STAND.into(),
            to: COMPANION_ALERT_STAND.into(),
        }],
    }
}
