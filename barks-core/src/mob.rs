//! Mob detection: how many hostiles are visible, and how many are close.
//!
//! Runs once per decision pass while in combat. The counts are cached on the
//! speaker for criteria composition and combat speech later in the same or a
//! following decision.

use tracing::debug;

use crate::config::MobConfig;
use crate::enemies::EnemyMemory;
use crate::types::{EntityId, SimTime, Vec3};
use crate::world::WorldView;

/// Result of one mob scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnemyCounts {
    /// Enemies passing every visibility filter.
    pub visible: u32,
    /// Visible enemies within the close distance.
    pub close: u32,
    /// Whether `close` reached the mob threshold.
    pub mobbed: bool,
}

/// Counts visible and close enemies against [`MobConfig`] thresholds.
#[derive(Debug, Clone)]
pub struct MobDetector {
    visibility_sqr: f32,
    close_sqr: f32,
    mob_count: u32,
    freshness: f32,
}

impl MobDetector {
    /// Detector using the given thresholds.
    #[must_use]
    pub fn new(config: &MobConfig) -> Self {
        Self {
            visibility_sqr: config.visibility_distance_sqr(),
            close_sqr: config.close_distance_sqr(),
            mob_count: config.mob_count,
            freshness: config.freshness,
        }
    }

    /// Scan `enemies` from the point of view of `speaker` at `origin`.
    ///
    /// An enemy is visible when the speaker regards it as hostile or worse,
    /// it is within the visibility distance, alive, seen within the
    /// freshness window, and not a target-practice dummy. Close enemies get
    /// their `mobbed_me` flag set.
    pub fn measure(
        &self,
        speaker: EntityId,
        origin: Vec3,
        now: SimTime,
        enemies: &mut EnemyMemory,
        world: &dyn WorldView,
    ) -> EnemyCounts {
        let _span = tracing::trace_span!(crate::metrics::spans::MOB_SCAN).entered();
        let mut counts = EnemyCounts::default();
        for record in enemies.iter_mut() {
            if !world.relation(speaker, record.enemy).is_hostile() {
                continue;
            }
            let Some(info) = world.entity(record.enemy) else {
                continue;
            };
            let dist_sqr = info.position.dist_sqr(origin);
            if dist_sqr > self.visibility_sqr
                || !info.alive
                || now.since(record.last_seen) > self.freshness
                || info.target_practice
            {
                continue;
            }
            counts.visible += 1;
            if dist_sqr <= self.close_sqr {
                counts.close += 1;
                record.mobbed_me = true;
            }
        }
        counts.mobbed = counts.close >= self.mob_count;
        debug!(
            visible = counts.visible,
            close = counts.close,
            mobbed = counts.mobbed,
            "measured enemies"
        );
        counts
    }
}

impl Default for MobDetector {
    fn default() -> Self {
        Self::new(&MobConfig::default())
    }
}
