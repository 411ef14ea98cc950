//! Enemy memory: every hostile the agent currently tracks.

use crate::types::{EntityId, SimTime, Vec3};

/// What the agent remembers about one enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyRecord {
    /// The enemy.
    pub enemy: EntityId,
    /// When the enemy was first seen.
    pub first_seen: SimTime,
    /// When the enemy was last seen.
    pub last_seen: SimTime,
    /// Where the enemy was last seen.
    pub last_known_position: Vec3,
    /// Set by the mob detector when the enemy was close enough to count
    /// towards being mobbed.
    pub mobbed_me: bool,
}

/// Per-agent table of tracked enemies, in first-sighting order.
#[derive(Debug, Clone, Default)]
pub struct EnemyMemory {
    records: Vec<EnemyRecord>,
}

impl EnemyMemory {
    /// Empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting. Returns `true` if the enemy was not tracked before.
    pub fn update(&mut self, enemy: EntityId, position: Vec3, now: SimTime) -> bool {
        if let Some(record) = self.records.iter_mut().find(|r| r.enemy == enemy) {
            record.last_seen = now;
            record.last_known_position = position;
            return false;
        }
        self.records.push(EnemyRecord {
            enemy,
            first_seen: now,
            last_seen: now,
            last_known_position: position,
            mobbed_me: false,
        });
        true
    }

    /// Stop tracking an enemy. Returns the removed record.
    pub fn forget(&mut self, enemy: EntityId) -> Option<EnemyRecord> {
        let idx = self.records.iter().position(|r| r.enemy == enemy)?;
        Some(self.records.remove(idx))
    }

    /// Drop every enemy not seen for `max_age` seconds.
    pub fn forget_older_than(&mut self, now: SimTime, max_age: f32) -> usize {
        let before = self.records.len();
        self.records.retain(|r| now.since(r.last_seen) <= max_age);
        before - self.records.len()
    }

    /// Look up an enemy.
    #[must_use]
    pub fn get(&self, enemy: EntityId) -> Option<&EnemyRecord> {
        self.records.iter().find(|r| r.enemy == enemy)
    }

    /// All records.
    pub fn iter(&self) -> impl Iterator<Item = &EnemyRecord> {
        self.records.iter()
    }

    /// All records, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EnemyRecord> {
        self.records.iter_mut()
    }

    /// Number of tracked enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent time any enemy was seen, or `None` if nothing is tracked.
    #[must_use]
    pub fn most_recent_sighting(&self) -> Option<SimTime> {
        self.records
            .iter()
            .map(|r| r.last_seen)
            .max_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// The enemy with the highest `score`; ties go to the earliest sighted.
    pub fn select<F>(&self, mut score: F) -> Option<EntityId>
    where
        F: FnMut(&EnemyRecord) -> Option<i32>,
    {
        let mut best: Option<(i32, EntityId)> = None;
        for record in &self.records {
            let Some(s) = score(record) else { continue };
            if best.is_none_or(|(b, _)| s > b) {
                best = Some((s, record.enemy));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
