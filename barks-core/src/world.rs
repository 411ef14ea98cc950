//! Read-only view of the world the decision core consults.
//!
//! The host game owns every entity. The core only looks entities up by
//! [`EntityId`] and asks for relationships and line of sight, so the host
//! can implement [`WorldView`] over whatever storage it already has.
//! [`EntityTable`] is the in-memory implementation used by tests, benches and
//! simple hosts.

use std::collections::{HashMap, HashSet};

use crate::types::{Disposition, EntityId, Vec3};

/// Snapshot of the entity facts the decision core reads.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    /// Handle.
    pub id: EntityId,
    /// Class name used in criteria (`npc_combine_s`, `grenade_frag`, ...).
    pub classname: String,
    /// Optional targetname.
    pub name: Option<String>,
    /// World position.
    pub position: Vec3,
    /// Whether the entity is alive.
    pub alive: bool,
    /// Whether the entity is an NPC (as opposed to a player or prop).
    pub is_npc: bool,
    /// Inert target-practice dummies never count as real enemies.
    pub target_practice: bool,
    /// For thrown explosives: who threw it.
    pub thrower: Option<EntityId>,
    /// Whether the entity is a physics-driven object.
    pub physics_driven: bool,
    /// Class name of the weapon the entity holds, if any.
    pub active_weapon: Option<String>,
    /// Whether the entity follows the player's squad.
    pub in_player_squad: bool,
    /// Whether the entity is currently speaking.
    pub is_speaking: bool,
}

impl EntityInfo {
    /// A live NPC of the given class at `position`.
    #[must_use]
    pub fn npc(id: EntityId, classname: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            classname: classname.into(),
            name: None,
            position,
            alive: true,
            is_npc: true,
            target_practice: false,
            thrower: None,
            physics_driven: false,
            active_weapon: None,
            in_player_squad: false,
            is_speaking: false,
        }
    }

    /// A non-NPC object (projectile, prop, player) of the given class.
    #[must_use]
    pub fn object(id: EntityId, classname: impl Into<String>, position: Vec3) -> Self {
        Self {
            is_npc: false,
            ..Self::npc(id, classname, position)
        }
    }

    /// Builder: set the thrower.
    #[must_use]
    pub fn thrown_by(mut self, thrower: EntityId) -> Self {
        self.thrower = Some(thrower);
        self
    }

    /// Builder: set the held weapon.
    #[must_use]
    pub fn holding(mut self, weapon: impl Into<String>) -> Self {
        self.active_weapon = Some(weapon.into());
        self
    }

    /// Builder: set the targetname.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: mark as a target-practice dummy.
    #[must_use]
    pub fn target_practice(mut self) -> Self {
        self.target_practice = true;
        self
    }

    /// Builder: mark as following the player's squad.
    #[must_use]
    pub fn in_player_squad(mut self) -> Self {
        self.in_player_squad = true;
        self
    }
}

/// The world as seen by the decision core.
pub trait WorldView {
    /// Look up an entity.
    fn entity(&self, id: EntityId) -> Option<&EntityInfo>;

    /// How `from` regards `to`.
    fn relation(&self, from: EntityId, to: EntityId) -> Disposition;

    /// Whether `viewer` has line of sight to `target`.
    fn can_see(&self, viewer: EntityId, target: EntityId) -> bool;

    /// Whether `target` is in `viewer`'s potentially visible set. Coarser than
    /// [`WorldView::can_see`]; defaults to it.
    fn in_view(&self, viewer: EntityId, target: EntityId) -> bool {
        self.can_see(viewer, target)
    }
}

/// In-memory [`WorldView`].
#[derive(Debug, Clone)]
pub struct EntityTable {
    entities: HashMap<EntityId, EntityInfo>,
    relations: HashMap<(EntityId, EntityId), Disposition>,
    blocked: HashSet<(EntityId, EntityId)>,
    default_relation: Disposition,
}

impl EntityTable {
    /// Empty table. Unlisted relations default to [`Disposition::Neutral`]
    /// and everything is visible.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            relations: HashMap::new(),
            blocked: HashSet::new(),
            default_relation: Disposition::Neutral,
        }
    }

    /// Insert or replace an entity.
    pub fn insert(&mut self, info: EntityInfo) -> EntityId {
        let id = info.id;
        self.entities.insert(id, info);
        id
    }

    /// Remove an entity.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityInfo> {
        self.entities.remove(&id)
    }

    /// Mutable access for moving or killing entities.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityInfo> {
        self.entities.get_mut(&id)
    }

    /// Set how `from` regards `to`.
    pub fn set_relation(&mut self, from: EntityId, to: EntityId, disposition: Disposition) {
        self.relations.insert((from, to), disposition);
    }

    /// Block or unblock line of sight from `viewer` to `target`.
    pub fn set_visible(&mut self, viewer: EntityId, target: EntityId, visible: bool) {
        if visible {
            self.blocked.remove(&(viewer, target));
        } else {
            self.blocked.insert((viewer, target));
        }
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldView for EntityTable {
    fn entity(&self, id: EntityId) -> Option<&EntityInfo> {
        self.entities.get(&id)
    }

    fn relation(&self, from: EntityId, to: EntityId) -> Disposition {
        self.relations
            .get(&(from, to))
            .copied()
            .unwrap_or(self.default_relation)
    }

    fn can_see(&self, viewer: EntityId, target: EntityId) -> bool {
        !self.blocked.contains(&(viewer, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_relation_is_neutral() {
        let table = EntityTable::new();
        assert_eq!(
            table.relation(EntityId::new(), EntityId::new()),
            Disposition::Neutral
        );
    }

    #[test]
    fn visibility_toggles() {
        let mut table = EntityTable::new();
        let a = EntityId::new();
        let b = EntityId::new();
        assert!(table.can_see(a, b));
        table.set_visible(a, b, false);
        assert!(!table.can_see(a, b));
        assert!(!table.in_view(a, b));
        table.set_visible(a, b, true);
        assert!(table.can_see(a, b));
    }

    #[test]
    fn object_is_not_npc() {
        let info = EntityInfo::object(EntityId::new(), "grenade_frag", Vec3::ZERO);
        assert!(!info.is_npc);
        assert!(info.alive);
    }
}
