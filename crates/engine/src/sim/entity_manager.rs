use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{trace, warn};

use super::components::{
    AnimationBinding, BoundingBox, Component, Gravity, Input, Lifespan, LocomotionState, Transform,
};
use super::{FrameRect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityTag {
    Player,
    Tile,
    Dec,
    Enemy,
    Bullet,
    Boom,
    Coin,
}

const TAG_COUNT: usize = 7;

impl EntityTag {
    pub const ALL: [EntityTag; TAG_COUNT] = [
        EntityTag::Player,
        EntityTag::Tile,
        EntityTag::Dec,
        EntityTag::Enemy,
        EntityTag::Bullet,
        EntityTag::Boom,
        EntityTag::Coin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Tile => "Tile",
            Self::Dec => "Dec",
            Self::Enemy => "Enemy",
            Self::Bullet => "Bullet",
            Self::Boom => "Boom",
            Self::Coin => "Coin",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Tile => 1,
            Self::Dec => 2,
            Self::Enemy => 3,
            Self::Bullet => 4,
            Self::Boom => 5,
            Self::Coin => 6,
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity tag '{0}'")]
pub struct UnknownTagError(pub String);

impl FromStr for EntityTag {
    type Err = UnknownTagError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == raw)
            .ok_or_else(|| UnknownTagError(raw.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Sparse storage for one component type, keyed by entity identity.
#[derive(Debug)]
pub struct ComponentStore<T> {
    items: HashMap<EntityId, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, id: EntityId, value: T) -> &mut T {
        match self.items.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(value);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(value),
        }
    }

    fn remove(&mut self, id: EntityId) -> Option<T> {
        self.items.remove(&id)
    }
}

#[derive(Debug, Default)]
pub struct ComponentStores {
    transforms: ComponentStore<Transform>,
    bounding_boxes: ComponentStore<BoundingBox>,
    animations: ComponentStore<AnimationBinding>,
    inputs: ComponentStore<Input>,
    gravities: ComponentStore<Gravity>,
    lifespans: ComponentStore<Lifespan>,
    states: ComponentStore<LocomotionState>,
}

impl ComponentStores {
    fn remove_all(&mut self, id: EntityId) {
        self.transforms.remove(id);
        self.bounding_boxes.remove(id);
        self.animations.remove(id);
        self.inputs.remove(id);
        self.gravities.remove(id);
        self.lifespans.remove(id);
        self.states.remove(id);
    }
}

macro_rules! impl_component {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn store(stores: &ComponentStores) -> &ComponentStore<Self> {
                &stores.$field
            }

            fn store_mut(stores: &mut ComponentStores) -> &mut ComponentStore<Self> {
                &mut stores.$field
            }
        }
    };
}

impl_component!(Transform, transforms);
impl_component!(BoundingBox, bounding_boxes);
impl_component!(AnimationBinding, animations);
impl_component!(Input, inputs);
impl_component!(Gravity, gravities);
impl_component!(Lifespan, lifespans);
impl_component!(LocomotionState, states);

#[derive(Debug, Clone, Copy)]
struct EntityRecord {
    tag: EntityTag,
    alive: bool,
}

/// Render-facing view of one live entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub tag: EntityTag,
    pub position: Vec2,
    pub scale: Vec2,
    pub angle: f32,
    pub texture: Option<String>,
    pub region: Option<FrameRect>,
    pub half_size: Option<Vec2>,
}

/// Owns every entity and its components.
///
/// Creation and destruction are staged: `add_entity` hands out an id that can
/// receive components right away, but queries only see it after the next
/// `update`. `destroy` flips the alive flag immediately; the entity and its
/// components are swept on the next `update`. Ids are never reused.
#[derive(Debug, Default)]
pub struct EntityManager {
    allocator: EntityIdAllocator,
    records: HashMap<EntityId, EntityRecord>,
    entities: Vec<EntityId>,
    entities_by_tag: [Vec<EntityId>; TAG_COUNT],
    pending_adds: Vec<EntityId>,
    components: ComponentStores,
}

impl EntityManager {
    pub fn add_entity(&mut self, tag: EntityTag) -> EntityId {
        let id = self.allocator.allocate();
        self.records.insert(id, EntityRecord { tag, alive: true });
        self.pending_adds.push(id);
        trace!(entity = %id, tag = %tag, "entity_added");
        id
    }

    /// Returns true only for the call that actually flips the entity to dead.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if record.alive => {
                record.alive = false;
                trace!(entity = %id, tag = %record.tag, "entity_destroyed");
                true
            }
            _ => false,
        }
    }

    pub fn update(&mut self) {
        for id in self.pending_adds.drain(..) {
            if let Some(record) = self.records.get(&id) {
                self.entities.push(id);
                self.entities_by_tag[record.tag.index()].push(id);
            }
        }

        let records = &self.records;
        let is_live = |id: &EntityId| records.get(id).is_some_and(|record| record.alive);
        self.entities.retain(is_live);
        for tagged in &mut self.entities_by_tag {
            tagged.retain(is_live);
        }

        let mut dead = self
            .records
            .iter()
            .filter(|(_, record)| !record.alive)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        dead.sort_unstable();
        for id in dead {
            self.records.remove(&id);
            self.components.remove_all(id);
        }
    }

    /// Drops every entity, committed or pending, for scene teardown. The id
    /// sequence keeps counting.
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.entities.clear();
        for tagged in &mut self.entities_by_tag {
            tagged.clear();
        }
        self.pending_adds.clear();
        self.components = ComponentStores::default();
    }

    /// Live, committed entities in creation order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn entities_with_tag(&self, tag: EntityTag) -> &[EntityId] {
        &self.entities_by_tag[tag.index()]
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_adds.len()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.records.get(&id).is_some_and(|record| record.alive)
    }

    /// True until the entity has been swept, even if it is already dead.
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn tag(&self, id: EntityId) -> Option<EntityTag> {
        self.records.get(&id).map(|record| record.tag)
    }

    /// Attaches or replaces a component. Swept entities cannot receive components.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> Option<&mut C> {
        if !self.records.contains_key(&id) {
            warn!(entity = %id, "add_component_on_swept_entity");
            return None;
        }
        Some(C::store_mut(&mut self.components).insert(id, component))
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        C::store(&self.components).get(id)
    }

    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        C::store_mut(&mut self.components).get_mut(id)
    }

    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        C::store(&self.components).contains(id)
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter_map(|&id| {
                let tag = self.tag(id)?;
                let transform = self.get::<Transform>(id)?;
                let binding = self.get::<AnimationBinding>(id);
                Some(EntitySnapshot {
                    id,
                    tag,
                    position: transform.position,
                    scale: transform.scale,
                    angle: transform.angle,
                    texture: binding.map(|binding| binding.animation.sheet().texture.clone()),
                    region: binding.map(|binding| binding.animation.region()),
                    half_size: self
                        .get::<BoundingBox>(id)
                        .map(|bounds| bounds.half_size),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Animation, SpriteSheet};

    fn committed(manager: &mut EntityManager, tag: EntityTag) -> EntityId {
        let id = manager.add_entity(tag);
        manager.update();
        id
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn added_entity_is_hidden_until_update() {
        let mut manager = EntityManager::default();
        let id = manager.add_entity(EntityTag::Tile);
        assert!(manager.entities().is_empty());
        assert!(manager.entities_with_tag(EntityTag::Tile).is_empty());
        assert_eq!(manager.pending_count(), 1);
        assert!(manager.is_alive(id));

        manager.update();
        assert_eq!(manager.entities(), &[id]);
        assert_eq!(manager.entities_with_tag(EntityTag::Tile), &[id]);
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn handle_accepts_components_before_commit() {
        let mut manager = EntityManager::default();
        let id = manager.add_entity(EntityTag::Player);
        manager
            .add_component(id, Transform::at(Vec2::new(5.0, 6.0)))
            .expect("transform attached");
        assert!(manager.has::<Transform>(id));

        manager.update();
        assert_eq!(
            manager.get::<Transform>(id).map(|t| t.position),
            Some(Vec2::new(5.0, 6.0))
        );
    }

    #[test]
    fn destroyed_entity_stays_until_sweep_then_is_gone() {
        let mut manager = EntityManager::default();
        let id = committed(&mut manager, EntityTag::Enemy);
        manager.add_component(id, Gravity { gravity: 1.0 });

        assert!(manager.destroy(id));
        assert!(!manager.is_alive(id));
        assert_eq!(manager.entities(), &[id]);
        assert!(manager.has::<Gravity>(id));

        manager.update();
        assert!(manager.entities().is_empty());
        assert!(manager.entities_with_tag(EntityTag::Enemy).is_empty());
        assert!(!manager.contains(id));
        assert!(!manager.has::<Gravity>(id));
        assert_eq!(manager.tag(id), None);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut manager = EntityManager::default();
        let doomed = committed(&mut manager, EntityTag::Bullet);
        let survivor = committed(&mut manager, EntityTag::Bullet);

        assert!(manager.destroy(doomed));
        assert!(!manager.destroy(doomed));
        assert!(!manager.destroy(doomed));
        manager.update();
        assert!(!manager.destroy(doomed));

        assert_eq!(manager.entities(), &[survivor]);
    }

    #[test]
    fn ids_never_reappear_after_sweep() {
        let mut manager = EntityManager::default();
        let first = committed(&mut manager, EntityTag::Coin);
        manager.destroy(first);
        manager.update();

        let second = committed(&mut manager, EntityTag::Coin);
        assert_ne!(first, second);
        assert!(second.0 > first.0);
        assert!(!manager.entities().contains(&first));
    }

    #[test]
    fn added_and_destroyed_in_same_tick_is_never_visible() {
        let mut manager = EntityManager::default();
        let id = manager.add_entity(EntityTag::Boom);
        manager.destroy(id);
        manager.update();
        assert!(manager.entities().is_empty());
        assert!(!manager.contains(id));
    }

    #[test]
    fn queries_keep_creation_order_per_tag() {
        let mut manager = EntityManager::default();
        let tile_a = manager.add_entity(EntityTag::Tile);
        let enemy = manager.add_entity(EntityTag::Enemy);
        let tile_b = manager.add_entity(EntityTag::Tile);
        let tile_c = manager.add_entity(EntityTag::Tile);
        manager.update();

        assert_eq!(manager.entities(), &[tile_a, enemy, tile_b, tile_c]);
        assert_eq!(
            manager.entities_with_tag(EntityTag::Tile),
            &[tile_a, tile_b, tile_c]
        );

        manager.destroy(tile_b);
        manager.update();
        assert_eq!(manager.entities_with_tag(EntityTag::Tile), &[tile_a, tile_c]);
        assert_eq!(manager.entities_with_tag(EntityTag::Enemy), &[enemy]);
    }

    #[test]
    fn swept_entity_rejects_new_components() {
        let mut manager = EntityManager::default();
        let id = committed(&mut manager, EntityTag::Dec);
        manager.destroy(id);
        manager.update();
        assert!(manager
            .add_component(id, Transform::default())
            .is_none());
        assert!(!manager.has::<Transform>(id));
    }

    #[test]
    fn add_component_replaces_existing_value() {
        let mut manager = EntityManager::default();
        let id = committed(&mut manager, EntityTag::Tile);
        let sheet = SpriteSheet::new("TexQuestion", 64.0, 64.0);
        let first = Animation::new("Question", sheet.clone());
        manager.add_component(id, AnimationBinding::new(first, true));
        let second = Animation::new("Question2", sheet);
        manager.add_component(id, AnimationBinding::new(second, true));

        let binding = manager.get::<AnimationBinding>(id).expect("binding");
        assert_eq!(binding.animation.name(), "Question2");
    }

    #[test]
    fn clear_drops_everything_but_keeps_counting_ids() {
        let mut manager = EntityManager::default();
        let before = committed(&mut manager, EntityTag::Tile);
        manager.add_entity(EntityTag::Enemy);
        manager.clear();
        assert_eq!(manager.entity_count(), 0);
        assert_eq!(manager.pending_count(), 0);

        let after = committed(&mut manager, EntityTag::Tile);
        assert!(after.0 > before.0 + 1);
    }

    #[test]
    fn snapshot_lists_live_entities_with_transform() {
        let mut manager = EntityManager::default();
        let tile = manager.add_entity(EntityTag::Tile);
        manager.add_component(tile, Transform::at(Vec2::new(32.0, 736.0)));
        manager.add_component(tile, BoundingBox::new(Vec2::new(64.0, 64.0)));
        manager.add_component(
            tile,
            AnimationBinding::new(
                Animation::new("Ground", SpriteSheet::new("TexGround", 64.0, 64.0)),
                true,
            ),
        );
        let bare = manager.add_entity(EntityTag::Dec);
        manager.update();

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, tile);
        assert_eq!(snapshot[0].texture.as_deref(), Some("TexGround"));
        assert_eq!(snapshot[0].half_size, Some(Vec2::new(32.0, 32.0)));
        assert!(manager.entities().contains(&bare));
    }

    #[test]
    fn tag_parses_fixed_vocabulary_only() {
        assert_eq!("Tile".parse::<EntityTag>(), Ok(EntityTag::Tile));
        assert_eq!("Boom".parse::<EntityTag>(), Ok(EntityTag::Boom));
        assert_eq!(
            "Goomba".parse::<EntityTag>(),
            Err(UnknownTagError("Goomba".to_string()))
        );
        for tag in EntityTag::ALL {
            assert_eq!(tag.as_str().parse::<EntityTag>(), Ok(tag));
        }
    }
}
