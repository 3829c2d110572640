mod animation;
mod components;
mod entity_manager;
pub mod physics;
mod vec2;

pub use animation::{Animation, FrameRect, SpriteSheet};
pub use components::{
    AnimationBinding, BoundingBox, Component, Gravity, Input, Lifespan, LocomotionState, Pose,
    Transform,
};
pub use entity_manager::{
    ComponentStore, ComponentStores, EntityId, EntityIdAllocator, EntityManager, EntitySnapshot,
    EntityTag, UnknownTagError,
};
pub use vec2::Vec2;
