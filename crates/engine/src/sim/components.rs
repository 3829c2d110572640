use super::entity_manager::{ComponentStore, ComponentStores};
use super::{Animation, Vec2};

/// Maps a component type to its per-type store inside the entity manager.
pub trait Component: Sized + 'static {
    fn store(stores: &ComponentStores) -> &ComponentStore<Self>;
    fn store_mut(stores: &mut ComponentStores) -> &mut ComponentStore<Self>;
}

/// `scale.x` doubles as the horizontal facing sign (+1 right, -1 left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub velocity: Vec2,
    pub scale: Vec2,
    pub angle: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            scale: Vec2::ONE,
            angle: 0.0,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

/// Axis-aligned box centred on `Transform::position`. Presence makes an entity collidable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub size: Vec2,
    pub half_size: Vec2,
}

impl BoundingBox {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            half_size: size / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationBinding {
    pub animation: Animation,
    /// When false the entity is destroyed once the animation has ended.
    pub repeat: bool,
}

impl AnimationBinding {
    pub fn new(animation: Animation, repeat: bool) -> Self {
        Self { animation, repeat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub shoot: bool,
    /// Cleared when a shot is fired, set again when the shoot action is released.
    pub can_shoot: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            left: false,
            right: false,
            jump: false,
            shoot: false,
            can_shoot: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub gravity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifespan {
    pub remaining: i32,
    pub created_at_tick: u64,
}

impl Lifespan {
    pub fn new(remaining: i32, created_at_tick: u64) -> Self {
        Self {
            remaining,
            created_at_tick,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocomotionState {
    pub air: bool,
    pub stand: bool,
    pub run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Air,
    Run,
    Stand,
}

impl Pose {
    pub fn animation_name(self) -> &'static str {
        match self {
            Self::Air => "Air",
            Self::Run => "Run",
            Self::Stand => "Stand",
        }
    }
}

impl LocomotionState {
    /// Priority is air, then run, then stand. Flags further down the list are
    /// ignored when an earlier one is set.
    pub fn pose(&self) -> Option<Pose> {
        match (self.air, self.run, self.stand) {
            (true, _, _) => Some(Pose::Air),
            (false, true, _) => Some(Pose::Run),
            (false, false, true) => Some(Pose::Stand),
            (false, false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_at_starts_at_rest_facing_right() {
        let transform = Transform::at(Vec2::new(10.0, 20.0));
        assert_eq!(transform.previous_position, transform.position);
        assert_eq!(transform.velocity, Vec2::ZERO);
        assert_eq!(transform.scale, Vec2::ONE);
    }

    #[test]
    fn bounding_box_half_size_is_half_of_size() {
        let bounds = BoundingBox::new(Vec2::new(48.0, 64.0));
        assert_eq!(bounds.half_size, Vec2::new(24.0, 32.0));
    }

    #[test]
    fn input_defaults_allow_shooting() {
        let input = Input::default();
        assert!(input.can_shoot);
        assert!(!input.shoot);
    }

    #[test]
    fn pose_priority_is_air_then_run_then_stand() {
        let all = LocomotionState {
            air: true,
            stand: true,
            run: true,
        };
        assert_eq!(all.pose(), Some(Pose::Air));

        let run_and_stand = LocomotionState {
            air: false,
            stand: true,
            run: true,
        };
        assert_eq!(run_and_stand.pose(), Some(Pose::Run));

        let stand = LocomotionState {
            stand: true,
            ..LocomotionState::default()
        };
        assert_eq!(stand.pose(), Some(Pose::Stand));
        assert_eq!(LocomotionState::default().pose(), None);
    }
}
