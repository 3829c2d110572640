use super::components::{BoundingBox, Transform};
use super::entity_manager::{EntityId, EntityManager};
use super::Vec2;

/// Per-axis penetration depth of the two boxes at their current positions.
///
/// Zero when either entity lacks a bounding box or a transform. Both axes
/// positive means the boxes intersect.
pub fn overlap(manager: &EntityManager, a: EntityId, b: EntityId) -> Vec2 {
    overlap_with(manager, a, b, |transform| transform.position)
}

/// Same as [`overlap`] but measured at the previous tick's positions.
pub fn previous_overlap(manager: &EntityManager, a: EntityId, b: EntityId) -> Vec2 {
    overlap_with(manager, a, b, |transform| transform.previous_position)
}

/// Convenience for the "both axes positive" test every collision check uses.
pub fn intersects(overlap: Vec2) -> bool {
    overlap.x > 0.0 && overlap.y > 0.0
}

fn overlap_with(
    manager: &EntityManager,
    a: EntityId,
    b: EntityId,
    position_of: impl Fn(&Transform) -> Vec2,
) -> Vec2 {
    let (Some(box_a), Some(box_b)) = (
        manager.get::<BoundingBox>(a),
        manager.get::<BoundingBox>(b),
    ) else {
        return Vec2::ZERO;
    };
    let (Some(transform_a), Some(transform_b)) =
        (manager.get::<Transform>(a), manager.get::<Transform>(b))
    else {
        return Vec2::ZERO;
    };

    let delta = (position_of(transform_a) - position_of(transform_b)).abs();
    let depth = box_a.half_size + box_b.half_size - delta;
    Vec2::new(depth.x.max(0.0), depth.y.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::EntityTag;

    fn boxed(manager: &mut EntityManager, x: f32, y: f32, w: f32, h: f32) -> EntityId {
        let id = manager.add_entity(EntityTag::Tile);
        manager.add_component(id, Transform::at(Vec2::new(x, y)));
        manager.add_component(id, BoundingBox::new(Vec2::new(w, h)));
        id
    }

    #[test]
    fn overlap_is_symmetric() {
        let mut manager = EntityManager::default();
        let a = boxed(&mut manager, 0.0, 0.0, 64.0, 64.0);
        let b = boxed(&mut manager, 40.0, -10.0, 32.0, 48.0);
        let c = boxed(&mut manager, 500.0, 0.0, 64.0, 64.0);

        assert_eq!(overlap(&manager, a, b), overlap(&manager, b, a));
        assert_eq!(overlap(&manager, a, c), overlap(&manager, c, a));
        assert_eq!(overlap(&manager, a, b), Vec2::new(8.0, 46.0));
    }

    #[test]
    fn missing_bounding_box_yields_zero() {
        let mut manager = EntityManager::default();
        let a = boxed(&mut manager, 0.0, 0.0, 64.0, 64.0);
        let decoration = manager.add_entity(EntityTag::Dec);
        manager.add_component(decoration, Transform::at(Vec2::ZERO));

        assert_eq!(overlap(&manager, a, decoration), Vec2::ZERO);
        assert_eq!(overlap(&manager, decoration, a), Vec2::ZERO);
        assert_eq!(previous_overlap(&manager, a, decoration), Vec2::ZERO);
    }

    #[test]
    fn positive_on_both_axes_only_when_boxes_intersect() {
        let mut manager = EntityManager::default();
        let a = boxed(&mut manager, 0.0, 0.0, 64.0, 64.0);
        let touching = boxed(&mut manager, 64.0, 0.0, 64.0, 64.0);
        let apart_x = boxed(&mut manager, 100.0, 0.0, 64.0, 64.0);
        let inside = boxed(&mut manager, 10.0, 10.0, 16.0, 16.0);

        assert!(!intersects(overlap(&manager, a, touching)));
        assert_eq!(overlap(&manager, a, touching).x, 0.0);
        assert_eq!(overlap(&manager, a, apart_x), Vec2::new(0.0, 64.0));
        assert!(intersects(overlap(&manager, a, inside)));
    }

    #[test]
    fn previous_overlap_uses_previous_positions() {
        let mut manager = EntityManager::default();
        let a = boxed(&mut manager, 0.0, 0.0, 64.0, 64.0);
        let b = boxed(&mut manager, 200.0, 0.0, 64.0, 64.0);
        if let Some(transform) = manager.get_mut::<Transform>(b) {
            transform.position = Vec2::new(32.0, 0.0);
        }

        assert!(intersects(overlap(&manager, a, b)));
        assert_eq!(previous_overlap(&manager, a, b), Vec2::new(0.0, 64.0));
    }
}
