use glam::Vec2;

use crate::types::*;

/// Primitive overlap tests used by the collision world.
///
/// Every contact's normal points from the first shape to the second.
/// Coincident centers yield `None`: there is no meaningful normal.
pub trait NarrowphaseApi {
    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Contact>;
    /// A center inside the box pushes out through the nearest face; only a
    /// center on the box center yields `None`.
    fn overlap_circle_aabb(c: Vec2, r: f32, aabb: Aabb) -> Option<Contact>;
    fn overlap_aabb_aabb(a: Aabb, b: Aabb) -> Option<Contact>;

    fn overlap_point_aabb(p: Vec2, aabb: Aabb) -> bool;
    fn overlap_point_circle(p: Vec2, c: Vec2, r: f32) -> bool;
    /// Boolean circle-vs-box test, touching counts as overlap.
    fn intersects_circle_aabb(c: Vec2, r: f32, aabb: Aabb) -> bool;
}

/// Host-provided terrain data, consulted by the pathfinder.
pub trait TerrainOracle {
    fn is_walkable(&self, pos: Vec2) -> bool;

    /// Cost multiplier for entering `pos`. Values that are negative, NaN or
    /// infinite mark impassable terrain.
    fn movement_cost(&self, _pos: Vec2) -> f32 {
        1.0
    }
}

/// Dynamic obstacles that block walkability for a unit of a given radius.
pub trait ObstacleMap {
    fn is_blocked(&self, pos: Vec2, radius: f32) -> bool;
}

/// No obstacles at all.
impl ObstacleMap for () {
    fn is_blocked(&self, _pos: Vec2, _radius: f32) -> bool {
        false
    }
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for &T {
    fn is_walkable(&self, pos: Vec2) -> bool {
        (**self).is_walkable(pos)
    }

    fn movement_cost(&self, pos: Vec2) -> f32 {
        (**self).movement_cost(pos)
    }
}
