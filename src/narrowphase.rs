use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Narrowphase primitive tests (discrete, axis-aligned).
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Contact> {
        let delta = c1 - c0;
        let dist2 = delta.length_squared();
        let rsum = r0 + r1;
        if dist2 >= rsum * rsum {
            return None;
        }
        if dist2 == 0.0 {
            // Coincident centers; no usable normal.
            return None;
        }
        let dist = dist2.sqrt();
        let normal = delta / dist; // from A to B
        Some(Contact {
            overlap: rsum - dist,
            normal,
            contact: c0 + normal * r0,
        })
    }

    /// Circle vs axis-aligned box, normal from circle to box.
    ///
    /// Unlike a plain clamp-to-box test, a circle whose center lies inside
    /// the box still collides: it is pushed out through the nearest face with
    /// `overlap = radius + face distance`. Only a center exactly on the box
    /// center gives `None`.
    fn overlap_circle_aabb(c: Vec2, r: f32, aabb: Aabb) -> Option<Contact> {
        if aabb.contains(c) {
            if c == aabb.center() {
                return None;
            }
            // Center inside the box: push out through the nearest face.
            let faces = [
                (c.x - aabb.min.x, Vec2::X, Vec2::new(aabb.min.x, c.y)),
                (aabb.max.x - c.x, Vec2::NEG_X, Vec2::new(aabb.max.x, c.y)),
                (c.y - aabb.min.y, Vec2::Y, Vec2::new(c.x, aabb.min.y)),
                (aabb.max.y - c.y, Vec2::NEG_Y, Vec2::new(c.x, aabb.max.y)),
            ];
            let (depth, normal, contact) = faces
                .into_iter()
                .min_by(|l, r| l.0.total_cmp(&r.0))?;
            return Some(Contact { overlap: r + depth, normal, contact });
        }

        let closest = aabb.closest_point(c);
        let delta = closest - c;
        let dist2 = delta.length_squared();
        if dist2 >= r * r {
            return None;
        }
        let dist = dist2.sqrt();
        Some(Contact {
            overlap: r - dist,
            normal: delta / dist,
            contact: closest,
        })
    }

    fn overlap_aabb_aabb(a: Aabb, b: Aabb) -> Option<Contact> {
        let ha = a.half_extents();
        let hb = b.half_extents();
        let d = b.center() - a.center();
        let ox = (ha.x + hb.x) - d.x.abs();
        let oy = (ha.y + hb.y) - d.y.abs();
        if ox <= 0.0 || oy <= 0.0 {
            return None;
        }
        if d == Vec2::ZERO {
            return None;
        }

        // Axis of minimum penetration; never pick an axis the centers share.
        let use_x = if d.x == 0.0 {
            false
        } else if d.y == 0.0 {
            true
        } else {
            ox <= oy
        };
        let (overlap, normal) = if use_x {
            (ox, Vec2::new(d.x.signum(), 0.0))
        } else {
            (oy, Vec2::new(0.0, d.y.signum()))
        };

        // Center of the intersection rectangle.
        let lo = a.min.max(b.min);
        let hi = a.max.min(b.max);
        Some(Contact {
            overlap,
            normal,
            contact: (lo + hi) * 0.5,
        })
    }

    fn overlap_point_aabb(p: Vec2, aabb: Aabb) -> bool {
        aabb.contains(p)
    }

    fn overlap_point_circle(p: Vec2, c: Vec2, r: f32) -> bool {
        (p - c).length_squared() <= r * r
    }

    fn intersects_circle_aabb(c: Vec2, r: f32, aabb: Aabb) -> bool {
        (aabb.closest_point(c) - c).length_squared() <= r * r
    }
}

impl Narrowphase {
    /// Dispatch on a pair of shapes. Polygons are tested as their bounding box.
    pub fn collide(
        shape_a: &ColliderShape,
        pos_a: Vec2,
        shape_b: &ColliderShape,
        pos_b: Vec2,
    ) -> Option<Contact> {
        match (shape_a, shape_b) {
            (ColliderShape::Circle { radius: r0 }, ColliderShape::Circle { radius: r1 }) => {
                Self::overlap_circle_circle(pos_a, *r0, pos_b, *r1)
            }
            (ColliderShape::Circle { radius }, _) => {
                let aabb = shape_b.box_at(pos_b)?;
                Self::overlap_circle_aabb(pos_a, *radius, aabb)
            }
            (_, ColliderShape::Circle { radius }) => {
                let aabb = shape_a.box_at(pos_a)?;
                Self::overlap_circle_aabb(pos_b, *radius, aabb).map(Contact::flipped)
            }
            _ => {
                let a = shape_a.box_at(pos_a)?;
                let b = shape_b.box_at(pos_b)?;
                Self::overlap_aabb_aabb(a, b)
            }
        }
    }

    /// Exact test of a shape against a query circle (radius may be zero).
    pub fn shape_touches_circle(shape: &ColliderShape, pos: Vec2, center: Vec2, radius: f32) -> bool {
        match shape {
            ColliderShape::Circle { radius: r } => Self::overlap_point_circle(center, pos, r + radius),
            _ => shape
                .box_at(pos)
                .is_some_and(|aabb| Self::intersects_circle_aabb(center, radius, aabb)),
        }
    }
}
