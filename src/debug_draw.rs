//! Host-agnostic debug drawing.
//!
//! The crate never renders anything itself. A host implements
//! [`DebugSurface`] over its own renderer and hands it to the `debug_draw`
//! methods on the world, a path or a flow field.

use glam::{Vec2, Vec4};

use crate::flow_field::FlowField;
use crate::pathfinder::PathResult;
use crate::types::ColliderShape;
use crate::world::CollisionWorld;

/// Minimal immediate-mode drawing target. Coordinates are in world units
/// with the camera offset already subtracted.
pub trait DebugSurface {
    fn circle(&mut self, center: Vec2, radius: f32, color: Vec4);
    fn rect(&mut self, min: Vec2, max: Vec2, color: Vec4);
    fn line(&mut self, a: Vec2, b: Vec2, color: Vec4);
}

#[derive(Clone, Debug)]
pub struct DebugColors {
    pub collider: Vec4,
    pub static_collider: Vec4,
    pub trigger: Vec4,
    pub contact: Vec4,
    pub path: Vec4,
    pub waypoint: Vec4,
    pub flow: Vec4,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            collider: Vec4::new(0.0, 1.0, 0.0, 0.6),
            static_collider: Vec4::new(0.6, 0.6, 0.6, 0.6),
            trigger: Vec4::new(0.3, 0.6, 1.0, 0.4),
            contact: Vec4::new(1.0, 0.0, 0.0, 0.9),
            path: Vec4::new(1.0, 1.0, 0.0, 0.9),
            waypoint: Vec4::new(1.0, 0.5, 0.0, 0.9),
            flow: Vec4::new(0.0, 1.0, 1.0, 0.5),
        }
    }
}

/// Camera offset and palette shared by all debug draw calls.
#[derive(Clone, Debug, Default)]
pub struct DebugView {
    pub camera: Vec2,
    pub colors: DebugColors,
}

impl DebugView {
    pub fn new(camera: Vec2) -> Self {
        Self { camera, ..Default::default() }
    }
}

impl CollisionWorld {
    /// Outline every collider and mark contacts from the last
    /// [`CollisionWorld::update`] results passed in `contacts`.
    pub fn debug_draw(
        &self,
        surface: &mut dyn DebugSurface,
        view: &DebugView,
        contacts: &[crate::types::CollisionResult],
    ) {
        let colors = &view.colors;
        for c in self.colliders() {
            let color = if c.is_trigger() {
                colors.trigger
            } else if c.is_static() {
                colors.static_collider
            } else {
                colors.collider
            };
            let pos = c.position() - view.camera;
            match c.shape() {
                ColliderShape::Circle { radius } => surface.circle(pos, *radius, color),
                shape => {
                    if let Some(aabb) = shape.box_at(pos) {
                        surface.rect(aabb.min, aabb.max, color);
                    }
                }
            }
        }
        for r in contacts {
            let p = r.contact - view.camera;
            surface.circle(p, 2.0, colors.contact);
            surface.line(p, p + r.normal * r.overlap.max(4.0), colors.contact);
        }
    }
}

impl PathResult {
    pub fn debug_draw(&self, surface: &mut dyn DebugSurface, view: &DebugView) {
        let points: Vec<Vec2> = self.points.iter().map(|p| *p - view.camera).collect();
        for w in points.windows(2) {
            surface.line(w[0], w[1], view.colors.path);
        }
        for p in points {
            surface.circle(p, 3.0, view.colors.waypoint);
        }
    }
}

impl FlowField {
    /// One short line per reached cell, pointing along its flow vector.
    pub fn debug_draw(&self, surface: &mut dyn DebugSurface, view: &DebugView) {
        let cs = self.cell_size();
        for (cell, dir) in self.iter() {
            let center = Vec2::new((cell.x as f32 + 0.5) * cs, (cell.y as f32 + 0.5) * cs) - view.camera;
            if dir == Vec2::ZERO {
                surface.circle(center, cs * 0.25, view.colors.flow);
            } else {
                surface.line(center, center + dir * cs * 0.4, view.colors.flow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathfinderConfig, WorldConfig};
    use crate::flow_field::GridBounds;
    use crate::node_cache::GridCoord;
    use crate::pathfinder::Pathfinder;
    use crate::types::{ColliderOptions, Layer};

    #[derive(Default)]
    struct Recorder {
        circles: Vec<(Vec2, f32)>,
        rects: Vec<(Vec2, Vec2)>,
        lines: Vec<(Vec2, Vec2)>,
    }

    impl DebugSurface for Recorder {
        fn circle(&mut self, center: Vec2, radius: f32, _color: Vec4) {
            self.circles.push((center, radius));
        }
        fn rect(&mut self, min: Vec2, max: Vec2, _color: Vec4) {
            self.rects.push((min, max));
        }
        fn line(&mut self, a: Vec2, b: Vec2, _color: Vec4) {
            self.lines.push((a, b));
        }
    }

    #[test]
    fn test_world_debug_draw_applies_camera() {
        let mut world = CollisionWorld::new(WorldConfig::default());
        world.add_circle_collider(Vec2::new(100.0, 100.0), 10.0, ColliderOptions::default());
        world.add_box_collider(
            Vec2::new(200.0, 100.0),
            20.0,
            10.0,
            0.0,
            ColliderOptions::default().layer(Layer::BUILDING).fixed(),
        );
        let mut rec = Recorder::default();
        world.debug_draw(&mut rec, &DebugView::new(Vec2::new(50.0, 50.0)), &[]);
        assert_eq!(rec.circles, vec![(Vec2::new(50.0, 50.0), 10.0)]);
        assert_eq!(rec.rects, vec![(Vec2::new(140.0, 45.0), Vec2::new(160.0, 55.0))]);
        assert!(rec.lines.is_empty());
    }

    #[test]
    fn test_path_and_flow_debug_draw() {
        let cfg = PathfinderConfig { cell_size: 1.0, default_unit_radius: 0.0, ..Default::default() };
        let mut pf = Pathfinder::new(cfg);
        let path = pf.find_path(&(), Vec2::new(0.5, 0.5), Vec2::new(3.5, 0.5), None);
        let mut rec = Recorder::default();
        path.debug_draw(&mut rec, &DebugView::default());
        assert_eq!(rec.lines.len(), path.points.len() - 1);
        assert_eq!(rec.circles.len(), path.points.len());

        let bounds = GridBounds::new(GridCoord::new(0, 0), GridCoord::new(2, 2));
        let field = pf.generate_flow_field(&(), Vec2::new(0.5, 0.5), bounds);
        let mut rec = Recorder::default();
        field.debug_draw(&mut rec, &DebugView::default());
        assert_eq!(rec.circles.len(), 1);
        assert_eq!(rec.lines.len(), 8);
    }
}
