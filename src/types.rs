use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Registry-unique collider handle. Ids are never reused within a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderId(pub u32);

bitflags! {
    /// Collision layer a collider belongs to. Also used as a query mask.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Layer: u32 {
        const UNIT = 1 << 0;
        const BUILDING = 1 << 1;
        const SHIP = 1 << 2;
        const PROJECTILE = 1 << 3;
        const TERRAIN = 1 << 4;
        const TRIGGER = 1 << 5;
    }
}

/// Number of single-bit layers known to the [`LayerMatrix`].
pub const LAYER_COUNT: usize = 6;

/// Per-layer set of layers it is permitted to collide with.
///
/// Lookups are one-sided: a pair `(a, b)` is tested when `row(a)` contains
/// `b`'s layer. Nothing forces `row(b)` to contain `a`, so a misconfigured
/// matrix can let A hit B while B ignores A. Use [`LayerMatrix::is_symmetric`]
/// to check a configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMatrix {
    rows: [Layer; LAYER_COUNT],
}

impl LayerMatrix {
    /// Matrix where every layer collides with every layer.
    pub fn all() -> Self {
        Self { rows: [Layer::all(); LAYER_COUNT] }
    }

    /// Matrix where nothing collides.
    pub fn none() -> Self {
        Self { rows: [Layer::empty(); LAYER_COUNT] }
    }

    /// Layers that `layer` may collide with. Multi-bit layers get the union
    /// of their rows.
    pub fn row(&self, layer: Layer) -> Layer {
        layer
            .iter()
            .filter_map(|bit| Self::index_of(bit).map(|i| self.rows[i]))
            .fold(Layer::empty(), |acc, r| acc | r)
    }

    /// Overwrite the row of every bit in `layer`.
    pub fn set(&mut self, layer: Layer, collides_with: Layer) {
        for bit in layer.iter() {
            if let Some(i) = Self::index_of(bit) {
                self.rows[i] = collides_with;
            }
        }
    }

    /// Builder form of [`LayerMatrix::set`].
    pub fn with(mut self, layer: Layer, collides_with: Layer) -> Self {
        self.set(layer, collides_with);
        self
    }

    /// One-sided pair rule: `row(a) ∩ b != ∅`.
    pub fn allows(&self, a: Layer, b: Layer) -> bool {
        self.row(a).intersects(b)
    }

    /// True when `allows(a, b) == allows(b, a)` for every pair of layers.
    pub fn is_symmetric(&self) -> bool {
        Layer::all().iter().all(|a| {
            Layer::all()
                .iter()
                .all(|b| self.allows(a, b) == self.allows(b, a))
        })
    }

    fn index_of(bit: Layer) -> Option<usize> {
        let bits = bit.bits();
        if bits.count_ones() != 1 {
            return None;
        }
        let i = bits.trailing_zeros() as usize;
        (i < LAYER_COUNT).then_some(i)
    }
}

impl Default for LayerMatrix {
    fn default() -> Self {
        Self::none()
            .with(Layer::UNIT, Layer::UNIT | Layer::BUILDING | Layer::TERRAIN | Layer::TRIGGER)
            .with(Layer::BUILDING, Layer::UNIT | Layer::SHIP)
            .with(Layer::SHIP, Layer::SHIP | Layer::BUILDING | Layer::TERRAIN | Layer::TRIGGER)
            .with(Layer::PROJECTILE, Layer::UNIT | Layer::BUILDING | Layer::SHIP)
            .with(Layer::TERRAIN, Layer::UNIT | Layer::SHIP)
            .with(Layer::TRIGGER, Layer::UNIT | Layer::SHIP)
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// Centered circle.
    Circle { radius: f32 },
    /// Centered box. `rotation` is carried for presentation only; bounds and
    /// narrowphase treat the box as axis-aligned.
    Box { width: f32, height: f32, rotation: f32 },
    /// Vertices relative to the collider position. No exact narrowphase:
    /// the polygon is handled as its axis-aligned bounding box.
    Polygon { vertices: Vec<Vec2> },
}

impl ColliderShape {
    /// Broad-phase bounds at `position`.
    ///
    /// Boxes use `± diagonal / 2` on both axes so any rotation fits.
    pub fn bounds_at(&self, position: Vec2) -> Aabb {
        match self {
            ColliderShape::Circle { radius } => Aabb::from_center_half(position, Vec2::splat(*radius)),
            ColliderShape::Box { width, height, .. } => {
                let half_diag = Vec2::new(*width, *height).length() * 0.5;
                Aabb::from_center_half(position, Vec2::splat(half_diag))
            }
            ColliderShape::Polygon { .. } => self.box_at(position).unwrap_or(Aabb::point(position)),
        }
    }

    /// Axis-aligned box used by narrowphase for box-like shapes.
    /// `None` for circles.
    pub fn box_at(&self, position: Vec2) -> Option<Aabb> {
        match self {
            ColliderShape::Circle { .. } => None,
            ColliderShape::Box { width, height, .. } => {
                Some(Aabb::from_center_half(position, Vec2::new(*width, *height) * 0.5))
            }
            ColliderShape::Polygon { vertices } => {
                let mut it = vertices.iter();
                let first = *it.next()?;
                let (min, max) = it.fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
                Some(Aabb { min: position + min, max: position + max })
            }
        }
    }
}

/// Axis-aligned bounding box in world units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_half(center: Vec2, half_extents: Vec2) -> Self {
        Self { min: center - half_extents, max: center + half_extents }
    }

    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Registration options shared by every shape.
#[derive(Clone, Debug)]
pub struct ColliderOptions {
    pub layer: Layer,
    /// Reports enter/exit only, never separated.
    pub is_trigger: bool,
    /// Never moves and never absorbs separation.
    pub is_static: bool,
    pub faction: u32,
    /// Free-form tag for debugging and lookups (`"footman"`, `"barracks"`).
    pub entity_type: String,
}

impl Default for ColliderOptions {
    fn default() -> Self {
        Self {
            layer: Layer::UNIT,
            is_trigger: false,
            is_static: false,
            faction: 0,
            entity_type: String::new(),
        }
    }
}

impl ColliderOptions {
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn faction(mut self, faction: u32) -> Self {
        self.faction = faction;
        self
    }

    pub fn entity_type(mut self, tag: impl Into<String>) -> Self {
        self.entity_type = tag.into();
        self
    }
}

/// Full description of a collider to register.
#[derive(Clone, Debug)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    pub position: Vec2,
    pub options: ColliderOptions,
}

/// A registered collider. Position changes go through
/// `CollisionWorld::update_position` so the spatial index stays in sync.
#[derive(Clone, Debug)]
pub struct Collider {
    pub(crate) id: ColliderId,
    pub(crate) shape: ColliderShape,
    pub(crate) position: Vec2,
    pub(crate) options: ColliderOptions,
}

impl Collider {
    pub fn id(&self) -> ColliderId {
        self.id
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn layer(&self) -> Layer {
        self.options.layer
    }

    pub fn is_trigger(&self) -> bool {
        self.options.is_trigger
    }

    pub fn is_static(&self) -> bool {
        self.options.is_static
    }

    pub fn faction(&self) -> u32 {
        self.options.faction
    }

    pub fn entity_type(&self) -> &str {
        &self.options.entity_type
    }

    pub fn bounds(&self) -> Aabb {
        self.shape.bounds_at(self.position)
    }
}

/// Discrete overlap between an ordered pair of colliders.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionResult {
    pub a: ColliderId,
    pub b: ColliderId,
    /// Penetration depth (> 0).
    pub overlap: f32,
    /// Unit vector pointing from A to B.
    pub normal: Vec2,
    /// Representative world-space contact point.
    pub contact: Vec2,
}

/// Narrowphase contact without collider identities.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub overlap: f32,
    /// Unit vector pointing from the first shape to the second.
    pub normal: Vec2,
    pub contact: Vec2,
}

impl Contact {
    /// Same contact seen from the other shape.
    pub fn flipped(self) -> Self {
        Self { normal: -self.normal, ..self }
    }
}

/// Corrected positions produced by `CollisionWorld::resolve_collision`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    pub pos_a: Vec2,
    pub pos_b: Vec2,
}

/// Notifications queued during `CollisionWorld::update`.
///
/// Within a tick all `TriggerExit` events follow every `Collision` and
/// `TriggerEnter` event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CollisionEvent {
    Collision(CollisionResult),
    TriggerEnter { trigger: ColliderId, other: ColliderId },
    TriggerExit { trigger: ColliderId, other: ColliderId },
}

/// Debug/performance statistics for the last `update`.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub entries: usize,
    pub cells: usize,
    /// Broad-phase neighbours visited, duplicates included.
    pub candidate_pairs: usize,
    /// Unique unordered pairs after dedup.
    pub unique_pairs: usize,
    /// Pairs that passed the layer matrix and reached narrowphase.
    pub tested_pairs: usize,
    pub collisions: usize,
}

/// Timing breakdown for the last `update` (when timing is enabled).
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub update_ms: f64,
    pub pairs_ms: f64,
    pub trigger_exit_ms: f64,
    pub events_emitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_matrix_one_sided_lookup() {
        let m = LayerMatrix::none().with(Layer::UNIT, Layer::BUILDING);
        assert!(m.allows(Layer::UNIT, Layer::BUILDING));
        assert!(!m.allows(Layer::BUILDING, Layer::UNIT));
        assert!(!m.is_symmetric());
    }

    #[test]
    fn test_default_matrix_is_symmetric() {
        assert!(LayerMatrix::default().is_symmetric());
        assert!(LayerMatrix::all().is_symmetric());
    }

    #[test]
    fn test_multi_bit_row_is_union() {
        let m = LayerMatrix::none()
            .with(Layer::UNIT, Layer::UNIT)
            .with(Layer::SHIP, Layer::TERRAIN);
        assert_eq!(m.row(Layer::UNIT | Layer::SHIP), Layer::UNIT | Layer::TERRAIN);
    }

    #[test]
    fn test_box_bounds_use_half_diagonal() {
        let shape = ColliderShape::Box { width: 6.0, height: 8.0, rotation: 0.3 };
        let b = shape.bounds_at(Vec2::new(10.0, 10.0));
        assert_eq!(b.min, Vec2::splat(5.0));
        assert_eq!(b.max, Vec2::splat(15.0));
        // Narrowphase box ignores rotation.
        let nb = shape.box_at(Vec2::new(10.0, 10.0)).unwrap();
        assert_eq!(nb.half_extents(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_polygon_degrades_to_bounding_box() {
        let shape = ColliderShape::Polygon {
            vertices: vec![Vec2::new(-2.0, 0.0), Vec2::new(4.0, 1.0), Vec2::new(0.0, -3.0)],
        };
        let b = shape.box_at(Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(b.min, Vec2::new(-1.0, -2.0));
        assert_eq!(b.max, Vec2::new(5.0, 2.0));
        assert_eq!(shape.bounds_at(Vec2::new(1.0, 1.0)), b);

        let empty = ColliderShape::Polygon { vertices: vec![] };
        assert!(empty.box_at(Vec2::ZERO).is_none());
        assert_eq!(empty.bounds_at(Vec2::ONE), Aabb::point(Vec2::ONE));
    }
}
