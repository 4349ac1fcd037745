use glam::Vec2;
use log::{debug, trace};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;

use crate::api::ObstacleMap;
use crate::config::WorldConfig;
use crate::grid::SpatialGrid;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Persistent collider registry with a uniform-grid broadphase.
///
/// Call [`CollisionWorld::update`] once per tick after moving colliders, then
/// drain the queued [`CollisionEvent`]s.
pub struct CollisionWorld {
    pub cfg: WorldConfig,
    next_id: u32,

    colliders: BTreeMap<ColliderId, Collider>,
    grid: SpatialGrid,

    // trigger id -> ids currently overlapping it
    active_triggers: BTreeMap<ColliderId, BTreeSet<ColliderId>>,

    events: Vec<Event>,
    last_stats: WorldStats,
    last_timing: Option<WorldTiming>,
}

type Event = CollisionEvent;

impl CollisionWorld {
    pub fn new(cfg: WorldConfig) -> Self {
        let grid = SpatialGrid::new(cfg.cell_size);
        Self {
            cfg,
            next_id: 0,
            colliders: BTreeMap::new(),
            grid,
            active_triggers: BTreeMap::new(),
            events: Vec::new(),
            last_stats: WorldStats::default(),
            last_timing: None,
        }
    }

    // --- Registry ----------------------------------------------------------

    /// Register a collider and index it. Returns its new id.
    pub fn add_collider(&mut self, desc: ColliderDesc) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let collider = Collider {
            id,
            shape: desc.shape,
            position: desc.position,
            options: desc.options,
        };
        self.grid.insert(id, collider.bounds());
        debug!(
            "collider {:?} added: {:?} layer={:?} static={} trigger={} type={:?}",
            id,
            collider.shape,
            collider.layer(),
            collider.is_static(),
            collider.is_trigger(),
            collider.entity_type()
        );
        self.colliders.insert(id, collider);
        id
    }

    /// Convenience: register a circle collider.
    pub fn add_circle_collider(&mut self, position: Vec2, radius: f32, options: ColliderOptions) -> ColliderId {
        self.add_collider(ColliderDesc {
            shape: ColliderShape::Circle { radius },
            position,
            options,
        })
    }

    /// Convenience: register a box collider (full width/height).
    pub fn add_box_collider(
        &mut self,
        position: Vec2,
        width: f32,
        height: f32,
        rotation: f32,
        options: ColliderOptions,
    ) -> ColliderId {
        self.add_collider(ColliderDesc {
            shape: ColliderShape::Box { width, height, rotation },
            position,
            options,
        })
    }

    /// Deregister a collider and drop all trigger bookkeeping that mentions
    /// it. Unknown ids are ignored.
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        self.grid.remove(id);
        self.active_triggers.remove(&id);
        for others in self.active_triggers.values_mut() {
            others.remove(&id);
        }
        debug!("collider {:?} removed", id);
        Some(collider)
    }

    /// Move a collider and re-index it in the same call. Unknown ids are
    /// ignored.
    pub fn update_position(&mut self, id: ColliderId, position: Vec2) {
        let Some(collider) = self.colliders.get_mut(&id) else {
            return;
        };
        collider.position = position;
        self.grid.update(id, collider.bounds());
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// All colliders in id order.
    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.values()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn set_layer_matrix(&mut self, matrix: LayerMatrix) {
        self.cfg.layer_matrix = matrix;
    }

    /// Ids currently overlapping `trigger`.
    pub fn trigger_contents(&self, trigger: ColliderId) -> impl Iterator<Item = ColliderId> + '_ {
        self.active_triggers.get(&trigger).into_iter().flatten().copied()
    }

    /// Drop every collider, trigger set and queued event.
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.grid.clear();
        self.active_triggers.clear();
        self.events.clear();
    }

    // --- Tick --------------------------------------------------------------

    /// Run broadphase and narrowphase for every non-static collider.
    ///
    /// Returns the non-trigger collisions of this tick; the same results plus
    /// trigger enter/exit notifications are queued for [`Self::drain_events`].
    pub fn update(&mut self) -> Vec<CollisionResult> {
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        let events_before = self.events.len();
        let mut stats = WorldStats::default();
        let mut results = Vec::new();
        let mut seen_pairs: HashSet<(ColliderId, ColliderId)> = HashSet::new();
        let mut candidates = Vec::new();

        let movers: Vec<ColliderId> = self
            .colliders
            .values()
            .filter(|c| !c.is_static())
            .map(|c| c.id)
            .collect();

        for id in movers {
            let Some(a) = self.colliders.get(&id) else { continue };
            self.grid.query_aabb_into(a.bounds(), &mut candidates);

            for &other in &candidates {
                if other == id {
                    continue;
                }
                stats.candidate_pairs += 1;
                let key = if id < other { (id, other) } else { (other, id) };
                if !seen_pairs.insert(key) {
                    continue;
                }
                let Some(b) = self.colliders.get(&other) else { continue };
                // One-sided: only the iterating collider's row is consulted.
                if !self.cfg.layer_matrix.allows(a.layer(), b.layer()) {
                    continue;
                }
                stats.tested_pairs += 1;

                let Some(contact) = Narrowphase::collide(&a.shape, a.position, &b.shape, b.position) else {
                    continue;
                };

                if a.is_trigger() || b.is_trigger() {
                    let (trigger, visitor) = if a.is_trigger() { (a.id, b.id) } else { (b.id, a.id) };
                    if self.active_triggers.entry(trigger).or_default().insert(visitor) {
                        self.events.push(Event::TriggerEnter { trigger, other: visitor });
                    }
                } else {
                    let result = CollisionResult {
                        a: a.id,
                        b: b.id,
                        overlap: contact.overlap,
                        normal: contact.normal,
                        contact: contact.contact,
                    };
                    self.events.push(Event::Collision(result));
                    results.push(result);
                }
            }
        }
        stats.unique_pairs = seen_pairs.len();
        let pairs_ms = t_all.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_exit = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.detect_trigger_exits();
        let exit_ms = t_exit.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        stats.entries = self.colliders.len();
        stats.cells = self.grid.cell_count();
        stats.collisions = results.len();
        trace!(
            "collision update: entries={} cells={} candidates={} unique={} tested={} collisions={}",
            stats.entries,
            stats.cells,
            stats.candidate_pairs,
            stats.unique_pairs,
            stats.tested_pairs,
            stats.collisions
        );
        self.last_stats = stats;
        self.last_timing = t_all.map(|t| WorldTiming {
            update_ms: t.elapsed().as_secs_f64() * 1000.0,
            pairs_ms,
            trigger_exit_ms: exit_ms,
            events_emitted: self.events.len() - events_before,
        });
        results
    }

    /// Re-test every active trigger pair; queue exits for the ones that no
    /// longer overlap.
    fn detect_trigger_exits(&mut self) {
        let mut exits = Vec::new();
        for (&trigger, others) in &self.active_triggers {
            let t = self.colliders.get(&trigger);
            for &other in others {
                let still_inside = match (t, self.colliders.get(&other)) {
                    (Some(t), Some(o)) => Narrowphase::collide(&t.shape, t.position, &o.shape, o.position).is_some(),
                    _ => false,
                };
                if !still_inside {
                    exits.push((trigger, other));
                }
            }
        }
        for (trigger, other) in exits {
            if let Some(set) = self.active_triggers.get_mut(&trigger) {
                set.remove(&other);
            }
            self.events.push(Event::TriggerExit { trigger, other });
        }
    }

    /// Drain and return the queued events.
    pub fn drain_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Resolution --------------------------------------------------------

    /// Positions that separate the pair by `overlap + resolution_buffer`
    /// along the normal. A static side does not move; two dynamic sides split
    /// the correction evenly. Trigger and static-static pairs come back
    /// unchanged. `None` if either id is unknown.
    pub fn resolve_collision(&self, result: &CollisionResult) -> Option<Resolution> {
        let a = self.colliders.get(&result.a)?;
        let b = self.colliders.get(&result.b)?;
        let unchanged = Resolution { pos_a: a.position, pos_b: b.position };
        if a.is_trigger() || b.is_trigger() {
            return Some(unchanged);
        }
        let correction = result.normal * (result.overlap + self.cfg.resolution_buffer);
        let resolution = match (a.is_static(), b.is_static()) {
            (true, true) => unchanged,
            (true, false) => Resolution { pos_b: b.position + correction, ..unchanged },
            (false, true) => Resolution { pos_a: a.position - correction, ..unchanged },
            (false, false) => Resolution {
                pos_a: a.position - correction * 0.5,
                pos_b: b.position + correction * 0.5,
            },
        };
        Some(resolution)
    }

    /// Resolve and write both positions back.
    pub fn apply_resolution(&mut self, result: &CollisionResult) -> Option<Resolution> {
        let resolution = self.resolve_collision(result)?;
        self.update_position(result.a, resolution.pos_a);
        self.update_position(result.b, resolution.pos_b);
        Some(resolution)
    }

    // --- Queries -----------------------------------------------------------

    /// Colliders on `layer_mask` whose shape touches the circle.
    pub fn query_radius(&self, center: Vec2, radius: f32, layer_mask: Layer) -> Vec<&Collider> {
        self.grid
            .query_radius(center, radius)
            .into_iter()
            .filter_map(|id| self.colliders.get(&id))
            .filter(|c| c.layer().intersects(layer_mask))
            .filter(|c| Narrowphase::shape_touches_circle(&c.shape, c.position, center, radius))
            .collect()
    }

    /// Colliders on `layer_mask` whose shape contains `p`.
    pub fn query_point(&self, p: Vec2, layer_mask: Layer) -> Vec<&Collider> {
        self.query_radius(p, 0.0, layer_mask)
    }

    /// Exact pair test between two registered colliders.
    pub fn overlap_pair(&self, a: ColliderId, b: ColliderId) -> Option<CollisionResult> {
        let ca = self.colliders.get(&a)?;
        let cb = self.colliders.get(&b)?;
        let contact = Narrowphase::collide(&ca.shape, ca.position, &cb.shape, cb.position)?;
        Some(CollisionResult {
            a,
            b,
            overlap: contact.overlap,
            normal: contact.normal,
            contact: contact.contact,
        })
    }

    /// Return debug/perf stats for the last update.
    pub fn debug_stats(&self) -> WorldStats {
        self.last_stats
    }

    /// Return timing breakdown for the last update.
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }
}

/// Static, non-trigger colliders block walkability.
impl ObstacleMap for CollisionWorld {
    fn is_blocked(&self, pos: Vec2, radius: f32) -> bool {
        self.grid
            .query_radius(pos, radius)
            .into_iter()
            .filter_map(|id| self.colliders.get(&id))
            .any(|c| {
                c.is_static()
                    && !c.is_trigger()
                    && Narrowphase::shape_touches_circle(&c.shape, c.position, pos, radius)
            })
    }
}
