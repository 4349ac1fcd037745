use glam::Vec2;
use log::{debug, warn};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::api::{ObstacleMap, TerrainOracle};
use crate::config::PathfinderConfig;
use crate::flow_field::{self, FlowField, GridBounds};
use crate::node_cache::{GridCoord, NodeCache, ObstacleSource};
use crate::terrain::OpenTerrain;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

const CARDINAL_STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Outcome of one search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathResult {
    /// Cell-center waypoints from start to goal (smoothed when enabled).
    pub points: Vec<Vec2>,
    pub found: bool,
    /// Accumulated movement cost of the unsmoothed path.
    pub cost: f32,
    /// Nodes closed by the search. Equal to `max_search_nodes` when the
    /// search gave up.
    pub nodes_explored: usize,
}

impl PathResult {
    fn not_found(nodes_explored: usize) -> Self {
        Self { nodes_explored, ..Default::default() }
    }

    /// Euclidean length of the polyline.
    pub fn length(&self) -> f32 {
        polyline_length(&self.points)
    }
}

pub(crate) fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Composed walkability test: terrain AND dynamic obstacles, resolved
/// through the node cache.
pub(crate) struct Probe<'a, O: ?Sized> {
    pub terrain: &'a dyn TerrainOracle,
    pub obstacles: &'a O,
    pub cell_size: f32,
    pub radius: f32,
}

impl<O: ObstacleMap + ?Sized> Probe<'_, O> {
    pub fn center(&self, c: GridCoord) -> Vec2 {
        Vec2::new((c.x as f32 + 0.5) * self.cell_size, (c.y as f32 + 0.5) * self.cell_size)
    }

    pub fn cell(&self, p: Vec2) -> GridCoord {
        GridCoord::new((p.x / self.cell_size).floor() as i32, (p.y / self.cell_size).floor() as i32)
    }

    pub fn walkable(&self, cache: &mut NodeCache, c: GridCoord) -> bool {
        let pos = self.center(c);
        cache.walkable(c, self.radius, || {
            self.terrain.is_walkable(pos) && !self.obstacles.is_blocked(pos, self.radius)
        })
    }

    /// Movement multiplier for entering `c`; `None` when impassable.
    fn cost_factor(&self, c: GridCoord) -> Option<f32> {
        let cost = self.terrain.movement_cost(self.center(c));
        (cost.is_finite() && cost >= 0.0).then_some(cost)
    }

    /// Walks every cell the segment `a -> b` touches. Passing exactly
    /// through a cell corner needs both side cells open, the same rule A*
    /// applies to diagonal steps.
    fn line_of_sight(&self, cache: &mut NodeCache, a: Vec2, b: Vec2) -> bool {
        let from = a / self.cell_size;
        let to = b / self.cell_size;
        let mut cell = self.cell(a);
        let end = self.cell(b);
        if !self.walkable(cache, cell) {
            return false;
        }

        let d = to - from;
        let step_x = d.x.signum() as i32 * (d.x != 0.0) as i32;
        let step_y = d.y.signum() as i32 * (d.y != 0.0) as i32;
        let delta_x = if step_x != 0 { 1.0 / d.x.abs() } else { f32::INFINITY };
        let delta_y = if step_y != 0 { 1.0 / d.y.abs() } else { f32::INFINITY };
        let mut t_x = match step_x {
            1 => (cell.x as f32 + 1.0 - from.x) * delta_x,
            -1 => (from.x - cell.x as f32) * delta_x,
            _ => f32::INFINITY,
        };
        let mut t_y = match step_y {
            1 => (cell.y as f32 + 1.0 - from.y) * delta_y,
            -1 => (from.y - cell.y as f32) * delta_y,
            _ => f32::INFINITY,
        };

        let max_steps = (end.x - cell.x).unsigned_abs() + (end.y - cell.y).unsigned_abs();
        for _ in 0..max_steps {
            if cell == end {
                break;
            }
            if (t_x - t_y).abs() <= 1e-5 {
                if !self.walkable(cache, cell.offset(step_x, 0)) || !self.walkable(cache, cell.offset(0, step_y)) {
                    return false;
                }
                cell = cell.offset(step_x, step_y);
                t_x += delta_x;
                t_y += delta_y;
            } else if t_x < t_y {
                cell = cell.offset(step_x, 0);
                t_x += delta_x;
            } else {
                cell = cell.offset(0, step_y);
                t_y += delta_y;
            }
            if !self.walkable(cache, cell) {
                return false;
            }
        }
        self.walkable(cache, end)
    }
}

#[derive(Copy, Clone, Debug)]
struct OpenEntry {
    f: f32,
    h: f32,
    g: f32,
    coord: GridCoord,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the lowest f, then the lowest h.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

/// Grid A* over a host terrain plus dynamic obstacles, with goal snapping,
/// string-pulling and flow-field generation.
pub struct Pathfinder {
    pub cfg: PathfinderConfig,
    terrain: Option<Box<dyn TerrainOracle>>,
    cache: NodeCache,
}

impl Pathfinder {
    pub fn new(cfg: PathfinderConfig) -> Self {
        let cache = NodeCache::new(cfg.cache_ttl_secs);
        Self { cfg, terrain: None, cache }
    }

    pub fn with_terrain(mut self, terrain: impl TerrainOracle + 'static) -> Self {
        self.set_terrain(Some(Box::new(terrain)));
        self
    }

    /// Replace (or drop) the terrain oracle. Invalidates the node cache.
    pub fn set_terrain(&mut self, terrain: Option<Box<dyn TerrainOracle>>) {
        self.terrain = terrain;
        self.cache.invalidate();
    }

    /// Advance simulated time for the node cache TTL.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.cache.advance(dt)
    }

    /// Drop every cached node, e.g. after a building is placed.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    pub fn world_to_grid(&self, pos: Vec2) -> GridCoord {
        let cs = self.cfg.cell_size;
        GridCoord::new((pos.x / cs).floor() as i32, (pos.y / cs).floor() as i32)
    }

    /// Center of a grid cell in world units.
    pub fn grid_to_world(&self, c: GridCoord) -> Vec2 {
        let cs = self.cfg.cell_size;
        Vec2::new((c.x as f32 + 0.5) * cs, (c.y as f32 + 0.5) * cs)
    }

    /// Walkability test for `obstacles`. Cached nodes resolved against a
    /// different obstacle map are dropped first.
    fn probe<'a, O: ObstacleMap + ?Sized>(
        cfg: &PathfinderConfig,
        terrain: &'a Option<Box<dyn TerrainOracle>>,
        cache: &mut NodeCache,
        obstacles: &'a O,
        radius: Option<f32>,
    ) -> Probe<'a, O> {
        cache.bind_source(ObstacleSource::of(obstacles));
        Probe {
            terrain: terrain.as_deref().unwrap_or(&OpenTerrain),
            obstacles,
            cell_size: cfg.cell_size,
            radius: radius.unwrap_or(cfg.default_unit_radius),
        }
    }

    /// Walkability of the cell containing `pos` for a unit of `radius`.
    pub fn is_walkable<O: ObstacleMap + ?Sized>(&mut self, obstacles: &O, pos: Vec2, radius: Option<f32>) -> bool {
        let probe = Self::probe(&self.cfg, &self.terrain, &mut self.cache, obstacles, radius);
        probe.walkable(&mut self.cache, probe.cell(pos))
    }

    /// Find a path from `start` to `goal` for a unit of `radius` (default
    /// radius when `None`).
    ///
    /// An unwalkable goal is replaced by the nearest walkable cell within
    /// `goal_search_rings` rings. Waypoints are cell centers.
    pub fn find_path<O: ObstacleMap + ?Sized>(
        &mut self,
        obstacles: &O,
        start: Vec2,
        goal: Vec2,
        radius: Option<f32>,
    ) -> PathResult {
        let probe = Self::probe(&self.cfg, &self.terrain, &mut self.cache, obstacles, radius);
        let cache = &mut self.cache;
        let cfg = &self.cfg;

        let start_cell = probe.cell(start);
        let mut goal_cell = probe.cell(goal);
        if !probe.walkable(cache, goal_cell) {
            match snap_goal(&probe, cache, goal_cell, goal, cfg.goal_search_rings) {
                Some(snapped) => {
                    debug!("goal {:?} unwalkable, snapped to {:?}", goal_cell, snapped);
                    goal_cell = snapped;
                }
                None => {
                    warn!(
                        "no walkable cell within {} rings of goal {:?}",
                        cfg.goal_search_rings, goal_cell
                    );
                    return PathResult::not_found(0);
                }
            }
        }

        let heuristic = |c: GridCoord| -> f32 {
            let dx = (c.x - goal_cell.x).abs() as f32;
            let dy = (c.y - goal_cell.y).abs() as f32;
            if cfg.allow_diagonal {
                dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
            } else {
                dx + dy
            }
        };

        cache.begin_search();
        let mut open = BinaryHeap::new();
        {
            let node = cache.node_mut(start_cell);
            node.g = 0.0;
            node.h = heuristic(start_cell);
            node.f = node.h;
            open.push(OpenEntry { f: node.f, h: node.h, g: 0.0, coord: start_cell });
        }

        let mut explored = 0usize;
        while let Some(entry) = open.pop() {
            let node = cache.node_mut(entry.coord);
            if node.closed || entry.g > node.g {
                continue;
            }
            node.closed = true;
            explored += 1;
            let g = node.g;

            if entry.coord == goal_cell {
                let path = reconstruct(cache, goal_cell)
                    .into_iter()
                    .map(|c| probe.center(c))
                    .collect::<Vec<_>>();
                let raw_len = path.len();
                let points = if cfg.smooth_paths { string_pull(&probe, cache, &path) } else { path };
                debug!(
                    "path {:?} -> {:?}: cost={:.2} explored={} waypoints={} (raw {})",
                    start_cell,
                    goal_cell,
                    g,
                    explored,
                    points.len(),
                    raw_len
                );
                return PathResult { points, found: true, cost: g, nodes_explored: explored };
            }
            if explored >= cfg.max_search_nodes {
                warn!(
                    "search {:?} -> {:?} gave up after {} nodes",
                    start_cell, goal_cell, explored
                );
                return PathResult::not_found(explored);
            }

            let diagonals: &[(i32, i32)] = if cfg.allow_diagonal { &DIAGONAL_STEPS } else { &[] };
            let steps = CARDINAL_STEPS
                .iter()
                .map(|&d| (d, 1.0))
                .chain(diagonals.iter().map(|&d| (d, SQRT_2)));
            for ((dx, dy), base) in steps {
                let next = entry.coord.offset(dx, dy);
                if dx != 0 && dy != 0 {
                    // No corner cutting: both cardinal neighbours must be open.
                    if !probe.walkable(cache, entry.coord.offset(dx, 0))
                        || !probe.walkable(cache, entry.coord.offset(0, dy))
                    {
                        continue;
                    }
                }
                if !probe.walkable(cache, next) {
                    continue;
                }
                let Some(factor) = probe.cost_factor(next) else { continue };
                let tentative = g + base * factor;

                let h = heuristic(next);
                let node = cache.node_mut(next);
                if node.closed || tentative >= node.g {
                    continue;
                }
                node.g = tentative;
                node.h = h;
                node.f = tentative + h;
                node.parent = Some(entry.coord);
                open.push(OpenEntry { f: node.f, h, g: tentative, coord: next });
            }
        }

        debug!("no path {:?} -> {:?} after {} nodes", start_cell, goal_cell, explored);
        PathResult::not_found(explored)
    }

    /// String-pull `points` with the same walkability test `find_path` uses.
    pub fn smooth_path<O: ObstacleMap + ?Sized>(
        &mut self,
        obstacles: &O,
        points: &[Vec2],
        radius: Option<f32>,
    ) -> Vec<Vec2> {
        let probe = Self::probe(&self.cfg, &self.terrain, &mut self.cache, obstacles, radius);
        string_pull(&probe, &mut self.cache, points)
    }

    /// Breadth-first flow field toward `goal` over walkable cells in `bounds`.
    pub fn generate_flow_field<O: ObstacleMap + ?Sized>(
        &mut self,
        obstacles: &O,
        goal: Vec2,
        bounds: GridBounds,
    ) -> FlowField {
        let probe = Self::probe(&self.cfg, &self.terrain, &mut self.cache, obstacles, None);
        let goal_cell = probe.cell(goal);
        let field = flow_field::build(&probe, &mut self.cache, goal_cell, bounds);
        debug!(
            "flow field to {:?}: {} of {} cells reached",
            goal_cell,
            field.len(),
            bounds.cell_count()
        );
        field
    }
}

/// Nearest walkable cell on the first ring (1..=rings) that has one.
fn snap_goal<O: ObstacleMap + ?Sized>(
    probe: &Probe<'_, O>,
    cache: &mut NodeCache,
    goal_cell: GridCoord,
    goal: Vec2,
    rings: u32,
) -> Option<GridCoord> {
    for ring in 1..=rings as i32 {
        let mut best: Option<(f32, GridCoord)> = None;
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                let c = goal_cell.offset(dx, dy);
                if !probe.walkable(cache, c) {
                    continue;
                }
                let d = probe.center(c).distance_squared(goal);
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, c));
                }
            }
        }
        if let Some((_, c)) = best {
            return Some(c);
        }
    }
    None
}

fn reconstruct(cache: &NodeCache, goal: GridCoord) -> Vec<GridCoord> {
    let mut cells = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = cache.node(cursor).and_then(|n| n.parent) {
        cells.push(parent);
        cursor = parent;
    }
    cells.reverse();
    cells
}

/// From each kept waypoint jump to the furthest later waypoint in sight.
fn string_pull<O: ObstacleMap + ?Sized>(probe: &Probe<'_, O>, cache: &mut NodeCache, points: &[Vec2]) -> Vec<Vec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut out = vec![points[0]];
    let mut i = 0;
    while i < last {
        let mut j = last;
        while j > i + 1 && !probe.line_of_sight(cache, points[i], points[j]) {
            j -= 1;
        }
        out.push(points[j]);
        i = j;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::terrain::GridTerrain;
    use crate::types::{ColliderOptions, Layer};
    use crate::world::CollisionWorld;

    fn open_grid_pathfinder(smooth: bool) -> Pathfinder {
        let cfg = PathfinderConfig { cell_size: 32.0, smooth_paths: smooth, ..Default::default() };
        Pathfinder::new(cfg).with_terrain(GridTerrain::open(20, 20, 32.0))
    }

    #[test]
    fn test_open_grid_diagonal_scenario() {
        let mut pf = open_grid_pathfinder(true);
        let r = pf.find_path(&(), Vec2::new(0.0, 0.0), Vec2::new(608.0, 608.0), None);
        assert!(r.found);
        // Straight diagonal: one closed node per step.
        assert!(r.nodes_explored <= 25, "explored {}", r.nodes_explored);
        assert_eq!(r.points.len(), 2);
        assert_eq!(r.points[0], Vec2::new(16.0, 16.0));
        assert_eq!(r.points[1], Vec2::new(624.0, 624.0));
        assert!((r.cost - 19.0 * SQRT_2).abs() < 1e-3);
    }

    #[test]
    fn test_endpoints_within_one_cell() {
        let mut pf = open_grid_pathfinder(false);
        let pairs = [
            (Vec2::new(40.0, 500.0), Vec2::new(300.0, 20.0)),
            (Vec2::new(600.0, 10.0), Vec2::new(5.0, 5.0)),
            (Vec2::new(100.0, 100.0), Vec2::new(110.0, 105.0)),
        ];
        for (start, goal) in pairs {
            let r = pf.find_path(&(), start, goal, None);
            assert!(r.found);
            assert!(!r.points.is_empty());
            assert!(r.points[0].distance(start) <= 32.0 * SQRT_2);
            assert!(r.points.last().unwrap().distance(goal) <= 32.0 * SQRT_2);
        }
    }

    const L_WALL: &str = "
        ........
        ........
        ..####..
        .....#..
        .....#..
        ........
        ";

    /// Every sampled point along every segment lies in an open tile.
    fn assert_segments_clear(terrain: &GridTerrain, points: &[Vec2]) {
        for w in points.windows(2) {
            for k in 0..=400 {
                let p = w[0].lerp(w[1], k as f32 / 400.0);
                assert!(terrain.is_walkable(p), "segment {:?} -> {:?} crosses a wall at {:?}", w[0], w[1], p);
            }
        }
    }

    #[test]
    fn test_no_corner_cutting_around_l_wall() {
        let walls = GridTerrain::from_ascii(L_WALL, 1.0);
        for smooth in [false, true] {
            let cfg = PathfinderConfig {
                cell_size: 1.0,
                smooth_paths: smooth,
                default_unit_radius: 0.0,
                ..Default::default()
            };
            let mut pf = Pathfinder::new(cfg).with_terrain(walls.clone());
            let r = pf.find_path(&(), Vec2::new(3.5, 4.5), Vec2::new(6.5, 0.5), None);
            assert!(r.found);
            for w in r.points.windows(2) {
                let d = w[1] - w[0];
                if !smooth && d.x != 0.0 && d.y != 0.0 {
                    assert!(walls.is_walkable(Vec2::new(w[1].x, w[0].y)), "clipped corner at {:?}", w);
                    assert!(walls.is_walkable(Vec2::new(w[0].x, w[1].y)), "clipped corner at {:?}", w);
                }
            }
            assert_segments_clear(&walls, &r.points);
        }
    }

    #[test]
    fn test_smoothed_paths_stay_off_walls_for_all_pairs() {
        let walls = GridTerrain::from_ascii(L_WALL, 1.0);
        let cfg = PathfinderConfig { cell_size: 1.0, default_unit_radius: 0.0, ..Default::default() };
        let mut pf = Pathfinder::new(cfg).with_terrain(walls.clone());
        let open: Vec<Vec2> = (0..walls.height())
            .flat_map(|y| (0..walls.width()).map(move |x| Vec2::new(x as f32 + 0.5, y as f32 + 0.5)))
            .filter(|p| walls.is_walkable(*p))
            .collect();
        for &start in &open {
            for &goal in &open {
                let r = pf.find_path(&(), start, goal, None);
                assert!(r.found);
                assert_segments_clear(&walls, &r.points);
            }
        }
        // The shortcut from the first to the last point clips wall tile (3, 2).
        let detour = [Vec2::new(0.5, 5.5), Vec2::new(1.5, 1.5), Vec2::new(3.5, 1.5)];
        assert_eq!(pf.smooth_path(&(), &detour, None), detour.to_vec());
    }

    #[test]
    fn test_smoothing_never_lengthens_and_keeps_endpoints() {
        let map = "
            ..........
            ..........
            ...####...
            ......#...
            ......#...
            ..........
            ";
        let cfg = PathfinderConfig { cell_size: 1.0, smooth_paths: false, default_unit_radius: 0.0, ..Default::default() };
        let mut pf = Pathfinder::new(cfg).with_terrain(GridTerrain::from_ascii(map, 1.0));
        let raw = pf.find_path(&(), Vec2::new(0.5, 5.5), Vec2::new(9.5, 0.5), None);
        assert!(raw.found);
        let smooth = pf.smooth_path(&(), &raw.points, None);
        assert!(smooth.len() <= raw.points.len());
        assert!(polyline_length(&smooth) <= raw.length() + 1e-4);
        assert_eq!(smooth.first(), raw.points.first());
        assert_eq!(smooth.last(), raw.points.last());
    }

    #[test]
    fn test_goal_inside_building_snaps_to_ring() {
        let mut world = CollisionWorld::new(WorldConfig::default());
        world.add_box_collider(
            Vec2::new(320.0, 320.0),
            96.0,
            96.0,
            0.0,
            ColliderOptions::default().layer(Layer::BUILDING).fixed(),
        );
        let mut pf = open_grid_pathfinder(true);
        let goal = Vec2::new(320.0, 320.0);
        let r = pf.find_path(&world, Vec2::new(16.0, 16.0), goal, None);
        assert!(r.found);
        let end = *r.points.last().unwrap();
        assert_ne!(end, goal);
        assert!(end.distance(goal) < 3.0 * 32.0);
        assert!(pf.is_walkable(&world, end, None));
    }

    #[test]
    fn test_unsnappable_goal_fails_fast() {
        let cfg = PathfinderConfig { cell_size: 32.0, goal_search_rings: 2, ..Default::default() };
        let mut terrain = GridTerrain::open(20, 20, 32.0);
        terrain.block_rect(5, 5, 15, 15);
        let mut pf = Pathfinder::new(cfg).with_terrain(terrain);
        let r = pf.find_path(&(), Vec2::new(16.0, 16.0), Vec2::new(320.0, 320.0), None);
        assert!(!r.found);
        assert_eq!(r.nodes_explored, 0);
        assert!(r.points.is_empty());
    }

    #[test]
    fn test_budget_exhaustion_reports_cap() {
        let cfg = PathfinderConfig { cell_size: 32.0, max_search_nodes: 10, ..Default::default() };
        let mut pf = Pathfinder::new(cfg).with_terrain(GridTerrain::open(20, 20, 32.0));
        let r = pf.find_path(&(), Vec2::new(16.0, 16.0), Vec2::new(600.0, 16.0), None);
        assert!(!r.found);
        assert_eq!(r.nodes_explored, 10);
    }

    #[test]
    fn test_enclosed_goal_region_is_unreachable() {
        let terrain = GridTerrain::from_ascii(
            "
            ......
            .####.
            .#..#.
            .####.
            ......
            ",
            1.0,
        );
        let cfg = PathfinderConfig { cell_size: 1.0, default_unit_radius: 0.0, ..Default::default() };
        let mut pf = Pathfinder::new(cfg).with_terrain(terrain);
        let r = pf.find_path(&(), Vec2::new(0.5, 0.5), Vec2::new(2.5, 2.5), None);
        assert!(!r.found);
        assert!(r.nodes_explored > 0 && r.nodes_explored < pf.cfg.max_search_nodes);
    }

    #[test]
    fn test_movement_cost_steers_around_mud() {
        let terrain = GridTerrain::from_ascii(
            "
            .....
            .~~~.
            .~~~.
            .~~~.
            .....
            ",
            1.0,
        );
        let cfg = PathfinderConfig {
            cell_size: 1.0,
            allow_diagonal: false,
            smooth_paths: false,
            default_unit_radius: 0.0,
            ..Default::default()
        };
        let mut pf = Pathfinder::new(cfg).with_terrain(terrain);
        let r = pf.find_path(&(), Vec2::new(0.5, 2.5), Vec2::new(4.5, 2.5), None);
        assert!(r.found);
        // Around the mud: 8 steps at cost 1 beats 4 steps through cost 3.
        assert!((r.cost - 8.0).abs() < 1e-4);
        assert!(r.points.iter().all(|p| !(1.0..4.0).contains(&p.x) || p.y < 1.0 || p.y > 4.0));
    }

    #[test]
    fn test_manhattan_without_diagonals() {
        let cfg = PathfinderConfig { cell_size: 1.0, allow_diagonal: false, smooth_paths: false, ..Default::default() };
        let mut pf = Pathfinder::new(cfg);
        let r = pf.find_path(&(), Vec2::new(0.5, 0.5), Vec2::new(3.5, 2.5), Some(0.0));
        assert!(r.found);
        assert_eq!(r.points.len(), 6);
        assert!((r.cost - 5.0).abs() < 1e-5);
        for w in r.points.windows(2) {
            assert!((w[0].distance(w[1]) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cache_reused_and_invalidated() {
        let mut world = CollisionWorld::new(WorldConfig::default());
        let mut pf = open_grid_pathfinder(false);
        let start = Vec2::new(16.0, 16.0);
        let goal = Vec2::new(16.0, 400.0);
        assert!(pf.find_path(&world, start, goal, None).found);
        let (_, misses) = pf.cache().hit_stats();
        let generation = pf.cache().generation();

        // Same query again resolves walkability from the cache.
        let again = pf.find_path(&world, start, goal, None);
        assert!(again.found);
        assert_eq!(pf.cache().hit_stats().1, misses);

        // A wall across the column is invisible until the cache is dropped.
        world.add_box_collider(
            Vec2::new(320.0, 208.0),
            640.0,
            32.0,
            0.0,
            ColliderOptions::default().layer(Layer::BUILDING).fixed(),
        );
        assert!(pf.find_path(&world, start, goal, None).found);
        assert!(!pf.advance(1.0));
        assert!(pf.advance(4.5));
        assert_eq!(pf.cache().generation(), generation + 1);
        let blocked = pf.find_path(&world, start, goal, None);
        assert!(!blocked.found);
    }

    #[test]
    fn test_walkability_follows_the_obstacle_map_passed_in() {
        let mut world = CollisionWorld::new(WorldConfig::default());
        world.add_box_collider(
            Vec2::new(48.0, 48.0),
            32.0,
            32.0,
            0.0,
            ColliderOptions::default().layer(Layer::BUILDING).fixed(),
        );
        let mut pf = Pathfinder::new(PathfinderConfig::default());
        let spot = Vec2::new(48.0, 48.0);
        assert!(pf.is_walkable(&(), spot, None));
        assert!(!pf.is_walkable(&world, spot, None));
        assert!(pf.is_walkable(&(), spot, None));

        // Same map again keeps its cached nodes.
        assert!(!pf.is_walkable(&world, spot, None));
        let generation = pf.cache().generation();
        assert!(!pf.is_walkable(&world, spot, None));
        assert_eq!(pf.cache().generation(), generation);

        let through = pf.find_path(&(), Vec2::new(16.0, 48.0), Vec2::new(80.0, 48.0), None);
        assert_eq!(through.points.len(), 2);
        let around = pf.find_path(&world, Vec2::new(16.0, 48.0), Vec2::new(80.0, 48.0), Some(0.0));
        assert!(around.found);
        assert!(around.points.len() > 2);
    }
}
