use glam::Vec2;

use std::collections::{HashMap, VecDeque};

use crate::node_cache::{GridCoord, NodeCache};
use crate::pathfinder::Probe;

const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Inclusive rectangle of navigation cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl GridBounds {
    pub fn new(a: GridCoord, b: GridCoord) -> Self {
        Self {
            min: GridCoord::new(a.x.min(b.x), a.y.min(b.y)),
            max: GridCoord::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Cells covering the world rectangle `[min, max]`.
    pub fn from_world(min: Vec2, max: Vec2, cell_size: f32) -> Self {
        let to_cell = |p: Vec2| GridCoord::new((p.x / cell_size).floor() as i32, (p.y / cell_size).floor() as i32);
        Self::new(to_cell(min), to_cell(max))
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    pub fn cell_count(&self) -> usize {
        ((self.max.x - self.min.x + 1) as usize) * ((self.max.y - self.min.y + 1) as usize)
    }
}

/// Per-cell unit directions toward one goal, shared by every unit heading
/// there. The goal cell holds `Vec2::ZERO`.
#[derive(Clone, Debug)]
pub struct FlowField {
    cell_size: f32,
    goal: GridCoord,
    bounds: GridBounds,
    vectors: HashMap<GridCoord, Vec2>,
}

impl FlowField {
    pub fn goal(&self) -> GridCoord {
        self.goal
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Direction stored for a cell; `None` for cells the goal cannot reach.
    pub fn get(&self, cell: GridCoord) -> Option<Vec2> {
        self.vectors.get(&cell).copied()
    }

    /// Direction for the cell containing `pos`.
    pub fn direction_at(&self, pos: Vec2) -> Option<Vec2> {
        let cell = GridCoord::new((pos.x / self.cell_size).floor() as i32, (pos.y / self.cell_size).floor() as i32);
        self.get(cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, Vec2)> + '_ {
        self.vectors.iter().map(|(c, v)| (*c, *v))
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Breadth-first expansion from `goal` over 4-connected walkable cells in
/// `bounds`. Each reached cell points at the neighbour it was reached from.
pub(crate) fn build<O: crate::api::ObstacleMap + ?Sized>(
    probe: &Probe<'_, O>,
    cache: &mut NodeCache,
    goal: GridCoord,
    bounds: GridBounds,
) -> FlowField {
    let mut vectors = HashMap::new();
    if bounds.contains(goal) {
        vectors.insert(goal, Vec2::ZERO);
        let mut queue = VecDeque::from([goal]);
        while let Some(cell) = queue.pop_front() {
            for (dx, dy) in CARDINALS {
                let next = cell.offset(dx, dy);
                if !bounds.contains(next) || vectors.contains_key(&next) {
                    continue;
                }
                if !probe.walkable(cache, next) {
                    continue;
                }
                vectors.insert(next, Vec2::new(-dx as f32, -dy as f32).normalize());
                queue.push_back(next);
            }
        }
    }
    FlowField {
        cell_size: probe.cell_size,
        goal,
        bounds,
        vectors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathfinderConfig;
    use crate::pathfinder::Pathfinder;
    use crate::terrain::GridTerrain;

    fn pathfinder(map: &str) -> Pathfinder {
        let cfg = PathfinderConfig { cell_size: 1.0, default_unit_radius: 0.0, ..Default::default() };
        Pathfinder::new(cfg).with_terrain(GridTerrain::from_ascii(map, 1.0))
    }

    #[test]
    fn test_flow_field_points_to_goal() {
        let mut pf = pathfinder(
            "
            .....
            .###.
            .....
            ",
        );
        let bounds = GridBounds::new(GridCoord::new(0, 0), GridCoord::new(4, 2));
        let field = pf.generate_flow_field(&(), Vec2::new(0.5, 0.5), bounds);

        assert_eq!(field.get(GridCoord::new(0, 0)), Some(Vec2::ZERO));
        assert_eq!(field.get(GridCoord::new(1, 0)), Some(Vec2::NEG_X));
        assert_eq!(field.get(GridCoord::new(0, 1)), Some(Vec2::NEG_Y));
        assert!(field.get(GridCoord::new(2, 1)).is_none());
        // 15 cells minus 3 walls.
        assert_eq!(field.len(), 12);
        for (cell, v) in field.iter() {
            if cell == field.goal() {
                continue;
            }
            assert!((v.length() - 1.0).abs() < 1e-6);
            // Following the vector lands on another reached cell.
            let next = cell.offset(v.x.round() as i32, v.y.round() as i32);
            assert!(field.get(next).is_some());
        }
        assert_eq!(field.direction_at(Vec2::new(4.5, 2.5)).map(|v| v.length()), Some(1.0));
    }

    #[test]
    fn test_flow_field_skips_enclosed_cells_and_respects_bounds() {
        let mut pf = pathfinder(
            "
            ......
            .###..
            .#.#..
            .###..
            ......
            ",
        );
        let bounds = GridBounds::new(GridCoord::new(0, 0), GridCoord::new(3, 4));
        let field = pf.generate_flow_field(&(), Vec2::new(0.5, 0.5), bounds);
        assert!(field.get(GridCoord::new(2, 2)).is_none());
        assert!(field.get(GridCoord::new(5, 0)).is_none());
        assert!(field.get(GridCoord::new(3, 4)).is_some());
        assert!(field.iter().all(|(c, _)| bounds.contains(c)));
    }

    #[test]
    fn test_goal_outside_bounds_gives_empty_field() {
        let mut pf = pathfinder("...\n...\n");
        let bounds = GridBounds::new(GridCoord::new(0, 0), GridCoord::new(1, 1));
        let field = pf.generate_flow_field(&(), Vec2::new(2.5, 0.5), bounds);
        assert!(field.is_empty());
    }

    #[test]
    fn test_bounds_from_world() {
        let b = GridBounds::from_world(Vec2::new(64.0, -1.0), Vec2::new(0.0, 63.0), 32.0);
        assert_eq!(b.min, GridCoord::new(0, -1));
        assert_eq!(b.max, GridCoord::new(2, 1));
        assert_eq!(b.cell_count(), 9);
    }
}
