use glam::Vec2;

use std::collections::{HashMap, HashSet};

use crate::types::{Aabb, ColliderId};

/// Entries covering more cells than this live in a side list instead of
/// the cell buckets.
const MAX_BUCKETED_CELLS: u64 = 4096;

/// Cell coordinates are clamped to this magnitude.
const CELL_LIMIT: f32 = 1_073_741_824.0;

/// Inclusive rectangle of grid cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellSpan {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl CellSpan {
    pub fn cells(self) -> impl Iterator<Item = (i32, i32)> {
        (self.min.1..=self.max.1).flat_map(move |iy| (self.min.0..=self.max.0).map(move |ix| (ix, iy)))
    }

    pub fn cell_count(self) -> u64 {
        let w = (self.max.0 as i64 - self.min.0 as i64 + 1).max(0) as u64;
        let h = (self.max.1 as i64 - self.min.1 as i64 + 1).max(0) as u64;
        w.saturating_mul(h)
    }

    pub fn contains(self, cell: (i32, i32)) -> bool {
        cell.0 >= self.min.0 && cell.0 <= self.max.0 && cell.1 >= self.min.1 && cell.1 <= self.max.1
    }

    pub fn overlaps(self, other: CellSpan) -> bool {
        self.min.0 <= other.max.0 && other.min.0 <= self.max.0 && self.min.1 <= other.max.1 && other.min.1 <= self.max.1
    }
}

/// Persistent uniform grid: cell coord -> ids whose bounds touch the cell.
///
/// Every id is stored in exactly the cells covered by the bounds it was last
/// inserted or updated with, except entries spanning more than
/// `MAX_BUCKETED_CELLS` cells, which are kept aside and matched by span.
/// Query cost is bounded by the number of occupied cells, never by the area
/// of the query.
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<ColliderId>>,
    spans: HashMap<ColliderId, CellSpan>,
    oversized: Vec<ColliderId>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-5),
            cells: HashMap::new(),
            spans: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing `p`. Non-finite or far-away coordinates are clamped;
    /// NaN maps to cell 0.
    pub fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        let axis = |v: f32| {
            let c = (v / self.cell_size).floor();
            if c.is_nan() { 0 } else { c.clamp(-CELL_LIMIT, CELL_LIMIT) as i32 }
        };
        (axis(p.x), axis(p.y))
    }

    pub fn span_of(&self, bounds: Aabb) -> CellSpan {
        let (a, b) = (self.world_to_cell(bounds.min), self.world_to_cell(bounds.max));
        CellSpan {
            min: (a.0.min(b.0), a.1.min(b.1)),
            max: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// Insert `id` into every cell overlapped by `bounds`. Re-inserting an
    /// existing id moves it.
    pub fn insert(&mut self, id: ColliderId, bounds: Aabb) {
        if self.spans.contains_key(&id) {
            self.update(id, bounds);
            return;
        }
        let span = self.span_of(bounds);
        self.add_to_cells(id, span);
        self.spans.insert(id, span);
    }

    /// Remove `id` from all its cells. Unknown ids are ignored.
    pub fn remove(&mut self, id: ColliderId) -> bool {
        match self.spans.remove(&id) {
            Some(span) => {
                self.remove_from_cells(id, span);
                true
            }
            None => false,
        }
    }

    /// Move `id` to the cells covered by `bounds`. No-op for unknown ids or
    /// when the covered cells did not change.
    pub fn update(&mut self, id: ColliderId, bounds: Aabb) {
        let new_span = self.span_of(bounds);
        let Some(old_span) = self.spans.get(&id).copied() else {
            return;
        };
        if old_span == new_span {
            return;
        }
        self.remove_from_cells(id, old_span);
        self.add_to_cells(id, new_span);
        self.spans.insert(id, new_span);
    }

    /// Deduplicated candidates from all cells overlapping `bounds`. No exact
    /// geometry is tested.
    pub fn query_aabb(&self, bounds: Aabb) -> Vec<ColliderId> {
        let mut out = Vec::new();
        self.query_aabb_into(bounds, &mut out);
        out
    }

    /// Allocation-reusing form of [`SpatialGrid::query_aabb`]. Clears `buf`.
    ///
    /// Small queries come back in cell scan order. Queries covering more
    /// cells than are occupied walk the occupied cells instead and come back
    /// sorted by id.
    pub fn query_aabb_into(&self, bounds: Aabb, buf: &mut Vec<ColliderId>) {
        buf.clear();
        let span = self.span_of(bounds);
        let mut seen = HashSet::new();
        if span.cell_count() <= self.cells.len() as u64 {
            for cell in span.cells() {
                if let Some(list) = self.cells.get(&cell) {
                    buf.extend(list.iter().copied().filter(|id| seen.insert(*id)));
                }
            }
        } else {
            for (_, list) in self.cells.iter().filter(|(cell, _)| span.contains(**cell)) {
                buf.extend(list.iter().copied().filter(|id| seen.insert(*id)));
            }
            buf.sort_unstable();
        }
        for &id in &self.oversized {
            if self.spans.get(&id).is_some_and(|s| s.overlaps(span)) && seen.insert(id) {
                buf.push(id);
            }
        }
    }

    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<ColliderId> {
        self.query_aabb(Aabb::from_center_half(center, Vec2::splat(radius.max(0.0))))
    }

    pub fn contains(&self, id: ColliderId) -> bool {
        self.spans.contains_key(&id)
    }

    pub fn cells_of(&self, id: ColliderId) -> Option<CellSpan> {
        self.spans.get(&id).copied()
    }

    /// Ids stored in one cell. Oversized entries are not listed.
    pub fn bucket(&self, cell: (i32, i32)) -> &[ColliderId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.spans.clear();
        self.oversized.clear();
    }

    fn add_to_cells(&mut self, id: ColliderId, span: CellSpan) {
        if span.cell_count() > MAX_BUCKETED_CELLS {
            self.oversized.push(id);
            return;
        }
        for cell in span.cells() {
            self.cells.entry(cell).or_default().push(id);
        }
    }

    fn remove_from_cells(&mut self, id: ColliderId, span: CellSpan) {
        if span.cell_count() > MAX_BUCKETED_CELLS {
            self.oversized.retain(|&other| other != id);
            return;
        }
        for cell in span.cells() {
            if let Some(list) = self.cells.get_mut(&cell) {
                list.retain(|&other| other != id);
                if list.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }
}
