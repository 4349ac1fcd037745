use glam::Vec2;

use crate::api::TerrainOracle;

/// Terrain with no constraints: everything walkable at cost 1.
#[derive(Copy, Clone, Debug, Default)]
pub struct OpenTerrain;

impl TerrainOracle for OpenTerrain {
    fn is_walkable(&self, _pos: Vec2) -> bool {
        true
    }
}

/// Dense row-major table of per-tile walkability and movement cost.
///
/// Tile `(0, 0)` covers `[0, tile_size)` on both axes. Positions outside
/// the table are not walkable.
#[derive(Clone, Debug)]
pub struct GridTerrain {
    width: u32,
    height: u32,
    tile_size: f32,
    walkable: Vec<bool>,
    cost: Vec<f32>,
}

impl GridTerrain {
    /// All tiles walkable at cost 1.
    pub fn open(width: u32, height: u32, tile_size: f32) -> Self {
        let n = (width * height) as usize;
        Self {
            width,
            height,
            tile_size: tile_size.max(1e-5),
            walkable: vec![true; n],
            cost: vec![1.0; n],
        }
    }

    /// Parse an ASCII map: `#` is blocked, `~` costs 3, anything else is open.
    /// Rows are separated by newlines; short rows are padded as blocked.
    pub fn from_ascii(map: &str, tile_size: f32) -> Self {
        let rows: Vec<&str> = map.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut terrain = Self::open(width, height, tile_size);
        for (y, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.chars().collect();
            for x in 0..width as usize {
                match chars.get(x) {
                    Some('#') | None => terrain.set_walkable(x as u32, y as u32, false),
                    Some('~') => terrain.set_cost(x as u32, y as u32, 3.0),
                    Some(_) => {}
                }
            }
        }
        terrain
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn set_walkable(&mut self, x: u32, y: u32, walkable: bool) {
        if let Some(i) = self.index(x, y) {
            self.walkable[i] = walkable;
        }
    }

    pub fn set_cost(&mut self, x: u32, y: u32, cost: f32) {
        if let Some(i) = self.index(x, y) {
            self.cost[i] = cost;
        }
    }

    /// Block every tile in the inclusive rectangle.
    pub fn block_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.set_walkable(x, y, false);
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    fn tile_at(&self, pos: Vec2) -> Option<usize> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / self.tile_size).floor() as u32;
        let y = (pos.y / self.tile_size).floor() as u32;
        self.index(x, y)
    }
}

impl TerrainOracle for GridTerrain {
    fn is_walkable(&self, pos: Vec2) -> bool {
        self.tile_at(pos).is_some_and(|i| self.walkable[i])
    }

    fn movement_cost(&self, pos: Vec2) -> f32 {
        self.tile_at(pos).map_or(f32::INFINITY, |i| self.cost[i])
    }
}
