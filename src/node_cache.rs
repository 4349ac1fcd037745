use log::debug;

use std::collections::HashMap;

/// Integer navigation-grid coordinate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Identity of the obstacle map cached walkability was resolved against:
/// its address plus its type name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObstacleSource {
    addr: usize,
    type_name: &'static str,
}

impl ObstacleSource {
    pub fn of<O: ?Sized>(obstacles: &O) -> Self {
        Self {
            addr: obstacles as *const O as *const () as usize,
            type_name: std::any::type_name::<O>(),
        }
    }
}

/// One A* node. Search fields are only meaningful for the search stamp that
/// last touched the node; walkability survives across searches.
#[derive(Clone, Debug)]
pub struct PathNode {
    pub coord: GridCoord,
    pub g: f32,
    pub h: f32,
    pub f: f32,
    pub parent: Option<GridCoord>,
    pub closed: bool,
    search: u64,
    /// (radius bits, walkable) of the last resolved probe.
    walkable: Option<(u32, bool)>,
}

impl PathNode {
    fn new(coord: GridCoord, search: u64) -> Self {
        Self {
            coord,
            g: f32::INFINITY,
            h: 0.0,
            f: f32::INFINITY,
            parent: None,
            closed: false,
            search,
            walkable: None,
        }
    }

    fn reset_search(&mut self, search: u64) {
        self.g = f32::INFINITY;
        self.h = 0.0;
        self.f = f32::INFINITY;
        self.parent = None;
        self.closed = false;
        self.search = search;
    }
}

/// Lazily created nodes keyed by grid coordinate, shared by every search of
/// one pathfinder.
///
/// Walkability is resolved once per node (per unit radius) and reused until
/// the cache is invalidated, either explicitly or after `ttl` simulated
/// seconds.
#[derive(Debug)]
pub struct NodeCache {
    nodes: HashMap<GridCoord, PathNode>,
    search: u64,
    generation: u64,
    age: f32,
    ttl: f32,
    hits: u64,
    misses: u64,
    source: Option<ObstacleSource>,
}

impl NodeCache {
    pub fn new(ttl_secs: f32) -> Self {
        Self {
            nodes: HashMap::new(),
            search: 0,
            generation: 0,
            age: 0.0,
            ttl: ttl_secs,
            hits: 0,
            misses: 0,
            source: None,
        }
    }

    /// Start a new search; every node's g/h/f/parent is considered reset.
    pub fn begin_search(&mut self) -> u64 {
        self.search += 1;
        self.search
    }

    /// Node for `coord` with search fields valid for the current search.
    pub fn node_mut(&mut self, coord: GridCoord) -> &mut PathNode {
        let search = self.search;
        let node = self.nodes.entry(coord).or_insert_with(|| PathNode::new(coord, search));
        if node.search != search {
            node.reset_search(search);
        }
        node
    }

    /// Node touched by the current search, if any.
    pub fn node(&self, coord: GridCoord) -> Option<&PathNode> {
        self.nodes.get(&coord).filter(|n| n.search == self.search)
    }

    /// Cached walkability for `coord` at `radius`, resolving it with `probe`
    /// on a miss.
    pub fn walkable(&mut self, coord: GridCoord, radius: f32, probe: impl FnOnce() -> bool) -> bool {
        let key = radius.to_bits();
        let search = self.search;
        let node = self.nodes.entry(coord).or_insert_with(|| PathNode::new(coord, search));
        match node.walkable {
            Some((r, w)) if r == key => {
                self.hits += 1;
                w
            }
            _ => {
                self.misses += 1;
                let w = probe();
                node.walkable = Some((key, w));
                w
            }
        }
    }

    /// Record the obstacle map the next lookups run against. Switching to a
    /// different map drops every cached node. Returns true when it did.
    pub fn bind_source(&mut self, source: ObstacleSource) -> bool {
        match self.source.replace(source) {
            Some(prev) if prev != source => {
                debug!("obstacle source changed from {} to {}", prev.type_name, source.type_name);
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Advance simulated time; drops every node once `ttl` has elapsed.
    /// Returns true when the cache was invalidated.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.age += dt.max(0.0);
        if self.age >= self.ttl {
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Forget every node (terrain or static obstacles changed).
    pub fn invalidate(&mut self) {
        debug!(
            "node cache invalidated: generation={} nodes={} hits={} misses={}",
            self.generation,
            self.nodes.len(),
            self.hits,
            self.misses
        );
        self.nodes.clear();
        self.generation += 1;
        self.age = 0.0;
    }

    /// Bumped on every invalidation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// (hits, misses) of walkability lookups since creation.
    pub fn hit_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_walkability_resolved_once_per_radius() {
        let mut cache = NodeCache::new(5.0);
        let calls = Cell::new(0);
        let probe = || {
            calls.set(calls.get() + 1);
            true
        };
        let c = GridCoord::new(3, 4);
        assert!(cache.walkable(c, 16.0, probe));
        assert!(cache.walkable(c, 16.0, probe));
        assert_eq!(calls.get(), 1);
        // Different radius re-probes.
        assert!(cache.walkable(c, 8.0, probe));
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.hit_stats(), (1, 2));
    }

    #[test]
    fn test_search_fields_reset_between_searches() {
        let mut cache = NodeCache::new(5.0);
        cache.begin_search();
        let c = GridCoord::new(0, 0);
        {
            let n = cache.node_mut(c);
            n.g = 3.0;
            n.parent = Some(GridCoord::new(1, 0));
            n.closed = true;
        }
        cache.walkable(c, 1.0, || false);
        cache.begin_search();
        assert!(cache.node(c).is_none());
        let n = cache.node_mut(c);
        assert!(n.g.is_infinite());
        assert!(n.parent.is_none());
        assert!(!n.closed);
        // Walkability survived.
        assert!(!cache.walkable(c, 1.0, || true));
    }

    #[test]
    fn test_ttl_invalidation() {
        let mut cache = NodeCache::new(5.0);
        cache.walkable(GridCoord::new(1, 1), 1.0, || true);
        assert!(!cache.advance(2.0));
        assert!(!cache.advance(2.9));
        assert_eq!(cache.len(), 1);
        assert!(cache.advance(0.2));
        assert!(cache.is_empty());
        assert_eq!(cache.generation(), 1);
        // Age restarts after invalidation.
        assert!(!cache.advance(4.0));
    }

    #[test]
    fn test_switching_obstacle_source_drops_nodes() {
        let mut cache = NodeCache::new(5.0);
        let open = ();
        let other = 7u32;
        assert!(!cache.bind_source(ObstacleSource::of(&open)));
        cache.walkable(GridCoord::new(0, 0), 1.0, || true);
        assert!(!cache.bind_source(ObstacleSource::of(&open)));
        assert_eq!(cache.len(), 1);

        assert!(cache.bind_source(ObstacleSource::of(&other)));
        assert!(cache.is_empty());
        assert!(!cache.walkable(GridCoord::new(0, 0), 1.0, || false));
        assert_eq!(cache.generation(), 1);
    }
}
