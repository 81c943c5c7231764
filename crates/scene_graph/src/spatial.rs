//! Quadtree spatial index over document-space bounding boxes.
//!
//! The index answers "which primitives might intersect this region"
//! during viewport culling and hit testing. Queries are conservative:
//! they match on axis-aligned bounds, and callers post-filter with the
//! exact per-kind geometry test.
//!
//! Every tracked primitive has exactly one entry, keyed by id. Updating
//! an entry removes the old bounds before the new ones are inserted, so
//! the index never holds a stale box for a live primitive.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use vellum_core::Bounds;

use crate::primitive::PrimitiveId;

/// Maximum number of entries before subdividing a node
const MAX_ENTRIES_PER_NODE: usize = 8;
/// Maximum depth of the quadtree
const MAX_DEPTH: u32 = 8;

/// A node in the quadtree
struct QuadTreeNode {
    /// The bounds of this quad
    bounds: Bounds,
    /// Entries stored at this level (if they don't fit entirely in a child)
    entries: HashSet<PrimitiveId>,
    /// Child nodes (subdivisions of this quad)
    children: Option<Box<[QuadTreeNode; 4]>>,
}

impl QuadTreeNode {
    fn new(bounds: Bounds) -> Self {
        QuadTreeNode {
            bounds,
            entries: HashSet::new(),
            children: None,
        }
    }

    fn insert(&mut self, id: PrimitiveId, entry_bounds: Bounds, depth: u32) {
        // At max depth, or when the entry doesn't fit entirely inside
        // this quad, it lives here
        if depth >= MAX_DEPTH || !self.bounds.contains_bounds(&entry_bounds) {
            self.entries.insert(id);
            return;
        }

        if self.children.is_none() && self.entries.len() >= MAX_ENTRIES_PER_NODE {
            self.subdivide();
        }

        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bounds.contains_bounds(&entry_bounds) {
                    child.insert(id, entry_bounds, depth + 1);
                    return;
                }
            }
        }

        // Straddles the seam between children, so it stays at this level
        self.entries.insert(id);
    }

    /// Removes an entry by walking the same containment path `insert`
    /// would take for its bounds. The entry is on that path by
    /// construction, though possibly above the deepest containing node.
    fn remove(&mut self, id: PrimitiveId, entry_bounds: Bounds) -> bool {
        if self.entries.remove(&id) {
            return true;
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bounds.contains_bounds(&entry_bounds) {
                    return child.remove(id, entry_bounds);
                }
            }
        }
        false
    }

    fn subdivide(&mut self) {
        let center = self.bounds.center();
        let min = self.bounds.min;
        let max = self.bounds.max;

        let children = Box::new([
            // Northwest
            QuadTreeNode::new(Bounds::new(min, center)),
            // Northeast
            QuadTreeNode::new(Bounds::new(
                Vec2::new(center.x, min.y),
                Vec2::new(max.x, center.y),
            )),
            // Southwest
            QuadTreeNode::new(Bounds::new(
                Vec2::new(min.x, center.y),
                Vec2::new(center.x, max.y),
            )),
            // Southeast
            QuadTreeNode::new(Bounds::new(center, max)),
        ]);

        self.children = Some(children);
    }

    fn query_point(&self, point: Vec2, results: &mut HashSet<PrimitiveId>) {
        results.extend(self.entries.iter().copied());

        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.contains_point(point) {
                    child.query_point(point, results);
                }
            }
        }
    }

    fn query_region(&self, region: &Bounds, results: &mut HashSet<PrimitiveId>) {
        results.extend(self.entries.iter().copied());

        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(region) {
                    child.query_region(region, results);
                }
            }
        }
    }
}

/// Spatial index for tracked primitives.
pub struct SpatialIndex {
    root: QuadTreeNode,
    /// Bounds of every indexed entry, for removal and exactness filtering
    entry_bounds: HashMap<PrimitiveId, Bounds>,
}

impl SpatialIndex {
    pub fn new(bounds: Bounds) -> Self {
        SpatialIndex {
            root: QuadTreeNode::new(bounds),
            entry_bounds: HashMap::new(),
        }
    }

    /// Inserts or updates an entry. An existing entry for the same id
    /// is removed first, so ids are never indexed twice.
    pub fn insert(&mut self, id: PrimitiveId, bounds: Bounds) {
        self.remove(id);
        self.entry_bounds.insert(id, bounds);
        self.root.insert(id, bounds, 0);
    }

    /// Removes an entry. Returns false when the id was not indexed.
    pub fn remove(&mut self, id: PrimitiveId) -> bool {
        match self.entry_bounds.remove(&id) {
            Some(bounds) => self.root.remove(id, bounds),
            None => false,
        }
    }

    /// Returns the indexed bounds of an entry
    pub fn bounds_of(&self, id: PrimitiveId) -> Option<Bounds> {
        self.entry_bounds.get(&id).copied()
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.entry_bounds.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entry_bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_bounds.is_empty()
    }

    /// Returns all entries whose bounds contain the given point
    pub fn query_point(&self, point: Vec2) -> HashSet<PrimitiveId> {
        let mut candidates = HashSet::new();
        self.root.query_point(point, &mut candidates);
        candidates.retain(|id| {
            self.entry_bounds
                .get(id)
                .is_some_and(|bounds| bounds.contains_point(point))
        });
        candidates
    }

    /// Returns all entries whose bounds intersect the given region
    pub fn query_region(&self, region: &Bounds) -> HashSet<PrimitiveId> {
        let mut candidates = HashSet::new();
        self.root.query_region(region, &mut candidates);
        candidates.retain(|id| {
            self.entry_bounds
                .get(id)
                .is_some_and(|bounds| bounds.intersects(region))
        });
        candidates
    }

    /// Removes all entries
    pub fn clear(&mut self) {
        self.root = QuadTreeNode::new(self.root.bounds);
        self.entry_bounds.clear();
    }
}
