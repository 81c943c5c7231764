//! # Scene Graph System
//!
//! The scene graph is the spatial backbone of the canvas: a hierarchical
//! tree of [`Primitive`]s with per-node local transforms, a layer table,
//! and a quadtree spatial index kept in sync with every mutation.
//!
//! ## Key Concepts
//!
//! - **Scene Nodes**: slotmap-allocated tree nodes, each owning at most
//!   one primitive. The root is purely structural.
//! - **Layers**: direct children of the root. The built-in `default`
//!   layer holds document content and is *trackable* (its descendants
//!   are spatially indexed). The built-in `helper` layer holds overlay
//!   primitives such as the transformer gizmo and is never indexed or
//!   hit tested.
//! - **Document space**: the frame above the layers. World transforms
//!   accumulate local transforms from the root down; the camera's view
//!   matrix maps document space to the viewport.
//! - **Events**: structural mutations queue [`SceneEvent`]s which the
//!   editor drains into its event bus at the end of each update cycle.

pub mod primitive;
pub mod spatial;

use std::collections::HashMap;

use glam::Vec2;
use log::debug;
use slotmap::SlotMap;
use thiserror::Error;
use vellum_core::{Bounds, Matrix};

use crate::primitive::{Primitive, PrimitiveId, PrimitiveKind};
use crate::spatial::SpatialIndex;

slotmap::new_key_type! {
    /// Unique identifier for nodes within the scene graph.
    pub struct SceneNodeId;
}

/// Name of the built-in document layer.
pub const DEFAULT_LAYER: &str = "default";
/// Name of the built-in overlay layer.
pub const HELPER_LAYER: &str = "helper";

/// Z index of the helper layer, above anything a user would assign.
const HELPER_LAYER_Z: i32 = 9999;

/// Half-extent of the region the spatial index subdivides. Entries
/// outside it are still tracked, just without subdivision.
const INDEX_EXTENT: f32 = 65_536.0;

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("layer `{0}` does not exist")]
    LayerNotFound(String),
    #[error("layer `{0}` already exists")]
    LayerExists(String),
    #[error("built-in layer `{0}` cannot be removed")]
    BuiltinLayer(String),
    #[error("scene node does not exist")]
    NodeNotFound,
    #[error("node is not a container")]
    NotAContainer,
    #[error("layers cannot be reparented")]
    LayerImmovable,
    #[error("reparenting would create a cycle")]
    WouldCreateCycle,
    #[error("view matrix is not invertible")]
    SingularViewMatrix,
}

/// Notifications queued by scene mutations, drained by the editor.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    /// Tracked primitives entered or left the document tree.
    DescendantsChanged(Vec<PrimitiveId>),
    LayerAdded(String),
    LayerRemoved(String),
    LayerChanged(String),
}

/// A single node in the scene graph hierarchy.
#[derive(Debug)]
pub struct SceneNode {
    parent: Option<SceneNodeId>,
    children: Vec<SceneNodeId>,
    /// The primitive this node carries. The structural root has none.
    primitive: Option<Primitive>,
    /// Whether this node should be considered for rendering and hit testing
    visible: bool,
}

impl SceneNode {
    pub fn parent(&self) -> Option<SceneNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[SceneNodeId] {
        &self.children
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        self.primitive.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Configuration for creating a layer.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub name: String,
    /// Whether descendants of this layer are spatially indexed.
    pub trackable: bool,
    pub locked: bool,
    pub visible: bool,
    pub z_index: i32,
}

impl LayerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trackable: true,
            locked: false,
            visible: true,
            z_index: 0,
        }
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn trackable(mut self, trackable: bool) -> Self {
        self.trackable = trackable;
        self
    }
}

/// Bookkeeping for one layer.
#[derive(Clone, Debug)]
pub struct LayerInfo {
    pub node: SceneNodeId,
    pub trackable: bool,
    pub locked: bool,
    pub visible: bool,
    pub z_index: i32,
}

/// The scene graph: node tree, layer table, spatial index and view
/// matrix, mutated synchronously on a single thread.
pub struct SceneGraph {
    root: SceneNodeId,
    nodes: SlotMap<SceneNodeId, SceneNode>,
    /// Maps primitive ids to the scene node carrying them
    primitive_index: HashMap<PrimitiveId, SceneNodeId>,
    layers: HashMap<String, LayerInfo>,
    active_layer: String,
    spatial: SpatialIndex,
    /// Document space to viewport
    view: Matrix,
    /// Viewport to document space, cached alongside `view`
    inverse_view: Matrix,
    events: Vec<SceneEvent>,
    needs_redraw: bool,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode {
            parent: None,
            children: Vec::new(),
            primitive: None,
            visible: true,
        });

        let mut graph = Self {
            root,
            nodes,
            primitive_index: HashMap::new(),
            layers: HashMap::new(),
            active_layer: DEFAULT_LAYER.to_string(),
            spatial: SpatialIndex::new(Bounds::from_center_size(
                Vec2::ZERO,
                Vec2::splat(INDEX_EXTENT * 2.0),
            )),
            view: Matrix::IDENTITY,
            inverse_view: Matrix::IDENTITY,
            events: Vec::new(),
            needs_redraw: false,
        };

        // The two built-in layers always exist
        graph.create_layer(LayerConfig::new(DEFAULT_LAYER)).ok();
        graph
            .create_layer(
                LayerConfig::new(HELPER_LAYER)
                    .trackable(false)
                    .z_index(HELPER_LAYER_Z),
            )
            .ok();
        graph.events.clear();
        graph.needs_redraw = false;
        graph
    }

    /// Returns the ID of the structural root node
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    // --- Layers ---

    pub fn create_layer(&mut self, config: LayerConfig) -> Result<SceneNodeId, SceneError> {
        if self.layers.contains_key(&config.name) {
            return Err(SceneError::LayerExists(config.name));
        }

        let node_id = self.nodes.insert(SceneNode {
            parent: Some(self.root),
            children: Vec::new(),
            primitive: Some(Primitive::layer().with_label(config.name.clone())),
            visible: config.visible,
        });

        // Keep root children ordered by layer z so sibling order is
        // paint order
        let position = self.nodes[self.root]
            .children
            .iter()
            .position(|&sibling| {
                self.layer_info_by_node(sibling)
                    .is_some_and(|info| info.z_index > config.z_index)
            })
            .unwrap_or(self.nodes[self.root].children.len());
        self.nodes[self.root].children.insert(position, node_id);

        if let Some(primitive) = self.nodes[node_id].primitive.as_ref() {
            self.primitive_index.insert(primitive.id, node_id);
        }

        self.layers.insert(
            config.name.clone(),
            LayerInfo {
                node: node_id,
                trackable: config.trackable,
                locked: config.locked,
                visible: config.visible,
                z_index: config.z_index,
            },
        );
        debug!("created layer `{}`", config.name);
        self.events.push(SceneEvent::LayerAdded(config.name));
        self.needs_redraw = true;
        Ok(node_id)
    }

    /// Removes a layer and everything in it. Returns the ids of the
    /// primitives that were removed with it.
    pub fn remove_layer(&mut self, name: &str) -> Result<Vec<PrimitiveId>, SceneError> {
        if name == DEFAULT_LAYER || name == HELPER_LAYER {
            return Err(SceneError::BuiltinLayer(name.to_string()));
        }
        let info = self
            .layers
            .remove(name)
            .ok_or_else(|| SceneError::LayerNotFound(name.to_string()))?;

        let removed = self.remove_subtree(info.node);
        if self.active_layer == name {
            self.active_layer = DEFAULT_LAYER.to_string();
        }
        self.events.push(SceneEvent::LayerRemoved(name.to_string()));
        self.needs_redraw = true;
        Ok(removed)
    }

    pub fn layer(&self, name: &str) -> Option<&LayerInfo> {
        self.layers.get(name)
    }

    /// All layers, bottom to top
    pub fn layers(&self) -> Vec<(&str, &LayerInfo)> {
        let mut layers: Vec<_> = self
            .layers
            .iter()
            .map(|(name, info)| (name.as_str(), info))
            .collect();
        layers.sort_by_key(|(_, info)| info.z_index);
        layers
    }

    pub fn active_layer(&self) -> &str {
        &self.active_layer
    }

    pub fn set_active_layer(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.layers.contains_key(name) {
            return Err(SceneError::LayerNotFound(name.to_string()));
        }
        self.active_layer = name.to_string();
        Ok(())
    }

    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<(), SceneError> {
        let info = self
            .layers
            .get_mut(name)
            .ok_or_else(|| SceneError::LayerNotFound(name.to_string()))?;
        info.visible = visible;
        let node = info.node;
        self.nodes[node].visible = visible;
        self.events.push(SceneEvent::LayerChanged(name.to_string()));
        self.needs_redraw = true;
        Ok(())
    }

    pub fn set_layer_locked(&mut self, name: &str, locked: bool) -> Result<(), SceneError> {
        let info = self
            .layers
            .get_mut(name)
            .ok_or_else(|| SceneError::LayerNotFound(name.to_string()))?;
        info.locked = locked;
        self.events.push(SceneEvent::LayerChanged(name.to_string()));
        Ok(())
    }

    // --- Tree structure ---

    /// Adds a primitive under the given parent node.
    ///
    /// When the parent sits in a trackable layer the new primitive is
    /// spatially indexed and a descendant-changed event is queued.
    pub fn add_child(
        &mut self,
        parent_id: SceneNodeId,
        primitive: Primitive,
    ) -> Result<SceneNodeId, SceneError> {
        let parent = self.nodes.get(parent_id).ok_or(SceneError::NodeNotFound)?;
        if parent
            .primitive
            .as_ref()
            .is_some_and(|primitive| primitive.is_leaf())
        {
            return Err(SceneError::NotAContainer);
        }

        let primitive_id = primitive.id;
        let node_id = self.nodes.insert(SceneNode {
            parent: Some(parent_id),
            children: Vec::new(),
            primitive: Some(primitive),
            visible: true,
        });
        self.nodes[parent_id].children.push(node_id);
        self.primitive_index.insert(primitive_id, node_id);

        if self.is_tracked(node_id) {
            if let Some(bounds) = self.document_bounds(node_id) {
                self.spatial.insert(primitive_id, bounds);
            }
            self.events
                .push(SceneEvent::DescendantsChanged(vec![primitive_id]));
        }
        debug!("added {} under {:?}", primitive_id, parent_id);
        self.needs_redraw = true;
        Ok(node_id)
    }

    /// Adds a primitive to the currently active layer
    pub fn add_child_to_active(&mut self, primitive: Primitive) -> Result<SceneNodeId, SceneError> {
        let layer_node = self
            .layers
            .get(&self.active_layer)
            .map(|info| info.node)
            .ok_or_else(|| SceneError::LayerNotFound(self.active_layer.clone()))?;
        self.add_child(layer_node, primitive)
    }

    /// Adds a primitive to a named layer
    pub fn add_child_to_layer(
        &mut self,
        layer: &str,
        primitive: Primitive,
    ) -> Result<SceneNodeId, SceneError> {
        let layer_node = self
            .layers
            .get(layer)
            .map(|info| info.node)
            .ok_or_else(|| SceneError::LayerNotFound(layer.to_string()))?;
        self.add_child(layer_node, primitive)
    }

    /// Moves an existing node (and its subtree) under a new parent.
    ///
    /// Descendants that cross a tracked boundary are indexed or
    /// unindexed accordingly, and only those are reported in the
    /// descendant-changed event. Descendants that stay tracked are
    /// reindexed because their world transforms changed.
    pub fn reparent(
        &mut self,
        child_id: SceneNodeId,
        new_parent_id: SceneNodeId,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child_id) || !self.nodes.contains_key(new_parent_id) {
            return Err(SceneError::NodeNotFound);
        }
        if child_id == self.root
            || self.nodes[child_id]
                .primitive
                .as_ref()
                .is_some_and(|primitive| matches!(primitive.kind, PrimitiveKind::Layer))
        {
            return Err(SceneError::LayerImmovable);
        }
        if self.is_ancestor(child_id, new_parent_id) {
            return Err(SceneError::WouldCreateCycle);
        }
        if self.nodes[new_parent_id]
            .primitive
            .as_ref()
            .is_some_and(|primitive| primitive.is_leaf())
        {
            return Err(SceneError::NotAContainer);
        }

        let was_tracked = self.is_tracked(child_id);

        if let Some(old_parent_id) = self.nodes[child_id].parent {
            self.nodes[old_parent_id]
                .children
                .retain(|&id| id != child_id);
        }
        self.nodes[child_id].parent = Some(new_parent_id);
        self.nodes[new_parent_id].children.push(child_id);

        let now_tracked = self.is_tracked(child_id);
        let subtree_primitives = self.subtree_primitive_ids(child_id);

        match (was_tracked, now_tracked) {
            (true, false) => {
                for id in &subtree_primitives {
                    self.spatial.remove(*id);
                }
                self.events
                    .push(SceneEvent::DescendantsChanged(subtree_primitives));
            }
            (false, true) => {
                self.reindex_subtree(child_id);
                self.events
                    .push(SceneEvent::DescendantsChanged(subtree_primitives));
            }
            (true, true) => {
                // Same tracked universe, but world transforms moved
                self.reindex_subtree(child_id);
            }
            (false, false) => {}
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Removes the given nodes and their subtrees. Root and layer nodes
    /// are skipped; layers are removed through [`SceneGraph::remove_layer`].
    ///
    /// Returns the ids of every removed primitive, for selection pruning.
    pub fn remove_nodes(&mut self, node_ids: &[SceneNodeId]) -> Vec<PrimitiveId> {
        let mut removed = Vec::new();
        let mut tracked_removed = Vec::new();
        for &node_id in node_ids {
            if node_id == self.root || self.layer_info_by_node(node_id).is_some() {
                continue;
            }
            if !self.nodes.contains_key(node_id) {
                continue;
            }
            let tracked = self.is_tracked(node_id);
            let subtree = self.remove_subtree(node_id);
            if tracked {
                tracked_removed.extend(subtree.iter().copied());
            }
            removed.extend(subtree);
        }
        if !tracked_removed.is_empty() {
            self.events
                .push(SceneEvent::DescendantsChanged(tracked_removed));
        }
        if !removed.is_empty() {
            self.needs_redraw = true;
        }
        removed
    }

    fn remove_subtree(&mut self, node_id: SceneNodeId) -> Vec<PrimitiveId> {
        let mut stack = vec![node_id];
        let mut removed = Vec::new();

        if let Some(parent_id) = self.nodes.get(node_id).and_then(|node| node.parent) {
            self.nodes[parent_id].children.retain(|&id| id != node_id);
        }

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children.iter().copied());
                if let Some(primitive) = node.primitive {
                    self.primitive_index.remove(&primitive.id);
                    self.spatial.remove(primitive.id);
                    removed.push(primitive.id);
                }
            }
        }
        removed
    }

    // --- Lookup ---

    pub fn node(&self, node_id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(node_id)
    }

    pub fn node_by_primitive(&self, primitive_id: PrimitiveId) -> Option<SceneNodeId> {
        self.primitive_index.get(&primitive_id).copied()
    }

    pub fn primitive(&self, node_id: SceneNodeId) -> Option<&Primitive> {
        self.nodes
            .get(node_id)
            .and_then(|node| node.primitive.as_ref())
    }

    pub fn set_visible(&mut self, node_id: SceneNodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.visible = visible;
            self.needs_redraw = true;
        }
    }

    // --- Mutation ---

    /// Mutates a node's primitive and keeps the spatial index in sync.
    ///
    /// Index entries for the node and its tracked descendants are
    /// removed before the mutation, then reinserted with freshly
    /// computed document bounds, so the index never carries stale boxes.
    pub fn update_primitive(
        &mut self,
        node_id: SceneNodeId,
        mutate: impl FnOnce(&mut Primitive),
    ) -> Result<(), SceneError> {
        if !self
            .nodes
            .get(node_id)
            .is_some_and(|node| node.primitive.is_some())
        {
            return Err(SceneError::NodeNotFound);
        }

        let tracked = self.is_tracked(node_id);
        if tracked {
            for id in self.subtree_primitive_ids(node_id) {
                self.spatial.remove(id);
            }
        }

        if let Some(primitive) = self
            .nodes
            .get_mut(node_id)
            .and_then(|node| node.primitive.as_mut())
        {
            mutate(primitive);
        }

        if tracked {
            self.reindex_subtree(node_id);
        }
        self.needs_redraw = true;
        Ok(())
    }

    fn reindex_subtree(&mut self, node_id: SceneNodeId) {
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            stack.extend(node.children.iter().copied());
            if let Some(primitive_id) = node.primitive.as_ref().map(|primitive| primitive.id) {
                if let Some(bounds) = self.document_bounds(current) {
                    self.spatial.insert(primitive_id, bounds);
                }
            }
        }
    }

    fn subtree_primitive_ids(&self, node_id: SceneNodeId) -> Vec<PrimitiveId> {
        let mut ids = Vec::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().copied());
                if let Some(primitive) = node.primitive.as_ref() {
                    ids.push(primitive.id);
                }
            }
        }
        ids
    }

    // --- Transforms and coordinates ---

    /// Accumulated transform from the node's local frame to document
    /// space. Returns identity for unknown nodes.
    pub fn world_transform(&self, node_id: SceneNodeId) -> Matrix {
        let mut chain = Vec::new();
        let mut current = Some(node_id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else { break };
            if let Some(primitive) = node.primitive.as_ref() {
                chain.push(primitive.transform);
            }
            current = node.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Matrix::IDENTITY, |world, local| world.append(local))
    }

    /// Document-space bounding box of a node's primitive
    pub fn document_bounds(&self, node_id: SceneNodeId) -> Option<Bounds> {
        let primitive = self.primitive(node_id)?;
        Some(
            primitive
                .local_bounds()
                .apply_matrix(&self.world_transform(node_id)),
        )
    }

    /// Installs the camera's view matrix. Rejects singular matrices,
    /// which would make viewport conversion impossible.
    pub fn set_view_matrix(&mut self, view: Matrix) -> Result<(), SceneError> {
        let inverse = view.invert().ok_or(SceneError::SingularViewMatrix)?;
        self.view = view;
        self.inverse_view = inverse;
        self.needs_redraw = true;
        Ok(())
    }

    pub fn view_matrix(&self) -> Matrix {
        self.view
    }

    /// Converts a viewport point to document space
    pub fn to_scene(&self, viewport_point: Vec2) -> Vec2 {
        self.inverse_view.apply(viewport_point)
    }

    /// Converts a document-space point to the viewport
    pub fn to_viewport(&self, scene_point: Vec2) -> Vec2 {
        self.view.apply(scene_point)
    }

    // --- Queries ---

    /// Tracked primitives whose bounds intersect the given viewport
    /// region, bottom to top, for culling
    pub fn primitives_in_viewport(&self, viewport_region: &Bounds) -> Vec<PrimitiveId> {
        let scene_region = viewport_region.apply_matrix(&self.inverse_view);
        let mut visible: Vec<_> = self
            .spatial
            .query_region(&scene_region)
            .into_iter()
            .filter(|&id| {
                self.node_by_primitive(id)
                    .is_some_and(|node| self.is_effectively_visible(node))
            })
            .collect();
        visible
            .sort_by_cached_key(|&id| self.node_by_primitive(id).map(|node| self.tree_path(node)));
        debug!(
            "culling: {} primitives intersect the viewport",
            visible.len()
        );
        visible
    }

    /// Returns the topmost selectable primitive at a viewport point, or
    /// None over empty canvas.
    ///
    /// Candidates come from the spatial index, are ordered topmost
    /// first by tree paint order, and the first one whose exact local
    /// geometry contains the point wins.
    pub fn top_primitive_at(&self, viewport_point: Vec2) -> Option<PrimitiveId> {
        let scene_point = self.to_scene(viewport_point);

        let mut candidates: Vec<(Vec<usize>, SceneNodeId, PrimitiveId)> = self
            .spatial
            .query_point(scene_point)
            .into_iter()
            .filter_map(|id| {
                let node = self.node_by_primitive(id)?;
                Some((self.tree_path(node), node, id))
            })
            .filter(|&(_, node, _)| {
                self.primitive(node)
                    .is_some_and(|primitive| primitive.selectable)
                    && self.is_effectively_visible(node)
                    && !self.is_in_locked_layer(node)
            })
            .collect();
        // Topmost first
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, node, id) in candidates {
            let Some(inverse_world) = self.world_transform(node).invert() else {
                // Transiently degenerate transform, skip
                continue;
            };
            let local_point = inverse_world.apply(scene_point);
            if self
                .primitive(node)
                .is_some_and(|primitive| primitive.hit_test_local(local_point))
            {
                return Some(id);
            }
        }
        None
    }

    /// Paint-order comparison of two nodes: `Less` means `a` paints
    /// below `b`. Siblings compare by child index; otherwise the
    /// comparison happens at the children of the lowest common
    /// ancestor, and a descendant paints above its ancestor.
    pub fn z_order(&self, a: SceneNodeId, b: SceneNodeId) -> std::cmp::Ordering {
        self.tree_path(a).cmp(&self.tree_path(b))
    }

    /// Sibling-index path from the root to the node. Lexicographic
    /// comparison of paths is paint order.
    fn tree_path(&self, node_id: SceneNodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node_id;
        while let Some(node) = self.nodes.get(current) {
            let Some(parent_id) = node.parent else { break };
            if let Some(index) = self
                .nodes
                .get(parent_id)
                .and_then(|parent| parent.children.iter().position(|&id| id == current))
            {
                path.push(index);
            }
            current = parent_id;
        }
        path.reverse();
        path
    }

    /// Whether descendants of this node's layer are spatially indexed.
    /// Helper-layer content and nodes outside any layer are not.
    pub fn is_tracked(&self, node_id: SceneNodeId) -> bool {
        self.containing_layer(node_id)
            .and_then(|name| self.layers.get(name))
            .is_some_and(|info| info.trackable)
    }

    /// Name of the layer this node lives in, if any
    pub fn containing_layer(&self, node_id: SceneNodeId) -> Option<&str> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if let Some((name, _)) = self.layers.iter().find(|(_, info)| info.node == id) {
                return Some(name);
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        None
    }

    fn layer_info_by_node(&self, node_id: SceneNodeId) -> Option<&LayerInfo> {
        self.layers.values().find(|info| info.node == node_id)
    }

    fn is_effectively_visible(&self, node_id: SceneNodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn is_in_locked_layer(&self, node_id: SceneNodeId) -> bool {
        self.containing_layer(node_id)
            .and_then(|name| self.layers.get(name))
            .is_some_and(|info| info.locked)
    }

    /// Determines if a node is an ancestor of another node, used to
    /// prevent cycles during reparenting
    fn is_ancestor(&self, node_id: SceneNodeId, descendant_id: SceneNodeId) -> bool {
        let mut current = Some(descendant_id);
        while let Some(id) = current {
            if id == node_id {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    // --- Update cycle plumbing ---

    /// Drains the queued scene events
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Consumes the redraw flag for this update cycle
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Read access to the spatial index, for diagnostics and tests
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`map`]: the per-node values arranged in tree shape.
#[derive(Debug)]
pub struct MappedNode<T> {
    pub id: SceneNodeId,
    pub value: T,
    pub children: Vec<MappedNode<T>>,
}

/// Visits every primitive under `node_id` in paint order. Recursion
/// bottoms out at leaf primitives.
pub fn traverse(
    graph: &SceneGraph,
    node_id: SceneNodeId,
    visit: &mut dyn FnMut(SceneNodeId, &Primitive),
) {
    let Some(node) = graph.node(node_id) else {
        return;
    };
    if let Some(primitive) = node.primitive() {
        visit(node_id, primitive);
        if primitive.is_leaf() {
            return;
        }
    }
    for &child in node.children() {
        traverse(graph, child, visit);
    }
}

/// Maps every primitive under `node_id` into a parallel tree of values.
/// Returns None when the node is missing or purely structural.
pub fn map<T>(
    graph: &SceneGraph,
    node_id: SceneNodeId,
    f: &mut dyn FnMut(SceneNodeId, &Primitive) -> T,
) -> Option<MappedNode<T>> {
    let node = graph.node(node_id)?;
    let primitive = node.primitive()?;
    let value = f(node_id, primitive);
    let children = if primitive.is_leaf() {
        Vec::new()
    } else {
        node.children()
            .iter()
            .filter_map(|&child| map(graph, child, f))
            .collect()
    };
    Some(MappedNode {
        id: node_id,
        value,
        children,
    })
}
