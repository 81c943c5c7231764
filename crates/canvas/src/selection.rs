//! Selection state.
//!
//! The selection is a set of primitive ids with a dirty flag. Mutations
//! mark the flag only when the set actually changes, and the editor
//! drains it once per update cycle with [`SelectionManager::take_changed`],
//! so a burst of select calls produces a single selection-changed event.

use std::collections::HashSet;

use scene_graph::primitive::PrimitiveId;
use scene_graph::{traverse, SceneGraph};

#[derive(Default)]
pub struct SelectionManager {
    selected: HashSet<PrimitiveId>,
    changed: bool,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, ids: &[PrimitiveId]) {
        for id in ids {
            if self.selected.insert(*id) {
                self.changed = true;
            }
        }
    }

    pub fn deselect(&mut self, ids: &[PrimitiveId]) {
        for id in ids {
            if self.selected.remove(id) {
                self.changed = true;
            }
        }
    }

    pub fn toggle(&mut self, id: PrimitiveId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        self.changed = true;
    }

    pub fn deselect_all(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.changed = true;
        }
    }

    /// Selects every selectable primitive in the scene's layers
    pub fn select_all(&mut self, scene: &SceneGraph) {
        let mut ids = Vec::new();
        traverse(scene, scene.root(), &mut |_, primitive| {
            if primitive.selectable {
                ids.push(primitive.id);
            }
        });
        self.select(&ids);
    }

    pub fn is_selected(&self, id: PrimitiveId) -> bool {
        self.selected.contains(&id)
    }

    /// The selected ids in a stable order
    pub fn selected(&self) -> Vec<PrimitiveId> {
        let mut ids: Vec<_> = self.selected.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drops ids that no longer exist, e.g. after a removal
    pub fn prune(&mut self, removed: &[PrimitiveId]) {
        for id in removed {
            if self.selected.remove(id) {
                self.changed = true;
            }
        }
    }

    /// Consumes the dirty flag. Returns the final selection when it
    /// changed since the last call, coalescing any number of mutations
    /// into one result.
    pub fn take_changed(&mut self) -> Option<Vec<PrimitiveId>> {
        if std::mem::take(&mut self.changed) {
            Some(self.selected())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u128) -> PrimitiveId {
        PrimitiveId::from_u128(value)
    }

    #[test]
    fn test_changes_coalesce_into_one_take() {
        let mut selection = SelectionManager::new();
        selection.select(&[id(1)]);
        selection.select(&[id(2)]);
        selection.deselect(&[id(1)]);

        assert_eq!(selection.take_changed(), Some(vec![id(2)]));
        assert_eq!(selection.take_changed(), None);
    }

    #[test]
    fn test_noop_mutations_do_not_mark_dirty() {
        let mut selection = SelectionManager::new();
        selection.deselect_all();
        selection.deselect(&[id(1)]);
        selection.prune(&[id(2)]);
        assert_eq!(selection.take_changed(), None);

        selection.select(&[id(1)]);
        selection.take_changed();
        // Selecting what is already selected is a no-op
        selection.select(&[id(1)]);
        assert_eq!(selection.take_changed(), None);
    }

    #[test]
    fn test_toggle() {
        let mut selection = SelectionManager::new();
        selection.toggle(id(1));
        assert!(selection.is_selected(id(1)));
        selection.toggle(id(1));
        assert!(!selection.is_selected(id(1)));
    }

    #[test]
    fn test_prune_removes_dead_ids() {
        let mut selection = SelectionManager::new();
        selection.select(&[id(1), id(2)]);
        selection.take_changed();

        selection.prune(&[id(1), id(9)]);
        assert_eq!(selection.take_changed(), Some(vec![id(2)]));
    }

    #[test]
    fn test_select_all_skips_unselectable() {
        use glam::Vec2;
        use scene_graph::primitive::Primitive;

        let mut scene = SceneGraph::new();
        let rect = scene
            .add_child_to_active(Primitive::rect().with_size(Vec2::splat(10.0)))
            .unwrap();
        scene
            .add_child_to_active(
                Primitive::ellipse()
                    .with_size(Vec2::splat(10.0))
                    .with_selectable(false),
            )
            .unwrap();
        let rect_id = scene.primitive(rect).unwrap().id;

        let mut selection = SelectionManager::new();
        selection.select_all(&scene);
        assert_eq!(selection.selected(), vec![rect_id]);
    }
}
