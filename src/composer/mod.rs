//! Child composition for map surfaces.
//!
//! The host tree hands every surface an ordered list of children. Structural
//! children are real views and must be mirrored into the native scene graph;
//! overlay children (annotation views) live only in the logical list. The
//! composer keeps the logical list authoritative and derives scene graph
//! positions from it on demand.

pub mod listener;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

pub use listener::{ChildListener, ListenerRegistry};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildKind {
    /// Present in the native scene graph.
    Structural,
    /// Logical only; consumes a logical slot but no structural slot.
    Overlay,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChildEntry<E> {
    pub element: E,
    pub kind: ChildKind,
}

impl<E> ChildEntry<E> {
    pub fn is_structural(&self) -> bool {
        self.kind == ChildKind::Structural
    }
}

/// The native view hierarchy of the rendering surface.
pub trait SceneGraph<E> {
    fn insert_child(&mut self, surface: SurfaceId, element: &E, index: usize);
    fn remove_child_at(&mut self, surface: SurfaceId, index: usize);
}

/// Count of structural entries in `entries[..logical_index]`.
pub fn structural_index<E>(entries: &[ChildEntry<E>], logical_index: usize) -> usize {
    entries[..logical_index.min(entries.len())]
        .iter()
        .filter(|entry| entry.is_structural())
        .count()
}

pub struct ChildComposer<E, G> {
    graph: G,
    children: HashMap<SurfaceId, Vec<ChildEntry<E>>>,
    listeners: ListenerRegistry<E>,
}

impl<E, G: SceneGraph<E>> ChildComposer<E, G> {
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            children: HashMap::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn add_listener(&mut self, listener: Rc<dyn ChildListener<E>>) -> bool {
        self.listeners.add(listener, None)
    }

    /// Register a listener that is released together with `surface`.
    pub fn add_surface_listener(
        &mut self,
        surface: SurfaceId,
        listener: Rc<dyn ChildListener<E>>,
    ) -> bool {
        self.listeners.add(listener, Some(surface))
    }

    pub fn remove_listener(&mut self, listener: &Rc<dyn ChildListener<E>>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn attach(
        &mut self,
        surface: SurfaceId,
        element: E,
        kind: ChildKind,
        logical_index: usize,
    ) -> BridgeResult<()> {
        let len = self.children.get(&surface).map_or(0, Vec::len);
        if logical_index > len {
            return Err(BridgeError::IndexOutOfRange {
                surface,
                index: logical_index,
                len,
            });
        }

        let entries = self.children.entry(surface).or_default();
        if kind == ChildKind::Structural {
            let real_index = structural_index(entries, logical_index);
            log::debug!(
                "[composer] surface {surface}: structural child at {logical_index} \
                 -> scene index {real_index}"
            );
            self.graph.insert_child(surface, &element, real_index);
        } else {
            log::debug!("[composer] surface {surface}: overlay child at {logical_index}");
        }
        entries.insert(logical_index, ChildEntry { element, kind });

        self.listeners.notify_added(&entries[logical_index].element);
        Ok(())
    }

    pub fn detach(&mut self, surface: SurfaceId, logical_index: usize) -> BridgeResult<E> {
        let entries = self
            .children
            .get_mut(&surface)
            .ok_or(BridgeError::UnknownSurface(surface))?;
        if logical_index >= entries.len() {
            return Err(BridgeError::IndexOutOfRange {
                surface,
                index: logical_index,
                len: entries.len(),
            });
        }

        let real_index = structural_index(entries, logical_index);
        let removed = entries.remove(logical_index);
        if removed.is_structural() {
            log::debug!(
                "[composer] surface {surface}: removing structural child {logical_index} \
                 at scene index {real_index}"
            );
            self.graph.remove_child_at(surface, real_index);
        }
        if entries.is_empty() {
            self.children.remove(&surface);
            log::debug!("[composer] surface {surface}: child list released");
        }

        self.listeners.notify_removed(&removed.element);
        Ok(removed.element)
    }

    pub fn count(&self, surface: SurfaceId) -> BridgeResult<usize> {
        self.entries(surface).map(<[ChildEntry<E>]>::len)
    }

    pub fn at(&self, surface: SurfaceId, logical_index: usize) -> BridgeResult<&ChildEntry<E>> {
        let entries = self.entries(surface)?;
        entries.get(logical_index).ok_or(BridgeError::IndexOutOfRange {
            surface,
            index: logical_index,
            len: entries.len(),
        })
    }

    /// Scene graph position for `logical_index`, valid for `0..=count`.
    pub fn translate(&self, surface: SurfaceId, logical_index: usize) -> BridgeResult<usize> {
        let entries = self.entries(surface)?;
        if logical_index > entries.len() {
            return Err(BridgeError::IndexOutOfRange {
                surface,
                index: logical_index,
                len: entries.len(),
            });
        }
        Ok(structural_index(entries, logical_index))
    }

    /// Overlay children of `surface` in logical order. Surfaces without
    /// children yield nothing.
    pub fn annotations(&self, surface: SurfaceId) -> Vec<&E> {
        self.children
            .get(&surface)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.kind == ChildKind::Overlay)
                    .map(|entry| &entry.element)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.children.keys().copied()
    }

    /// Detach every child of `surface` (last first) and drop the listeners
    /// it owns. Returns the number of children released.
    pub fn dispose(&mut self, surface: SurfaceId) -> usize {
        let mut released = 0;
        while let Some(last) = self.children.get(&surface).and_then(|e| e.len().checked_sub(1)) {
            if self.detach(surface, last).is_err() {
                break;
            }
            released += 1;
        }
        let dropped = self.listeners.remove_owned_by(surface);
        log::debug!(
            "[composer] surface {surface} disposed: {released} children, {dropped} listeners"
        );
        released
    }

    fn entries(&self, surface: SurfaceId) -> BridgeResult<&[ChildEntry<E>]> {
        self.children
            .get(&surface)
            .map(Vec::as_slice)
            .ok_or(BridgeError::UnknownSurface(surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Graph {
        ops: Vec<String>,
    }

    impl SceneGraph<&'static str> for Graph {
        fn insert_child(&mut self, surface: SurfaceId, element: &&'static str, index: usize) {
            self.ops.push(format!("{}:+{}@{}", surface.0, element, index));
        }

        fn remove_child_at(&mut self, surface: SurfaceId, index: usize) {
            self.ops.push(format!("{}:-@{}", surface.0, index));
        }
    }

    const S: SurfaceId = SurfaceId(1);

    #[test]
    fn structural_index_skips_overlays() {
        let entry = |element, kind| ChildEntry { element, kind };
        let entries = vec![
            entry('a', ChildKind::Structural),
            entry('b', ChildKind::Overlay),
            entry('c', ChildKind::Structural),
        ];
        assert_eq!(structural_index(&entries, 0), 0);
        assert_eq!(structural_index(&entries, 2), 1);
        assert_eq!(structural_index(&entries, 3), 2);
    }

    #[test]
    fn attach_mirrors_structural_children_only() {
        let mut composer = ChildComposer::new(Graph::default());
        composer.attach(S, "a", ChildKind::Structural, 0).unwrap();
        composer.attach(S, "b", ChildKind::Overlay, 0).unwrap();
        composer.attach(S, "c", ChildKind::Structural, 1).unwrap();
        assert_eq!(composer.graph().ops, vec!["1:+a@0", "1:+c@0"]);
        assert_eq!(composer.count(S).unwrap(), 3);
        assert_eq!(composer.annotations(S), vec![&"b"]);
    }

    #[test]
    fn detach_uses_index_before_removal() {
        let mut composer = ChildComposer::new(Graph::default());
        composer.attach(S, "a", ChildKind::Overlay, 0).unwrap();
        composer.attach(S, "b", ChildKind::Structural, 1).unwrap();
        composer.attach(S, "c", ChildKind::Structural, 2).unwrap();
        assert_eq!(composer.detach(S, 2).unwrap(), "c");
        assert_eq!(composer.graph().ops.last().unwrap(), "1:-@1");
    }

    #[test]
    fn out_of_range_attach_leaves_state_untouched() {
        let mut composer = ChildComposer::new(Graph::default());
        composer.attach(S, "a", ChildKind::Structural, 0).unwrap();
        let err = composer.attach(S, "b", ChildKind::Structural, 5).unwrap_err();
        assert_eq!(
            err,
            BridgeError::IndexOutOfRange {
                surface: S,
                index: 5,
                len: 1
            }
        );
        assert_eq!(composer.count(S).unwrap(), 1);
        assert_eq!(composer.graph().ops.len(), 1);
    }

    #[test]
    fn attach_to_fresh_surface_past_zero_fails() {
        let mut composer = ChildComposer::new(Graph::default());
        assert!(composer.attach(S, "a", ChildKind::Overlay, 1).is_err());
        assert_eq!(composer.count(S), Err(BridgeError::UnknownSurface(S)));
    }

    #[test]
    fn translate_accepts_one_past_the_end() {
        let mut composer = ChildComposer::new(Graph::default());
        composer.attach(S, "a", ChildKind::Structural, 0).unwrap();
        assert_eq!(composer.translate(S, 1).unwrap(), 1);
        assert!(composer.translate(S, 2).is_err());
    }

    #[test]
    fn dispose_releases_children_in_reverse() {
        let mut composer = ChildComposer::new(Graph::default());
        composer.attach(S, "a", ChildKind::Structural, 0).unwrap();
        composer.attach(S, "b", ChildKind::Overlay, 1).unwrap();
        composer.attach(S, "c", ChildKind::Structural, 2).unwrap();
        assert_eq!(composer.dispose(S), 3);
        assert_eq!(composer.graph().ops[2..], ["1:-@1".to_string(), "1:-@0".to_string()]);
        assert_eq!(composer.count(S), Err(BridgeError::UnknownSurface(S)));
        assert_eq!(composer.surfaces().count(), 0);
    }
}
