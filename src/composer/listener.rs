use std::rc::Rc;

use super::SurfaceId;

/// Observer notified whenever a child is attached to or detached from any
/// surface the composer tracks.
pub trait ChildListener<E> {
    fn child_added(&self, element: &E);
    fn child_removed(&self, element: &E);
}

struct Registration<E> {
    listener: Rc<dyn ChildListener<E>>,
    owner: Option<SurfaceId>,
}

/// Ordered listener set keyed by pointer identity. Owned by a single
/// composer, so listeners are shared through `Rc`.
pub struct ListenerRegistry<E> {
    entries: Vec<Registration<E>>,
}

impl<E> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns `false` when the listener was already registered.
    pub fn add(&mut self, listener: Rc<dyn ChildListener<E>>, owner: Option<SurfaceId>) -> bool {
        if self.position(&listener).is_some() {
            return false;
        }
        self.entries.push(Registration { listener, owner });
        true
    }

    pub fn remove(&mut self, listener: &Rc<dyn ChildListener<E>>) -> bool {
        match self.position(listener) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every listener owned by `surface`, returning how many went away.
    pub fn remove_owned_by(&mut self, surface: SurfaceId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != Some(surface));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify_added(&self, element: &E) {
        for entry in &self.entries {
            entry.listener.child_added(element);
        }
    }

    pub fn notify_removed(&self, element: &E) {
        for entry in &self.entries {
            entry.listener.child_removed(element);
        }
    }

    fn position(&self, listener: &Rc<dyn ChildListener<E>>) -> Option<usize> {
        // Data pointers only: one listener may be reachable through distinct vtables.
        let target = Rc::as_ptr(listener) as *const ();
        self.entries
            .iter()
            .position(|entry| Rc::as_ptr(&entry.listener) as *const () == target)
    }
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
