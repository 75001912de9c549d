//! The host element a surface binds to.
//!
//! A `HostElement` stands in for the page container the map is mounted
//! in: it has a pixel size that may not be final at mount time, and it fans
//! input events out to whatever listeners are attached. Clones share state.

use crate::{core::geo::Point, input::events::InputEvent};
use crossbeam_channel::{Receiver, Sender};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct HostState {
    id: String,
    size: Point,
    attached: bool,
    renderable: bool,
    bound_to: Option<u64>,
    listeners: Vec<(ListenerId, Sender<InputEvent>)>,
}

#[derive(Debug, Clone)]
pub struct HostElement {
    state: Arc<Mutex<HostState>>,
}

impl HostElement {
    /// An attached, renderable container of the given size
    pub fn new(id: impl Into<String>, size: Point) -> Self {
        Self::with_flags(id, size, true, true)
    }

    /// A container that is not in the document
    pub fn detached(id: impl Into<String>) -> Self {
        Self::with_flags(id, Point::new(0.0, 0.0), false, true)
    }

    /// An attached container with no rendering capability
    pub fn headless(id: impl Into<String>) -> Self {
        Self::with_flags(id, Point::new(0.0, 0.0), true, false)
    }

    fn with_flags(id: impl Into<String>, size: Point, attached: bool, renderable: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                id: id.into(),
                size,
                attached,
                renderable,
                bound_to: None,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True when both handles refer to the same element
    pub fn same_as(&self, other: &HostElement) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn size(&self) -> Point {
        self.lock().size
    }

    /// Layout changed; surfaces pick it up on their next re-measure
    pub fn set_size(&self, size: Point) {
        self.lock().size = size;
    }

    pub fn set_attached(&self, attached: bool) {
        self.lock().attached = attached;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    pub fn is_renderable(&self) -> bool {
        self.lock().renderable
    }

    pub fn is_bound(&self) -> bool {
        self.lock().bound_to.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Delivers `event` to every attached listener and returns how many got it
    pub fn dispatch(&self, event: InputEvent) -> usize {
        let mut state = self.lock();
        let before = state.listeners.len();
        state
            .listeners
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
        if state.listeners.len() < before {
            log::debug!(
                "host '{}' dropped {} disconnected listeners",
                state.id,
                before - state.listeners.len()
            );
        }
        state.listeners.len()
    }

    /// Claims the host for `surface_id`; fails if another surface holds it
    pub(crate) fn bind(&self, surface_id: u64) -> std::result::Result<(), String> {
        let mut state = self.lock();
        match state.bound_to {
            Some(owner) if owner != surface_id => Err(format!(
                "host '{}' is already bound to surface {}",
                state.id, owner
            )),
            _ => {
                state.bound_to = Some(surface_id);
                Ok(())
            }
        }
    }

    pub(crate) fn unbind(&self, surface_id: u64) {
        let mut state = self.lock();
        if state.bound_to == Some(surface_id) {
            state.bound_to = None;
        }
    }

    pub(crate) fn add_listener(&self) -> (ListenerId, Receiver<InputEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        self.lock().listeners.push((id, sender));
        (id, receiver)
    }

    pub(crate) fn remove_listener(&self, listener: ListenerId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(id, _)| *id != listener);
        state.listeners.len() < before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_listeners() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        let (id, rx) = host.add_listener();

        assert_eq!(host.dispatch(InputEvent::DragEnd), 1);
        assert_eq!(rx.try_recv().ok(), Some(InputEvent::DragEnd));

        assert!(host.remove_listener(id));
        assert_eq!(host.dispatch(InputEvent::DragEnd), 0);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        let (_, rx) = host.add_listener();
        drop(rx);
        assert_eq!(host.dispatch(InputEvent::DragEnd), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_single_owner() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        host.bind(1).unwrap();
        host.bind(1).unwrap();
        assert!(host.bind(2).is_err());
        host.unbind(2);
        assert!(host.is_bound());
        host.unbind(1);
        assert!(!host.is_bound());
    }
}
