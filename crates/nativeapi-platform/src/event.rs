//! Native notification plumbing shared by every provider.
//!
//! Providers keep a [`Listeners`] list per event type and emit into it from
//! whatever thread the OS notifies them on. Emission works on a snapshot of
//! the handler list, so a handler may subscribe or unsubscribe while it runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{Display, ModifierKeys, Point, Size};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Something that delivers native notifications of type `E`.
pub trait EventSource<E>: Send + Sync {
    fn subscribe(&self, handler: EventHandler<E>) -> Result<SubscriptionId>;
    /// Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// Window notifications, keyed by native handle.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Focused { handle: u64 },
    Blurred { handle: u64 },
    Resized { handle: u64, size: Size },
    Moved { handle: u64, position: Point },
    Closed { handle: u64 },
}

impl WindowEvent {
    pub fn handle(&self) -> u64 {
        match *self {
            WindowEvent::Focused { handle }
            | WindowEvent::Blurred { handle }
            | WindowEvent::Resized { handle, .. }
            | WindowEvent::Moved { handle, .. }
            | WindowEvent::Closed { handle } => handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    Clicked { handle: u64 },
    RightClicked { handle: u64 },
    DoubleClicked { handle: u64 },
}

impl TrayEvent {
    pub fn handle(&self) -> u64 {
        match *self {
            TrayEvent::Clicked { handle }
            | TrayEvent::RightClicked { handle }
            | TrayEvent::DoubleClicked { handle } => handle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Added(Display),
    Removed(Display),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyboardEvent {
    KeyPressed(String),
    KeyReleased(String),
    /// Carries the full set of modifiers held after the change.
    ModifiersChanged(ModifierKeys),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastEvent {
    pub topic: String,
    pub message: String,
}

/// Handler list with id allocation. Lock poisoning is recovered from, since
/// the list stays consistent across a panicking handler.
pub struct Listeners<E> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, EventHandler<E>)>>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, handler: EventHandler<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        id
    }

    pub fn remove(&self, subscription: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<EventHandler<E>> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emit_reaches_every_handler() {
        let listeners: Listeners<u32> = Listeners::new();
        let total = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let total = Arc::clone(&total);
            listeners.add(Arc::new(move |value: &u32| {
                total.fetch_add(*value as usize, Ordering::SeqCst);
            }));
        }
        listeners.emit(&2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn removed_handler_is_not_invoked() {
        let listeners: Listeners<()> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = listeners.add(Arc::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn handler_may_unsubscribe_itself_during_emit() {
        let listeners: Arc<Listeners<()>> = Arc::new(Listeners::new());
        let own_id = Arc::new(Mutex::new(None::<SubscriptionId>));
        let hits = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&listeners);
        let slot = Arc::clone(&own_id);
        let counter = Arc::clone(&hits);
        let id = listeners.add(Arc::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock().unwrap() {
                inner.remove(id);
            }
        }));
        *own_id.lock().unwrap() = Some(id);

        listeners.emit(&());
        listeners.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let listeners: Listeners<()> = Listeners::new();
        let a = listeners.add(Arc::new(|_: &()| {}));
        let b = listeners.add(Arc::new(|_: &()| {}));
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
