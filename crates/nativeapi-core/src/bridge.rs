//! Event bridge between provider notifications and external C callbacks.
//!
//! A bridge owns one subscription to a provider's [`EventSource`]. The
//! subscription handler marshals each notification and hands it to whatever
//! function pointer sits in the matching [`CallbackSlot`] at that moment.
//!
//! Slots are copied out before the call, so foreign code never runs with a
//! slot lock held and may re-register or stop listening from inside its own
//! callback.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nativeapi_platform::{EventHandler, EventSource, SubscriptionId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::id::ResourceKind;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holder for the single external callback of one event kind.
pub struct CallbackSlot<F: Copy> {
    callback: Mutex<Option<F>>,
}

impl<F: Copy> CallbackSlot<F> {
    pub const fn new() -> Self {
        Self {
            callback: Mutex::new(None),
        }
    }

    /// Replace the callback; `None` clears it. Returns the previous one.
    pub fn register(&self, callback: Option<F>) -> Option<F> {
        std::mem::replace(&mut *lock(&self.callback), callback)
    }

    pub fn clear(&self) {
        lock(&self.callback).take();
    }

    pub fn current(&self) -> Option<F> {
        *lock(&self.callback)
    }

    pub fn is_registered(&self) -> bool {
        lock(&self.callback).is_some()
    }
}

impl<F: Copy> Default for CallbackSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    NoCallback,
    Dropped,
}

/// Marshals notifications of one resource kind into callback slots.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    kind: ResourceKind,
    log_deliveries: bool,
}

impl Dispatcher {
    pub const fn new(kind: ResourceKind, log_deliveries: bool) -> Self {
        Self {
            kind,
            log_deliveries,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Marshal and invoke against the callback currently in `slot`.
    ///
    /// Marshalling only happens when a callback is registered, so nothing is
    /// allocated for events nobody receives. A marshalling error drops the
    /// event.
    pub fn deliver<F, T, M, I>(
        &self,
        event: &'static str,
        slot: &CallbackSlot<F>,
        marshal: M,
        invoke: I,
    ) -> Delivery
    where
        F: Copy,
        M: FnOnce() -> Result<T>,
        I: FnOnce(F, T),
    {
        let outcome = match slot.current() {
            None => Delivery::NoCallback,
            Some(callback) => match marshal() {
                Ok(payload) => {
                    invoke(callback, payload);
                    Delivery::Delivered
                }
                Err(err) => {
                    warn!(kind = %self.kind, event, "{err}");
                    Delivery::Dropped
                }
            },
        };
        if self.log_deliveries {
            debug!(kind = %self.kind, event, ?outcome, "notification dispatched");
        }
        outcome
    }
}

/// One provider subscription with idempotent start and stop.
pub struct EventBridge<S, E>
where
    S: EventSource<E> + ?Sized,
    E: 'static,
{
    kind: ResourceKind,
    source: Arc<S>,
    handler: EventHandler<E>,
    subscription: Mutex<Option<SubscriptionId>>,
    _event: PhantomData<fn(&E)>,
}

impl<S, E> EventBridge<S, E>
where
    S: EventSource<E> + ?Sized,
    E: 'static,
{
    pub fn new(kind: ResourceKind, source: Arc<S>, handler: EventHandler<E>) -> Self {
        Self {
            kind,
            source,
            handler,
            subscription: Mutex::new(None),
            _event: PhantomData,
        }
    }

    /// Subscribe the handler. A second call while subscribed does nothing.
    pub fn start_listening(&self) -> Result<()> {
        let mut subscription = lock(&self.subscription);
        if subscription.is_some() {
            debug!(kind = %self.kind, "already listening");
            return Ok(());
        }
        let id = self
            .source
            .subscribe(Arc::clone(&self.handler))
            .map_err(|source| Error::Subscribe {
                kind: self.kind,
                source,
            })?;
        *subscription = Some(id);
        debug!(kind = %self.kind, subscription = id.get(), "listening started");
        Ok(())
    }

    /// Unsubscribe the handler. Safe before start, twice in a row, and from
    /// inside a callback the handler triggered.
    pub fn stop_listening(&self) {
        let mut subscription = lock(&self.subscription);
        if let Some(id) = subscription.take() {
            self.source.unsubscribe(id);
            debug!(kind = %self.kind, subscription = id.get(), "listening stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.subscription).is_some()
    }
}

impl<S, E> Drop for EventBridge<S, E>
where
    S: EventSource<E> + ?Sized,
    E: 'static,
{
    fn drop(&mut self) {
        self.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativeapi_platform::Listeners;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Source {
        listeners: Listeners<u32>,
    }

    impl EventSource<u32> for Source {
        fn subscribe(&self, handler: EventHandler<u32>) -> nativeapi_platform::Result<SubscriptionId> {
            Ok(self.listeners.add(handler))
        }

        fn unsubscribe(&self, subscription: SubscriptionId) {
            self.listeners.remove(subscription);
        }
    }

    fn counting_bridge() -> (Arc<Source>, Arc<AtomicUsize>, EventBridge<Source, u32>) {
        let source = Arc::new(Source::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let bridge = EventBridge::new(
            ResourceKind::Keyboard,
            Arc::clone(&source),
            Arc::new(move |_: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (source, hits, bridge)
    }

    #[test]
    fn start_twice_subscribes_once() {
        let (source, hits, bridge) = counting_bridge();
        bridge.start_listening().unwrap();
        bridge.start_listening().unwrap();
        assert_eq!(source.listeners.len(), 1);
        source.listeners.emit(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_before_start_and_double_stop_are_noops() {
        let (source, hits, bridge) = counting_bridge();
        bridge.stop_listening();
        bridge.start_listening().unwrap();
        bridge.stop_listening();
        bridge.stop_listening();
        assert!(!bridge.is_listening());
        source.listeners.emit(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_unsubscribes() {
        let (source, _hits, bridge) = counting_bridge();
        bridge.start_listening().unwrap();
        drop(bridge);
        assert!(source.listeners.is_empty());
    }

    #[test]
    fn slot_register_replaces_previous() {
        let slot: CallbackSlot<u8> = CallbackSlot::new();
        assert_eq!(slot.register(Some(1)), None);
        assert_eq!(slot.register(Some(2)), Some(1));
        assert_eq!(slot.current(), Some(2));
        slot.clear();
        assert!(!slot.is_registered());
    }

    fn never_called(_: u8) {
        panic!("callback invoked");
    }

    #[test]
    fn deliver_skips_marshalling_without_callback() {
        let slot: CallbackSlot<fn(u8)> = CallbackSlot::new();
        let outcome = Dispatcher::new(ResourceKind::Keyboard, true).deliver(
            "test",
            &slot,
            || -> Result<u8> { panic!("marshalled without a callback") },
            |callback, value| callback(value),
        );
        assert_eq!(outcome, Delivery::NoCallback);
    }

    #[test]
    fn deliver_drops_event_when_marshalling_fails() {
        let slot: CallbackSlot<fn(u8)> = CallbackSlot::new();
        slot.register(Some(never_called as fn(u8)));
        let outcome = Dispatcher::new(ResourceKind::Keyboard, true).deliver(
            "test",
            &slot,
            || -> Result<u8> {
                Err(Error::MarshalSkipped {
                    reason: "bad payload".into(),
                })
            },
            |callback, value| callback(value),
        );
        assert_eq!(outcome, Delivery::Dropped);
    }
}
