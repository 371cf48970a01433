//! Observer registry for lifecycle notifications.
//!
//! Listeners are plain closures registered per owner (one registry per
//! agent). The owner clears the registry when it is disposed, so no listener
//! outlives the agent that produced its events.

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Boxed event listener.
pub type Listener<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered set of listeners for one event type.
pub struct Observers<E> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<E>)>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener. Listeners are notified in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn notify(&mut self, event: &E) {
        if self.listeners.is_empty() {
            tracing::trace!("no listeners for event");
            return;
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> core::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn notifies_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::<u32>::new();

        let first = Arc::clone(&seen);
        observers.subscribe(move |e| first.lock().unwrap().push(("a", *e)));
        let second = Arc::clone(&seen);
        observers.subscribe(move |e| second.lock().unwrap().push(("b", *e)));

        observers.notify(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_and_clear() {
        let count = Arc::new(Mutex::new(0));
        let mut observers = Observers::<()>::new();
        let c = Arc::clone(&count);
        let id = observers.subscribe(move |_| *c.lock().unwrap() += 1);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&());
        assert_eq!(*count.lock().unwrap(), 0);

        observers.subscribe(|_| {});
        observers.clear();
        assert!(observers.is_empty());
    }
}
