use std::sync::Arc;

use crate::Mutex;

pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

struct EventInner<T> {
    next_id: usize,
    handlers: Vec<(HandlerId, Handler<T>)>,
}

/// Synchronous broadcast to a list of handlers.
///
/// Handlers are invoked in subscription order, outside of the internal lock,
/// so a handler may subscribe or unsubscribe (itself included) while the
/// broadcast is running. Handlers removed mid-broadcast still receive the
/// value currently being emitted.
pub struct Event<T> {
    inner: Mutex<EventInner<T>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EventInner {
                next_id: 0,
                handlers: vec![],
            }),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> HandlerId {
        let mut inner = self.inner.lock();
        let id = HandlerId(inner.next_id);
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Returns false if the handler was already removed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut inner = self.inner.lock();
        let len = inner.handlers.len();
        inner.handlers.retain(|(hid, _)| *hid != id);
        inner.handlers.len() != len
    }

    pub fn emit(&self, value: &T) {
        let handlers: Vec<Handler<T>> = self
            .inner
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        for handler in handlers {
            handler(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().handlers.clear();
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event").field("handlers", &self.len()).finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::Event;
    use crate::Mutex;

    #[test]
    fn emit_reaches_handlers_in_order() {
        let event = Event::<u32>::new();
        let log = Arc::new(Mutex::new(vec![]));

        let l = log.clone();
        event.subscribe(move |v| l.lock().push(("a", *v)));
        let l = log.clone();
        event.subscribe(move |v| l.lock().push(("b", *v)));

        event.emit(&7);
        assert_eq!(*log.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let event = Event::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let id = event.subscribe(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        event.emit(&());
        assert!(event.unsubscribe(id));
        assert!(!event.unsubscribe(id));
        event.emit(&());

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(event.is_empty());
    }

    #[test]
    fn handler_can_unsubscribe_itself() {
        let event = Arc::new(Event::<()>::new());
        let slot = Arc::new(Mutex::new(None));

        let e = Arc::downgrade(&event);
        let s = slot.clone();
        let id = event.subscribe(move |_| {
            if let (Some(event), Some(id)) = (e.upgrade(), s.lock().take()) {
                event.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        event.emit(&());
        assert_eq!(event.len(), 0);
    }
}
