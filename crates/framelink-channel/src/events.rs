//! Local publish/subscribe point for accepted inbound messages.

use std::cell::RefCell;
use std::rc::Rc;

use framelink_protocol::{RenderEvent, RENDER_EVENT};

type Listener = Rc<dyn Fn(&RenderEvent)>;

/// Handle returned by [`EventStream::add_event_listener`], used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    event_type: String,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Listener registry for render events.
///
/// Clones share one registry. Listeners run synchronously, in registration
/// order, on the thread that dispatches. Nothing is retained between
/// dispatches: a listener added after an event never sees it.
#[derive(Clone, Default)]
pub struct EventStream {
    inner: Rc<RefCell<Registry>>,
}

impl EventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events named `event_type`.
    pub fn add_event_listener(
        &self,
        event_type: impl Into<String>,
        listener: impl Fn(&RenderEvent) + 'static,
    ) -> ListenerId {
        let mut registry = self.inner.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.registrations.push(Registration {
            id,
            event_type: event_type.into(),
            listener: Rc::new(listener),
        });
        id
    }

    /// Shorthand for listening to [`RENDER_EVENT`].
    pub fn on_render(&self, listener: impl Fn(&RenderEvent) + 'static) -> ListenerId {
        self.add_event_listener(RENDER_EVENT, listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.inner.borrow_mut();
        let before = registry.registrations.len();
        registry.registrations.retain(|r| r.id != id);
        registry.registrations.len() != before
    }

    /// Remove every listener; returns how many were removed.
    pub fn clear(&self) -> usize {
        // Listeners are dropped after the registry borrow ends.
        let removed = std::mem::take(&mut self.inner.borrow_mut().registrations);
        removed.len()
    }

    /// Invoke every listener registered for `event_type`; returns how many ran.
    ///
    /// Listeners may add or remove listeners while running. Additions take
    /// effect from the next dispatch; a listener removed mid-dispatch is not
    /// invoked afterwards.
    pub fn dispatch(&self, event_type: &str, event: &RenderEvent) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .borrow()
            .registrations
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(|r| (r.id, r.listener.clone()))
            .collect();

        let mut invoked = 0;
        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            listener(event);
            invoked += 1;
        }
        invoked
    }

    /// Number of registered listeners across all event types.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().registrations.len()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .registrations
            .iter()
            .any(|r| r.id == id)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
