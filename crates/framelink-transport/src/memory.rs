use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{FrameTransport, HeightProbe, InboundHandler};

/// In-process transport that records outbound messages and lets callers play
/// the host's part by delivering inbound messages.
///
/// Clones share state, so a test can keep one handle while a channel owns
/// another.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Rc<RefCell<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    detached_from_parent: bool,
    sent: Vec<Value>,
    handler: Option<InboundHandler>,
}

impl MemoryTransport {
    /// Create a transport embedded in a parent context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with no parent context; every post fails with
    /// [`TransportError::NoParent`].
    pub fn detached() -> Self {
        let transport = Self::default();
        transport.inner.borrow_mut().detached_from_parent = true;
        transport
    }

    /// Messages posted to the parent so far, in send order.
    pub fn sent(&self) -> Vec<Value> {
        self.inner.borrow().sent.clone()
    }

    /// Drain the recorded outbound messages.
    pub fn take_sent(&self) -> Vec<Value> {
        std::mem::take(&mut self.inner.borrow_mut().sent)
    }

    /// Whether an inbound handler is currently attached.
    pub fn is_attached(&self) -> bool {
        self.inner.borrow().handler.is_some()
    }

    /// Deliver a raw message as the host would.
    ///
    /// Returns `false` when no handler is attached; the message is dropped,
    /// never queued for a later attach.
    pub fn deliver(&self, raw: Option<&Value>) -> bool {
        // Release the borrow before calling out: the handler may post replies.
        let handler = self.inner.borrow().handler.clone();
        match handler {
            Some(handler) => {
                handler(raw);
                true
            }
            None => false,
        }
    }
}

impl FrameTransport for MemoryTransport {
    fn post_to_parent(&self, message: &Value) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        if state.detached_from_parent {
            return Err(TransportError::NoParent);
        }
        state.sent.push(message.clone());
        Ok(())
    }

    fn attach(&self, handler: InboundHandler) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        if state.handler.is_some() {
            return Err(TransportError::AlreadyAttached);
        }
        state.handler = Some(handler);
        debug!("memory transport handler attached");
        Ok(())
    }

    fn detach(&self) -> Result<()> {
        if self.inner.borrow_mut().handler.take().is_some() {
            debug!("memory transport handler detached");
        }
        Ok(())
    }

    fn has_parent(&self) -> bool {
        !self.inner.borrow().detached_from_parent
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("MemoryTransport")
            .field("has_parent", &!state.detached_from_parent)
            .field("sent", &state.sent.len())
            .field("attached", &state.handler.is_some())
            .finish()
    }
}

/// Height probe returning fixed measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedHeightProbe {
    /// Value reported for the root element probe.
    pub root: Option<f64>,
    /// Value reported for the body probe.
    pub body: Option<f64>,
}

impl FixedHeightProbe {
    pub fn new(root: Option<f64>, body: Option<f64>) -> Self {
        Self { root, body }
    }
}

impl HeightProbe for FixedHeightProbe {
    fn root_scroll_height(&self) -> Option<f64> {
        self.root
    }

    fn body_scroll_height(&self) -> Option<f64> {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;

    #[test]
    fn records_posts_in_order() {
        let transport = MemoryTransport::new();
        transport.post_to_parent(&json!({"n": 1})).unwrap();
        transport.post_to_parent(&json!({"n": 2})).unwrap();

        assert_eq!(transport.sent(), vec![json!({"n": 1}), json!({"n": 2})]);
        assert_eq!(transport.take_sent().len(), 2);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn detached_transport_reports_no_parent() {
        let transport = MemoryTransport::detached();
        assert!(!transport.has_parent());
        assert!(matches!(
            transport.post_to_parent(&json!({})),
            Err(TransportError::NoParent)
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn second_attach_is_rejected() {
        let transport = MemoryTransport::new();
        transport.attach(Rc::new(|_: Option<&Value>| {})).unwrap();
        assert!(matches!(
            transport.attach(Rc::new(|_: Option<&Value>| {})),
            Err(TransportError::AlreadyAttached)
        ));

        transport.detach().unwrap();
        transport.detach().unwrap();
        assert!(transport.attach(Rc::new(|_: Option<&Value>| {})).is_ok());
    }

    #[test]
    fn deliver_without_handler_drops_message() {
        let transport = MemoryTransport::new();
        assert!(!transport.deliver(Some(&json!({"type": "streamlit:render"}))));

        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        transport
            .attach(Rc::new(move |_: Option<&Value>| counter.set(counter.get() + 1)))
            .unwrap();

        assert_eq!(seen.get(), 0);
        assert!(transport.deliver(None));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn handler_may_post_while_handling() {
        let transport = MemoryTransport::new();
        let replier = transport.clone();
        transport
            .attach(Rc::new(move |_: Option<&Value>| {
                replier.post_to_parent(&json!({"reply": true})).unwrap();
            }))
            .unwrap();

        transport.deliver(None);
        assert_eq!(transport.sent(), vec![json!({"reply": true})]);
    }

    #[test]
    fn fixed_probe_reports_configured_values() {
        let probe = FixedHeightProbe::new(Some(120.0), None);
        assert_eq!(probe.root_scroll_height(), Some(120.0));
        assert_eq!(probe.body_scroll_height(), None);
        assert_eq!((&probe).root_scroll_height(), Some(120.0));
    }
}
