use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;

/// Callback invoked for every raw message the host sends down.
///
/// `None` stands for an absent message (`event.data` of `undefined`).
pub type InboundHandler = Rc<dyn Fn(Option<&Value>)>;

/// The frame's generic cross-context message transport.
///
/// Delivery is fire-and-forget: a successful `post_to_parent` only means the
/// platform accepted the record, never that the host processed it. Records
/// posted from one call sequence arrive in send order.
pub trait FrameTransport {
    /// Deliver one structured record to the parent context.
    ///
    /// Returns [`TransportError::NoParent`](crate::TransportError::NoParent)
    /// when there is no parent to deliver to.
    fn post_to_parent(&self, message: &Value) -> Result<()>;

    /// Register the single inbound handler.
    fn attach(&self, handler: InboundHandler) -> Result<()>;

    /// Remove the inbound handler. Detaching with nothing attached is a no-op.
    fn detach(&self) -> Result<()>;

    /// Whether a parent context exists right now.
    fn has_parent(&self) -> bool;
}

/// The two alternative document-height probes used for auto-measured heights.
pub trait HeightProbe {
    /// Scroll height of the root element, if the platform exposes one.
    fn root_scroll_height(&self) -> Option<f64>;

    /// Scroll height of the body element, if the document has a body.
    fn body_scroll_height(&self) -> Option<f64>;
}

impl<P: HeightProbe + ?Sized> HeightProbe for &P {
    fn root_scroll_height(&self) -> Option<f64> {
        (**self).root_scroll_height()
    }

    fn body_scroll_height(&self) -> Option<f64> {
        (**self).body_scroll_height()
    }
}

impl<T: FrameTransport + ?Sized> FrameTransport for Rc<T> {
    fn post_to_parent(&self, message: &Value) -> Result<()> {
        (**self).post_to_parent(message)
    }

    fn attach(&self, handler: InboundHandler) -> Result<()> {
        (**self).attach(handler)
    }

    fn detach(&self) -> Result<()> {
        (**self).detach()
    }

    fn has_parent(&self) -> bool {
        (**self).has_parent()
    }
}
