use std::cell::Cell;
use std::rc::Rc;

use framelink_protocol::{
    classify_inbound, encode_outbound, requested_height, resolve_height, OutboundMessage,
    RENDER_EVENT,
};
use framelink_transport::{FrameTransport, HeightProbe, InboundHandler, TransportError};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::{ChannelConfig, Diagnostic};
use crate::error::{ChannelError, Result};
use crate::events::EventStream;

/// The component's end of the frame link.
///
/// Owns the single inbound handler on the transport for its whole lifetime.
/// Inbound messages are filtered down to render events and dispatched on
/// [`events`](Self::events); outbound notifications are stamped and posted
/// to the parent.
pub struct MessageChannel<T: FrameTransport, P: HeightProbe> {
    transport: T,
    probe: P,
    events: EventStream,
    config: ChannelConfig,
    last_height: Cell<Option<u32>>,
}

impl<T: FrameTransport, P: HeightProbe> MessageChannel<T, P> {
    /// Attach to `transport` with default config.
    pub fn init(transport: T, probe: P) -> Result<Self> {
        Self::init_with_config(transport, probe, ChannelConfig::default())
    }

    /// Attach to `transport` with explicit config.
    ///
    /// Fails if the transport already has an inbound handler.
    pub fn init_with_config(transport: T, probe: P, config: ChannelConfig) -> Result<Self> {
        let events = EventStream::new();
        transport.attach(inbound_handler(events.clone()))?;
        debug!(
            has_parent = transport.has_parent(),
            dedupe_frame_height = config.dedupe_frame_height,
            "message channel initialized"
        );

        Ok(Self {
            transport,
            probe,
            events,
            config,
            last_height: Cell::new(None),
        })
    }

    /// Tell the host the component is ready to receive render events.
    pub fn announce_ready(&self) {
        self.send(&OutboundMessage::ready());
    }

    /// Ask the host to resize the frame.
    ///
    /// `Some(h)` with a finite `h > 0` is sent as is (rounded up). Anything
    /// else measures the document; if that yields no positive height nothing
    /// is sent.
    pub fn report_height(&self, height: Option<f64>) {
        let Some(height) = resolve_height(height, &self.probe) else {
            debug!("frame height not measurable, nothing sent");
            self.diagnose(Diagnostic::NoMeasurableHeight);
            return;
        };

        if self.config.dedupe_frame_height && self.last_height.get() == Some(height) {
            trace!(height, "frame height unchanged, not re-sent");
            return;
        }

        if self.send(&OutboundMessage::frame_height(height)) {
            self.last_height.set(Some(height));
        }
    }

    /// [`report_height`](Self::report_height) for a dynamically typed
    /// argument; non-numbers measure the document.
    pub fn report_height_value(&self, height: &Value) {
        self.report_height(requested_height(height));
    }

    /// Deliver the component's output value to the host, unvalidated.
    pub fn emit_value(&self, value: Value) {
        self.send(&OutboundMessage::component_value(value));
    }

    /// Encode and post one message, surfacing failures.
    pub fn post(&self, message: &OutboundMessage) -> Result<()> {
        let record = encode_outbound(message)?;
        trace!(message_type = %message.kind(), "posting to parent");
        self.transport.post_to_parent(&record)?;
        Ok(())
    }

    /// The render event stream.
    pub fn events(&self) -> &EventStream {
        &self.events
    }

    /// Event name render listeners subscribe to.
    pub fn render_event(&self) -> &'static str {
        RENDER_EVENT
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Release the inbound handler and every listener on [`events`](Self::events).
    ///
    /// Later host messages are not dispatched and open `RenderEvents` streams
    /// end. May be called from inside a render listener. Dropping the channel
    /// does the same without reporting errors.
    pub fn dispose(self) -> Result<()> {
        self.transport.detach()?;
        debug!("message channel disposed");
        Ok(())
    }

    fn send(&self, message: &OutboundMessage) -> bool {
        let message_type = message.kind().as_str();
        match self.post(message) {
            Ok(()) => true,
            Err(ChannelError::Transport(TransportError::NoParent)) => {
                debug!(message_type, "no parent frame, message discarded");
                self.diagnose(Diagnostic::NoParent { message_type });
                false
            }
            Err(err) => {
                debug!(message_type, error = %err, "message not sent");
                self.diagnose(Diagnostic::SendFailed {
                    message_type,
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    fn diagnose(&self, diagnostic: Diagnostic) {
        if let Some(hook) = &self.config.diagnostics {
            hook(&diagnostic);
        }
    }
}

impl<T: FrameTransport, P: HeightProbe> Drop for MessageChannel<T, P> {
    fn drop(&mut self) {
        let _ = self.transport.detach();
        self.events.clear();
    }
}

impl<T: FrameTransport, P: HeightProbe> std::fmt::Debug for MessageChannel<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("events", &self.events)
            .field("config", &self.config)
            .field("last_height", &self.last_height.get())
            .finish()
    }
}

fn inbound_handler(events: EventStream) -> InboundHandler {
    // Anything that is not a render event is dropped without a trace.
    Rc::new(move |raw: Option<&Value>| {
        if let Some(event) = classify_inbound(raw) {
            events.dispatch(RENDER_EVENT, &event);
        }
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use framelink_transport::{FixedHeightProbe, MemoryTransport};
    use serde_json::json;

    use super::*;

    const PROBE: FixedHeightProbe = FixedHeightProbe {
        root: Some(300.0),
        body: Some(280.0),
    };

    #[test]
    fn init_rejects_second_channel_on_same_transport() {
        let transport = MemoryTransport::new();
        let _first = MessageChannel::init(transport.clone(), PROBE).unwrap();
        assert!(matches!(
            MessageChannel::init(transport.clone(), PROBE),
            Err(ChannelError::Transport(TransportError::AlreadyAttached))
        ));
    }

    #[test]
    fn dispose_detaches_handler() {
        let transport = MemoryTransport::new();
        let channel = MessageChannel::init(transport.clone(), PROBE).unwrap();
        assert!(transport.is_attached());

        channel.dispose().unwrap();
        assert!(!transport.is_attached());
        assert!(!transport.deliver(Some(&json!({"type": RENDER_EVENT}))));
    }

    #[test]
    fn drop_detaches_handler() {
        let transport = MemoryTransport::new();
        drop(MessageChannel::init(transport.clone(), PROBE).unwrap());
        assert!(!transport.is_attached());
    }

    #[test]
    fn dedupe_skips_unchanged_height() {
        let transport = MemoryTransport::new();
        let config = ChannelConfig {
            dedupe_frame_height: true,
            ..ChannelConfig::default()
        };
        let channel = MessageChannel::init_with_config(transport.clone(), PROBE, config).unwrap();

        channel.report_height(Some(150.0));
        channel.report_height(Some(150.0));
        channel.report_height(Some(151.0));
        channel.report_height(None);

        let heights: Vec<Value> = transport
            .sent()
            .iter()
            .map(|record| record["height"].clone())
            .collect();
        assert_eq!(heights, vec![json!(150), json!(151), json!(300)]);
    }

    #[test]
    fn unchanged_height_is_resent_by_default() {
        let transport = MemoryTransport::new();
        let channel = MessageChannel::init(transport.clone(), PROBE).unwrap();
        channel.report_height(Some(150.0));
        channel.report_height(Some(150.0));
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn diagnostics_report_swallowed_conditions() {
        let transport = MemoryTransport::detached();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let config = ChannelConfig::with_diagnostics(move |d| sink.borrow_mut().push(d.clone()));
        let channel = MessageChannel::init_with_config(
            transport.clone(),
            FixedHeightProbe::default(),
            config,
        )
        .unwrap();

        channel.announce_ready();
        channel.report_height(None);
        channel.report_height(Some(40.0));

        assert_eq!(
            *seen.borrow(),
            vec![
                Diagnostic::NoParent {
                    message_type: "componentReady"
                },
                Diagnostic::NoMeasurableHeight,
                Diagnostic::NoParent {
                    message_type: "setFrameHeight"
                },
            ]
        );
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn post_surfaces_missing_parent() {
        let channel =
            MessageChannel::init(MemoryTransport::detached(), FixedHeightProbe::default()).unwrap();
        assert!(matches!(
            channel.post(&OutboundMessage::ready()),
            Err(ChannelError::Transport(TransportError::NoParent))
        ));
    }

    #[test]
    fn render_event_name() {
        let channel = MessageChannel::init(MemoryTransport::new(), PROBE).unwrap();
        assert_eq!(channel.render_event(), "streamlit:render");
    }
}
