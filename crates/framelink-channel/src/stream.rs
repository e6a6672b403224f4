//! Render events as an async stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use framelink_protocol::RenderEvent;
use futures_core::Stream;
use tokio::sync::mpsc;

use crate::events::{EventStream, ListenerId};

/// Stream of render events dispatched after it was created.
///
/// Dropping the stream removes its listener. Events dispatched before
/// creation are not replayed. The stream ends once its listener is gone,
/// which happens when the owning channel is disposed or dropped.
pub struct RenderEvents {
    receiver: mpsc::UnboundedReceiver<RenderEvent>,
    events: EventStream,
    listener: ListenerId,
}

impl EventStream {
    /// Subscribe to render events as a [`Stream`].
    pub fn render_events(&self) -> RenderEvents {
        let (sender, receiver) = mpsc::unbounded_channel();
        let listener = self.on_render(move |event| {
            // Receiver gone means the stream is being dropped.
            let _ = sender.send(event.clone());
        });
        RenderEvents {
            receiver,
            events: self.clone(),
            listener,
        }
    }
}

impl Stream for RenderEvents {
    type Item = RenderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for RenderEvents {
    fn drop(&mut self) {
        self.events.remove_event_listener(self.listener);
    }
}

impl std::fmt::Debug for RenderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEvents")
            .field("listener", &self.listener)
            .finish()
    }
}
