use std::rc::Rc;

/// Callback receiving conditions the channel otherwise swallows.
pub type DiagnosticHook = Rc<dyn Fn(&Diagnostic)>;

/// A swallowed outbound failure or a skipped send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The frame has no parent context; the message was discarded.
    NoParent { message_type: &'static str },
    /// The transport or encoder rejected the message.
    SendFailed {
        message_type: &'static str,
        reason: String,
    },
    /// Neither height probe produced a positive measurement; nothing was sent.
    NoMeasurableHeight,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::NoParent { message_type } => {
                write!(f, "{message_type} discarded: no parent frame")
            }
            Diagnostic::SendFailed {
                message_type,
                reason,
            } => write!(f, "{message_type} not sent: {reason}"),
            Diagnostic::NoMeasurableHeight => f.write_str("frame height not measurable"),
        }
    }
}

/// Behavior knobs for a [`MessageChannel`](crate::MessageChannel).
#[derive(Clone, Default)]
pub struct ChannelConfig {
    /// Skip `setFrameHeight` when the height equals the last one sent.
    pub dedupe_frame_height: bool,
    /// Receives diagnostics; `None` keeps the channel silent.
    pub diagnostics: Option<DiagnosticHook>,
}

impl ChannelConfig {
    /// Config with a diagnostics hook installed.
    pub fn with_diagnostics(hook: impl Fn(&Diagnostic) + 'static) -> Self {
        Self {
            diagnostics: Some(Rc::new(hook)),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("dedupe_frame_height", &self.dedupe_frame_height)
            .field("diagnostics", &self.diagnostics.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn default_is_silent_and_sends_every_height() {
        let config = ChannelConfig::default();
        assert!(!config.dedupe_frame_height);
        assert!(config.diagnostics.is_none());
    }

    #[test]
    fn debug_hides_hook() {
        let config = ChannelConfig::with_diagnostics(|_| {});
        let debug = format!("{config:?}");
        assert!(debug.contains("<hook>"));
        assert!(debug.contains("dedupe_frame_height: false"));
    }

    #[test]
    fn hook_receives_diagnostics() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let config = ChannelConfig::with_diagnostics(move |d| sink.borrow_mut().push(d.clone()));

        if let Some(hook) = &config.diagnostics {
            hook(&Diagnostic::NoMeasurableHeight);
        }
        assert_eq!(*seen.borrow(), vec![Diagnostic::NoMeasurableHeight]);
    }

    #[test]
    fn diagnostics_render_readably() {
        let d = Diagnostic::NoParent {
            message_type: "componentReady",
        };
        assert_eq!(d.to_string(), "componentReady discarded: no parent frame");
    }
}
