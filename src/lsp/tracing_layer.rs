//! Tracing layer that forwards events to LSP window/logMessage.
//!
//! Events are dropped until the initialize handshake has completed, since the
//! client must not receive notifications before its initialize response.
//! The layer lives in the global subscriber for the rest of the process, so
//! its sender is released through [`LspLayerHandle::disconnect`] once the
//! server loop ends; otherwise the stdout writer thread would never finish.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use lsp_server::{Connection, Message, Notification};
use lsp_types::notification::{LogMessage, Notification as _};
use lsp_types::{LogMessageParams, MessageType, TraceValue};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::Layer;

/// A tracing layer that sends log messages to the LSP client.
pub struct LspLayer {
    state: Arc<ForwardState>,
}

struct ForwardState {
    sender: Mutex<Option<Sender<Message>>>,
    initialized: AtomicBool,
    muted: AtomicBool,
}

/// Handle to control an [`LspLayer`] after it has been installed.
#[derive(Clone)]
pub struct LspLayerHandle {
    state: Arc<ForwardState>,
}

impl LspLayerHandle {
    /// Mark the layer as initialized. Messages will now be sent.
    pub fn mark_initialized(&self) {
        self.state.initialized.store(true, Ordering::SeqCst);
    }

    /// Apply a `$/setTrace` value: `off` mutes forwarding, anything else resumes it.
    pub fn set_trace(&self, value: TraceValue) {
        let muted = matches!(value, TraceValue::Off);
        self.state.muted.store(muted, Ordering::SeqCst);
    }

    /// Drop the layer's sender. Events after this are discarded.
    pub fn disconnect(&self) {
        if let Ok(mut sender) = self.state.sender.lock() {
            sender.take();
        }
    }
}

impl ForwardState {
    fn forwarding(&self) -> bool {
        self.initialized.load(Ordering::SeqCst) && !self.muted.load(Ordering::SeqCst)
    }
}

impl LspLayer {
    /// Create a new LSP tracing layer and a handle to control it.
    pub fn new(connection: &Connection) -> (Self, LspLayerHandle) {
        let state = Arc::new(ForwardState {
            sender: Mutex::new(Some(connection.sender.clone())),
            initialized: AtomicBool::new(false),
            muted: AtomicBool::new(false),
        });

        let layer = Self {
            state: Arc::clone(&state),
        };

        let handle = LspLayerHandle { state };

        (layer, handle)
    }

    fn level_to_message_type(level: &Level) -> MessageType {
        match *level {
            Level::ERROR => MessageType::ERROR,
            Level::WARN => MessageType::WARNING,
            Level::INFO => MessageType::INFO,
            Level::DEBUG | Level::TRACE => MessageType::LOG,
        }
    }
}

impl<S: Subscriber> Layer<S> for LspLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if !self.state.forwarding() {
            return;
        }

        let metadata = event.metadata();
        let level = Self::level_to_message_type(metadata.level());

        // Collect the message and any structured fields
        struct MessageVisitor {
            message: String,
            fields: Vec<String>,
        }

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                } else {
                    self.fields.push(format!("{}={:?}", field.name(), value));
                }
            }

            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = value.to_string();
                } else {
                    self.fields.push(format!("{}={}", field.name(), value));
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);

        let mut message = if visitor.message.is_empty() {
            metadata.target().to_string()
        } else {
            visitor.message
        };
        if !visitor.fields.is_empty() {
            message.push(' ');
            message.push_str(&visitor.fields.join(" "));
        }

        let params = LogMessageParams {
            typ: level,
            message,
        };

        let notif = Notification::new(LogMessage::METHOD.to_string(), params);
        if let Ok(sender) = self.state.sender.lock() {
            if let Some(sender) = sender.as_ref() {
                let _ = sender.send(Message::Notification(notif));
            }
        }
    }

    fn enabled(
        &self,
        _metadata: &Metadata<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        true
    }
}
