//! A display model over one channel subscription.
#![warn(missing_docs)]

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use tidewire_core::logging::targets;
use tidewire_core::{ConnectionGuard, PerfSpan, Property, Signal};
use tidewire_net::streaming::{ChannelConnector, ErrorPayload, TransportFactory};

use crate::settings::{SettingsError, StreamingSettings};

/// Text state shared with the connector's slots.
struct DisplayState {
    error: Property<String>,
    payload: Property<String>,
    connection_on: Property<Option<bool>>,
    error_changed: Signal<String>,
    payload_changed: Signal<String>,
    connection_checked: Signal<bool>,
}

impl DisplayState {
    fn append_payload(&self, payload: &Value) {
        let rendered = payload.to_string();
        if let Some(text) = self.payload.update(|text| text.push_str(&rendered)) {
            self.payload_changed.emit(text);
        }
    }

    fn show_error(&self, error: &ErrorPayload) {
        let text = error.to_display_string();
        tracing::debug!(target: targets::WIDGET, error = %text, "showing error");
        if self.error.set(text.clone()) {
            self.error_changed.emit(text);
        }
    }

    fn clear(&self) {
        if self.payload.set(String::new()) {
            self.payload_changed.emit(String::new());
        }
        if self.error.set(String::new()) {
            self.error_changed.emit(String::new());
        }
    }
}

/// Holds the last-known payload and error text of a [`ChannelConnector`] and
/// drives its lifecycle on demand.
///
/// Every inbound message is appended to [`payload`](Self::payload) as compact
/// JSON; every error replaces [`error`](Self::error). Nothing else clears
/// either string except [`destroy`](Self::destroy).
///
/// # Signals
///
/// - `payload_changed(String)`: the accumulated payload text after a change
/// - `error_changed(String)`: the new error text
/// - `connection_checked(bool)`: the result of [`check_connection`](Self::check_connection)
///
/// The widget stops listening to the connector when dropped.
///
/// # Example
///
/// ```ignore
/// use tidewire::widget::SubscriberWidget;
///
/// let widget = SubscriberWidget::new(connector);
/// widget.payload_changed().connect(|text| println!("{text}"));
///
/// widget.mount();
/// // ... after an error:
/// widget.restart();
/// if widget.check_connection() {
///     widget.destroy();
/// }
/// ```
pub struct SubscriberWidget {
    connector: ChannelConnector,
    state: Arc<DisplayState>,
    _message_connection: ConnectionGuard<Value>,
    _error_connection: ConnectionGuard<ErrorPayload>,
}

impl SubscriberWidget {
    /// Wrap a connector. Nothing connects until [`mount`](Self::mount).
    pub fn new(connector: ChannelConnector) -> Self {
        let state = Arc::new(DisplayState {
            error: Property::default(),
            payload: Property::default(),
            connection_on: Property::new(None),
            error_changed: Signal::new(),
            payload_changed: Signal::new(),
            connection_checked: Signal::new(),
        });

        let on_message = state.clone();
        let message_connection = connector
            .message()
            .connect_scoped(move |payload| on_message.append_payload(payload));

        let on_error = state.clone();
        let error_connection = connector
            .error()
            .connect_scoped(move |error| on_error.show_error(error));

        Self {
            connector,
            state,
            _message_connection: message_connection,
            _error_connection: error_connection,
        }
    }

    /// Build the connector described by `settings` and wrap it.
    ///
    /// Mounts the widget when `settings.connect_on_create` is set, which
    /// needs a running Tokio runtime.
    pub fn from_settings(
        settings: &StreamingSettings,
        transports: Arc<dyn TransportFactory>,
    ) -> Result<Self, SettingsError> {
        let credentials = settings.credential_source()?;
        let connector =
            ChannelConnector::new(settings.connector.clone(), Arc::new(credentials), transports);
        let widget = Self::new(connector);
        if settings.connect_on_create {
            // Progress and failures arrive through the connector's signals.
            drop(widget.mount());
        }
        Ok(widget)
    }

    /// Start the subscription for a widget that has just been put on screen.
    pub fn mount(&self) -> JoinHandle<()> {
        tracing::debug!(target: targets::WIDGET, channel = self.connector.channel(), "mount");
        self.connector.connect()
    }

    /// Retry the subscription, typically after an error was shown.
    pub fn restart(&self) -> JoinHandle<()> {
        tracing::debug!(target: targets::WIDGET, channel = self.connector.channel(), "restart");
        self.connector.connect()
    }

    /// Tear the subscription down and clear the displayed text.
    pub fn destroy(&self) -> Option<JoinHandle<()>> {
        let _span = PerfSpan::new("widget_destroy");
        let teardown = self.connector.disconnect();
        self.state.clear();
        teardown
    }

    /// Ask the connector whether a subscription is held and remember the answer.
    pub fn check_connection(&self) -> bool {
        let connected = self.connector.is_connected();
        self.state.connection_on.set(Some(connected));
        self.state.connection_checked.emit(connected);
        connected
    }

    /// The current error text; empty when none has been shown.
    pub fn error(&self) -> String {
        self.state.error.get()
    }

    /// Whether an error is being shown.
    pub fn has_error(&self) -> bool {
        self.state.error.with(|text| !text.is_empty())
    }

    /// All payloads received since the last [`destroy`](Self::destroy).
    pub fn payload(&self) -> String {
        self.state.payload.get()
    }

    /// The result of the last [`check_connection`](Self::check_connection),
    /// `None` before the first check.
    pub fn connection_on(&self) -> Option<bool> {
        self.state.connection_on.get()
    }

    /// The wrapped connector.
    pub fn connector(&self) -> &ChannelConnector {
        &self.connector
    }

    /// Emitted with the new error text whenever it changes.
    pub fn error_changed(&self) -> &Signal<String> {
        &self.state.error_changed
    }

    /// Emitted with the whole accumulated payload text whenever it changes.
    pub fn payload_changed(&self) -> &Signal<String> {
        &self.state.payload_changed
    }

    /// Emitted with the answer of every [`check_connection`](Self::check_connection).
    pub fn connection_checked(&self) -> &Signal<bool> {
        &self.state.connection_checked
    }
}

impl std::fmt::Debug for SubscriberWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberWidget")
            .field("connector", &self.connector)
            .field("error", &self.state.error)
            .field("payload_len", &self.state.payload.with(String::len))
            .field("connection_on", &self.state.connection_on)
            .finish()
    }
}
