//! Tidewire - streaming channel subscriptions with signal-based delivery.
//!
//! This is the umbrella crate that re-exports all public APIs and adds the
//! display-side pieces: the [`SubscriberWidget`](widget::SubscriberWidget)
//! and file-based [`settings`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tidewire::prelude::*;
//!
//! let settings = StreamingSettings::load("tidewire.toml")?.apply_env_overrides()?;
//! // Subscribes straight away unless the file sets `connect_on_create = false`.
//! let widget = SubscriberWidget::from_settings(&settings, Arc::new(MyCometdFactory::default()))?;
//!
//! widget.payload_changed().connect(|text| println!("payload: {text}"));
//! widget.error_changed().connect(|text| eprintln!("error: {text}"));
//!
//! // After an error has been shown:
//! widget.restart();
//! ```

pub use tidewire_core::*;

pub mod prelude;
pub mod settings;
pub mod widget;

/// Networking module: remote calls and the channel connector.
pub mod net {
    pub use tidewire_net::*;
}
