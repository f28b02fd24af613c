//! Display-side consumers of a channel connector.

mod subscriber;

pub use subscriber::SubscriberWidget;
