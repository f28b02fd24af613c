//! Core systems for Tidewire.
//!
//! This crate provides the foundational pieces every other Tidewire crate
//! builds on:
//!
//! - **Signal/Slot System**: Type-safe event dispatch between components
//! - **Property System**: Values with change detection
//! - **Logging**: `tracing` target names and timing spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use tidewire_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
