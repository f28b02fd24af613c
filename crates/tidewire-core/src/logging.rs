//! Logging facilities for Tidewire.
//!
//! Tidewire uses the `tracing` crate for instrumentation. Library crates never
//! install a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(EnvFilter::new("tidewire_net::streaming=debug"))
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! The constants in [`targets`] name every subsystem's target so filters can
//! be built without hard-coding strings.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "tidewire_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "tidewire_core::signal";
    /// Performance spans target.
    pub const PERF: &str = "tidewire::perf";
    /// HTTP plumbing target.
    pub const HTTP: &str = "tidewire_net::http";
    /// Channel connector target (handshake, subscribe, relay, teardown).
    pub const STREAMING: &str = "tidewire_net::streaming";
    /// Widget target.
    pub const WIDGET: &str = "tidewire::widget";
    /// Settings loading target.
    pub const SETTINGS: &str = "tidewire::settings";
}

/// The span behind [`PerfSpan`], unentered.
///
/// Async code attaches it with `tracing::Instrument` since an entered span
/// cannot be held across `.await` in a spawned task.
pub fn perf_span(name: &'static str) -> tracing::Span {
    tracing::info_span!(target: "tidewire::perf", "perf", operation = name)
}

/// A guard that times an operation through a `tracing` span.
///
/// The span is entered on creation and exited when the guard is dropped, so
/// subscribers with span timing (e.g. `fmt().with_span_events(CLOSE)`) report
/// the elapsed time.
///
/// ```
/// use tidewire_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("connect");
///     // ... timed work ...
/// }
/// ```
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        Self {
            _span: perf_span(name).entered(),
        }
    }
}

impl std::fmt::Debug for PerfSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfSpan").finish_non_exhaustive()
    }
}
