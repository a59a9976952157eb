#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! With the `tracing` feature enabled this module re-exports the
//! tracing macros; the engine emits all of its spans and events through
//! these re-exports, gated behind `#[cfg(feature = "tracing")]`, so the
//! diff stays allocation- and dependency-free when logging is compiled
//! out. Engine behavior never depends on whether logging is enabled.

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
