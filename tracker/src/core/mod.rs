//! Core tracker logic
//!
//! Pure registry with the clock passed in; no I/O.

pub mod registry;

pub use registry::ActivityRegistry;
