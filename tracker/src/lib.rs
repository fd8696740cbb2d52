//! Peer activity tracker
//!
//! A small HTTP side-channel that remembers which peers have talked to the
//! controller and when they were last seen. Independent of the vehicle socket.

pub mod core;
pub mod error;
pub mod services;
pub mod state;
pub mod traits;
pub mod tracker_impl;
pub mod web;

// Re-export main types
pub use error::{TrackerError, TrackerResult};
pub use state::{TrackerConfig, TrackerState};
pub use tracker_impl::TrackerServer;

// Re-export trait definitions
pub use traits::ActivityTracker;

// Re-export service implementations
pub use services::RealActivityTracker;
