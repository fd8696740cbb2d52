//! Service implementations
//!
//! Real implementations of all service traits for production use

pub mod activity_tracker;

// Re-export service implementations
pub use activity_tracker::RealActivityTracker;
