//! Service tests for the controller
//!
//! Real services exercised against local sockets, temp dirs and mocks. The
//! socket connector is covered from `tests/websocket_connector.rs` where the
//! fake vehicle lives.

pub mod endpoint_store;
