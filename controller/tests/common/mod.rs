//! Shared scaffolding for controller integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;
