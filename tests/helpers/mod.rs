//! Test helpers module
//!
//! Shared fixtures for the HostelFlow integration tests: a seeded in-memory
//! hostel, form builders and the optional PostgreSQL database.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
