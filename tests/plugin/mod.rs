//! Plugin Integration Test Modules

pub mod installer;
pub mod registry;
