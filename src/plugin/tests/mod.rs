//! Test modules for the plugin system
//!
//! Cross-module suites for configuration resolution, registry lifecycle and
//! installation, plus the shared mocks in [`utils`].

pub(crate) mod utils;
