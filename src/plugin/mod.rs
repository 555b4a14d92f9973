//! Plugin System Module
//!
//! Plugin contract, configuration resolution, registry and installation.
//! External code should go through [`api`].

pub(crate) mod error;
pub(crate) mod form;
pub(crate) mod initialization;
pub(crate) mod installer;
pub(crate) mod loader;
pub(crate) mod process;
pub(crate) mod registry;
pub(crate) mod store;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
mod tests;
