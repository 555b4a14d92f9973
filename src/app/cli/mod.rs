//! CLI module containing argument parsing and host configuration

pub mod args;
pub mod config;
