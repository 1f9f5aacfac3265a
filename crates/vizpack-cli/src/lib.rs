//! vizpack library - build preparation for custom visual projects
//!
//! Modules are exposed for the binary and for integration tests.

pub mod api;
pub mod bundler;
pub mod commands;
pub mod common;
pub mod dev_server;
pub mod entry;
pub mod errors;
pub mod folders;
pub mod legacy;
pub mod options;
pub mod pipeline;
pub mod plugin_config;

pub use common::GlobalOpts;
