//! Plugin System Module
//!
//! Every scanner the orchestrator can run is a plugin: a named, classified
//! unit of work with declared dependencies on other plugins. Builtin plugins
//! wrap external command-line tools; callers can register their own.

// Internal modules - all access should go through api module
pub(crate) mod builtin;
pub(crate) mod dependency;
pub(crate) mod error;
pub(crate) mod registry;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;
