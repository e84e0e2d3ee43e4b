//! Built-in Plugin Implementations
//!
//! External-tool plugins that ship with the system. They register through
//! the `builtin!` macro and are discovered by the plugin registry.

pub mod api;
pub mod catalog;
pub mod external;
