//! API for builtin plugin registration and discovery
//!
//! Builtin plugins use the `builtin!` macro to register a descriptor
//! constructor; the registry collects them at startup.

use crate::plugin::traits::PluginDescriptor;

/// Entry for a builtin plugin in the dynamic registry
pub struct BuiltinPluginEntry {
    pub descriptor: fn() -> PluginDescriptor,
}

inventory::collect!(BuiltinPluginEntry);

/// Macro for registering builtin plugins
#[macro_export]
macro_rules! builtin {
    ($descriptor_expr:expr) => {
        ::inventory::submit!($crate::plugin::builtin::api::BuiltinPluginEntry {
            descriptor: $descriptor_expr
        });
    };
}

/// Descriptors of every registered builtin plugin
pub fn builtin_descriptors() -> Vec<PluginDescriptor> {
    inventory::iter::<BuiltinPluginEntry>()
        .map(|entry| (entry.descriptor)())
        .collect()
}
