//! Command line surface: arguments, configuration file, and listings

pub mod args;
pub mod config;
pub mod display;
