//! Scheduler behaviour tests
//!
//! Plugins here are scripted doubles built from [`helpers::MockSpec`]; no
//! external tools are involved.

mod helpers;
