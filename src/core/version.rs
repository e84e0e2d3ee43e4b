//! Build metadata from the build script, shared by the CLI and the startup log.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version from Cargo metadata
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Multi-line version text for `--version`
pub fn long_version() -> String {
    format!(
        "{}\nbuilt:  {}\ncommit: {}",
        version(),
        build_time(),
        git_hash()
    )
}
