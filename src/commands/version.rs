//! Command: print version information.

/// The build version: `HOMEGEN_VERSION` at build time, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("HOMEGEN_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the homegen version to stdout.
pub fn run() {
    println!("homegen {}", version());
}
