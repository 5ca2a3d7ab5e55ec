/// Default manifest file name, looked up in the current directory.
pub const CONFIG_FILENAME: &str = "depkit.toml";

/// Environment variable overriding the manifest location.
pub const CONFIG_ENV: &str = "DEPKIT_CONFIG";

/// Environment variable overriding the directory working trees are placed in.
pub const ROOT_ENV: &str = "DEPKIT_ROOT";

/// Marker written into a build directory after a successful configure step.
pub const CONFIGURE_MARKER: &str = ".depkit-configured";

/// Marker written into a build directory after a successful compile step.
pub const BUILD_COMPLETE_MARKER: &str = ".depkit-complete";

/// Prefix of per-build-type artifact directories inside a working tree.
pub const BUILD_DIR_PREFIX: &str = "build-";

/// Name of the remote a clone is created with.
pub const ORIGIN_REMOTE: &str = "origin";

/// Number of trailing output lines kept as diagnostics for a failed subprocess.
pub const DIAGNOSTIC_TAIL_LINES: usize = 60;
