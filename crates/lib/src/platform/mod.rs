//! Filesystem locations used by the toolkit.

pub mod paths;
