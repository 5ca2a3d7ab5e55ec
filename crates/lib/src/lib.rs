//! depkit-lib: fetch and build pinned third-party native dependencies
//!
//! This crate provides the building blocks used by the `depkit` CLI:
//! - `vcs`: bring a git working tree to a pinned ref, idempotently
//! - `build`: configure and compile a working tree with CMake, or clean it
//! - `task`: one dependency, composed from a VCS and a build capability
//! - `toolkit`: the tasks described by a `depkit.toml` manifest

pub mod build;
pub mod config;
pub mod consts;
pub mod platform;
pub mod process;
pub mod task;
pub mod toolkit;
pub mod util;
pub mod vcs;
