//! End-to-end tests driving the `depkit` binary against local git remotes
//! and a fake `cmake`.

#[cfg_attr(not(unix), allow(dead_code))]
mod common;

#[cfg(unix)]
mod build_tests;
#[cfg(unix)]
mod clean_tests;
#[cfg(unix)]
mod status_tests;
