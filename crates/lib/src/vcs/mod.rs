//! Source acquisition.
//!
//! A [`VcsCheckout`] turns a [`SourceLocator`] into a [`WorkingTree`] sitting
//! at exactly the pinned ref. Implementations keep no state between calls and
//! re-derive everything from the filesystem.

pub mod git;
mod types;

use std::path::PathBuf;

use crate::process::RunContext;

pub use git::GitCheckout;
pub use types::{SourceLocator, VcsError, VcsOperation, WorkingTree};

/// Capability to acquire and inspect a checkout.
#[allow(async_fn_in_trait)]
pub trait VcsCheckout {
  /// Directory the locator's working tree lives in.
  fn tree_path(&self, locator: &SourceLocator) -> PathBuf;

  /// Observe the working tree without touching the network or the filesystem.
  fn inspect(&self, locator: &SourceLocator) -> Result<WorkingTree, VcsError>;

  /// Make sure the working tree exists and sits at the pinned ref.
  ///
  /// Clones when the directory is absent, otherwise fetches and force-checks-out
  /// the pinned ref. Calling this repeatedly converges on the same state.
  async fn ensure(&self, locator: &SourceLocator, ctx: &RunContext) -> Result<WorkingTree, VcsError>;
}
