//! Git-backed checkouts.
//!
//! Mutating operations (clone, fetch, checkout) shell out to the `git` CLI so
//! they can be timed out and killed like any other tool. Read-only inspection
//! (is this a repository, where does `origin` point, what is HEAD, what does
//! a ref resolve to) is done in-process with `gix`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::consts::ORIGIN_REMOTE;
use crate::process::{self, Invocation, ProcessError, RunContext};
use crate::vcs::{SourceLocator, VcsCheckout, VcsError, VcsOperation, WorkingTree};

/// Checks out sources below a root directory using git.
#[derive(Debug, Clone)]
pub struct GitCheckout {
  program: String,
  root: PathBuf,
}

/// What is found at a working tree path.
#[derive(Debug)]
enum Observed {
  /// Nothing there yet (or an empty directory), a clone is needed.
  Absent,
  /// A repository cloned from the expected remote.
  Repository { head: Option<String> },
}

impl GitCheckout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      program: "git".to_string(),
      root: root.into(),
    }
  }

  /// Use a specific git executable instead of the one on `PATH`.
  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn observe(&self, path: &Path, locator: &SourceLocator) -> Result<Observed, VcsError> {
    if !path.exists() {
      return Ok(Observed::Absent);
    }

    if !path.is_dir() {
      return Err(corrupt(path, "path exists but is not a directory"));
    }

    let mut entries = std::fs::read_dir(path).map_err(|source| VcsError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    if entries.next().is_none() {
      return Ok(Observed::Absent);
    }

    if !path.join(".git").exists() {
      return Err(corrupt(path, "directory is not a git working tree"));
    }

    let repo = gix::open(path).map_err(|e| corrupt(path, &format!("failed to open repository: {e}")))?;

    let origin_key = format!("remote.{ORIGIN_REMOTE}.url");
    let configured = repo
      .config_snapshot()
      .string(origin_key.as_str())
      .map(|url| url.to_string())
      .ok_or_else(|| corrupt(path, &format!("no '{ORIGIN_REMOTE}' remote configured")))?;

    if !same_remote(&configured, locator.repository_uri()) {
      return Err(corrupt(
        path,
        &format!(
          "checkout belongs to '{}', expected '{}'",
          configured,
          locator.repository_uri()
        ),
      ));
    }

    let head = repo.head_id().ok().map(|id| id.detach().to_string());
    Ok(Observed::Repository { head })
  }

  async fn clone_repo(&self, locator: &SourceLocator, path: &Path, ctx: &RunContext) -> Result<(), VcsError> {
    info!(uri = locator.repository_uri(), path = %path.display(), "cloning repository");

    std::fs::create_dir_all(&self.root).map_err(|source| VcsError::Io {
      path: self.root.clone(),
      source,
    })?;

    let invocation = Invocation::new(&self.program)
      .args(["clone", "--no-checkout", "--origin", ORIGIN_REMOTE])
      .arg(locator.repository_uri())
      .path_arg(path);

    process::run(&invocation, ctx)
      .await
      .map_err(|e| self.translate(VcsOperation::Clone, locator, path, e))?;
    Ok(())
  }

  async fn fetch(&self, locator: &SourceLocator, path: &Path, ctx: &RunContext) -> Result<(), VcsError> {
    info!(uri = locator.repository_uri(), path = %path.display(), "fetching updates");

    let invocation = Invocation::new(&self.program)
      .args(["fetch", "--force", "--tags", ORIGIN_REMOTE])
      .current_dir(path);

    process::run(&invocation, ctx)
      .await
      .map_err(|e| self.translate(VcsOperation::Fetch, locator, path, e))?;
    Ok(())
  }

  async fn checkout(
    &self,
    locator: &SourceLocator,
    path: &Path,
    commit: &str,
    ctx: &RunContext,
  ) -> Result<(), VcsError> {
    info!(reference = locator.pinned_ref(), commit, "checking out pinned ref");

    let invocation = Invocation::new(&self.program)
      .args(["-c", "advice.detachedHead=false", "checkout", "--force", "--detach"])
      .arg(commit)
      .current_dir(path);

    process::run(&invocation, ctx)
      .await
      .map_err(|e| self.translate(VcsOperation::Checkout, locator, path, e))?;
    Ok(())
  }

  fn translate(&self, operation: VcsOperation, locator: &SourceLocator, path: &Path, err: ProcessError) -> VcsError {
    match err {
      ProcessError::TimedOut { after, .. } => corrupt(
        path,
        &format!(
          "git {operation} timed out after {}s, the checkout may be incomplete",
          after.as_secs()
        ),
      ),
      ProcessError::Cancelled { .. } => VcsError::Cancelled { operation },
      other => VcsError::CommandFailed {
        operation,
        uri: locator.repository_uri().to_string(),
        diagnostics: other.diagnostics(),
      },
    }
  }
}

impl VcsCheckout for GitCheckout {
  fn tree_path(&self, locator: &SourceLocator) -> PathBuf {
    self.root.join(locator.local_directory_name())
  }

  fn inspect(&self, locator: &SourceLocator) -> Result<WorkingTree, VcsError> {
    let path = self.tree_path(locator);
    let observed = self.observe(&path, locator)?;
    Ok(match observed {
      Observed::Absent => WorkingTree {
        exists: path.is_dir(),
        path,
        current_ref: None,
      },
      Observed::Repository { head } => WorkingTree {
        path,
        exists: true,
        current_ref: head,
      },
    })
  }

  async fn ensure(&self, locator: &SourceLocator, ctx: &RunContext) -> Result<WorkingTree, VcsError> {
    let path = self.tree_path(locator);

    match self.observe(&path, locator)? {
      Observed::Absent => self.clone_repo(locator, &path, ctx).await?,
      Observed::Repository { head } => {
        let pinned = resolve_immutable(&path, locator.pinned_ref());
        if head.is_some() && head == pinned {
          debug!(
            path = %path.display(),
            reference = locator.pinned_ref(),
            "HEAD already at pinned ref, skipping fetch"
          );
        } else {
          self.fetch(locator, &path, ctx).await?;
        }
      }
    }

    let commit = resolve_pinned(&path, locator.pinned_ref()).ok_or_else(|| VcsError::RefNotFound {
      uri: locator.repository_uri().to_string(),
      reference: locator.pinned_ref().to_string(),
    })?;

    // Runs even when HEAD is already pinned: HEAD says nothing about the index
    // or the files on disk after an interrupted clone or local edits.
    self.checkout(locator, &path, &commit, ctx).await?;

    let head = read_head(&path)?;
    if head.as_deref() != Some(commit.as_str()) {
      warn!(path = %path.display(), expected = %commit, actual = ?head, "HEAD did not move to pinned ref");
      return Err(corrupt(
        &path,
        &format!("HEAD is at {head:?} after checking out {commit}"),
      ));
    }

    Ok(WorkingTree {
      path,
      exists: true,
      current_ref: Some(commit),
    })
  }
}

fn corrupt(path: &Path, reason: &str) -> VcsError {
  VcsError::CorruptWorkingTree {
    path: path.to_path_buf(),
    reason: reason.to_string(),
  }
}

fn read_head(path: &Path) -> Result<Option<String>, VcsError> {
  let repo = gix::open(path).map_err(|e| corrupt(path, &format!("failed to open repository: {e}")))?;
  Ok(repo.head_id().ok().map(|id| id.detach().to_string()))
}

/// Peel a revision spec to the commit it names.
fn peel_to_commit(repo: &gix::Repository, spec: &str) -> Option<String> {
  let spec = format!("{spec}^{{commit}}");
  repo
    .rev_parse_single(spec.as_str())
    .ok()
    .map(|id| id.detach().to_string())
}

/// Resolve a ref that cannot move without re-tagging: a tag or a full commit id.
///
/// Branches are never resolved here, they always require a fetch.
fn resolve_immutable(path: &Path, reference: &str) -> Option<String> {
  let repo = gix::open(path).ok()?;
  if let Some(commit) = peel_to_commit(&repo, &format!("refs/tags/{reference}")) {
    return Some(commit);
  }
  if is_full_commit_id(reference) {
    return peel_to_commit(&repo, reference);
  }
  None
}

/// Resolve the pinned ref after a clone or fetch.
///
/// Tags win over remote-tracking branches, which win over anything else git
/// can parse (commit ids, abbreviated ids).
fn resolve_pinned(path: &Path, reference: &str) -> Option<String> {
  let repo = gix::open(path).ok()?;
  [
    format!("refs/tags/{reference}"),
    format!("refs/remotes/{ORIGIN_REMOTE}/{reference}"),
    reference.to_string(),
  ]
  .iter()
  .find_map(|spec| peel_to_commit(&repo, spec))
}

fn is_full_commit_id(reference: &str) -> bool {
  matches!(reference.len(), 40 | 64) && reference.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compare the configured remote with the wanted one.
///
/// Git records local clones by absolute path, so local paths are compared
/// after canonicalization.
fn same_remote(configured: &str, wanted: &str) -> bool {
  let configured = configured.trim_end_matches('/');
  let wanted = wanted.trim_end_matches('/');
  if configured == wanted {
    return true;
  }

  let as_local = |uri: &str| {
    let path = uri.strip_prefix("file://").unwrap_or(uri);
    dunce::canonicalize(path).ok()
  };
  match (as_local(configured), as_local(wanted)) {
    (Some(a), Some(b)) => a == b,
    _ => false,
  }
}
