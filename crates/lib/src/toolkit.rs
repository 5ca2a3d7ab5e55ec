//! Running many dependency tasks.
//!
//! The toolkit owns the tasks described by a manifest and runs a selection of
//! them with bounded concurrency. Tasks never share a working tree (directory
//! uniqueness is checked when the manifest is loaded), so they need no locking.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::build::{BuildType, CMakeRunner, GlobalOptions, NativeBuildRunner};
use crate::config::{Config, ConfigError};
use crate::process::RunContext;
use crate::task::{BuildReport, CleanReport, DependencyTask, TaskError, TaskState};
use crate::vcs::{GitCheckout, VcsCheckout, WorkingTree};

/// Outcome of one task within a batch.
#[derive(Debug)]
pub struct TaskRun<T> {
  pub name: String,
  pub result: Result<T, TaskError>,
  pub elapsed: Duration,
}

impl<T> TaskRun<T> {
  pub fn is_ok(&self) -> bool {
    self.result.is_ok()
  }
}

/// Observed state of one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
  pub state: TaskState,
  pub tree: WorkingTree,
}

/// A set of dependency tasks sharing global option defaults.
#[derive(Debug, Clone)]
pub struct Toolkit<V, B> {
  tasks: Vec<DependencyTask<V, B>>,
  defaults: GlobalOptions,
  jobs: usize,
}

impl Toolkit<GitCheckout, CMakeRunner> {
  /// Build one task per `[[dependency]]` entry.
  pub fn from_config(config: &Config) -> Self {
    let settings = &config.settings;
    let vcs = GitCheckout::new(config.root_dir()).with_program(&settings.git);
    let runner = CMakeRunner::new()
      .with_program(&settings.cmake)
      .with_generator(settings.generator.clone())
      .with_compile_jobs(settings.compile_jobs);

    let tasks = config
      .dependencies
      .iter()
      .map(|dep| {
        let mut task = DependencyTask::new(&dep.name, dep.locator(), dep.overrides(), vcs.clone(), runner.clone());
        if let Some(description) = &dep.description {
          task = task.with_description(description);
        }
        if let Some(description) = &dep.clean_description {
          task = task.with_clean_description(description);
        }
        task
      })
      .collect();

    Self::new(tasks, config.global_options(), settings.jobs)
  }
}

impl<V: VcsCheckout, B: NativeBuildRunner> Toolkit<V, B> {
  pub fn new(tasks: Vec<DependencyTask<V, B>>, defaults: GlobalOptions, jobs: usize) -> Self {
    Self {
      tasks,
      defaults,
      jobs: jobs.max(1),
    }
  }

  /// Override how many tasks run at once.
  pub fn with_jobs(mut self, jobs: usize) -> Self {
    self.jobs = jobs.max(1);
    self
  }

  pub fn jobs(&self) -> usize {
    self.jobs
  }

  pub fn defaults(&self) -> &GlobalOptions {
    &self.defaults
  }

  pub fn tasks(&self) -> &[DependencyTask<V, B>] {
    &self.tasks
  }

  pub fn task(&self, name: &str) -> Option<&DependencyTask<V, B>> {
    self.tasks.iter().find(|task| task.name() == name)
  }

  /// Tasks matching `names` in the given order; every task when `names` is empty.
  pub fn select(&self, names: &[String]) -> Result<Vec<&DependencyTask<V, B>>, ConfigError> {
    if names.is_empty() {
      return Ok(self.tasks.iter().collect());
    }

    let mut selected: Vec<&DependencyTask<V, B>> = Vec::with_capacity(names.len());
    for name in names {
      let task = self.task(name).ok_or_else(|| ConfigError::UnknownDependency {
        name: name.clone(),
        available: self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
      })?;
      if !selected.iter().any(|t| t.name() == task.name()) {
        selected.push(task);
      }
    }
    Ok(selected)
  }

  /// Build the selected tasks, at most `jobs` at a time.
  ///
  /// Every task runs to completion regardless of failures elsewhere. Results
  /// come back in selection order.
  pub async fn build(
    &self,
    tasks: &[&DependencyTask<V, B>],
    build_type: BuildType,
    ctx: &RunContext,
  ) -> Vec<TaskRun<BuildReport>> {
    debug!(count = tasks.len(), jobs = self.jobs, build_type = %build_type, "building dependencies");
    let defaults = &self.defaults;
    self
      .run_all(tasks, |task| async move { task.build(build_type, defaults, ctx).await })
      .await
  }

  /// Clean the selected tasks, at most `jobs` at a time.
  pub async fn clean(&self, tasks: &[&DependencyTask<V, B>]) -> Vec<TaskRun<CleanReport>> {
    debug!(count = tasks.len(), jobs = self.jobs, "cleaning dependencies");
    self.run_all(tasks, |task| async move { task.clean().await }).await
  }

  /// Observed state of the selected tasks. Nothing is changed on disk.
  pub fn status(
    &self,
    tasks: &[&DependencyTask<V, B>],
    build_type: BuildType,
  ) -> Vec<(String, Result<TaskStatus, TaskError>)> {
    tasks
      .iter()
      .map(|task| {
        let status = task.working_tree().map(|tree| TaskStatus {
          state: task.state_of(&tree, build_type, &self.defaults),
          tree,
        });
        (task.name().to_string(), status)
      })
      .collect()
  }

  async fn run_all<'a, T, F, Fut>(&'a self, tasks: &[&'a DependencyTask<V, B>], op: F) -> Vec<TaskRun<T>>
  where
    F: Fn(&'a DependencyTask<V, B>) -> Fut,
    Fut: Future<Output = Result<T, TaskError>>,
  {
    let mut runs: Vec<(usize, TaskRun<T>)> = stream::iter(tasks.iter().copied().enumerate())
      .map(|(index, task)| {
        let fut = op(task);
        async move {
          let start = Instant::now();
          let result = fut.await;
          if let Err(e) = &result {
            warn!(name = %task.name(), error = %e, "dependency failed");
          }
          let run = TaskRun {
            name: task.name().to_string(),
            result,
            elapsed: start.elapsed(),
          };
          (index, run)
        }
      })
      .buffer_unordered(self.jobs)
      .collect()
      .await;

    runs.sort_by_key(|(index, _)| *index);
    runs.into_iter().map(|(_, run)| run).collect()
  }
}
