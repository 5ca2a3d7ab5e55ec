//! The `depkit.toml` manifest.
//!
//! ```toml
//! [settings]
//! build_type = "release"
//! jobs = 2
//!
//! [defaults.debug]
//! build_shared_libs = false
//!
//! [[dependency]]
//! name = "alsoft"
//! uri = "git://repo.or.cz/openal-soft.git"
//! directory = "openal-soft-src"
//! tag = "openal-soft-1.15.1"
//!
//! [dependency.options]
//! dlopen = false
//! ```

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::build::{BuildOptionSet, BuildType, GlobalOptions, OptionOverrides};
use crate::platform::paths;
use crate::vcs::SourceLocator;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid configuration: {0}")]
  Invalid(String),

  #[error("unknown dependency '{name}' (configured: {available})")]
  UnknownDependency { name: String, available: String },
}

/// Toolkit-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  pub build_type: BuildType,
  /// Directory working trees are checked out into, relative to the manifest.
  pub root: PathBuf,
  /// Dependencies processed at the same time.
  pub jobs: usize,
  /// Limit for every git and cmake invocation, 0 disables it.
  pub timeout_secs: u64,
  pub git: String,
  pub cmake: String,
  pub generator: Option<String>,
  pub compile_jobs: Option<usize>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      build_type: BuildType::default(),
      root: PathBuf::from("."),
      jobs: 2,
      timeout_secs: 3600,
      git: "git".to_string(),
      cmake: "cmake".to_string(),
      generator: None,
      compile_jobs: None,
    }
  }
}

impl Settings {
  pub fn timeout(&self) -> Option<Duration> {
    (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
  }
}

/// One `[[dependency]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyConfig {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub clean_description: Option<String>,
  pub uri: String,
  pub directory: String,
  pub tag: String,
  #[serde(default)]
  pub options: BuildOptionSet,
  /// Options applied on top of `options` for one build type.
  #[serde(default)]
  pub build_type_options: GlobalOptions,
}

impl DependencyConfig {
  pub fn locator(&self) -> SourceLocator {
    SourceLocator::new(&self.uri, &self.directory, &self.tag)
  }

  pub fn overrides(&self) -> OptionOverrides {
    OptionOverrides {
      options: self.options.clone(),
      debug: self.build_type_options.debug.clone(),
      release: self.build_type_options.release.clone(),
    }
  }
}

/// A loaded and validated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub settings: Settings,
  /// Global option defaults per build type.
  #[serde(default)]
  pub defaults: GlobalOptions,
  #[serde(default, rename = "dependency")]
  pub dependencies: Vec<DependencyConfig>,
  /// Directory relative paths are resolved against.
  #[serde(skip)]
  pub base_dir: PathBuf,
}

impl Config {
  /// Load and validate a manifest file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let base_dir = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(Path::to_path_buf)
      .unwrap_or_else(paths::current_dir);
    let base_dir = dunce::canonicalize(&base_dir).unwrap_or(base_dir);

    let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.base_dir = base_dir;
    config.validate()?;
    Ok(config)
  }

  /// Parse a manifest from a string, resolving paths against `base_dir`.
  pub fn parse(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let mut config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
      path: base_dir.join(crate::consts::CONFIG_FILENAME),
      source,
    })?;
    config.base_dir = base_dir.to_path_buf();
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.settings.jobs == 0 {
      return Err(ConfigError::Invalid("settings.jobs must be at least 1".to_string()));
    }

    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut directories: HashMap<&str, &str> = HashMap::new();

    for (index, dep) in self.dependencies.iter().enumerate() {
      for (field, value) in [("name", &dep.name), ("uri", &dep.uri), ("tag", &dep.tag)] {
        if value.trim().is_empty() {
          return Err(ConfigError::Invalid(format!("dependency #{} has an empty {field}", index + 1)));
        }
      }
      if names.insert(&dep.name, index).is_some() {
        return Err(ConfigError::Invalid(format!("dependency '{}' is defined twice", dep.name)));
      }
      if !is_single_component(&dep.directory) {
        return Err(ConfigError::Invalid(format!(
          "dependency '{}': directory '{}' must be a single relative path component",
          dep.name, dep.directory
        )));
      }
      if let Some(other) = directories.insert(&dep.directory, &dep.name) {
        return Err(ConfigError::Invalid(format!(
          "dependencies '{other}' and '{}' share directory '{}'",
          dep.name, dep.directory
        )));
      }
    }

    Ok(())
  }

  /// Directory working trees are checked out into.
  pub fn root_dir(&self) -> PathBuf {
    paths::root_dir(&self.settings.root, &self.base_dir)
  }

  /// Built-in defaults with the manifest's `[defaults]` layered on top.
  pub fn global_options(&self) -> GlobalOptions {
    GlobalOptions::builtin().overlay(&self.defaults)
  }

  pub fn dependency(&self, name: &str) -> Option<&DependencyConfig> {
    self.dependencies.iter().find(|dep| dep.name == name)
  }

  /// Configured names, in manifest order.
  pub fn names(&self) -> Vec<&str> {
    self.dependencies.iter().map(|dep| dep.name.as_str()).collect()
  }
}

fn is_single_component(directory: &str) -> bool {
  let mut components = Path::new(directory).components();
  matches!(
    (components.next(), components.next()),
    (Some(Component::Normal(_)), None)
  )
}
