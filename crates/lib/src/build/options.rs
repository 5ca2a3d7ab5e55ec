//! Build option sets and how they are merged.
//!
//! Options come from three layers, lowest precedence first: global defaults
//! for the build type, the dependency's own options, and the dependency's
//! options for that build type. Names are case-insensitive and stored upper
//! case, so `dlopen` and `DLOPEN` are the same option.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::build::BuildType;

/// Value of a single build option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
  Bool(bool),
  Integer(i64),
  String(String),
}

impl fmt::Display for OptionValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OptionValue::Bool(value) => write!(f, "{value}"),
      OptionValue::Integer(value) => write!(f, "{value}"),
      OptionValue::String(value) => write!(f, "{value}"),
    }
  }
}

impl From<bool> for OptionValue {
  fn from(value: bool) -> Self {
    OptionValue::Bool(value)
  }
}

impl From<i64> for OptionValue {
  fn from(value: i64) -> Self {
    OptionValue::Integer(value)
  }
}

impl From<&str> for OptionValue {
  fn from(value: &str) -> Self {
    OptionValue::String(value.to_string())
  }
}

impl From<String> for OptionValue {
  fn from(value: String) -> Self {
    OptionValue::String(value)
  }
}

/// Canonical spelling of an option name.
pub fn normalize_name(name: &str) -> String {
  name.trim().to_ascii_uppercase()
}

/// Resolved mapping of option names to values, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  from = "BTreeMap<String, OptionValue>",
  into = "BTreeMap<String, OptionValue>"
)]
pub struct BuildOptionSet(BTreeMap<String, OptionValue>);

impl BuildOptionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set an option, returning the value it replaced.
  pub fn insert(&mut self, name: &str, value: impl Into<OptionValue>) -> Option<OptionValue> {
    self.0.insert(normalize_name(name), value.into())
  }

  pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn get(&self, name: &str) -> Option<&OptionValue> {
    self.0.get(&normalize_name(name))
  }

  /// Options in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
    self.0.iter().map(|(name, value)| (name.as_str(), value))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Apply `other` on top of this set; its entries win on collision.
  pub fn overlay(&mut self, other: &BuildOptionSet) {
    for (name, value) in &other.0 {
      self.0.insert(name.clone(), value.clone());
    }
  }
}

impl From<BTreeMap<String, OptionValue>> for BuildOptionSet {
  fn from(map: BTreeMap<String, OptionValue>) -> Self {
    map.into_iter().collect()
  }
}

impl From<BuildOptionSet> for BTreeMap<String, OptionValue> {
  fn from(set: BuildOptionSet) -> Self {
    set.0
  }
}

impl<K: AsRef<str>, V: Into<OptionValue>> FromIterator<(K, V)> for BuildOptionSet {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut set = BuildOptionSet::new();
    for (name, value) in iter {
      set.insert(name.as_ref(), value);
    }
    set
  }
}

/// Merge global defaults with a dependency's overrides.
///
/// Pure: the inputs are untouched and the same inputs always give the same set.
pub fn merge_options(global: &BuildOptionSet, overrides: &BuildOptionSet) -> BuildOptionSet {
  let mut merged = global.clone();
  merged.overlay(overrides);
  merged
}

/// Global option defaults keyed by build type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalOptions {
  #[serde(default)]
  pub debug: BuildOptionSet,
  #[serde(default)]
  pub release: BuildOptionSet,
}

impl GlobalOptions {
  /// Defaults every build gets unless configuration says otherwise.
  pub fn builtin() -> Self {
    Self {
      debug: BuildOptionSet::new().with("CMAKE_BUILD_TYPE", BuildType::Debug.cmake_name()),
      release: BuildOptionSet::new().with("CMAKE_BUILD_TYPE", BuildType::Release.cmake_name()),
    }
  }

  pub fn for_build_type(&self, build_type: BuildType) -> &BuildOptionSet {
    match build_type {
      BuildType::Debug => &self.debug,
      BuildType::Release => &self.release,
    }
  }

  /// Layer `other` on top of these defaults.
  pub fn overlay(mut self, other: &GlobalOptions) -> Self {
    self.debug.overlay(&other.debug);
    self.release.overlay(&other.release);
    self
  }
}

/// A dependency's own options, optionally refined per build type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionOverrides {
  #[serde(default)]
  pub options: BuildOptionSet,
  #[serde(default)]
  pub debug: BuildOptionSet,
  #[serde(default)]
  pub release: BuildOptionSet,
}

impl OptionOverrides {
  pub fn new(options: BuildOptionSet) -> Self {
    Self {
      options,
      ..Self::default()
    }
  }

  pub fn with_build_type_options(mut self, build_type: BuildType, options: BuildOptionSet) -> Self {
    match build_type {
      BuildType::Debug => self.debug = options,
      BuildType::Release => self.release = options,
    }
    self
  }

  /// Overrides that apply to one build type.
  pub fn resolve(&self, build_type: BuildType) -> BuildOptionSet {
    let specific = match build_type {
      BuildType::Debug => &self.debug,
      BuildType::Release => &self.release,
    };
    merge_options(&self.options, specific)
  }
}
