//! Kernel and population settings, loadable from YAML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// The order in which a scope disposes what it tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalOrder {
  /// Most recently activated first, so dependents go before their dependencies.
  #[default]
  Reverse,
  /// In activation order.
  Activation,
}

/// How the service-collection adapter numbers bindings across `populate` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
  /// Every `populate` call starts a fresh binding index. Populating the same service
  /// twice leaves one latest binding per call.
  #[default]
  PerPopulate,
  /// One index is shared by all `populate` calls of an adapter, so later calls
  /// shadow earlier ones.
  Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KernelSettings {
  pub disposal_order: DisposalOrder,
  /// Report a binding re-entering its own activation as an error.
  pub detect_cycles: bool,
}

impl Default for KernelSettings {
  fn default() -> Self {
    Self {
      disposal_order: DisposalOrder::Reverse,
      detect_cycles: true,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PopulateSettings {
  pub index_mode: IndexMode,
}

/// Top-level settings document.
///
/// ```yaml
/// kernel:
///   disposal_order: reverse
///   detect_cycles: true
/// populate:
///   index_mode: per_populate
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub kernel: KernelSettings,
  pub populate: PopulateSettings,
}

impl Settings {
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }
}
