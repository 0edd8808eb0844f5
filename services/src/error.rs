use thiserror::Error;

use crate::core::ServiceKey;

/// Errors raised while resolving a service from the kernel or a `ServiceProvider`.
///
/// Every variant is per-call: a failed resolution never changes the state seen by
/// other callers or other service types.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// No binding satisfies the lookup (for the provider: no latest binding).
  #[error("No binding registered for service `{0}`")]
  NotRegistered(ServiceKey),

  /// More than one binding satisfies a single-result lookup. This is a configuration
  /// defect and is never converted into an absent result.
  #[error("Ambiguous match for service `{service}`: {count} bindings satisfy the lookup")]
  AmbiguousMatch { service: ServiceKey, count: usize },

  /// An activator produced an instance that is not an `Arc` of the requested type.
  #[error("Activated instance for service `{service}` is not a `{expected}`")]
  TypeMismatch {
    service: ServiceKey,
    expected: &'static str,
  },

  #[error("Circular dependency detected while resolving service `{0}`")]
  CircularDependency(ServiceKey),

  /// The scope selected for the activation was already torn down.
  #[error("Cannot activate service `{service}`: scope {scope} has been disposed")]
  ScopeDisposed { service: ServiceKey, scope: u64 },
}

impl ResolveError {
  /// Returns `true` for the only outcome optional resolution may swallow.
  pub fn is_not_registered(&self) -> bool {
    matches!(self, ResolveError::NotRegistered(_))
  }
}

/// Errors raised while reading settings or interpreting configured values.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Unsupported service lifetime: {0}")]
  UnsupportedLifetime(String),

  #[error("Failed to read configuration file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(String),
}

/// Errors that abort a population run. No partial binding set is guaranteed to be
/// consistent after one of these.
#[derive(Debug, Error)]
pub enum PopulateError {
  #[error("Failed to resolve populate hooks: {0}")]
  Resolve(#[from] ResolveError),

  #[error("Populate hook '{hook}' failed: {message}")]
  Hook { hook: String, message: String },
}
