//! Pluggable overrides of the default descriptor translation.

use std::sync::Arc;

use tracing::debug;

use crate::descriptor::ServiceDescriptor;
use crate::error::PopulateError;
use crate::kernel::Kernel;

/// A hook that may take over the translation of individual descriptors.
///
/// Hooks let specialised registrations (collections, keyed services and the like)
/// bypass the generic path without the adapter knowing about them.
pub trait PopulateHook: Send + Sync {
  /// Returns `true` to claim `descriptor`. A claimed descriptor gets no default
  /// binding, and later hooks do not see it.
  fn adapt_descriptor(
    &self,
    kernel: &Kernel,
    descriptor: &Arc<ServiceDescriptor>,
  ) -> Result<bool, PopulateError>;

  /// Runs once after every descriptor of a population run has been processed.
  fn adapt_after_populate(&self, _kernel: &Kernel) -> Result<(), PopulateError> {
    Ok(())
  }
}

/// An ordered list of hooks.
#[derive(Clone, Default)]
pub struct HookChain {
  hooks: Vec<Arc<dyn PopulateHook>>,
}

impl HookChain {
  pub fn new(hooks: Vec<Arc<dyn PopulateHook>>) -> Self {
    Self { hooks }
  }

  /// Collects the hooks registered with [`Kernel::add_populate_hook`], in order.
  pub fn from_kernel(kernel: &Kernel) -> Result<Self, PopulateError> {
    Ok(Self::new(kernel.resolve_all::<dyn PopulateHook>(None)?))
  }

  pub fn len(&self) -> usize {
    self.hooks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hooks.is_empty()
  }

  /// Offers `descriptor` to each hook in turn. Returns the position of the hook that
  /// claimed it.
  pub fn claim(
    &self,
    kernel: &Kernel,
    descriptor: &Arc<ServiceDescriptor>,
  ) -> Result<Option<usize>, PopulateError> {
    for (position, hook) in self.hooks.iter().enumerate() {
      if hook.adapt_descriptor(kernel, descriptor)? {
        debug!(service = %descriptor.service_type(), hook = position, "descriptor claimed by hook");
        return Ok(Some(position));
      }
    }
    Ok(None)
  }

  pub fn after_populate(&self, kernel: &Kernel) -> Result<(), PopulateError> {
    self
      .hooks
      .iter()
      .try_for_each(|hook| hook.adapt_after_populate(kernel))
  }
}
