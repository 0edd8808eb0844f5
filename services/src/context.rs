use std::any::Any;
use std::sync::Arc;

use crate::binding::Binding;
use crate::core::{downcast, ServiceKey};
use crate::error::ResolveError;
use crate::kernel::Kernel;
use crate::scope::Scope;

/// The state of one activation: which kernel, which binding, and the enclosing scope
/// token passed down the resolution call, if any.
pub struct Context<'a> {
  kernel: &'a Kernel,
  binding: &'a Binding,
  scope: Option<&'a Scope>,
}

impl<'a> Context<'a> {
  pub(crate) fn new(kernel: &'a Kernel, binding: &'a Binding, scope: Option<&'a Scope>) -> Self {
    Self {
      kernel,
      binding,
      scope,
    }
  }

  pub fn kernel(&self) -> &'a Kernel {
    self.kernel
  }

  pub fn binding(&self) -> &'a Binding {
    self.binding
  }

  /// The enclosing scope token of this resolution.
  pub fn scope(&self) -> Option<&'a Scope> {
    self.scope
  }

  /// Resolves another service with the same scope token, without a constraint.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
    let service = ServiceKey::of::<T>();
    let instance = self.kernel.get(&service, self.scope, None)?;
    downcast(service, &instance)
  }
}
