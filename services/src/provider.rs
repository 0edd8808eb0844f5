//! The resolution facade over a populated kernel.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::binding::BindingMetadata;
use crate::context::Context;
use crate::core::{downcast, Instance, ServiceKey};
use crate::error::ResolveError;
use crate::kernel::{Constraint, Kernel};
use crate::scope::Scope;

/// Resolves services with "latest registration wins" semantics.
///
/// Required resolution distinguishes a missing service (`NotRegistered`) from a
/// configuration defect (`AmbiguousMatch`). Optional resolution turns only the former
/// into `None`; an ambiguous match is always an error.
///
/// The provider carries the scope token its resolutions run in. The root provider
/// uses the kernel's root scope.
#[derive(Clone)]
pub struct ServiceProvider {
  kernel: Kernel,
  scope: Option<Scope>,
}

impl ServiceProvider {
  /// A provider resolving in the kernel's root scope.
  pub fn new(kernel: Kernel) -> Self {
    let scope = Some(kernel.root_scope().clone());
    Self { kernel, scope }
  }

  /// A provider resolving with an explicit scope token, or with none.
  pub fn with_scope(kernel: Kernel, scope: Option<Scope>) -> Self {
    Self { kernel, scope }
  }

  pub(crate) fn for_context(ctx: &Context<'_>) -> Self {
    Self::with_scope(ctx.kernel().clone(), ctx.scope().cloned())
  }

  pub fn kernel(&self) -> &Kernel {
    &self.kernel
  }

  pub fn scope(&self) -> Option<&Scope> {
    self.scope.as_ref()
  }

  // --- Resolution ---

  /// Resolves the latest binding of `service`.
  pub fn get_required_service(&self, service: &ServiceKey) -> Result<Instance, ResolveError> {
    let constraint: Constraint<'_> = &latest_binding_constraint;
    self.kernel.get(service, self.scope.as_ref(), Some(constraint))
  }

  /// Resolves the latest binding of `service`, or `None` if there is none.
  pub fn get_service(&self, service: &ServiceKey) -> Result<Option<Instance>, ResolveError> {
    let constraint: Constraint<'_> = &latest_binding_constraint;
    self.kernel.try_get(service, self.scope.as_ref(), Some(constraint))
  }

  pub fn get_required<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
    let service = ServiceKey::of::<T>();
    let instance = self.get_required_service(&service)?;
    downcast(service, &instance)
  }

  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Option<Arc<T>>, ResolveError> {
    let service = ServiceKey::of::<T>();
    self
      .get_service(&service)?
      .map(|instance| downcast(service, &instance))
      .transpose()
  }

  /// Resolves every binding of `T`, shadowed or not, in registration order.
  pub fn get_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
    self.kernel.resolve_all::<T>(self.scope.as_ref())
  }

  /// Opens a new request scope.
  pub fn create_scope(&self) -> ServiceScope {
    let scope = self.kernel.create_scope();
    ServiceScope {
      provider: Self::with_scope(self.kernel.clone(), Some(scope.clone())),
      scope,
    }
  }
}

impl fmt::Debug for ServiceProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceProvider")
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}

/// Bindings without index metadata were not produced by the adapter and are never
/// shadowed.
fn latest_binding_constraint(metadata: &BindingMetadata) -> bool {
  metadata.index().map_or(true, |item| item.is_latest())
}

/// A request scope and the provider that resolves in it. The scope is disposed when
/// this value is dropped.
pub struct ServiceScope {
  provider: ServiceProvider,
  scope: Scope,
}

impl ServiceScope {
  pub fn service_provider(&self) -> &ServiceProvider {
    &self.provider
  }

  pub fn scope(&self) -> &Scope {
    &self.scope
  }

  pub fn dispose(self) {
    drop(self);
  }
}

impl Drop for ServiceScope {
  fn drop(&mut self) {
    self.scope.dispose();
  }
}
