//! The `Kernel`: a thread-safe, multi-binding IoC container.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::binding::{Binding, BindingMetadata};
use crate::context::Context;
use crate::core::{downcast, erase, Instance, ResolutionGuard, ServiceKey};
use crate::error::ResolveError;
use crate::hook::PopulateHook;
use crate::scope::{Scope, ScopeKind};
use crate::settings::KernelSettings;

/// A predicate over binding metadata restricting which bindings a lookup may select.
pub type Constraint<'c> = &'c (dyn Fn(&BindingMetadata) -> bool + Send + Sync);

struct KernelInner {
  // Every binding per service, in the order it was added.
  bindings: DashMap<ServiceKey, Vec<Arc<Binding>>>,
  root: Scope,
  settings: KernelSettings,
}

impl Drop for KernelInner {
  fn drop(&mut self) {
    self.root.dispose();
  }
}

/// The Inversion of Control kernel.
///
/// A service key may have any number of bindings; all of them are kept in
/// registration order. Single-result lookups are narrowed with an optional
/// [`Constraint`] and fail if zero or several bindings remain.
///
/// `Kernel` is a cheap handle; clones share the same bindings and root scope.
#[derive(Clone)]
pub struct Kernel {
  inner: Arc<KernelInner>,
}

impl Default for Kernel {
  fn default() -> Self {
    Self::with_settings(KernelSettings::default())
  }
}

impl Kernel {
  /// Creates a new, empty `Kernel` with default settings.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_settings(settings: KernelSettings) -> Self {
    Self {
      inner: Arc::new(KernelInner {
        bindings: DashMap::new(),
        root: Scope::new(ScopeKind::Root, settings.disposal_order),
        settings,
      }),
    }
  }

  pub fn settings(&self) -> &KernelSettings {
    &self.inner.settings
  }

  /// The scope whose lifetime is the kernel's lifetime.
  pub fn root_scope(&self) -> &Scope {
    &self.inner.root
  }

  /// Creates a new request scope. The caller owns it and decides when it ends.
  pub fn create_scope(&self) -> Scope {
    Scope::new(ScopeKind::Request, self.inner.settings.disposal_order)
  }

  // --- Registration ---

  /// Adds a binding after any existing bindings for the same service.
  pub fn bind(&self, binding: Binding) -> Arc<Binding> {
    let binding = Arc::new(binding);
    trace!(service = %binding.service(), binding = binding.id().get(), "binding added");
    self
      .inner
      .bindings
      .entry(binding.service())
      .or_default()
      .push(binding.clone());
    binding
  }

  /// Registers a hook for the service-collection adapter. Hooks run in the order
  /// they were added.
  pub fn add_populate_hook(&self, hook: Arc<dyn PopulateHook>) -> Arc<Binding> {
    self.bind(Binding::to_constant(ServiceKey::of::<dyn PopulateHook>(), erase(hook)).build())
  }

  /// All bindings of `service`, in registration order.
  pub fn bindings(&self, service: &ServiceKey) -> Vec<Arc<Binding>> {
    self
      .inner
      .bindings
      .get(service)
      .map(|bindings| bindings.value().clone())
      .unwrap_or_default()
  }

  pub fn has_binding(&self, service: &ServiceKey) -> bool {
    self
      .inner
      .bindings
      .get(service)
      .is_some_and(|bindings| !bindings.is_empty())
  }

  // --- Resolution ---

  /// Resolves exactly one binding of `service` that satisfies `constraint`.
  ///
  /// `scope` is the enclosing scope token of the resolution; scope selectors decide
  /// what to do with it.
  pub fn get(
    &self,
    service: &ServiceKey,
    scope: Option<&Scope>,
    constraint: Option<Constraint<'_>>,
  ) -> Result<Instance, ResolveError> {
    match self.select(service, constraint)? {
      Some(binding) => self.activate(&binding, scope),
      None => Err(ResolveError::NotRegistered(*service)),
    }
  }

  /// Like [`Kernel::get`], but a missing binding yields `Ok(None)`. An ambiguous
  /// match is still an error.
  pub fn try_get(
    &self,
    service: &ServiceKey,
    scope: Option<&Scope>,
    constraint: Option<Constraint<'_>>,
  ) -> Result<Option<Instance>, ResolveError> {
    match self.select(service, constraint)? {
      Some(binding) => self.activate(&binding, scope).map(Some),
      None => Ok(None),
    }
  }

  /// Activates every binding of `service`, in registration order.
  pub fn get_all(
    &self,
    service: &ServiceKey,
    scope: Option<&Scope>,
  ) -> Result<Vec<Instance>, ResolveError> {
    self
      .bindings(service)
      .iter()
      .map(|binding| self.activate(binding, scope))
      .collect()
  }

  /// Typed form of [`Kernel::get`].
  pub fn resolve<T: ?Sized + Any + Send + Sync>(
    &self,
    scope: Option<&Scope>,
    constraint: Option<Constraint<'_>>,
  ) -> Result<Arc<T>, ResolveError> {
    let service = ServiceKey::of::<T>();
    let instance = self.get(&service, scope, constraint)?;
    downcast(service, &instance)
  }

  /// Typed form of [`Kernel::get_all`].
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(
    &self,
    scope: Option<&Scope>,
  ) -> Result<Vec<Arc<T>>, ResolveError> {
    let service = ServiceKey::of::<T>();
    self
      .get_all(&service, scope)?
      .iter()
      .map(|instance| downcast(service, instance))
      .collect()
  }

  /// Tears down the root scope, disposing every root-scoped instance once.
  pub fn dispose(&self) {
    self.inner.root.dispose();
  }

  // --- PRIVATE HELPERS ---

  fn select(
    &self,
    service: &ServiceKey,
    constraint: Option<Constraint<'_>>,
  ) -> Result<Option<Arc<Binding>>, ResolveError> {
    let mut matches = self
      .bindings(service)
      .into_iter()
      .filter(|binding| constraint.map_or(true, |accepts| accepts(binding.metadata())));

    let Some(first) = matches.next() else {
      return Ok(None);
    };
    let rest = matches.count();
    if rest > 0 {
      debug!(service = %service, count = rest + 1, "ambiguous binding lookup");
      return Err(ResolveError::AmbiguousMatch {
        service: *service,
        count: rest + 1,
      });
    }
    Ok(Some(first))
  }

  fn activate(&self, binding: &Binding, scope: Option<&Scope>) -> Result<Instance, ResolveError> {
    let _guard = if self.inner.settings.detect_cycles {
      Some(ResolutionGuard::enter(binding.id(), binding.service())?)
    } else {
      None
    };

    let ctx = Context::new(self, binding, scope);
    match binding.select_scope(&ctx)? {
      // Root-owned instances resolve their dependencies in the root scope.
      Some(target) if target.kind() == ScopeKind::Root => {
        let root_ctx = Context::new(self, binding, Some(&target));
        target.get_or_activate(binding, || binding.activate(&root_ctx))
      }
      Some(target) => target.get_or_activate(binding, || binding.activate(&ctx)),
      None => binding.activate(&ctx),
    }
  }
}
