//! Kernel bindings: what a service key is bound to, in which scope, and with which
//! metadata.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::core::{BindingId, Instance, ServiceKey};
use crate::descriptor::ServiceDescriptor;
use crate::error::ResolveError;
use crate::index::BindingIndexItem;
use crate::lifetime::LifetimeScopeMapper;
use crate::scope::Scope;

/// Produces a fresh instance for a binding.
pub type Activator = Arc<dyn Fn(&Context<'_>) -> Result<Instance, ResolveError> + Send + Sync>;

/// Chooses the scope an activation belongs to. `Ok(None)` means the instance is neither
/// cached nor tracked for disposal.
pub type ScopeSelector =
  Arc<dyn Fn(&Context<'_>) -> Result<Option<Scope>, ResolveError> + Send + Sync>;

/// Disposes an instance when the scope that tracks it is torn down.
pub type Disposer = Arc<dyn Fn(&Instance) + Send + Sync>;

/// What a binding activates, kept for introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTarget {
  /// Bound directly to an implementation type.
  Type { type_name: &'static str },
  /// Bound to a method invoked on every activation.
  Method,
  /// Bound to a pre-built value.
  Constant,
}

/// Typed metadata attached to a binding.
///
/// Bindings created by the service-collection adapter carry both the originating
/// descriptor and their `BindingIndex` item. Bindings added directly to the kernel
/// carry neither.
#[derive(Clone, Default)]
pub struct BindingMetadata {
  descriptor: Option<Arc<ServiceDescriptor>>,
  index: Option<BindingIndexItem>,
}

impl BindingMetadata {
  pub fn descriptor(&self) -> Option<&Arc<ServiceDescriptor>> {
    self.descriptor.as_ref()
  }

  pub fn index(&self) -> Option<&BindingIndexItem> {
    self.index.as_ref()
  }
}

impl fmt::Debug for BindingMetadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingMetadata")
      .field("has_descriptor", &self.descriptor.is_some())
      .field("index", &self.index)
      .finish()
  }
}

/// A single binding of a service key. Immutable once built; owned by the kernel.
pub struct Binding {
  id: BindingId,
  service: ServiceKey,
  target: BindingTarget,
  activator: Activator,
  scope: Option<ScopeSelector>,
  disposer: Option<Disposer>,
  metadata: BindingMetadata,
}

impl Binding {
  /// Starts a binding to an implementation type whose construction is `activator`.
  pub fn to_type<F>(service: ServiceKey, type_name: &'static str, activator: F) -> BindingBuilder
  where
    F: Fn(&Context<'_>) -> Result<Instance, ResolveError> + Send + Sync + 'static,
  {
    BindingBuilder::new(service, BindingTarget::Type { type_name }, Arc::new(activator))
  }

  /// Starts a binding whose instances come from `activator`.
  pub fn to_method<F>(service: ServiceKey, activator: F) -> BindingBuilder
  where
    F: Fn(&Context<'_>) -> Result<Instance, ResolveError> + Send + Sync + 'static,
  {
    BindingBuilder::new(service, BindingTarget::Method, Arc::new(activator))
  }

  /// Starts a binding that always yields `instance`.
  pub fn to_constant(service: ServiceKey, instance: Instance) -> BindingBuilder {
    let mut builder = Self::to_method(service, move |_: &Context<'_>| Ok(instance.clone()));
    builder.target = BindingTarget::Constant;
    builder
  }

  pub fn id(&self) -> BindingId {
    self.id
  }

  pub fn service(&self) -> ServiceKey {
    self.service
  }

  pub fn target(&self) -> &BindingTarget {
    &self.target
  }

  pub fn metadata(&self) -> &BindingMetadata {
    &self.metadata
  }

  pub fn disposer(&self) -> Option<&Disposer> {
    self.disposer.as_ref()
  }

  pub(crate) fn select_scope(&self, ctx: &Context<'_>) -> Result<Option<Scope>, ResolveError> {
    match &self.scope {
      Some(selector) => selector(ctx),
      None => Ok(None),
    }
  }

  pub(crate) fn activate(&self, ctx: &Context<'_>) -> Result<Instance, ResolveError> {
    (self.activator)(ctx)
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("id", &self.id)
      .field("service", &self.service)
      .field("target", &self.target)
      .field("scoped", &self.scope.is_some())
      .field("disposable", &self.disposer.is_some())
      .field("metadata", &self.metadata)
      .finish()
  }
}

/// Fluent construction of a `Binding`.
pub struct BindingBuilder {
  service: ServiceKey,
  target: BindingTarget,
  activator: Activator,
  scope: Option<ScopeSelector>,
  disposer: Option<Disposer>,
  metadata: BindingMetadata,
}

impl BindingBuilder {
  fn new(service: ServiceKey, target: BindingTarget, activator: Activator) -> Self {
    Self {
      service,
      target,
      activator,
      scope: None,
      disposer: None,
      metadata: BindingMetadata::default(),
    }
  }

  pub fn in_scope(mut self, selector: ScopeSelector) -> Self {
    self.scope = Some(selector);
    self
  }

  /// Binds into the kernel's root scope: one instance for the kernel's lifetime.
  pub fn in_singleton_scope(self) -> Self {
    self.in_scope(LifetimeScopeMapper::root())
  }

  pub fn on_dispose(mut self, disposer: Option<Disposer>) -> Self {
    self.disposer = disposer;
    self
  }

  pub fn with_descriptor(mut self, descriptor: Arc<ServiceDescriptor>) -> Self {
    self.metadata.descriptor = Some(descriptor);
    self
  }

  pub fn with_index(mut self, item: BindingIndexItem) -> Self {
    self.metadata.index = Some(item);
    self
  }

  pub fn build(self) -> Binding {
    Binding {
      id: BindingId::next(),
      service: self.service,
      target: self.target,
      activator: self.activator,
      scope: self.scope,
      disposer: self.disposer,
      metadata: self.metadata,
    }
  }
}
