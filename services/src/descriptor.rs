//! Service descriptors: the generic registrations fed to the adapter.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::binding::Disposer;
use crate::core::{erase, Instance, ServiceKey};
use crate::error::{ConfigError, ResolveError};
use crate::provider::ServiceProvider;

/// How long an activated instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ServiceLifetime {
  /// One instance, disposed when the kernel's root scope is disposed.
  Singleton,
  /// One instance per request scope, disposed when that scope ends.
  Scoped,
  /// A new instance per resolution, disposed with the enclosing scope if there is one.
  Transient,
}

impl FromStr for ServiceLifetime {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "singleton" => Ok(ServiceLifetime::Singleton),
      "scoped" => Ok(ServiceLifetime::Scoped),
      "transient" => Ok(ServiceLifetime::Transient),
      _ => Err(ConfigError::UnsupportedLifetime(s.to_owned())),
    }
  }
}

impl fmt::Display for ServiceLifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ServiceLifetime::Singleton => write!(f, "Singleton"),
      ServiceLifetime::Scoped => write!(f, "Scoped"),
      ServiceLifetime::Transient => write!(f, "Transient"),
    }
  }
}

/// Explicit teardown for services that hold resources.
pub trait Dispose: Send + Sync {
  fn dispose(&self);
}

/// A type the adapter can construct when it is registered as an implementation type.
pub trait Injectable: Sized + Send + Sync + 'static {
  fn inject(provider: &ServiceProvider) -> Result<Self, ResolveError>;
}

/// A type-erased factory. The returned instance must hold an `Arc` of the descriptor's
/// service type; if it does not, resolution fails with `ResolveError::TypeMismatch`.
pub type ServiceFactory =
  Arc<dyn Fn(&ServiceProvider) -> Result<Instance, ResolveError> + Send + Sync>;

/// An implementation type together with the way to build it as the service type.
#[derive(Clone)]
pub struct ImplementationType {
  key: ServiceKey,
  construct: ServiceFactory,
}

impl ImplementationType {
  pub fn of<S, I>(upcast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static) -> Self
  where
    S: ?Sized + Send + Sync + 'static,
    I: Injectable,
  {
    Self {
      key: ServiceKey::of::<I>(),
      construct: Arc::new(move |provider: &ServiceProvider| -> Result<Instance, ResolveError> {
        let implementation = Arc::new(I::inject(provider)?);
        Ok(erase(upcast(implementation)))
      }),
    }
  }

  pub fn key(&self) -> ServiceKey {
    self.key
  }

  pub fn type_name(&self) -> &'static str {
    self.key.type_name()
  }

  pub fn construct(&self) -> &ServiceFactory {
    &self.construct
  }
}

/// Exactly one way of producing the service.
#[derive(Clone)]
pub enum Implementation {
  Type(ImplementationType),
  Factory(ServiceFactory),
  Instance(Instance),
}

/// An immutable registration: a service type, its implementation and its lifetime.
#[derive(Clone)]
pub struct ServiceDescriptor {
  service: ServiceKey,
  lifetime: ServiceLifetime,
  implementation: Implementation,
  disposer: Option<Disposer>,
}

impl ServiceDescriptor {
  /// Starts a typed descriptor for service `S`.
  pub fn describe<S: ?Sized + Send + Sync + 'static>(
    lifetime: ServiceLifetime,
  ) -> DescriptorBuilder<S> {
    DescriptorBuilder {
      lifetime,
      disposer: None,
      _service: PhantomData,
    }
  }

  pub fn singleton<S: ?Sized + Send + Sync + 'static>() -> DescriptorBuilder<S> {
    Self::describe(ServiceLifetime::Singleton)
  }

  pub fn scoped<S: ?Sized + Send + Sync + 'static>() -> DescriptorBuilder<S> {
    Self::describe(ServiceLifetime::Scoped)
  }

  pub fn transient<S: ?Sized + Send + Sync + 'static>() -> DescriptorBuilder<S> {
    Self::describe(ServiceLifetime::Transient)
  }

  /// Builds a descriptor without static typing, for hooks and tooling that only know
  /// the service key.
  pub fn from_parts(
    service: ServiceKey,
    lifetime: ServiceLifetime,
    implementation: Implementation,
    disposer: Option<Disposer>,
  ) -> Self {
    Self {
      service,
      lifetime,
      implementation,
      disposer,
    }
  }

  pub fn service_type(&self) -> ServiceKey {
    self.service
  }

  pub fn lifetime(&self) -> ServiceLifetime {
    self.lifetime
  }

  pub fn implementation(&self) -> &Implementation {
    &self.implementation
  }

  pub fn implementation_type(&self) -> Option<&ImplementationType> {
    match &self.implementation {
      Implementation::Type(ty) => Some(ty),
      _ => None,
    }
  }

  pub fn disposer(&self) -> Option<&Disposer> {
    self.disposer.as_ref()
  }
}

impl fmt::Debug for ServiceDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let implementation = match &self.implementation {
      Implementation::Type(ty) => ty.type_name(),
      Implementation::Factory(_) => "<factory>",
      Implementation::Instance(_) => "<instance>",
    };
    f.debug_struct("ServiceDescriptor")
      .field("service", &self.service)
      .field("lifetime", &self.lifetime)
      .field("implementation", &implementation)
      .field("disposable", &self.disposer.is_some())
      .finish()
  }
}

/// Typed construction of a `ServiceDescriptor` for service `S`.
pub struct DescriptorBuilder<S: ?Sized> {
  lifetime: ServiceLifetime,
  disposer: Option<Disposer>,
  _service: PhantomData<fn() -> Arc<S>>,
}

impl<S: ?Sized + Send + Sync + 'static> DescriptorBuilder<S> {
  /// Runs `dispose` when the scope owning an activated instance ends.
  pub fn on_dispose(mut self, dispose: impl Fn(&S) + Send + Sync + 'static) -> Self {
    self.disposer = Some(Arc::new(move |instance: &Instance| {
      if let Some(service) = instance.downcast_ref::<Arc<S>>() {
        dispose(service);
      }
    }));
    self
  }

  pub fn to_type<I: Injectable>(
    self,
    upcast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
  ) -> ServiceDescriptor {
    self.finish(Implementation::Type(ImplementationType::of::<S, I>(upcast)))
  }

  pub fn to_factory(
    self,
    factory: impl Fn(&ServiceProvider) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
  ) -> ServiceDescriptor {
    self.finish(Implementation::Factory(Arc::new(move |provider: &ServiceProvider| {
      factory(provider).map(erase)
    })))
  }

  /// Registers an already-built instance. It is root-scoped whatever the lifetime.
  pub fn to_instance(self, instance: Arc<S>) -> ServiceDescriptor {
    self.finish(Implementation::Instance(erase(instance)))
  }

  fn finish(self, implementation: Implementation) -> ServiceDescriptor {
    ServiceDescriptor {
      service: ServiceKey::of::<S>(),
      lifetime: self.lifetime,
      implementation,
      disposer: self.disposer,
    }
  }
}

impl<S: ?Sized + Dispose + 'static> DescriptorBuilder<S> {
  /// Calls [`Dispose::dispose`] when the owning scope ends.
  pub fn disposable(self) -> Self {
    self.on_dispose(|service: &S| service.dispose())
  }
}

impl<S: Injectable> DescriptorBuilder<S> {
  /// Registers `S` as its own implementation type.
  pub fn to_self(self) -> ServiceDescriptor {
    self.to_type::<S>(|implementation| implementation)
  }
}
