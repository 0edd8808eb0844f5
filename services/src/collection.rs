use std::sync::Arc;

use crate::descriptor::{Injectable, ServiceDescriptor, ServiceLifetime};
use crate::error::ResolveError;
use crate::provider::ServiceProvider;

/// An ordered list of service descriptors.
///
/// Order matters: when several descriptors name the same service, the last one is
/// what single-result resolution returns after population.
#[derive(Default, Clone, Debug)]
pub struct ServiceCollection {
  descriptors: Vec<Arc<ServiceDescriptor>>,
}

impl ServiceCollection {
  /// Creates a new, empty `ServiceCollection`.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
    self.descriptors.push(Arc::new(descriptor));
    self
  }

  // --- Factory Registration ---
  pub fn add_singleton<S: ?Sized + Send + Sync + 'static>(
    &mut self,
    factory: impl Fn(&ServiceProvider) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
  ) -> &mut Self {
    self.add(ServiceDescriptor::singleton::<S>().to_factory(factory))
  }

  pub fn add_scoped<S: ?Sized + Send + Sync + 'static>(
    &mut self,
    factory: impl Fn(&ServiceProvider) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
  ) -> &mut Self {
    self.add(ServiceDescriptor::scoped::<S>().to_factory(factory))
  }

  pub fn add_transient<S: ?Sized + Send + Sync + 'static>(
    &mut self,
    factory: impl Fn(&ServiceProvider) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
  ) -> &mut Self {
    self.add(ServiceDescriptor::transient::<S>().to_factory(factory))
  }

  // --- Type Registration ---
  pub fn add_type<S: ?Sized + Send + Sync + 'static, I: Injectable>(
    &mut self,
    lifetime: ServiceLifetime,
    upcast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
  ) -> &mut Self {
    self.add(ServiceDescriptor::describe::<S>(lifetime).to_type(upcast))
  }

  // --- Instance Registration ---
  pub fn add_instance<S: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<S>) -> &mut Self {
    self.add(ServiceDescriptor::singleton::<S>().to_instance(instance))
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Arc<ServiceDescriptor>> {
    self.descriptors.iter()
  }
}

impl<'a> IntoIterator for &'a ServiceCollection {
  type Item = &'a Arc<ServiceDescriptor>;
  type IntoIter = std::slice::Iter<'a, Arc<ServiceDescriptor>>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl Extend<ServiceDescriptor> for ServiceCollection {
  fn extend<T: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: T) {
    self.descriptors.extend(iter.into_iter().map(Arc::new));
  }
}
