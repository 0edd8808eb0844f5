//! Core data structures shared by the kernel and the service-collection adapter.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ResolveError;

/// A type-erased service instance.
///
/// The boxed value is always an `Arc<S>` for the service type `S` it was activated
/// for, which lets trait objects (`S = dyn Trait`) travel through the same storage as
/// concrete types.
pub type Instance = Arc<dyn Any + Send + Sync>;

thread_local! {
  // Bindings currently being activated on this thread.
  static ACTIVATING: RefCell<HashSet<BindingId>> = RefCell::new(HashSet::new());
}

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a service type. Equality and hashing use the `TypeId` only; the type
/// name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct ServiceKey {
  type_id: TypeId,
  type_name: &'static str,
}

impl ServiceKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl PartialEq for ServiceKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.type_name)
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.type_name)
  }
}

/// Process-unique identifier of a binding. Scopes cache instances per binding id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
  pub(crate) fn next() -> Self {
    BindingId(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn get(&self) -> u64 {
    self.0
  }
}

/// An RAII guard that detects a binding being re-entered while it is activated.
///
/// Entering adds the binding to a thread-local set; if it is already present the
/// activation chain has looped back on itself. Dropping the guard removes it.
pub(crate) struct ResolutionGuard {
  binding: BindingId,
}

impl ResolutionGuard {
  pub(crate) fn enter(binding: BindingId, service: ServiceKey) -> Result<Self, ResolveError> {
    let inserted = ACTIVATING.with(|active| active.borrow_mut().insert(binding));
    if !inserted {
      return Err(ResolveError::CircularDependency(service));
    }
    Ok(Self { binding })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    ACTIVATING.with(|active| {
      active.borrow_mut().remove(&self.binding);
    });
  }
}

/// Wraps a typed `Arc` into an `Instance`.
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
  Arc::new(value)
}

/// Recovers the typed `Arc` from an `Instance` activated for `service`.
pub fn downcast<T: ?Sized + Send + Sync + 'static>(
  service: ServiceKey,
  instance: &Instance,
) -> Result<Arc<T>, ResolveError> {
  instance
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or(ResolveError::TypeMismatch {
      service,
      expected: std::any::type_name::<T>(),
    })
}
