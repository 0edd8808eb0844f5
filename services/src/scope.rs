//! Activation scopes: instance reuse and disposal timing.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::trace;

use crate::binding::{Binding, Disposer};
use crate::core::{BindingId, Instance};
use crate::error::ResolveError;
use crate::settings::DisposalOrder;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// The shape of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
  /// Lives as long as the kernel.
  Root,
  /// An externally delimited unit of work.
  Request,
  /// Created per transient activation under an enclosing scope; torn down with it.
  DerivedTransient,
}

enum Tracked {
  Instance { instance: Instance, disposer: Disposer },
  Scope(Scope),
}

impl Tracked {
  fn dispose(self) {
    match self {
      Tracked::Instance { instance, disposer } => disposer(&instance),
      Tracked::Scope(scope) => scope.dispose(),
    }
  }
}

struct ScopeInner {
  id: u64,
  kind: ScopeKind,
  order: DisposalOrder,
  instances: DashMap<BindingId, Arc<OnceCell<Instance>>>,
  // Disposables and derived scopes, in activation order.
  tracked: Mutex<Vec<Tracked>>,
  disposed: AtomicBool,
}

/// An activation boundary. Cloning yields another handle to the same scope.
///
/// A scope caches at most one instance per binding and disposes every tracked
/// instance exactly once, when `dispose` is first called.
#[derive(Clone)]
pub struct Scope {
  inner: Arc<ScopeInner>,
}

impl Scope {
  pub fn new(kind: ScopeKind, order: DisposalOrder) -> Self {
    let scope = Self {
      inner: Arc::new(ScopeInner {
        id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
        kind,
        order,
        instances: DashMap::new(),
        tracked: Mutex::new(Vec::new()),
        disposed: AtomicBool::new(false),
      }),
    };
    trace!(scope = scope.id(), kind = ?kind, "scope created");
    scope
  }

  pub fn id(&self) -> u64 {
    self.inner.id
  }

  pub fn kind(&self) -> ScopeKind {
    self.inner.kind
  }

  pub fn is_disposed(&self) -> bool {
    self.inner.disposed.load(Ordering::Acquire)
  }

  /// Creates a child scope that is disposed together with this one.
  pub fn derive_transient_scope(&self) -> Result<Scope, ScopeDisposedError> {
    let child = Scope::new(ScopeKind::DerivedTransient, self.inner.order);
    self.track(Tracked::Scope(child.clone()))?;
    Ok(child)
  }

  /// Returns the instance cached for `binding`, activating it on first use.
  pub(crate) fn get_or_activate(
    &self,
    binding: &Binding,
    activate: impl FnOnce() -> Result<Instance, ResolveError>,
  ) -> Result<Instance, ResolveError> {
    let disposed = || ResolveError::ScopeDisposed {
      service: binding.service(),
      scope: self.id(),
    };
    if self.is_disposed() {
      return Err(disposed());
    }

    // A derived scope exists only to dispose its instance; it never hands it out again.
    if self.kind() == ScopeKind::DerivedTransient {
      let instance = activate()?;
      self.track_instance(binding, &instance).map_err(|_| disposed())?;
      return Ok(instance);
    }

    let cell = self.inner.instances.entry(binding.id()).or_default().clone();
    cell
      .get_or_try_init(|| {
        let instance = activate()?;
        self.track_instance(binding, &instance).map_err(|_| disposed())?;
        Ok(instance)
      })
      .cloned()
  }

  fn track_instance(
    &self,
    binding: &Binding,
    instance: &Instance,
  ) -> Result<(), ScopeDisposedError> {
    match binding.disposer() {
      Some(disposer) => self.track(Tracked::Instance {
        instance: instance.clone(),
        disposer: disposer.clone(),
      }),
      None => Ok(()),
    }
  }

  fn track(&self, item: Tracked) -> Result<(), ScopeDisposedError> {
    let mut tracked = self.inner.tracked.lock();
    if self.is_disposed() {
      drop(tracked);
      // Activated after teardown began; nothing else will ever dispose it.
      item.dispose();
      return Err(ScopeDisposedError(self.id()));
    }
    tracked.push(item);
    Ok(())
  }

  /// Tears the scope down. Only the first call has an effect.
  pub fn dispose(&self) {
    let tracked = {
      let mut tracked = self.inner.tracked.lock();
      if self.inner.disposed.swap(true, Ordering::AcqRel) {
        return;
      }
      std::mem::take(&mut *tracked)
    };
    self.inner.instances.clear();

    trace!(scope = self.id(), tracked = tracked.len(), "disposing scope");
    match self.inner.order {
      DisposalOrder::Reverse => tracked.into_iter().rev().for_each(Tracked::dispose),
      DisposalOrder::Activation => tracked.into_iter().for_each(Tracked::dispose),
    }
  }
}

impl fmt::Debug for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("id", &self.id())
      .field("kind", &self.kind())
      .field("disposed", &self.is_disposed())
      .finish_non_exhaustive()
  }
}

/// Returned when a disposed scope is asked to track something new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDisposedError(pub u64);

impl fmt::Display for ScopeDisposedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "scope {} has been disposed", self.0)
  }
}

impl std::error::Error for ScopeDisposedError {}
