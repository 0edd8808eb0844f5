//! Mapping of service lifetimes onto kernel scope selectors.

use std::sync::Arc;

use crate::binding::ScopeSelector;
use crate::context::Context;
use crate::descriptor::ServiceLifetime;
use crate::error::{ConfigError, ResolveError};
use crate::scope::{Scope, ScopeKind};

pub struct LifetimeScopeMapper;

impl LifetimeScopeMapper {
  /// Returns the scope selector that gives `lifetime` its reuse and disposal timing.
  pub fn map(lifetime: ServiceLifetime) -> ScopeSelector {
    match lifetime {
      ServiceLifetime::Singleton => Self::root(),
      ServiceLifetime::Scoped => Arc::new(request_scope),
      ServiceLifetime::Transient => Arc::new(derived_transient_scope),
    }
  }

  /// Parses a configured lifetime name and maps it.
  pub fn map_name(name: &str) -> Result<ScopeSelector, ConfigError> {
    name.parse().map(Self::map)
  }

  /// The kernel's root scope, used for singletons and pre-built instances.
  pub fn root() -> ScopeSelector {
    Arc::new(root_scope)
  }
}

fn root_scope(ctx: &Context<'_>) -> Result<Option<Scope>, ResolveError> {
  Ok(Some(ctx.kernel().root_scope().clone()))
}

fn request_scope(ctx: &Context<'_>) -> Result<Option<Scope>, ResolveError> {
  Ok(ctx.scope().cloned())
}

// Only a request (or derived) scope owns transients, and only those with something
// to dispose. Anything else is handed out untracked.
fn derived_transient_scope(ctx: &Context<'_>) -> Result<Option<Scope>, ResolveError> {
  let Some(scope) = ctx.scope() else {
    return Ok(None);
  };
  let disposed = |id: u64| ResolveError::ScopeDisposed {
    service: ctx.binding().service(),
    scope: id,
  };
  if scope.is_disposed() {
    return Err(disposed(scope.id()));
  }
  if scope.kind() == ScopeKind::Root || ctx.binding().disposer().is_none() {
    return Ok(None);
  }
  scope
    .derive_transient_scope()
    .map(Some)
    .map_err(|err| disposed(err.0))
}
