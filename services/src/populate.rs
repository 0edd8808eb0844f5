//! Translation of a `ServiceCollection` into kernel bindings.

use std::sync::Arc;

use tracing::debug;

use crate::binding::{Binding, BindingBuilder};
use crate::collection::ServiceCollection;
use crate::context::Context;
use crate::core::{erase, ServiceKey};
use crate::descriptor::{Implementation, ServiceDescriptor};
use crate::error::PopulateError;
use crate::hook::HookChain;
use crate::index::BindingIndex;
use crate::kernel::Kernel;
use crate::lifetime::LifetimeScopeMapper;
use crate::provider::ServiceProvider;
use crate::settings::{IndexMode, PopulateSettings};

/// What a population run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
  /// Descriptors translated into default bindings.
  pub bound: usize,
  /// Descriptors taken over by a hook.
  pub claimed: usize,
}

/// Populates a kernel from service collections.
///
/// Each unclaimed descriptor becomes exactly one binding, in collection order. The
/// binding carries the descriptor and a `BindingIndex` item as metadata, so the
/// last descriptor of a service is the one single-result resolution picks while
/// `get_all` still sees every binding.
#[derive(Debug, Default)]
pub struct ServiceCollectionAdapter {
  settings: PopulateSettings,
  // Only used with `IndexMode::Persistent`.
  index: BindingIndex,
}

impl ServiceCollectionAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_settings(settings: PopulateSettings) -> Self {
    Self {
      settings,
      index: BindingIndex::new(),
    }
  }

  /// Populates `kernel` using the hooks registered on it.
  pub fn populate(
    &self,
    kernel: &Kernel,
    services: &ServiceCollection,
  ) -> Result<PopulateSummary, PopulateError> {
    let hooks = HookChain::from_kernel(kernel)?;
    self.populate_with_hooks(kernel, services, &hooks)
  }

  /// Populates `kernel`, offering every descriptor to `hooks` first.
  pub fn populate_with_hooks(
    &self,
    kernel: &Kernel,
    services: &ServiceCollection,
    hooks: &HookChain,
  ) -> Result<PopulateSummary, PopulateError> {
    ensure_service_provider(kernel);

    let per_call;
    let index = match self.settings.index_mode {
      IndexMode::PerPopulate => {
        per_call = BindingIndex::new();
        &per_call
      }
      IndexMode::Persistent => &self.index,
    };

    let mut summary = PopulateSummary::default();
    for descriptor in services {
      if hooks.claim(kernel, descriptor)?.is_some() {
        summary.claimed += 1;
        continue;
      }

      let binding = kernel.bind(translate(descriptor, index));
      debug!(
        service = %descriptor.service_type(),
        lifetime = %descriptor.lifetime(),
        binding = binding.id().get(),
        sequence = binding.metadata().index().map(|item| item.sequence()),
        "descriptor translated"
      );
      summary.bound += 1;
    }

    hooks.after_populate(kernel)?;
    debug!(
      bound = summary.bound,
      claimed = summary.claimed,
      hooks = hooks.len(),
      "service collection populated"
    );
    Ok(summary)
  }
}

fn translate(descriptor: &Arc<ServiceDescriptor>, index: &BindingIndex) -> Binding {
  let service = descriptor.service_type();
  let lifetime = descriptor.lifetime();

  let builder: BindingBuilder = match descriptor.implementation() {
    Implementation::Type(ty) => {
      let construct = ty.construct().clone();
      Binding::to_type(service, ty.type_name(), move |ctx: &Context<'_>| {
        let provider = ctx.get::<ServiceProvider>()?;
        construct(&provider)
      })
      .in_scope(LifetimeScopeMapper::map(lifetime))
    }
    Implementation::Factory(factory) => {
      let factory = factory.clone();
      Binding::to_method(service, move |ctx: &Context<'_>| {
        let provider = ctx.get::<ServiceProvider>()?;
        factory(&provider)
      })
      .in_scope(LifetimeScopeMapper::map(lifetime))
    }
    Implementation::Instance(instance) => {
      let instance = instance.clone();
      // A pre-built instance is singleton-shaped whatever its declared lifetime.
      Binding::to_method(service, move |_: &Context<'_>| Ok(instance.clone()))
        .in_scope(LifetimeScopeMapper::root())
    }
  };

  builder
    .on_dispose(descriptor.disposer().cloned())
    .with_descriptor(descriptor.clone())
    .with_index(index.next(service))
    .build()
}

// Factory wrappers resolve the provider from the activation context.
fn ensure_service_provider(kernel: &Kernel) {
  let key = ServiceKey::of::<ServiceProvider>();
  if kernel.has_binding(&key) {
    return;
  }
  kernel.bind(
    Binding::to_method(key, |ctx: &Context<'_>| {
      Ok(erase(Arc::new(ServiceProvider::for_context(ctx))))
    })
    .build(),
  );
}
