//! # Fibre Services
//!
//! A service-collection adapter for a thread-safe, multi-binding IoC kernel.
//!
//! Applications describe their services as an ordered [`ServiceCollection`]: a service
//! type, one way of producing it (an implementation type, a factory or a ready-made
//! instance) and a [`ServiceLifetime`]. The [`ServiceCollectionAdapter`] translates
//! that list into kernel bindings, and a [`ServiceProvider`] resolves services from
//! the populated kernel.
//!
//! ## Core Concepts
//!
//! - **Latest wins**: registering a service several times keeps every binding in the
//!   kernel, but single-result resolution only sees the last one. `get_all` sees all.
//! - **Lifetimes**: singletons live in the kernel's root scope, scoped services in a
//!   request scope, transients in a scope derived from the enclosing one. Each scope
//!   disposes what it tracks exactly once, when it ends.
//! - **Hooks**: a [`PopulateHook`] can claim a descriptor and bind it its own way.
//! - **Errors**: [`ServiceProvider::get`] returns `Ok(None)` for an unregistered
//!   service, but an ambiguous match is an error from both entry points.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_services::{Kernel, ServiceCollection, ServiceCollectionAdapter, ServiceProvider};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!   fn name(&self) -> &'static str;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!   fn name(&self) -> &'static str { "console" }
//! }
//!
//! struct FileLogger;
//! impl Logger for FileLogger {
//!   fn name(&self) -> &'static str { "file" }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_transient::<dyn Logger>(|_| Ok(Arc::new(ConsoleLogger)));
//! services.add_scoped::<dyn Logger>(|_| Ok(Arc::new(FileLogger)));
//!
//! let kernel = Kernel::new();
//! ServiceCollectionAdapter::new().populate(&kernel, &services).unwrap();
//!
//! let provider = ServiceProvider::new(kernel);
//! let scope = provider.create_scope();
//!
//! let logger = scope.service_provider().get_required::<dyn Logger>().unwrap();
//! assert_eq!(logger.name(), "file");
//!
//! let all = scope.service_provider().get_all::<dyn Logger>().unwrap();
//! assert_eq!(all.len(), 2);
//! ```

mod binding;
mod collection;
mod context;
mod core;
mod descriptor;
mod error;
mod hook;
mod index;
mod kernel;
mod lifetime;
mod macros;
mod populate;
mod provider;
mod scope;
mod settings;

pub use binding::{
  Activator, Binding, BindingBuilder, BindingMetadata, BindingTarget, Disposer, ScopeSelector,
};
pub use collection::ServiceCollection;
pub use context::Context;
pub use crate::core::{downcast, erase, BindingId, Instance, ServiceKey};
pub use descriptor::{
  DescriptorBuilder, Dispose, Implementation, ImplementationType, Injectable, ServiceDescriptor,
  ServiceFactory, ServiceLifetime,
};
pub use error::{ConfigError, PopulateError, ResolveError};
pub use hook::{HookChain, PopulateHook};
pub use index::{BindingIndex, BindingIndexItem};
pub use kernel::{Constraint, Kernel};
pub use lifetime::LifetimeScopeMapper;
pub use populate::{PopulateSummary, ServiceCollectionAdapter};
pub use provider::{ServiceProvider, ServiceScope};
pub use scope::{Scope, ScopeDisposedError, ScopeKind};
pub use settings::{DisposalOrder, IndexMode, KernelSettings, PopulateSettings, Settings};
