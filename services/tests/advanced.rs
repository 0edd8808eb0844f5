mod common;

use common::{build, Logger, Numbered};
use fibre_services::{
  resolve, Injectable, Kernel, ResolveError, ServiceCollection, ServiceCollectionAdapter,
  ServiceLifetime, ServiceProvider, Settings, IndexMode, DisposalOrder,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

// --- Test Fixtures ---

struct Config {
  url: &'static str,
}

struct Database {
  config: Arc<Config>,
}

struct UserRepository {
  db: Arc<Database>,
}

trait Repository: Send + Sync {
  fn describe(&self) -> String;
}

impl Injectable for UserRepository {
  fn inject(provider: &ServiceProvider) -> Result<Self, ResolveError> {
    Ok(Self {
      db: provider.get_required::<Database>()?,
    })
  }
}

impl Repository for UserRepository {
  fn describe(&self) -> String {
    format!("users@{}", self.db.config.url)
  }
}

struct RequestLogger {
  name: &'static str,
}

impl Logger for RequestLogger {
  fn name(&self) -> &'static str {
    self.name
  }
}

struct Handler {
  logger: Arc<dyn Logger>,
}

// --- Dependency Chains ---

#[test]
fn test_factories_resolve_dependencies_through_the_provider() {
  let mut services = ServiceCollection::new();
  services.add_instance(Arc::new(Config { url: "postgres://db" }));
  services.add_singleton::<Database>(|provider| {
    Ok(Arc::new(Database {
      config: provider.get_required::<Config>()?,
    }))
  });
  let (_kernel, provider) = build(&services);

  let db = provider.get_required::<Database>().unwrap();

  assert_eq!(db.config.url, "postgres://db");
}

#[test]
fn test_implementation_type_is_injected_and_upcast() {
  let mut services = ServiceCollection::new();
  services.add_instance(Arc::new(Config { url: "sqlite://memory" }));
  services.add_singleton::<Database>(|provider| {
    Ok(Arc::new(Database {
      config: provider.get_required::<Config>()?,
    }))
  });
  services.add_type::<dyn Repository, UserRepository>(ServiceLifetime::Scoped, |repo| repo);
  let (_kernel, provider) = build(&services);
  let scope = provider.create_scope();

  let repo = scope.service_provider().get_required::<dyn Repository>().unwrap();
  let again = scope.service_provider().get_required::<dyn Repository>().unwrap();

  assert_eq!(repo.describe(), "users@sqlite://memory");
  assert!(Arc::ptr_eq(&repo, &again));
}

#[test]
fn test_missing_dependency_fails_activation() {
  let mut services = ServiceCollection::new();
  services.add_type::<dyn Repository, UserRepository>(ServiceLifetime::Transient, |repo| repo);
  let (_kernel, provider) = build(&services);

  let err = provider.get_required::<dyn Repository>().err().unwrap();

  assert!(err.is_not_registered());
  assert!(matches!(err, ResolveError::NotRegistered(key) if key.type_name().contains("Database")));
}

#[test]
fn test_transient_shares_scoped_dependency_within_a_scope() {
  let mut services = ServiceCollection::new();
  services.add_scoped::<dyn Logger>(|_| Ok(Arc::new(RequestLogger { name: "request" })));
  services.add_transient::<Handler>(|provider| {
    Ok(Arc::new(Handler {
      logger: provider.get_required::<dyn Logger>()?,
    }))
  });
  let (_kernel, provider) = build(&services);
  let scope = provider.create_scope();
  let other = provider.create_scope();

  let h1 = scope.service_provider().get_required::<Handler>().unwrap();
  let h2 = scope.service_provider().get_required::<Handler>().unwrap();
  let h3 = other.service_provider().get_required::<Handler>().unwrap();

  assert!(!Arc::ptr_eq(&h1, &h2));
  assert!(Arc::ptr_eq(&h1.logger, &h2.logger));
  assert!(!Arc::ptr_eq(&h1.logger, &h3.logger));
  assert_eq!(h3.logger.name(), "request");
}

// --- Concurrency ---

#[test]
fn test_singleton_factory_runs_once_under_concurrency() {
  let activations = Arc::new(AtomicUsize::new(0));
  let counter = activations.clone();
  let mut services = ServiceCollection::new();
  services.add_singleton::<Numbered>(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
    thread::sleep(std::time::Duration::from_millis(10));
    Ok(Arc::new(Numbered(1)))
  });
  let (_kernel, provider) = build(&services);

  let resolved: Vec<Arc<Numbered>> = thread::scope(|s| {
    let handles: Vec<_> = (0..20)
      .map(|_| s.spawn(|| provider.get_required::<Numbered>().unwrap()))
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  assert_eq!(activations.load(Ordering::SeqCst), 1, "factory should run exactly once");
  assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
}

#[test]
fn test_scoped_service_is_shared_across_threads_in_one_scope() {
  let activations = Arc::new(AtomicUsize::new(0));
  let counter = activations.clone();
  let mut services = ServiceCollection::new();
  services.add_scoped::<Numbered>(move |_| {
    Ok(Arc::new(Numbered(counter.fetch_add(1, Ordering::SeqCst))))
  });
  let (_kernel, provider) = build(&services);
  let scope = provider.create_scope();
  let scoped = scope.service_provider();

  let resolved: Vec<Arc<Numbered>> = thread::scope(|s| {
    let handles: Vec<_> = (0..8)
      .map(|_| s.spawn(|| scoped.get_required::<Numbered>().unwrap()))
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  assert_eq!(activations.load(Ordering::SeqCst), 1);
  assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
}

#[test]
fn test_concurrent_population_of_separate_kernels() {
  thread::scope(|s| {
    for i in 0..10 {
      s.spawn(move || {
        let mut services = ServiceCollection::new();
        services.add_instance(Arc::new(Numbered(i)));
        let (_kernel, provider) = build(&services);
        assert_eq!(*provider.get_required::<Numbered>().unwrap(), Numbered(i));
      });
    }
  });
}

// --- Cycles ---

struct Chicken {
  _egg: Arc<Egg>,
}

struct Egg {
  _chicken: Arc<Chicken>,
}

#[test]
fn test_circular_dependency_is_reported() {
  let mut services = ServiceCollection::new();
  services.add_transient::<Chicken>(|provider| {
    Ok(Arc::new(Chicken {
      _egg: provider.get_required::<Egg>()?,
    }))
  });
  services.add_transient::<Egg>(|provider| {
    Ok(Arc::new(Egg {
      _chicken: provider.get_required::<Chicken>()?,
    }))
  });
  let (_kernel, provider) = build(&services);

  let err = provider.get_required::<Chicken>().err().unwrap();

  assert!(matches!(
    err,
    ResolveError::CircularDependency(key) if key.type_name().contains("Chicken")
  ));

  // The guard is released after the failure.
  let err = provider.get_required::<Egg>().err().unwrap();
  assert!(matches!(err, ResolveError::CircularDependency(key) if key.type_name().contains("Egg")));
}

// --- Macro ---

#[test]
fn test_resolve_macro() {
  let mut services = ServiceCollection::new();
  services.add_instance(Arc::new(Numbered(7)));
  services.add_singleton::<dyn Logger>(|_| Ok(Arc::new(RequestLogger { name: "macro" })));
  let (_kernel, provider) = build(&services);

  assert_eq!(*resolve!(provider, Numbered), Numbered(7));
  assert_eq!(resolve!(provider, trait Logger).name(), "macro");
}

#[test]
#[should_panic(expected = "Failed to resolve required service")]
fn test_resolve_macro_panics_for_unregistered_service() {
  let (_kernel, provider) = build(&ServiceCollection::new());
  let _ = resolve!(provider, Numbered);
}

// --- Configuration ---

#[test]
fn test_settings_from_file_configure_kernel_and_adapter() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  writeln!(
    file,
    "kernel:\n  disposal_order: activation\npopulate:\n  index_mode: persistent"
  )
  .unwrap();

  let settings = Settings::from_file(file.path()).unwrap();
  assert_eq!(settings.kernel.disposal_order, DisposalOrder::Activation);
  assert!(settings.kernel.detect_cycles);
  assert_eq!(settings.populate.index_mode, IndexMode::Persistent);

  let kernel = Kernel::with_settings(settings.kernel);
  let adapter = ServiceCollectionAdapter::with_settings(settings.populate);
  let mut first = ServiceCollection::new();
  first.add_instance(Arc::new(Numbered(1)));
  let mut second = ServiceCollection::new();
  second.add_instance(Arc::new(Numbered(2)));
  adapter.populate(&kernel, &first).unwrap();
  adapter.populate(&kernel, &second).unwrap();

  let provider = ServiceProvider::new(kernel);
  assert_eq!(*provider.get_required::<Numbered>().unwrap(), Numbered(2));
}

#[test]
fn test_missing_settings_file_is_a_read_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = Settings::from_file(dir.path().join("absent.yaml")).err().unwrap();
  assert!(matches!(err, fibre_services::ConfigError::Read(_)));
}
