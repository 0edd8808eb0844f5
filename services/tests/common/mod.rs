#![allow(dead_code)]

use fibre_services::{Dispose, Kernel, ServiceCollection, ServiceCollectionAdapter, ServiceProvider};
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

pub trait Logger: Send + Sync {
  fn name(&self) -> &'static str;
}

pub struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn name(&self) -> &'static str {
    "console"
  }
}

pub struct FileLogger;
impl Logger for FileLogger {
  fn name(&self) -> &'static str {
    "file"
  }
}

/// A value carrying the position it was registered at.
#[derive(Debug, PartialEq, Eq)]
pub struct Numbered(pub usize);

/// Collects the names of disposed services, in disposal order.
#[derive(Default)]
pub struct DisposalLog {
  entries: Mutex<Vec<&'static str>>,
}

impl DisposalLog {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn record(&self, name: &'static str) {
    self.entries.lock().unwrap().push(name);
  }

  pub fn entries(&self) -> Vec<&'static str> {
    self.entries.lock().unwrap().clone()
  }

  pub fn count(&self, name: &str) -> usize {
    self.entries().iter().filter(|entry| **entry == name).count()
  }
}

/// A disposable service that reports its disposal to a `DisposalLog`.
pub struct Resource {
  pub name: &'static str,
  log: Arc<DisposalLog>,
}

impl Resource {
  pub fn new(name: &'static str, log: &Arc<DisposalLog>) -> Self {
    Self {
      name,
      log: log.clone(),
    }
  }
}

impl Dispose for Resource {
  fn dispose(&self) {
    self.log.record(self.name);
  }
}

/// Populates a fresh kernel and returns it with its root provider.
pub fn build(services: &ServiceCollection) -> (Kernel, ServiceProvider) {
  let kernel = Kernel::new();
  ServiceCollectionAdapter::new()
    .populate(&kernel, services)
    .expect("population failed");
  let provider = ServiceProvider::new(kernel.clone());
  (kernel, provider)
}
