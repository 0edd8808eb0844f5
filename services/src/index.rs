//! Per-service sequence numbers that decide which binding is the latest.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::ServiceKey;

#[derive(Default)]
struct IndexEntry {
  count: AtomicU64,
  latest: AtomicU64,
}

/// Numbers bindings per service type in registration order and remembers the most
/// recent number as the latest.
///
/// A single lock serializes `next`; the index is written during population only.
#[derive(Default)]
pub struct BindingIndex {
  entries: Mutex<HashMap<ServiceKey, Arc<IndexEntry>>>,
}

impl BindingIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Assigns the next sequence number for `service` and marks it as the latest.
  pub fn next(&self, service: ServiceKey) -> BindingIndexItem {
    let mut entries = self.entries.lock();
    let entry = entries.entry(service).or_default().clone();
    let sequence = entry.count.fetch_add(1, Ordering::AcqRel) + 1;
    entry.latest.store(sequence, Ordering::Release);
    BindingIndexItem {
      service,
      sequence,
      entry,
    }
  }

  /// How many numbers have been handed out for `service`.
  pub fn count(&self, service: &ServiceKey) -> u64 {
    self
      .entries
      .lock()
      .get(service)
      .map_or(0, |entry| entry.count.load(Ordering::Acquire))
  }

  /// The sequence number currently marked latest for `service`.
  pub fn latest(&self, service: &ServiceKey) -> Option<u64> {
    self
      .entries
      .lock()
      .get(service)
      .map(|entry| entry.latest.load(Ordering::Acquire))
  }
}

impl fmt::Debug for BindingIndex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingIndex")
      .field("services", &self.entries.lock().len())
      .finish()
  }
}

/// The `{sequence, is_latest}` record attached to a translated binding.
///
/// `is_latest` is read from the index entry at call time, so an item stops being the
/// latest as soon as a later registration of the same service is numbered.
#[derive(Clone)]
pub struct BindingIndexItem {
  service: ServiceKey,
  sequence: u64,
  entry: Arc<IndexEntry>,
}

impl BindingIndexItem {
  pub fn service_type(&self) -> ServiceKey {
    self.service
  }

  pub fn sequence(&self) -> u64 {
    self.sequence
  }

  pub fn is_latest(&self) -> bool {
    self.entry.latest.load(Ordering::Acquire) == self.sequence
  }
}

impl fmt::Debug for BindingIndexItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingIndexItem")
      .field("service", &self.service)
      .field("sequence", &self.sequence)
      .field("is_latest", &self.is_latest())
      .finish()
  }
}
